use std::{
    any::TypeId,
    sync::{
        atomic::{AtomicU32, Ordering},
        Mutex, OnceLock, PoisonError,
    },
};

use ahash::AHashMap as HashMap;

/// Dense process-wide identifier for a component type.
///
/// Assigned on first use of a type and monotonic from there. The numeric
/// value depends on first-use order, so it is stable for the life of the
/// process but must never be persisted.
pub type CompId = u32;

/// Abstract component type.
///
/// Components are plain data records attached to at most one entity per
/// type. Records are default-initialised when added (see
/// [`World::add_component`](crate::World::add_component)), hence the
/// `Default` bound; `Send + Sync` lets the worker pool visit records during
/// parallel iteration.
///
/// ## Examples
///
/// ```
/// use sparsec::Component;
///
/// #[derive(Default)]
/// pub struct Position {
///     pub x: f32,
///     pub y: f32,
/// }
///
/// impl Component for Position {}
/// ```
pub trait Component: Default + Send + Sync + 'static {}

fn registry() -> &'static Mutex<HashMap<TypeId, CompId>> {
    static REGISTRY: OnceLock<Mutex<HashMap<TypeId, CompId>>> = OnceLock::new();
    REGISTRY.get_or_init(Default::default)
}

/// Returns the dense id assigned to `T`, allocating the next one on first
/// use.
///
/// Safe against concurrent first use of distinct types; once assigned an id
/// is read-only.
pub fn comp_id<T: Component>() -> CompId {
    static NEXT_ID: AtomicU32 = AtomicU32::new(0);

    let mut map = registry().lock().unwrap_or_else(PoisonError::into_inner);
    *map.entry(TypeId::of::<T>())
        .or_insert_with(|| NEXT_ID.fetch_add(1, Ordering::Relaxed))
}
