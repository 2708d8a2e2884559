//! Typed views over entities owning a conjunction of component types.
//!
//! A [`View`] tracks, incrementally, every entity that owns all of its
//! component types at once, and iterates their records either sequentially
//! or on the worker pool. Consistency is maintained by the world, which
//! notifies interested views as components are added and removed; the view
//! itself is a plain key into that bookkeeping.

use std::marker::PhantomData;

use crate::{
    storage::CompVec,
    world::{comp_id, CompId, Component, Index, World},
};

use self::roster::{Roster, ViewId};

pub(crate) mod roster;
#[cfg(test)]
mod tests;

/// Member count below which [`View::par_for_each`] stays on the calling
/// thread; splitting tiny views across workers costs more than it saves.
#[cfg(feature = "parallel")]
pub const PAR_MIN_LEN: usize = 256;

macro_rules! comp_count {
    () => { 0 };
    ($head:ident $(, $tail:ident)*) => { 1 + comp_count!($($tail),*) };
}

/// An ordered set of component types iterated together by a [`View`].
///
/// Implemented for tuples of one up to eight component types; the declared
/// order is the argument order of the iteration callback. The same type
/// must not appear twice in one set.
///
/// # Safety
///
/// Iteration trusts implementations: `comp_ids` must match `Fetched`'s
/// stores in order and arity, and `get_block` must resolve column `j`
/// through the store of `comp_ids()[j]`. The tuple impls provided here are
/// the intended surface.
pub unsafe trait ComponentSet: 'static {
    /// Exclusive borrows of one entity's records, in declared order.
    type Refs<'a>;

    /// Shared borrows of every participating store.
    #[doc(hidden)]
    type Fetched<'a>: Copy;

    /// Number of component types in the set.
    const LEN: usize;

    /// Dense ids of the participating types, in declared order.
    #[doc(hidden)]
    fn comp_ids() -> Vec<CompId>;

    /// Borrows each participating store, or `None` when any has not been
    /// created yet.
    #[doc(hidden)]
    fn fetch(world: &World) -> Option<Self::Fetched<'_>>;

    /// Resolves one packed index block into record borrows.
    ///
    /// # Safety
    ///
    /// `block` must hold `LEN` record indices in declared-type order, and
    /// for the lifetime of the returned borrows no other borrow of any of
    /// the same records may exist, shared or exclusive.
    #[doc(hidden)]
    unsafe fn get_block<'a>(fetched: Self::Fetched<'a>, block: &[Index]) -> Self::Refs<'a>;
}

macro_rules! component_set {
    ($($ty:ident),*) => {
        // SAFETY: ids, stores and block columns are all expanded from the
        // same type list, so they agree in order and arity.
        unsafe impl<$($ty),*> ComponentSet for ($($ty,)*)
        where
            $($ty: Component,)*
        {
            type Refs<'a> = ($(&'a mut $ty,)*);
            type Fetched<'a> = ($(&'a CompVec<$ty>,)*);

            const LEN: usize = comp_count!($($ty),*);

            fn comp_ids() -> Vec<CompId> {
                vec![$(comp_id::<$ty>()),*]
            }

            fn fetch(world: &World) -> Option<Self::Fetched<'_>> {
                Some(($(world.store::<$ty>()?,)*))
            }

            #[allow(non_snake_case)]
            unsafe fn get_block<'a>(fetched: Self::Fetched<'a>, block: &[Index]) -> Self::Refs<'a> {
                debug_assert_eq!(block.len(), Self::LEN);

                let ($($ty,)*) = fetched;
                let mut slot = 0;
                let refs = ($(
                    {
                        // SAFETY: forwarded to the caller; distinct stores
                        // hold distinct records, so within one block only
                        // the index matters.
                        let record = unsafe { $ty.shared_at_mut(block[slot]) };
                        slot += 1;
                        record
                    },
                )*);
                let _ = slot;
                refs
            }
        }
    };
}

component_set! {A}
component_set! {A, B}
component_set! {A, B, C}
component_set! {A, B, C, D}
component_set! {A, B, C, D, E}
component_set! {A, B, C, D, E, F}
component_set! {A, B, C, D, E, F, G}
component_set! {A, B, C, D, E, F, G, H}

/// A live view over every entity owning all of `S`'s component types.
///
/// Registering happens at construction and the membership is maintained
/// incrementally from then on, so iteration never rescans the stores. The
/// view holds no borrow of the world; it is a key, and every operation
/// takes the world explicitly. Using it with a world other than the one
/// that created it is a logic error.
///
/// Dropping a `View` without calling [`View::destroy`] leaves its
/// bookkeeping registered (still maintained, never read again); destroy
/// views you are done with.
pub struct View<S: ComponentSet> {
    id: ViewId,
    marker: PhantomData<fn(S)>,
}

impl<S: ComponentSet> View<S> {
    /// Registers a view for `S`'s types and synchronises it with current
    /// storage.
    ///
    /// # Panics
    ///
    /// Panics when `S` names the same component type twice.
    pub fn new(world: &mut World) -> Self {
        let id = world.views.register(Roster::new(S::comp_ids()));
        let view = View {
            id,
            marker: PhantomData,
        };
        view.rebuild(world);
        view
    }

    /// Discards the membership and resynchronises it from current storage.
    ///
    /// Never needed for consistency (notifications keep the view current);
    /// useful to compact block order after heavy churn.
    pub fn rebuild(&self, world: &mut World) {
        let World { views, stores, .. } = world;
        if let Some(roster) = views.roster_mut(self.id) {
            roster.rebuild(stores);
        }
    }

    /// Number of entities currently in the view.
    pub fn len(&self, world: &World) -> usize {
        world.views.roster(self.id).map_or(0, Roster::len)
    }

    /// Returns `true` if no entity currently owns all of `S`'s types.
    pub fn is_empty(&self, world: &World) -> bool {
        self.len(world) == 0
    }

    /// Applies `f` to every member's records, one call per entity, in
    /// block-insertion order.
    ///
    /// Block order is deterministic for a fixed sequence of world
    /// mutations but not otherwise guaranteed, and a [`View::rebuild`]
    /// reorders it.
    pub fn for_each<'w, F>(&self, world: &'w mut World, mut f: F)
    where
        F: FnMut(S::Refs<'w>),
    {
        // shared reborrow; the exclusive borrow taken by this call is what
        // keeps callers from aliasing the records handed to `f`
        let world: &'w World = &*world;

        let roster = match world.views.roster(self.id) {
            Some(roster) if roster.len() > 0 => roster,
            _ => return,
        };
        let fetched = match S::fetch(world) {
            Some(fetched) => fetched,
            None => return,
        };

        for block in roster.blocks() {
            // SAFETY: every member occupies a distinct record in every
            // participating store and every block is visited exactly once,
            // so no record is borrowed twice.
            f(unsafe { S::get_block(fetched, block) });
        }
    }

    /// [`View::for_each`] on the worker pool, with the
    /// [`PAR_MIN_LEN`] sequential cutoff.
    ///
    /// The callback must confine itself to the records it is handed; it
    /// runs concurrently against other entities' callbacks. There is no
    /// cross-chunk ordering. The call returns once every chunk has
    /// completed; a panicking callback is reported through `log` and
    /// abandons the rest of its chunk only.
    #[cfg(feature = "parallel")]
    pub fn par_for_each<'w, F>(&self, world: &'w mut World, f: F)
    where
        F: Fn(S::Refs<'w>) + Sync,
        S::Fetched<'w>: Send,
    {
        self.par_for_each_min(world, PAR_MIN_LEN, f)
    }

    /// [`View::par_for_each`] with an explicit sequential cutoff.
    ///
    /// Views with fewer than `min_len` members are iterated on the calling
    /// thread; larger ones are ceil-divided into one contiguous chunk of
    /// blocks per pool worker.
    #[cfg(feature = "parallel")]
    pub fn par_for_each_min<'w, F>(&self, world: &'w mut World, min_len: usize, f: F)
    where
        F: Fn(S::Refs<'w>) + Sync,
        S::Fetched<'w>: Send,
    {
        use crate::pool;

        let world: &'w World = &*world;

        let roster = match world.views.roster(self.id) {
            Some(roster) if roster.len() > 0 => roster,
            _ => return,
        };
        let fetched = match S::fetch(world) {
            Some(fetched) => fetched,
            None => return,
        };

        let blocks = roster.len();
        if blocks < min_len {
            for block in roster.blocks() {
                // SAFETY: see `for_each`.
                f(unsafe { S::get_block(fetched, block) });
            }
            return;
        }

        let pool = pool::global();
        let chunk = (blocks + pool.threads() - 1) / pool.threads();

        let signal = pool::Completion::default();
        let signal_ref = &signal;
        let f_ref = &f;

        let mut submitted = 0;
        let mut start = 0;
        while start < blocks {
            let end = usize::min(start + chunk, blocks);

            let task = move || {
                // counted even if `f` unwinds, so the caller always wakes
                let _done = signal_ref.guard();
                for m in start..end {
                    // SAFETY: chunks partition the block range, so across
                    // all workers every block is visited exactly once; see
                    // `for_each` for the per-block argument.
                    f_ref(unsafe { S::get_block(fetched, roster.block(m)) });
                }
            };

            let task: Box<dyn FnOnce() + Send + '_> = Box::new(task);
            // SAFETY: the task borrows `roster`, `fetched`, `f` and
            // `signal`, all live for the rest of this call; `signal.wait`
            // below does not return until every submitted task has run or
            // unwound, so no borrow outlives its referent.
            let task: pool::Task = unsafe { std::mem::transmute(task) };
            pool.submit(task);

            submitted += 1;
            start = end;
        }

        signal.wait(submitted);
    }

    /// Unregisters the view. Consumes the handle; the membership is gone
    /// once this returns.
    pub fn destroy(self, world: &mut World) {
        world.views.unregister(self.id);
    }
}
