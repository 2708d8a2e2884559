//! Dense per-type component storage.

use std::any::Any;

use ahash::AHashMap as HashMap;

use crate::world::{comp_id, CompId, Component, Entity, Index};

use self::sync_unsafe_cell::SyncUnsafeCell;

mod sync_unsafe_cell;

/// Initial record capacity of a fresh store. Growth past this is `Vec`'s
/// amortised doubling.
const BASE_CAPACITY: usize = 16;

/// Dense storage for every record of one component type.
///
/// Keeps a redirection two-way table between entities and records: `data`
/// and `owners` are parallel and gap-free, `entity_index` maps an owning
/// [`Entity`] to the current position of its record. Removal swap-removes,
/// so record positions are stable only until the next mutation of the
/// store.
pub struct CompVec<T: Component> {
    data: Vec<SyncUnsafeCell<T>>,
    owners: Vec<Entity>,
    entity_index: HashMap<Entity, Index>,
}

impl<T: Component> Default for CompVec<T> {
    fn default() -> Self {
        CompVec {
            data: Vec::with_capacity(BASE_CAPACITY),
            owners: Vec::with_capacity(BASE_CAPACITY),
            entity_index: HashMap::with_capacity(BASE_CAPACITY),
        }
    }
}

impl<T: Component> CompVec<T> {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    /// Number of records in the store.
    pub fn len(&self) -> usize {
        self.entity_index.len()
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.entity_index.is_empty()
    }

    /// Returns `true` if `id` owns a record in this store.
    pub fn contains(&self, id: Entity) -> bool {
        self.entity_index.contains_key(&id)
    }

    /// Current position of `id`'s record, or `None` if it owns none.
    ///
    /// Positions are invalidated by any removal from the store.
    pub fn index_of(&self, id: Entity) -> Option<Index> {
        self.entity_index.get(&id).copied()
    }

    /// Shared borrow of `id`'s record.
    pub fn get(&self, id: Entity) -> Option<&T> {
        let &index = self.entity_index.get(&id)?;
        // SAFETY: `shared_at_mut` requires its callers to drop their
        // exclusive borrows before shared access to the store resumes, so
        // under `&self` no exclusive borrow of this record can be live.
        Some(unsafe { &*self.data[index as usize].get() })
    }

    pub(crate) fn get_mut(&mut self, id: Entity) -> Option<&mut T> {
        let &index = self.entity_index.get(&id)?;
        Some(self.data[index as usize].get_mut())
    }

    /// Returns the existing record when `id` already owns one, otherwise
    /// appends a default-initialised record owned by `id`.
    pub(crate) fn add(&mut self, id: Entity) -> &mut T {
        if let Some(&index) = self.entity_index.get(&id) {
            return self.data[index as usize].get_mut();
        }

        let index = self.data.len() as Index;
        self.entity_index.insert(id, index);
        self.owners.push(id);
        self.data.push(SyncUnsafeCell::default());

        self.data[index as usize].get_mut()
    }

    /// Removes `id`'s record by overwriting it with the last record and
    /// truncating; a no-op when `id` owns none. Removing the last record is
    /// the pop-only path.
    pub(crate) fn remove(&mut self, id: Entity) {
        let index = match self.entity_index.remove(&id) {
            Some(index) => index as usize,
            None => return,
        };

        let last = self.data.len() - 1;
        self.data.swap_remove(index);
        self.owners.swap_remove(index);

        if index != last {
            // re-point the record that was swapped into the hole
            self.entity_index.insert(self.owners[index], index as Index);
        }
    }

    /// The record at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn at(&self, index: Index) -> &T {
        // SAFETY: See `get`.
        unsafe { &*self.data[index as usize].get() }
    }

    /// The entity owning the record at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn entity_at(&self, index: Index) -> Entity {
        self.owners[index as usize]
    }

    /// Iterator over the owning entities, in record order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.owners.iter().copied()
    }

    /// Exclusive borrow of the record at `index` through a shared store
    /// borrow; this is what parallel view iteration hands to worker
    /// threads.
    ///
    /// # Safety
    ///
    /// No two simultaneous calls may pass the same `index`, and no borrow
    /// obtained from [`CompVec::get`] or [`CompVec::at`] may be alive for
    /// that record while the returned borrow is.
    pub(crate) unsafe fn shared_at_mut(&self, index: Index) -> &mut T {
        // SAFETY: the aliasing discipline above is the caller's; distinct
        // indices address distinct records.
        unsafe { &mut *self.data[index as usize].get() }
    }
}

/// Operations the world needs from a store without knowing its component
/// type. Downcasts back to the typed store stay confined to [`Stores`].
pub(crate) trait AnyCompVec: Any + Send + Sync {
    fn remove_entity(&mut self, id: Entity);
    fn entity_index(&self) -> &HashMap<Entity, Index>;
    fn entity_at(&self, index: Index) -> Entity;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyCompVec for CompVec<T> {
    fn remove_entity(&mut self, id: Entity) {
        self.remove(id);
    }

    fn entity_index(&self) -> &HashMap<Entity, Index> {
        &self.entity_index
    }

    fn entity_at(&self, index: Index) -> Entity {
        CompVec::entity_at(self, index)
    }

    fn len(&self) -> usize {
        CompVec::len(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Maps component type ids to their type-erased stores. Stores are created
/// lazily on first use and owned here for the life of the world.
#[derive(Default)]
pub(crate) struct Stores {
    map: HashMap<CompId, Box<dyn AnyCompVec>>,
}

impl Stores {
    pub fn get_or_create<T: Component>(&mut self) -> &mut CompVec<T> {
        self.map
            .entry(comp_id::<T>())
            .or_insert_with(|| Box::new(CompVec::<T>::new()))
            .as_any_mut()
            .downcast_mut()
            .expect("component id mapped to a store of a different type")
    }

    pub fn get<T: Component>(&self) -> Option<&CompVec<T>> {
        self.map.get(&comp_id::<T>()).map(|store| {
            store
                .as_any()
                .downcast_ref()
                .expect("component id mapped to a store of a different type")
        })
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut CompVec<T>> {
        self.map.get_mut(&comp_id::<T>()).map(|store| {
            store
                .as_any_mut()
                .downcast_mut()
                .expect("component id mapped to a store of a different type")
        })
    }

    pub fn get_base(&self, id: CompId) -> Option<&dyn AnyCompVec> {
        self.map.get(&id).map(|store| &**store)
    }

    /// Ids of every component type that has a store, in no particular
    /// order.
    pub fn ids(&self) -> impl Iterator<Item = CompId> + '_ {
        self.map.keys().copied()
    }

    /// Removes `id`'s record from every store that has one.
    pub fn remove_entity_everywhere(&mut self, id: Entity) {
        for store in self.map.values_mut() {
            store.remove_entity(id);
        }
    }
}
