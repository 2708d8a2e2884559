//! Entities, components, and general world management.

pub use self::{
    comp::{comp_id, CompId, Component},
    entity::{Entity, Index, Salt},
};

pub(crate) use self::entity::EntitySlot;

use std::{fmt, marker::PhantomData};

use log::warn;

use crate::{
    error::StaleEntity,
    storage::{CompVec, Stores},
    view::roster::Views,
};

use self::entity::Allocator;

mod comp;
mod entity;

/// The hub of the ECS: owns the entity allocator, every component store and
/// the view registry, and keeps the three consistent.
///
/// All mutation must happen from one thread; only view iteration through
/// [`View::par_for_each`](crate::View::par_for_each) fans work out, and
/// that keeps the world exclusively borrowed for the duration.
#[derive(Default)]
pub struct World {
    pub(crate) alloc: Allocator,
    pub(crate) stores: Stores,
    pub(crate) views: Views,
}

impl World {
    /// Creates an empty world.
    pub fn new() -> Self {
        Default::default()
    }

    /// Allocates a fresh entity id. Destroyed indices are recycled FIFO,
    /// each reuse under a bumped salt.
    pub fn create_entity(&mut self) -> Entity {
        self.alloc.allocate()
    }

    /// The canonical live id occupying `id`'s slot, or `None` when `id` is
    /// dead or stale.
    pub fn get_entity(&self, id: Entity) -> Option<Entity> {
        self.alloc.resolve(id).map(EntitySlot::id)
    }

    /// Returns `true` if `id` is the current live id of its slot.
    pub fn is_alive(&self, id: Entity) -> bool {
        self.alloc.is_alive(id)
    }

    /// Destroys `id` and everything attached to it.
    ///
    /// Interested views are notified first (their handlers still see the
    /// records), then every store drops the entity's record, then the slot
    /// is marked dead and its index queued for reuse.
    pub fn delete_entity(&mut self, id: Entity) -> Result<(), StaleEntity> {
        if !self.alloc.is_alive(id) {
            return Err(StaleEntity { entity: id });
        }

        for t in self.stores.ids() {
            self.views.notify_removed(t, id, &self.stores);
        }
        self.stores.remove_entity_everywhere(id);
        self.alloc.destroy(id);

        Ok(())
    }

    /// Attaches a default-initialised `T` record to `id` and returns a
    /// re-resolving handle to it.
    ///
    /// When `id` already owns a `T`, the existing record is kept and no
    /// view is notified. When `id` is dead or stale, nothing is mutated
    /// and the returned handle never resolves.
    pub fn add_component<T: Component>(&mut self, id: Entity) -> CompRef<T> {
        if !self.alloc.is_alive(id) {
            warn!("component insert skipped because {:?} was dead", id);
            return CompRef::new(id);
        }

        let store = self.stores.get_or_create::<T>();
        if store.contains(id) {
            return CompRef::new(id);
        }
        store.add(id);

        self.views.notify_added(comp_id::<T>(), id, &self.stores);

        CompRef::new(id)
    }

    /// Detaches `id`'s `T` record, if any. Views are notified before the
    /// record is dropped, so their handlers still see it. A quiet no-op
    /// when no `T` store exists.
    pub fn remove_component<T: Component>(&mut self, id: Entity) {
        if self.stores.get::<T>().is_none() {
            return;
        }

        self.views.notify_removed(comp_id::<T>(), id, &self.stores);
        if let Some(store) = self.stores.get_mut::<T>() {
            store.remove(id);
        }
    }

    /// A re-resolving handle to `id`'s `T` record. Always constructible;
    /// validity is a per-use question, see [`CompRef::is_valid`].
    pub fn get_component<T: Component>(&self, id: Entity) -> CompRef<T> {
        CompRef::new(id)
    }

    /// Borrows `id`'s `T` record directly.
    ///
    /// The borrow is positionally valid only until the next mutation of
    /// the `T` store; keep a [`CompRef`] instead of a reference across
    /// mutations.
    pub fn component<T: Component>(&self, id: Entity) -> Option<&T> {
        self.stores.get::<T>()?.get(id)
    }

    /// Exclusively borrows `id`'s `T` record.
    pub fn component_mut<T: Component>(&mut self, id: Entity) -> Option<&mut T> {
        self.stores.get_mut::<T>()?.get_mut(id)
    }

    /// Read access to the `T` store, or `None` if no `T` was ever added.
    pub fn store<T: Component>(&self) -> Option<&CompVec<T>> {
        self.stores.get::<T>()
    }
}

/// A wrapper for one entity's component of type `T`.
///
/// Holds only the entity id and re-resolves on every access, so it stays
/// valid across the swap-removes and reallocations that move records
/// around. Cheap to copy and safe to keep across frames; accessing a
/// record that no longer exists simply yields `None`.
pub struct CompRef<T: Component> {
    entity: Entity,
    marker: PhantomData<fn() -> T>,
}

impl<T: Component> Clone for CompRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Component> Copy for CompRef<T> {}

impl<T: Component> fmt::Debug for CompRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CompRef").field("entity", &self.entity).finish()
    }
}

impl<T: Component> CompRef<T> {
    pub(crate) fn new(entity: Entity) -> Self {
        CompRef {
            entity,
            marker: PhantomData,
        }
    }

    /// The entity id this handle resolves through.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Returns `true` if the handle currently resolves to a record.
    pub fn is_valid(&self, world: &World) -> bool {
        world.component::<T>(self.entity).is_some()
    }

    /// Borrows the record, or `None` when the entity died or the
    /// component was removed.
    pub fn get<'w>(&self, world: &'w World) -> Option<&'w T> {
        world.component::<T>(self.entity)
    }

    /// Exclusively borrows the record.
    pub fn get_mut<'w>(&self, world: &'w mut World) -> Option<&'w mut T> {
        world.component_mut::<T>(self.entity)
    }
}
