use std::{
    collections::VecDeque,
    hash::{Hash, Hasher},
};

/// An index is basically the id of an `Entity`.
///
/// Index `0` is permanently reserved as the dead/null index; valid indices
/// start at `1`.
pub type Index = u32;

/// Per-slot counter distinguishing successive entities that reuse one index.
///
/// Also called the generation. Wraparound is permitted; an id surviving a
/// full salt cycle while its index is recycled can alias, which is an
/// accepted theoretical risk and not defended against.
pub type Salt = u16;

/// Shift the salt clear of the index bits without overflowing the 64 bit
/// hash, so it contributes entropy of its own.
const SALT_SHIFT: u32 = {
    let headroom = u64::BITS - Index::BITS - 1;
    if Index::BITS < headroom {
        Index::BITS
    } else {
        headroom
    }
};

/// `Entity` type, as seen by the user.
///
/// A pair of index and salt. Two ids are equal iff both fields match; a
/// recycled index carries a higher salt, so holding on to a destroyed
/// entity's id can never resolve to its successor.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct Entity(Index, Salt);

impl Entity {
    pub(crate) fn new(index: Index, salt: Salt) -> Entity {
        Entity(index, salt)
    }

    /// Returns the index of the `Entity`.
    #[inline]
    pub fn index(&self) -> Index {
        self.0
    }

    /// Returns the salt of the `Entity`.
    #[inline]
    pub fn salt(&self) -> Salt {
        self.1
    }

    /// Returns `true` unless this is the dead/null id.
    ///
    /// Note that this only inspects the id itself; whether the entity is
    /// still current is answered by [`World::is_alive`](crate::World::is_alive).
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.0 != 0
    }

    /// Zeroes the index, retaining the salt for the next allocation.
    pub(crate) fn mark_dead(&mut self) {
        self.0 = 0;
    }
}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(((self.1 as u64) << SALT_SHIFT) ^ self.0 as u64);
    }
}

/// Per-index record holding the currently live id for that slot, or a dead
/// placeholder retaining the last salt handed out.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct EntitySlot {
    id: Entity,
}

impl EntitySlot {
    /// The id currently stored in this slot. Dead slots keep the last salt
    /// with a zeroed index.
    #[inline]
    pub fn id(&self) -> Entity {
        self.id
    }

    /// Returns `true` if the slot holds a live entity.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.id.is_alive()
    }
}

/// Internally used structure for `Entity` allocation.
///
/// Indices of destroyed entities are recycled through a FIFO queue; every
/// reuse bumps the slot's salt so stale ids fail to resolve.
#[derive(Debug)]
pub(crate) struct Allocator {
    slots: Vec<EntitySlot>,
    free: VecDeque<Index>,
    next_index: Index,
}

impl Default for Allocator {
    fn default() -> Self {
        Allocator {
            // slot 0 is the permanently dead null slot
            slots: vec![EntitySlot::default()],
            free: VecDeque::new(),
            next_index: 1,
        }
    }
}

impl Allocator {
    /// Allocate a new entity.
    pub fn allocate(&mut self) -> Entity {
        let index = match self.free.pop_front() {
            Some(index) => index,
            None => {
                let index = self.next_index;
                self.next_index = match self.next_index.checked_add(1) {
                    Some(next) if next < Index::MAX => next,
                    _ => 1,
                };
                index
            }
        };

        if self.slots.len() <= index as usize {
            self.slots.resize_with(index as usize + 1, EntitySlot::default);
        }

        let salt = self.slots[index as usize].id.salt().wrapping_add(1);
        let id = Entity::new(index, salt);
        self.slots[index as usize].id = id;

        id
    }

    /// Returns the slot for `id` iff the id is non-null, the slot is live
    /// and the stored salt matches.
    pub fn resolve(&self, id: Entity) -> Option<&EntitySlot> {
        if !id.is_alive() {
            return None;
        }

        match self.slots.get(id.index() as usize) {
            Some(slot) if slot.is_alive() && slot.id().salt() == id.salt() => Some(slot),
            _ => None,
        }
    }

    /// Return `true` if the entity is alive.
    pub fn is_alive(&self, id: Entity) -> bool {
        self.resolve(id).is_some()
    }

    /// Marks the slot dead and queues its index for reuse. Returns `false`
    /// for ids that do not resolve.
    pub fn destroy(&mut self, id: Entity) -> bool {
        if self.resolve(id).is_none() {
            return false;
        }

        self.slots[id.index() as usize].id.mark_dead();
        self.free.push_back(id.index());

        true
    }
}
