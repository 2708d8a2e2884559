//! Type-erased view membership and the view registry.
//!
//! A [`Roster`] is the incrementally maintained part of a view: which
//! entities currently own every watched component type, and where their
//! records sit in each participating store. The typed layer in
//! [`view`](crate::view) only adds tuple plumbing on top.

use ahash::AHashMap as HashMap;

use crate::{
    storage::Stores,
    world::{CompId, Entity, Index},
};

pub(crate) type ViewId = u32;

/// Membership state of one view: watched type ids in declared order, the
/// entity → start-of-block map, and the packed record indices (one block of
/// `arity` indices per member, in type-id order). `owners` names the entity
/// of each block so a swap-removal can re-point the moved entity in O(1).
pub(crate) struct Roster {
    type_ids: Vec<CompId>,
    members: HashMap<Entity, u32>,
    packed: Vec<Index>,
    owners: Vec<Entity>,
}

impl Roster {
    /// # Panics
    ///
    /// Panics when the same component type appears twice; two blocks slots
    /// aliasing one record would hand out overlapping exclusive borrows.
    pub fn new(type_ids: Vec<CompId>) -> Self {
        let mut sorted = type_ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(
            sorted.len(),
            type_ids.len(),
            "a view must not name the same component type twice"
        );

        Roster {
            type_ids,
            members: HashMap::new(),
            packed: Vec::new(),
            owners: Vec::new(),
        }
    }

    /// Number of member entities.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Number of watched component types.
    pub fn arity(&self) -> usize {
        self.type_ids.len()
    }

    #[cfg(test)]
    pub fn type_ids(&self) -> &[CompId] {
        &self.type_ids
    }

    pub fn watches(&self, t: CompId) -> bool {
        self.type_ids.contains(&t)
    }

    /// Position of `t` within the watched types, or `None` if unwatched.
    fn column_of(&self, t: CompId) -> Option<usize> {
        self.type_ids.iter().position(|&watched| watched == t)
    }

    #[cfg(test)]
    pub fn contains(&self, id: Entity) -> bool {
        self.members.contains_key(&id)
    }

    /// Record-index blocks in block order (insertion order of the members).
    pub fn blocks(&self) -> impl Iterator<Item = &[Index]> {
        self.packed.chunks_exact(self.arity())
    }

    /// The `m`-th block.
    ///
    /// # Panics
    ///
    /// Panics if `m` is out of bounds.
    #[cfg(feature = "parallel")]
    pub fn block(&self, m: usize) -> &[Index] {
        let k = self.arity();
        &self.packed[m * k..(m + 1) * k]
    }

    /// Full resynchronisation from current storage.
    ///
    /// Scans the smallest participating store and admits every entity the
    /// other stores also contain. Leaves the roster empty when any watched
    /// type has no store yet.
    pub fn rebuild(&mut self, stores: &Stores) {
        self.members.clear();
        self.packed.clear();
        self.owners.clear();

        let mut bases = Vec::with_capacity(self.type_ids.len());
        for &t in &self.type_ids {
            match stores.get_base(t) {
                Some(base) => bases.push(base),
                None => return,
            }
        }

        // the smallest store bounds the scan
        let Some(&pivot) = bases.iter().min_by_key(|base| base.len()) else {
            return;
        };

        for &id in pivot.entity_index().keys() {
            let start = self.packed.len();
            let mut complete = true;

            for base in &bases {
                match base.entity_index().get(&id) {
                    Some(&index) => self.packed.push(index),
                    None => {
                        complete = false;
                        break;
                    }
                }
            }

            if !complete {
                self.packed.truncate(start);
                continue;
            }

            self.members.insert(id, start as u32);
            self.owners.push(id);
        }
    }

    /// Admits `id` if the added type is watched, the entity now owns every
    /// watched type, and it is not already a member. Repeated notification
    /// of the same event is a no-op.
    pub fn on_added(&mut self, t: CompId, id: Entity, stores: &Stores) {
        if !self.watches(t) || self.members.contains_key(&id) {
            return;
        }

        let start = self.packed.len();
        for &watched in &self.type_ids {
            let index = stores
                .get_base(watched)
                .and_then(|base| base.entity_index().get(&id).copied());
            match index {
                Some(index) => self.packed.push(index),
                None => {
                    // still missing at least one watched component
                    self.packed.truncate(start);
                    return;
                }
            }
        }

        self.members.insert(id, start as u32);
        self.owners.push(id);
    }

    /// Handles removal of a watched component from `id`.
    ///
    /// Invoked before the store drops the record. Two duties: re-point the
    /// member owning the store's last record, which the store is about to
    /// swap into the hole (members' saved indices must always be current),
    /// and evict `id` itself if it is a member. Unwatched types and
    /// repeated notification of the same event are no-ops.
    pub fn on_removed(&mut self, t: CompId, id: Entity, stores: &Stores) {
        let Some(column) = self.column_of(t) else {
            return;
        };

        self.repair_after_swap(column, t, id, stores);

        let pos = match self.members.remove(&id) {
            Some(pos) => pos as usize,
            None => return,
        };

        let k = self.arity();
        let last = self.packed.len() - k;

        if pos != last {
            self.packed.copy_within(last.., pos);
            let moved = self.owners[self.owners.len() - 1];
            self.members.insert(moved, pos as u32);
        }

        self.owners.swap_remove(pos / k);
        self.packed.truncate(last);
    }

    /// Removing `id`'s record from the store for `t` fills its slot with
    /// the store's current last record; when that record's owner is a
    /// member, its saved index for `t` has to follow. Idempotent: a repeat
    /// before the store mutates writes the same index again.
    fn repair_after_swap(&mut self, column: usize, t: CompId, id: Entity, stores: &Stores) {
        let Some(base) = stores.get_base(t) else {
            return;
        };
        let Some(&hole) = base.entity_index().get(&id) else {
            return;
        };

        let last = (base.len() - 1) as Index;
        if hole == last {
            // pop-only removal, nothing moves
            return;
        }

        let moved = base.entity_at(last);
        if let Some(&pos) = self.members.get(&moved) {
            self.packed[pos as usize + column] = hole;
        }
    }
}

/// The view registry: roster slots (ids are recycled through a free list)
/// plus, per component type, the list of interested views in subscription
/// order.
#[derive(Default)]
pub(crate) struct Views {
    rosters: Vec<Option<Roster>>,
    free: Vec<ViewId>,
    subscribers: HashMap<CompId, Vec<ViewId>>,
}

impl Views {
    /// Stores the roster and subscribes it to each of its watched types.
    pub fn register(&mut self, roster: Roster) -> ViewId {
        let type_ids = roster.type_ids.clone();

        let id = match self.free.pop() {
            Some(id) => {
                self.rosters[id as usize] = Some(roster);
                id
            }
            None => {
                self.rosters.push(Some(roster));
                (self.rosters.len() - 1) as ViewId
            }
        };

        for t in type_ids {
            self.subscribers.entry(t).or_default().push(id);
        }

        id
    }

    /// Drops the roster after removing it from every subscriber list.
    pub fn unregister(&mut self, id: ViewId) {
        let roster = match self.rosters.get_mut(id as usize).and_then(Option::take) {
            Some(roster) => roster,
            None => return,
        };

        for t in roster.type_ids {
            if let Some(subs) = self.subscribers.get_mut(&t) {
                subs.retain(|&v| v != id);
            }
        }

        self.free.push(id);
    }

    pub fn roster(&self, id: ViewId) -> Option<&Roster> {
        self.rosters.get(id as usize)?.as_ref()
    }

    pub fn roster_mut(&mut self, id: ViewId) -> Option<&mut Roster> {
        self.rosters.get_mut(id as usize)?.as_mut()
    }

    /// Fan-out for a component addition, in subscription order.
    pub fn notify_added(&mut self, t: CompId, id: Entity, stores: &Stores) {
        let subs = match self.subscribers.get(&t) {
            Some(subs) => subs,
            None => return,
        };

        for &view in subs {
            if let Some(roster) = self.rosters[view as usize].as_mut() {
                roster.on_added(t, id, stores);
            }
        }
    }

    /// Fan-out for a component removal, in subscription order. Must run
    /// before the store mutation so rosters still see the record.
    pub fn notify_removed(&mut self, t: CompId, id: Entity, stores: &Stores) {
        let subs = match self.subscribers.get(&t) {
            Some(subs) => subs,
            None => return,
        };

        for &view in subs {
            if let Some(roster) = self.rosters[view as usize].as_mut() {
                roster.on_removed(t, id, stores);
            }
        }
    }
}
