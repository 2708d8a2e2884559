use super::{roster::Roster, *};
use crate::{
    storage::Stores,
    world::Entity,
};

#[derive(Default)]
struct CompA(u32);

impl Component for CompA {}

#[derive(Default)]
struct CompB(u32);

impl Component for CompB {}

#[derive(Default)]
struct CompC(u32);

impl Component for CompC {}

fn ent(index: u32) -> Entity {
    Entity::new(index, 1)
}

fn ab_roster() -> Roster {
    Roster::new(vec![comp_id::<CompA>(), comp_id::<CompB>()])
}

/// Every block must point at the entity's current record in every
/// participating store.
fn assert_blocks_current(roster: &Roster, stores: &Stores) {
    for (m, block) in roster.blocks().enumerate() {
        let id = stores
            .get_base(roster.type_ids()[0])
            .and_then(|base| {
                base.entity_index()
                    .iter()
                    .find(|&(_, &index)| index == block[0])
                    .map(|(&id, _)| id)
            })
            .expect("block 0 index has an owner");

        for (j, &t) in roster.type_ids().iter().enumerate() {
            let base = stores.get_base(t).expect("participating store exists");
            assert_eq!(
                base.entity_index().get(&id),
                Some(&block[j]),
                "block {} column {} is stale",
                m,
                j
            );
        }
    }
}

#[test]
#[should_panic(expected = "must not name the same component type twice")]
fn duplicate_types_are_rejected() {
    let _ = Roster::new(vec![comp_id::<CompA>(), comp_id::<CompA>()]);
}

#[test]
fn rebuild_takes_the_intersection() {
    let mut stores = Stores::default();
    for i in 1..=3 {
        stores.get_or_create::<CompA>().add(ent(i));
    }
    stores.get_or_create::<CompB>().add(ent(1));
    stores.get_or_create::<CompB>().add(ent(3));

    let mut roster = ab_roster();
    roster.rebuild(&stores);

    assert_eq!(roster.len(), 2);
    assert!(roster.contains(ent(1)));
    assert!(roster.contains(ent(3)));
    assert!(!roster.contains(ent(2)));
    assert_blocks_current(&roster, &stores);
}

#[test]
fn rebuild_with_missing_store_is_empty() {
    let mut stores = Stores::default();
    stores.get_or_create::<CompA>().add(ent(1));

    let mut roster = ab_roster();
    roster.rebuild(&stores);

    assert_eq!(roster.len(), 0);
}

#[test]
fn on_added_waits_for_the_full_set() {
    let mut stores = Stores::default();
    let mut roster = ab_roster();

    stores.get_or_create::<CompA>().add(ent(1));
    roster.on_added(comp_id::<CompA>(), ent(1), &stores);
    assert_eq!(roster.len(), 0);

    stores.get_or_create::<CompB>().add(ent(1));
    roster.on_added(comp_id::<CompB>(), ent(1), &stores);
    assert_eq!(roster.len(), 1);
    assert_blocks_current(&roster, &stores);
}

#[test]
fn on_added_is_idempotent() {
    let mut stores = Stores::default();
    let mut roster = ab_roster();

    stores.get_or_create::<CompA>().add(ent(1));
    stores.get_or_create::<CompB>().add(ent(1));

    roster.on_added(comp_id::<CompA>(), ent(1), &stores);
    roster.on_added(comp_id::<CompA>(), ent(1), &stores);
    roster.on_added(comp_id::<CompB>(), ent(1), &stores);

    assert_eq!(roster.len(), 1);
    let blocks: Vec<Vec<u32>> = roster.blocks().map(<[u32]>::to_vec).collect();
    assert_eq!(blocks.len(), 1);
}

#[test]
fn unwatched_notifications_are_ignored() {
    let mut stores = Stores::default();
    let mut roster = ab_roster();

    stores.get_or_create::<CompA>().add(ent(1));
    stores.get_or_create::<CompB>().add(ent(1));
    roster.on_added(comp_id::<CompA>(), ent(1), &stores);

    roster.on_added(comp_id::<CompC>(), ent(2), &stores);
    roster.on_removed(comp_id::<CompC>(), ent(1), &stores);

    assert_eq!(roster.len(), 1);
    assert!(roster.contains(ent(1)));
}

#[test]
fn on_removed_swaps_and_repoints() {
    let mut stores = Stores::default();
    let mut roster = ab_roster();

    for i in 1..=3 {
        stores.get_or_create::<CompA>().add(ent(i));
        stores.get_or_create::<CompB>().add(ent(i));
        roster.on_added(comp_id::<CompB>(), ent(i), &stores);
    }
    assert_eq!(roster.len(), 3);

    // evict the first member, notify-then-mutate like the world does; the
    // A store swaps ent(3)'s record into the hole and the roster's saved
    // index has to follow
    roster.on_removed(comp_id::<CompA>(), ent(1), &stores);
    stores.get_or_create::<CompA>().remove(ent(1));

    assert_eq!(roster.len(), 2);
    assert!(!roster.contains(ent(1)));
    assert_blocks_current(&roster, &stores);

    // evicting the member owning the last records takes the pop-only path
    roster.on_removed(comp_id::<CompB>(), ent(3), &stores);
    stores.get_or_create::<CompB>().remove(ent(3));

    assert_eq!(roster.len(), 1);
    assert!(roster.contains(ent(2)));
    assert_blocks_current(&roster, &stores);
}

#[test]
fn removal_of_a_non_member_still_repairs_members() {
    let mut stores = Stores::default();
    let mut roster = ab_roster();

    // ent(1) lacks B and stays out of the roster; ent(2) is a member and
    // owns the A store's last record
    stores.get_or_create::<CompA>().add(ent(1));
    stores.get_or_create::<CompA>().add(ent(2));
    stores.get_or_create::<CompB>().add(ent(2));
    roster.on_added(comp_id::<CompB>(), ent(2), &stores);
    assert_eq!(roster.len(), 1);

    roster.on_removed(comp_id::<CompA>(), ent(1), &stores);
    stores.get_or_create::<CompA>().remove(ent(1));

    assert_eq!(roster.len(), 1);
    assert_blocks_current(&roster, &stores);
}

#[test]
fn on_removed_for_non_member_is_ignored() {
    let mut stores = Stores::default();
    let mut roster = ab_roster();

    stores.get_or_create::<CompA>().add(ent(1));
    stores.get_or_create::<CompB>().add(ent(1));
    roster.on_added(comp_id::<CompA>(), ent(1), &stores);

    roster.on_removed(comp_id::<CompA>(), ent(9), &stores);
    assert_eq!(roster.len(), 1);
}

#[test]
fn view_over_existing_components() {
    let mut world = World::new();

    let e1 = world.create_entity();
    let e2 = world.create_entity();
    let e3 = world.create_entity();

    for &e in &[e1, e2, e3] {
        world.add_component::<CompA>(e);
        world.component_mut::<CompA>(e).unwrap().0 = e.index();
    }
    world.add_component::<CompB>(e1);
    world.add_component::<CompB>(e3);

    let view = View::<(CompA, CompB)>::new(&mut world);
    assert_eq!(view.len(&world), 2);

    let mut visited = Vec::new();
    view.for_each(&mut world, |(a, _b)| visited.push(a.0));
    visited.sort_unstable();

    assert_eq!(visited, vec![e1.index(), e3.index()]);
    view.destroy(&mut world);
}

#[test]
fn view_tracks_incremental_add_and_remove() {
    let mut world = World::new();
    let view = View::<(CompA, CompB)>::new(&mut world);

    let e1 = world.create_entity();
    let e2 = world.create_entity();

    world.add_component::<CompA>(e1);
    world.add_component::<CompA>(e2);
    assert!(view.is_empty(&world));

    world.add_component::<CompB>(e1);
    assert_eq!(view.len(&world), 1);

    world.add_component::<CompB>(e2);
    assert_eq!(view.len(&world), 2);

    world.remove_component::<CompA>(e1);
    assert_eq!(view.len(&world), 1);

    let mut count = 0;
    view.for_each(&mut world, |(a, b)| {
        a.0 += 1;
        b.0 += 1;
        count += 1;
    });
    assert_eq!(count, 1);
    assert_eq!(world.component::<CompA>(e2).unwrap().0, 1);
    assert_eq!(world.component::<CompA>(e1).map(|a| a.0), None);

    view.destroy(&mut world);
}

#[test]
fn destroyed_view_stops_tracking() {
    let mut world = World::new();
    let view = View::<(CompA,)>::new(&mut world);

    let e = world.create_entity();
    world.add_component::<CompA>(e);
    assert_eq!(view.len(&world), 1);

    view.destroy(&mut world);

    // new views can be created afterwards and see current storage
    let view = View::<(CompA,)>::new(&mut world);
    assert_eq!(view.len(&world), 1);
    view.destroy(&mut world);
}

#[test]
fn rebuild_matches_incremental_state() {
    let mut world = World::new();
    let view = View::<(CompA, CompB)>::new(&mut world);

    let mut expected = 0;
    for i in 0..64 {
        let e = world.create_entity();
        world.add_component::<CompA>(e);
        if i % 3 == 0 {
            world.add_component::<CompB>(e);
            expected += 1;
        }
    }

    assert_eq!(view.len(&world), expected);
    view.rebuild(&mut world);
    assert_eq!(view.len(&world), expected);

    view.destroy(&mut world);
}

#[cfg(feature = "parallel")]
#[test]
fn par_for_each_visits_every_block_once() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let mut world = World::new();
    let view = View::<(CompA, CompB)>::new(&mut world);

    for i in 0..1_000 {
        let e = world.create_entity();
        world.add_component::<CompA>(e);
        world.component_mut::<CompA>(e).unwrap().0 = i;
        world.add_component::<CompB>(e);
    }

    let visits = AtomicUsize::new(0);
    // min_len 1 forces the pool even for this small world
    view.par_for_each_min(&mut world, 1, |(a, b)| {
        b.0 = a.0 * 2;
        visits.fetch_add(1, Ordering::Relaxed);
    });

    assert_eq!(visits.load(Ordering::Relaxed), 1_000);

    let mut checked = 0;
    view.for_each(&mut world, |(a, b)| {
        assert_eq!(b.0, a.0 * 2);
        checked += 1;
    });
    assert_eq!(checked, 1_000);

    view.destroy(&mut world);
}

#[cfg(feature = "parallel")]
#[test]
fn par_for_each_below_cutoff_stays_sequential() {
    let mut world = World::new();
    let view = View::<(CompA,)>::new(&mut world);

    for _ in 0..10 {
        let e = world.create_entity();
        world.add_component::<CompA>(e);
    }

    let mut hits = 0usize;
    let hits_cell = std::sync::Mutex::new(&mut hits);
    view.par_for_each(&mut world, |(a,)| {
        a.0 += 1;
        **hits_cell.lock().unwrap() += 1;
    });
    assert_eq!(hits, 10);

    view.destroy(&mut world);
}
