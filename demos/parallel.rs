use std::time::Instant;

use sparsec::{Component, View, World};

#[derive(Debug, Default)]
struct Pos {
    x: f32,
    y: f32,
}
impl Component for Pos {}

#[derive(Debug, Default)]
struct Vel {
    x: f32,
    y: f32,
}
impl Component for Vel {}

const ENTITIES: u32 = 100_000;

fn main() {
    let mut world = World::new();

    for i in 0..ENTITIES {
        let e = world.create_entity();
        world.add_component::<Pos>(e);
        let vel = world.add_component::<Vel>(e);
        let vel = vel.get_mut(&mut world).unwrap();
        vel.x = (i % 7) as f32;
        vel.y = (i % 3) as f32;
    }

    let movement = View::<(Pos, Vel)>::new(&mut world);

    let start = Instant::now();
    for _ in 0..100 {
        movement.for_each(&mut world, |(pos, vel)| {
            pos.x += vel.x;
            pos.y += vel.y;
        });
    }
    println!("sequential: {:?}", start.elapsed());

    let start = Instant::now();
    for _ in 0..100 {
        movement.par_for_each(&mut world, |(pos, vel)| {
            pos.x -= vel.x;
            pos.y -= vel.y;
        });
    }
    println!("parallel:   {:?}", start.elapsed());

    // the two passes cancel out
    let mut drifted = 0usize;
    movement.for_each(&mut world, |(pos, _vel)| {
        if pos.x != 0.0 || pos.y != 0.0 {
            drifted += 1;
        }
    });
    println!("{} of {} drifted", drifted, movement.len(&world));

    movement.destroy(&mut world);
}
