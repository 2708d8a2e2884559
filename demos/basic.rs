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

#[derive(Debug, Default)]
struct Health(i32);
impl Component for Health {}

fn main() {
    let mut world = World::new();

    for i in 0..4 {
        let e = world.create_entity();

        world.add_component::<Pos>(e);
        let vel = world.add_component::<Vel>(e);
        vel.get_mut(&mut world).unwrap().x = i as f32;

        // only half of them can take damage
        if i % 2 == 0 {
            world.add_component::<Health>(e);
            world.component_mut::<Health>(e).unwrap().0 = 100;
        }
    }

    let movement = View::<(Pos, Vel)>::new(&mut world);
    let mortal = View::<(Health,)>::new(&mut world);

    for step in 0..3 {
        movement.for_each(&mut world, |(pos, vel)| {
            pos.x += vel.x;
            pos.y += vel.y;
        });

        mortal.for_each(&mut world, |(health,)| {
            health.0 -= 7;
        });

        println!("step {}:", step);
        movement.for_each(&mut world, |(pos, vel)| {
            println!("  pos ({:5.1}, {:5.1})  vel ({:.1}, {:.1})", pos.x, pos.y, vel.x, vel.y);
        });
    }

    println!(
        "{} movers, {} mortals",
        movement.len(&world),
        mortal.len(&world)
    );

    movement.destroy(&mut world);
    mortal.destroy(&mut world);
}
