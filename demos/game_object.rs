//! A thin game-object wrapper written as client code: the library hands out
//! plain entity ids and re-resolving component handles, which is everything
//! an owning wrapper needs.

use sparsec::{CompRef, Component, Entity, View, World};

#[derive(Debug, Default)]
struct Transform {
    x: f32,
    y: f32,
}
impl Component for Transform {}

#[derive(Debug, Default)]
struct Sprite {
    frame: u32,
}
impl Component for Sprite {}

struct GameObject {
    name: String,
    id: Entity,
}

impl GameObject {
    fn spawn(world: &mut World, name: &str) -> Self {
        GameObject {
            name: name.to_owned(),
            id: world.create_entity(),
        }
    }

    fn add<T: Component>(&self, world: &mut World) -> CompRef<T> {
        world.add_component::<T>(self.id)
    }

    fn component<T: Component>(&self, world: &World) -> CompRef<T> {
        world.get_component::<T>(self.id)
    }

    fn despawn(self, world: &mut World) {
        let _ = world.delete_entity(self.id);
    }
}

fn main() {
    let mut world = World::new();

    let player = GameObject::spawn(&mut world, "player");
    player.add::<Transform>(&mut world);
    player.add::<Sprite>(&mut world);

    let ghost = GameObject::spawn(&mut world, "ghost");
    ghost.add::<Transform>(&mut world);

    let transform = player.component::<Transform>(&world);
    transform.get_mut(&mut world).unwrap().x = 10.0;

    let drawable = View::<(Transform, Sprite)>::new(&mut world);
    drawable.for_each(&mut world, |(t, s)| {
        println!("drawing frame {} at ({}, {})", s.frame, t.x, t.y);
    });

    println!("{} drawable of 2 spawned", drawable.len(&world));

    let name = ghost.name.clone();
    ghost.despawn(&mut world);
    println!("{} despawned, handle valid: {}", name, transform.is_valid(&world));

    drawable.destroy(&mut world);
}
