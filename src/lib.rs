#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

//! # Sparsec ECS
//!
//! A small, embeddable Entity-Component-System runtime. Entities are
//! generational `(index, salt)` ids; components are plain data records held
//! in dense per-type stores with O(1) add/remove/lookup; views track, as
//! components come and go, the set of entities owning a chosen conjunction
//! of component types and iterate them in bulk, sequentially or on a
//! worker pool.
//!
//! ```
//! use sparsec::{Component, View, World};
//!
//! #[derive(Default)]
//! struct Pos {
//!     x: f32,
//!     y: f32,
//! }
//! impl Component for Pos {}
//!
//! #[derive(Default)]
//! struct Vel {
//!     x: f32,
//!     y: f32,
//! }
//! impl Component for Vel {}
//!
//! let mut world = World::new();
//!
//! let e = world.create_entity();
//! world.add_component::<Pos>(e);
//! let vel = world.add_component::<Vel>(e);
//! vel.get_mut(&mut world).unwrap().x = 2.0;
//!
//! let movement = View::<(Pos, Vel)>::new(&mut world);
//! movement.for_each(&mut world, |(pos, vel)| {
//!     pos.x += vel.x;
//!     pos.y += vel.y;
//! });
//!
//! assert_eq!(world.component::<Pos>(e).unwrap().x, 2.0);
//! movement.destroy(&mut world);
//! ```

pub use crate::{
    error::StaleEntity,
    storage::CompVec,
    view::{ComponentSet, View},
    world::{comp_id, CompId, CompRef, Component, Entity, Index, Salt, World},
};

#[cfg(feature = "parallel")]
pub use crate::view::PAR_MIN_LEN;

mod error;
#[cfg(feature = "parallel")]
mod pool;
mod storage;
mod view;
mod world;

pub mod prelude;
