//! Sparsec error module.
//!
//! Every fallible operation in this crate reports through its return value;
//! nothing here is fatal. The only named error is `StaleEntity`, returned
//! when an operation requires a live entity id and got a dead or recycled
//! one.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::world::Entity;

/// Stale entity error.
///
/// Returned by [`World::delete_entity`](crate::World::delete_entity) when the
/// given id is dead, or when its slot has since been recycled under a newer
/// salt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StaleEntity {
    /// The id that failed to resolve, containing the index and the
    /// no-longer-valid salt.
    pub entity: Entity,
}

impl Display for StaleEntity {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(
            f,
            "entity {:?} is not alive (destroyed, or its index was recycled)",
            self.entity
        )
    }
}

impl std::error::Error for StaleEntity {}
