//! Prelude module
//!
//! Contains the most common types, ready for a glob import.

pub use crate::{
    CompId, CompRef, CompVec, Component, ComponentSet, Entity, Index, Salt, StaleEntity, View,
    World,
};
