//! Linker module for CVL Index
//!
//! This module contains:
//! - `resolver`: property → contract function linkage
//! - `mutation`: state-changing function classification
//! - `expander`: transitive inlining of referenced property blocks

pub mod expander;
pub mod mutation;
pub mod resolver;

pub use expander::expand_cross_references;
pub use mutation::modifies_state;
pub use resolver::{resolve_target, TargetLinkage};
