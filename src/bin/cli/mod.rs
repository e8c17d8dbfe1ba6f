//! CLI module for cvl-index
//!
//! Pair filtering and batch report formatting

pub mod filters;
pub mod output;
