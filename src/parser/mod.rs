//! Parser module for CVL Index
//!
//! This module contains:
//! - `blocks`: keyword-introduced, brace-balanced block scanning
//! - `solidity`: function table and state variables of a contract
//! - `cvl`: methods block and rule/invariant blocks of a spec

pub mod blocks;
pub mod cvl;
pub mod solidity;

pub use blocks::{contains_word, scan_blocks, Block, BlockEnd, BlockScanner};
pub use cvl::{extract_methods, parse_properties, BlockType, PropertyBlock};
pub use solidity::{extract_state_variables, FunctionTable, SourceFunction, StateVariableSet};
