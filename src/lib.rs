//! # cvl-index
//!
//! CVL Index: links Certora verification properties to the Solidity functions
//! they exercise and emits flat records for a retrieval index.
//!
//! This crate provides:
//! - A lexical block scanner for `function`/`rule`/`invariant`/`methods` blocks
//! - Method, state-variable and function-table extraction
//! - Heuristic target linkage, mutation classification and cross-reference expansion
//! - Content hashing and index record building
//! - A batch pipeline (`cvl-index batch`) that indexes every contract/spec pair
//!   in a directory
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use cvl_index::pipeline::index_sources;
//!
//! let sol = "contract Vault { mapping(address => uint) balance; \
//!            function withdraw(uint amount) external { balance[msg.sender] -= amount; } }";
//! let spec = "rule onlyOwnerCanWithdraw { withdraw(100); }\n";
//! let records = index_sources("Vault.sol", sol, Path::new("Vault.spec"), spec).unwrap();
//! assert_eq!(records.len(), 2);
//! ```
//!
//! Everything here is text-level heuristics. Nothing is compiled or type-checked.

pub mod config;
pub mod error;
pub mod hash;
pub mod linker;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod record;

pub use config::IndexerConfig;
pub use error::{IndexError, IndexResult};
pub use pipeline::{index_sources, run_batch, BatchReport, ContractSpecPair};
pub use record::{ChunkType, IndexRecord};
