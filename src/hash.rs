//! Identity hashing for property blocks
//!
//! A block's defining fields are serialized to canonical JSON and hashed with
//! SHA-256. The full hex digest is kept for exact-match dedup across runs;
//! an 8-character prefix goes into the human-facing record id.

use crate::parser::{BlockType, PropertyBlock};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Length of the digest prefix embedded in record ids
pub const SHORT_HASH_LEN: usize = 8;

/// Canonical form of a block. Field order is fixed by the struct.
#[derive(Serialize)]
struct CanonicalBlock<'a> {
    name: &'a str,
    block_type: BlockType,
    start_line: usize,
    end_line: usize,
    content: &'a [String],
    methods_in_block: &'a [String],
}

/// Lowercase hex SHA-256 of a block
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockHash(String);

impl BlockHash {
    pub fn full(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..SHORT_HASH_LEN]
    }
}

/// Hash a block over name, type, line span, (expanded) content and methods
pub fn hash_block(block: &PropertyBlock) -> Result<BlockHash, serde_json::Error> {
    let canonical = serde_json::to_string(&CanonicalBlock {
        name: &block.name,
        block_type: block.block_type,
        start_line: block.start_line,
        end_line: block.end_line,
        content: &block.content,
        methods_in_block: &block.methods_in_block,
    })?;
    Ok(BlockHash(format!("{:x}", Sha256::digest(canonical.as_bytes()))))
}
