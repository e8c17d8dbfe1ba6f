//! Cross-reference expansion
//!
//! A rule that mentions another property (`requireInvariant solvent(a);`) gets
//! that property's lines inlined, transitively, so each record is
//! self-contained for retrieval.

use crate::parser::PropertyBlock;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Names and contents of every block, read while expanding
struct BlockTable<'a> {
    order: Vec<&'a str>,
    contents: HashMap<&'a str, &'a [String]>,
}

impl<'a> BlockTable<'a> {
    fn new(snapshot: &'a [(String, Vec<String>)]) -> Self {
        BlockTable {
            order: snapshot.iter().map(|(name, _)| name.as_str()).collect(),
            contents: snapshot
                .iter()
                .map(|(name, content)| (name.as_str(), content.as_slice()))
                .collect(),
        }
    }
}

/// Expand every block's content in place with the content of the blocks it
/// references.
///
/// All walks read the contents as they were before this call, so the result
/// does not depend on block order. Running it again adds no new lines.
pub fn expand_cross_references(blocks: &mut [PropertyBlock]) {
    let snapshot: Vec<(String, Vec<String>)> = blocks
        .iter()
        .map(|b| (b.name.clone(), b.content.clone()))
        .collect();
    let table = BlockTable::new(&snapshot);

    for block in blocks.iter_mut() {
        let visited = BTreeSet::from([block.name.clone()]);
        let (lines, visited) = expand_block(&block.name, &table, visited);
        if visited.len() > 1 {
            log::debug!(
                "`{}` expanded with {} referenced block(s)",
                block.name,
                visited.len() - 1
            );
        }
        block.content = dedup_lines(lines);
    }
}

/// Depth-first walk of `name`'s lines. The visited set is handed to each
/// recursive call and handed back, so a block is entered at most once per
/// traversal even when references form a cycle.
fn expand_block(
    name: &str,
    table: &BlockTable<'_>,
    mut visited: BTreeSet<String>,
) -> (Vec<String>, BTreeSet<String>) {
    let Some(content) = table.contents.get(name) else {
        return (Vec::new(), visited);
    };

    let mut lines = Vec::new();
    for line in content.iter() {
        lines.push(line.clone());
        for &other in &table.order {
            if other == name || visited.contains(other) || !line.contains(other) {
                continue;
            }
            visited.insert(other.to_string());
            let (nested, returned) = expand_block(other, table, visited);
            visited = returned;
            lines.extend(nested);
        }
    }

    (lines, visited)
}

/// Drop repeated lines, keeping the first occurrence
fn dedup_lines(lines: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    lines
        .into_iter()
        .filter(|line| seen.insert(line.clone()))
        .collect()
}
