//! Filtering logic for batch runs
//!
//! Selects contract/spec pairs by name pattern.

use cvl_index::ContractSpecPair;

/// Check whether a pair passes the optional name filter
pub fn matches_pair(pair: &ContractSpecPair, name: Option<&str>) -> bool {
    match name {
        Some(pattern) => matches_name(&pair.name, pattern),
        None => true,
    }
}

/// Check if a pair name matches pattern (`*` matches any run of characters)
fn matches_name(pair_name: &str, pattern: &str) -> bool {
    if !pattern.contains('*') {
        return pair_name == pattern;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return true,
    };
    let Some(mut remaining) = pair_name.strip_prefix(first) else {
        return false;
    };

    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return remaining.is_empty(),
    };
    for part in middle {
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }
    remaining.ends_with(last)
}
