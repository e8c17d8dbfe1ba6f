//! Target-linkage resolution
//!
//! Associates a property with the contract functions its text exercises.

use crate::parser::cvl::bare_method_name;
use crate::parser::FunctionTable;
use std::collections::BTreeSet;
use std::fmt;

/// The functions a property is linked to
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TargetLinkage {
    /// Invariant with no specific function: applies to the whole contract
    All,
    /// Nothing matched
    Unknown,
    /// Sorted, deduplicated function names
    Functions(Vec<String>),
}

impl TargetLinkage {
    /// Linked function names (empty for the sentinels)
    pub fn functions(&self) -> &[String] {
        match self {
            TargetLinkage::Functions(names) => names,
            TargetLinkage::All | TargetLinkage::Unknown => &[],
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, TargetLinkage::Functions(_))
    }
}

impl fmt::Display for TargetLinkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetLinkage::All => f.write_str("ALL"),
            TargetLinkage::Unknown => f.write_str("UNKNOWN"),
            TargetLinkage::Functions(names) => f.write_str(&names.join("/")),
        }
    }
}

impl From<TargetLinkage> for String {
    fn from(linkage: TargetLinkage) -> Self {
        linkage.to_string()
    }
}

impl From<String> for TargetLinkage {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ALL" => TargetLinkage::All,
            "UNKNOWN" | "" => TargetLinkage::Unknown,
            joined => {
                let names: BTreeSet<String> = joined.split('/').map(String::from).collect();
                TargetLinkage::Functions(names.into_iter().collect())
            }
        }
    }
}

/// Resolve which functions `body` exercises.
///
/// Two sources of evidence are unioned:
/// - methods-block entries present in the block whose bare name is a known function
/// - any known function name invoked in the body (`name(` or `name@`, as a whole
///   identifier, case-insensitive)
///
/// With no match, a body mentioning `invariant` links to `ALL`, anything else
/// to `UNKNOWN`.
pub fn resolve_target(
    body: &str,
    methods_in_block: &[String],
    functions: &FunctionTable,
) -> TargetLinkage {
    let mut matches = BTreeSet::new();

    for method in methods_in_block {
        let bare = bare_method_name(method);
        if functions.contains(bare) {
            matches.insert(bare.to_string());
        }
    }

    let lowered = body.to_lowercase();
    for name in functions.names() {
        if is_invoked(&lowered, &name.to_lowercase()) {
            matches.insert(name.clone());
        }
    }

    if matches.is_empty() {
        if lowered.contains("invariant") {
            return TargetLinkage::All;
        }
        return TargetLinkage::Unknown;
    }

    TargetLinkage::Functions(matches.into_iter().collect())
}

/// `name(` or `name@` in `text`, with `name` not the tail of a longer identifier
fn is_invoked(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    text.match_indices(name).any(|(pos, _)| {
        let starts_word = text[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        starts_word && matches!(text[pos + name.len()..].chars().next(), Some('(' | '@'))
    })
}
