//! CVL spec parsing
//!
//! Extracts the declared methods and the rule/invariant property blocks of one
//! spec file.

use super::blocks::{contains_word, scan_blocks, BlockEnd, BlockScanner};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// CVL built-ins that look like method declarations but are not contract methods
const BUILTIN_PREDICATES: [&str; 2] = ["require", "assert"];

/// Kind of verification property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Rule,
    Invariant,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Rule => "RULE",
            BlockType::Invariant => "INVARIANT",
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            BlockType::Rule => "rule",
            BlockType::Invariant => "invariant",
        }
    }

    fn block_end(&self) -> BlockEnd {
        match self {
            BlockType::Rule => BlockEnd::Balanced,
            BlockType::Invariant => BlockEnd::Statement,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule or invariant from a spec file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyBlock {
    pub block_type: BlockType,
    pub name: String,
    /// Spec file the block came from
    pub file_path: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
    /// Block lines; replaced by the expanded content during cross-reference expansion
    pub content: Vec<String>,
    /// Declared methods whose bare name occurs in the block as a whole identifier
    pub methods_in_block: Vec<String>,
}

impl PropertyBlock {
    pub fn body(&self) -> String {
        self.content.join("\n")
    }
}

/// Method names declared in the first `methods { ... }` block.
///
/// Accepts CVL1 (`balanceOf(address) returns (uint) envfree`) and CVL2
/// (`function balanceOf(address) external returns (uint) envfree;`) entries,
/// including receiver-qualified ones such as `_token.transfer(..)`.
pub fn extract_methods(spec: &str) -> Result<Vec<String>, regex::Error> {
    let Some(block) = scan_blocks(spec, "methods")?.into_iter().next() else {
        return Ok(Vec::new());
    };

    let entry = Regex::new(
        r"^(?:function\s+)?([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\(",
    )?;

    let mut seen = HashSet::new();
    let mut methods = Vec::new();
    for line in block.text.lines() {
        let Some(caps) = entry.captures(line.trim_start()) else {
            continue;
        };
        let Some(name) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if BUILTIN_PREDICATES.contains(&name) {
            continue;
        }
        if seen.insert(name.to_string()) {
            methods.push(name.to_string());
        }
    }

    Ok(methods)
}

/// Name of a method without its receiver qualifier (`_token.transfer` -> `transfer`)
pub fn bare_method_name(method: &str) -> &str {
    method.rsplit('.').next().unwrap_or(method)
}

/// Parse every rule and invariant in `spec`, ordered by position.
///
/// Property names are unique per file: a later block reusing a name is dropped.
pub fn parse_properties(
    spec: &str,
    file_path: &Path,
    methods: &[String],
) -> Result<Vec<PropertyBlock>, regex::Error> {
    let mut located = Vec::new();
    for block_type in [BlockType::Rule, BlockType::Invariant] {
        let scanner = BlockScanner::new(block_type.keyword(), block_type.block_end())?;
        located.extend(
            scanner
                .scan(spec)
                .into_iter()
                .filter(|b| !b.name.is_empty())
                .map(|b| (block_type, b)),
        );
    }
    located.sort_by_key(|(_, b)| b.start);

    let mut names = HashSet::new();
    let mut properties = Vec::new();
    for (block_type, block) in located {
        if !names.insert(block.name.clone()) {
            log::warn!(
                "{}: duplicate property `{}` at line {} ignored",
                file_path.display(),
                block.name,
                block.start_line
            );
            continue;
        }

        let methods_in_block = methods
            .iter()
            .filter(|m| contains_word(&block.text, bare_method_name(m)))
            .cloned()
            .collect();

        properties.push(PropertyBlock {
            block_type,
            content: block.lines(),
            name: block.name,
            file_path: file_path.to_path_buf(),
            start_line: block.start_line,
            end_line: block.end_line,
            methods_in_block,
        });
    }

    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = r#"methods {
    balanceOf(address) returns (uint) envfree
    totalSupply() returns (uint) envfree
    _token.transfer(address, uint) returns (bool)
    balanceOf(address) returns (uint) envfree
}

// rule commentedOut { }

invariant totalSupplyMatches() balanceSum == totalSupply;

rule onlyOwnerCanWithdraw {
    env e;
    require e.msg.sender != owner();
    withdraw@withrevert(e, 100);
    assert lastReverted;
}

rule transferMoves(address to) {
    env e;
    _token.transfer(e, to, 1);
    assert balanceOf(to) > 0;
}
"#;

    #[test]
    fn test_extract_methods() {
        let methods = extract_methods(SPEC).unwrap();
        assert_eq!(methods, vec!["balanceOf", "totalSupply", "_token.transfer"]);
    }

    #[test]
    fn test_extract_methods_cvl2_and_builtins() {
        let spec = "methods {\n    function balanceOf(address) external returns (uint) envfree;\n    require(x);\n    assert(y);\n}\n";
        let methods = extract_methods(spec).unwrap();
        assert_eq!(methods, vec!["balanceOf"]);
    }

    #[test]
    fn test_no_methods_block() {
        assert!(extract_methods("rule r { }").unwrap().is_empty());
    }

    #[test]
    fn test_parse_properties_in_file_order() {
        let methods = extract_methods(SPEC).unwrap();
        let props = parse_properties(SPEC, Path::new("Vault.spec"), &methods).unwrap();
        let names: Vec<_> = props.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["totalSupplyMatches", "onlyOwnerCanWithdraw", "transferMoves"]);

        assert_eq!(props[0].block_type, BlockType::Invariant);
        assert_eq!((props[0].start_line, props[0].end_line), (10, 10));
        assert!(props[0].methods_in_block.contains(&"totalSupply".to_string()));

        assert_eq!(props[1].block_type, BlockType::Rule);
        assert_eq!((props[1].start_line, props[1].end_line), (12, 17));
        assert!(props[1].methods_in_block.is_empty());

        assert_eq!(
            props[2].methods_in_block,
            vec!["balanceOf".to_string(), "_token.transfer".to_string()]
        );
        assert_eq!(props[2].file_path, PathBuf::from("Vault.spec"));
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let spec = "rule dup { first(); }\nrule dup { second(); }\n";
        let props = parse_properties(spec, Path::new("d.spec"), &[]).unwrap();
        assert_eq!(props.len(), 1);
        assert!(props[0].body().contains("first"));
    }

    #[test]
    fn test_methods_in_block_whole_identifier() {
        let methods = vec!["bid".to_string(), "getHighestBid".to_string(), "_token.transfer".to_string()];
        let spec = "invariant highestNeverDrops() getHighestBid() >= 0 && transferFrom(a) == 0;\n";
        let props = parse_properties(spec, Path::new("a.spec"), &methods).unwrap();
        assert_eq!(props[0].methods_in_block, vec!["getHighestBid".to_string()]);
    }

    #[test]
    fn test_bare_method_name() {
        assert_eq!(bare_method_name("_token.transfer"), "transfer");
        assert_eq!(bare_method_name("a.b.c"), "c");
        assert_eq!(bare_method_name("mint"), "mint");
    }
}
