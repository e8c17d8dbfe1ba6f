//! Solidity source parsing
//!
//! Builds the function table and the state-variable set of one contract file.

use super::blocks::{mask_non_code, scan_blocks};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

/// A function found in contract source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFunction {
    /// Function name (e.g., "withdraw")
    pub name: String,
    /// 1-based line of the `function` keyword
    pub start_line: usize,
    /// 1-based line of the closing brace
    pub end_line: usize,
    /// Header and body lines, in source order
    pub body: Vec<String>,
}

impl SourceFunction {
    pub fn text(&self) -> String {
        self.body.join("\n")
    }
}

/// Functions of one contract, keyed by name.
///
/// Overloads collapse: a later definition with the same name replaces the
/// earlier one. Declaration order of first appearance is kept for listings.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, SourceFunction>,
    order: Vec<String>,
}

impl FunctionTable {
    /// Scan contract source for `function` blocks
    pub fn from_source(source: &str) -> Result<Self, regex::Error> {
        let functions = scan_blocks(source, "function")?
            .into_iter()
            .filter(|b| !b.name.is_empty())
            .map(|b| SourceFunction {
                body: b.lines(),
                name: b.name,
                start_line: b.start_line,
                end_line: b.end_line,
            });
        Ok(Self::from_functions(functions))
    }

    pub fn from_functions<I>(functions: I) -> Self
    where
        I: IntoIterator<Item = SourceFunction>,
    {
        let mut table = FunctionTable::default();
        for func in functions {
            if table.functions.contains_key(&func.name) {
                log::debug!("function `{}` redefined; keeping the later definition", func.name);
            } else {
                table.order.push(func.name.clone());
            }
            table.functions.insert(func.name.clone(), func);
        }
        table
    }

    pub fn get(&self, name: &str) -> Option<&SourceFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Function names in order of first declaration
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Names of contract-level storage variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateVariableSet {
    names: BTreeSet<String>,
}

impl StateVariableSet {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

impl FromIterator<String> for StateVariableSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        StateVariableSet {
            names: iter.into_iter().collect(),
        }
    }
}

// Elementary, user-defined or array type, optionally `address payable`
const TYPE: &str = r"[A-Za-z_][A-Za-z0-9_.]*(?:[ \t]*\[[^\]\n]*\])*(?:\s+payable)?";
const VISIBILITY: &str = r"(?:public|private|internal)";
const MODIFIERS: &str = r"(?:\s+(?:constant|immutable|override))*";
const IDENT: &str = r"([A-Za-z_][A-Za-z0-9_]*)";

/// Extract storage variable names from contract source.
///
/// Only three declaration shapes are recognised, each anchored at line start
/// and at the terminating `;`:
/// - `uint256 public total;`
/// - `address private immutable owner = msg.sender;`
/// - `mapping(address => uint) balance;`
///
/// Locals and parameters never match; unusual declaration styles are missed.
pub fn extract_state_variables(source: &str) -> Result<StateVariableSet, regex::Error> {
    let masked = mask_non_code(source);

    let bare = Regex::new(&format!(
        r"(?m)^[ \t]*{TYPE}\s+{VISIBILITY}{MODIFIERS}\s+{IDENT}\s*;"
    ))?;
    let typed = Regex::new(&format!(
        r"(?m)^[ \t]*{TYPE}\s+{VISIBILITY}{MODIFIERS}\s+{IDENT}\s*=[^;=][^;]*;"
    ))?;
    let mapping = Regex::new(&format!(
        r"(?m)^[ \t]*mapping\s*\([^;]*?\)\s*(?:{VISIBILITY}\s+)?{IDENT}\s*;"
    ))?;

    let mut names = BTreeSet::new();
    for pattern in [&bare, &typed, &mapping] {
        for caps in pattern.captures_iter(&masked) {
            if let Some(name) = caps.get(1) {
                names.insert(name.as_str().to_string());
            }
        }
    }

    Ok(StateVariableSet { names })
}
