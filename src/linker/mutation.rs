//! Mutation classifier
//!
//! Flags functions that look like they change contract state. Purely textual:
//! false positives and false negatives are expected and kept as they are.

use crate::parser::{contains_word, StateVariableSet};

/// External calls treated as read-only
const READ_ONLY_CALLS: [&str; 2] = ["balanceOf", "totalSupply"];

/// True when `body` assigns a tracked state variable, or makes a non-read-only
/// `.call(` style invocation without being marked `view`.
pub fn modifies_state(body: &str, state_vars: &StateVariableSet) -> bool {
    assigns_state_variable(body, state_vars) || makes_mutating_call(body)
}

fn assigns_state_variable(body: &str, state_vars: &StateVariableSet) -> bool {
    body.split(';').any(|statement| match assignment_lhs(statement) {
        Some(lhs) => state_vars.iter().any(|var| contains_word(lhs, var)),
        None => false,
    })
}

/// Left-hand side of the first assignment operator in `statement`.
///
/// `=` and compound forms (`+=`, `<<=`, ...) count; `==`, `!=`, `<=`, `>=`
/// and `=>` do not.
fn assignment_lhs(statement: &str) -> Option<&str> {
    let bytes = statement.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'=' {
            continue;
        }
        if matches!(bytes.get(i + 1), Some(b'=') | Some(b'>')) {
            continue;
        }
        match i.checked_sub(1).map(|p| bytes[p]) {
            Some(b'=') | Some(b'!') => continue,
            Some(prev @ (b'<' | b'>')) => {
                // `<<=` / `>>=` assign, `<=` / `>=` compare
                if i >= 2 && bytes[i - 2] == prev {
                    return Some(&statement[..i - 2]);
                }
                continue;
            }
            _ => return Some(&statement[..i]),
        }
    }
    None
}

fn makes_mutating_call(body: &str) -> bool {
    if body.to_lowercase().contains("view") {
        return false;
    }
    member_calls(body).any(|name| !READ_ONLY_CALLS.contains(&name))
}

/// Identifiers invoked as `.<identifier>(`
fn member_calls(body: &str) -> impl Iterator<Item = &str> {
    body.match_indices('.').filter_map(move |(dot, _)| {
        let rest = &body[dot + 1..];
        let len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        let ident = &rest[..len];
        let starts_ok = ident
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_');
        (starts_ok && rest[len..].starts_with('(')).then_some(ident)
    })
}
