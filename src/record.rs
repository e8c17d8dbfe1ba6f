//! Index records
//!
//! One contract-context record per contract/spec pair, then one record per
//! property. These are the flat values the embedding collaborator consumes.

use crate::hash::hash_block;
use crate::linker::{modifies_state, TargetLinkage};
use crate::normalize::normalize_code;
use crate::parser::{BlockType, FunctionTable, PropertyBlock, StateVariableSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rule name the embedding step skips
const SANITY_RULE: &str = "sanity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChunkType {
    ContractContext,
    ContractInvariant,
    FunctionRule,
}

impl From<BlockType> for ChunkType {
    fn from(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Invariant => ChunkType::ContractInvariant,
            BlockType::Rule => ChunkType::FunctionRule,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMetadata {
    pub function_list: Vec<String>,
    pub state_variables: Vec<String>,
    /// Standard-conformance tag (ERC20, ...), not determined here
    pub is_standard: String,
    pub spec_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMetadata {
    pub rule_name: String,
    pub rule_type: BlockType,
    pub modifies_state: bool,
    pub methods_in_block: Vec<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub spec_file: String,
    pub block_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordMetadata {
    Property(PropertyMetadata),
    Context(ContextMetadata),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub chunk_type: ChunkType,
    pub source_contract: String,
    pub target_function: TargetLinkage,
    pub text_chunk: String,
    pub formal_property: Option<String>,
    /// Placeholder for a natural-language summary written by a later stage
    pub nl_summary: String,
    pub metadata: RecordMetadata,
}

impl IndexRecord {
    /// `text_chunk` normalized with the shared index/query rule
    pub fn embedding_text(&self) -> Result<String, regex::Error> {
        normalize_code(&self.text_chunk)
    }

    /// Whether the embedding step should index this record
    pub fn is_embeddable(&self) -> bool {
        match &self.metadata {
            RecordMetadata::Property(meta) => {
                self.formal_property.is_some() && meta.rule_name != SANITY_RULE
            }
            RecordMetadata::Context(_) => false,
        }
    }
}

/// A property with its resolved linkage
#[derive(Debug, Clone)]
pub struct LinkedProperty {
    pub block: PropertyBlock,
    pub target: TargetLinkage,
}

/// Everything known about the contract side of a pair
pub struct ContractContext<'a> {
    /// File name of the contract (e.g., "Auction.sol")
    pub file_name: &'a str,
    pub source: &'a str,
    pub functions: &'a FunctionTable,
    pub state_variables: &'a StateVariableSet,
    pub spec_file: &'a Path,
}

impl ContractContext<'_> {
    /// Contract name used to namespace record ids
    pub fn base_name(&self) -> &str {
        self.file_name
            .strip_suffix(".sol")
            .unwrap_or(self.file_name)
    }
}

/// Build the context record followed by one record per property
pub fn build_records(
    contract: &ContractContext<'_>,
    properties: &[LinkedProperty],
) -> Result<Vec<IndexRecord>, serde_json::Error> {
    let mut records = Vec::with_capacity(properties.len() + 1);
    let spec_file = contract.spec_file.display().to_string();

    records.push(IndexRecord {
        id: format!("{}_contract_context", contract.base_name()),
        chunk_type: ChunkType::ContractContext,
        source_contract: contract.file_name.to_string(),
        target_function: TargetLinkage::All,
        text_chunk: contract.source.to_string(),
        formal_property: None,
        nl_summary: String::new(),
        metadata: RecordMetadata::Context(ContextMetadata {
            function_list: contract.functions.names().to_vec(),
            state_variables: contract.state_variables.to_vec(),
            is_standard: "UNKNOWN".to_string(),
            spec_file: spec_file.clone(),
        }),
    });

    for property in properties {
        let block = &property.block;
        let hash = hash_block(block)?;

        records.push(IndexRecord {
            id: format!("{}_{}_{}", contract.base_name(), block.name, hash.short()),
            chunk_type: block.block_type.into(),
            source_contract: contract.file_name.to_string(),
            target_function: property.target.clone(),
            text_chunk: text_chunk(&property.target, contract),
            formal_property: Some(block.body()),
            nl_summary: String::new(),
            metadata: RecordMetadata::Property(PropertyMetadata {
                rule_name: block.name.clone(),
                rule_type: block.block_type,
                modifies_state: linked_functions_modify_state(&property.target, contract),
                methods_in_block: block.methods_in_block.clone(),
                start_line: block.start_line,
                end_line: block.end_line,
                spec_file: spec_file.clone(),
                block_hash: hash.full().to_string(),
            }),
        });
    }

    Ok(records)
}

/// Bodies of the linked functions, or the whole source when the linkage is a
/// sentinel or any name fails to resolve
fn text_chunk(target: &TargetLinkage, contract: &ContractContext<'_>) -> String {
    let names = target.functions();
    if names.is_empty() {
        return contract.source.to_string();
    }
    names
        .iter()
        .map(|name| contract.functions.get(name).map(|f| f.text()))
        .collect::<Option<Vec<_>>>()
        .map(|bodies| bodies.join("\n\n"))
        .unwrap_or_else(|| contract.source.to_string())
}

fn linked_functions_modify_state(target: &TargetLinkage, contract: &ContractContext<'_>) -> bool {
    target
        .functions()
        .iter()
        .filter_map(|name| contract.functions.get(name))
        .any(|f| modifies_state(&f.text(), contract.state_variables))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{extract_state_variables, SourceFunction};
    use std::path::PathBuf;

    const SOURCE: &str = "contract Vault {\n    mapping(address => uint) balance;\n    function withdraw(uint amount) external { balance[msg.sender] -= amount; }\n    function balanceOf(address a) external view returns (uint) { return balance[a]; }\n}\n";

    fn property(name: &str, block_type: BlockType, lines: &[&str]) -> PropertyBlock {
        PropertyBlock {
            block_type,
            name: name.to_string(),
            file_path: PathBuf::from("Vault.spec"),
            start_line: 1,
            end_line: lines.len(),
            content: lines.iter().map(|s| s.to_string()).collect(),
            methods_in_block: Vec::new(),
        }
    }

    fn build(properties: &[LinkedProperty]) -> Vec<IndexRecord> {
        let functions = FunctionTable::from_source(SOURCE).unwrap();
        let vars = extract_state_variables(SOURCE).unwrap();
        let contract = ContractContext {
            file_name: "Vault.sol",
            source: SOURCE,
            functions: &functions,
            state_variables: &vars,
            spec_file: Path::new("Vault.spec"),
        };
        build_records(&contract, properties).unwrap()
    }

    #[test]
    fn test_context_record_first() {
        let records = build(&[]);
        assert_eq!(records.len(), 1);
        let ctx = &records[0];
        assert_eq!(ctx.id, "Vault_contract_context");
        assert_eq!(ctx.chunk_type, ChunkType::ContractContext);
        assert_eq!(ctx.formal_property, None);
        assert_eq!(ctx.text_chunk, SOURCE);
        assert!(!ctx.is_embeddable());
        match &ctx.metadata {
            RecordMetadata::Context(meta) => {
                assert_eq!(meta.function_list, vec!["withdraw", "balanceOf"]);
                assert_eq!(meta.state_variables, vec!["balance"]);
            }
            other => panic!("unexpected metadata {:?}", other),
        }
    }

    #[test]
    fn test_rule_record() {
        let block = property("onlyOwnerCanWithdraw", BlockType::Rule, &["rule onlyOwnerCanWithdraw {", "withdraw(100);", "}"]);
        let target = TargetLinkage::Functions(vec!["withdraw".to_string()]);
        let records = build(&[LinkedProperty { block, target }]);
        let rec = &records[1];

        assert!(rec.id.starts_with("Vault_onlyOwnerCanWithdraw_"));
        assert_eq!(rec.id.len(), "Vault_onlyOwnerCanWithdraw_".len() + 8);
        assert_eq!(rec.chunk_type, ChunkType::FunctionRule);
        assert!(rec.text_chunk.starts_with("function withdraw"));
        assert_eq!(rec.formal_property.as_deref(), Some("rule onlyOwnerCanWithdraw {\nwithdraw(100);\n}"));
        assert!(rec.is_embeddable());
        match &rec.metadata {
            RecordMetadata::Property(meta) => {
                assert!(meta.modifies_state);
                assert_eq!(meta.block_hash.len(), 64);
                assert!(rec.id.ends_with(&meta.block_hash[..8]));
            }
            other => panic!("unexpected metadata {:?}", other),
        }
    }

    #[test]
    fn test_sentinel_and_view_function() {
        let inv = property("solvent", BlockType::Invariant, &["invariant solvent() x == y;"]);
        let view_rule = property("readOnly", BlockType::Rule, &["rule readOnly { balanceOf(a); }"]);
        let records = build(&[
            LinkedProperty { block: inv, target: TargetLinkage::All },
            LinkedProperty {
                block: view_rule,
                target: TargetLinkage::Functions(vec!["balanceOf".to_string()]),
            },
        ]);

        assert_eq!(records[1].chunk_type, ChunkType::ContractInvariant);
        assert_eq!(records[1].text_chunk, SOURCE);
        assert_eq!(records[1].target_function.to_string(), "ALL");

        match &records[2].metadata {
            RecordMetadata::Property(meta) => assert!(!meta.modifies_state),
            other => panic!("unexpected metadata {:?}", other),
        }
    }

    #[test]
    fn test_failed_lookup_falls_back_to_source() {
        let block = property("ghost", BlockType::Rule, &["rule ghost { vanished(); }"]);
        let target = TargetLinkage::Functions(vec!["vanished".to_string(), "withdraw".to_string()]);
        let records = build(&[LinkedProperty { block, target }]);
        assert_eq!(records[1].text_chunk, SOURCE);
    }

    #[test]
    fn test_multi_function_chunk_joined() {
        let functions = FunctionTable::from_functions(vec![
            SourceFunction { name: "a".into(), start_line: 1, end_line: 1, body: vec!["function a() {}".into()] },
            SourceFunction { name: "b".into(), start_line: 2, end_line: 2, body: vec!["function b() {}".into()] },
        ]);
        let vars = StateVariableSet::default();
        let contract = ContractContext {
            file_name: "AB.sol",
            source: "contract AB {}",
            functions: &functions,
            state_variables: &vars,
            spec_file: Path::new("AB.spec"),
        };
        let target = TargetLinkage::Functions(vec!["a".to_string(), "b".to_string()]);
        let block = property("both", BlockType::Rule, &["rule both { a(); b(); }"]);
        let records = build_records(&contract, &[LinkedProperty { block, target }]).unwrap();
        assert_eq!(records[1].text_chunk, "function a() {}\n\nfunction b() {}");
        assert_eq!(records[1].target_function.to_string(), "a/b");
    }

    #[test]
    fn test_json_field_names() {
        let block = property("r", BlockType::Rule, &["rule r { withdraw(1); }"]);
        let target = TargetLinkage::Functions(vec!["withdraw".to_string()]);
        let records = build(&[LinkedProperty { block, target }]);
        let json = serde_json::to_value(&records).unwrap();

        assert_eq!(json[0]["chunk_type"], "CONTRACT_CONTEXT");
        assert_eq!(json[0]["target_function"], "ALL");
        assert!(json[0]["formal_property"].is_null());
        assert_eq!(json[1]["chunk_type"], "FUNCTION_RULE");
        assert_eq!(json[1]["metadata"]["rule_type"], "RULE");
        assert_eq!(json[1]["metadata"]["modifies_state"], true);

        let back: Vec<IndexRecord> = serde_json::from_value(json).unwrap();
        assert_eq!(back, records);
    }
}
