//! Batch indexing over a directory of contract/spec pairs

use cvl_index::{run_batch, ChunkType, IndexRecord, IndexerConfig};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const AUCTION_SOL: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;

contract Auction {
    address public highestBidder;
    uint256 public highestBid;
    mapping(address => uint256) pendingReturns;
    bool private ended;

    function bid() external payable {
        require(msg.value > highestBid);
        pendingReturns[highestBidder] += highestBid;
        highestBidder = msg.sender;
        highestBid = msg.value;
    }

    function withdraw() external returns (bool) {
        uint256 amount = pendingReturns[msg.sender];
        pendingReturns[msg.sender] = 0;
        payable(msg.sender).transfer(amount);
        return true;
    }

    function getHighestBid() external view returns (uint256) {
        return highestBid;
    }

    function endAuction() external {
        ended = true;
    }
}
"#;

const AUCTION_SPEC: &str = r#"methods {
    function getHighestBid() external returns (uint256) envfree;
    function bid() external;
    function withdraw() external returns (bool);
}

invariant highestNeverDrops()
    getHighestBid() >= 0
    { preserved { require true; } }

rule bidRaisesHighest {
    env e;
    uint256 before = getHighestBid();
    bid(e);
    assert getHighestBid() >= before;
}

rule withdrawAfterBid {
    env e;
    requireInvariant highestNeverDrops();
    withdraw(e);
    assert true;
}

rule sanity {
    satisfy true;
}
"#;

fn scratch_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let dir = std::env::temp_dir().join(format!("cvl_index_{}_{}", label, nanos));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn batch_indexes_pairs_and_skips_unpaired() {
    let input = scratch_dir("batch");
    let output = input.join("raw_index");
    fs::write(input.join("Auction.sol"), AUCTION_SOL).unwrap();
    fs::write(input.join("Auction.spec"), AUCTION_SPEC).unwrap();
    fs::write(input.join("Lonely.sol"), "contract Lonely { }\n").unwrap();

    let config = IndexerConfig::default().with_overrides(Some(input.clone()), Some(output.clone()), Some(2));
    let report = run_batch(&config).unwrap();

    assert_eq!(report.indexed.len(), 1);
    assert!(report.failed.is_empty());
    assert_eq!(report.unpaired.len(), 1);
    assert_eq!(report.unpaired[0].name, "Lonely");
    assert_eq!(report.unpaired[0].missing, ".spec");

    let artifact = output.join("Auction_index.json");
    assert_eq!(report.indexed[0].output, artifact);
    let records: Vec<IndexRecord> =
        serde_json::from_str(&fs::read_to_string(&artifact).unwrap()).unwrap();
    assert!(!output.join("Lonely_index.json").exists());

    // one context record, then properties in file order
    assert_eq!(records.len(), 5);
    assert_eq!(records[0].id, "Auction_contract_context");
    assert_eq!(records[0].chunk_type, ChunkType::ContractContext);
    let kinds: Vec<_> = records[1..].iter().map(|r| r.chunk_type).collect();
    assert_eq!(
        kinds,
        vec![
            ChunkType::ContractInvariant,
            ChunkType::FunctionRule,
            ChunkType::FunctionRule,
            ChunkType::FunctionRule,
        ]
    );

    let ids: HashSet<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), records.len());

    let targets: Vec<String> = records[1..].iter().map(|r| r.target_function.to_string()).collect();
    assert_eq!(targets, vec!["getHighestBid", "bid/getHighestBid", "withdraw", "UNKNOWN"]);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&artifact).unwrap()).unwrap();
    assert_eq!(json[0]["metadata"]["function_list"][0], "bid");
    assert_eq!(json[1]["metadata"]["modifies_state"], false);
    assert_eq!(json[2]["metadata"]["modifies_state"], true);
    assert_eq!(json[3]["metadata"]["modifies_state"], true);
    assert_eq!(json[4]["metadata"]["block_hash"].as_str().map(str::len), Some(64));

    let withdraw = &records[3];
    let formal = withdraw.formal_property.as_deref().unwrap();
    assert!(formal.contains("getHighestBid() >= 0"));
    assert!(withdraw.text_chunk.starts_with("function withdraw()"));

    assert_eq!(report.indexed[0].embeddable, 3);

    fs::remove_dir_all(&input).ok();
}

#[test]
fn rerun_produces_identical_artifact() {
    let input = scratch_dir("rerun");
    fs::write(input.join("Auction.sol"), AUCTION_SOL).unwrap();
    fs::write(input.join("Auction.spec"), AUCTION_SPEC).unwrap();

    let first = IndexerConfig::default().with_overrides(Some(input.clone()), Some(input.join("a")), None);
    let second = IndexerConfig::default().with_overrides(Some(input.clone()), Some(input.join("b")), None);
    run_batch(&first).unwrap();
    run_batch(&second).unwrap();

    let a = fs::read_to_string(input.join("a").join("Auction_index.json")).unwrap();
    let b = fs::read_to_string(input.join("b").join("Auction_index.json")).unwrap();
    assert_eq!(a, b);

    fs::remove_dir_all(&input).ok();
}
