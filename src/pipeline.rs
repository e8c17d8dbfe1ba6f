//! Per-pair indexing pipeline and the batch driver
//!
//! A pair is one `<stem>.sol` contract with its `<stem>.spec`. Each pair runs
//! scan, extract, resolve, expand, hash and build in order. Batch mode fans
//! pairs out to a small pool of scoped threads.

use crate::config::IndexerConfig;
use crate::error::{IndexError, IndexResult};
use crate::linker::{expand_cross_references, resolve_target};
use crate::parser::{extract_methods, extract_state_variables, parse_properties, FunctionTable};
use crate::record::{build_records, ContractContext, IndexRecord, LinkedProperty, RecordMetadata};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;
use walkdir::WalkDir;

const CONTRACT_EXT: &str = "sol";
const SPEC_EXT: &str = "spec";

/// A contract file and the spec that verifies it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSpecPair {
    /// Shared file stem (e.g., "Auction")
    pub name: String,
    pub contract_path: PathBuf,
    pub spec_path: PathBuf,
}

impl ContractSpecPair {
    pub fn new(contract_path: impl Into<PathBuf>, spec_path: impl Into<PathBuf>) -> Self {
        let contract_path = contract_path.into();
        let name = contract_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        ContractSpecPair {
            name,
            contract_path,
            spec_path: spec_path.into(),
        }
    }

    /// Artifact path inside `output_dir`
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}_index.json", self.name))
    }
}

/// Index one contract/spec pair held in memory
pub fn index_sources(
    contract_name: &str,
    contract_src: &str,
    spec_path: &Path,
    spec_src: &str,
) -> IndexResult<Vec<IndexRecord>> {
    let functions = FunctionTable::from_source(contract_src)?;
    let state_variables = extract_state_variables(contract_src)?;
    let methods = extract_methods(spec_src)?;
    let mut blocks = parse_properties(spec_src, spec_path, &methods)?;

    if functions.is_empty() {
        log::info!("{}: no functions found", contract_name);
    }
    if blocks.is_empty() {
        log::info!("{}: no rules or invariants found", spec_path.display());
    }

    // Linkage is resolved on each block's own text, before references are inlined
    let targets: Vec<_> = blocks
        .iter()
        .map(|b| resolve_target(&b.body(), &b.methods_in_block, &functions))
        .collect();

    expand_cross_references(&mut blocks);

    let properties: Vec<LinkedProperty> = blocks
        .into_iter()
        .zip(targets)
        .map(|(block, target)| LinkedProperty { block, target })
        .collect();

    let contract = ContractContext {
        file_name: contract_name,
        source: contract_src,
        functions: &functions,
        state_variables: &state_variables,
        spec_file: spec_path,
    };
    Ok(build_records(&contract, &properties)?)
}

/// Read both files of a pair and index them
pub fn index_pair(pair: &ContractSpecPair) -> IndexResult<Vec<IndexRecord>> {
    let contract_src = read_input(&pair.contract_path)?;
    let spec_src = read_input(&pair.spec_path)?;
    let contract_name = pair
        .contract_path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}.{}", pair.name, CONTRACT_EXT));

    index_sources(&contract_name, &contract_src, &pair.spec_path, &spec_src)
}

fn read_input(path: &Path) -> IndexResult<String> {
    fs::read_to_string(path).map_err(|source| IndexError::missing_input(path, source))
}

/// Write records as a pretty-printed JSON array
pub fn write_artifact(records: &[IndexRecord], path: &Path) -> IndexResult<()> {
    let json = serde_json::to_string_pretty(records)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| IndexError::OutputWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, json).map_err(|source| IndexError::OutputWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Index a pair and write its artifact under `output_dir`
pub fn process_pair(pair: &ContractSpecPair, output_dir: &Path) -> IndexResult<PairSummary> {
    let records = index_pair(pair)?;
    let output = pair.output_path(output_dir);
    write_artifact(&records, &output)?;

    let summary = PairSummary::new(&pair.name, output, &records);
    log::info!(
        "{}: {} record(s) written to {}",
        pair.name,
        summary.records,
        summary.output.display()
    );
    Ok(summary)
}

/// A stem that has only one of its two files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnpairedFile {
    pub name: String,
    /// ".sol" or ".spec"
    pub missing: String,
}

/// Group the files directly inside `input_dir` into pairs by stem
pub fn discover_pairs(input_dir: &Path) -> (Vec<ContractSpecPair>, Vec<UnpairedFile>) {
    let mut stems: BTreeMap<String, (Option<PathBuf>, Option<PathBuf>)> = BTreeMap::new();

    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let (Some(stem), Some(ext)) = (path.file_stem(), path.extension()) else {
            continue;
        };
        let slot = stems.entry(stem.to_string_lossy().into_owned()).or_default();
        match ext.to_str() {
            Some(CONTRACT_EXT) => slot.0 = Some(path.to_path_buf()),
            Some(SPEC_EXT) => slot.1 = Some(path.to_path_buf()),
            _ => {}
        }
    }

    let mut pairs = Vec::new();
    let mut unpaired = Vec::new();
    for (name, files) in stems {
        match files {
            (Some(contract_path), Some(spec_path)) => pairs.push(ContractSpecPair {
                name,
                contract_path,
                spec_path,
            }),
            (Some(_), None) => {
                log::warn!("{}: missing .{} file, skipped", name, SPEC_EXT);
                unpaired.push(UnpairedFile { name, missing: format!(".{}", SPEC_EXT) });
            }
            (None, Some(_)) => {
                log::warn!("{}: missing .{} file, skipped", name, CONTRACT_EXT);
                unpaired.push(UnpairedFile { name, missing: format!(".{}", CONTRACT_EXT) });
            }
            (None, None) => {}
        }
    }

    (pairs, unpaired)
}

/// Outcome of one indexed pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairSummary {
    pub name: String,
    pub output: PathBuf,
    /// Records written, context record included
    pub records: usize,
    /// Rule and invariant records
    pub properties: usize,
    /// Records the embedding step will pick up
    pub embeddable: usize,
}

impl PairSummary {
    fn new(name: &str, output: PathBuf, records: &[IndexRecord]) -> Self {
        PairSummary {
            name: name.to_string(),
            output,
            records: records.len(),
            properties: records
                .iter()
                .filter(|r| matches!(r.metadata, RecordMetadata::Property(_)))
                .count(),
            embeddable: records.iter().filter(|r| r.is_embeddable()).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairFailure {
    pub name: String,
    pub error: String,
}

/// Result of a batch run, sorted by pair name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub indexed: Vec<PairSummary>,
    pub failed: Vec<PairFailure>,
    pub unpaired: Vec<UnpairedFile>,
}

impl BatchReport {
    pub fn total_records(&self) -> usize {
        self.indexed.iter().map(|s| s.records).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.unpaired.is_empty()
    }
}

/// Index `pairs` with `config.worker_count()` threads.
///
/// A failing pair is logged and reported; it never stops the others.
pub fn run_pairs(pairs: Vec<ContractSpecPair>, config: &IndexerConfig) -> BatchReport {
    let workers = config.worker_count().min(pairs.len().max(1));
    let output_dir = config.output_directory.as_path();
    let queue = Mutex::new(pairs.into_iter());
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            scope.spawn(move || loop {
                let next = match queue.lock() {
                    Ok(mut pending) => pending.next(),
                    Err(_) => None,
                };
                let Some(pair) = next else {
                    break;
                };
                let result = process_pair(&pair, output_dir);
                if tx.send((pair.name, result)).is_err() {
                    break;
                }
            });
        }
    });
    drop(tx);

    let mut report = BatchReport::default();
    for (name, result) in rx {
        match result {
            Ok(summary) => report.indexed.push(summary),
            Err(err) => {
                log::warn!("{}: skipped: {}", name, err);
                report.failed.push(PairFailure {
                    name,
                    error: err.to_string(),
                });
            }
        }
    }
    report.indexed.sort_by(|a, b| a.name.cmp(&b.name));
    report.failed.sort_by(|a, b| a.name.cmp(&b.name));
    report
}

/// Index every pair found in `config.input_directory`
pub fn run_batch(config: &IndexerConfig) -> IndexResult<BatchReport> {
    run_batch_filtered(config, |_| true)
}

/// Like [`run_batch`], restricted to the pairs `keep` accepts
pub fn run_batch_filtered<F>(config: &IndexerConfig, keep: F) -> IndexResult<BatchReport>
where
    F: Fn(&ContractSpecPair) -> bool,
{
    let input_dir = &config.input_directory;
    fs::read_dir(input_dir).map_err(|source| IndexError::missing_input(input_dir, source))?;

    let (mut pairs, unpaired) = discover_pairs(input_dir);
    pairs.retain(|p| keep(p));
    log::info!(
        "found {} pair(s) in {} using {} worker(s)",
        pairs.len(),
        input_dir.display(),
        config.worker_count()
    );

    let mut report = run_pairs(pairs, config);
    report.unpaired = unpaired;
    Ok(report)
}
