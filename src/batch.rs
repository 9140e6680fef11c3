//! Batch processing of snapshot files.
//!
//! Each file is an independent computation. A failing file is logged and
//! recorded, never fatal for the rest of the batch.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{MassError, Result};
use crate::io::JsonLocationsFile;
use crate::pipeline::{MassMetrics, Pipeline, PipelineConfig};

/// Outcome for one input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub file: PathBuf,
    /// Zeroed when the file failed
    pub metrics: MassMetrics,
    /// Error message, `None` on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchRecord {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Files in `dir` (non-recursive) whose extension is in `extensions`, sorted.
pub fn collect_input_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| MassError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let files: BTreeSet<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        })
        .collect();

    Ok(files.into_iter().collect())
}

/// Run the pipeline on one file, capturing any error in the record.
pub fn process_file(path: &Path, config: &PipelineConfig) -> BatchRecord {
    let pipeline = Pipeline::new(config.clone());
    match pipeline.run_source(&JsonLocationsFile::new(path)) {
        Ok(result) => BatchRecord {
            file: path.to_path_buf(),
            metrics: result.metrics(),
            error: None,
        },
        Err(e) => {
            warn!("[Batch] Skipping {}: {}", path.display(), e);
            BatchRecord {
                file: path.to_path_buf(),
                metrics: MassMetrics::default(),
                error: Some(e.to_string()),
            }
        }
    }
}

fn log_summary(records: &[BatchRecord]) {
    let ok = records.iter().filter(|r| r.is_ok()).count();
    info!("[Batch] Processed {} files, {} failed", records.len(), records.len() - ok);
}

/// Process files one after another, in input order.
pub fn process_files(paths: &[PathBuf], config: &PipelineConfig) -> Vec<BatchRecord> {
    let records: Vec<BatchRecord> = paths.iter().map(|p| process_file(p, config)).collect();
    log_summary(&records);
    records
}

/// Process files concurrently. Output keeps input order.
#[cfg(feature = "parallel")]
pub fn process_files_parallel(paths: &[PathBuf], config: &PipelineConfig) -> Vec<BatchRecord> {
    let records: Vec<BatchRecord> = paths.par_iter().map(|p| process_file(p, config)).collect();
    log_summary(&records);
    records
}
