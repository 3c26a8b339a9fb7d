//! JSON file repository for normalised atlas data.
//!
//! Files are keyed by gene symbol:
//! - `<gene>_expression.json` — one `ExpressionRecord`
//! - `<gene>_info.json`       — the `GeneInfo` rows of the gene lookup

use std::path::{Path, PathBuf};

use brainmap_common::{ExpressionRecord, GeneInfo, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Default location for persisted records.
pub const DEFAULT_DATA_DIR: &str = "data/raw";

/// Persistence for per-gene records.
pub trait ExpressionStore: Send + Sync {
    fn save_record(&self, gene: &str, record: &ExpressionRecord) -> Result<PathBuf>;

    /// `Ok(None)` when nothing has been saved for `gene`.
    fn load_record(&self, gene: &str) -> Result<Option<ExpressionRecord>>;

    fn save_gene_info(&self, gene: &str, genes: &[GeneInfo]) -> Result<PathBuf>;
}

/// Pretty-printed JSON files under one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn expression_path(&self, gene: &str) -> PathBuf {
        self.data_dir.join(format!("{}_expression.json", gene))
    }

    pub fn info_path(&self, gene: &str) -> PathBuf {
        self.data_dir.join(format!("{}_info.json", gene))
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: PathBuf, value: &T) -> Result<PathBuf> {
        let body = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, body)?;
        tracing::info!(path = %path.display(), "Saved data");
        Ok(path)
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let body = match std::fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&body)?))
    }
}

impl ExpressionStore for JsonFileStore {
    fn save_record(&self, gene: &str, record: &ExpressionRecord) -> Result<PathBuf> {
        self.write_json(self.expression_path(gene), record)
    }

    fn load_record(&self, gene: &str) -> Result<Option<ExpressionRecord>> {
        self.read_json(&self.expression_path(gene))
    }

    fn save_gene_info(&self, gene: &str, genes: &[GeneInfo]) -> Result<PathBuf> {
        self.write_json(self.info_path(gene), genes)
    }
}
