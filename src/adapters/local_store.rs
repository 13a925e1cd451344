use crate::domain::model::ColorTable;
use crate::domain::ports::{ColorTableStore, DonorTableSource};
use crate::utils::error::Result;
use crate::utils::validation::validate_dataset_name;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "colr.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredColorTable {
    dataset: String,
    saved_at: DateTime<Utc>,
    table: ColorTable,
}

/// Color tables kept as one JSON document per dataset under `base_path`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn table_path(&self, dataset: &str) -> Result<PathBuf> {
        validate_dataset_name("dataset", dataset)?;
        Ok(self.base_path.join(format!("{}.{}", dataset, EXTENSION)))
    }

    fn read(&self, dataset: &str) -> Result<Option<ColorTable>> {
        let path = self.table_path(dataset)?;
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(&path)?;
        let stored: StoredColorTable = serde_json::from_slice(&data)?;
        tracing::debug!(
            "Loaded color table of <{}> saved at {}",
            stored.dataset,
            stored.saved_at.to_rfc3339()
        );
        Ok(Some(stored.table))
    }
}

impl ColorTableStore for LocalStore {
    async fn save(&self, dataset: &str, table: &ColorTable) -> Result<()> {
        let path = self.table_path(dataset)?;
        fs::create_dir_all(&self.base_path)?;

        let stored = StoredColorTable {
            dataset: dataset.to_string(),
            saved_at: Utc::now(),
            table: table.clone(),
        };
        let data = serde_json::to_vec_pretty(&stored)?;

        // 先寫暫存檔再改名，避免留下寫了一半的色表
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &data)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!("Wrote color table ({} bytes) to {}", data.len(), path.display());
        Ok(())
    }

    async fn remove(&self, dataset: &str) -> Result<usize> {
        let path = self.table_path(dataset)?;
        if !path.exists() {
            return Ok(0);
        }
        fs::remove_file(&path)?;
        Ok(1)
    }

    async fn load(&self, dataset: &str) -> Result<Option<ColorTable>> {
        self.read(dataset)
    }
}

#[async_trait]
impl DonorTableSource for LocalStore {
    async fn load_colors(&self, name: &str) -> Result<Option<ColorTable>> {
        self.read(name)
    }
}
