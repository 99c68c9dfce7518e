pub mod engine;
pub mod reconcile;

pub use engine::SyncEngine;
pub use reconcile::{IntegrityReport, RepairReport};

use crate::models::{KeyFiles, KeyRecord};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub record: KeyRecord,
    pub files: KeyFiles,
    /// false 表示文档中已有相同的块
    pub block_appended: bool,
}

#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub removed: Vec<KeyRecord>,
    pub deleted_files: Vec<PathBuf>,
    pub block_name: String,
    pub block_removed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct WipeReport {
    pub key_entries_removed: usize,
    pub document_removed: bool,
    pub records_cleared: usize,
}

#[derive(Debug, Clone)]
pub struct DeployReport {
    pub target_dir: PathBuf,
    pub copied: Vec<PathBuf>,
    pub config_deployed: bool,
    pub backup: Option<PathBuf>,
}

/// 批量删除前必须由前端取得的确认
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}
