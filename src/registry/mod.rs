use crate::error::{Result, SyncError};
use crate::models::KeyRecord;
use crate::utils::fs::write_atomic;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// keys.json：按插入顺序保存的身份记录数组
pub struct MetadataRegistry {
    path: PathBuf,
    records: Vec<KeyRecord>,
    /// 加载时遇到的损坏内容，下一次 save 前会另存一份
    corrupt_content: Option<Vec<u8>>,
}

impl MetadataRegistry {
    pub fn open(path: PathBuf) -> Result<Self> {
        let mut registry = Self {
            path,
            records: Vec::new(),
            corrupt_content: None,
        };
        registry.load()?;
        Ok(registry)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 从磁盘重新加载；空文件或格式错误视为空集合
    pub fn load(&mut self) -> Result<&[KeyRecord]> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.records.clear();
                self.corrupt_content = None;
                return Ok(&self.records);
            }
            Err(e) => return Err(e.into()),
        };

        match parse_records(&raw) {
            Ok(records) => {
                self.records = records;
                self.corrupt_content = None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Registry is malformed, treating as empty");
                self.records.clear();
                self.corrupt_content = Some(raw);
            }
        }

        debug!(path = %self.path.display(), records = self.records.len(), "Registry loaded");
        Ok(&self.records)
    }

    pub fn records(&self) -> &[KeyRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 最近一次加载是否从损坏内容中恢复
    pub fn recovered_from_corruption(&self) -> bool {
        self.corrupt_content.is_some()
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.records.iter().any(|r| r.alias == alias)
    }

    pub fn add(&mut self, record: KeyRecord) -> Result<()> {
        if self.contains_alias(&record.alias) {
            return Err(SyncError::DuplicateAlias(record.alias));
        }
        debug!(alias = %record.alias, "Record added to registry");
        self.records.push(record);
        Ok(())
    }

    pub fn find_by_alias(&self, alias: &str) -> Result<&KeyRecord> {
        self.records
            .iter()
            .find(|r| r.alias == alias)
            .ok_or_else(|| SyncError::AliasNotFound(alias.to_string()))
    }

    /// 移除该别名的全部记录（损坏的文件中可能不止一条）
    pub fn remove_by_alias(&mut self, alias: &str) -> Vec<KeyRecord> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|r| r.alias == alias);
        self.records = kept;
        if removed.len() > 1 {
            warn!(alias = %alias, count = removed.len(), "Removed duplicate records for alias");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// 出现不止一次的别名
    pub fn duplicate_aliases(&self) -> Vec<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.alias.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(alias, _)| alias.to_string())
            .collect()
    }

    /// 整体原子重写
    pub fn save(&mut self) -> Result<()> {
        if let Some(raw) = self.corrupt_content.take() {
            let backup = corrupt_backup_path(&self.path);
            if let Err(e) = write_atomic(&backup, &raw) {
                self.corrupt_content = Some(raw);
                return Err(e.into());
            }
            warn!(backup = %backup.display(), "Preserved malformed registry before overwrite");
        }

        let json = self.to_json()?;
        write_atomic(&self.path, json.as_bytes())?;
        info!(path = %self.path.display(), records = self.records.len(), "Registry saved");
        Ok(())
    }

    /// 4 空格缩进，与历史 keys.json 格式一致
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.records.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn parse_records(raw: &[u8]) -> std::result::Result<Vec<KeyRecord>, serde_json::Error> {
    if raw.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(raw)
}

pub fn corrupt_backup_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".corrupt");
    PathBuf::from(os)
}
