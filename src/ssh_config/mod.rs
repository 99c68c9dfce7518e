//! Line-surgical edits to the shared ssh_config document.
//!
//! The document stays hand-editable and directly readable by `ssh`: blocks are
//! appended or cut out by line span, every other byte is carried over as-is.
//! A block starts at a line whose trimmed text begins with `Host ` and runs up
//! to, but not including, the next such line.

use crate::error::Result;
use crate::models::key::host_line;
use crate::models::ConfigBlock;
use crate::utils::fingerprint::short_digest;
use crate::utils::fs::{remove_if_exists, write_atomic};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const HOST_PREFIX: &str = "Host ";

/// `read_all` 的结果，区分文件不存在与文件为空
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentView {
    Absent,
    Empty,
    Content(String),
}

pub struct ConfigDocument {
    path: PathBuf,
}

impl ConfigDocument {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn read_all(&self) -> Result<DocumentView> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(DocumentView::Empty),
            Ok(text) => Ok(DocumentView::Content(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DocumentView::Absent),
            Err(e) => Err(e.into()),
        }
    }

    fn read_or_empty(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// 追加块；相同渲染已存在时不做任何修改，返回是否写入
    pub fn upsert_block(&self, block: &ConfigBlock) -> Result<bool> {
        let existing = self.read_or_empty()?;
        let Some(updated) = append_block(&existing, block) else {
            debug!(block = %block.block_name, "Block already present, skipping append");
            return Ok(false);
        };

        write_atomic(&self.path, updated.as_bytes())?;
        info!(
            block = %block.block_name,
            digest = %short_digest(updated.as_bytes()),
            "Block appended to config document"
        );
        Ok(true)
    }

    /// 精确匹配 `Host <block_name>` 行并删除整个块，返回是否有改动
    pub fn remove_block(&self, block_name: &str) -> Result<bool> {
        if !self.exists() {
            debug!(block = %block_name, "Config document absent, nothing to remove");
            return Ok(false);
        }

        let existing = self.read_or_empty()?;
        let (updated, removed) = strip_block(&existing, block_name);
        if removed == 0 {
            debug!(block = %block_name, "No exact Host line match");
            return Ok(false);
        }

        write_atomic(&self.path, updated.as_bytes())?;
        info!(block = %block_name, spans = removed, "Block removed from config document");
        Ok(true)
    }

    /// 文档中所有 Host 块名，按出现顺序
    pub fn block_names(&self) -> Result<Vec<String>> {
        Ok(block_names(&self.read_or_empty()?))
    }

    pub fn contains_block(&self, block: &ConfigBlock) -> Result<bool> {
        Ok(self.read_or_empty()?.contains(&block.render()))
    }

    /// 删除整个文档文件
    pub fn delete(&self) -> Result<bool> {
        let removed = remove_if_exists(&self.path)?;
        if removed {
            info!(path = %self.path.display(), "Config document deleted");
        }
        Ok(removed)
    }
}

/// 返回追加后的全文；渲染内容已是子串时返回 None
pub fn append_block(existing: &str, block: &ConfigBlock) -> Option<String> {
    let rendered = block.render();
    if existing.contains(&rendered) {
        return None;
    }

    // 原文一个字节都不改，只在末尾补足换行和一个空行
    let mut updated = String::with_capacity(existing.len() + rendered.len() + 3);
    updated.push_str(existing);
    if !updated.is_empty() {
        if !updated.ends_with('\n') {
            updated.push('\n');
        }
        let last_line = updated[..updated.len() - 1].rsplit('\n').next().unwrap_or("");
        if !last_line.trim().is_empty() {
            updated.push('\n');
        }
    }
    updated.push_str(&rendered);
    updated.push('\n');
    Some(updated)
}

/// 删除以 `Host <block_name>` 开头的所有块，返回新文本与删除的块数
pub fn strip_block(text: &str, block_name: &str) -> (String, usize) {
    let target = host_line(block_name);
    let mut kept = String::with_capacity(text.len());
    let mut skipping = false;
    let mut removed = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with(HOST_PREFIX) {
            if trimmed == target {
                skipping = true;
                removed += 1;
                continue;
            }
            skipping = false;
        }
        if !skipping {
            kept.push_str(line);
        }
    }

    (kept, removed)
}

pub fn block_names(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix(HOST_PREFIX))
        .map(|name| name.trim().to_string())
        .collect()
}
