use crate::models::key::KEY_NAME_PREFIX;
use crate::models::KeyRecord;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingKey {
    pub alias: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingBlock {
    pub alias: String,
    pub block_name: String,
}

/// 三个存储之间的一致性检查结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub records_checked: usize,
    /// 有记录但密钥文件缺失（记录已损坏）
    pub missing_key_files: Vec<MissingKey>,
    /// 密钥目录中没有记录引用的文件，通常来自中途失败的 create
    pub orphaned_key_files: Vec<String>,
    /// 有记录但文档里没有对应的 Host 块
    pub missing_blocks: Vec<MissingBlock>,
    /// 文档里不对应任何记录的 Host 块（可能是手写的）
    pub unmanaged_blocks: Vec<String>,
    pub duplicate_aliases: Vec<String>,
    /// keys.json 格式错误、按空集合读取；此时孤立文件判断不可信
    pub registry_corrupt: bool,
}

impl IntegrityReport {
    pub fn is_consistent(&self) -> bool {
        self.missing_key_files.is_empty()
            && self.orphaned_key_files.is_empty()
            && self.missing_blocks.is_empty()
            && self.duplicate_aliases.is_empty()
            && !self.registry_corrupt
    }

    /// 可以自动修复的问题数
    pub fn repairable(&self) -> usize {
        if self.registry_corrupt {
            return self.missing_blocks.len();
        }
        self.missing_blocks.len()
            + self
                .orphaned_key_files
                .iter()
                .filter(|name| name.starts_with(KEY_NAME_PREFIX))
                .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub blocks_restored: Vec<String>,
    pub files_removed: Vec<PathBuf>,
    pub skipped: Vec<String>,
}

/// 对照 registry、密钥目录文件名和文档块名
pub fn check_integrity(
    records: &[KeyRecord],
    key_files: &BTreeSet<String>,
    block_names: &[String],
    duplicate_aliases: Vec<String>,
) -> IntegrityReport {
    let mut report = IntegrityReport {
        records_checked: records.len(),
        duplicate_aliases,
        ..Default::default()
    };

    let mut referenced = BTreeSet::new();
    let mut projected = BTreeSet::new();

    for record in records {
        for path in [record.key_path.clone(), record.public_key_path()] {
            if let Some(name) = path.file_name() {
                referenced.insert(name.to_string_lossy().into_owned());
            }
            if !path.is_file() {
                report.missing_key_files.push(MissingKey {
                    alias: record.alias.clone(),
                    path,
                });
            }
        }

        let block_name = record.block_name();
        if !block_names.iter().any(|b| *b == block_name) {
            report.missing_blocks.push(MissingBlock {
                alias: record.alias.clone(),
                block_name: block_name.clone(),
            });
        }
        projected.insert(block_name);
    }

    report.orphaned_key_files = key_files
        .iter()
        .filter(|name| !referenced.contains(*name))
        .cloned()
        .collect();

    report.unmanaged_blocks = block_names
        .iter()
        .filter(|name| !projected.contains(*name))
        .cloned()
        .collect();

    report
}
