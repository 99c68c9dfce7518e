mod generator;

pub use generator::{generator_for, BuiltinGenerator, KeyGenerator, SshKeygen};

use crate::error::{KeyGenError, Result, SyncError};
use crate::models::key::{key_name_for, public_key_path};
use crate::models::KeyFiles;
use crate::utils::fs::{remove_if_exists, set_private_permissions};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 管理密钥目录：文件名由别名确定
pub struct KeyStore {
    keys_dir: PathBuf,
    generator: Box<dyn KeyGenerator>,
}

impl KeyStore {
    pub fn new(keys_dir: PathBuf, generator: Box<dyn KeyGenerator>) -> Self {
        Self { keys_dir, generator }
    }

    pub fn keys_dir(&self) -> &Path {
        &self.keys_dir
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub fn key_path(&self, alias: &str) -> PathBuf {
        self.keys_dir.join(key_name_for(alias))
    }

    pub fn exists(&self, alias: &str) -> bool {
        let path = self.key_path(alias);
        path.exists() || public_key_path(&path).exists()
    }

    /// 生成 `id_ed25519_<alias>` 密钥对
    ///
    /// 失败时清理生成器可能留下的半成品，调用方不得登记失败的结果。
    pub fn generate(&self, alias: &str, email: &str) -> Result<KeyFiles> {
        fs::create_dir_all(&self.keys_dir)?;

        let key_path = self.key_path(alias);
        if self.exists(alias) {
            return Err(SyncError::KeyExists(key_path));
        }

        let files = KeyFiles::for_private(&key_path);
        debug!(alias = %alias, generator = %self.generator.name(), "Generating key pair");

        if let Err(e) = self.generator.generate(&key_path, email) {
            self.discard_partial(&files);
            return Err(e.into());
        }

        for path in [&files.private_key, &files.public_key] {
            if !path.exists() {
                self.discard_partial(&files);
                return Err(KeyGenError::MissingOutput(path.clone()).into());
            }
        }

        if let Err(e) = set_private_permissions(&files.private_key) {
            warn!(path = %files.private_key.display(), error = %e, "Failed to restrict key permissions");
        }

        info!(alias = %alias, path = %files.private_key.display(), "Key pair generated");
        Ok(files)
    }

    fn discard_partial(&self, files: &KeyFiles) {
        for path in files.paths() {
            match remove_if_exists(&path) {
                Ok(true) => warn!(path = %path.display(), "Removed partial key output"),
                Ok(false) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Could not remove partial key output"),
            }
        }
    }

    /// 删除私钥和公钥，文件不存在不算错误；返回实际删除的路径
    pub fn remove(&self, key_path: &Path) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for path in KeyFiles::for_private(key_path).paths() {
            if remove_if_exists(&path)? {
                debug!(path = %path.display(), "Removed key file");
                removed.push(path);
            }
        }
        Ok(removed)
    }

    /// 目录中所有文件名，目录不存在时为空
    pub fn list_all(&self) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        let entries = match fs::read_dir(&self.keys_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    /// 清空密钥目录中的所有条目（不对照 registry），按文件名顺序删除
    pub fn wipe(&self) -> std::result::Result<usize, PartialWipe> {
        let paths = self
            .entries()
            .map_err(|error| PartialWipe { removed: 0, error })?;

        let removed = remove_entries(&paths, remove_entry)?;
        info!(dir = %self.keys_dir.display(), removed, "Key directory wiped");
        Ok(removed)
    }

    fn entries(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.keys_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        paths.sort();
        Ok(paths)
    }
}

/// `wipe` 中途失败：已删除的条目数和失败原因
#[derive(Debug)]
pub struct PartialWipe {
    pub removed: usize,
    pub error: SyncError,
}

fn remove_entry(path: &Path) -> std::io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn remove_entries<F>(paths: &[PathBuf], mut remove: F) -> std::result::Result<usize, PartialWipe>
where
    F: FnMut(&Path) -> std::io::Result<()>,
{
    for (removed, path) in paths.iter().enumerate() {
        if let Err(e) = remove(path) {
            warn!(path = %path.display(), removed, error = %e, "Key directory wipe stopped");
            return Err(PartialWipe {
                removed,
                error: e.into(),
            });
        }
    }
    Ok(paths.len())
}
