use crate::config::{Settings, StorePaths};
use crate::error::{Result, SyncError, SyncStage};
use crate::keystore::{generator_for, KeyGenerator, KeyStore, PartialWipe};
use crate::models::key::KEY_NAME_PREFIX;
use crate::models::KeyRecord;
use crate::registry::MetadataRegistry;
use crate::ssh_config::{ConfigDocument, DocumentView};
use crate::sync::reconcile::{check_integrity, IntegrityReport, RepairReport};
use crate::sync::{Confirmation, CreateOutcome, DeleteOutcome, DeployReport, WipeReport};
use crate::utils::fs::{remove_if_exists, set_private_permissions};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

/// 协调密钥目录、keys.json 与 ssh_config 文档
///
/// 每个操作开始时都会重新加载 registry。多步操作不做回滚：后续步骤失败时
/// 返回 `SyncError::Incomplete`，指明失败阶段和遗留文件。
pub struct SyncEngine {
    paths: StorePaths,
    keystore: KeyStore,
    registry: MetadataRegistry,
    document: ConfigDocument,
    backup_on_deploy: bool,
}

impl SyncEngine {
    pub fn new(paths: StorePaths, generator: Box<dyn KeyGenerator>) -> Result<Self> {
        fs::create_dir_all(&paths.keys_dir)?;

        let keystore = KeyStore::new(paths.keys_dir.clone(), generator);
        let registry = MetadataRegistry::open(paths.registry_path.clone())?;
        let document = ConfigDocument::new(paths.document_path.clone());

        debug!(keys_dir = %paths.keys_dir.display(), generator = %keystore.generator_name(), "Sync engine ready");

        Ok(Self {
            paths,
            keystore,
            registry,
            document,
            backup_on_deploy: true,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let engine = Self::new(settings.store_paths(), generator_for(settings))?;
        Ok(engine.with_deploy_backup(settings.backup_on_deploy))
    }

    pub fn with_deploy_backup(mut self, enabled: bool) -> Self {
        self.backup_on_deploy = enabled;
        self
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// 生成密钥 → 登记记录 → 追加 Host 块
    #[instrument(skip(self, email, hostname))]
    pub fn create(&mut self, email: &str, hostname: &str, alias: &str) -> Result<CreateOutcome> {
        let (email, hostname, alias) = (email.trim(), hostname.trim(), alias.trim());
        validate_identity(email, hostname, alias)?;

        self.registry.load()?;
        if self.registry.contains_alias(alias) {
            return Err(SyncError::DuplicateAlias(alias.to_string()));
        }

        let files = self.keystore.generate(alias, email)?;

        let key_path = std::path::absolute(&files.private_key).unwrap_or(files.private_key.clone());
        let record = KeyRecord::new(email, hostname, alias, key_path);

        let registered = self
            .registry
            .add(record.clone())
            .and_then(|_| self.registry.save());
        if let Err(e) = registered {
            error!(alias = %alias, error = %e, "Key generated but not registered");
            return Err(SyncError::incomplete(
                "create",
                SyncStage::Registry,
                files.paths(),
                e,
            ));
        }

        let block = record.config_block();
        let block_appended = self.document.upsert_block(&block).map_err(|e| {
            error!(alias = %alias, block = %block.block_name, error = %e, "Identity registered without config block");
            SyncError::incomplete("create", SyncStage::ConfigDocument, Vec::new(), e)
        })?;

        info!(alias = %alias, host = %hostname, block = %block.block_name, "Identity created");
        Ok(CreateOutcome {
            record,
            files,
            block_appended,
        })
    }

    /// 删除该别名的所有记录、密钥文件以及第一条记录对应的 Host 块
    #[instrument(skip(self))]
    pub fn delete(&mut self, alias: &str) -> Result<DeleteOutcome> {
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(SyncError::Validation("alias is required".into()));
        }

        self.registry.load()?;
        let removed = self.registry.remove_by_alias(alias);
        let Some(first) = removed.first() else {
            return Err(SyncError::AliasNotFound(alias.to_string()));
        };
        let block_name = first.block_name();

        let mut deleted_files = Vec::new();
        for record in &removed {
            match self.keystore.remove(&record.key_path) {
                Ok(mut paths) => deleted_files.append(&mut paths),
                Err(e) if deleted_files.is_empty() => return Err(e),
                Err(e) => {
                    return Err(SyncError::incomplete("delete", SyncStage::KeyStore, Vec::new(), e));
                }
            }
        }

        let block_removed = self.document.remove_block(&block_name).map_err(|e| {
            SyncError::incomplete("delete", SyncStage::ConfigDocument, Vec::new(), e)
        })?;
        if !block_removed {
            warn!(alias = %alias, block = %block_name, "No matching Host block in config document");
        }

        self.registry
            .save()
            .map_err(|e| SyncError::incomplete("delete", SyncStage::Registry, Vec::new(), e))?;

        info!(alias = %alias, records = removed.len(), files = deleted_files.len(), "Identity deleted");
        Ok(DeleteOutcome {
            removed,
            deleted_files,
            block_name,
            block_removed,
        })
    }

    /// 清空密钥目录、删除文档、重置 registry；不做交叉校验
    #[instrument(skip(self))]
    pub fn delete_all(&mut self, confirmation: Confirmation) -> Result<WipeReport> {
        if confirmation != Confirmation::Confirmed {
            return Err(SyncError::ConfirmationRequired);
        }

        let key_entries_removed = match self.keystore.wipe() {
            Ok(removed) => removed,
            Err(PartialWipe { removed: 0, error }) => return Err(error),
            Err(PartialWipe { removed, error }) => {
                error!(removed, error = %error, "Key directory only partially wiped");
                return Err(SyncError::incomplete(
                    "delete-all",
                    SyncStage::KeyStore,
                    Vec::new(),
                    error,
                ));
            }
        };

        let document_removed = self.document.delete().map_err(|e| {
            SyncError::incomplete("delete-all", SyncStage::ConfigDocument, Vec::new(), e)
        })?;

        let records_cleared = match self.registry.load() {
            Ok(records) => records.len(),
            Err(e) => {
                warn!(error = %e, "Registry unreadable during wipe, resetting anyway");
                0
            }
        };
        self.registry.clear();
        self.registry
            .save()
            .map_err(|e| SyncError::incomplete("delete-all", SyncStage::Registry, Vec::new(), e))?;

        info!(key_entries_removed, document_removed, records_cleared, "All identities wiped");
        Ok(WipeReport {
            key_entries_removed,
            document_removed,
            records_cleared,
        })
    }

    /// 当前全部记录；registry 损坏或不可读时返回空
    pub fn list_all(&mut self) -> Vec<KeyRecord> {
        match self.registry.load() {
            Ok(records) => records.to_vec(),
            Err(e) => {
                warn!(error = %e, "Registry unreadable, listing as empty");
                Vec::new()
            }
        }
    }

    pub fn find(&mut self, alias: &str) -> Result<KeyRecord> {
        self.registry.load()?;
        self.registry.find_by_alias(alias.trim()).cloned()
    }

    /// 复制密钥对和文档到 SSH 客户端目录，同名文件直接覆盖
    #[instrument(skip(self))]
    pub fn deploy(&mut self, alias: &str) -> Result<DeployReport> {
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(SyncError::Validation("alias is required".into()));
        }

        self.registry.load()?;
        let record = self.registry.find_by_alias(alias)?.clone();

        let private_key = record.key_path.clone();
        let public_key = record.public_key_path();
        for path in [&private_key, &public_key] {
            if !path.is_file() {
                return Err(SyncError::KeyFileMissing(path.clone()));
            }
        }

        let target_dir = self.paths.ssh_dir.clone();
        fs::create_dir_all(&target_dir)?;

        let mut copied = Vec::new();
        let private_target = copy_into(&private_key, &target_dir)?;
        set_private_permissions(&private_target)?;
        copied.push(private_target);
        copied.push(copy_into(&public_key, &target_dir)?);

        let mut backup = None;
        let config_deployed = self.document.exists();
        if config_deployed {
            let target = target_dir.join("config");
            if same_file(self.document.path(), &target) {
                // 文档已经就在部署位置
                debug!(path = %target.display(), "Config already in place");
            } else {
                if self.backup_on_deploy {
                    backup = backup_if_different(&target, self.document.path())?;
                }
                fs::copy(self.document.path(), &target)?;
                copied.push(target);
            }
        }

        info!(alias = %alias, target = %target_dir.display(), files = copied.len(), "Identity deployed");
        Ok(DeployReport {
            target_dir,
            copied,
            config_deployed,
            backup,
        })
    }

    pub fn show_config(&self) -> Result<DocumentView> {
        self.document.read_all()
    }

    /// keys.json 的格式化内容（损坏时为空数组）
    pub fn show_registry(&mut self) -> Result<String> {
        if let Err(e) = self.registry.load() {
            warn!(error = %e, "Registry unreadable, showing as empty");
            self.registry.clear();
        }
        self.registry.to_json()
    }

    /// 交叉检查三个存储，只读
    pub fn verify_integrity(&mut self) -> Result<IntegrityReport> {
        self.registry.load()?;
        let key_files = self.keystore.list_all()?;
        let block_names = self.document.block_names()?;

        let mut report = check_integrity(
            self.registry.records(),
            &key_files,
            &block_names,
            self.registry.duplicate_aliases(),
        );
        report.registry_corrupt = self.registry.recovered_from_corruption();
        debug!(?report, "Integrity check finished");
        Ok(report)
    }

    /// 补回缺失的 Host 块，删除无人引用的 `id_ed25519_*` 文件；手写块不动
    ///
    /// keys.json 损坏时拒绝执行：空的记录集合会让所有密钥看起来都是孤立文件。
    #[instrument(skip(self, report))]
    pub fn repair_integrity(&mut self, report: &IntegrityReport) -> Result<RepairReport> {
        self.registry.load()?;
        if report.registry_corrupt || self.registry.recovered_from_corruption() {
            warn!(path = %self.registry.path().display(), "Refusing to repair against a malformed registry");
            return Err(SyncError::CorruptRegistry(format!(
                "{} is malformed, key files were left untouched",
                self.registry.path().display()
            )));
        }
        let mut repair = RepairReport::default();

        for missing in &report.missing_blocks {
            let Ok(record) = self.registry.find_by_alias(&missing.alias) else {
                repair.skipped.push(format!("{} (record gone)", missing.block_name));
                continue;
            };
            if !record.key_path.is_file() || !record.public_key_path().is_file() {
                repair
                    .skipped
                    .push(format!("{} (key files missing)", missing.block_name));
                continue;
            }
            let block = record.config_block();
            self.document.upsert_block(&block)?;
            repair.blocks_restored.push(block.block_name);
        }

        for name in &report.orphaned_key_files {
            if !name.starts_with(KEY_NAME_PREFIX) {
                repair.skipped.push(name.clone());
                continue;
            }
            let path = self.paths.keys_dir.join(name);
            if remove_if_exists(&path)? {
                repair.files_removed.push(path);
            }
        }

        info!(
            restored = repair.blocks_restored.len(),
            removed = repair.files_removed.len(),
            skipped = repair.skipped.len(),
            "Repair finished"
        );
        Ok(repair)
    }
}

fn validate_identity(email: &str, hostname: &str, alias: &str) -> Result<()> {
    let mut missing = Vec::new();
    if email.is_empty() {
        missing.push("email");
    }
    if hostname.is_empty() {
        missing.push("hostname");
    }
    if alias.is_empty() {
        missing.push("alias");
    }
    if !missing.is_empty() {
        return Err(SyncError::Validation(format!(
            "missing required field(s): {}",
            missing.join(", ")
        )));
    }

    // 别名会成为文件名和 Host 行的一部分
    if alias.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') {
        return Err(SyncError::Validation(format!(
            "alias must not contain whitespace or path separators: {:?}",
            alias
        )));
    }
    Ok(())
}

fn copy_into(source: &Path, target_dir: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| SyncError::Validation(format!("not a file path: {}", source.display())))?;
    let target = target_dir.join(name);
    if same_file(source, &target) {
        return Ok(target);
    }
    fs::copy(source, &target)?;
    debug!(from = %source.display(), to = %target.display(), "Copied");
    Ok(target)
}

/// 两个路径解析后指向同一文件；任一不存在时为 false
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// 目标 config 存在且内容不同才备份
fn backup_if_different(target: &Path, incoming: &Path) -> Result<Option<PathBuf>> {
    let current = match fs::read(target) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if current == fs::read(incoming)? {
        return Ok(None);
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let backup = target.with_file_name(format!("config.bak.{}", timestamp));
    fs::write(&backup, &current)?;
    info!(backup = %backup.display(), "Existing ssh config backed up");
    Ok(Some(backup))
}
