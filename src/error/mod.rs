use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io::Error as IoError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Alias already registered: {0}")]
    DuplicateAlias(String),

    #[error("Key file already exists: {}", .0.display())]
    KeyExists(PathBuf),

    #[error("Key generation failed: {0}")]
    GenerationFailed(#[from] KeyGenError),

    #[error("Alias not found: {0}")]
    AliasNotFound(String),

    #[error("Registry is corrupt: {0}")]
    CorruptRegistry(String),

    #[error("Key file missing: {}", .0.display())]
    KeyFileMissing(PathBuf),

    #[error("Operation requires explicit confirmation")]
    ConfirmationRequired,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),

    #[error("{operation} stopped at {stage}: {source}")]
    Incomplete {
        operation: &'static str,
        stage: SyncStage,
        orphaned: Vec<PathBuf>,
        #[source]
        source: Box<SyncError>,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadFailed(#[source] IoError),

    #[error("Failed to write config file: {0}")]
    WriteFailed(#[source] IoError),

    #[error("Failed to parse config: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration directory not found")]
    NoConfigDir,
}

#[derive(Error, Debug)]
pub enum KeyGenError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: IoError,
    },

    #[error("{program} exited with {code:?}: {stderr}")]
    ExitStatus {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("generator reported success but {} is missing", .0.display())]
    MissingOutput(PathBuf),

    #[error("builtin generator: {0}")]
    Builtin(String),
}

/// 多步操作中出错的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    KeyStore,
    Registry,
    ConfigDocument,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStage::KeyStore => "key store",
            SyncStage::Registry => "registry",
            SyncStage::ConfigDocument => "config document",
        };
        f.write_str(name)
    }
}

/// 前端看到的错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    AlreadyExists,
    GenerationFailed,
    AliasNotFound,
    CorruptRegistry,
    IoFailure,
    Incomplete,
    Aborted,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Validation(_) => ErrorKind::Validation,
            SyncError::DuplicateAlias(_) | SyncError::KeyExists(_) => ErrorKind::AlreadyExists,
            SyncError::GenerationFailed(_) => ErrorKind::GenerationFailed,
            SyncError::AliasNotFound(_) => ErrorKind::AliasNotFound,
            SyncError::CorruptRegistry(_) => ErrorKind::CorruptRegistry,
            SyncError::KeyFileMissing(_)
            | SyncError::Config(_)
            | SyncError::Io(_)
            | SyncError::Serialization(_) => ErrorKind::IoFailure,
            SyncError::Incomplete { .. } => ErrorKind::Incomplete,
            SyncError::ConfirmationRequired => ErrorKind::Aborted,
        }
    }

    /// 第一步已生效、后续步骤失败的情况
    pub fn is_partial(&self) -> bool {
        matches!(self, SyncError::Incomplete { .. })
    }

    /// 部分失败时遗留在磁盘上的文件
    pub fn orphaned_files(&self) -> &[PathBuf] {
        match self {
            SyncError::Incomplete { orphaned, .. } => orphaned,
            _ => &[],
        }
    }

    pub fn error_code(&self) -> u32 {
        match self {
            SyncError::Validation(_) => 1000,
            SyncError::DuplicateAlias(_) => 2000,
            SyncError::KeyExists(_) => 2001,
            SyncError::GenerationFailed(_) => 3000,
            SyncError::AliasNotFound(_) => 4000,
            SyncError::CorruptRegistry(_) => 5000,
            SyncError::KeyFileMissing(_) => 6000,
            SyncError::Io(_) => 6001,
            SyncError::Serialization(_) => 6002,
            SyncError::Config(_) => 7000,
            SyncError::ConfirmationRequired => 8000,
            SyncError::Incomplete { .. } => 9000,
        }
    }

    pub(crate) fn incomplete(
        operation: &'static str,
        stage: SyncStage,
        orphaned: Vec<PathBuf>,
        source: SyncError,
    ) -> Self {
        SyncError::Incomplete {
            operation,
            stage,
            orphaned,
            source: Box::new(source),
        }
    }
}

// Result 类型别名
pub type Result<T> = std::result::Result<T, SyncError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
