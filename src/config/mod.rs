mod utils;
mod validator;

pub use utils::{apply_env_overrides, default_config_path, ConfigUtils};
pub use validator::SettingsValidator;

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const APP_DIR_NAME: &str = "ssh-key-manager";

/// 密钥生成方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorKind {
    /// 调用外部 ssh-keygen
    #[default]
    SshKeygen,
    /// 进程内生成 ed25519
    Builtin,
}

impl GeneratorKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "ssh-keygen" | "sshkeygen" | "external" => Some(GeneratorKind::SshKeygen),
            "builtin" | "native" => Some(GeneratorKind::Builtin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "off" => Some(LogLevel::Off),
            "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// 主配置文件结构 (config.yaml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// 数据根目录：keys/、keys.json、config 都在这里
    pub base_dir: PathBuf,
    /// 部署目标，即 SSH 客户端读取的目录
    pub ssh_dir: PathBuf,
    pub generator: GeneratorKind,
    pub ssh_keygen_program: String,
    pub backup_on_deploy: bool,
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME),
            ssh_dir: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".ssh"),
            generator: GeneratorKind::default(),
            ssh_keygen_program: "ssh-keygen".to_string(),
            backup_on_deploy: true,
            log_level: LogLevel::default(),
        }
    }
}

impl Settings {
    pub fn store_paths(&self) -> StorePaths {
        StorePaths::under(&self.base_dir, &self.ssh_dir)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        SettingsValidator::validate(self)
    }
}

/// 引擎使用的全部路径，构造时显式传入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub keys_dir: PathBuf,
    pub registry_path: PathBuf,
    pub document_path: PathBuf,
    pub ssh_dir: PathBuf,
}

impl StorePaths {
    pub fn under(base_dir: &Path, ssh_dir: &Path) -> Self {
        Self {
            keys_dir: base_dir.join("keys"),
            registry_path: base_dir.join("keys.json"),
            document_path: base_dir.join("config"),
            ssh_dir: ssh_dir.to_path_buf(),
        }
    }
}

pub struct SettingsManager {
    config_path: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    pub fn new() -> ConfigResult<Self> {
        Self::new_with_path(default_config_path()?)
    }

    pub fn new_with_path(config_path: PathBuf) -> ConfigResult<Self> {
        let mut manager = Self {
            config_path,
            settings: Settings::default(),
        };
        manager.load()?;
        Ok(manager)
    }

    /// 配置文件不存在时使用默认值
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            debug!(path = %self.config_path.display(), "Config file absent, using defaults");
            self.settings = Settings::default();
            return Ok(());
        }

        let content = fs::read_to_string(&self.config_path).map_err(ConfigError::ReadFailed)?;
        self.settings = if content.trim().is_empty() {
            Settings::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?
        };
        self.settings.validate()?;
        debug!(path = %self.config_path.display(), "Config loaded");
        Ok(())
    }

    pub fn save(&self) -> ConfigResult<()> {
        let content = serde_yaml::to_string(&self.settings)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        crate::utils::fs::write_atomic(&self.config_path, content.as_bytes())
            .map_err(ConfigError::WriteFailed)?;
        info!(path = %self.config_path.display(), "Config saved");
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
