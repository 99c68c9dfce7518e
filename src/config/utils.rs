use super::{APP_DIR_NAME, GeneratorKind, LogLevel, Settings};
use crate::error::{ConfigError, ConfigResult};
use std::path::PathBuf;
use tracing::warn;

pub const ENV_CONFIG: &str = "SSHKM_CONFIG";
pub const ENV_HOME: &str = "SSHKM_HOME";
pub const ENV_SSH_DIR: &str = "SSHKM_SSH_DIR";
pub const ENV_LOG_LEVEL: &str = "SSHKM_LOG_LEVEL";
pub const ENV_GENERATOR: &str = "SSHKM_GENERATOR";

pub struct ConfigUtils;

impl ConfigUtils {
    /// 生成默认配置文件内容
    pub fn generate_default_config() -> String {
        serde_yaml::to_string(&Settings::default()).unwrap_or_default()
    }

    /// 验证配置文件语法
    pub fn validate_config_syntax(content: &str) -> ConfigResult<()> {
        let _: Settings = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(())
    }
}

/// 默认配置文件路径，环境变量优先
pub fn default_config_path() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = std::env::var(ENV_CONFIG) {
        if !env_path.trim().is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }

    Ok(dirs::config_dir()
        .ok_or(ConfigError::NoConfigDir)?
        .join(APP_DIR_NAME)
        .join("config.yaml"))
}

/// 用环境变量覆盖配置，`lookup` 一般传 `|k| std::env::var(k).ok()`
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(home) = lookup(ENV_HOME).filter(|v| !v.trim().is_empty()) {
        settings.base_dir = PathBuf::from(home);
    }

    if let Some(ssh_dir) = lookup(ENV_SSH_DIR).filter(|v| !v.trim().is_empty()) {
        settings.ssh_dir = PathBuf::from(ssh_dir);
    }

    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        match LogLevel::parse(&level) {
            Some(l) => settings.log_level = l,
            None => warn!("Ignoring unknown {}={}", ENV_LOG_LEVEL, level),
        }
    }

    if let Some(kind) = lookup(ENV_GENERATOR) {
        match GeneratorKind::parse(&kind) {
            Some(k) => settings.generator = k,
            None => warn!("Ignoring unknown {}={}", ENV_GENERATOR, kind),
        }
    }
}
