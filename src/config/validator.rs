use crate::config::Settings;
use crate::error::{ConfigError, ConfigResult};

pub struct SettingsValidator;

impl SettingsValidator {
    pub fn validate(settings: &Settings) -> ConfigResult<()> {
        if settings.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("base_dir cannot be empty".into()));
        }

        if settings.ssh_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("ssh_dir cannot be empty".into()));
        }

        if settings.ssh_keygen_program.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "ssh_keygen_program cannot be empty".into(),
            ));
        }

        // 部署目录与数据目录重合时，deploy 会把文件复制到自身
        if settings.base_dir.join("keys") == settings.ssh_dir {
            return Err(ConfigError::Invalid(
                "ssh_dir must differ from the managed key directory".into(),
            ));
        }

        // <base>/config 与 <ssh>/config 会是同一个文件
        if settings.base_dir == settings.ssh_dir {
            return Err(ConfigError::Invalid(
                "ssh_dir must differ from base_dir".into(),
            ));
        }

        Ok(())
    }
}
