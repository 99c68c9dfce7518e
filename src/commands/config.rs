use crate::config::SettingsManager;
use std::path::Path;

/// 写出默认配置文件；已存在时需要 --force
pub fn cmd_init_config(config_path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if config_path.exists() && !force {
        return Err(format!(
            "配置文件已存在: {} (使用 --force 覆盖)",
            config_path.display()
        )
        .into());
    }

    let mut manager = SettingsManager::new_with_path(config_path.to_path_buf())?;
    if force {
        *manager.settings_mut() = Default::default();
    }
    manager.save()?;

    println!("✅ 已写入配置文件: {}", config_path.display());
    println!("  数据目录: {}", manager.settings().base_dir.display());
    println!("  SSH 目录: {}", manager.settings().ssh_dir.display());
    Ok(())
}
