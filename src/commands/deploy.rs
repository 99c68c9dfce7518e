use crate::sync::SyncEngine;

pub fn cmd_deploy(engine: &mut SyncEngine, alias: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 部署身份: {}", alias);

    let report = engine.deploy(alias)?;

    if let Some(backup) = &report.backup {
        println!("💾 原有配置已备份到: {}", backup.display());
    }
    println!("✅ 已复制到 {}:", report.target_dir.display());
    for path in &report.copied {
        println!("  - {}", path.display());
    }
    if !report.config_deployed {
        println!("⚠️  尚无配置文件，只复制了密钥");
    }

    Ok(())
}
