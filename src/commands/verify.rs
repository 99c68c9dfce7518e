use crate::sync::{IntegrityReport, SyncEngine};

pub fn cmd_verify_integrity(
    engine: &mut SyncEngine,
    repair: bool,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 检查密钥、记录与配置文件的一致性...");

    let report = engine.verify_integrity()?;
    print_report(&report);

    if report.is_consistent() {
        println!("✅ 三个存储一致");
        return Ok(());
    }

    let repairable = report.repairable();
    if repairable == 0 {
        println!("⚠️  发现的问题无法自动修复，请手动处理");
        return Ok(());
    }

    let proceed = if repair {
        yes || confirm_repair(repairable)?
    } else {
        println!("💡 可自动修复 {} 项，运行 `ssh-key-manager verify --repair`", repairable);
        false
    };
    if !proceed {
        return Ok(());
    }

    println!("🔧 正在修复...");
    let result = engine.repair_integrity(&report)?;

    println!("✅ 修复完成:");
    println!("  恢复配置块: {}", result.blocks_restored.len());
    for name in &result.blocks_restored {
        println!("    + Host {}", name);
    }
    println!("  删除遗留文件: {}", result.files_removed.len());
    for path in &result.files_removed {
        println!("    - {}", path.display());
    }
    if !result.skipped.is_empty() {
        println!("  跳过: {}", result.skipped.join(", "));
    }
    Ok(())
}

fn confirm_repair(count: usize) -> Result<bool, Box<dyn std::error::Error>> {
    Ok(dialoguer::Confirm::new()
        .with_prompt(format!("是否立即修复这 {} 个问题?", count))
        .default(true)
        .interact()?)
}

fn print_report(report: &IntegrityReport) {
    println!("📊 检查结果:");
    println!("  记录数: {}", report.records_checked);

    if report.registry_corrupt {
        println!("❌ keys.json 格式错误，已按空记录读取");
        println!("   下面列出的\"孤立\"文件很可能仍在使用，修复不会删除任何密钥；请先手动修复 keys.json");
    }

    if !report.missing_key_files.is_empty() {
        println!("❌ 记录存在但密钥文件缺失:");
        for missing in &report.missing_key_files {
            println!("  - {} ({})", missing.alias, missing.path.display());
        }
    }
    if !report.orphaned_key_files.is_empty() {
        println!("❌ 没有记录引用的密钥文件:");
        for name in &report.orphaned_key_files {
            println!("  - {}", name);
        }
    }
    if !report.missing_blocks.is_empty() {
        println!("❌ 缺少配置块:");
        for missing in &report.missing_blocks {
            println!("  - Host {} (别名 {})", missing.block_name, missing.alias);
        }
    }
    if !report.duplicate_aliases.is_empty() {
        println!("❌ 重复别名: {}", report.duplicate_aliases.join(", "));
    }
    if !report.unmanaged_blocks.is_empty() {
        // 可能是用户手写的，只提示
        println!("ℹ️  非本工具管理的配置块: {}", report.unmanaged_blocks.join(", "));
    }
}
