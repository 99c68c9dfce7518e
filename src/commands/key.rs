use crate::sync::{Confirmation, SyncEngine};
use crate::utils::fingerprint::fingerprint_file;
use dialoguer::{Confirm, Input};

/// 命令行没给的字段交互式询问
fn value_or_prompt(value: Option<String>, prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Ok(Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()?),
    }
}

pub fn cmd_create(
    engine: &mut SyncEngine,
    email: Option<String>,
    host: Option<String>,
    alias: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔑 创建新的 SSH 身份...");

    let email = value_or_prompt(email, "邮箱 (写入公钥注释)")?;
    let host = value_or_prompt(host, "主机名 (例如 github.com)")?;
    let alias = value_or_prompt(alias, "别名 (例如 work)")?;

    let outcome = engine.create(&email, &host, &alias)?;
    let record = &outcome.record;

    println!("✅ 身份创建成功!");
    println!("🏷️  别名: {}", record.alias);
    println!("📁 私钥: {}", outcome.files.private_key.display());
    println!("📄 公钥: {}", outcome.files.public_key.display());
    if let Some(fp) = fingerprint_file(&outcome.files.public_key) {
        println!("🔏 指纹: {}", fp);
    }
    if outcome.block_appended {
        println!("📝 已添加配置块: Host {}", record.block_name());
    } else {
        println!("📝 配置块已存在: Host {}", record.block_name());
    }

    println!("\n💡 下一步:");
    println!("  1. 将公钥添加到 {} 的账户设置中", record.hostname);
    println!("  2. 运行 `ssh-key-manager deploy {}` 部署到 SSH 目录", record.alias);
    println!("  3. 克隆时使用主机别名: git@{}:<user>/<repo>.git", record.block_name());

    Ok(())
}

pub fn cmd_delete(engine: &mut SyncEngine, alias: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("🗑️  删除身份: {}", alias);

    let outcome = engine.delete(alias)?;

    if outcome.removed.len() > 1 {
        println!("⚠️  该别名有 {} 条重复记录，已全部删除", outcome.removed.len());
    }
    for path in &outcome.deleted_files {
        println!("  - 已删除 {}", path.display());
    }
    if outcome.block_removed {
        println!("  - 已移除配置块 Host {}", outcome.block_name);
    } else {
        println!("  - 配置文件中没有 Host {}", outcome.block_name);
    }

    println!("✅ 删除完成");
    Ok(())
}

pub fn cmd_delete_all(engine: &mut SyncEngine, yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    let paths = engine.paths().clone();
    println!("⚠️  即将删除所有密钥、配置文件和记录:");
    println!("  密钥目录: {}", paths.keys_dir.display());
    println!("  配置文件: {}", paths.document_path.display());
    println!("  记录文件: {}", paths.registry_path.display());

    let confirmed = yes
        || Confirm::new()
            .with_prompt("确定要全部删除吗? 此操作无法撤销")
            .default(false)
            .interact()?;

    if !confirmed {
        println!("❌ 操作已取消");
        return Ok(());
    }

    let report = engine.delete_all(Confirmation::from(confirmed))?;

    println!("✅ 已全部删除:");
    println!("  删除密钥文件: {}", report.key_entries_removed);
    println!(
        "  配置文件: {}",
        if report.document_removed { "已删除" } else { "不存在" }
    );
    println!("  清除记录: {}", report.records_cleared);
    Ok(())
}
