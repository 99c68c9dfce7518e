use crate::models::KeyRecord;
use crate::sync::SyncEngine;
use crate::utils::fingerprint::fingerprint_file;
use crate::utils::{format_created, truncate_string};
use prettytable::{Table, format, row};

pub fn cmd_list(engine: &mut SyncEngine, fingerprints: bool) -> Result<(), Box<dyn std::error::Error>> {
    let records = engine.list_all();

    if records.is_empty() {
        println!("📭 暂无 SSH 身份，使用 `ssh-key-manager create` 创建");
        return Ok(());
    }

    println!("🔑 SSH 身份 ({}):", records.len());
    build_table(&records, fingerprints).printstd();
    Ok(())
}

fn build_table(records: &[KeyRecord], fingerprints: bool) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

    if fingerprints {
        table.add_row(row!["别名", "主机", "邮箱", "Host 块", "创建时间", "指纹"]);
    } else {
        table.add_row(row!["别名", "主机", "邮箱", "Host 块", "创建时间"]);
    }

    for record in records {
        let alias = truncate_string(&record.alias, 20);
        let host = truncate_string(&record.hostname, 30);
        let email = truncate_string(&record.email, 30);
        let block = truncate_string(&record.block_name(), 30);
        let created = format_created(&record.created_at);

        if fingerprints {
            let fp = fingerprint_file(&record.public_key_path()).unwrap_or_else(|| "-".to_string());
            table.add_row(row![alias, host, email, block, created, fp]);
        } else {
            table.add_row(row![alias, host, email, block, created]);
        }
    }

    table
}
