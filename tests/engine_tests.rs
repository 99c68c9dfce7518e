use ssh_key_manager::error::{ErrorKind, SyncError, SyncStage};
use ssh_key_manager::models::KeyRecord;
use ssh_key_manager::ssh_config::DocumentView;
use ssh_key_manager::sync::Confirmation;
use std::fs;

mod common;
use common::{FailingGenerator, FakeGenerator, SabotageGenerator, TestEnv};

/// 端到端：创建 → 查询 → 删除
#[test]
fn test_create_then_delete_round() {
    let env = TestEnv::new();
    let mut engine = env.engine();

    let outcome = engine.create("a@b.com", "github.com", "work").unwrap();
    assert!(outcome.block_appended);
    assert_eq!(outcome.record.key_name, "id_ed25519_work");

    let record = engine.find("work").unwrap();
    assert_eq!(record.email, "a@b.com");
    assert_eq!(record.hostname, "github.com");
    assert!(record.key_path.is_absolute());
    assert!(env.key_path("work").is_file());
    assert!(common::pub_path(&env.key_path("work")).is_file());

    let doc = env.document();
    assert_eq!(doc.matches("Host github-work").count(), 1);
    assert!(doc.contains("    HostName github.com\n"));
    assert!(doc.contains("    User git\n"));
    assert!(doc.contains("IdentityFile ~/.ssh/id_ed25519_work"));

    let deleted = engine.delete("work").unwrap();
    assert_eq!(deleted.removed.len(), 1);
    assert_eq!(deleted.deleted_files.len(), 2);
    assert!(deleted.block_removed);

    let err = engine.find("work").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AliasNotFound);
    assert!(!env.key_path("work").exists());
    assert!(!env.document().contains("Host github-work"));
    assert!(engine.list_all().is_empty());
    assert_eq!(env.registry_raw(), "[]");
}

#[test]
fn test_create_trims_inputs() {
    let env = TestEnv::new();
    let mut engine = env.engine();

    engine.create("  a@b.com ", " gitlab.com ", " home\n").unwrap();
    let record = engine.find("home").unwrap();
    assert_eq!(record.email, "a@b.com");
    assert!(env.document().contains("Host gitlab-home\n"));
}

#[test]
fn test_create_rejects_missing_fields_without_side_effects() {
    let env = TestEnv::new();
    let generator = FakeGenerator::default();
    let mut engine = env.engine_with(Box::new(generator.clone()));

    let err = engine.create("a@b.com", "   ", "work").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = engine.create("a@b.com", "github.com", "../escape").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(generator.calls(), 0);
    assert!(env.key_dir_entries().is_empty());
    assert!(!env.paths.document_path.exists());
}

#[test]
fn test_create_with_existing_key_file_changes_nothing() {
    let env = TestEnv::new();
    let mut engine = env.engine();

    fs::create_dir_all(&env.paths.keys_dir).unwrap();
    fs::write(env.key_path("work"), "someone else's key").unwrap();

    let err = engine.create("a@b.com", "github.com", "work").unwrap_err();
    assert!(matches!(err, SyncError::KeyExists(_)));
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert!(!err.is_partial());

    assert_eq!(fs::read_to_string(env.key_path("work")).unwrap(), "someone else's key");
    assert!(engine.list_all().is_empty());
    assert!(!env.paths.registry_path.exists());
    assert!(!env.paths.document_path.exists());
}

#[test]
fn test_registered_alias_is_rejected_before_generation() {
    let env = TestEnv::new();
    let generator = FakeGenerator::default();
    let mut engine = env.engine_with(Box::new(generator.clone()));

    engine.create("a@b.com", "github.com", "work").unwrap();
    let doc_before = env.document();
    let registry_before = env.registry_raw();

    let err = engine.create("x@y.com", "gitlab.com", "work").unwrap_err();
    assert!(matches!(err, SyncError::DuplicateAlias(ref a) if a == "work"));
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(generator.calls(), 1);

    assert_eq!(env.document(), doc_before);
    assert_eq!(env.registry_raw(), registry_before);
}

#[test]
fn test_generation_failure_leaves_nothing_behind() {
    let env = TestEnv::new();
    let mut engine = env.engine_with(Box::new(FailingGenerator));

    let err = engine.create("a@b.com", "github.com", "work").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    assert!(!err.is_partial());

    assert!(env.key_dir_entries().is_empty());
    assert!(engine.list_all().is_empty());
    assert!(!env.paths.document_path.exists());
}

#[test]
fn test_registry_failure_reports_orphans_and_repair_removes_them() {
    let env = TestEnv::new();
    let registry_path = env.paths.registry_path.clone();
    let mut engine = env.engine_with(Box::new(SabotageGenerator::new(move || {
        // keys.json 变成目录，保存时 rename 失败
        fs::create_dir_all(&registry_path).unwrap();
    })));

    let err = engine.create("a@b.com", "github.com", "work").unwrap_err();
    assert!(err.is_partial());
    assert_eq!(err.kind(), ErrorKind::Incomplete);
    assert!(matches!(
        err,
        SyncError::Incomplete {
            operation: "create",
            stage: SyncStage::Registry,
            ..
        }
    ));
    assert_eq!(err.orphaned_files().len(), 2);
    assert!(err.orphaned_files().iter().all(|p| p.is_file()));
    assert!(!env.document().contains("Host github-work"));

    fs::remove_dir(&env.paths.registry_path).unwrap();

    let report = engine.verify_integrity().unwrap();
    assert_eq!(
        report.orphaned_key_files,
        vec!["id_ed25519_work".to_string(), "id_ed25519_work.pub".to_string()]
    );
    assert_eq!(report.repairable(), 2);

    let repaired = engine.repair_integrity(&report).unwrap();
    assert_eq!(repaired.files_removed.len(), 2);
    assert!(env.key_dir_entries().is_empty());
    assert!(engine.verify_integrity().unwrap().is_consistent());
}

#[test]
fn test_document_failure_is_incomplete_and_repairable() {
    let env = TestEnv::new();
    let mut engine = env.engine();

    // 文档路径被目录占用，写入失败
    fs::create_dir_all(&env.paths.document_path).unwrap();

    let err = engine.create("a@b.com", "github.com", "work").unwrap_err();
    assert!(matches!(
        err,
        SyncError::Incomplete {
            stage: SyncStage::ConfigDocument,
            ..
        }
    ));
    assert!(err.orphaned_files().is_empty());

    // 密钥和记录已经生效
    assert!(engine.find("work").is_ok());
    assert!(env.key_path("work").is_file());

    fs::remove_dir(&env.paths.document_path).unwrap();

    let report = engine.verify_integrity().unwrap();
    assert!(!report.is_consistent());
    assert_eq!(report.missing_blocks.len(), 1);
    assert_eq!(report.missing_blocks[0].block_name, "github-work");
    assert!(report.orphaned_key_files.is_empty());

    let repaired = engine.repair_integrity(&report).unwrap();
    assert_eq!(repaired.blocks_restored, vec!["github-work".to_string()]);
    assert_eq!(env.document().matches("Host github-work").count(), 1);
    assert!(engine.verify_integrity().unwrap().is_consistent());
}

#[test]
fn test_repair_skips_record_without_key_files() {
    let env = TestEnv::new();
    let mut engine = env.engine();

    engine.create("a@b.com", "github.com", "work").unwrap();
    fs::remove_file(env.key_path("work")).unwrap();
    fs::remove_file(&env.paths.document_path).unwrap();

    let report = engine.verify_integrity().unwrap();
    assert_eq!(report.missing_key_files.len(), 1);
    assert_eq!(report.missing_blocks.len(), 1);

    let repaired = engine.repair_integrity(&report).unwrap();
    assert!(repaired.blocks_restored.is_empty());
    assert_eq!(repaired.skipped.len(), 1);
    assert!(!env.paths.document_path.exists());
}

#[test]
fn test_verify_leaves_hand_written_blocks_alone() {
    let env = TestEnv::new();
    let mut engine = env.engine();
    fs::create_dir_all(env.paths.document_path.parent().unwrap()).unwrap();
    fs::write(&env.paths.document_path, "Host *\n    AddKeysToAgent yes\n").unwrap();

    engine.create("a@b.com", "github.com", "work").unwrap();

    let report = engine.verify_integrity().unwrap();
    assert!(report.is_consistent());
    assert_eq!(report.unmanaged_blocks, vec!["*".to_string()]);

    let repaired = engine.repair_integrity(&report).unwrap();
    assert!(repaired.blocks_restored.is_empty());
    assert!(env.document().starts_with("Host *\n    AddKeysToAgent yes\n"));
}

#[test]
fn test_delete_keeps_neighbouring_blocks_intact() {
    let env = TestEnv::new();
    let mut engine = env.engine();
    let hand_written = "# mine\nHost *\n    AddKeysToAgent yes\n";
    fs::create_dir_all(env.paths.document_path.parent().unwrap()).unwrap();
    fs::write(&env.paths.document_path, hand_written).unwrap();

    engine.create("a@b.com", "github.com", "workshop").unwrap();
    let after_workshop = env.document();
    engine.create("a@b.com", "github.com", "work").unwrap();

    engine.delete("work").unwrap();

    // github-workshop 与手写内容保持原样，只多出追加时的空行
    let doc = env.document();
    assert!(doc.starts_with(&after_workshop));
    assert_eq!(doc.trim_end(), after_workshop.trim_end());
    assert!(doc.starts_with(hand_written));
    assert!(engine.find("workshop").is_ok());
    assert!(env.key_path("workshop").is_file());
}

#[test]
fn test_delete_unknown_alias() {
    let env = TestEnv::new();
    let mut engine = env.engine();

    let err = engine.delete("ghost").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AliasNotFound);
}

#[test]
fn test_delete_removes_every_duplicate_record() {
    let env = TestEnv::new();
    let mut engine = env.engine();
    engine.create("a@b.com", "github.com", "work").unwrap();

    // 手工制造重复别名，第二条指向不存在的密钥
    let mut records: Vec<KeyRecord> =
        serde_json::from_str(&env.registry_raw()).unwrap();
    let mut dup = records[0].clone();
    dup.hostname = "gitlab.com".into();
    dup.key_path = env.paths.keys_dir.join("id_ed25519_gone");
    records.push(dup);
    fs::write(&env.paths.registry_path, serde_json::to_string(&records).unwrap()).unwrap();

    assert_eq!(
        engine.verify_integrity().unwrap().duplicate_aliases,
        vec!["work".to_string()]
    );

    let outcome = engine.delete("work").unwrap();
    assert_eq!(outcome.removed.len(), 2);
    assert_eq!(outcome.block_name, "github-work");
    assert!(outcome.block_removed);
    assert!(engine.list_all().is_empty());
}

#[test]
fn test_delete_all_requires_confirmation() {
    let env = TestEnv::new();
    let mut engine = env.engine();
    engine.create("a@b.com", "github.com", "work").unwrap();

    let err = engine.delete_all(Confirmation::Declined).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Aborted);
    assert_eq!(engine.list_all().len(), 1);
    assert!(env.paths.document_path.exists());
}

#[test]
fn test_delete_all_wipes_every_store() {
    let env = TestEnv::new();
    let mut engine = env.engine();
    engine.create("a@b.com", "github.com", "work").unwrap();
    engine.create("c@d.com", "gitlab.com", "home").unwrap();
    // 不在记录中的文件也会被清掉
    fs::write(env.paths.keys_dir.join("stray"), "x").unwrap();

    let report = engine.delete_all(Confirmation::from(true)).unwrap();
    assert_eq!(report.key_entries_removed, 5);
    assert!(report.document_removed);
    assert_eq!(report.records_cleared, 2);

    assert!(env.key_dir_entries().is_empty());
    assert!(!env.paths.document_path.exists());
    assert_eq!(env.registry_raw(), "[]");
    assert!(engine.list_all().is_empty());
    assert_eq!(engine.show_config().unwrap(), DocumentView::Absent);
}

/// 密钥目录清到一半失败：报告为未完成，文档和记录保持原样
#[cfg(unix)]
#[test]
fn test_delete_all_reports_partially_wiped_key_directory() {
    use std::os::unix::fs::PermissionsExt;

    let env = TestEnv::new();
    let mut engine = env.engine();
    engine.create("a@b.com", "github.com", "work").unwrap();

    // 排序在密钥文件之后，里面的文件删不掉
    let locked = env.paths.keys_dir.join("zz_locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("inner"), "x").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
    if fs::write(locked.join("write-check"), "x").is_ok() {
        // root 不受目录权限限制
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = engine.delete_all(Confirmation::Confirmed);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Incomplete {
            operation: "delete-all",
            stage: SyncStage::KeyStore,
            ..
        }
    ));
    assert!(err.is_partial());
    assert!(!env.key_path("work").exists());
    assert!(locked.join("inner").exists());
    // 后续阶段没有执行
    assert!(env.document().contains("Host github-work"));
    assert!(env.registry_raw().contains("\"alias\": \"work\""));
}

/// 一个条目都没删掉时原样返回错误
#[cfg(unix)]
#[test]
fn test_delete_all_with_nothing_removed_is_plain_error() {
    use std::os::unix::fs::PermissionsExt;

    let env = TestEnv::new();
    let mut engine = env.engine();
    engine.create("a@b.com", "github.com", "work").unwrap();

    let keys_dir = env.paths.keys_dir.clone();
    fs::set_permissions(&keys_dir, fs::Permissions::from_mode(0o555)).unwrap();
    if fs::write(keys_dir.join("write-check"), "x").is_ok() {
        fs::set_permissions(&keys_dir, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = engine.delete_all(Confirmation::Confirmed);
    fs::set_permissions(&keys_dir, fs::Permissions::from_mode(0o755)).unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err, SyncError::Io(_)));
    assert!(!err.is_partial());
    assert!(env.key_path("work").exists());
}

#[test]
fn test_malformed_registry_lists_empty_and_is_preserved() {
    let env = TestEnv::new();
    let mut engine = env.engine();
    fs::write(&env.paths.registry_path, "[{ definitely not json").unwrap();

    assert!(engine.list_all().is_empty());
    assert_eq!(engine.show_registry().unwrap(), "[]");

    engine.create("a@b.com", "github.com", "work").unwrap();

    let backup = env.paths.registry_path.with_file_name("keys.json.corrupt");
    assert_eq!(fs::read_to_string(backup).unwrap(), "[{ definitely not json");
    assert_eq!(engine.list_all().len(), 1);
}

/// keys.json 损坏时，修复不能把在用的密钥当作孤立文件删除
#[test]
fn test_repair_refuses_to_run_against_malformed_registry() {
    let env = TestEnv::new();
    let mut engine = env.engine();
    engine.create("a@b.com", "github.com", "work").unwrap();

    let raw = env.registry_raw();
    fs::write(&env.paths.registry_path, raw.trim_end().trim_end_matches(']')).unwrap();

    let report = engine.verify_integrity().unwrap();
    assert!(report.registry_corrupt);
    assert!(!report.is_consistent());
    assert_eq!(report.orphaned_key_files.len(), 2);
    assert_eq!(report.repairable(), 0);

    let err = engine.repair_integrity(&report).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptRegistry);

    assert!(env.key_path("work").is_file());
    assert!(common::pub_path(&env.key_path("work")).is_file());
    assert!(env.document().contains("Host github-work"));
}

#[test]
fn test_show_projections() {
    let env = TestEnv::new();
    let mut engine = env.engine();

    assert_eq!(engine.show_config().unwrap(), DocumentView::Absent);
    assert_eq!(engine.show_registry().unwrap(), "[]");

    engine.create("a@b.com", "github.com", "work").unwrap();

    match engine.show_config().unwrap() {
        DocumentView::Content(text) => assert!(text.starts_with("Host github-work\n")),
        other => panic!("unexpected view: {:?}", other),
    }
    let json = engine.show_registry().unwrap();
    assert!(json.contains("\"key_name\": \"id_ed25519_work\""));
    assert!(json.contains("\"created\": "));
}

#[test]
fn test_engine_sees_changes_made_by_another_instance() {
    let env = TestEnv::new();
    let mut first = env.engine();
    let mut second = env.engine();

    first.create("a@b.com", "github.com", "work").unwrap();
    assert!(second.find("work").is_ok());

    second.delete("work").unwrap();
    assert!(first.list_all().is_empty());
}
