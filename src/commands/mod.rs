pub mod completion;
pub mod config;
pub mod deploy;
pub mod key;
pub mod list;
pub mod show;
pub mod verify;

use crate::error::SyncError;

/// 终端上展示的错误信息：错误码、描述，部分失败时附带遗留文件
pub fn describe_error(err: &SyncError) -> String {
    let mut out = format!("❌ [E{}] {}", err.error_code(), err);

    if err.is_partial() {
        out.push_str("\n⚠️  操作未完整执行，各存储可能不一致，可运行 `ssh-key-manager verify --repair` 修复");
        let orphaned = err.orphaned_files();
        if !orphaned.is_empty() {
            out.push_str("\n  遗留文件:");
            for path in orphaned {
                out.push_str(&format!("\n    - {}", path.display()));
            }
        }
    }
    out
}
