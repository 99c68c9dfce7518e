use crate::ssh_config::DocumentView;
use crate::sync::SyncEngine;

pub fn cmd_show_config(engine: &SyncEngine) -> Result<(), Box<dyn std::error::Error>> {
    let path = engine.paths().document_path.clone();

    match engine.show_config()? {
        DocumentView::Absent => println!("📭 配置文件不存在: {}", path.display()),
        DocumentView::Empty => println!("📭 配置文件为空: {}", path.display()),
        DocumentView::Content(text) => {
            println!("📄 {}\n", path.display());
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

pub fn cmd_show_registry(engine: &mut SyncEngine) -> Result<(), Box<dyn std::error::Error>> {
    println!("📄 {}\n", engine.paths().registry_path.display());
    println!("{}", engine.show_registry()?);
    Ok(())
}
