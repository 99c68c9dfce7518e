use crate::config::{GeneratorKind, Settings, StorePaths};
use std::env;
use std::path::PathBuf;

pub struct SystemInfo {
    pub version: String,
    pub os: String,
    pub arch: String,
    pub config_path: PathBuf,
    pub paths: StorePaths,
    pub generator: String,
}

impl SystemInfo {
    pub fn new(config_path: PathBuf, settings: &Settings) -> Self {
        let generator = match settings.generator {
            GeneratorKind::SshKeygen => settings.ssh_keygen_program.clone(),
            GeneratorKind::Builtin => "builtin".to_string(),
        };

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            os: env::consts::OS.to_string(),
            arch: env::consts::ARCH.to_string(),
            config_path,
            paths: settings.store_paths(),
            generator,
        }
    }

    pub fn to_string(&self) -> String {
        format!(
            "SSH Key Manager Info\n\
             --------------------\n\
             Version: {}\n\
             OS: {} {}\n\
             Settings File: {}\n\
             Keys Directory: {}\n\
             Registry: {}\n\
             Config Document: {}\n\
             SSH Directory: {}\n\
             Generator: {}",
            self.version,
            self.os,
            self.arch,
            self.config_path.display(),
            self.paths.keys_dir.display(),
            self.paths.registry_path.display(),
            self.paths.document_path.display(),
            self.paths.ssh_dir.display(),
            self.generator
        )
    }
}

pub fn print_info(config_path: PathBuf, settings: &Settings) {
    println!("{}", SystemInfo::new(config_path, settings).to_string());
}
