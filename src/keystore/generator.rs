use crate::config::{GeneratorKind, Settings};
use crate::error::KeyGenError;
use crate::models::key::public_key_path;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// 密钥对生成器：给定输出路径和注释，生成 `<path>` 与 `<path>.pub`
pub trait KeyGenerator: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, key_path: &Path, comment: &str) -> Result<(), KeyGenError>;
}

pub fn generator_for(settings: &Settings) -> Box<dyn KeyGenerator> {
    match settings.generator {
        GeneratorKind::SshKeygen => Box::new(SshKeygen::new(&settings.ssh_keygen_program)),
        GeneratorKind::Builtin => Box::new(BuiltinGenerator),
    }
}

/// 调用外部 ssh-keygen，不设置口令
pub struct SshKeygen {
    program: String,
}

impl SshKeygen {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Default for SshKeygen {
    fn default() -> Self {
        Self::new("ssh-keygen")
    }
}

impl KeyGenerator for SshKeygen {
    fn name(&self) -> &str {
        &self.program
    }

    fn generate(&self, key_path: &Path, comment: &str) -> Result<(), KeyGenError> {
        debug!(program = %self.program, path = %key_path.display(), "Spawning key generator");

        let output = Command::new(&self.program)
            .arg("-t")
            .arg("ed25519")
            .arg("-C")
            .arg(comment)
            .arg("-f")
            .arg(key_path)
            .arg("-N")
            .arg("") // 无口令
            .arg("-q")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| KeyGenError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(KeyGenError::ExitStatus {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!(path = %key_path.display(), "ssh-keygen produced key pair");
        Ok(())
    }
}

/// 进程内生成 ed25519，输出 OpenSSH 格式
pub struct BuiltinGenerator;

impl KeyGenerator for BuiltinGenerator {
    fn name(&self) -> &str {
        "builtin-ed25519"
    }

    fn generate(&self, key_path: &Path, comment: &str) -> Result<(), KeyGenError> {
        use ssh_key::private::{Ed25519Keypair, KeypairData};
        use ssh_key::rand_core::OsRng;
        use ssh_key::{LineEnding, PrivateKey};

        let keypair = Ed25519Keypair::random(&mut OsRng);
        let private_key = PrivateKey::new(KeypairData::Ed25519(keypair), comment)
            .map_err(|e| KeyGenError::Builtin(e.to_string()))?;

        let private_pem = private_key
            .to_openssh(LineEnding::LF)
            .map_err(|e| KeyGenError::Builtin(e.to_string()))?;
        let public_line = private_key
            .public_key()
            .to_openssh()
            .map_err(|e| KeyGenError::Builtin(e.to_string()))?;

        let write = |path: &Path, data: &[u8]| {
            std::fs::write(path, data)
                .map_err(|e| KeyGenError::Builtin(format!("write {}: {}", path.display(), e)))
        };

        write(key_path, private_pem.as_bytes())?;
        write(&public_key_path(key_path), format!("{}\n", public_line).as_bytes())?;

        info!(path = %key_path.display(), "Builtin generator produced key pair");
        Ok(())
    }
}
