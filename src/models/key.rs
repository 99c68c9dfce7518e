use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const KEY_NAME_PREFIX: &str = "id_ed25519_";

/// 一个受管的 SSH 身份（keys.json 中的一条记录）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub key_name: String,
    pub email: String,
    pub hostname: String,
    pub alias: String,
    pub key_path: PathBuf,
    #[serde(rename = "created", with = "created_format")]
    pub created_at: NaiveDateTime,
}

impl KeyRecord {
    pub fn new(email: &str, hostname: &str, alias: &str, key_path: PathBuf) -> Self {
        // keys.json 只保存到秒
        let now = chrono::Local::now().naive_local();
        Self {
            key_name: key_name_for(alias),
            email: email.to_string(),
            hostname: hostname.to_string(),
            alias: alias.to_string(),
            key_path,
            created_at: now.with_nanosecond(0).unwrap_or(now),
        }
    }

    pub fn public_key_path(&self) -> PathBuf {
        public_key_path(&self.key_path)
    }

    pub fn block_name(&self) -> String {
        block_name(&self.hostname, &self.alias)
    }

    pub fn config_block(&self) -> ConfigBlock {
        ConfigBlock::for_record(self)
    }
}

/// keygen 产出的一对密钥文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFiles {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
}

impl KeyFiles {
    pub fn for_private(private_key: &Path) -> Self {
        Self {
            private_key: private_key.to_path_buf(),
            public_key: public_key_path(private_key),
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        vec![self.private_key.clone(), self.public_key.clone()]
    }
}

/// 配置文档中的一个 Host 块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBlock {
    pub block_name: String,
    pub host_name: String,
    pub user: String,
    pub identity_file: String,
}

impl ConfigBlock {
    pub const USER: &'static str = "git";

    pub fn new(hostname: &str, alias: &str) -> Self {
        Self {
            block_name: block_name(hostname, alias),
            host_name: hostname.to_string(),
            user: Self::USER.to_string(),
            identity_file: format!("~/.ssh/{}", key_name_for(alias)),
        }
    }

    pub fn for_record(record: &KeyRecord) -> Self {
        Self {
            block_name: record.block_name(),
            host_name: record.hostname.clone(),
            user: Self::USER.to_string(),
            identity_file: format!("~/.ssh/{}", record.key_name),
        }
    }

    pub fn host_line(&self) -> String {
        host_line(&self.block_name)
    }

    /// 渲染为 ssh_config 片段（不含结尾换行）
    pub fn render(&self) -> String {
        format!(
            "{}\n    HostName {}\n    User {}\n    IdentityFile {}",
            self.host_line(),
            self.host_name,
            self.user,
            self.identity_file
        )
    }
}

pub fn key_name_for(alias: &str) -> String {
    format!("{}{}", KEY_NAME_PREFIX, alias)
}

pub fn public_key_path(private_key: &Path) -> PathBuf {
    let mut os = private_key.as_os_str().to_os_string();
    os.push(".pub");
    PathBuf::from(os)
}

/// 取主机名第一个 `.` 之前的部分
pub fn first_label(hostname: &str) -> &str {
    hostname.split('.').next().unwrap_or(hostname)
}

pub fn block_name(hostname: &str, alias: &str) -> String {
    format!("{}-{}", first_label(hostname), alias)
}

pub fn host_line(block_name: &str) -> String {
    format!("Host {}", block_name)
}

mod created_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
