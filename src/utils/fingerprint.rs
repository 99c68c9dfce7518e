use std::path::Path;

/// 计算 OpenSSH 风格的 `SHA256:` 公钥指纹
///
/// 输入为 `.pub` 文件内容（`<type> <base64> [comment]`），对 base64 解码后的
/// 公钥 blob 做 SHA256，再以不带填充的 base64 输出。
pub fn public_key_fingerprint(public_key_line: &str) -> Option<String> {
    use base64::Engine;
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
    use sha2::{Digest, Sha256};

    let blob_b64 = public_key_line.split_whitespace().nth(1)?;
    let blob = STANDARD.decode(blob_b64).ok()?;

    let mut hasher = Sha256::new();
    hasher.update(&blob);
    let hash = hasher.finalize();

    Some(format!("SHA256:{}", STANDARD_NO_PAD.encode(hash)))
}

pub fn fingerprint_file(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    public_key_fingerprint(content.trim())
}

/// 十六进制短摘要，用于日志中标识文档内容
pub fn short_digest(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(data);
    hex::encode(&hash[..6])
}
