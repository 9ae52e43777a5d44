//! 会话指纹：有效配置加桶名的确定性摘要，连接注册表的缓存键。
//!
//! ## 设计目标（Why）
//! - 相同桶、相同有效配置的两次获取必须落到同一条连接；任何线缆相关
//!   字段的差异必须产生不同指纹——指纹是“至多一条连接每配置”不变式
//!   的承载者；
//! - 每次需要句柄时现算，调用侧从不缓存，避免配置与键脱钩。
//!
//! ## 逻辑解析（How）
//! - 对 [`SessionProfile`] 的每个字段做长度前缀（或定长）编码后喂入
//!   SHA-256，消除字段拼接歧义；摘要以小写十六进制呈现。

use coral_core::transport::SessionProfile;
use sha2::{Digest, Sha256};
use std::fmt;

/// 会话指纹：SHA-256 摘要的十六进制形式。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionFingerprint(String);

impl SessionFingerprint {
    /// 以十六进制字符串视图读取指纹。
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn update_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn update_duration(hasher: &mut Sha256, value: std::time::Duration) {
    hasher.update(value.as_nanos().to_le_bytes());
}

/// 从会话画像计算指纹。
///
/// # 契约说明（What）
/// - 确定性：相同画像永远产出相同指纹；
/// - 区分性：任一字段不同则指纹不同（在 SHA-256 碰撞界内）；
/// - 无副作用，可在任意线程并发调用。
pub fn fingerprint(profile: &SessionProfile) -> SessionFingerprint {
    let mut hasher = Sha256::new();
    match &profile.bucket {
        Some(name) => {
            hasher.update([1u8]);
            update_str(&mut hasher, name);
        }
        None => hasher.update([0u8]),
    }
    update_duration(&mut hasher, profile.connect_timeout);
    update_duration(&mut hasher, profile.kv_timeout);
    update_duration(&mut hasher, profile.kv_durable_timeout);
    update_duration(&mut hasher, profile.durability_poll_interval);
    hasher.update([u8::from(profile.use_mutation_tokens)]);
    hasher.update([u8::from(profile.use_server_durations)]);
    update_str(&mut hasher, &profile.auth_identity);
    hasher.update([u8::from(profile.tls_skip_verify)]);
    hasher.update((profile.trust_root_digests.len() as u64).to_le_bytes());
    for digest in &profile.trust_root_digests {
        hasher.update(digest);
    }
    SessionFingerprint(hex::encode(hasher.finalize()))
}
