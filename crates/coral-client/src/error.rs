//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为连接层对外暴露的配置类错误提供集中定义，确保与
//!   `coral-core::CoreError` 的稳定错误码对齐；
//! - 配置错误在集群构造期快速失败且从不缓存，与引导错误（缓存重放）
//!   的传播策略截然不同，因此单独建枚举。
//!
//! ## 设计要求（What）
//! - 错误类型实现 `thiserror::Error` 以兼容 `std::error::Error`；
//! - 通过 `From<ConfigError>` 自动转换为核心错误，便于门面直接 `?` 传播。

use coral_core::error::{CoreError, codes};
use thiserror::Error;

/// 集群构造期的配置错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：连接串覆盖项与 scheme 校验失败必须中止构造，
///   不能像引导失败那样延迟到首次使用；
/// - **契约 (What)**：所有变体 `Clone + Send + Sync + 'static`，
///   转换为 [`CoreError`] 时携带原错误作为底层原因；
/// - **权衡 (Trade-offs)**：用 `String` 保存取值上下文，牺牲少量堆
///   分配换取排障可读性。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 已识别的超时覆盖项取值不是十进制毫秒数。
    #[error("`{key}` option must be a number, got `{value}`")]
    InvalidOption {
        /// 选项名。
        key: &'static str,
        /// 原始取值。
        value: String,
    },
    /// 连接串 scheme 不受支持。
    #[error("`{scheme}` scheme is not supported, use coral or corals instead")]
    UnsupportedScheme {
        /// 原始 scheme。
        scheme: String,
    },
}

impl From<ConfigError> for CoreError {
    fn from(error: ConfigError) -> Self {
        let code = match &error {
            ConfigError::InvalidOption { .. } => codes::CONFIG_INVALID_OPTION,
            ConfigError::UnsupportedScheme { .. } => codes::CONFIG_UNSUPPORTED_SCHEME,
        };
        CoreError::new(code, error.to_string()).with_cause(error)
    }
}
