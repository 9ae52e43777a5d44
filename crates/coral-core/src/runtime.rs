//! 不透明协作方契约：鉴权、转码、重试、追踪与安全/熔断配置。
//!
//! ## 设计目标（Why）
//! - 连接复用核心把这些对象原样透传给传输实现与子管理器，自身不解释
//!   其内部策略；契约只要求对象安全、可跨线程共享；
//! - 追踪器额外承担引用计数语义（最后一个持有者释放时触发 `stop`），
//!   计数本身由 `coral-client` 的句柄类型实现。
//!
//! ## 风险提示（Trade-offs）
//! - 默认实现（JSON 透传转码、尽力重试、空追踪器）只为“零配置可用”
//!   服务，生产部署应注入真实策略。

use crate::error::CoreError;
use std::fmt;
use std::time::Duration;

/// 鉴权协作方：向指纹与日志提供稳定身份标识。
///
/// # 契约说明（What）
/// - `identity` 必须稳定且不含密钥材料：同一身份在进程生命周期内返回
///   相同字符串，它会参与连接指纹计算；
/// - 凭证本体如何交付给传输实现不在本契约内。
pub trait Authenticator: Send + Sync {
    /// 稳定身份标识（参与指纹，不得包含密钥）。
    fn identity(&self) -> &str;
}

/// 用户名/密码鉴权的最小实现。
#[derive(Clone)]
pub struct PasswordAuthenticator {
    username: String,
    password: String,
}

impl PasswordAuthenticator {
    /// 构造用户名/密码鉴权器。
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// 读取密码，仅供传输实现在握手时取用。
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Authenticator for PasswordAuthenticator {
    fn identity(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for PasswordAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 密码永不进入日志。
        f.debug_struct("PasswordAuthenticator")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// 转码协作方：KV 值与字节序列之间的互转。
pub trait Transcoder: Send + Sync {
    /// 编码值并返回（字节，格式标志）。
    fn encode(&self, value: &[u8]) -> Result<(Vec<u8>, u32), CoreError>;
    /// 按格式标志解码字节。
    fn decode(&self, data: &[u8], flags: u32) -> Result<Vec<u8>, CoreError>;
}

/// JSON 透传转码器：默认实现，不做格式转换。
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonTranscoder;

/// JSON 载荷的格式标志（与线缆协议的公共数据格式约定对齐）。
const JSON_FLAGS: u32 = 0x0200_0000;

impl Transcoder for JsonTranscoder {
    fn encode(&self, value: &[u8]) -> Result<(Vec<u8>, u32), CoreError> {
        Ok((value.to_vec(), JSON_FLAGS))
    }

    fn decode(&self, data: &[u8], _flags: u32) -> Result<Vec<u8>, CoreError> {
        Ok(data.to_vec())
    }
}

/// 重试策略协作方：由请求分发层消费，本层只透传。
pub trait RetryStrategy: Send + Sync {
    /// 第 `attempt` 次失败后的建议退避；`None` 表示放弃。
    fn retry_after(&self, attempt: u32) -> Option<Duration>;
}

/// 尽力而为的指数退避策略（默认实现）。
#[derive(Clone, Copy, Debug)]
pub struct BestEffortRetryStrategy {
    ceiling: Duration,
}

impl Default for BestEffortRetryStrategy {
    fn default() -> Self {
        Self {
            ceiling: Duration::from_millis(500),
        }
    }
}

impl RetryStrategy for BestEffortRetryStrategy {
    fn retry_after(&self, attempt: u32) -> Option<Duration> {
        let backoff = Duration::from_millis(1 << attempt.min(9));
        Some(backoff.min(self.ceiling))
    }
}

/// 请求级追踪片段。
pub trait RequestSpan: Send {
    /// 结束本片段。
    fn end(&mut self);
}

/// 请求追踪协作方。
///
/// # 契约说明（What）
/// - `start_span` 必须可并发调用；
/// - `stop` 在最后一个逻辑持有者释放时被调用恰好一次（由
///   `coral-client` 的计数句柄保证），用于冲刷缓冲并回收后台资源。
pub trait RequestTracer: Send + Sync {
    /// 开启一个以 `operation` 命名的追踪片段。
    fn start_span(&self, operation: &str) -> Box<dyn RequestSpan>;
    /// 计数归零时的终止钩子。
    fn stop(&self) {}
}

/// 空追踪器：默认实现，所有操作为空。
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTracer;

struct NoopSpan;

impl RequestSpan for NoopSpan {
    fn end(&mut self) {}
}

impl RequestTracer for NoopTracer {
    fn start_span(&self, _operation: &str) -> Box<dyn RequestSpan> {
        Box::new(NoopSpan)
    }
}

/// 熔断配置：原样透传给传输实现。
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// 是否启用熔断。
    pub enabled: bool,
    /// 统计窗口内的最小样本量。
    pub volume_threshold: u64,
    /// 触发熔断的错误百分比（0–100）。
    pub error_threshold_percentage: u8,
    /// 熔断后进入半开前的等待时长。
    pub sleep_window: Duration,
    /// 滚动统计窗口长度。
    pub rolling_window: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume_threshold: 20,
            error_threshold_percentage: 50,
            sleep_window: Duration::from_secs(5),
            rolling_window: Duration::from_secs(60),
        }
    }
}

/// 安全配置：TLS 行为与信任根。
#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    /// 跳过证书校验（仅限测试环境）。
    pub tls_skip_verify: bool,
    /// 信任根证书（DER 编码）。
    pub trust_roots: Vec<Vec<u8>>,
}
