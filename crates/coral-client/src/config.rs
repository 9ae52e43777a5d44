//! 配置块：调用方选项的解析、默认值填充与连接串覆盖。
//!
//! ## 设计目标（Why）
//! - 集群门面构造一次 [`StateBlock`]，此后只读：所有超时、开关与注入
//!   策略在首次使用前固化，消除运行期的配置竞态；
//! - 会影响线缆行为的字段子集由 [`StateBlock::session_profile`] 单独
//!   导出，与指纹计算共享同一事实来源。
//!
//! ## 契约说明（What）
//! - 每个超时解析后严格大于零：调用方给零值或缺省即落回默认表；
//! - 连接串覆盖仅识别四个超时键，取最后一个值，非数字即
//!   [`ConfigError::InvalidOption`] 并中止构造；
//! - 覆盖发生在首次使用之前，此后 [`StateBlock`] 不再变更。

use crate::error::ConfigError;
use coral_core::connstr::ConnSpec;
use coral_core::runtime::{
    Authenticator, BestEffortRetryStrategy, CircuitBreakerConfig, JsonTranscoder, NoopTracer,
    PasswordAuthenticator, RequestTracer, RetryStrategy, SecurityConfig, Transcoder,
};
use coral_core::transport::SessionProfile;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(10_000);
const DEFAULT_KV_TIMEOUT: Duration = Duration::from_millis(2_500);
const DEFAULT_KV_DURABLE_TIMEOUT: Duration = Duration::from_millis(10_000);
const DEFAULT_SERVICE_TIMEOUT: Duration = Duration::from_millis(75_000);
const DEFAULT_DURABILITY_POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_ORPHAN_REPORT_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_ORPHAN_SAMPLE_SIZE: u32 = 10;

/// 各类操作超时的调用方输入；零值表示“使用默认”。
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeoutsConfig {
    /// 建连总超时。
    pub connect_timeout: Duration,
    /// KV 操作超时。
    pub kv_timeout: Duration,
    /// 持久化 KV 操作超时。
    pub kv_durable_timeout: Duration,
    /// 视图查询超时。
    pub view_timeout: Duration,
    /// 查询超时。
    pub query_timeout: Duration,
    /// 分析超时。
    pub analytics_timeout: Duration,
    /// 搜索超时。
    pub search_timeout: Duration,
    /// 管理操作超时。
    pub management_timeout: Duration,
}

/// IO 行为开关；默认全部启用，故以“禁用”语义表达。
#[derive(Clone, Copy, Debug, Default)]
pub struct IoConfig {
    /// 禁用变更令牌。
    pub disable_mutation_tokens: bool,
    /// 禁用服务端耗时采集。
    pub disable_server_durations: bool,
}

/// 孤儿响应上报配置（请求已超时出局后才收到响应的记录器）。
#[derive(Clone, Copy, Debug, Default)]
pub struct OrphanReporterConfig {
    /// 关闭上报。
    pub disabled: bool,
    /// 上报间隔；零值回落默认。
    pub report_interval: Duration,
    /// 每轮采样条数；零值回落默认。
    pub sample_size: u32,
}

/// 创建集群门面的全部可选项。
///
/// # 契约说明（What）
/// - 所有字段可缺省：鉴权缺省为用户名/密码组合，策略对象缺省为
///   crate 内置实现；
/// - 选项只在 [`StateBlock::resolve`] 时被读取一次，之后的修改不会
///   影响已构造的集群。
#[derive(Clone, Default)]
pub struct ClusterOptions {
    /// 鉴权器；缺省时由 `username`/`password` 构造。
    pub authenticator: Option<Arc<dyn Authenticator>>,
    /// 集群用户名（`authenticator` 缺省时生效）。
    pub username: String,
    /// 集群密码（`authenticator` 缺省时生效）。
    pub password: String,
    /// 操作超时集合。
    pub timeouts: TimeoutsConfig,
    /// KV 转码器。
    pub transcoder: Option<Arc<dyn Transcoder>>,
    /// 重试策略。
    pub retry_strategy: Option<Arc<dyn RetryStrategy>>,
    /// 请求追踪器。
    pub tracer: Option<Arc<dyn RequestTracer>>,
    /// 孤儿响应上报配置。
    pub orphan_reporter: OrphanReporterConfig,
    /// 熔断配置。
    pub circuit_breaker: CircuitBreakerConfig,
    /// IO 行为开关。
    pub io: IoConfig,
    /// 安全配置。
    pub security: SecurityConfig,
}

/// 解析后的孤儿上报参数。
#[derive(Clone, Copy, Debug)]
pub struct OrphanReporting {
    /// 是否启用。
    pub enabled: bool,
    /// 上报间隔。
    pub interval: Duration,
    /// 每轮采样条数。
    pub sample_size: u32,
}

/// 构造后只读的配置块：集群门面与其创建的所有会话共享的事实来源。
///
/// # 设计背景（Why）
/// - 把“默认值决策”集中在一次解析里，使注册表指纹与传输实现观察到的
///   配置严格一致；
/// - 不可变性让读路径完全无锁：任意线程并发读取无需同步。
///
/// # 契约说明（What）
/// - 不变式：每个超时字段大于零；
/// - 注入的策略对象以 `Arc` 共享，原样透传，不做解释。
#[derive(Clone)]
pub struct StateBlock {
    /// 建连总超时。
    pub connect_timeout: Duration,
    /// KV 操作超时。
    pub kv_timeout: Duration,
    /// 持久化 KV 操作超时。
    pub kv_durable_timeout: Duration,
    /// 视图查询超时。
    pub view_timeout: Duration,
    /// 查询超时。
    pub query_timeout: Duration,
    /// 分析超时。
    pub analytics_timeout: Duration,
    /// 搜索超时。
    pub search_timeout: Duration,
    /// 管理操作超时。
    pub management_timeout: Duration,
    /// 持久化轮询间隔。
    pub durability_poll_interval: Duration,
    /// KV 转码器。
    pub transcoder: Arc<dyn Transcoder>,
    /// 是否启用变更令牌。
    pub use_mutation_tokens: bool,
    /// 是否采集服务端耗时。
    pub use_server_durations: bool,
    /// 重试策略。
    pub retry_strategy: Arc<dyn RetryStrategy>,
    /// 孤儿响应上报参数。
    pub orphan_reporting: OrphanReporting,
    /// 请求追踪器（引用计数由门面的句柄类型承担）。
    pub tracer: Arc<dyn RequestTracer>,
    /// 熔断配置。
    pub circuit_breaker: CircuitBreakerConfig,
    /// 安全配置。
    pub security: SecurityConfig,
    /// 鉴权器。
    pub authenticator: Arc<dyn Authenticator>,
}

fn or_default(value: Duration, default: Duration) -> Duration {
    if value.is_zero() { default } else { value }
}

impl StateBlock {
    /// 解析调用方选项，填充默认表，产出只读配置块。
    ///
    /// # 执行逻辑（How）
    /// 1. 零值超时逐项落回默认表（建连 10s、KV 2.5s、持久化 KV 10s、
    ///    四类服务 75s）；
    /// 2. 策略对象缺省为内置实现（JSON 透传转码、尽力重试、空追踪器）；
    /// 3. IO 开关从“禁用”语义翻转为内部的“启用”语义。
    pub fn resolve(opts: ClusterOptions) -> Self {
        let authenticator: Arc<dyn Authenticator> = opts.authenticator.unwrap_or_else(|| {
            Arc::new(PasswordAuthenticator::new(opts.username, opts.password))
        });
        Self {
            connect_timeout: or_default(opts.timeouts.connect_timeout, DEFAULT_CONNECT_TIMEOUT),
            kv_timeout: or_default(opts.timeouts.kv_timeout, DEFAULT_KV_TIMEOUT),
            kv_durable_timeout: or_default(
                opts.timeouts.kv_durable_timeout,
                DEFAULT_KV_DURABLE_TIMEOUT,
            ),
            view_timeout: or_default(opts.timeouts.view_timeout, DEFAULT_SERVICE_TIMEOUT),
            query_timeout: or_default(opts.timeouts.query_timeout, DEFAULT_SERVICE_TIMEOUT),
            analytics_timeout: or_default(
                opts.timeouts.analytics_timeout,
                DEFAULT_SERVICE_TIMEOUT,
            ),
            search_timeout: or_default(opts.timeouts.search_timeout, DEFAULT_SERVICE_TIMEOUT),
            management_timeout: or_default(
                opts.timeouts.management_timeout,
                DEFAULT_SERVICE_TIMEOUT,
            ),
            durability_poll_interval: DEFAULT_DURABILITY_POLL_INTERVAL,
            transcoder: opts
                .transcoder
                .unwrap_or_else(|| Arc::new(JsonTranscoder)),
            use_mutation_tokens: !opts.io.disable_mutation_tokens,
            use_server_durations: !opts.io.disable_server_durations,
            retry_strategy: opts
                .retry_strategy
                .unwrap_or_else(|| Arc::new(BestEffortRetryStrategy::default())),
            orphan_reporting: OrphanReporting {
                enabled: !opts.orphan_reporter.disabled,
                interval: or_default(
                    opts.orphan_reporter.report_interval,
                    DEFAULT_ORPHAN_REPORT_INTERVAL,
                ),
                sample_size: if opts.orphan_reporter.sample_size == 0 {
                    DEFAULT_ORPHAN_SAMPLE_SIZE
                } else {
                    opts.orphan_reporter.sample_size
                },
            },
            tracer: opts.tracer.unwrap_or_else(|| Arc::new(NoopTracer)),
            circuit_breaker: opts.circuit_breaker,
            security: opts.security,
            authenticator,
        }
    }

    /// 应用连接串中的超时覆盖项；在首次使用前调用一次。
    ///
    /// # 契约说明（What）
    /// - 识别键：`query_timeout`、`analytics_timeout`、`search_timeout`、
    ///   `view_timeout`，单位毫秒，同名多值取最后一个；
    /// - 非数字取值立即报 [`ConfigError::InvalidOption`]，调用方应中止
    ///   集群构造，该错误从不缓存。
    pub fn apply_connstr_overrides(&mut self, spec: &ConnSpec) -> Result<(), ConfigError> {
        self.query_timeout =
            parse_timeout_override(spec, "query_timeout")?.unwrap_or(self.query_timeout);
        self.analytics_timeout =
            parse_timeout_override(spec, "analytics_timeout")?.unwrap_or(self.analytics_timeout);
        self.search_timeout =
            parse_timeout_override(spec, "search_timeout")?.unwrap_or(self.search_timeout);
        self.view_timeout =
            parse_timeout_override(spec, "view_timeout")?.unwrap_or(self.view_timeout);
        Ok(())
    }

    /// 导出会影响线缆行为的配置子集，供会话创建与指纹计算使用。
    ///
    /// # 契约说明（What）
    /// - `bucket` 为 `None` 时产出集群级（全局作用域）会话的画像；
    /// - 信任根证书以 SHA-256 摘要形式进入画像并排序，保证指纹对证书
    ///   集合的顺序不敏感。
    pub fn session_profile(&self, bucket: Option<&str>) -> SessionProfile {
        let mut trust_root_digests: Vec<[u8; 32]> = self
            .security
            .trust_roots
            .iter()
            .map(|der| {
                let mut hasher = Sha256::new();
                hasher.update(der);
                hasher.finalize().into()
            })
            .collect();
        trust_root_digests.sort_unstable();
        SessionProfile {
            bucket: bucket.map(str::to_owned),
            connect_timeout: self.connect_timeout,
            kv_timeout: self.kv_timeout,
            kv_durable_timeout: self.kv_durable_timeout,
            durability_poll_interval: self.durability_poll_interval,
            use_mutation_tokens: self.use_mutation_tokens,
            use_server_durations: self.use_server_durations,
            auth_identity: self.authenticator.identity().to_owned(),
            tls_skip_verify: self.security.tls_skip_verify,
            trust_root_digests,
        }
    }
}

fn parse_timeout_override(
    spec: &ConnSpec,
    key: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = spec.last_option(key) else {
        return Ok(None);
    };
    let millis: u64 = raw.parse().map_err(|_| ConfigError::InvalidOption {
        key,
        value: raw.to_owned(),
    })?;
    debug!(key, millis, "applying connection string timeout override");
    Ok(Some(Duration::from_millis(millis)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with(key: &str, values: &[&str]) -> ConnSpec {
        let mut spec = ConnSpec {
            scheme: "coral".into(),
            ..ConnSpec::default()
        };
        spec.options
            .insert(key.into(), values.iter().map(|v| (*v).into()).collect());
        spec
    }

    #[test]
    fn zero_timeouts_fall_back_to_default_table() {
        let state = StateBlock::resolve(ClusterOptions::default());
        assert_eq!(state.connect_timeout, Duration::from_secs(10));
        assert_eq!(state.kv_timeout, Duration::from_millis(2_500));
        assert_eq!(state.kv_durable_timeout, Duration::from_secs(10));
        assert_eq!(state.view_timeout, Duration::from_secs(75));
        assert_eq!(state.query_timeout, Duration::from_secs(75));
        assert_eq!(state.analytics_timeout, Duration::from_secs(75));
        assert_eq!(state.search_timeout, Duration::from_secs(75));
        assert_eq!(state.management_timeout, Duration::from_secs(75));
        assert_eq!(state.durability_poll_interval, Duration::from_millis(100));
        assert!(state.use_mutation_tokens);
        assert!(state.use_server_durations);
    }

    #[test]
    fn caller_timeouts_survive_resolution() {
        let opts = ClusterOptions {
            timeouts: TimeoutsConfig {
                kv_timeout: Duration::from_secs(1),
                query_timeout: Duration::from_secs(30),
                ..TimeoutsConfig::default()
            },
            io: IoConfig {
                disable_mutation_tokens: true,
                ..IoConfig::default()
            },
            ..ClusterOptions::default()
        };
        let state = StateBlock::resolve(opts);
        assert_eq!(state.kv_timeout, Duration::from_secs(1));
        assert_eq!(state.query_timeout, Duration::from_secs(30));
        assert!(!state.use_mutation_tokens);
        assert!(state.use_server_durations);
    }

    #[test]
    fn connstr_override_takes_last_value() {
        let mut state = StateBlock::resolve(ClusterOptions::default());
        let spec = spec_with("query_timeout", &["1000", "5000"]);
        state.apply_connstr_overrides(&spec).expect("valid override");
        assert_eq!(state.query_timeout, Duration::from_secs(5));
    }

    #[test]
    fn non_numeric_override_is_rejected() {
        let mut state = StateBlock::resolve(ClusterOptions::default());
        let spec = spec_with("analytics_timeout", &["abc"]);
        let err = state.apply_connstr_overrides(&spec).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidOption {
                key: "analytics_timeout",
                value: "abc".into(),
            }
        );
    }

    #[test]
    fn profile_is_insensitive_to_trust_root_order() {
        let mut opts_a = ClusterOptions::default();
        opts_a.security.trust_roots = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let mut opts_b = ClusterOptions::default();
        opts_b.security.trust_roots = vec![vec![4, 5, 6], vec![1, 2, 3]];
        let profile_a = StateBlock::resolve(opts_a).session_profile(Some("sales"));
        let profile_b = StateBlock::resolve(opts_b).session_profile(Some("sales"));
        assert_eq!(profile_a, profile_b);
    }
}
