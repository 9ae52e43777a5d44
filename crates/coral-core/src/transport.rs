//! 传输会话契约：连接层与具体线缆实现之间的唯一接口。
//!
//! ## 设计目标（Why）
//! - 连接复用核心只负责“把请求路由到正确作用域的活连接”，线缆协议、
//!   套接字与鉴权握手全部隐藏在 [`TransportSession`] 之后；
//! - 通过工厂注入（[`TransportFactory`]）让测试可以用可编程的内存会话
//!   替换真实传输，验证注册表与回退扫描的并发性质。
//!
//! ## 契约说明（What）
//! - 会话生命周期：`build_config` → `connect` → （`connected` 轮询）→
//!   `close`；`connect` 为阻塞调用，其内部超时由实现方按
//!   [`SessionProfile::connect_timeout`] 约束；
//! - 能力提供者按请求类别逐一暴露；会话不支持某类别时返回
//!   [`codes::CONNECTION_CAPABILITY_UNSUPPORTED`](crate::error::codes::CONNECTION_CAPABILITY_UNSUPPORTED) 错误而非静默降级；
//! - 提供者必须容忍其背后会话被并发关闭：以
//!   [`codes::CONNECTION_CLOSED`](crate::error::codes::CONNECTION_CLOSED) 报错，不产生未定义行为。
//!
//! ## 风险提示（Trade-offs）
//! - 提供者方法只承载“一次请求”的最小表面（载荷成形不在此域内），
//!   若未来需要流式结果，应新增 trait 而非扩宽现有签名。

use crate::error::CoreError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 集群期望状态，`wait_until_ready` 的目标。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClusterState {
    /// 全部服务在线（默认期望）。
    #[default]
    Online,
    /// 部分节点可用即可。
    Degraded,
    /// 仅验证拓扑可达，不要求任何服务在线。
    Offline,
}

/// 会话建立所需的线缆相关配置子集。
///
/// # 契约说明（What）
/// - 该结构与指纹计算共享同一字段集合：任何会影响线缆行为的配置都必须
///   出现在这里，否则两个语义不同的会话可能被错误地合并；
/// - `bucket` 为 `None` 时表示集群级（不绑定桶）的全局会话。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionProfile {
    /// 目标桶名；集群级会话为 `None`。
    pub bucket: Option<String>,
    /// 建连总超时。
    pub connect_timeout: Duration,
    /// KV 操作超时。
    pub kv_timeout: Duration,
    /// 持久化 KV 操作超时。
    pub kv_durable_timeout: Duration,
    /// 持久化轮询间隔。
    pub durability_poll_interval: Duration,
    /// 是否启用变更令牌。
    pub use_mutation_tokens: bool,
    /// 是否采集服务端耗时。
    pub use_server_durations: bool,
    /// 鉴权身份的稳定标识（不含密钥材料）。
    pub auth_identity: String,
    /// 是否跳过 TLS 证书校验。
    pub tls_skip_verify: bool,
    /// 信任根证书的摘要集合（DER 的 SHA-256，顺序稳定）。
    pub trust_root_digests: Vec<[u8; 32]>,
}

/// 查询/分析/搜索类请求的不透明载荷。
#[derive(Clone, Debug)]
pub struct ServiceRequest {
    /// 语句或检索表达式，载荷成形逻辑不在本层。
    pub statement: String,
    /// 已编码的请求体。
    pub body: Vec<u8>,
    /// 本次请求的超时预算。
    pub timeout: Duration,
}

/// 服务类请求的不透明响应。
#[derive(Clone, Debug)]
pub struct ServiceResponse {
    /// 已编码的响应体。
    pub body: Vec<u8>,
}

/// 通用 HTTP 请求（管理面、诊断面复用）。
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// HTTP 方法。
    pub method: String,
    /// 目标路径。
    pub path: String,
    /// 请求体。
    pub body: Vec<u8>,
    /// 超时预算。
    pub timeout: Duration,
}

/// 通用 HTTP 响应。
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// 状态码。
    pub status: u16,
    /// 响应体。
    pub body: Vec<u8>,
}

/// 诊断快照：会话视角的健康摘要。
#[derive(Clone, Debug)]
pub struct DiagnosticsReport {
    /// 观测到的集群状态。
    pub state: ClusterState,
    /// 实现自定义的端点明细（已编码）。
    pub detail: Vec<u8>,
}

/// 查询能力提供者。
pub trait QueryProvider: Send + Sync {
    /// 执行一次查询请求。
    fn execute(&self, request: &ServiceRequest) -> Result<ServiceResponse, CoreError>;
}

impl core::fmt::Debug for dyn QueryProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("dyn QueryProvider")
    }
}

/// 分析能力提供者。
pub trait AnalyticsProvider: Send + Sync {
    /// 执行一次分析请求。
    fn execute(&self, request: &ServiceRequest) -> Result<ServiceResponse, CoreError>;
}

/// 搜索能力提供者。
pub trait SearchProvider: Send + Sync {
    /// 执行一次搜索请求。
    fn execute(&self, request: &ServiceRequest) -> Result<ServiceResponse, CoreError>;
}

/// 诊断能力提供者。
pub trait DiagnosticsProvider: Send + Sync {
    /// 采集一次诊断快照。
    fn diagnostics(&self) -> Result<DiagnosticsReport, CoreError>;
}

/// 通用 HTTP 能力提供者。
pub trait HttpProvider: Send + Sync {
    /// 发送一次 HTTP 请求。
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, CoreError>;
}

/// 就绪等待能力提供者。
///
/// # 契约说明（What）
/// - 阻塞调用方直至集群达到 `desired` 状态或越过 `deadline`；
/// - 超时必须以 [`codes::CLUSTER_WAIT_TIMEOUT`](crate::error::codes::CLUSTER_WAIT_TIMEOUT) 报错，便于上层区分
///   “等待超时”与“根本未连接”。
pub trait ReadinessProvider: Send + Sync {
    /// 阻塞等待集群到达期望状态。
    fn wait_until_ready(&self, deadline: Instant, desired: ClusterState)
        -> Result<(), CoreError>;
}

/// 单个传输会话的契约：连接复用核心唯一依赖的线缆表面。
///
/// # 设计背景（Why）
/// - 上层的注册表与回退扫描只关心“这条连接是否可用、暴露哪些能力”，
///   不关心套接字、协议版本或鉴权细节；
/// - 会话按 [`SessionProfile`] 创建，绑定桶或绑定整个集群（全局作用域）。
///
/// # 契约说明（What）
/// - `build_config`/`connect` 各至多调用一次，由创建方（注册表工厂或
///   集群门面）串行驱动；失败不会被本契约重试；
/// - `connected` 与 `supports_global_scope` 必须无副作用、可并发调用；
/// - `close` 幂等性由实现方自行决定，上层保证对单个会话只调用一次；
/// - 每个 `*_provider` 返回绑定本会话的能力对象，不支持的类别返回
///   [`codes::CONNECTION_CAPABILITY_UNSUPPORTED`](crate::error::codes::CONNECTION_CAPABILITY_UNSUPPORTED)。
pub trait TransportSession: Send + Sync {
    /// 解析并固化线缆配置，失败即视为引导失败。
    fn build_config(&self) -> Result<(), CoreError>;
    /// 阻塞建连，内部受 `connect_timeout` 约束。
    fn connect(&self) -> Result<(), CoreError>;
    /// 报告会话当前是否已连接。
    fn connected(&self) -> Result<bool, CoreError>;
    /// 关闭底层传输。
    fn close(&self) -> Result<(), CoreError>;
    /// 集群拓扑是否支持“不绑定桶”的全局会话作用域。
    fn supports_global_scope(&self) -> bool;

    /// 获取查询提供者。
    fn query_provider(&self) -> Result<Arc<dyn QueryProvider>, CoreError>;
    /// 获取分析提供者。
    fn analytics_provider(&self) -> Result<Arc<dyn AnalyticsProvider>, CoreError>;
    /// 获取搜索提供者。
    fn search_provider(&self) -> Result<Arc<dyn SearchProvider>, CoreError>;
    /// 获取诊断提供者。
    fn diagnostics_provider(&self) -> Result<Arc<dyn DiagnosticsProvider>, CoreError>;
    /// 获取通用 HTTP 提供者。
    fn http_provider(&self) -> Result<Arc<dyn HttpProvider>, CoreError>;
    /// 获取就绪等待提供者。
    fn readiness_provider(&self) -> Result<Arc<dyn ReadinessProvider>, CoreError>;
}

/// 传输会话工厂：在集群门面构造时注入。
///
/// 创建本身不可失败：配置解析与建连的失败在会话的
/// `build_config`/`connect` 阶段报告，由创建方登记为引导错误。
pub trait TransportFactory: Send + Sync {
    /// 按线缆配置创建一个尚未引导的会话。
    fn create_session(&self, profile: &SessionProfile) -> Box<dyn TransportSession>;
}
