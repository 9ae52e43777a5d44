//! 连接句柄：单条传输会话加引导状态的最小封装。
//!
//! ## 设计目标（Why）
//! - 注册表、全局槽位与回退扫描需要一个统一的“连接单元”：它知道自己
//!   的作用域（全局或某个指纹）、是否引导失败、以及暴露哪些能力；
//! - 引导失败是终态：句柄一旦记录失败就不再被静默重试，重试必须走
//!   新句柄（新指纹或注册表清空之后）。

use crate::fingerprint::SessionFingerprint;
use coral_core::error::CoreError;
use coral_core::transport::{
    AnalyticsProvider, DiagnosticsProvider, HttpProvider, QueryProvider, ReadinessProvider,
    SearchProvider, TransportSession,
};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// 句柄的作用域：集群级全局会话，或绑定某个指纹的桶级会话。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionScope {
    /// 不绑定桶的全局会话。
    Global,
    /// 绑定指纹的桶级会话。
    Bucket(SessionFingerprint),
}

impl fmt::Display for SessionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionScope::Global => f.write_str("global"),
            SessionScope::Bucket(fingerprint) => write!(f, "bucket:{fingerprint}"),
        }
    }
}

/// 单条连接：传输会话加首个引导错误的持有者。
///
/// # 契约说明（What）
/// - 创建即处于“引导中”：无引导错误、未连接；
/// - [`set_bootstrap_error`](Self::set_bootstrap_error) 只记录首个失败，
///   后续写入被忽略（`OnceLock` 使该终态成为结构性保证而非约定）；
/// - 能力访问器原样透传传输会话的结果：不支持的类别由会话以
///   [`codes::CONNECTION_CAPABILITY_UNSUPPORTED`](coral_core::error::codes::CONNECTION_CAPABILITY_UNSUPPORTED)
///   报告，本层不降级。
///
/// # 并发说明（How）
/// - `connected`/`supports_global_scope`/能力访问器可被任意线程并发
///   调用；`close` 由注册表或槽位在独占所有权下调用一次；
/// - 句柄被关闭后，飞行中的请求由提供者以
///   [`codes::CONNECTION_CLOSED`](coral_core::error::codes::CONNECTION_CLOSED) 终止。
pub struct ConnectionHandle {
    scope: SessionScope,
    transport: Box<dyn TransportSession>,
    bootstrap: OnceLock<CoreError>,
}

impl ConnectionHandle {
    /// 以指定作用域包装一个尚未引导的传输会话。
    pub fn new(scope: SessionScope, transport: Box<dyn TransportSession>) -> Self {
        Self {
            scope,
            transport,
            bootstrap: OnceLock::new(),
        }
    }

    /// 句柄作用域。
    pub fn scope(&self) -> &SessionScope {
        &self.scope
    }

    /// 记录引导失败；仅首个失败生效。
    pub fn set_bootstrap_error(&self, error: CoreError) {
        let _ = self.bootstrap.set(error);
    }

    /// 读取缓存的引导错误（克隆重放，原因链共享）。
    pub fn bootstrap_error(&self) -> Option<CoreError> {
        self.bootstrap.get().cloned()
    }

    /// 解析并固化线缆配置。
    pub fn build_config(&self) -> Result<(), CoreError> {
        self.transport.build_config()
    }

    /// 阻塞建连。
    pub fn connect(&self) -> Result<(), CoreError> {
        self.transport.connect()
    }

    /// 会话是否已连接。
    pub fn connected(&self) -> Result<bool, CoreError> {
        self.transport.connected()
    }

    /// 集群拓扑是否支持全局作用域。
    pub fn supports_global_scope(&self) -> bool {
        self.transport.supports_global_scope()
    }

    /// 关闭底层传输。
    pub fn close(&self) -> Result<(), CoreError> {
        self.transport.close()
    }

    /// 查询提供者。
    pub fn query_provider(&self) -> Result<Arc<dyn QueryProvider>, CoreError> {
        self.transport.query_provider()
    }

    /// 分析提供者。
    pub fn analytics_provider(&self) -> Result<Arc<dyn AnalyticsProvider>, CoreError> {
        self.transport.analytics_provider()
    }

    /// 搜索提供者。
    pub fn search_provider(&self) -> Result<Arc<dyn SearchProvider>, CoreError> {
        self.transport.search_provider()
    }

    /// 诊断提供者。
    pub fn diagnostics_provider(&self) -> Result<Arc<dyn DiagnosticsProvider>, CoreError> {
        self.transport.diagnostics_provider()
    }

    /// 通用 HTTP 提供者。
    pub fn http_provider(&self) -> Result<Arc<dyn HttpProvider>, CoreError> {
        self.transport.http_provider()
    }

    /// 就绪等待提供者。
    pub fn readiness_provider(&self) -> Result<Arc<dyn ReadinessProvider>, CoreError> {
        self.transport.readiness_provider()
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("scope", &self.scope)
            .field("bootstrap_error", &self.bootstrap.get().map(CoreError::code))
            .finish_non_exhaustive()
    }
}
