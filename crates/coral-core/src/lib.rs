#![doc = r#"
# coral-core

## 设计动机（Why）
- **定位**：本 crate 承载集群客户端连接层的稳定契约：统一错误域、
  传输会话接口、能力提供者接口与各不透明协作方（鉴权、转码、重试、
  追踪、安全/熔断配置）的最小表面。
- **架构角色**：`coral-client` 的连接注册表、全局槽位与能力解析器
  只依赖这里定义的 trait 与数据类型，不接触任何具体线缆实现；测试
  可据此注入可编程的内存会话。
- **设计理念**：强调“错误分类”与“接口即契约”——所有故障以稳定
  错误码合流（[`CoreError`]），所有协作方以对象安全 trait 注入。

## 核心契约（What）
- [`error`]：`CoreError` 与 `<域>.<语义>` 稳定错误码；
- [`transport`]：会话生命周期、全局作用域探测与六类能力提供者；
- [`connstr`]：连接串解析产物的只读数据形态；
- [`runtime`]：鉴权/转码/重试/追踪等不透明协作方契约及默认实现。

## 风险与考量（Trade-offs）
- 契约层不依赖任何异步运行时：连接获取是受建连超时约束的阻塞操作，
  请求级的超时与重试由外部策略负责；
- 能力提供者只暴露“一次请求”的最小表面，载荷成形、线缆格式与管理
  命令编码均不在本 crate 职责内。
"#]

pub mod connstr;
pub mod error;
pub mod runtime;
pub mod transport;

pub use connstr::{Address, ConnSpec};
pub use error::{CoreError, ErrorCause, codes};
pub use runtime::{
    Authenticator, BestEffortRetryStrategy, CircuitBreakerConfig, JsonTranscoder, NoopTracer,
    PasswordAuthenticator, RequestSpan, RequestTracer, RetryStrategy, SecurityConfig, Transcoder,
};
pub use transport::{
    AnalyticsProvider, ClusterState, DiagnosticsProvider, DiagnosticsReport, HttpProvider,
    HttpRequest, HttpResponse, QueryProvider, ReadinessProvider, SearchProvider, ServiceRequest,
    ServiceResponse, SessionProfile, TransportFactory, TransportSession,
};
