#![doc = r#"
# coral-client

## 设计动机（Why）
- **定位**：集群客户端的连接复用核心。它拥有到集群数据存储的全部
  网络连接生命周期：在共享或按桶隔离的连接上复用多个逻辑“桶”，并为
  每类请求（查询、分析、搜索、诊断、通用 HTTP）解析出一条正确作用域
  的活连接。
- **架构角色**：调用方持有 [`Cluster`] 门面；线缆协议、套接字与载荷
  成形由实现 `coral-core` 契约的传输层提供，经工厂注入。
- **设计理念**：正确性与活性并重——同一有效配置至多一条连接；从不
  静默使用死连接；失败状态准确、可缓存、可检视；连接从不泄漏。

## 核心契约（What）
- **注册表**（[`registry::ConnectionRegistry`]）：桶级连接按配置指纹
  去重缓存；并发获取同一指纹时引导至多发生一次，失败同样被缓存并向
  后续调用方重放；
- **全局槽位**（内部）：拓扑支持时集群级请求走不绑定桶的全局连接，
  不支持时在首次桶获取时惰性退役；
- **回退扫描**（[`resolver::select_fallback`]）：全局连接不可用时借用
  任意健康的桶级连接，活性优先，首个观察到的错误胜出；
- **门面**（[`Cluster`]）：桶获取“立即返回、延迟失败”；`close`
  聚合而不丢弃每条资源的失败，并恰好释放一次共享追踪器。

## 风险与考量（Trade-offs）
- 本层不做自动重连或重试：失败句柄保持终态直至关闭，重试策略属于
  外部协作方；
- 回退扫描“任意但对固定输入确定”（快照按指纹排序），不承诺负载
  均衡语义。
"#]

pub mod bucket;
pub mod cluster;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod handle;
pub mod managers;
pub mod registry;
pub mod resolver;
mod slot;
pub mod tracer;

pub use bucket::Bucket;
pub use cluster::{Cluster, WaitUntilReadyOptions};
pub use config::{
    ClusterOptions, IoConfig, OrphanReporterConfig, OrphanReporting, StateBlock, TimeoutsConfig,
};
pub use error::ConfigError;
pub use fingerprint::{SessionFingerprint, fingerprint};
pub use handle::{ConnectionHandle, SessionScope};
pub use managers::{
    AnalyticsIndexManager, BucketManager, QueryIndexManager, SearchIndexManager, UserManager,
};
pub use registry::ConnectionRegistry;
pub use resolver::{ServiceType, select_fallback};
pub use tracer::TracerHandle;
