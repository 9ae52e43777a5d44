//! 集群门面：配置块、全局槽位与连接注册表的编排者。
//!
//! ## 设计目标（Why）
//! - 对调用方呈现“一个集群”的单一入口：桶获取、就绪等待、能力获取与
//!   关闭都从这里出发；
//! - “立即返回、延迟失败”：桶获取同步返回且不强迫调用方等待网络 I/O
//!   的成败，引导失败缓存在句柄上、在首次使用时浮出。
//!
//! ## 并发模型（How）
//! - 任意线程可并发调用本门面；共享可变状态只有注册表映射、全局槽位
//!   与追踪器计数，各自以读写锁或原子计数保护；
//! - 建连 I/O 从不发生在与读路径共享的独占锁内。

use crate::bucket::Bucket;
use crate::config::{ClusterOptions, StateBlock};
use crate::error::ConfigError;
use crate::fingerprint::fingerprint;
use crate::handle::{ConnectionHandle, SessionScope};
use crate::managers::{
    AnalyticsIndexManager, BucketManager, QueryIndexManager, SearchIndexManager, UserManager,
};
use crate::registry::ConnectionRegistry;
use crate::resolver::{ServiceType, select_fallback};
use crate::slot::GlobalSlot;
use crate::tracer::TracerHandle;
use coral_core::connstr::ConnSpec;
use coral_core::error::{CoreError, codes};
use coral_core::transport::{
    AnalyticsProvider, ClusterState, DiagnosticsProvider, HttpProvider, QueryProvider,
    SearchProvider, TransportFactory,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// `wait_until_ready` 的可选项。
#[derive(Clone, Copy, Debug, Default)]
pub struct WaitUntilReadyOptions {
    /// 期望到达的集群状态；默认 [`ClusterState::Online`]。
    pub desired_state: ClusterState,
}

/// 到一个集群的连接总入口。
///
/// # 契约说明（What）
/// - 由 [`Cluster::connect`] 构造：解析配置、应用连接串覆盖并完成一次
///   全局会话引导，任一步失败即中止构造；
/// - 此后配置只读；桶级连接按指纹去重缓存；集群级请求优先走全局槽位，
///   不可用时回退到任意健康的桶级连接；
/// - [`Cluster::close`] 关闭一切连接并恰好释放一次共享追踪器。
pub struct Cluster {
    spec: ConnSpec,
    state: Arc<StateBlock>,
    registry: ConnectionRegistry,
    global_slot: GlobalSlot,
    factory: Arc<dyn TransportFactory>,
    tracer: Mutex<Option<TracerHandle>>,
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl Cluster {
    /// 按连接串解析产物与选项建立集群门面。
    ///
    /// # 执行逻辑（How）
    /// 1. 拒绝 `http` scheme（应使用 `coral`/`corals`）；
    /// 2. 解析 [`StateBlock`] 并应用连接串超时覆盖，覆盖项非法即快速
    ///    失败且不缓存；
    /// 3. 创建并引导全局（不绑定桶）会话：`build_config` → `connect`，
    ///    失败原样传播、中止构造（追踪器随句柄析构释放）；
    /// 4. 成功后全局槽位进入“未判定”态，是否退役延迟到首次桶获取。
    pub fn connect(
        spec: ConnSpec,
        opts: ClusterOptions,
        factory: Arc<dyn TransportFactory>,
    ) -> Result<Self, CoreError> {
        if spec.scheme == "http" {
            return Err(ConfigError::UnsupportedScheme {
                scheme: spec.scheme,
            }
            .into());
        }
        let mut state = StateBlock::resolve(opts);
        state.apply_connstr_overrides(&spec)?;
        let tracer = TracerHandle::new(state.tracer.clone());

        let profile = state.session_profile(None);
        let transport = factory.create_session(&profile);
        let handle = Arc::new(ConnectionHandle::new(SessionScope::Global, transport));
        handle.build_config()?;
        handle.connect()?;
        debug!(
            supports_global_scope = handle.supports_global_scope(),
            "cluster level connection established"
        );

        Ok(Self {
            spec,
            state: Arc::new(state),
            registry: ConnectionRegistry::new(),
            global_slot: GlobalSlot::new(handle),
            factory,
            tracer: Mutex::new(Some(tracer)),
        })
    }

    /// 解析后的只读配置块。
    pub fn config(&self) -> &StateBlock {
        &self.state
    }

    /// 连接串解析产物。
    pub fn conn_spec(&self) -> &ConnSpec {
        &self.spec
    }

    /// 获取（或复用）指定名字的桶。
    ///
    /// # 契约说明（What）
    /// - 同步返回：无论引导成败都返回 [`Bucket`]，失败缓存在句柄上并
    ///   在桶的首次使用时重放——“桶已获取”只代表“连接尝试已登记”；
    /// - 相同有效配置加同名桶共享同一句柄；注册表保证并发获取同一指纹
    ///   时引导只发生一次；
    /// - 首次调用会触发全局槽位的惰性退役检查。
    pub fn bucket(&self, name: &str) -> Bucket {
        self.global_slot.maybe_retire();

        let profile = self.state.session_profile(Some(name));
        let print = fingerprint(&profile);
        let handle = self.registry.acquire(print.clone(), || {
            debug!(bucket = name, "creating new bucket level connection");
            let handle = Arc::new(ConnectionHandle::new(
                SessionScope::Bucket(print.clone()),
                self.factory.create_session(&profile),
            ));
            if let Err(error) = handle.build_config().and_then(|()| handle.connect()) {
                warn!(bucket = name, error = %error, "bucket level bootstrap failed");
                handle.set_bootstrap_error(
                    CoreError::new(
                        codes::CONNECTION_BOOTSTRAP,
                        format!("bootstrap failed for bucket `{name}`"),
                    )
                    .with_cause(error),
                );
            }
            handle
        });
        Bucket::new(name.to_owned(), handle, self.state.clone())
    }

    /// 阻塞等待集群到达期望状态。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：全局槽位仍驻留句柄（已在构造期引导）；槽位已
    ///   退役或门面已关闭时立即报 `cluster.not_connected`；
    /// - **超时语义**：`timeout` 内未到达期望状态以
    ///   `cluster.wait_timeout` 报错，由就绪提供者保证。
    pub fn wait_until_ready(
        &self,
        timeout: Duration,
        opts: WaitUntilReadyOptions,
    ) -> Result<(), CoreError> {
        let Some(handle) = self.global_slot.current() else {
            return Err(CoreError::not_connected());
        };
        let provider = handle.readiness_provider()?;
        // `now + timeout` 对病态超长的超时会溢出；饱和到一年后的截止点。
        let deadline = Instant::now()
            .checked_add(timeout)
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(365 * 24 * 60 * 60));
        provider.wait_until_ready(deadline, opts.desired_state)
    }

    /// 关闭全部连接并使本门面失效。
    ///
    /// # 契约说明（What）
    /// - 逐条关闭注册表条目与全局槽位句柄：单条失败不会阻止其余条目的
    ///   关闭尝试，失败记入告警日志，返回首个失败；
    /// - 无论关闭成败，共享追踪器恰好被释放一次（计数归零时触发其
    ///   `stop` 钩子）。
    pub fn close(&self) -> Result<(), CoreError> {
        let mut first_error = self.registry.release_all().err();
        if let Err(error) = self.global_slot.close() {
            warn!(error = %error, "failed to close the cluster level connection during close");
            first_error.get_or_insert(error);
        }
        drop(self.tracer.lock().take());
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// 为当前请求挑选一条集群级可用连接。
    ///
    /// # 执行逻辑（How）
    /// 1. 共享读路径查看全局槽位：驻留且拓扑支持全局作用域则直接选中；
    /// 2. 否则在按指纹排序的注册表快照上执行回退扫描（活性优先，首个
    ///    观察到的错误胜出）；
    /// 3. 全程无 I/O，仅锁获取与状态读取。
    fn service_handle(&self, service: ServiceType) -> Result<Arc<ConnectionHandle>, CoreError> {
        if let Some(handle) = self.global_slot.current() {
            if handle.supports_global_scope() {
                return Ok(handle);
            }
            debug!(
                service = %service,
                "cluster level connection lacks global scope support; scanning bucket connections"
            );
        }
        select_fallback(self.registry.snapshot())
    }

    /// 查询能力提供者。
    pub fn query_provider(&self) -> Result<Arc<dyn QueryProvider>, CoreError> {
        self.service_handle(ServiceType::Query)?.query_provider()
    }

    /// 分析能力提供者。
    pub fn analytics_provider(&self) -> Result<Arc<dyn AnalyticsProvider>, CoreError> {
        self.service_handle(ServiceType::Analytics)?
            .analytics_provider()
    }

    /// 搜索能力提供者。
    pub fn search_provider(&self) -> Result<Arc<dyn SearchProvider>, CoreError> {
        self.service_handle(ServiceType::Search)?.search_provider()
    }

    /// 诊断能力提供者。
    pub fn diagnostics_provider(&self) -> Result<Arc<dyn DiagnosticsProvider>, CoreError> {
        self.service_handle(ServiceType::Diagnostics)?
            .diagnostics_provider()
    }

    /// 通用 HTTP 能力提供者。
    pub fn http_provider(&self) -> Result<Arc<dyn HttpProvider>, CoreError> {
        self.service_handle(ServiceType::Http)?.http_provider()
    }

    pub(crate) fn tracer_handle(&self) -> Option<TracerHandle> {
        self.tracer.lock().clone()
    }

    /// 用户管理器。
    pub fn users(&self) -> UserManager<'_> {
        UserManager::new(self)
    }

    /// 桶管理器。
    pub fn buckets(&self) -> BucketManager<'_> {
        BucketManager::new(self)
    }

    /// 查询索引管理器。
    pub fn query_indexes(&self) -> QueryIndexManager<'_> {
        QueryIndexManager::new(self)
    }

    /// 搜索索引管理器。
    pub fn search_indexes(&self) -> SearchIndexManager<'_> {
        SearchIndexManager::new(self)
    }

    /// 分析索引管理器。
    pub fn analytics_indexes(&self) -> AnalyticsIndexManager<'_> {
        AnalyticsIndexManager::new(self)
    }
}
