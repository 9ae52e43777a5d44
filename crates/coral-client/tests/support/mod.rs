//! 集成测试共用的可编程内存传输。
//!
//! 每个会话按 [`MockPlan`] 演出：建配/建连/连通性查询/关闭的成败、
//! 拓扑支持标志与各能力类别的可用性均可逐桶指定。工厂记录创建次数与
//! 每条会话的探针，供测试断言“工厂至多调用一次”“关闭确实发生”等
//! 性质。

#![allow(dead_code)]

use coral_core::error::{CoreError, codes};
use coral_core::transport::{
    AnalyticsProvider, ClusterState, DiagnosticsProvider, DiagnosticsReport, HttpProvider,
    HttpRequest, HttpResponse, QueryProvider, ReadinessProvider, SearchProvider, ServiceRequest,
    ServiceResponse, SessionProfile, TransportFactory, TransportSession,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// 单条会话的剧本。
#[derive(Clone, Debug)]
pub struct MockPlan {
    /// 拓扑是否支持全局作用域。
    pub supports_global: bool,
    /// `build_config` 的失败文案；`None` 即成功。
    pub build_error: Option<&'static str>,
    /// `connect` 的失败文案；`None` 即成功。
    pub connect_error: Option<&'static str>,
    /// `connect` 成功前的人为延迟，用于放大竞态窗口。
    pub connect_delay: Duration,
    /// `connected` 查询本身的失败文案。
    pub connected_error: Option<&'static str>,
    /// `close` 的失败文案。
    pub close_error: Option<&'static str>,
    /// 查询能力是否可用。
    pub query_supported: bool,
    /// 就绪等待是否以超时收场。
    pub readiness_times_out: bool,
}

impl Default for MockPlan {
    fn default() -> Self {
        Self {
            supports_global: true,
            build_error: None,
            connect_error: None,
            connect_delay: Duration::ZERO,
            connected_error: None,
            close_error: None,
            query_supported: true,
            readiness_times_out: false,
        }
    }
}

impl MockPlan {
    /// 引导失败的剧本。
    pub fn failing_connect(message: &'static str) -> Self {
        Self {
            connect_error: Some(message),
            ..Self::default()
        }
    }
}

/// 会话探针：测试侧观察连接与关闭状态。
#[derive(Debug, Default)]
pub struct SessionProbe {
    /// 会话是否处于已连接状态。
    pub connected: AtomicBool,
    /// 会话是否已被关闭。
    pub closed: AtomicBool,
}

impl SessionProbe {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct MockSession {
    plan: MockPlan,
    probe: Arc<SessionProbe>,
}

struct MockServiceProvider {
    probe: Arc<SessionProbe>,
}

impl MockServiceProvider {
    fn respond(&self) -> Result<ServiceResponse, CoreError> {
        if self.probe.is_closed() {
            return Err(CoreError::new(
                codes::CONNECTION_CLOSED,
                "connection closed during in-flight request",
            ));
        }
        Ok(ServiceResponse { body: b"ok".to_vec() })
    }
}

impl QueryProvider for MockServiceProvider {
    fn execute(&self, _request: &ServiceRequest) -> Result<ServiceResponse, CoreError> {
        self.respond()
    }
}

impl AnalyticsProvider for MockServiceProvider {
    fn execute(&self, _request: &ServiceRequest) -> Result<ServiceResponse, CoreError> {
        self.respond()
    }
}

impl SearchProvider for MockServiceProvider {
    fn execute(&self, _request: &ServiceRequest) -> Result<ServiceResponse, CoreError> {
        self.respond()
    }
}

impl DiagnosticsProvider for MockServiceProvider {
    fn diagnostics(&self) -> Result<DiagnosticsReport, CoreError> {
        Ok(DiagnosticsReport {
            state: ClusterState::Online,
            detail: Vec::new(),
        })
    }
}

impl HttpProvider for MockServiceProvider {
    fn send(&self, _request: &HttpRequest) -> Result<HttpResponse, CoreError> {
        if self.probe.is_closed() {
            return Err(CoreError::new(
                codes::CONNECTION_CLOSED,
                "connection closed during in-flight request",
            ));
        }
        Ok(HttpResponse {
            status: 200,
            body: Vec::new(),
        })
    }
}

struct MockReadiness {
    times_out: bool,
}

impl ReadinessProvider for MockReadiness {
    fn wait_until_ready(
        &self,
        _deadline: Instant,
        _desired: ClusterState,
    ) -> Result<(), CoreError> {
        if self.times_out {
            Err(CoreError::new(
                codes::CLUSTER_WAIT_TIMEOUT,
                "cluster did not reach the desired state in time",
            ))
        } else {
            Ok(())
        }
    }
}

impl TransportSession for MockSession {
    fn build_config(&self) -> Result<(), CoreError> {
        match self.plan.build_error {
            Some(message) => Err(CoreError::new(codes::CONNECTION_BOOTSTRAP, message)),
            None => Ok(()),
        }
    }

    fn connect(&self) -> Result<(), CoreError> {
        if !self.plan.connect_delay.is_zero() {
            std::thread::sleep(self.plan.connect_delay);
        }
        match self.plan.connect_error {
            Some(message) => Err(CoreError::new(codes::CONNECTION_BOOTSTRAP, message)),
            None => {
                self.probe.connected.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    fn connected(&self) -> Result<bool, CoreError> {
        if let Some(message) = self.plan.connected_error {
            return Err(CoreError::new(codes::CONNECTION_CLOSED, message));
        }
        Ok(self.probe.connected.load(Ordering::SeqCst) && !self.probe.is_closed())
    }

    fn close(&self) -> Result<(), CoreError> {
        self.probe.closed.store(true, Ordering::SeqCst);
        self.probe.connected.store(false, Ordering::SeqCst);
        match self.plan.close_error {
            Some(message) => Err(CoreError::new(codes::CONNECTION_CLOSED, message)),
            None => Ok(()),
        }
    }

    fn supports_global_scope(&self) -> bool {
        self.plan.supports_global
    }

    fn query_provider(&self) -> Result<Arc<dyn QueryProvider>, CoreError> {
        if !self.plan.query_supported {
            return Err(CoreError::new(
                codes::CONNECTION_CAPABILITY_UNSUPPORTED,
                "query capability is not supported by this session",
            ));
        }
        Ok(Arc::new(MockServiceProvider {
            probe: self.probe.clone(),
        }))
    }

    fn analytics_provider(&self) -> Result<Arc<dyn AnalyticsProvider>, CoreError> {
        Ok(Arc::new(MockServiceProvider {
            probe: self.probe.clone(),
        }))
    }

    fn search_provider(&self) -> Result<Arc<dyn SearchProvider>, CoreError> {
        Ok(Arc::new(MockServiceProvider {
            probe: self.probe.clone(),
        }))
    }

    fn diagnostics_provider(&self) -> Result<Arc<dyn DiagnosticsProvider>, CoreError> {
        Ok(Arc::new(MockServiceProvider {
            probe: self.probe.clone(),
        }))
    }

    fn http_provider(&self) -> Result<Arc<dyn HttpProvider>, CoreError> {
        Ok(Arc::new(MockServiceProvider {
            probe: self.probe.clone(),
        }))
    }

    fn readiness_provider(&self) -> Result<Arc<dyn ReadinessProvider>, CoreError> {
        Ok(Arc::new(MockReadiness {
            times_out: self.plan.readiness_times_out,
        }))
    }
}

/// 可编程传输工厂：按桶名分发剧本并记录每次创建。
#[derive(Default)]
pub struct MockFactory {
    global_plan: Mutex<MockPlan>,
    bucket_plans: Mutex<HashMap<String, MockPlan>>,
    default_plan: Mutex<MockPlan>,
    created: AtomicUsize,
    probes: Mutex<Vec<(Option<String>, Arc<SessionProbe>)>>,
}

impl MockFactory {
    /// 全部会话按默认剧本演出的工厂。
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 指定全局会话的剧本。
    pub fn set_global_plan(&self, plan: MockPlan) {
        *self.global_plan.lock() = plan;
    }

    /// 指定某个桶的剧本。
    pub fn set_bucket_plan(&self, bucket: &str, plan: MockPlan) {
        self.bucket_plans.lock().insert(bucket.to_owned(), plan);
    }

    /// 未指定剧本的桶使用的缺省剧本。
    pub fn set_default_plan(&self, plan: MockPlan) {
        *self.default_plan.lock() = plan;
    }

    /// 工厂累计创建的会话数。
    pub fn created_sessions(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// 读取首条匹配目标的会话探针。
    pub fn probe_for(&self, bucket: Option<&str>) -> Option<Arc<SessionProbe>> {
        self.probes
            .lock()
            .iter()
            .find(|(name, _)| name.as_deref() == bucket)
            .map(|(_, probe)| probe.clone())
    }

    /// 全部探针的快照。
    pub fn probes(&self) -> Vec<(Option<String>, Arc<SessionProbe>)> {
        self.probes.lock().clone()
    }
}

impl TransportFactory for MockFactory {
    fn create_session(&self, profile: &SessionProfile) -> Box<dyn TransportSession> {
        let plan = match &profile.bucket {
            None => self.global_plan.lock().clone(),
            Some(name) => self
                .bucket_plans
                .lock()
                .get(name)
                .cloned()
                .unwrap_or_else(|| self.default_plan.lock().clone()),
        };
        self.created.fetch_add(1, Ordering::SeqCst);
        let probe = Arc::new(SessionProbe::default());
        self.probes
            .lock()
            .push((profile.bucket.clone(), probe.clone()));
        Box::new(MockSession { plan, probe })
    }
}

/// 记录 `stop` 次数的追踪器，验证“恰好释放一次”。
pub struct CountingTracer {
    pub stops: Arc<AtomicUsize>,
}

impl coral_core::runtime::RequestTracer for CountingTracer {
    fn start_span(&self, operation: &str) -> Box<dyn coral_core::runtime::RequestSpan> {
        coral_core::runtime::NoopTracer.start_span(operation)
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// 脱离工厂直接构造一条会话，供注册表与回退扫描的单元场景使用。
pub fn scripted_session(plan: MockPlan) -> (Box<dyn TransportSession>, Arc<SessionProbe>) {
    let probe = Arc::new(SessionProbe::default());
    (
        Box::new(MockSession {
            plan,
            probe: probe.clone(),
        }),
        probe,
    )
}

/// 最小连接串：`coral://`。
pub fn coral_spec() -> coral_core::connstr::ConnSpec {
    coral_core::connstr::ConnSpec {
        scheme: "coral".into(),
        ..coral_core::connstr::ConnSpec::default()
    }
}
