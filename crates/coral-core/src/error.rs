use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// `ErrorCause` 封装底层原因。采用 `Arc` 而非 `Box`，使携带原因的
/// [`CoreError`] 可以被克隆：注册表会缓存首次引导失败并向所有后续
/// 调用方重放同一错误。
pub type ErrorCause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// `CoreError` 是连接层跨模块共享的稳定错误域，所有可观察错误的最终形态。
///
/// # 设计背景（Why）
/// - 配置解析、会话引导与能力解析在不同层次产生的故障需要合流为统一的
///   错误码，以便日志与告警系统执行精确分类；调用方据码值而非字符串匹配
///   决定补救策略。
/// - 引导失败会被注册表缓存并在每次相同指纹的获取时重放，因此错误对象
///   必须可廉价克隆且可安全跨线程传递。
///
/// # 契约说明（What）
/// - `code`：`'static` 稳定字符串，遵循 `<域>.<语义>` 命名，见 [`codes`]；
/// - `message`：面向排障人员的自然语言描述，不包含敏感信息；
/// - `cause`：可选底层原因，经由 `source()` 暴露完整链路；
/// - 构造后即不可变；`with_cause` 返回新值而非原地修改。
///
/// # 设计取舍（Trade-offs）
/// - 以 `Cow` 保存消息：静态文案零分配，动态描述仅一次堆分配；
/// - `cause` 使用 `Arc` 共享，克隆错误不复制底层原因。
#[derive(Clone, Debug)]
pub struct CoreError {
    code: &'static str,
    message: Cow<'static, str>,
    cause: Option<ErrorCause>,
}

impl CoreError {
    /// 使用稳定错误码与消息构造核心错误。
    pub fn new(code: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// 附带底层原因并返回新的核心错误。
    pub fn with_cause(
        mut self,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// 获取稳定错误码。
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// 获取描述。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 获取底层原因。
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }

    /// 判断错误码是否命中指定值，供调用方做分支处置。
    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// 连接层的稳定错误码集合。
///
/// # 设计背景（Why）
/// - “没有可用连接”“引导失败”“能力缺失”是集群客户端的高频故障模式，
///   必须提供标准化标识以便调用方实施兜底策略（重试、换桶、人工介入）。
/// - 错误码遵循 `<域>.<语义>` 命名约定，方便在跨组件日志中检索与聚合。
///
/// # 契约说明（What）
/// - **使用前提**：错误码应由实现者封装进 [`CoreError`] 并在链路日志中
///   携带完整上下文；
/// - **稳定承诺**：码值一经发布不再变更语义，新增场景只追加新码。
pub mod codes {
    /// 连接串选项取值非法（如超时覆盖项不是数字）。
    pub const CONFIG_INVALID_OPTION: &str = "config.invalid_option";
    /// 连接串使用了不受支持的 scheme。
    pub const CONFIG_UNSUPPORTED_SCHEME: &str = "config.unsupported_scheme";
    /// 没有任何可用连接，且无更具体的底层原因。
    pub const CLUSTER_NOT_CONNECTED: &str = "cluster.not_connected";
    /// 等待集群就绪在截止时间前未完成。
    pub const CLUSTER_WAIT_TIMEOUT: &str = "cluster.wait_timeout";
    /// 会话引导（建连/鉴权）失败，首个观察到的失败会被缓存重放。
    pub const CONNECTION_BOOTSTRAP: &str = "connection.bootstrap";
    /// 连接已关闭，飞行中的请求应据此终止而非产生未定义行为。
    pub const CONNECTION_CLOSED: &str = "connection.closed";
    /// 连接存在但不支持所请求的能力类别。
    pub const CONNECTION_CAPABILITY_UNSUPPORTED: &str = "connection.capability_unsupported";
}

impl CoreError {
    /// 构造“未连接到集群”错误。
    pub fn not_connected() -> Self {
        Self::new(codes::CLUSTER_NOT_CONNECTED, "not connected to cluster")
    }
}
