//! 管理器工厂产物：管理面操作的薄壳。
//!
//! 管理命令的编码与语义不在本层职责内；每个管理器只固化三样东西：
//! 能力来源（借用集群门面做惰性解析）、管理操作默认超时、共享追踪器
//! 的计数句柄。追踪器句柄使管理器可以独立于门面关闭顺序安全地结束
//! 自己的追踪片段。

use crate::cluster::Cluster;
use crate::tracer::TracerHandle;
use coral_core::error::CoreError;
use coral_core::transport::{AnalyticsProvider, HttpProvider, QueryProvider};
use std::sync::Arc;
use std::time::Duration;

macro_rules! manager_common {
    () => {
        /// 管理操作的默认超时。
        pub fn management_timeout(&self) -> Duration {
            self.cluster.config().management_timeout
        }

        /// 共享追踪器句柄；门面已关闭时为 `None`。
        pub fn tracer(&self) -> Option<&TracerHandle> {
            self.tracer.as_ref()
        }
    };
}

/// 用户管理器。
pub struct UserManager<'a> {
    cluster: &'a Cluster,
    tracer: Option<TracerHandle>,
}

impl<'a> UserManager<'a> {
    pub(crate) fn new(cluster: &'a Cluster) -> Self {
        Self {
            tracer: cluster.tracer_handle(),
            cluster,
        }
    }

    /// 管理面的通用 HTTP 提供者。
    pub fn http_provider(&self) -> Result<Arc<dyn HttpProvider>, CoreError> {
        self.cluster.http_provider()
    }

    manager_common!();
}

/// 桶管理器。
pub struct BucketManager<'a> {
    cluster: &'a Cluster,
    tracer: Option<TracerHandle>,
}

impl<'a> BucketManager<'a> {
    pub(crate) fn new(cluster: &'a Cluster) -> Self {
        Self {
            tracer: cluster.tracer_handle(),
            cluster,
        }
    }

    /// 管理面的通用 HTTP 提供者。
    pub fn http_provider(&self) -> Result<Arc<dyn HttpProvider>, CoreError> {
        self.cluster.http_provider()
    }

    manager_common!();
}

/// 查询索引管理器。
pub struct QueryIndexManager<'a> {
    cluster: &'a Cluster,
    tracer: Option<TracerHandle>,
}

impl<'a> QueryIndexManager<'a> {
    pub(crate) fn new(cluster: &'a Cluster) -> Self {
        Self {
            tracer: cluster.tracer_handle(),
            cluster,
        }
    }

    /// 索引语句走查询能力。
    pub fn query_provider(&self) -> Result<Arc<dyn QueryProvider>, CoreError> {
        self.cluster.query_provider()
    }

    manager_common!();
}

/// 搜索索引管理器。
pub struct SearchIndexManager<'a> {
    cluster: &'a Cluster,
    tracer: Option<TracerHandle>,
}

impl<'a> SearchIndexManager<'a> {
    pub(crate) fn new(cluster: &'a Cluster) -> Self {
        Self {
            tracer: cluster.tracer_handle(),
            cluster,
        }
    }

    /// 搜索索引定义走管理面 HTTP。
    pub fn http_provider(&self) -> Result<Arc<dyn HttpProvider>, CoreError> {
        self.cluster.http_provider()
    }

    manager_common!();
}

/// 分析索引管理器。
pub struct AnalyticsIndexManager<'a> {
    cluster: &'a Cluster,
    tracer: Option<TracerHandle>,
}

impl<'a> AnalyticsIndexManager<'a> {
    pub(crate) fn new(cluster: &'a Cluster) -> Self {
        Self {
            tracer: cluster.tracer_handle(),
            cluster,
        }
    }

    /// 分析语句走分析能力。
    pub fn analytics_provider(&self) -> Result<Arc<dyn AnalyticsProvider>, CoreError> {
        self.cluster.analytics_provider()
    }

    /// 管理面的通用 HTTP 提供者。
    pub fn http_provider(&self) -> Result<Arc<dyn HttpProvider>, CoreError> {
        self.cluster.http_provider()
    }

    manager_common!();
}
