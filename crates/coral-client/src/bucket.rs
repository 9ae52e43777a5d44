//! 桶值对象：绑定一条（可能引导失败的）连接句柄的租户视图。
//!
//! 桶在获取时同步返回，引导失败不在获取时报告，而是缓存在句柄上、在
//! 首次使用时重放——调用方应把“桶已获取”理解为“连接尝试已登记”。

use crate::config::StateBlock;
use crate::handle::ConnectionHandle;
use coral_core::error::CoreError;
use coral_core::transport::{DiagnosticsProvider, HttpProvider};
use std::sync::Arc;
use std::time::Duration;

/// 一个命名桶的句柄视图。
pub struct Bucket {
    name: String,
    handle: Arc<ConnectionHandle>,
    state: Arc<StateBlock>,
}

impl Bucket {
    pub(crate) fn new(name: String, handle: Arc<ConnectionHandle>, state: Arc<StateBlock>) -> Self {
        Self {
            name,
            handle,
            state,
        }
    }

    /// 桶名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 本桶 KV 操作的默认超时。
    pub fn kv_timeout(&self) -> Duration {
        self.state.kv_timeout
    }

    /// 本桶持久化 KV 操作的默认超时。
    pub fn kv_durable_timeout(&self) -> Duration {
        self.state.kv_durable_timeout
    }

    /// 校验底层连接可用；首次使用前的标准检查。
    ///
    /// # 契约说明（What）
    /// - 引导失败的句柄：重放缓存的首个引导错误（每次调用同一错误）；
    /// - 引导成功但尚未连接：报 `cluster.not_connected`；
    /// - 连通性查询本身失败：原样传播。
    pub fn ensure_usable(&self) -> Result<(), CoreError> {
        if let Some(error) = self.handle.bootstrap_error() {
            return Err(error);
        }
        match self.handle.connected()? {
            true => Ok(()),
            false => Err(CoreError::not_connected()),
        }
    }

    /// 绑定本桶连接的诊断提供者。
    pub fn diagnostics_provider(&self) -> Result<Arc<dyn DiagnosticsProvider>, CoreError> {
        self.ensure_usable()?;
        self.handle.diagnostics_provider()
    }

    /// 绑定本桶连接的通用 HTTP 提供者。
    pub fn http_provider(&self) -> Result<Arc<dyn HttpProvider>, CoreError> {
        self.ensure_usable()?;
        self.handle.http_provider()
    }
}
