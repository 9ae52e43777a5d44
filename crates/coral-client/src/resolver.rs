//! 能力解析的回退扫描：在注册表快照上挑选一条活连接。
//!
//! ## 设计目标（Why）
//! - 全局槽位不可用时，集群级请求退而求其次地借用任意一条健康的桶级
//!   连接——活性优先于公平性；
//! - 扫描是纯函数：输入句柄序列，输出选中句柄或首个错误，不依赖锁的
//!   作用域，便于脱离真实传输做单元验证。
//!
//! ## 契约说明（What）
//! - 跳过带引导错误的句柄（记住首个）；跳过报告未连接且无错误的句柄；
//!   选中第一个报告已连接的句柄；
//! - 一无所获时：若记录过错误则返回首个（先观察者胜出，而非最后一个），
//!   否则返回“未连接”。

use crate::handle::ConnectionHandle;
use coral_core::error::CoreError;
use std::fmt;
use std::sync::Arc;

/// 请求类别标签，供日志与诊断使用。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceType {
    /// 查询。
    Query,
    /// 分析。
    Analytics,
    /// 搜索。
    Search,
    /// 诊断。
    Diagnostics,
    /// 通用 HTTP。
    Http,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceType::Query => "query",
            ServiceType::Analytics => "analytics",
            ServiceType::Search => "search",
            ServiceType::Diagnostics => "diagnostics",
            ServiceType::Http => "http",
        };
        f.write_str(label)
    }
}

/// 在句柄序列上执行回退扫描。
///
/// # 契约说明（What）
/// - **输入**：任意句柄迭代器；给定固定输入，结果确定（调用方通过传入
///   排序后的注册表快照获得跨调用的稳定性）；
/// - **返回**：第一个“已连接且无引导错误”的句柄；否则为首个观察到的
///   引导/连通性错误；否则为 `cluster.not_connected`；
/// - **副作用**：无 I/O，仅读取句柄状态。
pub fn select_fallback<I>(handles: I) -> Result<Arc<ConnectionHandle>, CoreError>
where
    I: IntoIterator<Item = Arc<ConnectionHandle>>,
{
    let mut first_error: Option<CoreError> = None;
    for handle in handles {
        if let Some(error) = handle.bootstrap_error() {
            first_error.get_or_insert(error);
            continue;
        }
        match handle.connected() {
            Ok(true) => return Ok(handle),
            Ok(false) => {}
            Err(error) => {
                first_error.get_or_insert(error);
            }
        }
    }
    Err(first_error.unwrap_or_else(CoreError::not_connected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_labels_are_stable() {
        let labeled = [
            (ServiceType::Query, "query"),
            (ServiceType::Analytics, "analytics"),
            (ServiceType::Search, "search"),
            (ServiceType::Diagnostics, "diagnostics"),
            (ServiceType::Http, "http"),
        ];
        for (service, label) in labeled {
            assert_eq!(service.to_string(), label);
        }
    }
}
