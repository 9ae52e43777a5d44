//! 集群级槽位：零或一条全局（不绑定桶）连接的生命周期状态机。
//!
//! ## 设计目标（Why）
//! - 支持全局作用域的拓扑下，集群级请求优先走全局连接；旧拓扑不支持
//!   时，这条在构造期建立的连接毫无用处，应尽早关闭释放资源；
//! - 判定“是否支持”必须先完成一次引导，因此退役检查惰性地发生在首次
//!   桶获取时，而非构造期。
//!
//! ## 逻辑解析（How）
//! - 显式三态：`Unchecked`（已引导、未判定）→ `Active`（判定支持）或
//!   `Retired`（判定不支持，已关闭并清空）；每个门面生命周期内该转换
//!   恰好发生一次，结果只取决于句柄的拓扑支持标志，与调用顺序无关；
//! - 读路径（`current`）使用共享读锁；转换与关闭使用独占写锁，且仅
//!   覆盖结构变更本身。

use crate::handle::ConnectionHandle;
use coral_core::error::CoreError;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

enum SlotState {
    /// 已引导，但尚未判定拓扑是否支持全局作用域。
    Unchecked(Arc<ConnectionHandle>),
    /// 判定支持，句柄长期驻留。
    Active(Arc<ConnectionHandle>),
    /// 判定不支持或已关闭，槽位永久清空。
    Retired,
}

/// 至多持有一条全局连接的槽位。
pub struct GlobalSlot {
    state: RwLock<SlotState>,
}

impl GlobalSlot {
    /// 以构造期引导完成的全局句柄建立槽位。
    pub fn new(handle: Arc<ConnectionHandle>) -> Self {
        Self {
            state: RwLock::new(SlotState::Unchecked(handle)),
        }
    }

    /// 读取当前驻留句柄；`Retired` 后恒为 `None`。
    pub fn current(&self) -> Option<Arc<ConnectionHandle>> {
        match &*self.state.read() {
            SlotState::Unchecked(handle) | SlotState::Active(handle) => Some(handle.clone()),
            SlotState::Retired => None,
        }
    }

    /// 惰性退役检查：首次桶获取时调用。
    ///
    /// # 契约说明（What）
    /// - `Unchecked` 且句柄不支持全局作用域：关闭句柄（失败仅告警）并
    ///   转入 `Retired`，后续路由全部落到注册表回退路径；
    /// - `Unchecked` 且支持：转入 `Active`；
    /// - 其余状态：无操作。转换在门面生命周期内至多发生一次。
    pub fn maybe_retire(&self) {
        {
            let state = self.state.read();
            if !matches!(&*state, SlotState::Unchecked(_)) {
                return;
            }
        }
        let mut state = self.state.write();
        if let SlotState::Unchecked(handle) = &*state {
            if handle.supports_global_scope() {
                let handle = handle.clone();
                *state = SlotState::Active(handle);
            } else {
                debug!("shutting down cluster level connection: topology lacks global scope support");
                if let Err(error) = handle.close() {
                    warn!(error = %error, "failed to close the cluster level connection");
                }
                *state = SlotState::Retired;
            }
        }
    }

    /// 关闭驻留句柄并清空槽位；门面关闭时调用一次。
    pub fn close(&self) -> Result<(), CoreError> {
        let previous = {
            let mut state = self.state.write();
            std::mem::replace(&mut *state, SlotState::Retired)
        };
        match previous {
            SlotState::Unchecked(handle) | SlotState::Active(handle) => handle.close(),
            SlotState::Retired => Ok(()),
        }
    }
}
