//! 连接注册表：指纹到桶级连接句柄的并发安全映射。
//!
//! ## 设计目标（Why）
//! - 同一有效配置至多一条活连接：并发获取同一指纹时，只有第一个观察到
//!   缺失的调用方执行创建，其余调用方阻塞等待并共享同一结果——无论
//!   引导成功还是失败；
//! - 引导 I/O 不得阻塞无关流量：映射级锁只保护结构变更，建连发生在
//!   槽位级的一次性初始化里，读路径的并发读者不受某个桶引导延迟拖累。
//!
//! ## 逻辑解析（How）
//! - 两级结构：`RwLock<HashMap<指纹, Arc<槽位>>>` 负责结构，槽位内的
//!   `OnceLock` 负责“工厂至多调用一次”与竞态调用方的阻塞汇合；
//! - 工厂不可失败：引导失败记录在句柄上并照常缓存，后续获取重放同一
//!   失败句柄，调用方必须在使用前检查引导状态。
//!
//! ## 风险提示（Trade-offs）
//! - 失败句柄会一直占据其指纹直到 `release_all`；这是刻意为之——本层
//!   不做自动重试，重试策略属于外部协作方。

use crate::fingerprint::SessionFingerprint;
use crate::handle::ConnectionHandle;
use coral_core::error::CoreError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

struct RegistrySlot {
    cell: OnceLock<Arc<ConnectionHandle>>,
}

/// 指纹到句柄的并发安全注册表；独占拥有其创建的全部句柄。
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: RwLock<HashMap<SessionFingerprint, Arc<RegistrySlot>>>,
}

impl ConnectionRegistry {
    /// 创建空注册表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取或创建指纹对应的句柄。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`fingerprint` 由当前配置推导（见
    ///   [`crate::fingerprint::fingerprint`]），工厂返回的句柄可以携带
    ///   已记录的引导错误；
    /// - **后置条件**：同一指纹在注册表生命周期内工厂至多执行一次；
    ///   返回的 `Arc` 与该指纹此前/此后所有获取共享同一句柄；
    /// - **阻塞语义**：创建期间到达的同指纹调用方阻塞至创建完成，
    ///   不同指纹的调用方互不阻塞。
    pub fn acquire(
        &self,
        fingerprint: SessionFingerprint,
        factory: impl FnOnce() -> Arc<ConnectionHandle>,
    ) -> Arc<ConnectionHandle> {
        let slot = {
            let entries = self.entries.read();
            entries.get(&fingerprint).cloned()
        };
        let slot = match slot {
            Some(slot) => {
                debug!(fingerprint = %fingerprint, "sharing bucket level connection");
                slot
            }
            None => {
                let mut entries = self.entries.write();
                entries
                    .entry(fingerprint)
                    .or_insert_with(|| {
                        Arc::new(RegistrySlot {
                            cell: OnceLock::new(),
                        })
                    })
                    .clone()
                // 写锁在此释放：建连 I/O 在槽位内进行，不占用映射锁。
            }
        };
        slot.cell.get_or_init(factory).clone()
    }

    /// 当前已完成创建的句柄快照，按指纹排序以保证扫描顺序确定。
    pub fn snapshot(&self) -> Vec<Arc<ConnectionHandle>> {
        let entries = self.entries.read();
        let mut initialized: Vec<(&SessionFingerprint, &Arc<RegistrySlot>)> =
            entries.iter().collect();
        initialized.sort_by(|(a, _), (b, _)| a.cmp(b));
        initialized
            .into_iter()
            .filter_map(|(_, slot)| slot.cell.get().cloned())
            .collect()
    }

    /// 当前条目数（含创建中的条目）。
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// 注册表是否为空。
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 关闭并清空全部条目。
    ///
    /// # 契约说明（What）
    /// - 逐条关闭底层传输：单条失败不会阻止后续条目的关闭尝试；
    /// - 保留并返回首个失败，其余失败记入告警日志；
    /// - 返回后映射为空，相同指纹的再次获取会重新执行工厂。
    pub fn release_all(&self) -> Result<(), CoreError> {
        let drained: Vec<(SessionFingerprint, Arc<RegistrySlot>)> = {
            let mut entries = self.entries.write();
            entries.drain().collect()
        };
        let mut first_error: Option<CoreError> = None;
        for (_, slot) in drained {
            let Some(handle) = slot.cell.get() else {
                continue;
            };
            if let Err(error) = handle.close() {
                warn!(
                    scope = %handle.scope(),
                    error = %error,
                    "failed to close a bucket level connection during registry teardown"
                );
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
