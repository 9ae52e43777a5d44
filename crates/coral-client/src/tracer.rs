//! 共享追踪器的显式引用计数句柄。
//!
//! 追踪器在门面与各子管理器之间共享，生命周期由显式原子计数管理：
//! 克隆加一、析构减一，最后一个句柄析构时调用 `stop` 冲刷资源。不依
//! 赖垃圾回收式的隐式共享，保证每个门面生命周期内 `stop` 恰好一次。

use coral_core::runtime::{RequestSpan, RequestTracer};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering, fence};

struct TracerCell {
    tracer: Arc<dyn RequestTracer>,
    refs: AtomicUsize,
}

/// 计数式追踪器句柄：克隆即增持，析构即减持。
pub struct TracerHandle {
    cell: Arc<TracerCell>,
}

impl TracerHandle {
    /// 包装追踪器并持有首个计数。
    pub(crate) fn new(tracer: Arc<dyn RequestTracer>) -> Self {
        Self {
            cell: Arc::new(TracerCell {
                tracer,
                refs: AtomicUsize::new(1),
            }),
        }
    }

    /// 开启一个追踪片段。
    pub fn start_span(&self, operation: &str) -> Box<dyn RequestSpan> {
        self.cell.tracer.start_span(operation)
    }
}

impl Clone for TracerHandle {
    fn clone(&self) -> Self {
        self.cell.refs.fetch_add(1, Ordering::Relaxed);
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl Drop for TracerHandle {
    fn drop(&mut self) {
        if self.cell.refs.fetch_sub(1, Ordering::Release) == 1 {
            fence(Ordering::Acquire);
            self.cell.tracer.stop();
        }
    }
}
