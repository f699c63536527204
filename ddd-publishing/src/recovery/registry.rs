//! 恢复处理器注册表（RecoveryHandlers）
//!
//! 保存一份按注册顺序排列的不可变快照。每次恢复尝试只取一次快照，
//! 注册新处理器会发布新的快照，因此只影响之后的发布，不影响进行中的发布。

use super::{ForReadModel, ReadModelRecoveryHandler, ReadModelRecoveryHandlerFor};
use crate::read_model::ReadModel;
use std::sync::{Arc, PoisonError, RwLock};

type Snapshot = Arc<[Arc<dyn ReadModelRecoveryHandler>]>;

pub struct RecoveryHandlers {
    snapshot: RwLock<Snapshot>,
}

impl Default for RecoveryHandlers {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RecoveryHandlers {
    pub fn new(handlers: Vec<Arc<dyn ReadModelRecoveryHandler>>) -> Self {
        Self {
            snapshot: RwLock::new(handlers.into()),
        }
    }

    /// 当前处理器快照（按注册顺序）
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 追加一个处理器到链尾
    pub fn register(&self, handler: Arc<dyn ReadModelRecoveryHandler>) {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        let mut handlers = guard.to_vec();
        handlers.push(handler);
        *guard = handlers.into();
    }

    /// 追加一个只针对读模型 `R` 的处理器
    pub fn register_for<R, H>(&self, handler: H)
    where
        R: ReadModel,
        H: ReadModelRecoveryHandlerFor<R> + 'static,
    {
        self.register(Arc::new(ForReadModel::<R, H>::new(handler)));
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

impl From<Vec<Arc<dyn ReadModelRecoveryHandler>>> for RecoveryHandlers {
    fn from(handlers: Vec<Arc<dyn ReadModelRecoveryHandler>>) -> Self {
        Self::new(handlers)
    }
}
