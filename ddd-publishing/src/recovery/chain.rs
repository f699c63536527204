//! 恢复处理器链（RecoveryChain）
//!
//! 固定有序的处理器列表 + 当前位置。调用位置 `i` 的节点时，把位置 `i + 1`
//! 的节点作为延续交给处理器；位置越过末尾即为终点：
//! - 关闭恢复：终点什么也不做；
//! - 错误恢复：终点返回 `false`（未恢复）。

use super::ReadModelRecoveryHandler;
use crate::read_model::ReadStoreManager;
use ddd_domain::domain_event::DomainEvent;
use futures_util::future::{self, BoxFuture};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy)]
pub struct RecoveryChain<'a> {
    handlers: &'a [Arc<dyn ReadModelRecoveryHandler>],
    position: usize,
}

impl<'a> RecoveryChain<'a> {
    /// 从第一个处理器开始的链
    pub fn new(handlers: &'a [Arc<dyn ReadModelRecoveryHandler>]) -> Self {
        Self {
            handlers,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// 已没有剩余处理器
    pub fn is_terminal(&self) -> bool {
        self.position >= self.handlers.len()
    }

    fn next(&self) -> Self {
        Self {
            handlers: self.handlers,
            position: self.position + 1,
        }
    }

    pub fn recover_from_shutdown<'f>(
        self,
        manager: &'f dyn ReadStoreManager,
        events: &'f [DomainEvent],
        token: &'f CancellationToken,
    ) -> BoxFuture<'f, ()>
    where
        'a: 'f,
    {
        match self.handlers.get(self.position) {
            None => Box::pin(future::ready(())),
            Some(handler) => handler.recover_from_shutdown(manager, events, self.next(), token),
        }
    }

    pub fn recover_from_error<'f>(
        self,
        manager: &'f dyn ReadStoreManager,
        events: &'f [DomainEvent],
        error: &'f anyhow::Error,
        token: &'f CancellationToken,
    ) -> BoxFuture<'f, bool>
    where
        'a: 'f,
    {
        match self.handlers.get(self.position) {
            None => Box::pin(future::ready(false)),
            Some(handler) => {
                handler.recover_from_error(manager, events, error, self.next(), token)
            }
        }
    }
}
