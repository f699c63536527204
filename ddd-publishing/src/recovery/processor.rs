//! 恢复处理器（RecoveryProcessor）
//!
//! 所有恢复决策的统一入口：
//! - 崩溃后恢复：逐个读存储管理器发出建议性通知，然后标记批次已发布；
//! - 读存储更新失败：构建新的处理器链并询问是否可恢复；
//! - 全局订阅者、单个订阅者、异步订阅调度、Saga 失败：默认一律“未恢复”，
//!   作为扩展点保留，实现方可覆盖。
//!
//! 取消令牌已触发时不会调用任何处理器，直接视为未恢复。

use super::{ReadModelRecoveryHandler, RecoveryChain, RecoveryHandlers};
use crate::marker::PublishedMarker;
use crate::read_model::ReadStoreManager;
use async_trait::async_trait;
use bon::Builder;
use ddd_domain::domain_event::DomainEvent;
use ddd_domain::error::DomainError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use self::handler_recovery_processor_builder::{IsUnset, SetHandlers, State as BuilderState};

#[async_trait]
pub trait RecoveryProcessor: Send + Sync {
    /// 非正常关闭后恢复一批已提交但未发布完成的事件
    async fn recover_after_unexpected_shutdown(
        &self,
        events: &[DomainEvent],
        token: &CancellationToken,
    ) -> anyhow::Result<()>;

    /// 读存储更新失败时的恢复决策
    async fn recover_read_model_update_error(
        &self,
        manager: &dyn ReadStoreManager,
        events: &[DomainEvent],
        error: &anyhow::Error,
        token: &CancellationToken,
    ) -> bool;

    /// 全局订阅者失败；默认不恢复
    async fn recover_all_subscriber_error(
        &self,
        _events: &[DomainEvent],
        _error: &anyhow::Error,
        _token: &CancellationToken,
    ) -> bool {
        false
    }

    /// 单个订阅者处理某事件失败；默认不恢复
    async fn recover_subscriber_error(
        &self,
        _subscriber: &str,
        _event: &DomainEvent,
        _error: &anyhow::Error,
        _token: &CancellationToken,
    ) -> bool {
        false
    }

    /// 异步订阅作业提交失败；默认不恢复
    async fn recover_schedule_subscriber_error(
        &self,
        _events: &[DomainEvent],
        _error: &anyhow::Error,
        _token: &CancellationToken,
    ) -> bool {
        false
    }

    /// Saga 处理某事件失败；默认不恢复
    async fn recover_saga_error(
        &self,
        _saga_id: &str,
        _event: &DomainEvent,
        _error: &anyhow::Error,
        _token: &CancellationToken,
    ) -> bool {
        false
    }
}

/// 基于读模型恢复处理器链的 `RecoveryProcessor`
#[derive(Builder)]
pub struct HandlerRecoveryProcessor {
    #[builder(default)]
    handlers: Arc<RecoveryHandlers>,
    #[builder(default)]
    read_store_managers: Vec<Arc<dyn ReadStoreManager>>,
    marker: Arc<dyn PublishedMarker>,
}

impl<S: BuilderState> HandlerRecoveryProcessorBuilder<S> {
    pub fn recovery_handlers(
        self,
        handlers: Vec<Arc<dyn ReadModelRecoveryHandler>>,
    ) -> HandlerRecoveryProcessorBuilder<SetHandlers<S>>
    where
        <S as BuilderState>::Handlers: IsUnset,
    {
        self.handlers(Arc::new(RecoveryHandlers::new(handlers)))
    }
}

impl HandlerRecoveryProcessor {
    /// 注册一个处理器，从下一次恢复尝试开始生效
    pub fn register_handler(&self, handler: Arc<dyn ReadModelRecoveryHandler>) {
        self.handlers.register(handler);
    }

    pub fn handlers(&self) -> &Arc<RecoveryHandlers> {
        &self.handlers
    }
}

#[async_trait]
impl RecoveryProcessor for HandlerRecoveryProcessor {
    async fn recover_after_unexpected_shutdown(
        &self,
        events: &[DomainEvent],
        token: &CancellationToken,
    ) -> anyhow::Result<()> {
        if token.is_cancelled() {
            return Err(DomainError::cancelled("shutdown_recovery").into());
        }
        if events.is_empty() {
            return Ok(());
        }

        let handlers = self.handlers.snapshot();
        for manager in &self.read_store_managers {
            if token.is_cancelled() {
                break;
            }
            tracing::debug!(
                read_model = manager.read_model_type().name(),
                events = events.len(),
                "recovering read store after unexpected shutdown"
            );
            RecoveryChain::new(&handlers)
                .recover_from_shutdown(manager.as_ref(), events, token)
                .await;
        }

        // 读存储可以部分恢复（重放是幂等的），但取消后绝不标记为已发布
        if token.is_cancelled() {
            return Err(DomainError::cancelled("shutdown_recovery").into());
        }

        self.marker.mark_published(events).await?;
        tracing::info!(events = events.len(), "recovered events marked as published");
        Ok(())
    }

    async fn recover_read_model_update_error(
        &self,
        manager: &dyn ReadStoreManager,
        events: &[DomainEvent],
        error: &anyhow::Error,
        token: &CancellationToken,
    ) -> bool {
        if token.is_cancelled() {
            return false;
        }

        let handlers = self.handlers.snapshot();
        let recovered = RecoveryChain::new(&handlers)
            .recover_from_error(manager, events, error, token)
            .await;

        tracing::debug!(
            read_model = manager.read_model_type().name(),
            handlers = handlers.len(),
            recovered,
            "read model update error consulted recovery handlers"
        );
        recovered
    }
}
