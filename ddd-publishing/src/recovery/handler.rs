use super::RecoveryChain;
use crate::read_model::{ReadModel, ReadModelType, ReadStoreManager};
use async_trait::async_trait;
use ddd_domain::domain_event::DomainEvent;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

/// 读模型恢复处理器（不区分读模型类型）
///
/// 每个方法都会拿到链上的下一步 `next`，处理器可以在委托前后执行逻辑，
/// 也可以不委托而直接给出结论；最终结论完全由处理器决定。
#[async_trait]
pub trait ReadModelRecoveryHandler: Send + Sync {
    /// 非正常关闭后的恢复通知（仅建议性，不能否决发布标记）
    async fn recover_from_shutdown(
        &self,
        manager: &dyn ReadStoreManager,
        events: &[DomainEvent],
        next: RecoveryChain<'_>,
        token: &CancellationToken,
    );

    /// 读存储更新失败时的恢复决策，返回 `true` 表示已恢复
    async fn recover_from_error(
        &self,
        manager: &dyn ReadStoreManager,
        events: &[DomainEvent],
        error: &anyhow::Error,
        next: RecoveryChain<'_>,
        token: &CancellationToken,
    ) -> bool;
}

/// 绑定到某一读模型类型的恢复处理器
#[async_trait]
pub trait ReadModelRecoveryHandlerFor<R: ReadModel>: Send + Sync {
    async fn recover_from_shutdown(&self, _events: &[DomainEvent], _token: &CancellationToken) {}

    async fn recover_from_error(
        &self,
        events: &[DomainEvent],
        error: &anyhow::Error,
        token: &CancellationToken,
    ) -> bool;
}

/// 将类型化处理器接入无类型的处理器链
///
/// - 管理器的读模型类型匹配 `R` 时才会咨询内部处理器；
/// - 关闭恢复：内部处理器执行后继续沿链传递；
/// - 错误恢复：内部处理器恢复则返回 `true`，否则交给下一个处理器。
pub struct ForReadModel<R, H> {
    inner: H,
    _read_model: PhantomData<fn() -> R>,
}

impl<R, H> ForReadModel<R, H>
where
    R: ReadModel,
    H: ReadModelRecoveryHandlerFor<R>,
{
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            _read_model: PhantomData,
        }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    fn matches(manager: &dyn ReadStoreManager) -> bool {
        manager.read_model_type() == ReadModelType::of::<R>()
    }
}

#[async_trait]
impl<R, H> ReadModelRecoveryHandler for ForReadModel<R, H>
where
    R: ReadModel,
    H: ReadModelRecoveryHandlerFor<R>,
{
    async fn recover_from_shutdown(
        &self,
        manager: &dyn ReadStoreManager,
        events: &[DomainEvent],
        next: RecoveryChain<'_>,
        token: &CancellationToken,
    ) {
        if Self::matches(manager) {
            self.inner.recover_from_shutdown(events, token).await;
        }
        next.recover_from_shutdown(manager, events, token).await;
    }

    async fn recover_from_error(
        &self,
        manager: &dyn ReadStoreManager,
        events: &[DomainEvent],
        error: &anyhow::Error,
        next: RecoveryChain<'_>,
        token: &CancellationToken,
    ) -> bool {
        if Self::matches(manager) && self.inner.recover_from_error(events, error, token).await {
            return true;
        }
        next.recover_from_error(manager, events, error, token).await
    }
}
