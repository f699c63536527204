use async_trait::async_trait;
use ddd_domain::domain_event::DomainEvent;
use tokio_util::sync::CancellationToken;

/// Saga 分发器：把事件交给流程管理器推进状态
///
/// 总在发布的最后一步调用，此时读模型与订阅者的副作用都已发生。
/// Saga 内部的失败恢复通过 `RecoveryProcessor::recover_saga_error` 决策。
#[async_trait]
pub trait DispatchToSagas: Send + Sync {
    async fn process(
        &self,
        events: &[DomainEvent],
        token: &CancellationToken,
    ) -> anyhow::Result<()>;
}
