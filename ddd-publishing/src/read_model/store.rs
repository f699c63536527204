use super::ReadModelType;
use async_trait::async_trait;
use ddd_domain::domain_event::DomainEvent;
use tokio_util::sync::CancellationToken;

/// 读存储管理器：一个读模型投影目标
///
/// 同一批事件可能被重复投递（崩溃恢复后重放），实现需保证重复应用是幂等的。
/// 多个发布调用可能并发调用同一个管理器，跨读模型的一致性由各自实现负责。
#[async_trait]
pub trait ReadStoreManager: Send + Sync {
    /// 该管理器负责的读模型类型
    fn read_model_type(&self) -> ReadModelType;

    /// 将一批事件应用到读存储
    async fn update_read_stores(
        &self,
        events: &[DomainEvent],
        token: &CancellationToken,
    ) -> anyhow::Result<()>;
}
