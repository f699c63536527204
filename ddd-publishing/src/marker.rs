//! 发布标记（PublishedMarker）
//!
//! 在事件批次完成发布后持久化地记录“已发布”，用于区分崩溃时未发布完的批次。
//! 重复标记同一批次必须是安全的。
//!
use async_trait::async_trait;
use ddd_domain::domain_event::DomainEvent;

#[async_trait]
pub trait PublishedMarker: Send + Sync {
    /// 将事件批次标记为已发布
    async fn mark_published(&self, events: &[DomainEvent]) -> anyhow::Result<()>;
}
