//! 订阅者（Subscribers）
//!
//! - `SubscribeSynchronousToAll`：观察所有事件的全局订阅者，以整批为单位接收；
//! - `DispatchToEventSubscribers`：按事件类型分发到具体订阅者的外部分发器，
//!   同步订阅在发布调用内执行，异步订阅由作业调度器在稍后执行。
//!
use async_trait::async_trait;
use ddd_domain::domain_event::DomainEvent;
use tokio_util::sync::CancellationToken;

/// 订阅全部事件的同步订阅者
#[async_trait]
pub trait SubscribeSynchronousToAll: Send + Sync {
    /// 订阅者名称（用于日志）
    fn subscriber_name(&self) -> &str;

    async fn handle(
        &self,
        events: &[DomainEvent],
        token: &CancellationToken,
    ) -> anyhow::Result<()>;
}

/// 按事件分发到订阅者
#[async_trait]
pub trait DispatchToEventSubscribers: Send + Sync {
    async fn dispatch_to_synchronous_subscribers(
        &self,
        events: &[DomainEvent],
        token: &CancellationToken,
    ) -> anyhow::Result<()>;

    async fn dispatch_to_asynchronous_subscribers(
        &self,
        event: &DomainEvent,
        token: &CancellationToken,
    ) -> anyhow::Result<()>;
}
