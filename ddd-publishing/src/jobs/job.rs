use crate::subscribers::DispatchToEventSubscribers;
use async_trait::async_trait;
use ddd_domain::domain_event::DomainEvent;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// 作业标识（由调度器在接受作业时分配）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// 可被调度执行的作业
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, token: &CancellationToken) -> anyhow::Result<()>;
}

/// 将单个事件分发给异步订阅者的作业
pub struct DispatchToAsynchronousEventSubscribersJob {
    event: DomainEvent,
    dispatcher: Arc<dyn DispatchToEventSubscribers>,
}

impl DispatchToAsynchronousEventSubscribersJob {
    pub fn new(event: DomainEvent, dispatcher: Arc<dyn DispatchToEventSubscribers>) -> Self {
        Self { event, dispatcher }
    }

    pub fn event(&self) -> &DomainEvent {
        &self.event
    }
}

#[async_trait]
impl Job for DispatchToAsynchronousEventSubscribersJob {
    fn name(&self) -> &str {
        "dispatch-to-asynchronous-event-subscribers"
    }

    async fn run(&self, token: &CancellationToken) -> anyhow::Result<()> {
        self.dispatcher
            .dispatch_to_asynchronous_subscribers(&self.event, token)
            .await
    }
}
