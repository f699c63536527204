#![allow(dead_code)]

use async_trait::async_trait;
use ddd_domain::domain_event::DomainEvent;
use ddd_publishing::DomainEventPublisher;
use ddd_publishing::cancellation::{CancellationBoundary, CancellationConfiguration};
use ddd_publishing::config::PublisherConfig;
use ddd_publishing::jobs::{InstantJobScheduler, Job, JobId, JobScheduler};
use ddd_publishing::marker::PublishedMarker;
use ddd_publishing::read_model::{ReadModelType, ReadStoreManager};
use ddd_publishing::recovery::{
    HandlerRecoveryProcessor, ReadModelRecoveryHandler, RecoveryChain, RecoveryProcessor,
};
use ddd_publishing::sagas::DispatchToSagas;
use ddd_publishing::subscribers::{DispatchToEventSubscribers, SubscribeSynchronousToAll};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use ulid::Ulid;

#[derive(Clone, Default)]
pub struct Log {
    inner: Arc<Mutex<Vec<String>>>,
}
impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.inner.lock().unwrap().push(entry.into());
    }
    pub fn entries(&self) -> Vec<String> {
        self.inner.lock().unwrap().clone()
    }
    pub fn contains(&self, entry: &str) -> bool {
        self.entries().iter().any(|e| e == entry)
    }
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

pub fn mk_event(ty: &str, seq: usize) -> DomainEvent {
    DomainEvent::builder()
        .event_id(Ulid::new().to_string())
        .event_type(ty)
        .aggregate_type("thingy")
        .aggregate_id("thingy-1")
        .aggregate_sequence_number(seq)
        .payload(serde_json::json!({"seq": seq}))
        .build()
}

/// 可识别的投影失败，用于断言错误未被包装
#[derive(Debug)]
pub struct ProjectionFailure(pub &'static str);
impl fmt::Display for ProjectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
impl std::error::Error for ProjectionFailure {}

pub struct SpyManager {
    pub name: &'static str,
    pub delay: Duration,
    pub failure: Option<&'static str>,
    pub log: Log,
}
impl SpyManager {
    pub fn ok(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            delay: Duration::ZERO,
            failure: None,
            log: log.clone(),
        }
    }
    pub fn failing(name: &'static str, message: &'static str, log: &Log) -> Self {
        Self {
            failure: Some(message),
            ..Self::ok(name, log)
        }
    }
    pub fn slow(name: &'static str, delay: Duration, log: &Log) -> Self {
        Self {
            delay,
            ..Self::ok(name, log)
        }
    }
}
#[async_trait]
impl ReadStoreManager for SpyManager {
    fn read_model_type(&self) -> ReadModelType {
        ReadModelType::of::<SpyManager>()
    }
    async fn update_read_stores(
        &self,
        _events: &[DomainEvent],
        _token: &CancellationToken,
    ) -> anyhow::Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = self.failure {
            self.log.push(format!("read_store:{}:failed", self.name));
            return Err(ProjectionFailure(message).into());
        }
        self.log.push(format!("read_store:{}", self.name));
        Ok(())
    }
}

/// 不区分读模型的脚本化恢复处理器
pub struct ScriptedHandler {
    pub name: &'static str,
    pub recover: Option<bool>,
    pub log: Log,
}
#[async_trait]
impl ReadModelRecoveryHandler for ScriptedHandler {
    async fn recover_from_shutdown(
        &self,
        manager: &dyn ReadStoreManager,
        events: &[DomainEvent],
        next: RecoveryChain<'_>,
        token: &CancellationToken,
    ) {
        self.log.push(format!("shutdown:{}", self.name));
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
        self.log.push(format!("recovery:{}", self.name));
        match self.recover {
            Some(verdict) => verdict,
            None => next.recover_from_error(manager, events, error, token).await,
        }
    }
}

pub struct SpySubscriberToAll {
    pub name: &'static str,
    pub failure: Option<&'static str>,
    pub log: Log,
}
#[async_trait]
impl SubscribeSynchronousToAll for SpySubscriberToAll {
    fn subscriber_name(&self) -> &str {
        self.name
    }
    async fn handle(&self, events: &[DomainEvent], _token: &CancellationToken) -> anyhow::Result<()> {
        if let Some(message) = self.failure {
            return Err(ProjectionFailure(message).into());
        }
        self.log.push(format!("all:{}:{}", self.name, events.len()));
        Ok(())
    }
}

pub struct SpyDispatcher {
    pub log: Log,
}
#[async_trait]
impl DispatchToEventSubscribers for SpyDispatcher {
    async fn dispatch_to_synchronous_subscribers(
        &self,
        events: &[DomainEvent],
        _token: &CancellationToken,
    ) -> anyhow::Result<()> {
        self.log.push(format!("sync:{}", events.len()));
        Ok(())
    }
    async fn dispatch_to_asynchronous_subscribers(
        &self,
        event: &DomainEvent,
        _token: &CancellationToken,
    ) -> anyhow::Result<()> {
        self.log.push(format!("async:{}", event.aggregate_sequence_number()));
        Ok(())
    }
}

pub struct SpySagas {
    pub log: Log,
}
#[async_trait]
impl DispatchToSagas for SpySagas {
    async fn process(&self, events: &[DomainEvent], _token: &CancellationToken) -> anyhow::Result<()> {
        self.log.push(format!("saga:{}", events.len()));
        Ok(())
    }
}

pub struct SpyMarker {
    pub log: Log,
}
#[async_trait]
impl PublishedMarker for SpyMarker {
    async fn mark_published(&self, events: &[DomainEvent]) -> anyhow::Result<()> {
        self.log.push(format!("marked:{}", events.len()));
        Ok(())
    }
}

/// 拒绝所有作业的调度器
pub struct RejectingScheduler;
#[async_trait]
impl JobScheduler for RejectingScheduler {
    async fn schedule_now(
        &self,
        _job: Arc<dyn Job>,
        _token: &CancellationToken,
    ) -> anyhow::Result<JobId> {
        Err(ProjectionFailure("job queue unavailable").into())
    }
}

/// 组装发布器的测试夹具
pub struct Fixture {
    pub log: Log,
    pub managers: Vec<Arc<dyn ReadStoreManager>>,
    pub handlers: Vec<Arc<dyn ReadModelRecoveryHandler>>,
    pub subscribers: Vec<Arc<dyn SubscribeSynchronousToAll>>,
    pub config: PublisherConfig,
    pub scheduler: Arc<dyn JobScheduler>,
    pub cancellation: CancellationConfiguration,
    pub recovery: Option<Arc<dyn RecoveryProcessor>>,
}

impl Fixture {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            managers: Vec::new(),
            handlers: Vec::new(),
            subscribers: Vec::new(),
            config: PublisherConfig::default(),
            scheduler: Arc::new(InstantJobScheduler),
            cancellation: CancellationConfiguration::new(CancellationBoundary::AlwaysEnabled),
            recovery: None,
        }
    }

    pub fn recovery_processor(&self) -> Arc<dyn RecoveryProcessor> {
        match &self.recovery {
            Some(recovery) => recovery.clone(),
            None => Arc::new(
                HandlerRecoveryProcessor::builder()
                    .recovery_handlers(self.handlers.clone())
                    .read_store_managers(self.managers.clone())
                    .marker(Arc::new(SpyMarker {
                        log: self.log.clone(),
                    }) as Arc<dyn PublishedMarker>)
                    .build(),
            ),
        }
    }

    pub fn build(&self) -> DomainEventPublisher {
        DomainEventPublisher::builder()
            .recovery(self.recovery_processor())
            .read_store_managers(self.managers.clone())
            .subscribers_to_all(self.subscribers.clone())
            .event_subscribers(Arc::new(SpyDispatcher {
                log: self.log.clone(),
            }) as Arc<dyn DispatchToEventSubscribers>)
            .sagas(Arc::new(SpySagas {
                log: self.log.clone(),
            }) as Arc<dyn DispatchToSagas>)
            .job_scheduler(self.scheduler.clone())
            .cancellation(Arc::new(self.cancellation))
            .config(self.config)
            .build()
    }
}
