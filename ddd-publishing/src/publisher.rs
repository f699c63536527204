//! 领域事件发布器（DomainEventPublisher）
//!
//! 每个已提交的事件批次调用一次 `publish`，按固定顺序推进各阶段，
//! 前一阶段所有单元结束（成功或已恢复）后才进入下一阶段：
//! 1. 读存储：所有管理器并发更新，失败交给恢复处理器；
//! 2. 全局订阅者：并发通知，失败交给恢复处理器；
//! 3. 同步订阅者：交给外部分发器；
//! 4. 异步订阅者（可配置）：每个事件提交一个调度作业；
//! 5. Saga：总在最后。
//!
//! 同一阶段内某个单元失败不会取消兄弟单元，全部结束后才把第一个未恢复的错误
//! （按注册顺序）原样返回，之后的阶段不再执行。

use crate::cancellation::{CancellationBoundary, CancellationPolicy};
use crate::config::PublisherConfig;
use crate::jobs::{DispatchToAsynchronousEventSubscribersJob, Job, JobId, JobScheduler};
use crate::read_model::ReadStoreManager;
use crate::recovery::RecoveryProcessor;
use crate::sagas::DispatchToSagas;
use crate::subscribers::{DispatchToEventSubscribers, SubscribeSynchronousToAll};
use bon::Builder;
use ddd_domain::domain_event::DomainEvent;
use ddd_domain::error::DomainError;
use futures_util::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Builder)]
pub struct DomainEventPublisher {
    recovery: Arc<dyn RecoveryProcessor>,
    #[builder(default)]
    read_store_managers: Vec<Arc<dyn ReadStoreManager>>,
    #[builder(default)]
    subscribers_to_all: Vec<Arc<dyn SubscribeSynchronousToAll>>,
    event_subscribers: Arc<dyn DispatchToEventSubscribers>,
    sagas: Arc<dyn DispatchToSagas>,
    job_scheduler: Arc<dyn JobScheduler>,
    cancellation: Arc<dyn CancellationPolicy>,
    #[builder(default)]
    config: PublisherConfig,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    ReadStores,
    SubscribersToAll,
    SynchronousSubscribers,
    AsynchronousSubscribers,
    Sagas,
}

impl Stage {
    fn as_str(&self) -> &'static str {
        match self {
            Stage::ReadStores => "read_stores",
            Stage::SubscribersToAll => "subscribers_to_all",
            Stage::SynchronousSubscribers => "synchronous_subscribers",
            Stage::AsynchronousSubscribers => "asynchronous_subscribers",
            Stage::Sagas => "sagas",
        }
    }

    fn ensure_active(self, token: &CancellationToken) -> Result<(), DomainError> {
        if token.is_cancelled() {
            tracing::debug!(stage = self.as_str(), "publication cancelled");
            return Err(DomainError::cancelled(self.as_str()));
        }
        tracing::debug!(stage = self.as_str(), "publication stage started");
        Ok(())
    }
}

impl DomainEventPublisher {
    /// 发布一个已提交的事件批次
    #[tracing::instrument(name = "publish", skip_all, fields(events = events.len()))]
    pub async fn publish(
        &self,
        events: &[DomainEvent],
        token: &CancellationToken,
    ) -> anyhow::Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let token = self
            .cancellation
            .limit(token, CancellationBoundary::BeforeUpdatingReadStores);
        Stage::ReadStores.ensure_active(&token)?;
        self.publish_to_read_stores(events, &token).await?;

        let token = self
            .cancellation
            .limit(&token, CancellationBoundary::BeforeNotifyingSubscribers);
        Stage::SubscribersToAll.ensure_active(&token)?;
        self.publish_to_subscribers_of_all_events(events, &token)
            .await?;

        // 读存储与全局订阅者之后才通知具体订阅者
        Stage::SynchronousSubscribers.ensure_active(&token)?;
        self.event_subscribers
            .dispatch_to_synchronous_subscribers(events, &token)
            .await?;

        Stage::AsynchronousSubscribers.ensure_active(&token)?;
        self.publish_to_asynchronous_subscribers(events, &token)
            .await?;

        Stage::Sagas.ensure_active(&token)?;
        self.sagas.process(events, &token).await?;

        tracing::debug!("events published");
        Ok(())
    }

    /// 恢复在非正常关闭前已提交、但未完成发布的事件批次
    #[tracing::instrument(name = "recover_after_unexpected_shutdown", skip_all, fields(events = events.len()))]
    pub async fn recover_after_unexpected_shutdown(
        &self,
        events: &[DomainEvent],
        token: &CancellationToken,
    ) -> anyhow::Result<()> {
        self.recovery
            .recover_after_unexpected_shutdown(events, token)
            .await
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    async fn publish_to_read_stores(
        &self,
        events: &[DomainEvent],
        token: &CancellationToken,
    ) -> anyhow::Result<()> {
        let updates = self.read_store_managers.iter().map(|manager| async move {
            let Err(error) = manager.update_read_stores(events, token).await else {
                return Ok(());
            };

            let read_model = manager.read_model_type();
            if self
                .recovery
                .recover_read_model_update_error(manager.as_ref(), events, &error, token)
                .await
            {
                tracing::warn!(read_model = read_model.name(), error = %error, "read store update recovered");
                return Ok(());
            }

            tracing::error!(read_model = read_model.name(), error = %error, "read store update failed");
            Err(error)
        });

        settle(join_all(updates).await)
    }

    async fn publish_to_subscribers_of_all_events(
        &self,
        events: &[DomainEvent],
        token: &CancellationToken,
    ) -> anyhow::Result<()> {
        let notifications = self.subscribers_to_all.iter().map(|subscriber| async move {
            let Err(error) = subscriber.handle(events, token).await else {
                return Ok(());
            };

            let name = subscriber.subscriber_name();
            if self
                .recovery
                .recover_all_subscriber_error(events, &error, token)
                .await
            {
                tracing::warn!(subscriber = name, error = %error, "subscriber to all events recovered");
                return Ok(());
            }

            tracing::error!(subscriber = name, error = %error, "subscriber to all events failed");
            Err(error)
        });

        settle(join_all(notifications).await)
    }

    async fn publish_to_asynchronous_subscribers(
        &self,
        events: &[DomainEvent],
        token: &CancellationToken,
    ) -> anyhow::Result<()> {
        if !self.config.asynchronous_subscribers_enabled {
            return Ok(());
        }

        let schedules = events.iter().map(|event| {
            let job: Arc<dyn Job> = Arc::new(DispatchToAsynchronousEventSubscribersJob::new(
                event.clone(),
                self.event_subscribers.clone(),
            ));
            self.job_scheduler.schedule_now(job, token)
        });

        let scheduled: anyhow::Result<Vec<JobId>> = join_all(schedules).await.into_iter().collect();
        let error = match scheduled {
            Ok(job_ids) => {
                tracing::debug!(jobs = job_ids.len(), "asynchronous subscriber jobs scheduled");
                return Ok(());
            }
            Err(error) => error,
        };

        if self
            .recovery
            .recover_schedule_subscriber_error(events, &error, token)
            .await
        {
            tracing::warn!(error = %error, "asynchronous subscriber scheduling recovered");
            return Ok(());
        }

        tracing::error!(error = %error, "asynchronous subscriber scheduling failed");
        Err(error)
    }
}

/// 所有单元都已结束后，返回第一个未恢复的错误
fn settle(results: Vec<anyhow::Result<()>>) -> anyhow::Result<()> {
    results.into_iter().collect()
}
