//! 作业调度器（JobScheduler）
//!
//! - `TokioJobScheduler`：在当前 tokio 运行时上派生任务执行作业，可关闭与等待；
//! - `InstantJobScheduler`：在调用方任务内立即执行作业，适用于测试与单进程部署。
//!
//! 两者都只记录作业执行失败，不会把执行错误返回给提交方。

use super::{Job, JobId};
use async_trait::async_trait;
use ddd_domain::error::DomainError;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// 立即调度一个作业；返回表示“已接受”，而非“已执行”
    async fn schedule_now(
        &self,
        job: Arc<dyn Job>,
        token: &CancellationToken,
    ) -> anyhow::Result<JobId>;
}

/// 基于 tokio 任务的调度器
#[derive(Default)]
pub struct TokioJobScheduler {
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl TokioJobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 通知运行中的作业取消，并拒绝新的作业
    pub fn shutdown(&self) {
        self.tracker.close();
        self.shutdown.cancel();
    }

    /// 等待已接受的作业全部结束（不再接受新作业）
    pub async fn join(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }
}

#[async_trait]
impl JobScheduler for TokioJobScheduler {
    async fn schedule_now(
        &self,
        job: Arc<dyn Job>,
        token: &CancellationToken,
    ) -> anyhow::Result<JobId> {
        if token.is_cancelled() {
            return Err(DomainError::cancelled("schedule_job").into());
        }
        if self.tracker.is_closed() {
            return Err(DomainError::job_scheduler("scheduler is closed").into());
        }
        let handle = Handle::try_current().map_err(|e| DomainError::job_scheduler(e.to_string()))?;

        let job_id = JobId::new();
        let job_token = self.shutdown.child_token();
        self.tracker.spawn_on(
            async move {
                match job.run(&job_token).await {
                    Ok(()) => tracing::debug!(job = job.name(), %job_id, "job completed"),
                    Err(err) => {
                        tracing::error!(job = job.name(), %job_id, error = %err, "job failed")
                    }
                }
            },
            &handle,
        );

        tracing::debug!(%job_id, "job scheduled");
        Ok(job_id)
    }
}

/// 立即执行的调度器
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantJobScheduler;

#[async_trait]
impl JobScheduler for InstantJobScheduler {
    async fn schedule_now(
        &self,
        job: Arc<dyn Job>,
        token: &CancellationToken,
    ) -> anyhow::Result<JobId> {
        if token.is_cancelled() {
            return Err(DomainError::cancelled("schedule_job").into());
        }

        let job_id = JobId::new();
        if let Err(err) = job.run(token).await {
            tracing::error!(job = job.name(), %job_id, error = %err, "job failed");
        }
        Ok(job_id)
    }
}
