//! 领域层统一错误定义
//!
//! 聚焦读模型声明、取消与作业调度等发布管线需要的最小集合，
//! 便于在各实现层统一转换为 `DomainError`。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },

    // --- 读模型配置 ---
    #[error("read model configuration error: read_model={read_model}, reason={reason}")]
    ReadModelConfiguration { read_model: String, reason: String },

    // --- 发布管线 ---
    #[error("publication cancelled: stage={stage}")]
    Cancelled { stage: &'static str },
    #[error("job scheduler error: {reason}")]
    JobScheduler { reason: String },
}

impl DomainError {
    pub fn read_model_configuration(
        read_model: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        DomainError::ReadModelConfiguration {
            read_model: read_model.into(),
            reason: reason.into(),
        }
    }

    pub fn cancelled(stage: &'static str) -> Self {
        DomainError::Cancelled { stage }
    }

    pub fn job_scheduler(reason: impl Into<String>) -> Self {
        DomainError::JobScheduler {
            reason: reason.into(),
        }
    }

    /// 是否为取消导致的错误（取消不视为失败，调用方通常据此区分日志级别）
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled { .. })
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;
