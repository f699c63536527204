//! 取消边界（CancellationBoundary）与取消策略
//!
//! 发布管线在命名的检查点询问策略，得到从该点起生效的取消令牌：
//! - 边界之前：沿用调用方的令牌，取消请求仍然有效；
//! - 越过边界：换成永不触发的新令牌，避免读模型与订阅者之间出现半更新状态。
//!
use serde::Deserialize;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// 取消检查点，按发生顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationBoundary {
    BeforeUpdatingAggregate,
    BeforeCommittingEvents,
    BeforeUpdatingReadStores,
    BeforeNotifyingSubscribers,
    /// 任意位置都响应取消
    AlwaysEnabled,
}

impl CancellationBoundary {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeUpdatingAggregate => "before_updating_aggregate",
            Self::BeforeCommittingEvents => "before_committing_events",
            Self::BeforeUpdatingReadStores => "before_updating_read_stores",
            Self::BeforeNotifyingSubscribers => "before_notifying_subscribers",
            Self::AlwaysEnabled => "always_enabled",
        }
    }
}

impl fmt::Display for CancellationBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 取消策略：在检查点 `point` 处给出之后使用的令牌
pub trait CancellationPolicy: Send + Sync {
    fn limit(&self, token: &CancellationToken, point: CancellationBoundary) -> CancellationToken;
}

/// 以单一边界为界限的取消配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CancellationConfiguration {
    /// 从该边界（含）开始忽略取消
    pub boundary: CancellationBoundary,
}

impl CancellationConfiguration {
    pub fn new(boundary: CancellationBoundary) -> Self {
        Self { boundary }
    }
}

impl Default for CancellationConfiguration {
    fn default() -> Self {
        Self {
            boundary: CancellationBoundary::BeforeCommittingEvents,
        }
    }
}

impl CancellationPolicy for CancellationConfiguration {
    fn limit(&self, token: &CancellationToken, point: CancellationBoundary) -> CancellationToken {
        if point < self.boundary {
            token.clone()
        } else {
            CancellationToken::new()
        }
    }
}
