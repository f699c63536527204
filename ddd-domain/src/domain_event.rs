//! 领域事件记录（DomainEvent）
//!
//! 聚合提交后由事件存储产出的不可变事件，发布管线只读不写：
//! - `event_type` 用于读模型适用性判断与订阅匹配；
//! - `aggregate_id` + `aggregate_sequence_number` 标识事件在聚合流内的位置；
//! - 批次以切片 `&[DomainEvent]` 传递，顺序即提交顺序，管线不会重排。
//!
use crate::error::DomainResult;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
pub struct DomainEvent {
    /// 事件唯一标识符
    event_id: String,
    /// 事件类型，用于区分不同的事件
    event_type: String,
    /// 事件载荷版本
    #[builder(default = 1)]
    event_version: usize,
    /// 聚合类型
    aggregate_type: String,
    /// 聚合 ID，标识事件所属的聚合根实例
    aggregate_id: String,
    /// 事件在聚合流内的位点（从 1 开始）
    aggregate_sequence_number: usize,
    /// 关联 ID，用于将多个事件关联到同一个业务操作
    correlation_id: Option<String>,
    /// 因果 ID，用于表示事件的触发来源
    causation_id: Option<String>,
    /// 事件发生时间
    #[builder(default = Utc::now())]
    occurred_at: DateTime<Utc>,
    /// 事件负载
    #[builder(default)]
    payload: Value,
}

impl DomainEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> usize {
        self.event_version
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_sequence_number(&self) -> usize {
        self.aggregate_sequence_number
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// 将负载反序列化为具体的事件结构
    pub fn payload_as<T>(&self) -> DomainResult<T>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

impl fmt::Display for DomainEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}/{}#{}",
            self.event_type, self.aggregate_type, self.aggregate_id, self.aggregate_sequence_number
        )
    }
}

/// 批次中出现过的事件类型（按首次出现顺序去重），用于日志与诊断
pub fn event_types(events: &[DomainEvent]) -> Vec<&str> {
    let mut types: Vec<&str> = Vec::new();
    for event in events {
        if !types.contains(&event.event_type()) {
            types.push(event.event_type());
        }
    }
    types
}
