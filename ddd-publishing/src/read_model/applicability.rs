//! 读模型适用性（Applicability）
//!
//! 每个读模型类型只计算一次可应用的事件类型集合：
//! - 首次使用时惰性计算，之后对该类型的所有实例共享；
//! - 没有任何声明、或对同一事件类型重复声明，都视为配置错误；
//! - 失败结果同样被缓存，后续解析得到同样的错误。
//!
//! 并发首次解析时由 `OnceLock` 保证只计算一次，其余调用方等待结果。

use super::{EventDeclaration, ReadModel};
use dashmap::DashMap;
use ddd_domain::domain_event::DomainEvent;
use ddd_domain::error::{DomainError, DomainResult};
use std::any::{TypeId, type_name};
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

type Resolution = Result<Arc<Applicability>, String>;

/// 某个读模型类型可消费的事件类型集合（不可变）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicability {
    event_types: HashSet<String>,
}

impl Applicability {
    /// 由声明构建集合；校验“至少一个声明”与“不可重复声明”
    pub fn from_declarations(declarations: &[EventDeclaration]) -> Result<Self, String> {
        if declarations.is_empty() {
            return Err("does not declare any handled event type".to_string());
        }

        let mut event_types = HashSet::with_capacity(declarations.len());
        let mut ambiguous: Vec<&str> = Vec::new();
        for declaration in declarations {
            if !event_types.insert(declaration.event_type().to_string())
                && !ambiguous.contains(&declaration.event_type())
            {
                ambiguous.push(declaration.event_type());
            }
        }

        if !ambiguous.is_empty() {
            return Err(format!(
                "declares ambiguous handlers for event types [{}]",
                ambiguous.join(", ")
            ));
        }

        Ok(Self { event_types })
    }

    pub fn can_apply(&self, event: &DomainEvent) -> bool {
        self.can_apply_type(event.event_type())
    }

    pub fn can_apply_type(&self, event_type: &str) -> bool {
        self.event_types.contains(event_type)
    }

    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.event_types.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.event_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_types.is_empty()
    }
}

/// 以类型标识为键的适用性注册表
#[derive(Default)]
pub struct ApplicabilityRegistry {
    entries: DashMap<TypeId, Arc<OnceLock<Resolution>>>,
}

impl ApplicabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 进程级共享注册表
    pub fn global() -> &'static ApplicabilityRegistry {
        static GLOBAL: OnceLock<ApplicabilityRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ApplicabilityRegistry::new)
    }

    /// 解析读模型 `R` 的适用集合（首次调用时计算）
    pub fn resolve<R: ReadModel>(&self) -> DomainResult<Arc<Applicability>> {
        // 先取出单元格并释放分片锁，再在单元格上等待初始化
        let cell = Arc::clone(&self.entries.entry(TypeId::of::<R>()).or_default());

        let resolution = cell.get_or_init(|| {
            let applicability = Applicability::from_declarations(&R::declarations())?;
            tracing::debug!(
                read_model = type_name::<R>(),
                event_types = applicability.len(),
                "read model applicability resolved"
            );
            Ok(Arc::new(applicability))
        });

        resolution
            .clone()
            .map_err(|reason| DomainError::read_model_configuration(type_name::<R>(), reason))
    }

    /// `R` 能否应用给定事件；声明有误时返回配置错误
    pub fn can_apply<R: ReadModel>(&self, event: &DomainEvent) -> DomainResult<bool> {
        Ok(self.resolve::<R>()?.can_apply(event))
    }

    /// 已解析（含失败）的读模型类型数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
