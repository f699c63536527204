use async_trait::async_trait;
use ddd_domain::domain_event::DomainEvent;
use std::any::{TypeId, type_name};
use std::fmt;

/// 读模型应用事件的方式（同步/异步声明都计入适用集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyMode {
    Sync,
    Async,
}

/// 读模型对某个事件类型的处理声明
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventDeclaration {
    event_type: String,
    mode: ApplyMode,
}

impl EventDeclaration {
    pub fn sync(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            mode: ApplyMode::Sync,
        }
    }

    pub fn asynchronous(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            mode: ApplyMode::Async,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn mode(&self) -> ApplyMode {
        self.mode
    }
}

/// 读模型应用事件时的上下文
#[derive(Debug, Clone)]
pub struct ReadModelContext {
    read_model_id: String,
}

impl ReadModelContext {
    pub fn new(read_model_id: impl Into<String>) -> Self {
        Self {
            read_model_id: read_model_id.into(),
        }
    }

    pub fn read_model_id(&self) -> &str {
        &self.read_model_id
    }
}

/// 读模型：由领域事件构建的反范式视图
#[async_trait]
pub trait ReadModel: Default + Clone + Send + Sync + 'static {
    /// 该读模型声明可以消费的事件类型；同一事件类型只能声明一次
    fn declarations() -> Vec<EventDeclaration>;

    /// 应用一条事件（只会收到已声明的事件类型）
    async fn apply(
        &mut self,
        context: &ReadModelContext,
        event: &DomainEvent,
    ) -> anyhow::Result<()>;
}

/// 读模型的类型标识
#[derive(Clone, Copy)]
pub struct ReadModelType {
    id: TypeId,
    name: &'static str,
}

impl ReadModelType {
    pub fn of<R: 'static>() -> Self {
        Self {
            id: TypeId::of::<R>(),
            name: type_name::<R>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<R: 'static>(&self) -> bool {
        self.id == TypeId::of::<R>()
    }
}

impl PartialEq for ReadModelType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ReadModelType {}

impl fmt::Debug for ReadModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ReadModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
