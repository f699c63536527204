//! 读模型（Read Model）与适用性解析
//!
//! - `ReadModel`：读模型声明自己能消费的事件类型，并提供应用事件的逻辑；
//! - `ApplicabilityRegistry`：按类型一次性计算并缓存可应用的事件类型集合；
//! - `ReadStoreManager`：一个读模型投影目标，对外只暴露“应用一批事件”；
//! - `InMemoryReadStoreManager`：基于内存的读存储，便于测试与本地开发。
//!
mod applicability;
mod declaration;
mod in_memory;
mod store;

pub use applicability::{Applicability, ApplicabilityRegistry};
pub use declaration::{ApplyMode, EventDeclaration, ReadModel, ReadModelContext, ReadModelType};
pub use in_memory::InMemoryReadStoreManager;
pub use store::ReadStoreManager;
