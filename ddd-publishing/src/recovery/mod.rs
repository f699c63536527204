//! 发布失败恢复（recovery）
//!
//! 发布管线在各个分发面失败时，统一交给恢复处理器决定“是否视为已处理”：
//! - `ReadModelRecoveryHandler`：可插拔的恢复处理器，按注册顺序组成链；
//! - `RecoveryChain`：基于位置索引的延续链，每个处理器拿到“下一步”自行决定是否委托；
//! - `RecoveryHandlers`：不可变的处理器快照，支持显式重新注册；
//! - `RecoveryProcessor`：恢复决策的唯一入口（含崩溃后恢复）。
//!
mod chain;
mod handler;
mod processor;
mod registry;

pub use chain::RecoveryChain;
pub use handler::{ForReadModel, ReadModelRecoveryHandler, ReadModelRecoveryHandlerFor};
pub use processor::{HandlerRecoveryProcessor, RecoveryProcessor};
pub use registry::RecoveryHandlers;
