//! 领域事件发布核心（ddd-publishing）
//!
//! 聚合提交一批领域事件后，负责把该批次可靠地传播给所有下游消费者：
//! - 读模型投影（`read_model`）：按读模型类型解析适用事件，并发更新读存储；
//! - 全局订阅者与按事件订阅者（`subscribers`），异步订阅通过作业调度（`jobs`）；
//! - 流程管理器（`sagas`）；
//! - 失败时交给可插拔、有序的恢复处理器链（`recovery`）决定是否视为已处理；
//! - 崩溃后恢复已提交但未发布完成的批次，并标记为已发布（`marker`）。
//!
//! 典型用法：
//! 1. 为每个读模型实现 `ReadModel` 并提供 `ReadStoreManager`；
//! 2. 用 `HandlerRecoveryProcessor::builder()` 注册恢复处理器；
//! 3. 用 `DomainEventPublisher::builder()` 组装发布器，提交后调用 `publish`；
//! 4. 启动时对未发布完成的批次调用 `recover_after_unexpected_shutdown`。
//!
pub mod cancellation;
pub mod config;
pub mod jobs;
pub mod marker;
pub mod publisher;
pub mod read_model;
pub mod recovery;
pub mod sagas;
pub mod subscribers;

pub use publisher::DomainEventPublisher;
