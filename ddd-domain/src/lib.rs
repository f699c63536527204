//! 事件发布共享内核（ddd-domain）
//!
//! 提供事件发布管线在各层之间共享的最小构件：
//! - 领域事件记录（`domain_event`）：事件类型、所属聚合与流内位点；
//! - 统一错误（`error`）：配置错误、取消、调度失败等。
//!
//! 事件的序列化、存储与顺序保证由事件存储负责，本 crate 只描述发布侧读取到的形态。
//!
pub mod domain_event;
pub mod error;
