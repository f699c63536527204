//! 作业（jobs）
//!
//! 异步订阅者的工作以作业形式提交给调度器：提交成功即返回，
//! 作业的执行发生在发布调用之外，执行失败不会回到发布方。
//!
mod job;
mod scheduler;

pub use job::{DispatchToAsynchronousEventSubscribersJob, Job, JobId};
pub use scheduler::{InstantJobScheduler, JobScheduler, TokioJobScheduler};
