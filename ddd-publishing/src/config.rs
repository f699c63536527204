use serde::Deserialize;

/// 发布器配置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// 是否为每个事件调度异步订阅作业
    pub asynchronous_subscribers_enabled: bool,
}

impl PublisherConfig {
    pub fn with_asynchronous_subscribers(mut self, enabled: bool) -> Self {
        self.asynchronous_subscribers_enabled = enabled;
        self
    }
}
