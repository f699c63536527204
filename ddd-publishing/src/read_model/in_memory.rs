//! 内存版读存储（InMemoryReadStoreManager）
//!
//! 每个聚合实例对应一个读模型（读模型 ID 即聚合 ID）：
//! - 先按适用集合过滤批次，再按聚合分组，组内保持批次原有顺序；
//! - 逐组“加载 → 应用 → 保存”，应用失败时该组不会被保存；
//! - 每组在写锁内完成，多个发布调用并发更新同一读模型不会丢失更新；
//! - 典型用途：测试环境、示例与本地开发。

use super::{ApplicabilityRegistry, ReadModel, ReadModelContext, ReadModelType, ReadStoreManager};
use async_trait::async_trait;
use ddd_domain::domain_event::DomainEvent;
use ddd_domain::error::DomainError;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

pub struct InMemoryReadStoreManager<R: ReadModel> {
    models: RwLock<HashMap<String, R>>,
    registry: &'static ApplicabilityRegistry,
}

impl<R: ReadModel> Default for InMemoryReadStoreManager<R> {
    fn default() -> Self {
        Self {
            models: RwLock::new(HashMap::new()),
            registry: ApplicabilityRegistry::global(),
        }
    }
}

impl<R: ReadModel> InMemoryReadStoreManager<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取某个读模型的当前状态
    pub async fn get(&self, read_model_id: &str) -> Option<R> {
        self.models.read().await.get(read_model_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.models.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.models.read().await.is_empty()
    }
}

#[async_trait]
impl<R: ReadModel> ReadStoreManager for InMemoryReadStoreManager<R> {
    fn read_model_type(&self) -> ReadModelType {
        ReadModelType::of::<R>()
    }

    async fn update_read_stores(
        &self,
        events: &[DomainEvent],
        token: &CancellationToken,
    ) -> anyhow::Result<()> {
        let applicability = self.registry.resolve::<R>()?;

        let mut groups: Vec<(&str, Vec<&DomainEvent>)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for event in events.iter().filter(|e| applicability.can_apply(e)) {
            let slot = *index.entry(event.aggregate_id()).or_insert_with(|| {
                groups.push((event.aggregate_id(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(event);
        }

        for (read_model_id, events) in groups {
            if token.is_cancelled() {
                return Err(DomainError::cancelled("read_store_update").into());
            }

            // 写锁覆盖整个“加载 → 应用 → 保存”，并发批次对同一读模型串行执行
            let mut models = self.models.write().await;
            let mut model = models.get(read_model_id).cloned().unwrap_or_default();
            let context = ReadModelContext::new(read_model_id);
            for event in events {
                model.apply(&context, event).await?;
            }
            models.insert(read_model_id.to_string(), model);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_model::EventDeclaration;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct PingCount {
        pings: usize,
        last_sequence: usize,
    }

    #[async_trait]
    impl ReadModel for PingCount {
        fn declarations() -> Vec<EventDeclaration> {
            vec![EventDeclaration::sync("thingy.pinged")]
        }

        async fn apply(
            &mut self,
            _context: &ReadModelContext,
            event: &DomainEvent,
        ) -> anyhow::Result<()> {
            self.pings += 1;
            self.last_sequence = event.aggregate_sequence_number();
            Ok(())
        }
    }

    #[derive(Debug, Default, Clone)]
    struct SlowPingCount {
        pings: usize,
    }

    #[async_trait]
    impl ReadModel for SlowPingCount {
        fn declarations() -> Vec<EventDeclaration> {
            vec![EventDeclaration::sync("thingy.pinged")]
        }

        async fn apply(
            &mut self,
            _context: &ReadModelContext,
            _event: &DomainEvent,
        ) -> anyhow::Result<()> {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            self.pings += 1;
            Ok(())
        }
    }

    fn mk_event(aggregate_id: &str, ty: &str, seq: usize) -> DomainEvent {
        DomainEvent::builder()
            .event_id(format!("{aggregate_id}-{seq}"))
            .event_type(ty)
            .aggregate_type("thingy")
            .aggregate_id(aggregate_id)
            .aggregate_sequence_number(seq)
            .build()
    }

    #[tokio::test]
    async fn applies_only_declared_events_per_aggregate() {
        let manager = InMemoryReadStoreManager::<PingCount>::new();
        let events = vec![
            mk_event("a", "thingy.pinged", 1),
            mk_event("b", "thingy.pinged", 1),
            mk_event("a", "thingy.renamed", 2),
            mk_event("a", "thingy.pinged", 3),
        ];

        manager
            .update_read_stores(&events, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(manager.len().await, 2);
        assert_eq!(
            manager.get("a").await,
            Some(PingCount {
                pings: 2,
                last_sequence: 3
            })
        );
        assert_eq!(manager.get("b").await.map(|m| m.pings), Some(1));
    }

    #[tokio::test]
    async fn batch_without_applicable_events_leaves_store_untouched() {
        let manager = InMemoryReadStoreManager::<PingCount>::new();
        let events = vec![mk_event("a", "thingy.renamed", 1)];

        manager
            .update_read_stores(&events, &CancellationToken::new())
            .await
            .unwrap();

        assert!(manager.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_batches_on_same_aggregate_keep_every_update() {
        let manager = InMemoryReadStoreManager::<SlowPingCount>::new();
        let token = CancellationToken::new();
        let first = [mk_event("a", "thingy.pinged", 1)];
        let second = [mk_event("a", "thingy.pinged", 2)];

        let (r1, r2) = tokio::join!(
            manager.update_read_stores(&first, &token),
            manager.update_read_stores(&second, &token)
        );
        r1.unwrap();
        r2.unwrap();

        assert_eq!(manager.get("a").await.map(|m| m.pings), Some(2));
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_next_read_model() {
        let manager = InMemoryReadStoreManager::<PingCount>::new();
        let token = CancellationToken::new();
        token.cancel();

        let err = manager
            .update_read_stores(&[mk_event("a", "thingy.pinged", 1)], &token)
            .await
            .unwrap_err();

        assert!(
            err.downcast_ref::<DomainError>()
                .is_some_and(DomainError::is_cancelled)
        );
        assert!(manager.is_empty().await);
    }
}
