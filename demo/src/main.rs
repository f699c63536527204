use async_trait::async_trait;
use ddd_domain::domain_event::DomainEvent;
use ddd_publishing::DomainEventPublisher;
use ddd_publishing::cancellation::CancellationConfiguration;
use ddd_publishing::config::PublisherConfig;
use ddd_publishing::jobs::{JobScheduler, TokioJobScheduler};
use ddd_publishing::marker::PublishedMarker;
use ddd_publishing::read_model::{
    EventDeclaration, InMemoryReadStoreManager, ReadModel, ReadModelContext, ReadStoreManager,
};
use ddd_publishing::recovery::{
    HandlerRecoveryProcessor, ReadModelRecoveryHandlerFor, RecoveryHandlers,
};
use ddd_publishing::sagas::DispatchToSagas;
use ddd_publishing::subscribers::{DispatchToEventSubscribers, SubscribeSynchronousToAll};
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use ulid::Ulid;

#[derive(Debug, Default, Clone)]
struct AccountBalance {
    balance: i64,
}

#[async_trait]
impl ReadModel for AccountBalance {
    fn declarations() -> Vec<EventDeclaration> {
        vec![
            EventDeclaration::sync("account.opened"),
            EventDeclaration::sync("account.deposited"),
            EventDeclaration::sync("account.withdrawn"),
        ]
    }

    async fn apply(&mut self, _context: &ReadModelContext, event: &DomainEvent) -> anyhow::Result<()> {
        let amount = event.payload()["amount"].as_i64().unwrap_or_default();
        match event.event_type() {
            "account.withdrawn" => self.balance -= amount,
            _ => self.balance += amount,
        }
        Ok(())
    }
}

/// 大额取款统计，对超过阈值的取款直接报错
#[derive(Debug, Default, Clone)]
struct LargeWithdrawals {
    count: usize,
}

#[async_trait]
impl ReadModel for LargeWithdrawals {
    fn declarations() -> Vec<EventDeclaration> {
        vec![EventDeclaration::sync("account.withdrawn")]
    }

    async fn apply(&mut self, _context: &ReadModelContext, event: &DomainEvent) -> anyhow::Result<()> {
        let amount = event.payload()["amount"].as_i64().unwrap_or_default();
        if amount > 1_000 {
            anyhow::bail!("withdrawal of {amount} exceeds the projection limit");
        }
        self.count += 1;
        Ok(())
    }
}

struct SkipLargeWithdrawals {
    enabled: AtomicBool,
}

#[async_trait]
impl ReadModelRecoveryHandlerFor<LargeWithdrawals> for SkipLargeWithdrawals {
    async fn recover_from_shutdown(&self, events: &[DomainEvent], _token: &CancellationToken) {
        tracing::info!(events = events.len(), "large withdrawals will be rebuilt on next replay");
    }

    async fn recover_from_error(
        &self,
        events: &[DomainEvent],
        error: &anyhow::Error,
        _token: &CancellationToken,
    ) -> bool {
        let enabled = self.enabled.load(Ordering::SeqCst);
        tracing::info!(events = events.len(), %error, enabled, "skipping large withdrawal projection");
        enabled
    }
}

struct AuditLog;

#[async_trait]
impl SubscribeSynchronousToAll for AuditLog {
    fn subscriber_name(&self) -> &str {
        "audit_log"
    }

    async fn handle(&self, events: &[DomainEvent], _token: &CancellationToken) -> anyhow::Result<()> {
        for event in events {
            println!("audit: {event}");
        }
        Ok(())
    }
}

struct PrintingSubscribers;

#[async_trait]
impl DispatchToEventSubscribers for PrintingSubscribers {
    async fn dispatch_to_synchronous_subscribers(
        &self,
        events: &[DomainEvent],
        _token: &CancellationToken,
    ) -> anyhow::Result<()> {
        println!("synchronous subscribers: {:?}", ddd_domain::domain_event::event_types(events));
        Ok(())
    }

    async fn dispatch_to_asynchronous_subscribers(
        &self,
        event: &DomainEvent,
        _token: &CancellationToken,
    ) -> anyhow::Result<()> {
        println!("asynchronous subscriber: {event}");
        Ok(())
    }
}

struct NoSagas;

#[async_trait]
impl DispatchToSagas for NoSagas {
    async fn process(&self, events: &[DomainEvent], _token: &CancellationToken) -> anyhow::Result<()> {
        tracing::debug!(events = events.len(), "no sagas registered");
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryPublishedMarker {
    published: Mutex<HashSet<String>>,
}

#[async_trait]
impl PublishedMarker for InMemoryPublishedMarker {
    async fn mark_published(&self, events: &[DomainEvent]) -> anyhow::Result<()> {
        let mut published = self.published.lock().unwrap_or_else(PoisonError::into_inner);
        published.extend(events.iter().map(|e| e.event_id().to_string()));
        Ok(())
    }
}

fn account_event(event_type: &str, sequence: usize, amount: i64) -> DomainEvent {
    DomainEvent::builder()
        .event_id(Ulid::new().to_string())
        .event_type(event_type)
        .aggregate_type("account")
        .aggregate_id("acc-1")
        .aggregate_sequence_number(sequence)
        .payload(json!({ "amount": amount }))
        .build()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cancellation: CancellationConfiguration =
        serde_json::from_value(json!({ "boundary": "before_committing_events" }))?;
    let config: PublisherConfig =
        serde_json::from_value(json!({ "asynchronous_subscribers_enabled": true }))?;

    let balances = Arc::new(InMemoryReadStoreManager::<AccountBalance>::new());
    let withdrawals = Arc::new(InMemoryReadStoreManager::<LargeWithdrawals>::new());
    let managers = vec![
        balances.clone() as Arc<dyn ReadStoreManager>,
        withdrawals.clone() as Arc<dyn ReadStoreManager>,
    ];

    let skip = Arc::new(SkipLargeWithdrawals {
        enabled: AtomicBool::new(true),
    });
    let handlers = Arc::new(RecoveryHandlers::default());
    handlers.register_for::<LargeWithdrawals, _>(SharedSkip(skip.clone()));

    let marker = Arc::new(InMemoryPublishedMarker::default());
    let recovery = Arc::new(
        HandlerRecoveryProcessor::builder()
            .handlers(handlers)
            .read_store_managers(managers.clone())
            .marker(marker.clone() as Arc<dyn PublishedMarker>)
            .build(),
    );

    let scheduler = Arc::new(TokioJobScheduler::new());
    let publisher = DomainEventPublisher::builder()
        .recovery(recovery)
        .read_store_managers(managers)
        .subscribers_to_all(vec![Arc::new(AuditLog) as Arc<dyn SubscribeSynchronousToAll>])
        .event_subscribers(Arc::new(PrintingSubscribers) as Arc<dyn DispatchToEventSubscribers>)
        .sagas(Arc::new(NoSagas) as Arc<dyn DispatchToSagas>)
        .job_scheduler(scheduler.clone() as Arc<dyn JobScheduler>)
        .cancellation(Arc::new(cancellation))
        .config(config)
        .build();
    let token = CancellationToken::new();

    // 正常发布
    let opened = vec![
        account_event("account.opened", 1, 1_000),
        account_event("account.deposited", 2, 500),
    ];
    publisher.publish(&opened, &token).await?;

    // 大额取款：读模型失败，但被恢复处理器接受
    let withdrawn = vec![account_event("account.withdrawn", 3, 1_200)];
    publisher.publish(&withdrawn, &token).await?;

    // 关闭恢复后，同样的失败会原样返回
    skip.enabled.store(false, Ordering::SeqCst);
    let withdrawn_again = vec![account_event("account.withdrawn", 4, 2_000)];
    if let Err(err) = publisher.publish(&withdrawn_again, &token).await {
        println!("publication failed: {err}");
    }

    // 模拟进程崩溃后重启：恢复上一批次并标记为已发布
    publisher
        .recover_after_unexpected_shutdown(&withdrawn_again, &token)
        .await?;

    scheduler.join().await;

    if let Some(balance) = balances.get("acc-1").await {
        println!("balance: {}", balance.balance);
    }
    println!(
        "large withdrawals projected: {}",
        withdrawals.get("acc-1").await.map(|m| m.count).unwrap_or_default()
    );
    let published = marker
        .published
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .len();
    println!("published after recovery: {published}");
    Ok(())
}

struct SharedSkip(Arc<SkipLargeWithdrawals>);

#[async_trait]
impl ReadModelRecoveryHandlerFor<LargeWithdrawals> for SharedSkip {
    async fn recover_from_shutdown(&self, events: &[DomainEvent], token: &CancellationToken) {
        self.0.recover_from_shutdown(events, token).await
    }

    async fn recover_from_error(
        &self,
        events: &[DomainEvent],
        error: &anyhow::Error,
        token: &CancellationToken,
    ) -> bool {
        self.0.recover_from_error(events, error, token).await
    }
}
