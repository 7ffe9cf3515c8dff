//! Repricing control loop.
//!
//! A timer-driven scheduler that fans out over eligible owners and their
//! items, runs the recommender and the safety gate per item, applies approved
//! changes through the catalog store and keeps process-wide statistics.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::{watch, Mutex, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::{RepricerConfig, SchedulerCfg};
use crate::domain::catalog::{CatalogStore, Item, Owner, PriceChange, PriceChangeReason};
use crate::domain::notification::PriceChangeNotifier;
use crate::domain::pricing::{PriceRecommender, SafetyGate};
use crate::shared::errors::{AppError, NotificationError, RepricingError, StoreError};
use crate::shared::types::{Money, OwnerId};
use super::run_stats::{RunResult, RunStats};

/// What happened to one item during a pass
#[derive(Debug)]
enum ItemOutcome {
    /// No competitor data or a non-positive candidate
    NoRecommendation,
    /// Candidate within the update threshold
    Steady,
    Rejected,
    Updated { notification: Option<JoinHandle<()>> },
}

/// Counters gathered while a pass runs
#[derive(Debug, Default)]
struct PassTally {
    updated: u64,
    errors: u64,
    rejected: u64,
    unchanged: u64,
    notifications: Vec<JoinHandle<()>>,
}

impl PassTally {
    fn failed(errors: u64) -> Self {
        Self {
            errors,
            ..Self::default()
        }
    }

    fn merge(&mut self, other: PassTally) {
        self.updated += other.updated;
        self.errors += other.errors;
        self.rejected += other.rejected;
        self.unchanged += other.unchanged;
        self.notifications.extend(other.notifications);
    }
}

/// Clears the single-pass flag even if the pass future is dropped
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct TimerState {
    interval: Duration,
    /// Stop signal of the running timer task
    handle: Option<watch::Sender<bool>>,
}

struct SchedulerInner {
    store: Arc<dyn CatalogStore>,
    notifier: Arc<dyn PriceChangeNotifier>,
    settings: SchedulerCfg,
    recommender: PriceRecommender,
    gate: SafetyGate,
    store_permits: Semaphore,
    stats: RwLock<RunStats>,
    pass_flag: AtomicBool,
    timer: Mutex<TimerState>,
}

/// Automatic repricing scheduler. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct RepricingScheduler {
    inner: Arc<SchedulerInner>,
}

impl RepricingScheduler {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        notifier: Arc<dyn PriceChangeNotifier>,
        config: &RepricerConfig,
    ) -> Result<Self, AppError> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(SchedulerInner {
                store,
                notifier,
                settings: config.scheduler.clone(),
                recommender: PriceRecommender::new(config.strategy.clone()),
                gate: SafetyGate::new(config.safety.clone()),
                store_permits: Semaphore::new(config.scheduler.store_concurrency),
                stats: RwLock::new(RunStats::default()),
                pass_flag: AtomicBool::new(false),
                timer: Mutex::new(TimerState {
                    interval: config.scheduler.interval(),
                    handle: None,
                }),
            }),
        })
    }

    /// Starts periodic execution. The first pass fires immediately.
    ///
    /// Calling this while already running only logs a warning.
    pub async fn start(&self, interval: Duration) -> Result<(), AppError> {
        if interval.is_zero() {
            return Err(AppError::ConfigError("interval must be positive".into()));
        }
        let mut timer = self.inner.timer.lock().await;
        if timer.handle.is_some() {
            warn!("⚠️ Repricing scheduler already running, ignoring start");
            return Ok(());
        }
        self.start_locked(&mut timer, interval).await;
        Ok(())
    }

    /// Cancels future ticks. A pass already in flight runs to completion.
    pub async fn stop(&self) {
        let mut timer = self.inner.timer.lock().await;
        if timer.handle.is_none() {
            debug!("Repricing scheduler not running, nothing to stop");
            return;
        }
        self.stop_locked(&mut timer).await;
    }

    /// Changes the cadence. A running scheduler is stopped and restarted,
    /// which fires a pass immediately.
    pub async fn set_interval(&self, interval: Duration) -> Result<(), AppError> {
        if interval.is_zero() {
            return Err(AppError::ConfigError("interval must be positive".into()));
        }
        let mut timer = self.inner.timer.lock().await;
        if timer.handle.is_some() {
            self.stop_locked(&mut timer).await;
            self.start_locked(&mut timer, interval).await;
        } else {
            timer.interval = interval;
        }
        Ok(())
    }

    /// Interval used by the current or next scheduled run
    pub async fn interval(&self) -> Duration {
        self.inner.timer.lock().await.interval
    }

    /// Runs one pass now, optionally scoped to one owner.
    ///
    /// Returns a busy result if another pass is in flight.
    pub async fn run_once(&self, owner_id: Option<&str>) -> RunResult {
        self.inner.run_pass(owner_id).await
    }

    /// Snapshot of the statistics, safe to call during a pass
    pub async fn stats(&self) -> RunStats {
        let mut stats = self.inner.stats.read().await.clone();
        stats.pass_in_progress = self.inner.pass_flag.load(Ordering::Acquire);
        stats
    }

    async fn start_locked(&self, timer: &mut TimerState, interval: Duration) {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                if *stop_rx.borrow() {
                    break;
                }
                let result = inner.run_pass(None).await;
                if result.busy {
                    debug!("Scheduled tick skipped, pass already in progress");
                }
            }
            debug!("Repricing timer exited");
        });

        timer.interval = interval;
        timer.handle = Some(stop_tx);
        self.inner.stats.write().await.running = true;
        info!(interval_secs = interval.as_secs_f64(), "🚀 Repricing scheduler started");
    }

    async fn stop_locked(&self, timer: &mut TimerState) {
        if let Some(stop_tx) = timer.handle.take() {
            // The timer only checks the signal between passes
            if stop_tx.send(true).is_err() {
                debug!("Repricing timer already exited");
            }
        }
        self.inner.stats.write().await.running = false;
        info!("🛑 Repricing scheduler stopped");
    }
}

impl SchedulerInner {
    async fn run_pass(self: &Arc<Self>, owner_scope: Option<&str>) -> RunResult {
        let Some(_guard) = PassGuard::acquire(&self.pass_flag) else {
            warn!("⏳ Repricing pass already in progress, not starting another");
            return RunResult::busy();
        };

        let started = Instant::now();
        let tally = self.execute_pass(owner_scope).await;

        for handle in tally.notifications {
            if let Err(e) = handle.await {
                warn!(error = %e, "Notification task did not complete");
            }
        }

        let result = RunResult {
            updated: tally.updated,
            errors: tally.errors,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            busy: false,
        };
        self.stats.write().await.record_pass(&result, Utc::now());

        info!(
            updated = result.updated,
            errors = result.errors,
            rejected = tally.rejected,
            unchanged = tally.unchanged,
            duration_ms = result.duration_ms,
            "✅ Repricing pass finished"
        );
        result
    }

    async fn execute_pass(self: &Arc<Self>, owner_scope: Option<&str>) -> PassTally {
        let owners = match self.with_permit(self.store.find_eligible_owners()).await {
            Ok(owners) => owners,
            Err(e) => {
                error!(error = %e, "❌ Could not load eligible owners, aborting pass");
                return PassTally::failed(1);
            }
        };

        let owners: Vec<Owner> = match owner_scope {
            Some(owner_id) => {
                let scoped: Vec<Owner> = owners.into_iter().filter(|o| o.id == owner_id).collect();
                if scoped.is_empty() {
                    info!(owner_id, "Owner is not eligible for automatic pricing");
                }
                scoped
            }
            None => owners,
        };
        info!(owners = owners.len(), "🔄 Repricing pass started");

        // Each owner runs on its own task so a panic stays scoped to that owner
        let mut pending = owners.into_iter();
        let mut in_flight = FuturesUnordered::new();
        let mut tally = PassTally::default();
        loop {
            while in_flight.len() < self.settings.owner_concurrency {
                let Some(owner) = pending.next() else { break };
                let inner = Arc::clone(self);
                let owner_id = owner.id.clone();
                let task = tokio::spawn(async move { inner.process_owner(owner).await });
                in_flight.push(async move { (owner_id, task.await) });
            }
            let Some((owner_id, joined)) = in_flight.next().await else { break };
            match joined {
                Ok(owner_tally) => tally.merge(owner_tally),
                // Item panics are caught per item, so this only fires when the
                // owner's own code fails; its committed items are not counted
                Err(e) => {
                    let err = RepricingError::Concurrency(e.to_string());
                    warn!(owner_id = %owner_id, error = %err, "⚠️ Owner worker failed");
                    tally.errors += 1;
                }
            }
        }
        tally
    }

    async fn process_owner(&self, owner: Owner) -> PassTally {
        let items = match self
            .with_permit(self.store.find_eligible_items(&owner.id, self.settings.page_size))
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(owner_id = %owner.id, error = %e, "⚠️ Could not load items for owner");
                return PassTally::failed(1);
            }
        };
        debug!(owner_id = %owner.id, items = items.len(), "Processing owner");

        let mut pending = items.into_iter();
        let mut in_flight = FuturesUnordered::new();
        let mut tally = PassTally::default();
        loop {
            while in_flight.len() < self.settings.item_concurrency {
                let Some(item) = pending.next() else { break };
                in_flight.push(self.process_item(&owner, item));
            }
            let Some(outcome) = in_flight.next().await else { break };
            match outcome {
                Ok(ItemOutcome::Updated { notification }) => {
                    tally.updated += 1;
                    tally.notifications.extend(notification);
                }
                Ok(ItemOutcome::Rejected) => tally.rejected += 1,
                Ok(ItemOutcome::Steady) | Ok(ItemOutcome::NoRecommendation) => tally.unchanged += 1,
                Err(_) => tally.errors += 1,
            }
        }
        tally
    }

    /// Reprices one item; errors and panics stay scoped to that item
    async fn process_item(&self, owner: &Owner, item: Item) -> Result<ItemOutcome, RepricingError> {
        let repriced = FutureExt::catch_unwind(AssertUnwindSafe(self.reprice_item(owner, &item)))
            .await
            .unwrap_or_else(|panic| Err(RepricingError::Panicked(panic_message(panic.as_ref()))));

        repriced.map_err(|e| {
            warn!(owner_id = %owner.id, item_id = %item.id, error = %e, "⚠️ Failed to reprice item");
            e
        })
    }

    async fn reprice_item(&self, owner: &Owner, item: &Item) -> Result<ItemOutcome, RepricingError> {
        let observations = self.with_permit(self.store.fetch_observations(&item.id)).await?;

        let recommendation = self.recommender.recommend(item, &observations);
        let Some(candidate) = recommendation.actionable_price() else {
            debug!(item_id = %item.id, observations = observations.len(), "No usable recommendation");
            return Ok(ItemOutcome::NoRecommendation);
        };
        self.with_permit(self.store.record_recommendation(&item.id, candidate))
            .await?;

        if !self.gate.thresholds().needs_update(item.current_price, candidate) {
            debug!(item_id = %item.id, current = %item.current_price, %candidate, "Price is steady");
            return Ok(ItemOutcome::Steady);
        }

        if let Err(rejection) = self.gate.evaluate(item, candidate) {
            debug!(item_id = %item.id, %candidate, %rejection, "🛡️ Candidate rejected by safety gate");
            return Ok(ItemOutcome::Rejected);
        }

        let change = PriceChange {
            item_id: item.id.clone(),
            old_price: item.current_price,
            new_price: candidate,
            reason: PriceChangeReason::AutomaticOptimization,
            changed_by: self.settings.changed_by.clone(),
        };
        let entry = self.with_permit(self.store.apply_price_change(&change)).await?;
        info!(
            owner_id = %owner.id,
            item_id = %item.id,
            old_price = %entry.old_price,
            new_price = %entry.new_price,
            strategy = %item.strategy,
            "💰 Price updated"
        );

        let notification = owner.notify_on_price_change.then(|| {
            let mut repriced = item.clone();
            repriced.current_price = entry.new_price;
            self.dispatch_notification(owner.id.clone(), repriced, entry.old_price, entry.new_price)
        });

        Ok(ItemOutcome::Updated { notification })
    }

    /// Sends the notice on its own task; failures are logged and dropped
    fn dispatch_notification(
        &self,
        owner_id: OwnerId,
        item: Item,
        old_price: Money,
        new_price: Money,
    ) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.settings.notify_timeout();

        tokio::spawn(async move {
            let sent = tokio::time::timeout(
                timeout,
                notifier.notify_price_change(&owner_id, &item, old_price, new_price),
            )
            .await
            .unwrap_or_else(|_| {
                Err(NotificationError::Timeout(
                    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                ))
            });

            if let Err(e) = sent {
                warn!(owner_id = %owner_id, item_id = %item.id, error = %e, "📭 Price change notification failed");
            }
        })
    }

    async fn with_permit<T, F>(&self, call: F) -> Result<T, RepricingError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let _permit = self.store_permits.acquire().await?;
        Ok(call.await?)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
