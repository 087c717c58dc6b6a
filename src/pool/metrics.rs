//! Usage metrics engine
//!
//! Cumulative counters plus two sliding-window ledgers per pool. Ledgers are
//! pruned synchronously on every write, so their size is bounded by window
//! length times peak request rate; there is no background sweep. Live rate
//! metrics re-filter the ledgers against the current time at read time, so a
//! quiet pool decays to zero without further writes.

use crate::clock::Clock;
use crate::error::PoolError;
use crate::pool::models::{Pool, PoolMetrics, PoolStats, PoolStatsView, TokenUsage, UsageEntry};
use crate::store::PoolStore;
use std::sync::Arc;

/// Horizon of the per-minute ledger, in milliseconds.
pub const MINUTE_WINDOW_MS: i64 = 60_000;

/// Horizon of the per-day ledger, in milliseconds.
pub const DAY_WINDOW_MS: i64 = 86_400_000;

/// Service maintaining pool-level usage stats.
#[derive(Clone)]
pub struct MetricsEngine {
    store: Arc<dyn PoolStore>,
    clock: Arc<dyn Clock>,
}

impl MetricsEngine {
    pub fn new(store: Arc<dyn PoolStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Record one forwarded-request outcome against a pool.
    ///
    /// Increments the cumulative counters, appends a record to both window
    /// ledgers and prunes each ledger to its horizon. A missing pool is a
    /// no-op, never an error.
    pub async fn update_pool_stats(
        &self,
        pool_id: &str,
        success: bool,
        token_usage: Option<TokenUsage>,
    ) -> Result<(), PoolError> {
        let Some(mut pool) = self.store.load_pool(pool_id).await? else {
            tracing::debug!(pool_id = %pool_id, "Stat write for unknown pool skipped");
            return Ok(());
        };

        let now = self.clock.now_ms();
        let stats = &mut pool.stats;

        stats.total_requests += 1;
        if success {
            stats.successful_requests += 1;
        } else {
            stats.failed_requests += 1;
        }

        if let Some(usage) = token_usage {
            stats.total_tokens += usage.total;
            stats.prompt_tokens += usage.prompt;
            stats.completion_tokens += usage.completion;
        }

        stats.last_request_time = Some(now);

        let entry = UsageEntry {
            timestamp: now,
            success,
            tokens: token_usage.map(|u| u.total).unwrap_or(0),
        };
        stats.requests_last_minute.push(entry.clone());
        stats.requests_last_day.push(entry);

        // Prune on write: retain entries strictly newer than the horizon
        stats
            .requests_last_minute
            .retain(|e| e.timestamp > now - MINUTE_WINDOW_MS);
        stats
            .requests_last_day
            .retain(|e| e.timestamp > now - DAY_WINDOW_MS);

        pool.updated_at = now;
        self.store.save_pool(pool_id, &pool).await?;

        Ok(())
    }

    /// Raw stats snapshot for a pool. `None` if the pool does not exist.
    pub async fn get_pool_stats(&self, pool_id: &str) -> Result<Option<PoolStats>, PoolError> {
        Ok(self.store.load_pool(pool_id).await?.map(|p| p.stats))
    }

    /// Pool identity fields combined with live metrics.
    /// `None` if the pool does not exist.
    pub async fn get_pool_stats_with_metrics(
        &self,
        pool_id: &str,
    ) -> Result<Option<PoolStatsView>, PoolError> {
        let Some(pool) = self.store.load_pool(pool_id).await? else {
            return Ok(None);
        };

        let metrics = calculate_pool_metrics(&pool, self.clock.now_ms());

        Ok(Some(PoolStatsView {
            id: pool.id,
            name: pool.name,
            enabled: pool.enabled,
            created_at: pool.created_at,
            last_request_time: pool.stats.last_request_time,
            metrics,
        }))
    }
}

/// Compute live rate metrics for a pool at instant `now_ms`.
///
/// Pure and read-only: the ledgers are re-filtered against `now_ms`, not the
/// time of last write, so records older than the window never count even if
/// pruning has not run since. A pool with default (empty) stats yields an
/// all-zero record.
pub fn calculate_pool_metrics(pool: &Pool, now_ms: i64) -> PoolMetrics {
    let stats = &pool.stats;

    let minute: Vec<&UsageEntry> = stats
        .requests_last_minute
        .iter()
        .filter(|e| e.timestamp > now_ms - MINUTE_WINDOW_MS)
        .collect();
    let day: Vec<&UsageEntry> = stats
        .requests_last_day
        .iter()
        .filter(|e| e.timestamp > now_ms - DAY_WINDOW_MS)
        .collect();

    PoolMetrics {
        rpm: minute.len() as u64,
        rpd: day.len() as u64,
        tpm: minute.iter().map(|e| e.tokens).sum(),
        tpd: day.iter().map(|e| e.tokens).sum(),
        total_tokens: stats.total_tokens,
        prompt_tokens: stats.prompt_tokens,
        completion_tokens: stats.completion_tokens,
    }
}
