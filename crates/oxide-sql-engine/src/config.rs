//! Engine-wide tunables, constructed with [`Default`] and overridable by
//! the embedder (mirrors how the teacher's admin surface builds its own
//! call-site config struct).

use std::time::Duration;

use oxide_sql_core::ast::IsolationLevel;

/// Memory and concurrency budgets for one executor instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Estimated-byte threshold above which `ExternalSort` and the
    /// spillable hash-aggregation operator spill to temp files.
    pub spill_memory_budget_bytes: usize,
    /// How long row-lock acquisition blocks before raising a lock-timeout
    /// error, for statements that did not request `NOWAIT`/`SKIP LOCKED`.
    pub lock_wait_timeout: Duration,
    /// Isolation level new transactions start under absent an explicit
    /// `SET TRANSACTION`/`BEGIN ... ISOLATION LEVEL ...`.
    pub default_isolation_level: IsolationLevel,
    /// Worker-thread count for `ParallelScan`/`ParallelAggregate`.
    pub parallel_worker_count: usize,
    /// Bound on the work queue feeding parallel operator workers.
    pub parallel_queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            spill_memory_budget_bytes: 64 * 1024 * 1024,
            lock_wait_timeout: Duration::from_secs(50),
            default_isolation_level: IsolationLevel::RepeatableRead,
            parallel_worker_count: 4,
            parallel_queue_capacity: 256,
        }
    }
}
