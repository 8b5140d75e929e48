//! Cooperative cancellation checked at operator `next()` boundaries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use oxide_sql_types::Error;

/// A cheaply-cloneable flag an embedder can set to stop a running
/// statement. Operators check it at every `next()` boundary and long
/// spill merges check it between merge steps; `close()` still runs on a
/// cancelled operator.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns `Err` once cancellation has been requested; intended to be
    /// called at the top of every `next()` implementation.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            Err(Error::Internal("statement cancelled".into()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_fails_after_cancel() {
        let token = CancellationToken::new();
        assert!(token.check().is_ok());
        token.cancel();
        assert!(token.check().is_err());
    }
}
