// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Cooperative cancellation for analysis runs.
//!
//! The driver polls the flag before each tree and each invocation node.
//! A node that has started is always finished.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation flag shared between the caller and analysis workers.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
