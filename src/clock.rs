//! Time sources
//!
//! Reply deadlines use tokio's monotonic `Instant` so that tests running on a
//! paused runtime see virtual time. Message timestamps use local wall time.

use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::time::Instant;

/// Source of both monotonic and wall-clock time
pub trait Clock: Send + Sync {
    /// Monotonic instant used for reply deadlines
    fn now(&self) -> Instant;

    /// Wall-clock time used for message timestamps
    fn local_time(&self) -> DateTime<Local>;
}

/// Clock backed by tokio's timer and the system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn local_time(&self) -> DateTime<Local> {
        Local::now()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn local_time(&self) -> DateTime<Local> {
        (**self).local_time()
    }
}
