use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_RELOADS: u32 = 3;

#[derive(Debug, Error)]
pub enum LoadError<E> {
    #[error("Loading timed out after {attempts} attempts")]
    TimedOut { attempts: u32 },
    #[error(transparent)]
    Failed(E),
}

/// Guards initial loading with a fixed deadline.
///
/// Each attempt builds its state from scratch. When an attempt misses the
/// deadline its future, and everything it owns, is dropped and a fresh
/// attempt starts, up to `max_reloads` reloads after the first try.
#[derive(Debug, Clone, Copy)]
pub struct LoadingWatchdog {
    pub timeout: Duration,
    pub max_reloads: u32,
}

impl Default for LoadingWatchdog {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOAD_TIMEOUT,
            max_reloads: DEFAULT_MAX_RELOADS,
        }
    }
}

impl LoadingWatchdog {
    pub fn new(timeout: Duration, max_reloads: u32) -> Self {
        Self { timeout, max_reloads }
    }

    /// Run `attempt` until it finishes in time. `attempt` receives the 0-based attempt number.
    ///
    /// An error returned by the attempt itself is not retried.
    pub async fn run<T, E, F, Fut>(&self, mut attempt: F) -> Result<T, LoadError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.max_reloads + 1;
        for n in 0..attempts {
            match tokio::time::timeout(self.timeout, attempt(n)).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => return Err(LoadError::Failed(e)),
                Err(_) => {
                    log::warn!(
                        "Initial load missed its {:?} deadline (attempt {}/{}), reloading",
                        self.timeout,
                        n + 1,
                        attempts
                    );
                }
            }
        }
        Err(LoadError::TimedOut { attempts })
    }
}
