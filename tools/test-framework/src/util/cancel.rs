/*!
   Cooperative cancellation for long running setup steps.

   A [`CancelToken`] is shared by every Docker operation made while
   bootstrapping a network. Once it is cancelled, a command running in a
   container is abandoned and every following operation fails with
   [`Error::cancelled`].
*/

use core::time::Duration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::warn;

use crate::error::Error;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /**
       Returns [`Error::cancelled`] for the given task if the token has
       been cancelled.
    */
    pub fn check(&self, task: &str) -> Result<(), Error> {
        if self.is_cancelled() {
            Err(Error::cancelled(task.to_string()))
        } else {
            Ok(())
        }
    }

    /// Resolves once the token has been cancelled.
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
        }
    }

    /**
       Cancel the token from a background thread once `timeout` has elapsed,
       unless the returned [`CancelTimer`] was dropped before that. A zero
       timeout cancels the token right away.
    */
    pub fn cancel_after(&self, timeout: Duration) -> CancelTimer {
        let armed = Arc::new(AtomicBool::new(true));

        if timeout.is_zero() {
            warn!("cancelling setup after timeout of {:?}", timeout);
            self.cancel();
            return CancelTimer { armed };
        }

        let token = self.clone();
        let timer_armed = armed.clone();

        thread::spawn(move || {
            thread::sleep(timeout);
            if timer_armed.load(Ordering::SeqCst) && !token.is_cancelled() {
                warn!("cancelling setup after timeout of {:?}", timeout);
                token.cancel();
            }
        });

        CancelTimer { armed }
    }
}

/// Disarms the timer started by [`CancelToken::cancel_after`] when dropped.
#[derive(Debug)]
pub struct CancelTimer {
    armed: Arc<AtomicBool>,
}

impl Drop for CancelTimer {
    fn drop(&mut self) {
        self.armed.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_cancellation() {
        let token = CancelToken::new();
        let other = token.clone();

        assert!(token.check("before").is_ok());

        other.cancel();

        assert!(token.is_cancelled());
        assert!(token.check("after").is_err());
    }

    #[test]
    fn cancels_after_timeout() {
        let token = CancelToken::new();
        let _timer = token.cancel_after(Duration::from_millis(10));

        thread::sleep(Duration::from_millis(200));

        assert!(token.is_cancelled());
    }

    #[test]
    fn waiting_for_cancellation_resolves_after_timeout() -> Result<(), Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let token = CancelToken::new();
        let _timer = token.cancel_after(Duration::from_millis(10));

        runtime.block_on(token.cancelled());

        assert!(token.is_cancelled());

        Ok(())
    }

    #[test]
    fn zero_timeout_cancels_immediately() {
        let token = CancelToken::new();
        let _timer = token.cancel_after(Duration::ZERO);

        assert!(token.check("first step").is_err());
    }

    #[test]
    fn dropped_timer_does_not_cancel() {
        let token = CancelToken::new();
        drop(token.cancel_after(Duration::from_millis(10)));

        thread::sleep(Duration::from_millis(200));

        assert!(!token.is_cancelled());
    }
}
