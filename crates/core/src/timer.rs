//! One-shot consent timer.
//!
//! The timer owns the spawned task. Dropping or cancelling it aborts the task, so a grant can
//! never fire for a session that has gone away.

use crate::IntakeResult;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
pub struct ConsentTimer {
    handle: JoinHandle<()>,
}

impl ConsentTimer {
    /// Run `on_fire` once, `delay` after this call, on the current tokio runtime.
    ///
    /// The deadline is fixed at call time, not when the task is first polled.
    ///
    /// # Errors
    ///
    /// Returns [`crate::IntakeError::NoRuntime`] when called outside a tokio runtime.
    pub fn start<F>(delay: Duration, on_fire: F) -> IntakeResult<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let runtime = Handle::try_current()?;
        let deadline = Instant::now() + delay;
        tracing::debug!(delay_ms = delay.as_millis() as u64, "consent timer scheduled");

        let handle = runtime.spawn(async move {
            sleep_until(deadline).await;
            on_fire();
        });
        Ok(Self { handle })
    }

    /// Stop the timer. Has no effect once it has fired.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ConsentTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IntakeError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let fired = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&fired);
        (fired, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (fired, on_fire) = counter();
        let timer = ConsentTimer::start(Duration::from_secs(10), on_fire).expect("start");

        tokio::time::advance(Duration::from_millis(9_999)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(timer.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let (fired, on_fire) = counter();
        let timer = ConsentTimer::start(Duration::from_secs(10), on_fire).expect("start");
        timer.cancel();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_timer_never_fires() {
        let (fired, on_fire) = counter();
        drop(ConsentTimer::start(Duration::from_secs(1), on_fire).expect("start"));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn requires_a_runtime() {
        let (_, on_fire) = counter();
        let err = ConsentTimer::start(Duration::from_secs(1), on_fire).expect_err("no runtime");
        assert!(matches!(err, IntakeError::NoRuntime(_)));
    }
}
