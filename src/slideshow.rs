//! Timed slideshow over the display list.
//!
//! [`SlideshowController`] wraps a [`SlideCursor`] with an auto-advance
//! timer. Each timer task is tagged with a generation number; manual
//! navigation, `reset_list` and `shutdown` bump the generation under the
//! state lock and abort the previous task, so a stale tick can never move
//! the cursor and at most one timer is live.
//!
//! Must be created inside a tokio runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use govwatch_core::slideshow::{SlideCursor, SlideshowState};
use govwatch_core::Report;

struct Inner {
    list: Vec<Report>,
    cursor: SlideCursor,
    generation: u64,
    timer_active: bool,
}

pub struct SlideshowController {
    inner: Arc<Mutex<Inner>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    interval: Duration,
}

// Nothing in the protected state can be left half-updated by a panic.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SlideshowController {
    pub fn new(list: Vec<Report>, interval: Duration) -> Self {
        let controller = Self {
            inner: Arc::new(Mutex::new(Inner {
                cursor: SlideCursor::new(list.len()),
                list,
                generation: 0,
                timer_active: false,
            })),
            timer: Mutex::new(None),
            interval,
        };
        controller.restart_timer(&mut lock(&controller.inner));
        controller
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Replace the previous timer, if any, with a fresh one.
    fn restart_timer(&self, inner: &mut Inner) {
        inner.generation += 1;
        let generation = inner.generation;
        let mut timer = lock(&self.timer);
        if let Some(handle) = timer.take() {
            handle.abort();
        }

        inner.timer_active = inner.cursor.can_rotate();
        if !inner.timer_active {
            return;
        }

        let state = Arc::clone(&self.inner);
        let period = self.interval;
        *timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let mut inner = lock(&state);
                if inner.generation != generation || !inner.timer_active {
                    break;
                }
                inner.cursor.next();
                debug!(index = inner.cursor.index(), "slideshow advanced");
            }
        }));
    }

    pub fn next(&self) {
        let mut inner = lock(&self.inner);
        inner.cursor.next();
        self.restart_timer(&mut inner);
    }

    pub fn previous(&self) {
        let mut inner = lock(&self.inner);
        inner.cursor.previous();
        self.restart_timer(&mut inner);
    }

    /// Jump to a slide, as when a report is picked from the list.
    pub fn select(&self, index: usize) -> bool {
        let mut inner = lock(&self.inner);
        if !inner.cursor.select(index) {
            return false;
        }
        self.restart_timer(&mut inner);
        true
    }

    /// Show a new list from its first report.
    pub fn reset_list(&self, list: Vec<Report>) {
        let mut inner = lock(&self.inner);
        inner.cursor.reset(list.len());
        inner.list = list;
        self.restart_timer(&mut inner);
    }

    pub fn state(&self) -> SlideshowState {
        let inner = lock(&self.inner);
        SlideshowState {
            index: inner.cursor.index(),
            total: inner.cursor.len(),
            timer_active: inner.timer_active,
        }
    }

    pub fn current(&self) -> Option<Report> {
        let inner = lock(&self.inner);
        inner.list.get(inner.cursor.index()).cloned()
    }

    /// Stop auto-advance. Navigation afterwards restarts it.
    pub fn shutdown(&self) {
        let mut inner = lock(&self.inner);
        inner.generation += 1;
        inner.timer_active = false;
        if let Some(handle) = lock(&self.timer).take() {
            handle.abort();
        }
    }
}

impl Drop for SlideshowController {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.timer).take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn reports(n: usize) -> Vec<Report> {
        (0..n)
            .map(|i| Report {
                title: format!("r{}", i),
                ..Default::default()
            })
            .collect()
    }

    const TICK: Duration = Duration::from_millis(5000);

    #[tokio::test(start_paused = true)]
    async fn test_auto_advance_wraps() {
        let show = SlideshowController::new(reports(3), TICK);
        assert!(show.state().timer_active);
        sleep(TICK + Duration::from_millis(1)).await;
        assert_eq!(show.state().index, 1);
        sleep(TICK * 2).await;
        assert_eq!(show.state().index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_navigation_restarts_timer() {
        let show = SlideshowController::new(reports(3), TICK);
        sleep(Duration::from_millis(4000)).await;
        show.next();
        assert_eq!(show.state().index, 1);

        // The first timer would have fired at 5000 ms.
        sleep(Duration::from_millis(4000)).await;
        assert_eq!(show.state().index, 1);

        sleep(Duration::from_millis(1001)).await;
        assert_eq!(show.state().index, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_report_has_no_timer() {
        let show = SlideshowController::new(reports(1), TICK);
        assert!(!show.state().timer_active);
        show.next();
        show.previous();
        assert_eq!(show.state().index, 0);
        assert_eq!(show.current().unwrap().title, "r0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_list() {
        let show = SlideshowController::new(Vec::new(), TICK);
        show.next();
        let state = show.state();
        assert_eq!((state.index, state.total, state.timer_active), (0, 0, false));
        assert!(show.current().is_none());
        assert_eq!(state.counter(), "0 / 0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_previous_wraps_to_last() {
        let show = SlideshowController::new(reports(4), TICK);
        show.previous();
        assert_eq!(show.state().index, 3);
        assert_eq!(show.current().unwrap().title, "r3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_list_and_shutdown() {
        let show = SlideshowController::new(reports(3), TICK);
        show.next();
        show.reset_list(reports(5));
        assert_eq!(show.state().index, 0);
        assert_eq!(show.state().total, 5);

        show.shutdown();
        assert!(!show.state().timer_active);
        sleep(TICK * 3).await;
        assert_eq!(show.state().index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select() {
        let show = SlideshowController::new(reports(3), TICK);
        assert!(show.select(2));
        assert!(!show.select(3));
        assert_eq!(show.state().counter(), "3 / 3");
    }
}
