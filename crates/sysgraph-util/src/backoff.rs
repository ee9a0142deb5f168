// SPDX-License-Identifier: Apache-2.0
//! A single ticking thread fanned out to N subscribers, with a runtime-
//! mutable period.
//!
//! Mirrors `echo-sched::Scheduler`'s tick-loop shape, generalized to a
//! multi-consumer fan-out and a period mutable at runtime instead of a fixed
//! `tokio::time::interval`.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Single producer of ticks, multiplexed to any number of subscriber
/// channels. Each subscriber channel is bounded at capacity 1, so a slow
/// subscriber only ever misses ticks — it never blocks the producer.
pub struct BackoffLimiter {
    period: Arc<Mutex<Duration>>,
    subscribers: Arc<Mutex<Vec<SyncSender<()>>>>,
    stop: Arc<Mutex<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl BackoffLimiter {
    /// Start the ticking thread at the given initial period.
    pub fn start(initial_period: Duration) -> Self {
        let period = Arc::new(Mutex::new(initial_period));
        let subscribers: Arc<Mutex<Vec<SyncSender<()>>>> = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(Mutex::new(false));

        let thread_period = Arc::clone(&period);
        let thread_subscribers = Arc::clone(&subscribers);
        let thread_stop = Arc::clone(&stop);
        let handle = std::thread::spawn(move || loop {
            let sleep_for = *thread_period
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            std::thread::sleep(sleep_for);
            if *thread_stop
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
            {
                return;
            }
            let subs = thread_subscribers
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            for sub in subs.iter() {
                // Bounded at 1: a slow subscriber simply misses this tick.
                let _ = sub.try_send(());
            }
        });

        Self {
            period,
            subscribers,
            stop,
            handle: Some(handle),
        }
    }

    /// Change the tick period. Takes effect starting with the next tick.
    pub fn set_period(&self, period: Duration) {
        *self
            .period
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = period;
    }

    /// Register a new subscriber; returns a receiver that yields `()` once
    /// per tick it didn't miss.
    pub fn subscribe(&self) -> Receiver<()> {
        let (tx, rx) = mpsc::sync_channel(1);
        self.subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Stop the ticking thread. Blocks until it has exited.
    pub fn stop(mut self) {
        *self
            .stop
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = true;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for BackoffLimiter {
    fn drop(&mut self) {
        *self
            .stop
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = true;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_receives_ticks() {
        let limiter = BackoffLimiter::start(Duration::from_millis(5));
        let rx = limiter.subscribe();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        limiter.stop();
    }

    #[test]
    fn set_period_does_not_panic() {
        let limiter = BackoffLimiter::start(Duration::from_millis(50));
        limiter.set_period(Duration::from_millis(5));
        let rx = limiter.subscribe();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        limiter.stop();
    }
}
