// SPDX-License-Identifier: Apache-2.0
//! Coalesce concurrent identical-key calls into a single execution.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Condvar, Mutex};

enum Outcome<V, E> {
    Pending,
    Done(Result<V, E>),
}

struct Call<V, E> {
    state: Mutex<Outcome<V, E>>,
    done: Condvar,
}

/// Collapses concurrent callers requesting the same key into one execution
/// of the underlying function.
///
/// The first caller for a given key becomes the "leader" and runs `f`;
/// concurrent callers for the same key block on the leader's result instead
/// of re-running `f`. Once the leader finishes, the key is forgotten, so a
/// later call (e.g. a retry after cancellation) starts a fresh execution —
/// matching the on-disk action cache's "single-flight with retry on
/// cancellation" requirement.
pub struct SingleFlight<K, V, E> {
    inflight: Mutex<HashMap<K, Arc<Call<V, E>>>>,
}

impl<K, V, E> Default for SingleFlight<K, V, E>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    /// An empty coalescer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute `f` for `key`, or wait for a concurrent execution already in
    /// flight for the same key to complete and clone its result.
    pub fn execute<F>(&self, key: K, f: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let (call, is_leader) = {
            let mut guard = self
                .inflight
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(existing) = guard.get(&key) {
                (Arc::clone(existing), false)
            } else {
                let call = Arc::new(Call {
                    state: Mutex::new(Outcome::Pending),
                    done: Condvar::new(),
                });
                guard.insert(key.clone(), Arc::clone(&call));
                (call, true)
            }
        };

        if is_leader {
            let result = f();
            {
                let mut state = call
                    .state
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                *state = Outcome::Done(result.clone());
            }
            call.done.notify_all();
            self.inflight
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .remove(&key);
            result
        } else {
            let mut state = call
                .state
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            loop {
                match &*state {
                    Outcome::Done(result) => return result.clone(),
                    Outcome::Pending => {
                        state = call
                            .done
                            .wait(state)
                            .unwrap_or_else(std::sync::PoisonError::into_inner);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn concurrent_callers_share_one_execution() {
        let sf: Arc<SingleFlight<&'static str, i32, String>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sf = Arc::clone(&sf);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    sf.execute("k", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(20));
                        Ok::<_, String>(42)
                    })
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn key_is_forgotten_after_completion() {
        let sf: SingleFlight<&'static str, i32, String> = SingleFlight::new();
        let first = sf.execute("k", || Ok::<_, String>(1));
        let second = sf.execute("k", || Ok::<_, String>(2));
        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(2));
    }

    #[test]
    fn errors_are_shared_too() {
        let sf: SingleFlight<&'static str, i32, String> = SingleFlight::new();
        let result = sf.execute("k", || Err::<i32, _>("boom".to_string()));
        assert_eq!(result, Err("boom".to_string()));
    }
}
