// SPDX-License-Identifier: Apache-2.0
//! In-memory IR store: a `Mutex`-guarded map of `action_id -> events`.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Mutex;

use crate::error::IrError;
use crate::event::Event;
use crate::store::{IrStore, RawEventChannels};

/// In-memory IR store, safe under concurrent writers.
///
/// Mirrors `echo-cas::MemoryTier`'s shape: a plain `HashMap` behind a single
/// lock, good enough for test fixtures and small builds; no eviction, no
/// byte budget (the IR store has no such concept in the spec).
#[derive(Default)]
pub struct MemoryIrStore {
    events: Mutex<HashMap<String, Vec<Event>>>,
    raw_events: Mutex<HashMap<String, Vec<Vec<u8>>>>,
}

impl MemoryIrStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IrStore for MemoryIrStore {
    fn write_events(&self, events: &[Event]) -> Result<usize, IrError> {
        let mut guard = self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut bytes_written = 0usize;
        for event in events {
            bytes_written += bincode::serialize(event)
                .map(|b| b.len())
                .unwrap_or(0);
            guard
                .entry(event.action_id.clone())
                .or_default()
                .push(event.clone());
        }
        Ok(bytes_written)
    }

    fn write_raw_events(&self, action_id: &str, raw: &[Vec<u8>]) -> Result<usize, IrError> {
        let mut guard = self.raw_events.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let bytes_written: usize = raw.iter().map(Vec::len).sum();
        guard
            .entry(action_id.to_string())
            .or_default()
            .extend(raw.iter().cloned());
        Ok(bytes_written)
    }

    fn actions(&self) -> Result<Vec<String>, IrError> {
        let guard = self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(guard.keys().cloned().collect())
    }

    fn events(&self, action_id: &str) -> Result<Vec<Event>, IrError> {
        let guard = self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut events = guard
            .get(action_id)
            .cloned()
            .ok_or_else(|| IrError::UnknownAction(action_id.to_string()))?;
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    fn raw_events(&self, action_id: &str) -> Result<Option<RawEventChannels>, IrError> {
        let guard = self.raw_events.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(records) = guard.get(action_id) else {
            return Ok(None);
        };
        let (data_tx, data_rx) = mpsc::channel();
        let (_err_tx, err_rx) = mpsc::channel();
        for record in records {
            // The in-memory backend never fails to deliver a record it
            // already holds, so the send can only fail if the receiver was
            // dropped — in which case dropping the remaining records is
            // correct (the caller stopped listening).
            if data_tx.send(record.clone()).is_err() {
                break;
            }
        }
        Ok(Some(RawEventChannels {
            data: data_rx,
            errors: err_rx,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::event::EventPayload;

    #[test]
    fn actions_returns_all_written_ids() {
        let store = MemoryIrStore::new();
        store
            .write_events(&[Event::new("a", 1, EventPayload::Start)])
            .unwrap();
        store
            .write_events(&[Event::new("b", 2, EventPayload::Start)])
            .unwrap();
        let mut ids = store.actions().unwrap();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn events_are_sorted_by_timestamp_on_read() {
        let store = MemoryIrStore::new();
        store
            .write_events(&[
                Event::new(
                    "a",
                    5,
                    EventPayload::End {
                        exit_status: 0,
                        exit_signal: String::new(),
                    },
                ),
                Event::new("a", 1, EventPayload::Start),
            ])
            .unwrap();
        let events = store.events("a").unwrap();
        assert_eq!(events[0].timestamp, 1);
        assert_eq!(events[1].timestamp, 5);
    }

    #[test]
    fn events_on_unknown_action_is_error() {
        let store = MemoryIrStore::new();
        let err = store.events("nope").unwrap_err();
        assert!(matches!(err, IrError::UnknownAction(_)));
    }

    #[test]
    fn raw_events_absent_is_none_not_empty() {
        let store = MemoryIrStore::new();
        assert!(store.raw_events("a").unwrap().is_none());
    }

    #[test]
    fn raw_events_present_drains_to_data_channel() {
        let store = MemoryIrStore::new();
        store.write_raw_events("a", &[vec![1, 2, 3]]).unwrap();
        let channels = store.raw_events("a").unwrap().unwrap();
        let got: Vec<_> = channels.data.iter().collect();
        assert_eq!(got, vec![vec![1u8, 2, 3]]);
        assert!(channels.errors.try_recv().is_err());
    }
}
