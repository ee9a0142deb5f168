// SPDX-License-Identifier: Apache-2.0
//! Resource-mediated dependency analysis: `ResourceDependencies` and
//! `AllPipePairs`.

use std::collections::{HashMap, HashSet};

use sysgraph_model::Resource;
use sysgraph_util::Cancel;

use crate::error::QueryError;
use crate::provider::{ActionProvider, ActionResourceProvider};
use crate::traverse::visited_set;

struct ResourceTimes {
    earliest_output: HashMap<String, i64>,
    latest_input: HashMap<String, i64>,
}

fn summarize<P>(provider: &P, id: i64) -> Result<ResourceTimes, QueryError>
where
    P: ActionProvider + ?Sized,
{
    let action = provider.action(id).ok_or(QueryError::ActionNotFound(id))?;
    let earliest_output = action
        .outputs
        .iter()
        .filter_map(|(digest, interactions)| interactions.iter().map(|i| i.timestamp).min().map(|ts| (digest.clone(), ts)))
        .collect();
    let latest_input = action
        .inputs
        .iter()
        .filter_map(|(digest, interactions)| interactions.iter().map(|i| i.timestamp).max().map(|ts| (digest.clone(), ts)))
        .collect();
    Ok(ResourceTimes {
        earliest_output,
        latest_input,
    })
}

/// Build the adjacency `reader_aid -> producer_aid[]` over the transitive
/// closure of `roots`: action A depends on action B iff some resource
/// digest is present in both, with B's earliest output strictly before A's
/// latest input. Self-edges are excluded.
pub fn resource_dependencies<P>(provider: &P, cancel: &Cancel, roots: &[i64]) -> Result<HashMap<i64, Vec<i64>>, QueryError>
where
    P: ActionProvider + ?Sized,
{
    let mut considered: HashSet<i64> = HashSet::new();
    for &root in roots {
        considered.extend(visited_set(provider, root)?);
    }

    let mut summaries = HashMap::with_capacity(considered.len());
    for &id in &considered {
        summaries.insert(id, summarize(provider, id)?);
    }

    let mut adjacency = HashMap::with_capacity(considered.len());
    for &reader_id in &considered {
        if cancel.is_cancelled() {
            return Err(QueryError::Cancelled);
        }
        let reader = &summaries[&reader_id];
        let mut producers: Vec<i64> = considered
            .iter()
            .copied()
            .filter(|&producer_id| {
                if producer_id == reader_id {
                    return false;
                }
                let producer = &summaries[&producer_id];
                reader.latest_input.iter().any(|(digest, &latest_in)| {
                    producer
                        .earliest_output
                        .get(digest)
                        .is_some_and(|&earliest_out| earliest_out < latest_in)
                })
            })
            .collect();
        producers.sort_unstable();
        adjacency.insert(reader_id, producers);
    }
    Ok(adjacency)
}

/// Among the children of `parent`, pair the unique `Pipe` resource used as
/// input by one child with the same resource used as output by another;
/// returns `reader_id -> writer_id`.
pub fn all_pipe_pairs<P>(provider: &P, parent: i64) -> Result<HashMap<i64, i64>, QueryError>
where
    P: ActionResourceProvider + ?Sized,
{
    let parent_action = provider.action(parent).ok_or(QueryError::ActionNotFound(parent))?;
    let mut writer_of: HashMap<String, i64> = HashMap::new();
    let mut reader_of: HashMap<String, i64> = HashMap::new();

    for &child_id in parent_action.children.keys() {
        let child = provider.action(child_id).ok_or(QueryError::ActionNotFound(child_id))?;
        for digest_key in child.outputs.keys() {
            if matches!(provider.resource(digest_key), Some(Resource::Pipe { .. })) {
                writer_of.insert(digest_key.clone(), child_id);
            }
        }
        for digest_key in child.inputs.keys() {
            if matches!(provider.resource(digest_key), Some(Resource::Pipe { .. })) {
                reader_of.insert(digest_key.clone(), child_id);
            }
        }
    }

    Ok(reader_of
        .into_iter()
        .filter_map(|(digest, reader_id)| writer_of.get(&digest).map(|&writer_id| (reader_id, writer_id)))
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sysgraph_model::{Action, ActionInteraction, IoInfo, ResourceInteraction, StdIoDup};

    struct FakeProvider {
        actions: HashMap<i64, Action>,
        resources: HashMap<String, Resource>,
    }

    impl ActionProvider for FakeProvider {
        fn action_ids(&self) -> Vec<i64> {
            self.actions.keys().copied().collect()
        }
        fn action(&self, id: i64) -> Option<Action> {
            self.actions.get(&id).cloned()
        }
        fn entry_point_action_ids(&self) -> Vec<i64> {
            self.actions
                .values()
                .filter(|a| a.parent_action_id.is_none())
                .map(|a| a.id)
                .collect()
        }
    }

    impl ActionResourceProvider for FakeProvider {
        fn resource(&self, digest_key: &str) -> Option<Resource> {
            self.resources.get(digest_key).cloned()
        }
    }

    #[test]
    fn reader_depends_on_earlier_writer() {
        let mut writer = Action::new(1, "g1");
        writer.outputs.insert(
            "d1".to_string(),
            vec![ResourceInteraction {
                timestamp: 10,
                io_info: Some(IoInfo { bytes_used: 1 }),
            }],
        );
        let mut reader = Action::new(2, "g1");
        reader.inputs.insert(
            "d1".to_string(),
            vec![ResourceInteraction {
                timestamp: 20,
                io_info: Some(IoInfo { bytes_used: 1 }),
            }],
        );
        let provider = FakeProvider {
            actions: HashMap::from([(1, writer), (2, reader)]),
            resources: HashMap::new(),
        };

        let deps = resource_dependencies(&provider, &Cancel::new(), &[1, 2]).unwrap();
        assert_eq!(deps[&2], vec![1]);
        assert!(deps[&1].is_empty());
    }

    #[test]
    fn pipe_pairs_match_reader_to_writer() {
        let pipe = Resource::Pipe {
            read_end: StdIoDup { old_fd: 3, new_fd: 0 },
            read_exec_id: "r".into(),
            write_end: StdIoDup { old_fd: 4, new_fd: 1 },
            write_exec_id: "w".into(),
        };
        let digest_key = pipe.digest().canonical();

        let mut parent = Action::new(1, "g1");
        parent.children.insert(2, ActionInteraction { timestamp: 0 });
        parent.children.insert(3, ActionInteraction { timestamp: 0 });

        let mut writer = Action::new(2, "g1");
        writer.outputs.insert(digest_key.clone(), vec![]);
        let mut reader = Action::new(3, "g1");
        reader.inputs.insert(digest_key.clone(), vec![]);

        let provider = FakeProvider {
            actions: HashMap::from([(1, parent), (2, writer), (3, reader)]),
            resources: HashMap::from([(digest_key, pipe)]),
        };

        let pairs = all_pipe_pairs(&provider, 1).unwrap();
        assert_eq!(pairs.get(&3), Some(&2));
    }
}
