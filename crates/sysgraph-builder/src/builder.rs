// SPDX-License-Identifier: Apache-2.0
//! The five-phase graph builder: ID assignment, parallel parent/pipe scan,
//! risky-pipe detection, action assembly, finalize.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use rayon::prelude::*;
use sysgraph_ir::{EventPayload, IoDirection, IrStore};
use sysgraph_model::{
    Action, ActionInteraction, ExecInfo, Resource, ResourceDb, ResourceInteraction, StdIoDup,
    SysGraphHeader,
};
use sysgraph_util::Cancel;
use tracing::instrument;

use crate::error::BuildError;
use crate::types::{BuildConcurrency, BuildOptions, BuiltGraph};

struct ParentLink {
    parent_action_id: String,
    timestamp: i64,
}

#[derive(Clone)]
struct DupRecord {
    dup_exec_id: String,
    timestamp: i64,
    old_fd: i32,
    new_fd: i32,
}

#[derive(Default)]
struct ScanResult {
    parents: HashMap<String, ParentLink>,
    pipe_actions: HashSet<String>,
    dup_actions: HashMap<String, Vec<DupRecord>>,
}

enum PipeEdgeDirection {
    Input,
    Output,
}

struct PipeEdge {
    digest_key: String,
    timestamp: i64,
    direction: PipeEdgeDirection,
}

/// Compile `ir`'s full event stream into a [`BuiltGraph`] tagged with
/// `sysgraph_id`.
#[instrument(skip(ir, cancel))]
pub fn build<S: IrStore>(
    ir: &S,
    sysgraph_id: &str,
    concurrency: BuildConcurrency,
    options: BuildOptions,
    cancel: &Cancel,
) -> Result<BuiltGraph, BuildError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency.threads.max(1))
        .build()
        .map_err(|e| BuildError::ThreadPoolInit(e.to_string()))?;

    // Phase 1 — ID assignment: sort IR action ids lexicographically, assign
    // dense ids 1..N.
    let mut original_ids = ir.actions()?;
    original_ids.sort();
    let dense_id_of: HashMap<String, i64> = original_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), i as i64 + 1))
        .collect();

    if cancel.is_cancelled() {
        return Err(BuildError::Cancelled);
    }

    // Phase 2 — parallel parent/pipe scan.
    let scans: Vec<Result<(String, ScanResult), BuildError>> = pool.install(|| {
        original_ids
            .par_iter()
            .map(|action_id| scan_one(ir, action_id, cancel))
            .collect()
    });

    let mut parents: HashMap<String, ParentLink> = HashMap::new();
    let mut pipe_actions: HashSet<String> = HashSet::new();
    let mut dup_actions: HashMap<String, Vec<DupRecord>> = HashMap::new();
    for scan in scans {
        let (_, partial) = scan?;
        parents.extend(partial.parents);
        pipe_actions.extend(partial.pipe_actions);
        for (parent, mut dups) in partial.dup_actions {
            dup_actions.entry(parent).or_default().append(&mut dups);
        }
    }

    if cancel.is_cancelled() {
        return Err(BuildError::Cancelled);
    }

    // Phase 3 — risky-pipe detection.
    let mut rdb = ResourceDb::new();
    let mut risky_pipe_parents: HashSet<String> = HashSet::new();
    let mut pipe_edges: HashMap<String, Vec<PipeEdge>> = HashMap::new();

    for (parent_id, dups) in &dup_actions {
        if !pipe_actions.contains(parent_id) || dups.len() < 2 {
            continue;
        }
        let mut sorted = dups.clone();
        sorted.sort_by_key(|d| d.timestamp);

        let mut writer_candidate: Option<DupRecord> = None;
        for dup in &sorted {
            match dup.new_fd {
                1 => writer_candidate = Some(dup.clone()),
                0 => {
                    if let Some(writer) = &writer_candidate {
                        if writer.dup_exec_id != dup.dup_exec_id {
                            let resource = Resource::Pipe {
                                read_end: StdIoDup {
                                    old_fd: dup.old_fd,
                                    new_fd: dup.new_fd,
                                },
                                read_exec_id: dup.dup_exec_id.clone(),
                                write_end: StdIoDup {
                                    old_fd: writer.old_fd,
                                    new_fd: writer.new_fd,
                                },
                                write_exec_id: writer.dup_exec_id.clone(),
                            };
                            let digest_key = rdb.insert(resource);
                            pipe_edges.entry(writer.dup_exec_id.clone()).or_default().push(
                                PipeEdge {
                                    digest_key: digest_key.clone(),
                                    timestamp: writer.timestamp,
                                    direction: PipeEdgeDirection::Output,
                                },
                            );
                            pipe_edges.entry(dup.dup_exec_id.clone()).or_default().push(PipeEdge {
                                digest_key,
                                timestamp: dup.timestamp,
                                direction: PipeEdgeDirection::Input,
                            });
                            risky_pipe_parents.insert(parent_id.clone());
                            writer_candidate = None;
                        }
                    }
                }
                other => {
                    return Err(BuildError::InvalidDupFd {
                        action_id: parent_id.clone(),
                        new_fd: other,
                    });
                }
            }
        }
    }

    if cancel.is_cancelled() {
        return Err(BuildError::Cancelled);
    }

    // Invert `parents` into a per-parent children list for phase 4.
    let mut children_of: HashMap<String, Vec<(String, i64)>> = HashMap::new();
    for (child_id, link) in &parents {
        children_of
            .entry(link.parent_action_id.clone())
            .or_default()
            .push((child_id.clone(), link.timestamp));
    }

    // Phase 4 — action assembly (parallel).
    let rdb_mutex = Mutex::new(rdb);
    let actions: Vec<Result<Action, BuildError>> = pool.install(|| {
        original_ids
            .par_iter()
            .map(|action_id| {
                assemble_one(
                    ir,
                    action_id,
                    sysgraph_id,
                    &dense_id_of,
                    &parents,
                    &children_of,
                    &pipe_edges,
                    &risky_pipe_parents,
                    &rdb_mutex,
                    cancel,
                )
            })
            .collect()
    });
    let actions: Vec<Action> = actions.into_iter().collect::<Result<_, _>>()?;
    let rdb = rdb_mutex.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner);

    if cancel.is_cancelled() {
        return Err(BuildError::Cancelled);
    }

    // Phase 5 — finalize.
    let mut entry_point_action_ids: Vec<i64> = actions
        .iter()
        .filter(|a| a.parent_action_id.is_none())
        .map(|a| a.id)
        .collect();
    entry_point_action_ids.sort_unstable();

    let mut header = SysGraphHeader::new(sysgraph_id);
    header.entry_point_action_ids = entry_point_action_ids;

    let raw_events = if options.forward_raw_events {
        collect_raw_events(ir, &original_ids, &dense_id_of, cancel)?
    } else {
        HashMap::new()
    };

    Ok(BuiltGraph {
        header,
        rdb,
        actions,
        original_ids,
        raw_events,
    })
}

/// Forward each action's raw pass-through records unchanged, keyed by dense
/// id, for a caller to persist alongside the assembled graph.
fn collect_raw_events<S: IrStore>(
    ir: &S,
    original_ids: &[String],
    dense_id_of: &HashMap<String, i64>,
    cancel: &Cancel,
) -> Result<HashMap<i64, Vec<Vec<u8>>>, BuildError> {
    let mut raw_events = HashMap::new();
    for action_id in original_ids {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }
        let Some(channels) = ir.raw_events(action_id)? else {
            continue;
        };
        let records: Vec<Vec<u8>> = channels.data.iter().collect();
        if let Some(err) = channels.errors.try_iter().next() {
            return Err(BuildError::Ir(err));
        }
        raw_events.insert(dense_id_of[action_id], records);
    }
    Ok(raw_events)
}

fn scan_one<S: IrStore>(
    ir: &S,
    action_id: &str,
    cancel: &Cancel,
) -> Result<(String, ScanResult), BuildError> {
    if cancel.is_cancelled() {
        return Err(BuildError::Cancelled);
    }
    let mut result = ScanResult::default();
    for event in ir.events(action_id)? {
        match event.payload {
            EventPayload::Child { child_action_id } => {
                result.parents.insert(
                    child_action_id,
                    ParentLink {
                        parent_action_id: action_id.to_string(),
                        timestamp: event.timestamp,
                    },
                );
            }
            EventPayload::Pipe => {
                result.pipe_actions.insert(action_id.to_string());
            }
            EventPayload::Dup {
                dup_exec_id,
                old_fd,
                new_fd,
            } => {
                result
                    .dup_actions
                    .entry(action_id.to_string())
                    .or_default()
                    .push(DupRecord {
                        dup_exec_id,
                        timestamp: event.timestamp,
                        old_fd,
                        new_fd,
                    });
            }
            _ => {}
        }
    }
    Ok((action_id.to_string(), result))
}

#[allow(clippy::too_many_arguments)]
fn assemble_one<S: IrStore>(
    ir: &S,
    action_id: &str,
    sysgraph_id: &str,
    dense_id_of: &HashMap<String, i64>,
    parents: &HashMap<String, ParentLink>,
    children_of: &HashMap<String, Vec<(String, i64)>>,
    pipe_edges: &HashMap<String, Vec<PipeEdge>>,
    risky_pipe_parents: &HashSet<String>,
    rdb: &Mutex<ResourceDb>,
    cancel: &Cancel,
) -> Result<Action, BuildError> {
    if cancel.is_cancelled() {
        return Err(BuildError::Cancelled);
    }
    let dense_id = dense_id_of[action_id];
    let mut action = Action::new(dense_id, sysgraph_id);

    if let Some(link) = parents.get(action_id) {
        action.parent_action_id = dense_id_of.get(&link.parent_action_id).copied();
        action.parent = Some(ActionInteraction {
            timestamp: link.timestamp,
        });
    }

    if let Some(children) = children_of.get(action_id) {
        for (child_id, timestamp) in children {
            if let Some(&child_dense) = dense_id_of.get(child_id) {
                action.children.insert(child_dense, ActionInteraction { timestamp: *timestamp });
            }
        }
    }

    if risky_pipe_parents.contains(action_id) {
        action.mark_risky_pipe();
    }

    for event in ir.events(action_id)? {
        match event.payload {
            EventPayload::Start => action.start_time = event.timestamp,
            EventPayload::End {
                exit_status,
                exit_signal,
            } => {
                action.end_time = event.timestamp;
                action.exit_status = exit_status;
                action.exit_signal = exit_signal;
            }
            EventPayload::Exec { argv, executable } => {
                let digest_key = rdb
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .insert(executable);
                action.exec_info = ExecInfo { argv };
                action.executable_resource_digest = sysgraph_digest::Digest::parse(&digest_key).ok();
                action.executable = Some(ResourceInteraction {
                    timestamp: event.timestamp,
                    io_info: None,
                });
            }
            EventPayload::ResourceIo {
                direction,
                resource,
                io_info,
            } => {
                let digest_key = rdb
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .insert(resource);
                let interaction = ResourceInteraction {
                    timestamp: event.timestamp,
                    io_info,
                };
                let map = match direction {
                    IoDirection::Input => &mut action.inputs,
                    IoDirection::Output => &mut action.outputs,
                };
                map.entry(digest_key).or_default().push(interaction);
            }
            EventPayload::Metadata { entries } => {
                for (key, value) in entries {
                    action.metadata.insert(key, value);
                }
            }
            EventPayload::Child { .. } | EventPayload::Pipe | EventPayload::Dup { .. } => {}
        }
    }

    if let Some(edges) = pipe_edges.get(action_id) {
        for edge in edges {
            let interaction = ResourceInteraction {
                timestamp: edge.timestamp,
                io_info: None,
            };
            let map = match edge.direction {
                PipeEdgeDirection::Input => &mut action.inputs,
                PipeEdgeDirection::Output => &mut action.outputs,
            };
            map.entry(edge.digest_key.clone()).or_default().push(interaction);
        }
    }

    Ok(action)
}
