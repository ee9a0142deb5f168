// SPDX-License-Identifier: Apache-2.0
//! `Deterministic`: recompute action ids so that two graphs built from
//! equivalent IRs compare byte-for-byte.

use std::collections::{BTreeMap, HashMap};

use sysgraph_digest::Digest;
use sysgraph_model::Action;
use sysgraph_query::ActionProvider;
use sysgraph_util::Cancel;

use crate::error::TransformError;
use crate::graph::{GraphSource, StaticGraph};
use crate::remap::{referenced_resources, remap_action};

/// Sort key for one action: SHA-256 of
/// `parent_key ";" exec_info_digest ";" sorted_input_digests ";" sorted_output_digests`.
/// `parent_key` is the already-computed key of the parent action, or empty
/// for an entry point — so the key is only well-defined once ancestors are
/// processed first.
fn sort_key_of(action: &Action, parent_key: &str) -> String {
    let exec_digest = action.exec_info.digest().canonical();
    let mut inputs: Vec<&str> = action.inputs.keys().map(String::as_str).collect();
    inputs.sort_unstable();
    let mut outputs: Vec<&str> = action.outputs.keys().map(String::as_str).collect();
    outputs.sort_unstable();
    let composite = format!("{parent_key};{exec_digest};{};{}", inputs.join(","), outputs.join(","));
    Digest::of_bytes(composite.as_bytes()).hash().to_string()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

#[allow(clippy::too_many_arguments)]
fn visit(
    id: i64,
    actions: &HashMap<i64, Action>,
    keys: &mut HashMap<i64, String>,
    marks: &mut HashMap<i64, Mark>,
    cancel: &Cancel,
) -> Result<(), TransformError> {
    if keys.contains_key(&id) {
        return Ok(());
    }
    if cancel.is_cancelled() {
        return Err(TransformError::Cancelled);
    }
    if marks.get(&id) == Some(&Mark::InProgress) {
        return Err(TransformError::CyclicParentGraph(id));
    }
    marks.insert(id, Mark::InProgress);

    let action = actions.get(&id).ok_or(TransformError::ActionNotFound(id))?;
    let parent_key = match action.parent_action_id {
        Some(parent_id) => {
            visit(parent_id, actions, keys, marks, cancel)?;
            keys.get(&parent_id).cloned().unwrap_or_default()
        }
        None => String::new(),
    };

    keys.insert(id, sort_key_of(action, &parent_key));
    marks.insert(id, Mark::Done);
    Ok(())
}

/// Recompute `source`'s action ids from `1` by a deterministic sort key
/// (see [`sort_key_of`]), computed parent-first. A cyclic parent-edge graph
/// is reported as [`TransformError::CyclicParentGraph`].
pub fn deterministic<P>(source: &P, cancel: &Cancel) -> Result<StaticGraph, TransformError>
where
    P: GraphSource + ?Sized,
{
    let ids = source.action_ids();
    let mut actions = HashMap::with_capacity(ids.len());
    for &id in &ids {
        actions.insert(id, source.action(id).ok_or(TransformError::ActionNotFound(id))?);
    }

    let mut keys = HashMap::with_capacity(ids.len());
    let mut marks = HashMap::with_capacity(ids.len());
    for &id in &ids {
        visit(id, &actions, &mut keys, &mut marks, cancel)?;
    }

    let mut ordered: Vec<i64> = ids.clone();
    ordered.sort_unstable_by(|a, b| keys[a].cmp(&keys[b]).then(a.cmp(b)));
    let mapping: HashMap<i64, i64> = ordered.iter().enumerate().map(|(i, &orig)| (orig, i as i64 + 1)).collect();

    let mut new_actions = BTreeMap::new();
    for &orig in &ordered {
        let action = actions.remove(&orig).ok_or(TransformError::ActionNotFound(orig))?;
        let action = remap_action(action, &mapping);
        new_actions.insert(action.id, action);
    }

    let mut header = source.header();
    header.entry_point_action_ids = header
        .entry_point_action_ids
        .iter()
        .filter_map(|id| mapping.get(id).copied())
        .collect();
    header.entry_point_action_ids.sort_unstable();

    let resources = referenced_resources(source, &new_actions);
    Ok(StaticGraph::new(header, new_actions, resources))
}
