// SPDX-License-Identifier: Apache-2.0
//! Whole-graph summaries: `AllRiskyPipes`, `AbnormalExits`,
//! `ResourcesInteractions`.

use std::collections::HashMap;

use sysgraph_model::{Action, ResourceInteraction};

use crate::error::QueryError;
use crate::provider::ActionProvider;

/// Every action whose metadata marks it as a risky pipe parent.
pub fn all_risky_pipes<P>(provider: &P) -> Result<Vec<Action>, QueryError>
where
    P: ActionProvider + ?Sized,
{
    provider
        .action_ids()
        .into_iter()
        .map(|id| provider.action(id).ok_or(QueryError::ActionNotFound(id)))
        .collect::<Result<Vec<_>, _>>()
        .map(|actions| actions.into_iter().filter(Action::is_risky_pipe).collect())
}

/// Histogram over `(signal, status)` for actions that exited abnormally
/// (non-empty signal or non-zero status).
pub fn abnormal_exits<P>(provider: &P) -> Result<HashMap<(String, u32), usize>, QueryError>
where
    P: ActionProvider + ?Sized,
{
    let mut histogram = HashMap::new();
    for id in provider.action_ids() {
        let action = provider.action(id).ok_or(QueryError::ActionNotFound(id))?;
        if action.is_abnormal_exit() {
            *histogram.entry((action.exit_signal.clone(), action.exit_status)).or_insert(0) += 1;
        }
    }
    Ok(histogram)
}

/// The union of `action`'s inputs, outputs, and executable interaction,
/// keyed by resource digest.
pub fn resources_interactions<P>(provider: &P, action_id: i64) -> Result<HashMap<String, Vec<ResourceInteraction>>, QueryError>
where
    P: ActionProvider + ?Sized,
{
    let action = provider.action(action_id).ok_or(QueryError::ActionNotFound(action_id))?;
    let mut out: HashMap<String, Vec<ResourceInteraction>> = HashMap::new();
    for (digest, interactions) in action.inputs {
        out.entry(digest).or_default().extend(interactions);
    }
    for (digest, interactions) in action.outputs {
        out.entry(digest).or_default().extend(interactions);
    }
    if let (Some(digest), Some(interaction)) = (&action.executable_resource_digest, &action.executable) {
        out.entry(digest.canonical()).or_default().push(interaction.clone());
    }
    Ok(out)
}
