// SPDX-License-Identifier: Apache-2.0
//! Named values a matcher can capture while walking a [`crate::Chain`].

use std::collections::BTreeMap;

use sysgraph_model::{Action, Resource};

/// A value captured by an `ExtractAs`-wrapped matcher: either the action or
/// the resource that satisfied the inner matcher.
#[derive(Debug, Clone)]
pub enum ExtractedValue {
    /// An action captured under a name.
    Action(Action),
    /// A resource captured under a name.
    Resource(Resource),
}

impl ExtractedValue {
    /// A stable string standing in for this value's identity, used to
    /// deduplicate chains in `AllUniqueChains` without requiring `Action`/
    /// `Resource` to implement `Hash`.
    pub fn fingerprint(&self) -> String {
        match self {
            Self::Action(action) => format!("action:{}", action.id),
            Self::Resource(resource) => format!("resource:{}", resource.digest().canonical()),
        }
    }
}

/// Named values produced by one matcher evaluation; `Some(Extraction)` means
/// the matcher matched (an empty map if it captured nothing), `None` means
/// it didn't.
pub type Extraction = BTreeMap<String, ExtractedValue>;
