// SPDX-License-Identifier: Apache-2.0
//! Action matchers: first-class values deciding whether an action matches,
//! optionally capturing it under a name.

use sysgraph_model::Action;

use crate::value::{Extraction, ExtractedValue};

/// Decides whether an action matches, optionally returning named
/// extractions (captured actions or resources) gathered along the way.
pub trait ActionMatcher: Send + Sync {
    /// Evaluate this matcher against `action`. `Some` (even an empty map)
    /// means it matched; `None` means it didn't.
    fn eval(&self, action: &Action) -> Option<Extraction>;
}

/// Wraps an arbitrary predicate as an [`ActionMatcher`] with no extraction.
pub struct Predicate<F>(
    /// The predicate itself.
    pub F,
);

impl<F> ActionMatcher for Predicate<F>
where
    F: Fn(&Action) -> bool + Send + Sync,
{
    fn eval(&self, action: &Action) -> Option<Extraction> {
        (self.0)(action).then(Extraction::new)
    }
}

/// Wraps a matcher, capturing the matched action under `name` when it
/// matches.
pub struct ExtractAs<M> {
    /// The name the matched action is captured under.
    pub name: String,
    /// The matcher deciding whether this action matches at all.
    pub inner: M,
}

impl<M: ActionMatcher> ActionMatcher for ExtractAs<M> {
    fn eval(&self, action: &Action) -> Option<Extraction> {
        let mut extraction = self.inner.eval(action)?;
        extraction.insert(self.name.clone(), ExtractedValue::Action(action.clone()));
        Some(extraction)
    }
}

/// Matches when every sub-matcher matches; extractions are merged.
pub struct AllOf(
    /// Sub-matchers, all of which must match.
    pub Vec<Box<dyn ActionMatcher>>,
);

impl ActionMatcher for AllOf {
    fn eval(&self, action: &Action) -> Option<Extraction> {
        let mut extraction = Extraction::new();
        for matcher in &self.0 {
            extraction.extend(matcher.eval(action)?);
        }
        Some(extraction)
    }
}

/// Matches when none of the sub-matchers match.
pub struct NoneOf(
    /// Sub-matchers, none of which may match.
    pub Vec<Box<dyn ActionMatcher>>,
);

impl ActionMatcher for NoneOf {
    fn eval(&self, action: &Action) -> Option<Extraction> {
        if self.0.iter().any(|matcher| matcher.eval(action).is_some()) {
            None
        } else {
            Some(Extraction::new())
        }
    }
}
