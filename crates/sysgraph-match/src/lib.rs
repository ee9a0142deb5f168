// SPDX-License-Identifier: Apache-2.0
//! A declarative chain-matching language over a SysGraph action graph:
//! composable action/resource matchers and a left-to-right traversal
//! pipeline producing every (or every unique) matching path.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod action_matcher;
mod chain;
mod edges;
mod error;
mod resource_matcher;
mod traversal;
mod value;

pub use action_matcher::{ActionMatcher, AllOf as ActionAllOf, ExtractAs as ExtractActionAs, NoneOf as ActionNoneOf, Predicate as ActionPredicate};
pub use chain::Chain;
pub use edges::Edges;
pub use error::MatchError;
pub use resource_matcher::{AllOf as ResourceAllOf, ExtractAs as ExtractResourceAs, NoneOf as ResourceNoneOf, PathEq, PathPrefix, PathRegex, PathSuffix, ResourceMatcher};
pub use traversal::Traversal;
pub use value::{Extraction, ExtractedValue};
