// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Rule findings.

use std::fmt;

use ctxlint_ast::Span;
use serde::Serialize;

use crate::config::ConstructKind;

/// Why a reference was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Reason {
    /// Used inside a disposal region that owns a different instance.
    MixedInstance,
    /// Owned by a region opened outside the concurrent work.
    UsedOutsideScope,
    /// Never placed in a disposal region.
    UnscopedUsage,
    /// Captured by a parallel loop body.
    ParallelLoopUsage,
    /// Result set queried with `AsParallel`.
    UnsafeParallelQuery,
}

impl Reason {
    pub fn code(self) -> &'static str {
        match self {
            Reason::MixedInstance => "mixed-instance",
            Reason::UsedOutsideScope => "used-outside-scope",
            Reason::UnscopedUsage => "unscoped-usage",
            Reason::ParallelLoopUsage => "parallel-loop-usage",
            Reason::UnsafeParallelQuery => "unsafe-parallel-query",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One flagged reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Finding {
    /// Span of the offending reference, not of the enclosing call.
    pub span: Span,
    pub name: String,
    /// Owner of the disposal region involved, when there is one.
    pub owner: Option<String>,
    pub reason: Reason,
    pub construct: ConstructKind,
}

impl Finding {
    /// The explanatory phrase passed as the diagnostic's message argument.
    pub fn phrase(&self) -> String {
        let name = &self.name;
        match (self.reason, self.owner.as_deref()) {
            (Reason::MixedInstance, Some(owner)) => {
                format!("'{name}' is used inside the disposal scope of '{owner}'")
            }
            (Reason::MixedInstance, None) => {
                format!("'{name}' is used inside the disposal scope of another instance")
            }
            (Reason::UsedOutsideScope, _) => {
                format!("'{name}' is disposed by a scope outside the {}", self.construct.label())
            }
            (Reason::UnscopedUsage, _) => {
                format!("'{name}' is not scoped to the {}", self.construct.label())
            }
            (Reason::ParallelLoopUsage, _) => {
                format!("'{name}' is shared across parallel loop iterations")
            }
            (Reason::UnsafeParallelQuery, _) => format!("'{name}' is queried in parallel"),
        }
    }
}
