// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Rule configuration: the tracked types and the concurrency construct table.
//!
//! Built once and passed by reference into every analysis call. Nothing is
//! read from files or the environment.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_RESOURCE_TYPE: &str = "Microsoft.EntityFrameworkCore.DbContext";
pub const DEFAULT_RESULT_SET_TYPE: &str = "Microsoft.EntityFrameworkCore.DbSet";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} type name must not be empty")]
    EmptyTypeName { field: &'static str },
    #[error("{field} type name `{name}` has an empty segment")]
    EmptySegment { field: &'static str, name: String },
    #[error("construct descriptor {index} lists no members")]
    NoMembers { index: usize },
    #[error("construct descriptor {index} has an empty member name")]
    EmptyMemberName { index: usize },
    #[error("construct descriptor {index} has an empty type pattern")]
    EmptyTypePattern { index: usize },
}

/// A type identified by namespace and simple name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub namespace: String,
    pub name: String,
}

impl TypeDescriptor {
    /// Split `A.B.Name` into namespace `A.B` and name `Name`.
    pub fn parse(qualified: &str, field: &'static str) -> Result<Self, ConfigError> {
        let qualified = qualified.trim();
        if qualified.is_empty() {
            return Err(ConfigError::EmptyTypeName { field });
        }
        if qualified.split('.').any(str::is_empty) {
            return Err(ConfigError::EmptySegment {
                field,
                name: qualified.to_string(),
            });
        }
        let (namespace, name) = qualified.rsplit_once('.').unwrap_or(("", qualified));
        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Families of concurrency-launching calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConstructKind {
    /// `Task.Run`
    SpawnSingle,
    /// `Task.Factory.StartNew`
    SpawnFactory,
    /// `Parallel.For` / `ForEach` / `ForEachAsync` / `Invoke`
    ParallelLoop,
    /// `.AsParallel()`
    ParallelLinq,
    /// `Task.WhenAll` / `WhenAny` / `WaitAll` / `WaitAny`
    WaitAll,
}

impl ConstructKind {
    /// Kinds whose arguments carry deferred work.
    pub const DEFERRED: [ConstructKind; 4] = [
        ConstructKind::SpawnSingle,
        ConstructKind::SpawnFactory,
        ConstructKind::ParallelLoop,
        ConstructKind::WaitAll,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ConstructKind::SpawnSingle => "spawn",
            ConstructKind::SpawnFactory => "factory spawn",
            ConstructKind::ParallelLoop => "parallel loop",
            ConstructKind::ParallelLinq => "parallel query",
            ConstructKind::WaitAll => "wait-all",
        }
    }
}

/// How a descriptor matches the invoked method's containing type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMatch {
    Exact(String),
    Contains(String),
    Any,
}

impl TypeMatch {
    pub fn matches(&self, type_name: Option<&str>) -> bool {
        match (self, type_name) {
            (TypeMatch::Any, _) => true,
            (TypeMatch::Exact(want), Some(name)) => name == want,
            (TypeMatch::Contains(part), Some(name)) => name.contains(part.as_str()),
            (_, None) => false,
        }
    }
}

/// Which parts of a call carry the deferred work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkArgs {
    All,
    Index(usize),
    Last,
    /// The receiver of the member call (`source.AsParallel()`).
    Receiver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructDescriptor {
    pub type_match: TypeMatch,
    pub members: Vec<String>,
    pub kind: ConstructKind,
    pub work: WorkArgs,
}

impl ConstructDescriptor {
    pub fn new(type_match: TypeMatch, members: &[&str], kind: ConstructKind, work: WorkArgs) -> Self {
        Self {
            type_match,
            members: members.iter().map(|m| m.to_string()).collect(),
            kind,
            work,
        }
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }
}

/// Immutable rule configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleConfig {
    pub resource_type: TypeDescriptor,
    pub result_set_type: TypeDescriptor,
    pub constructs: Vec<ConstructDescriptor>,
}

impl RuleConfig {
    pub fn new(
        resource_type: &str,
        result_set_type: &str,
        constructs: Vec<ConstructDescriptor>,
    ) -> Result<Self, ConfigError> {
        for (index, desc) in constructs.iter().enumerate() {
            if desc.members.is_empty() {
                return Err(ConfigError::NoMembers { index });
            }
            if desc.members.iter().any(|m| m.trim().is_empty()) {
                return Err(ConfigError::EmptyMemberName { index });
            }
            let empty_pattern = match &desc.type_match {
                TypeMatch::Exact(p) | TypeMatch::Contains(p) => p.trim().is_empty(),
                TypeMatch::Any => false,
            };
            if empty_pattern {
                return Err(ConfigError::EmptyTypePattern { index });
            }
        }
        Ok(Self {
            resource_type: TypeDescriptor::parse(resource_type, "resource")?,
            result_set_type: TypeDescriptor::parse(result_set_type, "result set")?,
            constructs,
        })
    }

    /// Descriptors naming `member`.
    pub fn constructs_for<'a>(
        &'a self,
        member: &'a str,
    ) -> impl Iterator<Item = &'a ConstructDescriptor> + 'a {
        self.constructs.iter().filter(move |d| d.has_member(member))
    }
}

/// The task, task-factory, parallel and PLINQ entry points.
pub fn default_constructs() -> Vec<ConstructDescriptor> {
    use ConstructKind::*;
    let task = || TypeMatch::Exact("Task".to_string());
    let parallel = || TypeMatch::Exact("Parallel".to_string());
    vec![
        ConstructDescriptor::new(task(), &["Run"], SpawnSingle, WorkArgs::Index(0)),
        ConstructDescriptor::new(task(), &["StartNew"], SpawnFactory, WorkArgs::Index(0)),
        ConstructDescriptor::new(
            task(),
            &["WhenAll", "WhenAny", "WaitAll", "WaitAny"],
            WaitAll,
            WorkArgs::All,
        ),
        ConstructDescriptor::new(
            TypeMatch::Contains("TaskFactory".to_string()),
            &["StartNew"],
            SpawnFactory,
            WorkArgs::Index(0),
        ),
        // The body is last in every overload, including the ParallelOptions ones.
        ConstructDescriptor::new(
            parallel(),
            &["For", "ForEach", "ForEachAsync"],
            ParallelLoop,
            WorkArgs::Last,
        ),
        ConstructDescriptor::new(parallel(), &["Invoke"], ParallelLoop, WorkArgs::All),
        ConstructDescriptor::new(TypeMatch::Any, &["AsParallel"], ParallelLinq, WorkArgs::Receiver),
    ]
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            resource_type: TypeDescriptor {
                namespace: "Microsoft.EntityFrameworkCore".to_string(),
                name: "DbContext".to_string(),
            },
            result_set_type: TypeDescriptor {
                namespace: "Microsoft.EntityFrameworkCore".to_string(),
                name: "DbSet".to_string(),
            },
            constructs: default_constructs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_constants() {
        let built = RuleConfig::new(DEFAULT_RESOURCE_TYPE, DEFAULT_RESULT_SET_TYPE, default_constructs());
        assert_eq!(built, Ok(RuleConfig::default()));
    }

    #[test]
    fn rejects_empty_names() {
        assert_eq!(
            RuleConfig::new("", DEFAULT_RESULT_SET_TYPE, Vec::new()),
            Err(ConfigError::EmptyTypeName { field: "resource" })
        );
        assert!(matches!(
            RuleConfig::new("Data..Context", DEFAULT_RESULT_SET_TYPE, Vec::new()),
            Err(ConfigError::EmptySegment { .. })
        ));
        let no_members = vec![ConstructDescriptor::new(
            TypeMatch::Any,
            &[],
            ConstructKind::SpawnSingle,
            WorkArgs::All,
        )];
        assert_eq!(
            RuleConfig::new(DEFAULT_RESOURCE_TYPE, DEFAULT_RESULT_SET_TYPE, no_members),
            Err(ConfigError::NoMembers { index: 0 })
        );
        let blank = vec![ConstructDescriptor::new(
            TypeMatch::Exact(" ".into()),
            &["Run"],
            ConstructKind::SpawnSingle,
            WorkArgs::All,
        )];
        assert_eq!(
            RuleConfig::new(DEFAULT_RESOURCE_TYPE, DEFAULT_RESULT_SET_TYPE, blank),
            Err(ConfigError::EmptyTypePattern { index: 0 })
        );
    }

    #[test]
    fn unqualified_type_has_empty_namespace() {
        let desc = TypeDescriptor::parse("Session", "resource").unwrap();
        assert_eq!(desc.namespace, "");
        assert_eq!(desc.qualified_name(), "Session");
    }

    #[test]
    fn type_match_modes() {
        assert!(TypeMatch::Exact("Task".into()).matches(Some("Task")));
        assert!(!TypeMatch::Exact("Task".into()).matches(Some("TaskFactory")));
        assert!(TypeMatch::Contains("TaskFactory".into()).matches(Some("MyTaskFactory")));
        assert!(!TypeMatch::Contains("TaskFactory".into()).matches(None));
        assert!(TypeMatch::Any.matches(None));
    }

    #[test]
    fn constructs_for_member() {
        let config = RuleConfig::default();
        let kinds: Vec<_> = config.constructs_for("StartNew").map(|d| d.kind).collect();
        assert_eq!(kinds, vec![ConstructKind::SpawnFactory, ConstructKind::SpawnFactory]);
        assert_eq!(config.constructs_for("Nope").count(), 0);
    }
}
