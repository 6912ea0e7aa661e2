//! Collapsing walk output into one declaration per external package.

use crate::core::types::{Dependency, VersionReq};
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How to pick a version range when a package is reached more than once with
/// different ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// The first occurrence wins silently.
    #[default]
    First,
    /// The first occurrence wins; every conflicting range is logged as a warning.
    Warn,
    /// Every conflicting range is logged and replaces the previous one, so the
    /// last occurrence wins. The package keeps its first-seen position.
    Overwrite,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Warn => write!(f, "warn"),
            Self::Overwrite => write!(f, "overwrite"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "warn" => Ok(Self::Warn),
            "overwrite" => Ok(Self::Overwrite),
            _ => Err(format!("Unknown conflict policy: {s}")),
        }
    }
}

/// Deduplicated external packages, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalSet(IndexMap<String, VersionReq>);

impl ExternalSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chosen range for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns `true` if `name` is in the set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Package names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(name, range)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the underlying ordered map.
    #[must_use]
    pub fn into_inner(self) -> IndexMap<String, VersionReq> {
        self.0
    }
}

/// A package reached with more than one distinct version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    /// Package name.
    pub name: String,
    /// The range seen first, and the workspace that declared it.
    pub first: (VersionReq, String),
    /// A later, different range, and the workspace that declared it.
    pub other: (VersionReq, String),
}

/// Collapses `deps` into an [`ExternalSet`] using `policy`.
#[must_use]
pub fn dedupe(deps: &[Dependency], policy: ConflictPolicy) -> ExternalSet {
    let mut chosen: IndexMap<String, (VersionReq, &str)> = IndexMap::with_capacity(deps.len());

    for dep in deps {
        match chosen.entry(dep.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert((dep.version_req.clone(), dep.origin.as_str()));
            }
            Entry::Occupied(mut slot) => {
                let (kept, kept_origin) = slot.get();
                if *kept == dep.version_req {
                    continue;
                }
                match policy {
                    ConflictPolicy::First => {}
                    ConflictPolicy::Warn => {
                        tracing::warn!(
                            package = %dep.name,
                            kept = %kept,
                            kept_origin = %kept_origin,
                            ignored = %dep.version_req,
                            ignored_origin = %dep.origin,
                            "Conflicting version ranges; keeping the first"
                        );
                    }
                    ConflictPolicy::Overwrite => {
                        tracing::warn!(
                            package = %dep.name,
                            replaced = %kept,
                            replaced_origin = %kept_origin,
                            range = %dep.version_req,
                            origin = %dep.origin,
                            "Conflicting version ranges; overwriting with the later one"
                        );
                        slot.insert((dep.version_req.clone(), dep.origin.as_str()));
                    }
                }
            }
        }
    }

    ExternalSet(
        chosen
            .into_iter()
            .map(|(name, (range, _))| (name, range))
            .collect(),
    )
}

/// Lists every later occurrence of a package whose range differs from the
/// first occurrence.
#[must_use]
pub fn conflicts(deps: &[Dependency]) -> Vec<VersionConflict> {
    let mut first: IndexMap<&str, &Dependency> = IndexMap::new();
    let mut found = Vec::new();

    for dep in deps {
        match first.get(dep.name.as_str()) {
            None => {
                first.insert(dep.name.as_str(), dep);
            }
            Some(seen) if seen.version_req != dep.version_req => {
                found.push(VersionConflict {
                    name: dep.name.clone(),
                    first: (seen.version_req.clone(), seen.origin.clone()),
                    other: (dep.version_req.clone(), dep.origin.clone()),
                });
            }
            Some(_) => {}
        }
    }

    found
}
