//! Role hierarchy and authorization checks.
//!
//! # Design Decisions
//! - Role names are case-insensitive (normalized to lowercase at construction)
//! - Unknown roles fail closed in either argument position
//! - Immutable after construction, so checks need no locking

use std::collections::HashMap;

use crate::config::schema::RolesConfig;

/// Decides whether a caller's role satisfies a route's requirement.
pub trait Authorizer: Send + Sync + std::fmt::Debug {
    /// Returns true if `role` is at least as trusted as `required`.
    fn satisfies(&self, role: &str, required: &str) -> bool;
}

/// Linear ranking of named roles.
#[derive(Debug, Clone)]
pub struct RoleHierarchy {
    ranks: HashMap<String, u32>,
}

impl RoleHierarchy {
    /// Build a hierarchy from `(name, rank)` pairs.
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let ranks = roles
            .into_iter()
            .map(|(name, rank)| (name.as_ref().to_lowercase(), rank))
            .collect();
        Self { ranks }
    }

    pub fn from_config(config: &RolesConfig) -> Self {
        Self::new(config.0.iter().map(|(name, rank)| (name, *rank)))
    }

    pub fn rank(&self, role: &str) -> Option<u32> {
        self.ranks.get(&role.to_lowercase()).copied()
    }

    pub fn contains(&self, role: &str) -> bool {
        self.rank(role).is_some()
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::from_config(&RolesConfig::default())
    }
}

impl Authorizer for RoleHierarchy {
    fn satisfies(&self, role: &str, required: &str) -> bool {
        match (self.rank(role), self.rank(required)) {
            (Some(have), Some(need)) => have >= need,
            _ => false,
        }
    }
}
