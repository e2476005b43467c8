//! Route table.
//!
//! # Design Decisions
//! - Immutable after loading (shared without locks)
//! - Unique paths: a second entry for a path is an error, never an overwrite
//! - Insertion order is preserved so logs and listings are reproducible

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;

use crate::handlers::HandlerFn;

/// One mounted route.
#[derive(Clone)]
pub struct RouteEntry {
    pub path: String,
    /// Empty means any method.
    pub methods: Vec<Method>,
    pub requires_auth: bool,
    pub required_role: Option<String>,
    pub handler_name: String,
    pub handler: HandlerFn,
    pub source: PathBuf,
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry")
            .field("path", &self.path)
            .field("methods", &self.methods)
            .field("requires_auth", &self.requires_auth)
            .field("required_role", &self.required_role)
            .field("handler", &self.handler_name)
            .field("source", &self.source)
            .finish()
    }
}

/// The path already registered when an insert collides.
#[derive(Debug, Clone)]
pub struct PathTaken {
    pub existing: PathBuf,
}

#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<Arc<RouteEntry>>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: RouteEntry) -> Result<(), PathTaken> {
        if let Some(&i) = self.index.get(&entry.path) {
            return Err(PathTaken {
                existing: self.entries[i].source.clone(),
            });
        }
        self.index.insert(entry.path.clone(), self.entries.len());
        self.entries.push(Arc::new(entry));
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&Arc<RouteEntry>> {
        self.index.get(path).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteEntry>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
