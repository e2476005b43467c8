//! Startup route discovery.
//!
//! # Responsibilities
//! - Walk the route root in lexicographic order
//! - Derive each manifest's mount path from its location
//! - Resolve the named handler and validate guards eagerly
//! - Isolate per-file failures: log, skip, continue
//!
//! # Design Decisions
//! - Blocking I/O: runs once before the listener accepts traffic
//! - Symlinks are not followed; hidden entries are skipped
//! - A missing root yields an empty table with a warning, not an error

use std::fs;
use std::path::{Component, Path, PathBuf};

use axum::http::Method;
use axum::routing::MethodFilter;
use thiserror::Error;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::handlers::HandlerRegistry;
use crate::routing::manifest::{is_manifest, RouteManifest};
use crate::routing::table::{RouteEntry, RouteTable};
use crate::security::RoleHierarchy;

#[derive(Debug, Error)]
pub enum RouteLoadError {
    #[error("{file}: cannot read: {source}")]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}: invalid manifest: {reason}")]
    Parse { file: PathBuf, reason: String },

    #[error("{file}: no handler registered as {handler:?}")]
    UnknownHandler { file: PathBuf, handler: String },

    #[error("{file}: role {role:?} is not in the hierarchy")]
    UnknownRole { file: PathBuf, role: String },

    #[error("{file}: unsupported method {method:?}")]
    InvalidMethod { file: PathBuf, method: String },

    #[error("{file}: cannot mount: {reason}")]
    InvalidPath { file: PathBuf, reason: String },

    #[error("{file}: path {path} already registered by {existing}")]
    Duplicate {
        file: PathBuf,
        path: String,
        existing: PathBuf,
    },
}

impl RouteLoadError {
    pub fn file(&self) -> &Path {
        match self {
            RouteLoadError::Io { file, .. }
            | RouteLoadError::Parse { file, .. }
            | RouteLoadError::UnknownHandler { file, .. }
            | RouteLoadError::UnknownRole { file, .. }
            | RouteLoadError::InvalidMethod { file, .. }
            | RouteLoadError::InvalidPath { file, .. }
            | RouteLoadError::Duplicate { file, .. } => file,
        }
    }
}

/// Outcome of a load: the table plus every per-file failure.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub table: RouteTable,
    pub failures: Vec<RouteLoadError>,
    /// Manifest files found, whether or not they loaded.
    pub discovered: usize,
}

pub struct RouteLoader<'a> {
    registry: &'a HandlerRegistry,
    roles: &'a RoleHierarchy,
    prefix: String,
}

impl<'a> RouteLoader<'a> {
    pub fn new(registry: &'a HandlerRegistry, roles: &'a RoleHierarchy) -> Self {
        Self {
            registry,
            roles,
            prefix: "/api".to_string(),
        }
    }

    /// Mount under `prefix` instead of `/api`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn load(&self, root: &Path) -> LoadReport {
        let mut report = LoadReport::default();

        if !root.is_dir() {
            warn!(root = %root.display(), "API directory not found");
            return report;
        }

        let files = discover(root);
        report.discovered = files.len();
        if files.is_empty() {
            warn!(root = %root.display(), "No API files found in directory");
            return report;
        }

        info!(root = %root.display(), files = files.len(), "Initiate API route loading");

        for file in files {
            match self.load_file(root, &file, &mut report.table) {
                Ok(path) => info!(path = %path, file = %file.display(), "API route loaded"),
                Err(e) => {
                    error!(file = %file.display(), error = %e, "Failed to load route file");
                    report.failures.push(e);
                }
            }
        }

        info!(
            loaded = report.table.len(),
            failed = report.failures.len(),
            "Loading API finished"
        );
        report
    }

    fn load_file(&self, root: &Path, file: &Path, table: &mut RouteTable) -> Result<String, RouteLoadError> {
        let path = derive_path(&self.prefix, root, file).map_err(|reason| RouteLoadError::InvalidPath {
            file: file.to_path_buf(),
            reason,
        })?;

        let content = fs::read_to_string(file).map_err(|source| RouteLoadError::Io {
            file: file.to_path_buf(),
            source,
        })?;

        let manifest = RouteManifest::parse(file, &content).map_err(|reason| RouteLoadError::Parse {
            file: file.to_path_buf(),
            reason,
        })?;

        let handler = self
            .registry
            .get(&manifest.handler)
            .ok_or_else(|| RouteLoadError::UnknownHandler {
                file: file.to_path_buf(),
                handler: manifest.handler.clone(),
            })?;

        if let Some(role) = &manifest.role {
            if !self.roles.contains(role) {
                return Err(RouteLoadError::UnknownRole {
                    file: file.to_path_buf(),
                    role: role.clone(),
                });
            }
        }

        let methods = manifest
            .methods
            .iter()
            .map(|m| parse_method(m).ok_or_else(|| RouteLoadError::InvalidMethod {
                file: file.to_path_buf(),
                method: m.clone(),
            }))
            .collect::<Result<Vec<_>, _>>()?;

        let entry = RouteEntry {
            path: path.clone(),
            methods,
            requires_auth: manifest.requires_auth(),
            required_role: manifest.role.clone(),
            handler_name: manifest.handler,
            handler,
            source: file.to_path_buf(),
        };

        table.insert(entry).map_err(|taken| RouteLoadError::Duplicate {
            file: file.to_path_buf(),
            path: path.clone(),
            existing: taken.existing,
        })?;

        Ok(path)
    }
}

/// Every manifest under `root`, depth-first in file-name order.
fn discover(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "Skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_manifest(e.path()))
        .map(|e| e.into_path())
        .collect()
}

/// Mount path for `file`: prefix + root-relative path without extension.
///
/// `api/admin/login.toml` under root `api` becomes `/api/admin/login`.
pub fn derive_path(prefix: &str, root: &Path, file: &Path) -> Result<String, String> {
    let relative = file
        .strip_prefix(root)
        .map_err(|_| "file is outside the route root".to_string())?
        .with_extension("");

    let mut path = prefix.trim_end_matches('/').to_string();
    for component in relative.components() {
        let segment = match component {
            Component::Normal(s) => s
                .to_str()
                .ok_or_else(|| "path is not valid UTF-8".to_string())?,
            _ => return Err(format!("unexpected path component {:?}", component)),
        };
        validate_segment(segment)?;
        path.push('/');
        path.push_str(segment);
    }

    if path.len() <= prefix.trim_end_matches('/').len() {
        return Err("empty route path".to_string());
    }
    Ok(path)
}

fn validate_segment(segment: &str) -> Result<(), String> {
    if segment.is_empty() {
        return Err("empty path segment".to_string());
    }
    if segment.starts_with(':') || segment.starts_with('*') || segment.contains(['{', '}']) {
        return Err(format!("segment {:?} would be read as a route parameter", segment));
    }
    if segment.chars().any(|c| c.is_whitespace() || c == '?' || c == '#') {
        return Err(format!("segment {:?} is not URL-safe", segment));
    }
    Ok(())
}

fn parse_method(name: &str) -> Option<Method> {
    let method = Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes()).ok()?;
    MethodFilter::try_from(method.clone()).ok()?;
    Some(method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn load(root: &Path) -> LoadReport {
        let registry = HandlerRegistry::builtin();
        let roles = RoleHierarchy::default();
        RouteLoader::new(&registry, &roles).load(root)
    }

    #[test]
    fn test_derive_path() {
        let root = Path::new("/srv/api");
        assert_eq!(
            derive_path("/api", root, Path::new("/srv/api/admin/login.toml")).unwrap(),
            "/api/admin/login"
        );
        assert_eq!(
            derive_path("/v1/", root, Path::new("/srv/api/status.json")).unwrap(),
            "/v1/status"
        );
        assert_eq!(
            derive_path("/api", root, Path::new("/srv/api/a/b/c.d.toml")).unwrap(),
            "/api/a/b/c.d"
        );
        assert!(derive_path("/api", root, Path::new("/elsewhere/x.toml")).is_err());
        assert!(derive_path("/api", root, Path::new("/srv/api/users/:id.toml")).is_err());
        assert!(derive_path("/api", root, Path::new("/srv/api/{all}.toml")).is_err());
    }

    #[test]
    fn test_three_valid_one_malformed() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "admin/login.toml", "handler = \"admin.login\"\nmethods = [\"POST\"]");
        write(dir.path(), "system/status.toml", "handler = \"system.status\"");
        write(dir.path(), "system/whoami.json", r#"{"handler":"system.whoami","auth":true}"#);
        write(dir.path(), "broken.toml", "handler = ");

        let report = load(dir.path());
        assert_eq!(report.discovered, 4);
        assert_eq!(report.table.len(), 3);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0], RouteLoadError::Parse { .. }));

        let login = report.table.get("/api/admin/login").unwrap();
        assert_eq!(login.methods, vec![Method::POST]);
        assert!(!login.requires_auth);
        assert!(report.table.get("/api/system/whoami").unwrap().requires_auth);
    }

    #[test]
    fn test_lexicographic_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "zeta.toml", "handler = \"system.status\"");
        write(dir.path(), "alpha/b.toml", "handler = \"system.status\"");
        write(dir.path(), "alpha/a.toml", "handler = \"system.status\"");
        write(dir.path(), "beta.toml", "handler = \"system.status\"");

        let report = load(dir.path());
        let paths: Vec<_> = report.table.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/api/alpha/a", "/api/alpha/b", "/api/beta", "/api/zeta"]);
    }

    #[test]
    fn test_collision_reported_first_wins() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "login.json", r#"{"handler":"admin.login"}"#);
        write(dir.path(), "login.toml", "handler = \"system.status\"");

        let report = load(dir.path());
        assert_eq!(report.table.len(), 1);
        assert_eq!(report.table.get("/api/login").unwrap().handler_name, "admin.login");
        match &report.failures[..] {
            [RouteLoadError::Duplicate { path, existing, .. }] => {
                assert_eq!(path, "/api/login");
                assert!(existing.ends_with("login.json"));
            }
            other => panic!("unexpected failures: {other:?}"),
        }
    }

    #[test]
    fn test_guard_validation_failures() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.toml", "handler = \"nope\"");
        write(dir.path(), "b.toml", "handler = \"system.whoami\"\nrole = \"root\"");
        write(dir.path(), "c.toml", "handler = \"system.status\"\nmethods = [\"FETCH\"]");

        let report = load(dir.path());
        assert!(report.table.is_empty());
        assert!(matches!(report.failures[0], RouteLoadError::UnknownHandler { .. }));
        assert!(matches!(report.failures[1], RouteLoadError::UnknownRole { .. }));
        assert!(matches!(report.failures[2], RouteLoadError::InvalidMethod { .. }));
    }

    #[test]
    fn test_role_implies_auth() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "admin/session.toml", "handler = \"system.whoami\"\nrole = \"Admin\"");

        let report = load(dir.path());
        let entry = report.table.get("/api/admin/session").unwrap();
        assert!(entry.requires_auth);
        assert_eq!(entry.required_role.as_deref(), Some("Admin"));
    }

    #[test]
    fn test_ignores_other_files_and_hidden() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "# routes");
        write(dir.path(), ".draft.toml", "handler = \"system.status\"");
        write(dir.path(), ".cache/x.toml", "handler = \"system.status\"");
        write(dir.path(), "ok.toml", "handler = \"system.status\"");

        let report = load(dir.path());
        assert_eq!(report.discovered, 1);
        assert_eq!(report.table.len(), 1);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let report = load(&dir.path().join("absent"));
        assert!(report.table.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(report.discovered, 0);
    }

    #[test]
    fn test_custom_prefix() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "status.toml", "handler = \"system.status\"");

        let registry = HandlerRegistry::builtin();
        let roles = RoleHierarchy::default();
        let report = RouteLoader::new(&registry, &roles).with_prefix("/v2").load(dir.path());
        assert!(report.table.get("/v2/status").is_some());
    }
}
