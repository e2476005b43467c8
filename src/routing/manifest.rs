//! On-disk route manifests.
//!
//! A manifest sits at the location that determines its URL and names the
//! handler to mount there:
//!
//! ```toml
//! handler = "admin.login"
//! methods = ["POST"]
//! auth = false
//! # role = "admin"
//! ```

use std::path::Path;

use serde::Deserialize;

/// File extensions recognised as route manifests.
pub const MANIFEST_EXTENSIONS: [&str; 2] = ["toml", "json"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteManifest {
    /// Registry name of the handler.
    pub handler: String,

    /// Allowed HTTP methods. Empty means any method.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Require a verified bearer token.
    #[serde(default)]
    pub auth: bool,

    /// Minimum role. Implies `auth`.
    #[serde(default)]
    pub role: Option<String>,
}

impl RouteManifest {
    /// Parse `content` according to the extension of `file`.
    pub fn parse(file: &Path, content: &str) -> Result<Self, String> {
        match file.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(content).map_err(|e| e.to_string()),
            Some("json") => serde_json::from_str(content).map_err(|e| e.to_string()),
            other => Err(format!("unsupported manifest extension {:?}", other)),
        }
    }

    pub fn requires_auth(&self) -> bool {
        self.auth || self.role.is_some()
    }
}

pub fn is_manifest(file: &Path) -> bool {
    file.extension()
        .and_then(|e| e.to_str())
        .map(|ext| MANIFEST_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_defaults() {
        let manifest = RouteManifest::parse(Path::new("a.toml"), r#"handler = "system.status""#).unwrap();
        assert_eq!(manifest.handler, "system.status");
        assert!(manifest.methods.is_empty());
        assert!(!manifest.requires_auth());
    }

    #[test]
    fn test_parse_json_with_role() {
        let manifest = RouteManifest::parse(
            Path::new("a.json"),
            r#"{"handler":"system.whoami","methods":["GET"],"role":"admin"}"#,
        )
        .unwrap();
        assert_eq!(manifest.role.as_deref(), Some("admin"));
        assert!(manifest.requires_auth());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = RouteManifest::parse(Path::new("a.toml"), "handler = \"x\"\nadmin = true").unwrap_err();
        assert!(err.contains("admin"));
    }

    #[test]
    fn test_is_manifest() {
        assert!(is_manifest(Path::new("api/admin/login.toml")));
        assert!(is_manifest(Path::new("api/admin/login.json")));
        assert!(!is_manifest(Path::new("api/admin/README.md")));
        assert!(!is_manifest(Path::new("api/admin/login")));
    }
}
