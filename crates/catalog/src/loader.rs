//! Catalog loading from YAML files, one entry per file.

use std::fs;
use std::path::Path;

use defcred_common::{Catalog, CatalogEntry, DefcredError, DefcredResult};
use glob::glob;
use tracing::{debug, info};

use crate::validate::validate_entry;

const EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Parse a single catalog entry from YAML text (not validated).
pub fn parse_entry(yaml: &str) -> DefcredResult<CatalogEntry> {
    let mut entry: CatalogEntry =
        serde_yaml::from_str(yaml).map_err(|e| DefcredError::Parse(e.to_string()))?;
    // a blank token field means the entry needs no token
    entry.auth.csrf = entry.auth.csrf.take().filter(|f| !f.trim().is_empty());
    entry.auth.sessionid = entry.auth.sessionid.take().filter(|f| !f.trim().is_empty());
    Ok(entry)
}

/// Load and validate one entry file.
pub fn load_entry(path: &Path) -> DefcredResult<CatalogEntry> {
    let content = fs::read_to_string(path)?;
    let entry = parse_entry(&content)
        .map_err(|e| DefcredError::Catalog(format!("{}: {}", path.display(), e)))?;
    validate_entry(&entry)?;
    Ok(entry)
}

/// Load every `*.yml` / `*.yaml` file below `dir` into a catalog.
///
/// Files are visited in path order so catalog order is stable between runs.
/// A single unreadable or invalid file fails the whole load.
pub fn load_catalog(dir: &Path) -> DefcredResult<Catalog> {
    if !dir.is_dir() {
        return Err(DefcredError::Config(format!(
            "catalog directory does not exist or is not a directory: {}",
            dir.display()
        )));
    }

    info!("Loading catalog from: {}", dir.display());

    let mut paths = Vec::new();
    for ext in EXTENSIONS {
        let pattern = format!("{}/**/*.{}", dir.display(), ext);
        let entries = glob(&pattern).map_err(|e| DefcredError::Config(e.to_string()))?;
        for entry in entries {
            paths.push(entry.map_err(|e| DefcredError::Io(e.into_error()))?);
        }
    }
    paths.sort();

    let mut entries = Vec::with_capacity(paths.len());
    for path in &paths {
        let entry = load_entry(path)?;
        debug!("Loaded catalog entry: {} ({})", entry.name, path.display());
        entries.push(entry);
    }

    info!("Loaded {} catalog entries", entries.len());
    Ok(Catalog::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use defcred_common::AuthType;
    use std::path::PathBuf;

    const JENKINS: &str = r#"
name: Jenkins
category: webapp
protocol: http
default_port: 8080
ssl: false
fingerprint:
  url: [/login]
  headers:
    User-Agent: Mozilla/5.0
  body:
    - Jenkins
auth:
  type: post
  url: [/j_acegi_security_check]
  csrf: Jenkins-Crumb
  post:
    username: j_username
    password: j_password
  success:
    status: 302
  credentials:
    - username: admin
      password: admin
    - username: jenkins
      password: jenkins
"#;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new() -> Self {
            let path = std::env::temp_dir().join(format!("defcred-catalog-{}", uuid::Uuid::new_v4()));
            fs::create_dir_all(&path).unwrap();
            Self(path)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn parses_full_entry() {
        let entry = parse_entry(JENKINS).unwrap();
        assert_eq!(entry.name, "Jenkins");
        assert_eq!(entry.default_port, 8080);
        assert_eq!(entry.auth.kind, AuthType::Post);
        assert_eq!(entry.auth.csrf.as_deref(), Some("Jenkins-Crumb"));
        assert_eq!(entry.auth.credentials.len(), 2);
        assert_eq!(entry.auth.success.status, Some(302));
        assert_eq!(entry.fingerprint.headers["User-Agent"], "Mozilla/5.0");
    }

    #[test]
    fn defaults_apply() {
        let entry = parse_entry(
            "name: x\nprotocol: http\nauth:\n  type: get\n  credentials: []\n",
        )
        .unwrap();
        assert_eq!(entry.default_port, 80);
        assert!(!entry.ssl);
        assert!(entry.fingerprint.body.is_empty());
    }

    #[test]
    fn blank_token_fields_are_unset() {
        let entry = parse_entry(
            "name: x\nprotocol: http\nauth:\n  type: post\n  csrf: ''\n  sessionid: ' '\n",
        )
        .unwrap();
        assert_eq!(entry.auth.csrf, None);
        assert_eq!(entry.auth.sessionid, None);
    }

    #[test]
    fn unknown_auth_type_is_a_parse_error() {
        let err = parse_entry("name: x\nprotocol: http\nauth:\n  type: ntlm\n").unwrap_err();
        assert!(matches!(err, DefcredError::Parse(_)));
    }

    #[test]
    fn loads_directory_recursively_in_path_order() {
        let dir = TempDir::new();
        fs::create_dir_all(dir.0.join("web/nested")).unwrap();
        fs::write(dir.0.join("web/b_jenkins.yml"), JENKINS).unwrap();
        fs::write(
            dir.0.join("web/nested/a_jenkins.yaml"),
            JENKINS.replace("name: Jenkins", "name: Jenkins Nested"),
        )
        .unwrap();
        fs::write(dir.0.join("notes.txt"), "ignored").unwrap();

        let catalog = load_catalog(&dir.0).unwrap();
        let names: Vec<_> = catalog.iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["Jenkins", "Jenkins Nested"]);
    }

    #[test]
    fn invalid_file_fails_the_load() {
        let dir = TempDir::new();
        fs::write(dir.0.join("bad.yml"), JENKINS.replace("[/login]", "[login]")).unwrap();
        assert!(matches!(load_catalog(&dir.0), Err(DefcredError::Catalog(_))));
    }

    #[test]
    fn missing_directory_is_a_config_error() {
        let err = load_catalog(Path::new("/nonexistent/defcred/catalog")).unwrap_err();
        assert!(matches!(err, DefcredError::Config(_)));
    }
}
