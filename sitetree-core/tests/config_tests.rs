// Tests for configuration and allow-list loading

use sitetree_core::{AllowList, TreeError};
use std::io::Write;
use tempfile::NamedTempFile;
use url::Url;

#[test]
fn test_load_allow_list() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "example.com")?;
    writeln!(temp_file)?;
    writeln!(temp_file, "  docs.example.com  ")?;
    writeln!(temp_file, "   ")?;

    let allow = AllowList::load(temp_file.path())?;

    assert_eq!(allow.len(), 2);
    assert!(allow.contains("example.com"));
    assert!(allow.contains("docs.example.com"));
    assert!(!allow.contains("api.example.com"));
    Ok(())
}

#[test]
fn test_load_missing_allow_list() {
    let dir = tempfile::tempdir().unwrap();
    let result = AllowList::load(&dir.path().join("nope.txt"));
    assert!(matches!(result, Err(TreeError::Config(msg)) if msg.contains("nope.txt")));
}

#[test]
fn test_check_uses_hostname_only() {
    let allow = AllowList::new(["localhost"]);
    assert!(allow.check(&Url::parse("http://localhost:3000/path?q=1").unwrap()).is_ok());
    assert!(allow.check(&Url::parse("http://127.0.0.1:3000/").unwrap()).is_err());
}

#[test]
fn test_empty_allow_list_denies_everything() {
    let allow = AllowList::default();
    assert!(allow.is_empty());
    assert!(matches!(
        allow.check(&Url::parse("https://example.com/").unwrap()),
        Err(TreeError::HostNotAllowed(_))
    ));
}
