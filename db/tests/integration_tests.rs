use std::path::Path;

use path_rewrite_db::{
    DatabaseError, DatabaseLocation, RewriteConfig, backup_database, file_checksum, sidecar_path,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_config(dir: &Path, yaml: &str) -> std::path::PathBuf {
    let path = dir.join("path-rewrite.yml");
    std::fs::write(&path, yaml).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Configuration + location
// ---------------------------------------------------------------------------

#[test]
fn test_configured_file_name_is_resolved_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        dir.path(),
        "database_file: media.db\ncandidate_columns: [file, root_path]\n",
    );
    let config = RewriteConfig::load(&config_path).unwrap();
    std::fs::write(dir.path().join("media.db"), b"").unwrap();

    let location = DatabaseLocation::from_args(Some(dir.path().to_path_buf()), None).unwrap();
    let resolved = location.resolve(&config.database_file).unwrap();
    assert_eq!(resolved, dir.path().join("media.db"));
    assert!(config.candidate_columns.contains("root_path"));
    assert!(!config.candidate_columns.contains("path"));
}

#[test]
fn test_default_file_name_missing_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = RewriteConfig::default();
    let location = DatabaseLocation::Directory(dir.path().to_path_buf());
    let err = location.resolve(&config.database_file).unwrap_err();
    assert!(
        err.to_string()
            .contains("com.plexapp.plugins.library.db"),
        "unexpected message: {err}"
    );
}

#[test]
fn test_invalid_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path(), "candidate_columns: []\n");
    assert!(matches!(
        RewriteConfig::load(&config_path),
        Err(DatabaseError::YamlError(_))
    ));

    let config_path = write_config(dir.path(), "backup_dir: ''\n");
    assert!(matches!(
        RewriteConfig::load(&config_path),
        Err(DatabaseError::InvalidConfig(_))
    ));
}

// ---------------------------------------------------------------------------
// Backups
// ---------------------------------------------------------------------------

#[test]
fn test_backup_set_is_a_byte_identical_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("library.db");
    std::fs::write(&db, vec![7u8; 64 * 1024]).unwrap();
    std::fs::write(sidecar_path(&db, "-wal"), b"pending frames").unwrap();

    let set = backup_database(&db, "backups").unwrap();
    assert_eq!(set.directory, dir.path().join("backups"));
    assert_eq!(set.copies.len(), 2);

    for copy in &set.copies {
        assert_eq!(file_checksum(&copy.source).unwrap(), copy.sha256);
        assert_eq!(file_checksum(&copy.destination).unwrap(), copy.sha256);
        assert!(
            copy.destination
                .file_name()
                .unwrap()
                .to_string_lossy()
                .ends_with(&format!(".{}.bak", set.tag))
        );
    }
    assert_eq!(set.copies[0].bytes, 64 * 1024);
}

#[test]
fn test_backup_honors_configured_directory() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("library.db");
    std::fs::write(&db, b"data").unwrap();

    let set = backup_database(&db, "snapshots").unwrap();
    assert_eq!(set.directory, dir.path().join("snapshots"));
    assert!(!dir.path().join("backups").exists());
}
