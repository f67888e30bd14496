use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use rusqlite::Connection;

const DB_NAME: &str = "com.plexapp.plugins.library.db";

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("path_rewrite_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Library database with one plain table, three rows, two under /archive-media/.
fn write_library_db(dir: &TempDir) -> PathBuf {
    let path = dir.join(DB_NAME);
    let conn = Connection::open(&path).expect("failed to create database");
    conn.execute_batch(
        r#"
CREATE TABLE media_parts (id INTEGER PRIMARY KEY, file TEXT);
INSERT INTO media_parts (id, file) VALUES
    (1, '/archive-media/movies/Alien (1979)/Alien.mkv'),
    (2, '/archive-media/movies/Heat (1995)/Heat.mkv'),
    (3, '/tv/Severance/S01E01.mkv');
"#,
    )
    .expect("failed to seed database");
    path
}

fn files(path: &PathBuf) -> Vec<String> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare("SELECT file FROM media_parts ORDER BY id")
        .unwrap();
    let rows = stmt.query_map([], |row| row.get(0)).unwrap();
    rows.map(|r| r.unwrap()).collect()
}

fn path_rewrite(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_path-rewrite"))
        .args(args)
        .output()
        .expect("failed to run path-rewrite")
}

// ---------------------------------------------------------------------------
// Usage errors
// ---------------------------------------------------------------------------

#[test]
fn missing_location_exits_with_usage_code() {
    let out = path_rewrite(&["--old", "/archive-media/", "--new", "/media/"]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Provide --db-dir or --db-file"), "stderr: {stderr}");
}

#[test]
fn missing_database_file_fails_without_creating_it() {
    let dir = TempDir::new("missing_db");
    let out = path_rewrite(&[
        "--db-dir",
        dir.path().to_str().unwrap(),
        "--old",
        "/archive-media/",
        "--new",
        "/media/",
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!dir.join(DB_NAME).exists());
    assert!(!dir.join("backups").exists());
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[test]
fn dry_run_reports_matches_and_leaves_file_unchanged() {
    let dir = TempDir::new("dry_run");
    let db = write_library_db(&dir);
    let before = fs::read(&db).unwrap();

    let out = path_rewrite(&[
        "--db-dir",
        dir.path().to_str().unwrap(),
        "--old",
        "/archive-media/",
        "--new",
        "/media/",
        "--dry-run",
    ]);

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("== DRY RUN =="), "stdout: {stdout}");
    assert!(stdout.contains("media_parts.file: 2 row(s)"), "stdout: {stdout}");
    assert!(
        stdout.contains("Total rows containing '/archive-media/': 2"),
        "stdout: {stdout}"
    );
    assert_eq!(fs::read(&db).unwrap(), before);
    assert!(!dir.join("backups").exists(), "dry run must not back up");
}

// ---------------------------------------------------------------------------
// Real run
// ---------------------------------------------------------------------------

#[test]
fn apply_backs_up_rewrites_and_validates() {
    let dir = TempDir::new("apply");
    let db = write_library_db(&dir);
    let original = fs::read(&db).unwrap();

    let out = path_rewrite(&[
        "--db-file",
        db.to_str().unwrap(),
        "--old",
        "/archive-media/",
        "--new",
        "/media/",
    ]);

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Backed up:"), "stdout: {stdout}");
    assert!(stdout.contains("media_parts.file: 2 row(s) matched"), "stdout: {stdout}");
    assert!(stdout.contains("Total rows updated: 2"), "stdout: {stdout}");
    assert!(stdout.contains("PRAGMA integrity_check: ok"), "stdout: {stdout}");
    assert!(stdout.contains("VACUUM complete."), "stdout: {stdout}");

    assert_eq!(
        files(&db),
        vec![
            "/media/movies/Alien (1979)/Alien.mkv",
            "/media/movies/Heat (1995)/Heat.mkv",
            "/tv/Severance/S01E01.mkv",
        ]
    );

    let backups: Vec<_> = fs::read_dir(dir.join("backups"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read(&backups[0]).unwrap(), original);
}

#[test]
fn second_apply_is_a_no_op() {
    let dir = TempDir::new("idempotent");
    let db = write_library_db(&dir);
    let args = [
        "--db-file",
        db.to_str().unwrap(),
        "--old",
        "/archive-media/",
        "--new",
        "/media/",
    ];

    assert!(path_rewrite(&args).status.success());
    let out = path_rewrite(&args);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("No matches updated."), "stdout: {stdout}");
    assert!(stdout.contains("Total rows updated: 0"), "stdout: {stdout}");
}

#[test]
fn column_flag_overrides_allow_list() {
    let dir = TempDir::new("column_flag");
    let db = write_library_db(&dir);

    let out = path_rewrite(&[
        "--db-file",
        db.to_str().unwrap(),
        "--old",
        "/archive-media/",
        "--new",
        "/media/",
        "--column",
        "root_path",
    ]);

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("No matches updated."), "stdout: {stdout}");
    assert_eq!(files(&db)[0], "/archive-media/movies/Alien (1979)/Alien.mkv");
}

#[test]
fn config_file_sets_database_name_and_backup_dir() {
    let dir = TempDir::new("config");
    let conventional = write_library_db(&dir);
    let custom = dir.join("library.db");
    fs::rename(&conventional, &custom).unwrap();
    let config = dir.join("path-rewrite.yml");
    fs::write(&config, "database_file: library.db\nbackup_dir: snapshots\n").unwrap();

    let out = path_rewrite(&[
        "--db-dir",
        dir.path().to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--old",
        "/archive-media/",
        "--new",
        "/media/",
    ]);

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(dir.join("snapshots").is_dir());
    assert_eq!(files(&custom)[1], "/media/movies/Heat (1995)/Heat.mkv");
}

#[test]
fn json_format_emits_machine_readable_result() {
    let dir = TempDir::new("json");
    let db = write_library_db(&dir);

    let out = path_rewrite(&[
        "--db-file",
        db.to_str().unwrap(),
        "--old",
        "/archive-media/",
        "--new",
        "/media/",
        "--dry-run",
        "--format",
        "json",
    ]);

    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).expect("stdout is JSON");
    assert_eq!(report["result"]["status"], "previewed");
    assert_eq!(report["result"]["matches"][0]["target"]["table"], "media_parts");
    assert_eq!(report["result"]["matches"][0]["hits"], 2);
    assert!(report["backup"].is_null());
}

#[test]
fn suspicious_replacement_warns_on_stderr() {
    let dir = TempDir::new("warn");
    write_library_db(&dir);

    let out = path_rewrite(&[
        "--db-dir",
        dir.path().to_str().unwrap(),
        "--old",
        "/archive-media/",
        "--new",
        "/mnt/archive-media/",
        "--dry-run",
    ]);

    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("warning: the replacement contains"), "stderr: {stderr}");
}
