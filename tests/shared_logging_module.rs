use strava_setup::shared::logging::{append_setup_log_line, setup_log_path};

#[test]
fn appended_lines_accumulate_in_the_setup_log() {
    let state_root = tempfile::tempdir().expect("tempdir");

    append_setup_log_line(state_root.path(), "[OK] Persist credentials: Secrets set.")
        .expect("first append");
    append_setup_log_line(state_root.path(), "[SKIPPED] Watch workflow run: Skipped.")
        .expect("second append");

    let contents =
        std::fs::read_to_string(setup_log_path(state_root.path())).expect("read log");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "[OK] Persist credentials: Secrets set.",
            "[SKIPPED] Watch workflow run: Skipped.",
        ]
    );
}

#[test]
fn log_directory_is_created_on_first_write() {
    let state_root = tempfile::tempdir().expect("tempdir");
    let path = setup_log_path(state_root.path());
    assert!(!path.exists());

    append_setup_log_line(state_root.path(), "first line").expect("append");
    assert!(path.exists());
}
