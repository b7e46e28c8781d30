use std::fs;
use std::path::PathBuf;

fn snapshot_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
        .join(name)
}

/// Render recorded events one per line, with a trailing newline.
pub fn render_trace(events: &[String]) -> String {
    let mut out = events.join("\n");
    out.push('\n');
    out
}

/// Compare `actual` with the stored snapshot; `TANDEM_UPDATE_SNAPSHOTS=1` rewrites it.
pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_path(name);
    if std::env::var_os("TANDEM_UPDATE_SNAPSHOTS").is_some() {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("snapshot {} unreadable: {err}", path.display()));
    let expected = expected.replace("\r\n", "\n");
    assert_eq!(
        expected,
        actual,
        "trace differs from {}; set TANDEM_UPDATE_SNAPSHOTS=1 to regenerate",
        path.display()
    );
}
