use assert_cmd::Command;
use tempfile::tempdir;

const NO_DIRECTORY: &str = "No save directory parameter passed; exiting.";
const USAGE_HINT: &str = "Please pass a directory to the -d or --save-directory argument.";

fn capture_bin() -> Command {
    let mut cmd = Command::cargo_bin("frame-lapse-capture").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn assert_missing_directory(cmd: &mut Command) {
    let output = cmd.assert().failure().code(1).get_output().clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(NO_DIRECTORY), "stderr was: {stderr}");
    assert!(stderr.contains(USAGE_HINT), "stderr was: {stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn no_arguments_prints_guidance_and_fails() {
    assert_missing_directory(&mut capture_bin());
}

#[test]
fn empty_save_directory_prints_guidance_and_fails() {
    assert_missing_directory(capture_bin().args(["-d", ""]));
}

#[test]
fn unreachable_camera_writes_nothing() {
    let tmp = tempdir().unwrap();
    let config = tmp.path().join("capture.toml");
    std::fs::write(
        &config,
        "[camera]\nurl = \"http://127.0.0.1:9/frame\"\nconnect_timeout_secs = 1\n",
    )
    .unwrap();
    let frames = tmp.path().join("frames");
    std::fs::create_dir(&frames).unwrap();

    capture_bin()
        .arg("-d")
        .arg(&frames)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1);

    assert_eq!(std::fs::read_dir(&frames).unwrap().count(), 0);
}
