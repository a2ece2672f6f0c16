use std::{
    fs,
    path::PathBuf,
    process::{Command, Stdio},
};

use flp_parser::{encode_flp, event::id, Event, Header, TextEncoding};
use tempfile::TempDir;

const U16: TextEncoding = TextEncoding::Utf16Le;

fn norm_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "")
}

fn flpinfo() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_flpinfo"));
    cmd.env_remove("CLICOLOR_FORCE")
        .env_remove("RUST_LOG")
        .env("COLUMNS", "80");
    cmd
}

fn write_flp(dir: &TempDir, name: &str, events: &[Event]) -> PathBuf {
    let header = Header {
        format: 0,
        channel_count: 2,
        ppq: 96,
    };
    let path = dir.path().join(name);
    fs::write(&path, encode_flp(&header, events)).unwrap();
    path
}

fn full_project() -> Vec<Event> {
    let mut events = vec![
        Event::text(id::VERSION, "20.8.4.2576", TextEncoding::Latin1),
        Event::text(id::TITLE, "Night Drive", U16),
        Event::text(id::ARTISTS, "Someone", U16),
        Event::text(id::GENRE, "Synthwave", U16),
        Event::text(id::URL, "https://example.com/night-drive", U16),
        Event::dword(id::TEMPO, 120_000),
        Event::word(id::CHANNEL_NEW, 0),
        Event::byte(id::CHANNEL_TYPE, 0),
        Event::text(id::DEFAULT_NAME, "Sampler", U16),
        Event::text(id::NAME, "Kick", U16),
        Event::text(id::SAMPLE_PATH, "Drums/Kick.wav", U16),
        Event::word(id::CHANNEL_NEW, 1),
        Event::byte(id::CHANNEL_TYPE, 2),
        Event::text(id::DEFAULT_NAME, "3x Osc", U16),
    ];
    for i in 1..=30u16 {
        events.push(Event::word(id::PATTERN_NEW, i));
        events.push(Event::text(id::PATTERN_NAME, &format!("Pattern number {i}"), U16));
    }
    events.extend([
        Event::word(id::ARRANGEMENT_NEW, 0),
        Event::text(id::ARRANGEMENT_NAME, "Arrangement", U16),
        Event::blob(id::TRACK_DATA, 1u32.to_le_bytes().to_vec()),
        Event::text(id::TRACK_NAME, "Drums", U16),
        Event::blob(id::INSERT_FLAGS, vec![0; 12]),
        Event::text(id::DEFAULT_NAME, "Fruity Limiter", U16),
        Event::word(id::SLOT_INDEX, 0),
        Event::dword(id::INSERT_OUTPUT, u32::MAX),
    ]);
    events
}

#[test]
fn summary_prints_fields() {
    let dir = TempDir::new().unwrap();
    let flp = write_flp(&dir, "song.flp", &full_project());

    let output = flpinfo().arg(&flp).output().unwrap();
    assert!(output.status.success());

    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));
    assert!(!stdout.contains('\x1b'), "stdout is not a terminal");
    assert!(stdout.contains("Title:            Night Drive\n"));
    assert!(stdout.contains("Tempo (BPM):      120\n"));
    assert!(stdout.contains("FL Version:       20.8.4.2576\n"));
    assert!(stdout.contains("Channel(s):       2 [Kick, 3x Osc]\n"));
    assert!(stdout.contains("Arrangement(s):   1 [Arrangement]\n"));
    assert!(stdout.contains("--full-lists"));
    assert!(!stdout.contains("corrupted"));
}

#[test]
fn long_lists_are_truncated_to_terminal_width() {
    let dir = TempDir::new().unwrap();
    let flp = write_flp(&dir, "song.flp", &full_project());

    let output = flpinfo().arg(&flp).output().unwrap();
    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));
    let line = stdout
        .lines()
        .find(|l| l.starts_with("Pattern(s):"))
        .unwrap();
    assert!(line.chars().count() <= 80, "{line}");
    assert!(line.ends_with("...]"));

    let output = flpinfo().args(["--full-lists"]).arg(&flp).output().unwrap();
    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));
    assert!(stdout.contains("Pattern number 30]"));
    assert!(!stdout.contains("If you want to see the full lists"));
}

#[test]
fn empty_project_is_reported_as_corrupted() {
    let dir = TempDir::new().unwrap();
    let flp = write_flp(&dir, "empty.flp", &[]);

    let output = flpinfo().arg(&flp).output().unwrap();
    assert!(output.status.success());

    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));
    assert!(stdout.contains("Channel(s):       0\n"));
    assert!(stdout.contains("Pattern(s):       0\n"));
    assert!(stdout.contains("FLP seems to have been corrupted, try inspecting in FLPInspect"));
}

#[test]
fn forced_color_emits_escapes_and_no_color_wins() {
    let dir = TempDir::new().unwrap();
    let flp = write_flp(&dir, "empty.flp", &[]);

    let colored = flpinfo()
        .env("CLICOLOR_FORCE", "1")
        .arg(&flp)
        .output()
        .unwrap();
    assert!(String::from_utf8_lossy(&colored.stdout).contains('\x1b'));

    let plain = flpinfo()
        .env("CLICOLOR_FORCE", "1")
        .args(["--no-color"])
        .arg(&flp)
        .output()
        .unwrap();
    assert!(!String::from_utf8_lossy(&plain.stdout).contains('\x1b'));
}

#[test]
fn json_summary() {
    let dir = TempDir::new().unwrap();
    let flp = write_flp(&dir, "song.flp", &full_project());

    let output = flpinfo().args(["--json"]).arg(&flp).output().unwrap();
    assert!(output.status.success());

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["title"], "Night Drive");
    assert_eq!(v["tempo"], serde_json::json!(120.0));
    assert_eq!(v["channels"], serde_json::json!(["Kick", "3x Osc"]));
    assert_eq!(v["patterns"].as_array().unwrap().len(), 30);
}

#[test]
fn json_with_subcommand_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let flp = write_flp(&dir, "song.flp", &full_project());

    let output = flpinfo()
        .args(["--json", "channels", flp.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("--json only applies to the summary"), "{stderr}");
}

#[test]
fn closed_stdout_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let flp = write_flp(&dir, "song.flp", &full_project());

    let mut child = flpinfo()
        .args(["--full-lists", "patterns"])
        .arg(&flp)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    drop(child.stdout.take());
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("Broken pipe"), "{stderr}");
}

#[test]
fn channels_subcommand_lists_table() {
    let dir = TempDir::new().unwrap();
    let flp = write_flp(&dir, "song.flp", &full_project());

    let output = flpinfo()
        .args(["channels", flp.to_str().unwrap(), "--sort-by", "type"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines[0], "Index  Name    Type");
    assert_eq!(lines[1], "1      3x Osc  Instrument");
    assert_eq!(lines[2], "0      Kick    Sampler");
}

#[test]
fn inspection_subcommands_succeed() {
    let dir = TempDir::new().unwrap();
    let flp = write_flp(&dir, "song.flp", &full_project());
    let flp = flp.to_str().unwrap();

    let cases: &[(&[&str], &str)] = &[
        (&["arrangements"], "Arrangement"),
        (&["inserts"], "Fruity Limiter"),
        (&["instruments"], "3x Osc"),
        (&["instruments", "--plugins-only"], "No instruments found."),
        (&["samplers"], "Drums/Kick.wav"),
        (&["samples"], "Drums/Kick.wav"),
        (&["patterns"], "Pattern number 30"),
        (&["plugins"], "Fruity Limiter"),
        (&["tracks"], "Drums"),
    ];
    for (args, expected) in cases {
        let output = flpinfo().args(*args).arg(flp).output().unwrap();
        assert!(output.status.success(), "{args:?}");
        let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));
        assert!(stdout.contains(expected), "{args:?}: {stdout}");
    }
}

#[test]
fn unknown_arrangement_fails() {
    let dir = TempDir::new().unwrap();
    let flp = write_flp(&dir, "song.flp", &full_project());

    let output = flpinfo()
        .args(["tracks", flp.to_str().unwrap(), "3"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("Error: arrangement 3 not found (project has 1)"));
}

#[test]
fn malformed_file_reports_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.flp");
    fs::write(&path, b"not an flp at all").unwrap();

    let output = flpinfo().arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("Error: failed to parse: "));
    assert!(stderr.contains("Caused by:"));
    assert!(stderr.contains("E1001: not an FL Studio project (bad FLhd magic) (offset 0)"));
}

#[test]
fn zipped_project_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("song.zip");
    fs::write(&path, b"PK\x03\x04\x14\x00").unwrap();

    let output = flpinfo().arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("E2002: zipped projects are not supported"));
}

#[test]
fn missing_file_is_rejected_by_argument_parsing() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.flp");

    let output = flpinfo().arg(&missing).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("no such file"));
}

#[test]
fn no_arguments_is_a_usage_error() {
    let output = flpinfo().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn verbose_logs_to_stderr() {
    let dir = TempDir::new().unwrap();
    let flp = write_flp(&dir, "song.flp", &full_project());

    let output = flpinfo().args(["-v"]).arg(&flp).output().unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("read") && stderr.contains("events"), "{stderr}");
}

#[test]
fn help_mentions_subcommands() {
    let output = flpinfo().arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));

    for sub in ["arrangements", "channels", "inserts", "plugins", "tracks"] {
        assert!(stdout.contains(sub), "{sub}");
    }
}
