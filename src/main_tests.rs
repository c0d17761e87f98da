use super::{CliArgs, parse_cli_args, resolve_event_log_path};
use std::path::PathBuf;

#[test]
fn cli_parser_reads_event_log_path() {
    let parsed = parse_cli_args(vec![
        "--event-log".to_string(),
        "/tmp/events.jsonl".to_string(),
    ])
    .expect("arguments should parse");

    assert_eq!(
        parsed,
        CliArgs {
            event_log_path: Some(PathBuf::from("/tmp/events.jsonl")),
            debug_record: false,
        }
    );
}

#[test]
fn cli_parser_requires_event_log_path() {
    let error = parse_cli_args(vec!["--event-log".to_string()])
        .expect_err("missing event log path should fail");
    assert_eq!(error.kind(), std::io::ErrorKind::InvalidInput);
}

#[test]
fn cli_parser_reads_debug_record_flag() {
    let parsed =
        parse_cli_args(vec!["--debug-record".to_string()]).expect("debug flag should parse");
    assert_eq!(
        parsed,
        CliArgs {
            event_log_path: None,
            debug_record: true,
        }
    );
}

#[test]
fn relative_event_log_paths_land_in_record_directory() {
    assert_eq!(
        resolve_event_log_path(PathBuf::from("events.jsonl")),
        PathBuf::from(".rivet/events.jsonl")
    );
    assert_eq!(
        resolve_event_log_path(PathBuf::from(".rivet/nested/events.jsonl")),
        PathBuf::from(".rivet/nested/events.jsonl")
    );
    assert_eq!(
        resolve_event_log_path(PathBuf::from("/tmp/events.jsonl")),
        PathBuf::from("/tmp/events.jsonl")
    );
}
