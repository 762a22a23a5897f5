use std::fs;
use std::io::Cursor;

use aligner_lib::cli::{drive, run_cli, Args};
use aligner_lib::{AlignerSettings, AlignmentController, LogRenderer, Progress};

const RECORDINGS: &str = r#"{
    "reference": {
        "name": "watch",
        "time": { "timestamps": [
            "2024-03-01T12:00:00Z", "2024-03-01T12:00:01Z", "2024-03-01T12:00:02Z",
            "2024-03-01T12:00:03Z", "2024-03-01T12:00:04Z"
        ] },
        "columns": { "x": [0.0, 3.0, 0.0, 3.0, 0.0], "y": [1.0, 4.0, 1.0, 4.0, null] }
    },
    "candidates": [
        { "name": "rcs_left", "time": { "seconds": [0, 1000, 2000, 3000, 4000] }, "time_scale": 1000,
          "columns": { "accel": [0.0, 2.0, 0.0, 2.0, 0.0] } },
        { "name": "rcs_right", "time": { "seconds": [0.5, 1.5, 2.5, 3.5] },
          "columns": { "accel": [0.0, 2.0, 0.0, 2.0] } }
    ]
}"#;

#[test]
fn script_run_writes_result_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("recordings.json");
    let script = dir.path().join("commands.txt");
    let output = dir.path().join("result.json");
    fs::write(&input, RECORDINGS).unwrap();
    fs::write(
        &script,
        "ctrl-shift-right\nenter\nbogus\n\nctrl-shift-left\nd\ncomment right side lags\nenter\nenter\n",
    )
    .unwrap();

    let args = Args {
        input,
        scale: Some(1.0),
        settings: None,
        script: Some(script),
        output: Some(output.clone()),
    };
    let result = run_cli(args, LogRenderer::new()).unwrap();
    assert_eq!(result.offsets().len(), 2);

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
    assert_eq!(written["rcs_left"], serde_json::json!(1.0));
    assert_eq!(written["rcs_right"], serde_json::json!(-1.0));
    assert_eq!(written["comment"], serde_json::json!("right side lags"));
    assert!(written["warnings"]["data missing warning"].is_string());
}

#[test]
fn drive_stops_at_end_of_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("recordings.json");
    fs::write(&input, RECORDINGS).unwrap();

    let (reference, candidates) = aligner_lib::input::AlignmentInput::load(&input)
        .unwrap()
        .into_raw()
        .unwrap();
    let mut controller = AlignmentController::from_raw(
        &reference,
        &candidates,
        LogRenderer::new(),
        AlignerSettings::default(),
    )
    .unwrap();

    drive(&mut controller, Cursor::new("enter\nz\nenter\n")).unwrap();
    assert_eq!(controller.progress(), Progress::Aligning(1));
    assert!(controller.renderer().frames() > 0);
}

#[test]
fn missing_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let args = Args {
        input: dir.path().join("absent.json"),
        scale: None,
        settings: None,
        script: None,
        output: None,
    };
    let err = run_cli(args, LogRenderer::new()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read recordings"));
}

#[test]
fn settings_help_describes_fallback() {
    use clap::CommandFactory;

    let command = Args::command();
    let settings = command
        .get_arguments()
        .find(|arg| arg.get_id() == "settings")
        .unwrap();
    let help = settings.get_help().unwrap().to_string();
    assert!(help.contains("defaults when absent"));
    assert!(!help.contains("save"));
}
