use bottletap_cli::batch::BatchRunner;
use bottletap_cli::output::{predictions_json, render_evaluation};
use bottletap_core::evaluation::parse_answer_key;
use bottletap_core::{BottletapConfig, Decision, ErrorKind, Evaluation, Label, Outcome, Pipeline};
use std::path::Path;

/// Two-band spectrogram; `bright` puts the energy in the upper band
fn tap(bright: bool, level: f64) -> String {
    let (low, high) = if bright { (0.1, level) } else { (level, 0.1) };
    format!(
        "frequency,0,10,20\n200,{},{},{}\n4000,{},{},{}\n",
        low,
        low / 2.0,
        low / 4.0,
        high,
        high / 2.0,
        high / 4.0
    )
}

fn write(dir: &Path, name: &str, text: &str) {
    std::fs::write(dir.join(name), text).unwrap();
}

fn pipeline(dir: &Path) -> Pipeline {
    write(dir, "top.csv", &tap(true, 4.0));
    write(dir, "bottom.csv", &tap(false, 4.0));
    let config = format!(
        "[references]\ntop = \"{}\"\nbottom = \"{}\"\n",
        dir.join("top.csv").display(),
        dir.join("bottom.csv").display()
    );
    let config = BottletapConfig::from_toml(&config).unwrap();
    Pipeline::from_config(&config).unwrap()
}

#[test]
fn test_batch_isolates_per_file_errors() {
    let refs = tempfile::tempdir().unwrap();
    let pipeline = pipeline(refs.path());

    let data = tempfile::tempdir().unwrap();
    write(data.path(), "unlabeled_01.csv", &tap(true, 3.0));
    write(data.path(), "unlabeled_02.csv", &tap(false, 5.0));
    write(data.path(), "unlabeled_03.csv", "frequency,0,10\n200,1\n");
    write(data.path(), "unlabeled_04.csv", "frequency,0\n200,0\n4000,0\n");
    write(data.path(), "readme.txt", "not a spectrogram");

    let report = BatchRunner::new(&pipeline).run(data.path()).unwrap();
    let outcomes = report.outcome_map();
    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes["unlabeled_01"], Outcome::Decided(Decision::Class(Label::Top)));
    assert_eq!(outcomes["unlabeled_02"], Outcome::Decided(Decision::Class(Label::Bottom)));
    assert_eq!(outcomes["unlabeled_03"], Outcome::Failed(ErrorKind::Load));
    assert_eq!(outcomes["unlabeled_04"], Outcome::Failed(ErrorKind::UndefinedFeature));

    let summary = report.summary();
    assert_eq!((summary.top, summary.bottom, summary.undecided), (1, 1, 0));
    assert_eq!(summary.failed.values().sum::<usize>(), 2);
}

#[test]
fn test_batch_predictions_json() {
    let refs = tempfile::tempdir().unwrap();
    let pipeline = pipeline(refs.path());

    let data = tempfile::tempdir().unwrap();
    write(data.path(), "unlabeled_01.csv", &tap(true, 3.0));
    write(data.path(), "unlabeled_02.csv", "frequency\n200\n");

    let report = BatchRunner::new(&pipeline).run(data.path()).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&predictions_json(&report).unwrap()).unwrap();

    assert_eq!(json["predictions"]["unlabeled_01"]["outcome"], "top");
    assert_eq!(json["predictions"]["unlabeled_01"]["prediction"]["decision"], "top");
    assert_eq!(json["predictions"]["unlabeled_02"]["outcome"], "error:malformed_input");
    assert!(json["predictions"]["unlabeled_02"]["error"].is_string());
    assert_eq!(json["summary"]["files"], 2);
    assert_eq!(json["summary"]["failed"]["malformed_input"], 1);
}

#[test]
fn test_batch_then_evaluate() {
    let refs = tempfile::tempdir().unwrap();
    let pipeline = pipeline(refs.path());

    let data = tempfile::tempdir().unwrap();
    write(data.path(), "top_1.csv", &tap(true, 4.0));
    write(data.path(), "bottom_1.csv", &tap(false, 4.0));
    write(data.path(), "unlabeled_01.csv", &tap(true, 2.0));
    write(data.path(), "unlabeled_02.csv", &tap(true, 2.5));

    let key = parse_answer_key(
        r#"{
            "top_1": "top",
            "bottom_1": "bottom",
            "unlabeled_01": "top",
            "unlabeled_02": "bottom"
        }"#,
    )
    .unwrap();
    let report = BatchRunner::new(&pipeline).run(data.path()).unwrap();
    let evaluation = Evaluation::new(&report.outcome_map(), &key);

    assert_eq!(evaluation.groups["labeled"].correct, 2);
    assert_eq!(evaluation.groups["unlabeled"].correct, 1);
    assert_eq!(evaluation.groups["unlabeled"].incorrect, 1);

    let text = render_evaluation(&evaluation);
    assert!(text.starts_with("Top-line results:\nlabeled: 2 correct, 0 incorrect"));
    assert!(text.contains("unlabeled: 1 correct, 1 incorrect, 0 undecided, 0 failed"));
}

#[test]
fn test_batch_rejects_missing_directory() {
    let refs = tempfile::tempdir().unwrap();
    let pipeline = pipeline(refs.path());
    let err = BatchRunner::new(&pipeline)
        .run(&refs.path().join("missing"))
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}
