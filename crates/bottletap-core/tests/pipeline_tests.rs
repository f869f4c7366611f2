use bottletap_core::{
    classify_file, BottletapConfig, ClassifyError, Decision, ErrorKind, Label, Pipeline,
    SpectrogramTable,
};
use bottletap_table::TableWriter;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FREQS: [f64; 4] = [100.0, 800.0, 2500.0, 6000.0];
const TIMES: [f64; 5] = [0.0, 23.2, 46.4, 69.7, 92.9];

/// Decaying tap with energy concentrated in the given row
fn tap(dominant_row: usize, level: f64) -> SpectrogramTable {
    let rows = FREQS
        .iter()
        .enumerate()
        .map(|(idx, _)| {
            let base = if idx == dominant_row { level } else { level * 0.05 };
            TIMES.iter().enumerate().map(|(t, _)| base / (1 << t) as f64).collect()
        })
        .collect();
    SpectrogramTable::new(FREQS.to_vec(), TIMES.to_vec(), rows).unwrap()
}

fn write_table(dir: &Path, name: &str, table: &SpectrogramTable) -> PathBuf {
    let path = dir.join(name);
    TableWriter::new().write(&path, table).unwrap();
    path
}

fn write_raw(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

/// Reference files plus a config pointing at them with relative paths
fn setup(extra_config: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("refs")).unwrap();
    write_table(&dir.path().join("refs"), "top.csv", &tap(3, 2.0));
    write_table(&dir.path().join("refs"), "bottom.csv", &tap(0, 2.0));

    let config_path = dir.path().join("bottletap.toml");
    let config = format!(
        "[references]\ntop = \"refs/top.csv\"\nbottom = \"refs/bottom.csv\"\n{}",
        extra_config
    );
    std::fs::write(&config_path, config).unwrap();
    (dir, config_path)
}

fn pipeline(config_path: &Path) -> Pipeline {
    let config = BottletapConfig::load(config_path).unwrap();
    Pipeline::from_config(&config).unwrap()
}

#[test]
fn test_classifies_files_like_their_reference() {
    let (dir, config_path) = setup("");
    let pipeline = pipeline(&config_path);

    let bright = write_table(dir.path(), "unlabeled_01.csv", &tap(3, 1.8));
    let dull = write_table(dir.path(), "unlabeled_02.csv", &tap(0, 2.2));

    let prediction = classify_file(&bright, &pipeline).unwrap();
    assert_eq!(prediction.decision, Decision::Class(Label::Top));
    assert!(prediction.top_score < prediction.bottom_score);

    let prediction = classify_file(&dull, &pipeline).unwrap();
    assert_eq!(prediction.decision, Decision::Class(Label::Bottom));
}

#[test]
fn test_reference_file_classifies_as_itself() {
    let (dir, config_path) = setup("");
    let pipeline = pipeline(&config_path);

    let prediction = classify_file(&dir.path().join("refs/top.csv"), &pipeline).unwrap();
    assert_eq!(prediction.decision, Decision::Class(Label::Top));
    assert_eq!(prediction.top_score, 0.0);
}

#[test]
fn test_timing_schema_end_to_end() {
    let (dir, config_path) = setup("[features]\ninclude_timing = true\n");
    let pipeline = pipeline(&config_path);
    assert_eq!(pipeline.extractor().schema().len(), 13);

    let query = write_table(dir.path(), "q.csv", &tap(0, 2.0));
    let features = pipeline.extract_file(&query).unwrap();
    assert_eq!(features.len(), 13);
    let prediction = pipeline.classify_file(&query).unwrap();
    assert_eq!(prediction.decision, Decision::Class(Label::Bottom));
}

#[test]
fn test_per_file_errors_are_distinct() {
    let (dir, config_path) = setup("");
    let pipeline = pipeline(&config_path);

    let ragged = write_raw(dir.path(), "ragged.csv", "frequency,0,10\n100,1,2\n200,1\n");
    let no_columns = write_raw(dir.path(), "no_columns.csv", "frequency\n100\n200\n");
    let silent = write_raw(dir.path(), "silent.csv", "frequency,0,10\n100,0,0\n200,0,0\n");
    let single = write_raw(dir.path(), "single.csv", "frequency,0\n440,1.5\n");

    let kind = |path: &Path| pipeline.classify_file(path).unwrap_err().kind();
    assert_eq!(kind(&ragged), ErrorKind::Load);
    assert_eq!(kind(&no_columns), ErrorKind::MalformedInput);
    assert_eq!(kind(&silent), ErrorKind::UndefinedFeature);
    assert_eq!(kind(&dir.path().join("absent.csv")), ErrorKind::Load);

    // one row, one column: degenerate but classifiable
    assert!(pipeline.classify_file(&single).is_ok());
}

#[test]
fn test_bad_normalization_fails_before_classification() {
    let (_dir, config_path) = setup(
        "[classifier]\nstrategy = \"weighted_cosine\"\n\n\
         [normalization]\nmean = [0.0, 0.0]\nstd = [1.0, 1.0]\nweights = [1.0, 1.0]\n",
    );
    let err = BottletapConfig::load(&config_path).unwrap_err();
    assert!(matches!(err, ClassifyError::Configuration(_)));
}

#[test]
fn test_unusable_reference_is_configuration_error() {
    let (dir, config_path) = setup("");
    write_raw(&dir.path().join("refs"), "bottom.csv", "frequency,0\n100,0\n");

    let config = BottletapConfig::load(&config_path).unwrap();
    let err = Pipeline::from_config(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_weighted_cosine_end_to_end() {
    let (dir, config_path) = setup(
        "[classifier]\nstrategy = \"weighted_cosine\"\n\n\
         [normalization]\n\
         mean = [0.2, 0.2, 0.1, 0.1, 0.2, 3000.0, -0.03, 3000.0]\n\
         std = [0.1, 0.3, 0.2, 0.2, 0.3, 2500.0, 0.01, 2000.0]\n\
         weights = [1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 0.5, 2.0]\n",
    );
    // default bands are low/mid/high: 7 features, so an 8-entry table is rejected
    assert!(BottletapConfig::load(&config_path).is_err());

    let config_path = dir.path().join("cosine.toml");
    std::fs::write(
        &config_path,
        "[references]\ntop = \"refs/top.csv\"\nbottom = \"refs/bottom.csv\"\n\n\
         [classifier]\nstrategy = \"weighted_cosine\"\n\n\
         [normalization]\n\
         mean = [0.2, 0.2, 0.1, 0.1, 3000.0, -0.03, 3000.0]\n\
         std = [0.1, 0.3, 0.2, 0.2, 2500.0, 0.01, 2000.0]\n\
         weights = [1.0, 1.0, 1.0, 1.0, 2.0, 0.5, 2.0]\n",
    )
    .unwrap();
    let pipeline = pipeline(&config_path);

    let query = write_table(dir.path(), "q.csv", &tap(3, 1.5));
    let prediction = pipeline.classify_file(&query).unwrap();
    assert_eq!(prediction.decision, Decision::Class(Label::Top));
}

#[test]
fn test_huge_magnitude_is_undefined_not_a_label() {
    let (dir, config_path) = setup("");
    let pipeline = pipeline(&config_path);

    let loud = write_raw(dir.path(), "loud.csv", "frequency,0\n440,1e200\n");
    assert!(pipeline.extract_file(&loud).is_ok());
    let err = pipeline.classify_file(&loud).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UndefinedFeature);
}
