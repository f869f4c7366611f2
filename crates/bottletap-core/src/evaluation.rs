//! Scoring batch predictions against an answer key
//!
//! Stems are grouped by the prefix before their first `_`, with the
//! labeled reference recordings (`top_*`, `bottom_*`) folded into one
//! `labeled` group. Abstentions and failures are counted apart from
//! wrong answers.

use crate::classifier::{Decision, Label, Prediction};
use crate::error::{ErrorKind, Result};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Expected label per file stem
pub type AnswerKey = BTreeMap<String, Label>;

/// Group name shared by `top_*` and `bottom_*` stems
pub const LABELED_GROUP: &str = "labeled";

/// Placeholder for a missing actual or predicted value
pub const NONE: &str = "none";

/// Parse a JSON answer key: `{"stem": "top" | "bottom", ...}`
pub fn parse_answer_key(json: &str) -> serde_json::Result<AnswerKey> {
    serde_json::from_str(json)
}

/// What happened to one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Decided(Decision),
    Failed(ErrorKind),
}

impl Outcome {
    pub fn from_result(result: &Result<Prediction>) -> Self {
        match result {
            Ok(prediction) => Outcome::Decided(prediction.decision),
            Err(e) => Outcome::Failed(e.kind()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Decided(decision) => write!(f, "{}", decision),
            Outcome::Failed(kind) => write!(f, "error:{}", kind),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Group a stem belongs to
pub fn group_of(stem: &str) -> String {
    let prefix = stem.split('_').next().unwrap_or(stem);
    match prefix {
        "top" | "bottom" => LABELED_GROUP.to_string(),
        other => other.to_string(),
    }
}

/// Per-group tallies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupCounts {
    pub correct: usize,
    pub incorrect: usize,
    pub undecided: usize,
    pub failed: usize,
    /// Classified but absent from the answer key
    pub unscored: usize,
    /// In the answer key but never classified
    pub missing: usize,
}

impl GroupCounts {
    fn add(&mut self, other: &GroupCounts) {
        self.correct += other.correct;
        self.incorrect += other.incorrect;
        self.undecided += other.undecided;
        self.failed += other.failed;
        self.unscored += other.unscored;
        self.missing += other.missing;
    }
}

/// Number of stems per (group, actual, predicted) combination
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CombinationCount {
    pub group: String,
    pub actual: String,
    pub predicted: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub groups: BTreeMap<String, GroupCounts>,
    pub combinations: Vec<CombinationCount>,
}

impl Evaluation {
    pub fn new(outcomes: &BTreeMap<String, Outcome>, key: &AnswerKey) -> Self {
        let stems: BTreeSet<&String> = outcomes.keys().chain(key.keys()).collect();

        let mut groups: BTreeMap<String, GroupCounts> = BTreeMap::new();
        let mut combinations: BTreeMap<(String, String, String), usize> = BTreeMap::new();

        for stem in stems {
            let group = group_of(stem);
            let actual = key.get(stem.as_str());
            let outcome = outcomes.get(stem.as_str());
            let counts = groups.entry(group.clone()).or_default();

            match (outcome, actual) {
                (None, _) => counts.missing += 1,
                (Some(_), None) => counts.unscored += 1,
                (Some(Outcome::Failed(_)), Some(_)) => counts.failed += 1,
                (Some(Outcome::Decided(Decision::Undecided)), Some(_)) => counts.undecided += 1,
                (Some(Outcome::Decided(Decision::Class(predicted))), Some(expected)) => {
                    if predicted == expected {
                        counts.correct += 1;
                    } else {
                        counts.incorrect += 1;
                    }
                }
            }

            let actual = actual.map_or_else(|| NONE.to_string(), |l| l.to_string());
            let predicted = outcome.map_or_else(|| "missing".to_string(), |o| o.to_string());
            *combinations.entry((group, actual, predicted)).or_insert(0) += 1;
        }

        let combinations = combinations
            .into_iter()
            .map(|((group, actual, predicted), count)| CombinationCount {
                group,
                actual,
                predicted,
                count,
            })
            .collect();

        Self {
            groups,
            combinations,
        }
    }

    /// Tallies summed over all groups
    pub fn total(&self) -> GroupCounts {
        let mut total = GroupCounts::default();
        for counts in self.groups.values() {
            total.add(counts);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes(entries: &[(&str, Outcome)]) -> BTreeMap<String, Outcome> {
        entries.iter().map(|(s, o)| (s.to_string(), *o)).collect()
    }

    #[test]
    fn test_group_of() {
        assert_eq!(group_of("top_01"), "labeled");
        assert_eq!(group_of("bottom_3"), "labeled");
        assert_eq!(group_of("unlabeled_42"), "unlabeled");
        assert_eq!(group_of("validation_07"), "validation");
        assert_eq!(group_of("plain"), "plain");
    }

    #[test]
    fn test_parse_answer_key() {
        let key = parse_answer_key(r#"{"unlabeled_01": "top", "unlabeled_02": "bottom"}"#).unwrap();
        assert_eq!(key["unlabeled_01"], Label::Top);
        assert_eq!(key["unlabeled_02"], Label::Bottom);
        assert!(parse_answer_key(r#"{"x": "middle"}"#).is_err());
    }

    #[test]
    fn test_counts_keep_abstentions_and_failures_apart() {
        let key: AnswerKey = [
            ("top_1", Label::Top),
            ("bottom_1", Label::Bottom),
            ("unlabeled_01", Label::Top),
            ("unlabeled_02", Label::Bottom),
            ("unlabeled_03", Label::Top),
            ("unlabeled_04", Label::Top),
        ]
        .into_iter()
        .map(|(s, l)| (s.to_string(), l))
        .collect();

        let outcomes = outcomes(&[
            ("top_1", Outcome::Decided(Decision::Class(Label::Top))),
            ("bottom_1", Outcome::Decided(Decision::Class(Label::Top))),
            ("unlabeled_01", Outcome::Decided(Decision::Undecided)),
            ("unlabeled_02", Outcome::Failed(ErrorKind::UndefinedFeature)),
            ("unlabeled_03", Outcome::Decided(Decision::Class(Label::Top))),
            ("extra_1", Outcome::Decided(Decision::Class(Label::Bottom))),
        ]);

        let evaluation = Evaluation::new(&outcomes, &key);

        let labeled = &evaluation.groups["labeled"];
        assert_eq!((labeled.correct, labeled.incorrect), (1, 1));

        let unlabeled = &evaluation.groups["unlabeled"];
        assert_eq!(unlabeled.correct, 1);
        assert_eq!(unlabeled.incorrect, 0);
        assert_eq!(unlabeled.undecided, 1);
        assert_eq!(unlabeled.failed, 1);
        assert_eq!(unlabeled.missing, 1);

        assert_eq!(evaluation.groups["extra"].unscored, 1);

        let total = evaluation.total();
        assert_eq!(total.correct + total.incorrect + total.undecided + total.failed, 5);
        assert_eq!(total.missing, 1);
    }

    #[test]
    fn test_combination_counts() {
        let key: AnswerKey = [("unlabeled_01", Label::Top), ("unlabeled_02", Label::Top)]
            .into_iter()
            .map(|(s, l)| (s.to_string(), l))
            .collect();
        let outcomes = outcomes(&[
            ("unlabeled_01", Outcome::Decided(Decision::Class(Label::Top))),
            ("unlabeled_02", Outcome::Decided(Decision::Class(Label::Top))),
            ("unlabeled_03", Outcome::Failed(ErrorKind::Load)),
        ]);

        let evaluation = Evaluation::new(&outcomes, &key);
        assert_eq!(
            evaluation.combinations,
            vec![
                CombinationCount {
                    group: "unlabeled".into(),
                    actual: "none".into(),
                    predicted: "error:load".into(),
                    count: 1,
                },
                CombinationCount {
                    group: "unlabeled".into(),
                    actual: "top".into(),
                    predicted: "top".into(),
                    count: 2,
                },
            ]
        );
    }

    #[test]
    fn test_outcome_serializes_as_string() {
        let json = serde_json::to_string(&Outcome::Decided(Decision::Undecided)).unwrap();
        assert_eq!(json, "\"undecided\"");
        let json = serde_json::to_string(&Outcome::Failed(ErrorKind::MalformedInput)).unwrap();
        assert_eq!(json, "\"error:malformed_input\"");
    }
}
