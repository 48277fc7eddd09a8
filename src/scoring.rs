//! Assessment scoring: Likert accumulation with reverse keys and weights,
//! min-max normalization of Big Five sums to 0-100, and DISC type selection
//! with declaration-order tie-breaking.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub const LIKERT_MIN: i64 = 1;
pub const LIKERT_MAX: i64 = 7;

pub const KIND_LIKERT: &str = "likert";
pub const KIND_FORCED_CHOICE: &str = "forced_choice";

pub const MODEL_BIG_FIVE: &str = "big_five";
pub const MODEL_DISC: &str = "disc";

/// Declaration order doubles as the tie-break order for the DISC type.
pub const DISC_DIMENSIONS: [&str; 4] =
    ["dominance", "influence", "steadiness", "conscientiousness"];

pub const BIG_FIVE_DIMENSIONS: [&str; 5] = [
    "openness",
    "conscientiousness",
    "extraversion",
    "agreeableness",
    "neuroticism",
];

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("likert value {0} out of range {LIKERT_MIN}..={LIKERT_MAX}")]
    LikertOutOfRange(i64),

    #[error("unknown question {0}")]
    UnknownQuestion(Uuid),

    #[error("question {0} has no dimension")]
    MissingDimension(Uuid),

    #[error("unknown dimension '{0}'")]
    UnknownDimension(String),

    #[error("question {0}: answer kind does not match question kind")]
    KindMismatch(Uuid),

    #[error("question {0}: forced-choice option index {1} out of range")]
    OptionOutOfRange(Uuid, usize),

    #[error("question {0}: most and least picks must differ")]
    MostEqualsLeast(Uuid),
}

/// The slice of a question the scorer needs.
#[derive(Debug, Clone)]
pub struct ScoredQuestion {
    pub id: Uuid,
    pub kind: String,
    pub trait_model: String,
    pub dimension: Option<String>,
    pub reverse: bool,
    pub weight: f64,
    /// Dimension per forced-choice option, in option order.
    pub option_dimensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerValue {
    Likert { value: i64 },
    ForcedChoice { most: usize, least: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionScores {
    /// Normalized 0-100 Big Five scores in declaration order.
    pub big_five: Vec<(&'static str, f64)>,
    /// Raw weighted DISC sums in declaration order.
    pub disc_raw: Vec<(&'static str, f64)>,
    pub disc_type: &'static str,
}

impl SessionScores {
    pub fn big_five_json(&self) -> serde_json::Value {
        json!(self
            .big_five
            .iter()
            .map(|(dim, score)| (dim.to_string(), score))
            .collect::<HashMap<_, _>>())
    }

    pub fn disc_raw_json(&self) -> serde_json::Value {
        json!(self
            .disc_raw
            .iter()
            .map(|(dim, score)| (dim.to_string(), score))
            .collect::<HashMap<_, _>>())
    }
}

fn big_five_index(dimension: &str) -> Result<usize, ScoringError> {
    BIG_FIVE_DIMENSIONS
        .iter()
        .position(|d| *d == dimension)
        .ok_or_else(|| ScoringError::UnknownDimension(dimension.to_string()))
}

fn disc_index(dimension: &str) -> Result<usize, ScoringError> {
    DISC_DIMENSIONS
        .iter()
        .position(|d| *d == dimension)
        .ok_or_else(|| ScoringError::UnknownDimension(dimension.to_string()))
}

/// Scores a full answer set against the question bank. Unanswered questions
/// are skipped; Big Five normalization ranges only cover answered questions,
/// so a partially answered session still lands in [0, 100].
pub fn score_session(
    questions: &[ScoredQuestion],
    answers: &HashMap<Uuid, AnswerValue>,
) -> Result<SessionScores, ScoringError> {
    let by_id: HashMap<Uuid, &ScoredQuestion> = questions.iter().map(|q| (q.id, q)).collect();

    let mut big_five_sums = [0.0f64; 5];
    let mut big_five_min = [0.0f64; 5];
    let mut big_five_max = [0.0f64; 5];
    let mut disc_sums = [0.0f64; 4];

    for (question_id, answer) in answers {
        let question = by_id
            .get(question_id)
            .ok_or(ScoringError::UnknownQuestion(*question_id))?;

        match answer {
            AnswerValue::Likert { value } => {
                if question.kind != KIND_LIKERT {
                    return Err(ScoringError::KindMismatch(question.id));
                }
                if !(LIKERT_MIN..=LIKERT_MAX).contains(value) {
                    return Err(ScoringError::LikertOutOfRange(*value));
                }

                let dimension = question
                    .dimension
                    .as_deref()
                    .ok_or(ScoringError::MissingDimension(question.id))?;

                // Reversal mirrors the scale in place, so min/max bounds are
                // unaffected by the reverse flag.
                let effective = if question.reverse {
                    LIKERT_MAX + LIKERT_MIN - value
                } else {
                    *value
                };
                let contribution = effective as f64 * question.weight;

                match question.trait_model.as_str() {
                    MODEL_BIG_FIVE => {
                        let idx = big_five_index(dimension)?;
                        big_five_sums[idx] += contribution;
                        big_five_min[idx] += LIKERT_MIN as f64 * question.weight;
                        big_five_max[idx] += LIKERT_MAX as f64 * question.weight;
                    }
                    MODEL_DISC => {
                        let idx = disc_index(dimension)?;
                        disc_sums[idx] += contribution;
                    }
                    other => return Err(ScoringError::UnknownDimension(other.to_string())),
                }
            }
            AnswerValue::ForcedChoice { most, least } => {
                if question.kind != KIND_FORCED_CHOICE {
                    return Err(ScoringError::KindMismatch(question.id));
                }
                if most == least {
                    return Err(ScoringError::MostEqualsLeast(question.id));
                }
                let option_count = question.option_dimensions.len();
                for pick in [most, least] {
                    if *pick >= option_count {
                        return Err(ScoringError::OptionOutOfRange(question.id, *pick));
                    }
                }

                let most_idx = disc_index(&question.option_dimensions[*most])?;
                let least_idx = disc_index(&question.option_dimensions[*least])?;
                disc_sums[most_idx] += question.weight;
                disc_sums[least_idx] -= question.weight;
            }
        }
    }

    let big_five = BIG_FIVE_DIMENSIONS
        .iter()
        .enumerate()
        .map(|(idx, dim)| {
            (*dim, normalize(big_five_sums[idx], big_five_min[idx], big_five_max[idx]))
        })
        .collect();

    let disc_raw: Vec<(&'static str, f64)> = DISC_DIMENSIONS
        .iter()
        .enumerate()
        .map(|(idx, dim)| (*dim, disc_sums[idx]))
        .collect();

    // Strictly-greater comparison keeps the earliest dimension on ties.
    let mut disc_type = DISC_DIMENSIONS[0];
    let mut best = disc_sums[0];
    for (idx, dim) in DISC_DIMENSIONS.iter().enumerate().skip(1) {
        if disc_sums[idx] > best {
            best = disc_sums[idx];
            disc_type = dim;
        }
    }

    Ok(SessionScores {
        big_five,
        disc_raw,
        disc_type,
    })
}

/// Min-max normalization to 0-100; a zero-width range (no answered questions
/// in the dimension, or zero total weight) falls back to the midpoint 50.
fn normalize(sum: f64, min: f64, max: f64) -> f64 {
    if (max - min).abs() < f64::EPSILON {
        return 50.0;
    }
    (sum - min) / (max - min) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn likert(model: &str, dimension: &str, reverse: bool, weight: f64) -> ScoredQuestion {
        ScoredQuestion {
            id: Uuid::new_v4(),
            kind: KIND_LIKERT.to_string(),
            trait_model: model.to_string(),
            dimension: Some(dimension.to_string()),
            reverse,
            weight,
            option_dimensions: vec![],
        }
    }

    fn forced_choice(dimensions: &[&str], weight: f64) -> ScoredQuestion {
        ScoredQuestion {
            id: Uuid::new_v4(),
            kind: KIND_FORCED_CHOICE.to_string(),
            trait_model: MODEL_DISC.to_string(),
            dimension: None,
            reverse: false,
            weight,
            option_dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn answer(questions: &[ScoredQuestion], values: &[AnswerValue]) -> HashMap<Uuid, AnswerValue> {
        questions
            .iter()
            .zip(values)
            .map(|(q, v)| (q.id, v.clone()))
            .collect()
    }

    #[test]
    fn normalizes_big_five_to_bounds() {
        let questions = vec![
            likert(MODEL_BIG_FIVE, "openness", false, 1.0),
            likert(MODEL_BIG_FIVE, "openness", false, 2.0),
        ];
        let all_max = answer(
            &questions,
            &[
                AnswerValue::Likert { value: 7 },
                AnswerValue::Likert { value: 7 },
            ],
        );
        let scores = score_session(&questions, &all_max).unwrap();
        assert_eq!(scores.big_five[0], ("openness", 100.0));

        let all_min = answer(
            &questions,
            &[
                AnswerValue::Likert { value: 1 },
                AnswerValue::Likert { value: 1 },
            ],
        );
        let scores = score_session(&questions, &all_min).unwrap();
        assert_eq!(scores.big_five[0], ("openness", 0.0));
    }

    #[test]
    fn scores_stay_within_range_for_mixed_answers() {
        let questions = vec![
            likert(MODEL_BIG_FIVE, "extraversion", false, 1.5),
            likert(MODEL_BIG_FIVE, "extraversion", true, 0.5),
            likert(MODEL_BIG_FIVE, "neuroticism", true, 2.0),
        ];
        let answers = answer(
            &questions,
            &[
                AnswerValue::Likert { value: 3 },
                AnswerValue::Likert { value: 6 },
                AnswerValue::Likert { value: 2 },
            ],
        );
        let scores = score_session(&questions, &answers).unwrap();
        for (_, score) in &scores.big_five {
            assert!((0.0..=100.0).contains(score), "score {score} out of range");
        }
    }

    #[test]
    fn unanswered_dimension_falls_back_to_midpoint() {
        let questions = vec![likert(MODEL_BIG_FIVE, "openness", false, 1.0)];
        let answers = answer(&questions, &[AnswerValue::Likert { value: 4 }]);
        let scores = score_session(&questions, &answers).unwrap();
        // agreeableness has no answered questions, so range is zero-width
        assert_eq!(scores.big_five[3], ("agreeableness", 50.0));
    }

    #[test]
    fn reverse_flag_mirrors_value() {
        let plain = vec![likert(MODEL_BIG_FIVE, "openness", false, 1.0)];
        let reversed = vec![likert(MODEL_BIG_FIVE, "openness", true, 1.0)];

        let high = score_session(&plain, &answer(&plain, &[AnswerValue::Likert { value: 7 }]))
            .unwrap();
        let mirrored = score_session(
            &reversed,
            &answer(&reversed, &[AnswerValue::Likert { value: 1 }]),
        )
        .unwrap();
        assert_eq!(high.big_five[0].1, mirrored.big_five[0].1);
    }

    #[test]
    fn disc_type_is_max_raw_sum() {
        let questions = vec![
            likert(MODEL_DISC, "dominance", false, 1.0),
            likert(MODEL_DISC, "influence", false, 1.0),
        ];
        let answers = answer(
            &questions,
            &[
                AnswerValue::Likert { value: 3 },
                AnswerValue::Likert { value: 6 },
            ],
        );
        let scores = score_session(&questions, &answers).unwrap();
        assert_eq!(scores.disc_type, "influence");
    }

    #[test]
    fn disc_ties_break_by_declaration_order() {
        let questions = vec![
            likert(MODEL_DISC, "steadiness", false, 1.0),
            likert(MODEL_DISC, "influence", false, 1.0),
        ];
        let answers = answer(
            &questions,
            &[
                AnswerValue::Likert { value: 5 },
                AnswerValue::Likert { value: 5 },
            ],
        );
        let scores = score_session(&questions, &answers).unwrap();
        // influence precedes steadiness in DISC_DIMENSIONS
        assert_eq!(scores.disc_type, "influence");
    }

    #[test]
    fn all_zero_disc_sums_pick_first_dimension() {
        let questions = vec![likert(MODEL_BIG_FIVE, "openness", false, 1.0)];
        let answers = answer(&questions, &[AnswerValue::Likert { value: 4 }]);
        let scores = score_session(&questions, &answers).unwrap();
        assert_eq!(scores.disc_type, "dominance");
    }

    #[test]
    fn forced_choice_adds_most_and_subtracts_least() {
        let questions = vec![forced_choice(
            &["dominance", "influence", "steadiness", "conscientiousness"],
            2.0,
        )];
        let answers = answer(&questions, &[AnswerValue::ForcedChoice { most: 1, least: 2 }]);
        let scores = score_session(&questions, &answers).unwrap();
        assert_eq!(scores.disc_raw[1], ("influence", 2.0));
        assert_eq!(scores.disc_raw[2], ("steadiness", -2.0));
        assert_eq!(scores.disc_type, "influence");
    }

    #[test]
    fn rejects_out_of_range_likert() {
        let questions = vec![likert(MODEL_BIG_FIVE, "openness", false, 1.0)];
        let answers = answer(&questions, &[AnswerValue::Likert { value: 8 }]);
        assert_eq!(
            score_session(&questions, &answers),
            Err(ScoringError::LikertOutOfRange(8))
        );
    }

    #[test]
    fn rejects_most_equals_least() {
        let questions = vec![forced_choice(&["dominance", "influence"], 1.0)];
        let answers = answer(&questions, &[AnswerValue::ForcedChoice { most: 0, least: 0 }]);
        assert_eq!(
            score_session(&questions, &answers),
            Err(ScoringError::MostEqualsLeast(questions[0].id))
        );
    }

    #[test]
    fn rejects_unknown_question() {
        let questions = vec![likert(MODEL_BIG_FIVE, "openness", false, 1.0)];
        let stray = Uuid::new_v4();
        let answers: HashMap<Uuid, AnswerValue> =
            [(stray, AnswerValue::Likert { value: 4 })].into();
        assert_eq!(
            score_session(&questions, &answers),
            Err(ScoringError::UnknownQuestion(stray))
        );
    }

    #[test]
    fn rejects_forced_choice_index_out_of_range() {
        let questions = vec![forced_choice(&["dominance", "influence"], 1.0)];
        let answers = answer(&questions, &[AnswerValue::ForcedChoice { most: 0, least: 5 }]);
        assert_eq!(
            score_session(&questions, &answers),
            Err(ScoringError::OptionOutOfRange(questions[0].id, 5))
        );
    }
}
