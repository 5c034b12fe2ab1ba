use serde::Serialize;

use super::criteria::{CriterionError, CriterionId, EvaluationCriterion};

/// Allowed drift of the weight total from 1 before it is flagged.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error(transparent)]
    InvalidCriterion(#[from] CriterionError),
}

/// Weighted sum of criterion scores, rounded to two decimals.
///
/// The result stays on the criteria's own scale (typically 0-10); it is not
/// normalised by the weight total. Criteria are validated first so malformed
/// input surfaces as an error instead of a NaN. Scores are not clamped here.
pub fn overall_score(criteria: &[EvaluationCriterion]) -> Result<f64, ScoreError> {
    let mut contributions = Vec::with_capacity(criteria.len());
    for criterion in criteria {
        criterion.validate()?;
        contributions.push(criterion.weighted_score());
    }

    // Summing in a canonical order keeps the result independent of criterion order.
    contributions.sort_by(f64::total_cmp);
    let total: f64 = contributions.into_iter().sum();

    Ok(round_to_cents(total))
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Weight-total health, for display next to the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightSumReport {
    pub valid: bool,
    pub total: f64,
}

pub fn validate_weight_sum(criteria: &[EvaluationCriterion]) -> WeightSumReport {
    let total: f64 = criteria.iter().map(|criterion| criterion.weight).sum();
    WeightSumReport {
        valid: (total - 1.0).abs() <= WEIGHT_SUM_TOLERANCE,
        total,
    }
}

/// Per-criterion line of a score card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionBreakdown {
    pub id: CriterionId,
    pub name: String,
    pub weight: f64,
    pub score: f64,
    pub max_score: f64,
    pub weighted_score: f64,
    pub percent_of_max: f64,
}

/// Overall score, weight health and breakdown in one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCard {
    pub overall_score: f64,
    pub weights: WeightSumReport,
    pub breakdown: Vec<CriterionBreakdown>,
}

impl ScoreCard {
    pub fn from_criteria(criteria: &[EvaluationCriterion]) -> Result<Self, ScoreError> {
        let overall_score = overall_score(criteria)?;
        let breakdown = criteria
            .iter()
            .map(|criterion| CriterionBreakdown {
                id: criterion.id.clone(),
                name: criterion.name.clone(),
                weight: criterion.weight,
                score: criterion.score,
                max_score: criterion.max_score,
                weighted_score: round_to_cents(criterion.weighted_score()),
                percent_of_max: criterion.percent_of_max().round(),
            })
            .collect();

        Ok(Self {
            overall_score,
            weights: validate_weight_sum(criteria),
            breakdown,
        })
    }

    /// Message shown when the weights do not add up to 100%.
    pub fn weight_warning(&self) -> Option<String> {
        if self.weights.valid {
            None
        } else {
            Some(format!(
                "total weight should sum to 100% (currently {:.0}%)",
                self.weights.total * 100.0
            ))
        }
    }
}
