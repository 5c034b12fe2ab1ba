use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for a scoring dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CriterionId(pub String);

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One weighted scoring dimension of an evaluation.
///
/// Deserialized criteria must carry a weight in `[0, 1]`, a positive maximum
/// and a finite score. Out-of-range scores are left for the edit path to clamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CriterionRecord")]
pub struct EvaluationCriterion {
    pub id: CriterionId,
    pub name: String,
    pub description: String,
    /// Share of the overall score, in `0..=1`.
    pub weight: f64,
    pub score: f64,
    pub max_score: f64,
}

#[derive(Deserialize)]
struct CriterionRecord {
    id: CriterionId,
    name: String,
    #[serde(default)]
    description: String,
    weight: f64,
    score: f64,
    max_score: f64,
}

impl TryFrom<CriterionRecord> for EvaluationCriterion {
    type Error = CriterionError;

    fn try_from(record: CriterionRecord) -> Result<Self, Self::Error> {
        let criterion = Self {
            id: record.id,
            name: record.name,
            description: record.description,
            weight: record.weight,
            score: record.score,
            max_score: record.max_score,
        };
        criterion.validate_bounds()?;
        if !criterion.score.is_finite() {
            return Err(CriterionError::InvalidScore {
                criterion: criterion.id,
                score: criterion.score,
                max_score: criterion.max_score,
            });
        }
        Ok(criterion)
    }
}

/// Contract violations detected at the edit boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CriterionError {
    #[error("criterion '{criterion}' has weight {weight}; weights must lie in [0, 1]")]
    InvalidWeight { criterion: CriterionId, weight: f64 },
    #[error("criterion '{criterion}' has max score {max_score}; it must be positive")]
    InvalidMaxScore {
        criterion: CriterionId,
        max_score: f64,
    },
    #[error("criterion '{criterion}' has score {score} outside [0, {max_score}]")]
    InvalidScore {
        criterion: CriterionId,
        score: f64,
        max_score: f64,
    },
    #[error("unknown criterion '{0}'")]
    UnknownCriterion(CriterionId),
}

impl EvaluationCriterion {
    /// Build an unscored criterion, rejecting malformed weights and maxima.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        weight: f64,
        max_score: f64,
    ) -> Result<Self, CriterionError> {
        let criterion = Self {
            id: CriterionId(id.into()),
            name: name.into(),
            description: description.into(),
            weight,
            score: 0.0,
            max_score,
        };
        criterion.validate()?;
        Ok(criterion)
    }

    /// Technical/experience/cost template offered for new evaluations.
    pub fn default_template() -> Vec<EvaluationCriterion> {
        [
            (
                "technical-understanding",
                "Technical Understanding",
                "Evaluate the technical solution proposed",
                0.4,
            ),
            (
                "experience",
                "Experience",
                "Previous relevant experience",
                0.3,
            ),
            (
                "cost-effectiveness",
                "Cost Effectiveness",
                "Value for money assessment",
                0.3,
            ),
        ]
        .into_iter()
        .map(|(id, name, description, weight)| EvaluationCriterion {
            id: CriterionId(id.to_string()),
            name: name.to_string(),
            description: description.to_string(),
            weight,
            score: 0.0,
            max_score: 10.0,
        })
        .collect()
    }

    pub fn validate(&self) -> Result<(), CriterionError> {
        self.validate_bounds()?;
        if !self.score.is_finite() || !(0.0..=self.max_score).contains(&self.score) {
            return Err(CriterionError::InvalidScore {
                criterion: self.id.clone(),
                score: self.score,
                max_score: self.max_score,
            });
        }
        Ok(())
    }

    /// Weight and maximum checks, independent of the current score.
    fn validate_bounds(&self) -> Result<(), CriterionError> {
        if !self.weight.is_finite() || !(0.0..=1.0).contains(&self.weight) {
            return Err(CriterionError::InvalidWeight {
                criterion: self.id.clone(),
                weight: self.weight,
            });
        }
        if !self.max_score.is_finite() || self.max_score <= 0.0 {
            return Err(CriterionError::InvalidMaxScore {
                criterion: self.id.clone(),
                max_score: self.max_score,
            });
        }
        Ok(())
    }

    /// Bound `score` to `[0, max_score]`. In-range values pass through unchanged.
    pub fn clamp_score(&self, score: f64) -> f64 {
        score.max(0.0).min(self.max_score)
    }

    /// Set the score, clamping it into range. Returns the stored value.
    pub fn set_score(&mut self, score: f64) -> Result<f64, CriterionError> {
        if !score.is_finite() {
            return Err(CriterionError::InvalidScore {
                criterion: self.id.clone(),
                score,
                max_score: self.max_score,
            });
        }
        self.score = self.clamp_score(score);
        Ok(self.score)
    }

    pub fn weighted_score(&self) -> f64 {
        self.score * self.weight
    }

    pub fn percent_of_max(&self) -> f64 {
        self.score / self.max_score * 100.0
    }
}
