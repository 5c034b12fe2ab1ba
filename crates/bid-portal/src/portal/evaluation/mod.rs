pub mod criteria;
pub mod domain;
pub mod scorer;
pub mod service;

pub use criteria::{CriterionError, CriterionId, EvaluationCriterion};
pub use domain::{Evaluation, EvaluationDraft, EvaluationId, EvaluationStatus};
pub use scorer::{
    overall_score, validate_weight_sum, CriterionBreakdown, ScoreCard, ScoreError,
    WeightSumReport, WEIGHT_SUM_TOLERANCE,
};
pub use service::{EvaluationService, EvaluationServiceError};
