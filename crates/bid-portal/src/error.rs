use crate::config::ConfigError;
use crate::portal::access::SessionError;
use crate::portal::bids::{BidImportError, BidServiceError};
use crate::portal::evaluation::{CriterionError, EvaluationServiceError, ScoreError};
use crate::portal::inflight::InFlightError;
use crate::portal::proposals::ProposalServiceError;
use crate::portal::repository::RepositoryError;
use crate::portal::users::UserServiceError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Import(BidImportError),
    Session(SessionError),
    Users(UserServiceError),
    Bids(BidServiceError),
    Proposals(ProposalServiceError),
    Evaluations(EvaluationServiceError),
    Score(ScoreError),
    /// Request payload rejected before reaching a service.
    Validation(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Import(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::Score(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Session(err) => match err {
                SessionError::InvalidCredentials | SessionError::UnknownSession => {
                    StatusCode::UNAUTHORIZED
                }
                SessionError::RoleSwitchingDisabled => StatusCode::FORBIDDEN,
                SessionError::Corrupted(_) | SessionError::Unavailable(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Users(err) => match err {
                UserServiceError::InvalidName | UserServiceError::InvalidEmail(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                UserServiceError::EmailInUse(_) => StatusCode::CONFLICT,
                UserServiceError::Repository(err) => repository_status(err),
            },
            AppError::Bids(err) => match err {
                BidServiceError::MissingField(_)
                | BidServiceError::InvalidBudget
                | BidServiceError::DeadlineInPast => StatusCode::UNPROCESSABLE_ENTITY,
                BidServiceError::AlreadyClosed(_) => StatusCode::CONFLICT,
                BidServiceError::Repository(err) => repository_status(err),
            },
            AppError::Proposals(err) => match err {
                ProposalServiceError::CoverLetterTooShort
                | ProposalServiceError::InvalidBudget
                | ProposalServiceError::InvalidCompletionDays
                | ProposalServiceError::MissingDocuments
                | ProposalServiceError::UnsupportedDocument(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ProposalServiceError::UnknownBid(_) => StatusCode::NOT_FOUND,
                ProposalServiceError::BidClosed(_) | ProposalServiceError::DeadlinePassed(_) => {
                    StatusCode::CONFLICT
                }
                ProposalServiceError::InFlight(err) => in_flight_status(err),
                ProposalServiceError::Repository(err) => repository_status(err),
            },
            AppError::Evaluations(err) => match err {
                EvaluationServiceError::Criterion(CriterionError::UnknownCriterion(_))
                | EvaluationServiceError::UnknownProposal(_) => StatusCode::NOT_FOUND,
                EvaluationServiceError::Criterion(_)
                | EvaluationServiceError::Score(_)
                | EvaluationServiceError::ProposalMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
                EvaluationServiceError::AlreadySubmitted(_)
                | EvaluationServiceError::Immutable(_) => StatusCode::CONFLICT,
                EvaluationServiceError::InFlight(err) => in_flight_status(err),
                EvaluationServiceError::Repository(err) => repository_status(err),
            },
        }
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::Conflict => StatusCode::CONFLICT,
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn in_flight_status(err: &InFlightError) -> StatusCode {
    match err {
        InFlightError::Busy(_) => StatusCode::CONFLICT,
        InFlightError::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Import(err) => write!(f, "import error: {}", err),
            AppError::Session(err) => write!(f, "{}", err),
            AppError::Users(err) => write!(f, "{}", err),
            AppError::Bids(err) => write!(f, "{}", err),
            AppError::Proposals(err) => write!(f, "{}", err),
            AppError::Evaluations(err) => write!(f, "{}", err),
            AppError::Score(err) => write!(f, "{}", err),
            AppError::Validation(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Session(err) => Some(err),
            AppError::Users(err) => Some(err),
            AppError::Bids(err) => Some(err),
            AppError::Proposals(err) => Some(err),
            AppError::Evaluations(err) => Some(err),
            AppError::Score(err) => Some(err),
            AppError::Validation(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<BidImportError> for AppError {
    fn from(value: BidImportError) -> Self {
        Self::Import(value)
    }
}

impl From<SessionError> for AppError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<UserServiceError> for AppError {
    fn from(value: UserServiceError) -> Self {
        Self::Users(value)
    }
}

impl From<BidServiceError> for AppError {
    fn from(value: BidServiceError) -> Self {
        Self::Bids(value)
    }
}

impl From<ProposalServiceError> for AppError {
    fn from(value: ProposalServiceError) -> Self {
        Self::Proposals(value)
    }
}

impl From<EvaluationServiceError> for AppError {
    fn from(value: EvaluationServiceError) -> Self {
        Self::Evaluations(value)
    }
}

impl From<ScoreError> for AppError {
    fn from(value: ScoreError) -> Self {
        Self::Score(value)
    }
}
