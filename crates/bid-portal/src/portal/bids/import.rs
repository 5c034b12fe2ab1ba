use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{Bid, BidId, BidStatus};
use crate::portal::users::UserId;

#[derive(Debug)]
pub enum BidImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
}

impl std::fmt::Display for BidImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BidImportError::Io(err) => write!(f, "failed to read bid catalogue: {}", err),
            BidImportError::Csv(err) => write!(f, "invalid bid catalogue CSV: {}", err),
            BidImportError::InvalidRow { line, reason } => {
                write!(f, "bid catalogue line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for BidImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BidImportError::Io(err) => Some(err),
            BidImportError::Csv(err) => Some(err),
            BidImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for BidImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for BidImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads a bid catalogue export used to seed the bid store.
pub struct BidCatalogImporter;

impl BidCatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Bid>, BidImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Bid>, BidImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut bids = Vec::new();

        for (index, record) in csv_reader.deserialize::<BidRow>().enumerate() {
            let row = record?;
            // Header occupies line 1.
            let line = index as u64 + 2;
            bids.push(row.into_bid(line)?);
        }

        Ok(bids)
    }
}

#[derive(Debug, Deserialize)]
struct BidRow {
    id: String,
    title: String,
    category: String,
    budget: u64,
    deadline: String,
    #[serde(default)]
    description: String,
    status: String,
    created_at: String,
    created_by: String,
    #[serde(default, deserialize_with = "empty_string_as_zero")]
    proposals: u32,
}

impl BidRow {
    fn into_bid(self, line: u64) -> Result<Bid, BidImportError> {
        let invalid = |reason: String| BidImportError::InvalidRow { line, reason };

        let status = match self.status.to_ascii_uppercase().as_str() {
            "OPEN" => BidStatus::Open,
            "CLOSED" => BidStatus::Closed,
            other => return Err(invalid(format!("unknown status '{other}'"))),
        };
        let deadline = parse_timestamp(&self.deadline)
            .ok_or_else(|| invalid(format!("unparseable deadline '{}'", self.deadline)))?;
        let created_at = parse_timestamp(&self.created_at)
            .ok_or_else(|| invalid(format!("unparseable created_at '{}'", self.created_at)))?;
        if self.id.is_empty() || self.title.is_empty() {
            return Err(invalid("id and title are required".to_string()));
        }

        Ok(Bid {
            id: BidId(self.id),
            title: self.title,
            category: self.category,
            budget: self.budget,
            deadline,
            description: self.description,
            status,
            created_at,
            created_by: UserId(self.created_by),
            proposals: self.proposals,
        })
    }
}

fn empty_string_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(0),
        Some(value) => value.parse().map_err(serde::de::Error::custom),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|naive| naive.and_utc())
}
