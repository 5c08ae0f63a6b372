use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::wire::IntermentRow;

/// Trust state of a document-number-bound access link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Valid,
    Invalid,
    Expired,
}

impl LinkStatus {
    pub fn allows_mutation(self) -> bool {
        matches!(self, LinkStatus::Valid)
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LinkStatus::Valid => "valid",
            LinkStatus::Invalid => "invalid",
            LinkStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Snapshot of an interment record as seen through its access link.
///
/// Immutable once fetched. A reload replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContext {
    pub document_no: String,
    pub occupant_names: Vec<String>,
    /// Human readable date ("March 4, 2024") or the backend value verbatim.
    pub interment_date: String,
    pub link_status: LinkStatus,
    /// Explanation shown when the link is not valid.
    pub message: Option<String>,
}

impl DocumentContext {
    /// Build a valid context from link lookup rows.
    ///
    /// Returns an `invalid` context for an empty row set. Each occupant name is
    /// `occupant`, falling back to `name1` for single-occupant links.
    pub fn from_rows(document_no: &str, rows: &[IntermentRow]) -> Self {
        let Some(first) = rows.first() else {
            return Self::unavailable(
                document_no,
                LinkStatus::Invalid,
                "No records found for this document number.",
            );
        };

        let occupant_names = rows.iter().map(|r| r.occupant_name().to_string()).collect();
        let interment_date = first
            .date_interment
            .as_deref()
            .map(format_interment_date)
            .unwrap_or_default();

        Self {
            document_no: document_no.to_string(),
            occupant_names,
            interment_date,
            link_status: LinkStatus::Valid,
            message: None,
        }
    }

    pub fn unavailable(document_no: &str, status: LinkStatus, message: impl Into<String>) -> Self {
        Self {
            document_no: document_no.to_string(),
            occupant_names: Vec::new(),
            interment_date: String::new(),
            link_status: status,
            message: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.link_status.allows_mutation()
    }
}

/// Render an ISO date or datetime as "Month D, YYYY". Anything else is returned as-is.
pub fn format_interment_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()));

    match date {
        Some(d) => d.format("%B %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}
