//! Core data models for governance reports.
//!
//! A [`Report`] is the unit of persisted data. Two historical schemas exist
//! in the wild: the local-storage one (`issueTitle`, nested `official`,
//! `county`) and the report-service one (`title`, flat `responsibleName` /
//! `responsiblePosition`, `jurisdiction`). Both deserialize into the same
//! struct; serialization always emits the canonical shape below.
//!
//! ```json
//! {
//!   "id": 1718000000000,
//!   "issueType": "service_delivery",
//!   "title": "Clinic closed for three weeks",
//!   "official": { "name": "J. Doe", "position": "MCA" },
//!   "county": "047",
//!   "countyName": "Nairobi",
//!   "description": "<p>No staff on site.</p>",
//!   "date": "2024-06-10T08:00:00Z",
//!   "reporterName": "Anonymous",
//!   "reporterEmail": "",
//!   "media": [{ "name": "gate.jpg", "type": "image/jpeg", "data": "..." }]
//! }
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::html;

/// Reporter name recorded for anonymous submissions.
pub const ANONYMOUS: &str = "Anonymous";

/// Report identifier: a millisecond timestamp for locally created reports
/// or whatever the report service assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportId::Int(n) => write!(f, "{}", n),
            ReportId::Text(s) => f.write_str(s),
        }
    }
}

/// The official a report is raised against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Official {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: String,
}

/// An attached piece of evidence, base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub data: String,
}

/// How a presentation layer should render a [`Media`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl Media {
    pub fn kind(&self) -> MediaKind {
        if self.mime_type.starts_with("image/") {
            MediaKind::Image
        } else if self.mime_type.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }

    /// `data:` URI suitable for an `<img>` or `<video>` source.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// A single submitted governance-issue record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ReportWire", rename_all = "camelCase")]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ReportId>,
    pub issue_type: String,
    pub title: String,
    pub official: Official,
    pub county: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county_name: Option<String>,
    pub description: String,
    pub date: String,
    pub reporter_name: String,
    pub reporter_email: String,
    pub media: Vec<Media>,
}

/// Accepts either historical schema.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportWire {
    #[serde(default)]
    id: Option<ReportId>,
    #[serde(default, alias = "type")]
    issue_type: String,
    #[serde(default, alias = "issueTitle")]
    title: String,
    #[serde(default)]
    official: Option<Official>,
    #[serde(default)]
    responsible_name: Option<String>,
    #[serde(default)]
    responsible_position: Option<String>,
    #[serde(default, alias = "jurisdiction")]
    county: String,
    #[serde(default)]
    county_name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    reporter_name: Option<String>,
    #[serde(default)]
    reporter_email: Option<String>,
    #[serde(default)]
    media: Vec<Media>,
}

impl From<ReportWire> for Report {
    fn from(w: ReportWire) -> Self {
        let official = w.official.unwrap_or_else(|| Official {
            name: w.responsible_name.unwrap_or_default(),
            position: w.responsible_position.unwrap_or_default(),
        });
        Report {
            id: w.id,
            issue_type: w.issue_type,
            title: w.title,
            official,
            county: w.county,
            county_name: w.county_name,
            description: w.description,
            date: w.date,
            reporter_name: w.reporter_name.unwrap_or_default(),
            reporter_email: w.reporter_email.unwrap_or_default(),
            media: w.media,
        }
    }
}

impl Report {
    /// Parsed creation time, if `date` is in a recognised format.
    pub fn parsed_date(&self) -> Option<DateTime<Utc>> {
        parse_report_date(&self.date)
    }

    /// Description with markup removed, used for text search.
    pub fn plain_description(&self) -> String {
        html::to_plain_text(&self.description)
    }

    /// Category heading, e.g. `service_delivery` → `SERVICE DELIVERY`.
    pub fn issue_label(&self) -> String {
        self.issue_type.to_uppercase().replace('_', " ")
    }

    /// Reporter as shown to readers; blank names read as anonymous.
    pub fn reporter_display(&self) -> &str {
        if self.reporter_name.trim().is_empty() {
            ANONYMOUS
        } else {
            &self.reporter_name
        }
    }

    /// First media entry without a mime type. Rendering picks image or
    /// video from the type, so such an entry cannot be stored.
    pub fn untyped_media(&self) -> Option<&Media> {
        self.media.iter().find(|m| m.mime_type.trim().is_empty())
    }

    pub fn int_id(&self) -> Option<i64> {
        match self.id {
            Some(ReportId::Int(n)) => Some(n),
            _ => None,
        }
    }
}

/// Parse a report timestamp.
///
/// Accepts RFC 3339, naive ISO-8601 (treated as UTC), the en-US locale form
/// `M/D/YYYY, h:mm:ss AM` written by older clients, and a bare date.
pub fn parse_report_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y, %I:%M:%S %p",
        "%m/%d/%Y, %H:%M:%S",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
