//! Submission pipeline: draft → validated, media-encoded [`Report`] → store.
//!
//! # Steps
//!
//! 1. Presence checks on `title` and `issue_type` (`MissingField`) and the
//!    county code against the registry (`UnknownCounty`).
//! 2. Every attachment is read through a [`MediaSource`] and base64-encoded.
//!    Reads run concurrently and are joined fail-if-any-fails: one bad
//!    attachment aborts the whole submission with `MediaEncodingError`, and
//!    the store is never called.
//! 3. The anonymity override is applied, the description is sanitized and
//!    the report is stamped with the current time.
//! 4. [`ReportStore::append`] persists it.
//!
//! The draft is taken by value, so a successful submission consumes it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{SecondsFormat, Utc};
use futures::future::try_join_all;
use tracing::{debug, info};

use govwatch_core::counties::CountyRegistry;
use govwatch_core::html;
use govwatch_core::models::ANONYMOUS;
use govwatch_core::store::ReportStore;
use govwatch_core::{Media, Official, Report, Result, TrackerError};

/// Form fields of a report that has not been submitted yet.
#[derive(Debug, Clone, Default)]
pub struct ReportDraft {
    pub issue_type: String,
    pub title: String,
    pub official: Official,
    pub county: String,
    /// Rich-text HTML from the editor.
    pub description: String,
    pub reporter_name: String,
    pub reporter_email: String,
    pub anonymous: bool,
    pub attachments: Vec<Attachment>,
}

/// A file the reporter attached to a draft.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub name: String,
    pub path: PathBuf,
    /// Inferred from the extension when not given.
    pub mime_type: Option<String>,
}

impl Attachment {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path,
            mime_type: None,
        }
    }

    pub fn resolved_mime_type(&self) -> String {
        self.mime_type
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| mime_for_path(&self.path).to_string())
    }
}

/// Where attachment bytes come from.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn read(&self, attachment: &Attachment) -> std::io::Result<Vec<u8>>;
}

/// Reads attachments from the local filesystem.
pub struct FileSource;

#[async_trait]
impl MediaSource for FileSource {
    async fn read(&self, attachment: &Attachment) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&attachment.path).await
    }
}

/// Mime type by file extension. Only image and video types are recognised.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "ogv" | "ogg" => "video/ogg",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

async fn encode_one(source: &dyn MediaSource, attachment: &Attachment) -> Result<Media> {
    let bytes = source
        .read(attachment)
        .await
        .map_err(|e| TrackerError::MediaEncodingError {
            name: attachment.name.clone(),
            reason: e.to_string(),
        })?;
    debug!(name = %attachment.name, bytes = bytes.len(), "attachment encoded");
    Ok(Media {
        name: attachment.name.clone(),
        mime_type: attachment.resolved_mime_type(),
        data: STANDARD.encode(bytes),
    })
}

/// Encode every attachment, in attachment order, or fail on the first error.
pub async fn encode_media(
    source: &dyn MediaSource,
    attachments: &[Attachment],
) -> Result<Vec<Media>> {
    try_join_all(attachments.iter().map(|a| encode_one(source, a))).await
}

fn require(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        Err(TrackerError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Checks that need no I/O.
pub fn validate(draft: &ReportDraft, counties: &CountyRegistry) -> Result<()> {
    require(&draft.title, "title")?;
    require(&draft.issue_type, "issue type")?;
    counties.validate(&draft.county)
}

/// Assemble the report to persist from a validated draft and its media.
pub fn build_report(draft: ReportDraft, media: Vec<Media>, counties: &CountyRegistry) -> Report {
    let (reporter_name, reporter_email) = if draft.anonymous {
        (ANONYMOUS.to_string(), String::new())
    } else if draft.reporter_name.trim().is_empty() {
        (ANONYMOUS.to_string(), draft.reporter_email.trim().to_string())
    } else {
        (
            draft.reporter_name.trim().to_string(),
            draft.reporter_email.trim().to_string(),
        )
    };

    let county_name = counties.name_for(&draft.county).map(str::to_string);

    Report {
        id: None,
        issue_type: draft.issue_type.trim().to_string(),
        title: draft.title.trim().to_string(),
        official: Official {
            name: draft.official.name.trim().to_string(),
            position: draft.official.position.trim().to_string(),
        },
        county: draft.county,
        county_name,
        description: html::sanitize(&draft.description),
        date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        reporter_name,
        reporter_email,
        media,
    }
}

/// Validate, encode, build and persist one draft.
pub async fn submit(
    store: &dyn ReportStore,
    source: &dyn MediaSource,
    counties: &CountyRegistry,
    draft: ReportDraft,
) -> Result<Report> {
    validate(&draft, counties)?;
    let media = encode_media(source, &draft.attachments).await?;
    let report = build_report(draft, media, counties);
    let stored = store.append(report).await?;
    info!(
        title = %stored.title,
        media = stored.media.len(),
        "report submitted"
    );
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use govwatch_core::store::memory::InMemoryStore;

    /// Serves fixed bytes, failing for names listed in `broken`.
    struct FakeSource {
        broken: Vec<&'static str>,
    }

    #[async_trait]
    impl MediaSource for FakeSource {
        async fn read(&self, attachment: &Attachment) -> std::io::Result<Vec<u8>> {
            if self.broken.contains(&attachment.name.as_str()) {
                Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "unreadable",
                ))
            } else {
                Ok(b"hello".to_vec())
            }
        }
    }

    fn draft() -> ReportDraft {
        ReportDraft {
            issue_type: "corruption".into(),
            title: "Tender awarded twice".into(),
            official: Official {
                name: "J. Doe".into(),
                position: "MCA".into(),
            },
            county: "047".into(),
            description: "<p>Details <script>x()</script></p>".into(),
            reporter_name: "Wanjiku".into(),
            reporter_email: "w@example.org".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_mime_inference() {
        assert_eq!(mime_for_path(Path::new("a/photo.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("clip.webm")), "video/webm");
        assert_eq!(
            mime_for_path(Path::new("notes.txt")),
            "application/octet-stream"
        );
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");

        let mut attachment = Attachment::from_path("clip.mp4");
        attachment.mime_type = Some(" ".into());
        assert_eq!(attachment.resolved_mime_type(), "video/mp4");
    }

    #[tokio::test]
    async fn test_anonymous_overrides_identity() {
        let store = InMemoryStore::new();
        let source = FakeSource { broken: vec![] };
        let counties = CountyRegistry::bundled();
        let mut d = draft();
        d.anonymous = true;
        let stored = submit(&store, &source, &counties, d).await.unwrap();
        assert_eq!(stored.reporter_name, "Anonymous");
        assert_eq!(stored.reporter_email, "");
        assert_eq!(stored.county_name.as_deref(), Some("Nairobi"));
        assert_eq!(stored.description, "<p>Details </p>");
        assert!(stored.parsed_date().is_some());
    }

    #[tokio::test]
    async fn test_blank_name_reads_anonymous() {
        let store = InMemoryStore::new();
        let source = FakeSource { broken: vec![] };
        let mut d = draft();
        d.reporter_name = "  ".into();
        let stored = submit(&store, &source, &CountyRegistry::bundled(), d)
            .await
            .unwrap();
        assert_eq!(stored.reporter_name, "Anonymous");
        assert_eq!(stored.reporter_email, "w@example.org");
    }

    #[tokio::test]
    async fn test_media_encoded_in_order() {
        let store = InMemoryStore::new();
        let source = FakeSource { broken: vec![] };
        let mut d = draft();
        d.attachments = vec![
            Attachment::from_path("gate.png"),
            Attachment {
                name: "clip".into(),
                path: "clip".into(),
                mime_type: Some("video/mp4".into()),
            },
        ];
        let stored = submit(&store, &source, &CountyRegistry::bundled(), d)
            .await
            .unwrap();
        assert_eq!(stored.media.len(), 2);
        assert_eq!(stored.media[0].name, "gate.png");
        assert_eq!(stored.media[0].mime_type, "image/png");
        assert_eq!(stored.media[0].data, "aGVsbG8=");
        assert_eq!(stored.media[1].mime_type, "video/mp4");
    }

    #[tokio::test]
    async fn test_one_failed_attachment_aborts() {
        let store = InMemoryStore::new();
        let source = FakeSource {
            broken: vec!["b.mp4"],
        };
        let mut d = draft();
        d.attachments = vec![Attachment::from_path("a.jpg"), Attachment::from_path("b.mp4")];
        let err = submit(&store, &source, &CountyRegistry::bundled(), d)
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::MediaEncodingError { ref name, .. } if name == "b.mp4"));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_presence_and_county_checks() {
        let store = InMemoryStore::new();
        let source = FakeSource { broken: vec![] };
        let counties = CountyRegistry::bundled();

        let mut d = draft();
        d.title = " ".into();
        assert!(matches!(
            submit(&store, &source, &counties, d).await,
            Err(TrackerError::MissingField("title"))
        ));

        let mut d = draft();
        d.county = "999".into();
        assert!(matches!(
            submit(&store, &source, &counties, d).await,
            Err(TrackerError::UnknownCounty(_))
        ));
        assert!(store.load_all().await.unwrap().is_empty());
    }
}
