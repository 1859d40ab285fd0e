//! The tracker: one owner for the canonical cache, the active criteria, the
//! derived display list and the slideshow.
//!
//! Every user action goes through a [`Tracker`] method and ends in a
//! [`Notice`]. Successful mutations (submit, import) reload the canonical
//! list from the store, re-apply the criteria and reset the slideshow to the
//! first report of the new display list.
//!
//! # Degraded mode
//!
//! If the store cannot be read, the tracker keeps working on an empty list
//! and [`Tracker::is_degraded`] reports `true` until a later refresh
//! succeeds.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use govwatch_core::counties::CountyRegistry;
use govwatch_core::filter::{self, Criteria};
use govwatch_core::slideshow::SlideshowState;
use govwatch_core::store::{export_filename, ReportStore};
use govwatch_core::{Report, Result, TrackerError};

use crate::slideshow::SlideshowController;
use crate::submit::{self, MediaSource, ReportDraft};

/// Outcome of a user action, ready to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn submitted() -> Self {
        Notice::Success("Report saved successfully!".to_string())
    }

    pub fn imported(count: usize) -> Self {
        Notice::Success(format!("Successfully imported {} reports!", count))
    }

    pub fn exported(filename: &str) -> Self {
        Notice::Success(format!("Reports exported to {}", filename))
    }

    pub fn load_failed() -> Self {
        Notice::Error("Failed to load reports. Please try again later.".to_string())
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

impl From<&TrackerError> for Notice {
    fn from(err: &TrackerError) -> Self {
        Notice::Error(err.notice())
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A downloadable export.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

#[derive(Default)]
struct State {
    canonical: Vec<Report>,
    criteria: Criteria,
    display: Vec<Report>,
    degraded: bool,
}

pub struct Tracker {
    store: Arc<dyn ReportStore>,
    media: Arc<dyn MediaSource>,
    counties: CountyRegistry,
    state: RwLock<State>,
    slideshow: SlideshowController,
}

impl Tracker {
    /// Build a tracker and load the canonical list once.
    pub async fn start(
        store: Arc<dyn ReportStore>,
        media: Arc<dyn MediaSource>,
        counties: CountyRegistry,
        slide_interval: Duration,
    ) -> Self {
        let tracker = Self {
            store,
            media,
            counties,
            state: RwLock::new(State::default()),
            slideshow: SlideshowController::new(Vec::new(), slide_interval),
        };
        tracker.refresh().await;
        tracker
    }

    /// Reload from the store. Returns the error notice when the load failed.
    pub async fn refresh(&self) -> Option<Notice> {
        let (canonical, failure) = match self.store.load_all().await {
            Ok(reports) => (reports, None),
            Err(e) => {
                warn!(backend = self.store.name(), error = %e, "load failed, showing no reports");
                (Vec::new(), Some(Notice::from(&e)))
            }
        };

        let mut state = self.state.write().await;
        state.degraded = failure.is_some();
        state.canonical = canonical;
        self.rederive(&mut state);
        failure
    }

    fn rederive(&self, state: &mut State) {
        state.display = filter::apply(&state.canonical, &state.criteria);
        self.slideshow.reset_list(state.display.clone());
    }

    /// Replace the active criteria. An unknown county is rejected and the
    /// previous criteria stay in effect.
    pub async fn set_criteria(&self, criteria: Criteria) -> Result<()> {
        if let Some(county) = &criteria.county {
            self.counties.validate(county)?;
        }
        let mut state = self.state.write().await;
        state.criteria = criteria;
        self.rederive(&mut state);
        Ok(())
    }

    pub async fn clear_criteria(&self) {
        let mut state = self.state.write().await;
        state.criteria.clear();
        self.rederive(&mut state);
    }

    pub async fn criteria(&self) -> Criteria {
        self.state.read().await.criteria.clone()
    }

    pub async fn submit(&self, draft: ReportDraft) -> Result<Report> {
        let stored =
            submit::submit(self.store.as_ref(), self.media.as_ref(), &self.counties, draft).await?;
        self.refresh().await;
        Ok(stored)
    }

    pub async fn import_json(&self, payload: &str) -> Result<usize> {
        let count = self.store.import_json(payload).await?;
        info!(count, "import complete");
        self.refresh().await;
        Ok(count)
    }

    pub async fn export(&self) -> Result<ExportFile> {
        let contents = self.store.export_all().await?;
        Ok(ExportFile {
            filename: export_filename(Utc::now()),
            contents,
        })
    }

    pub async fn display_list(&self) -> Vec<Report> {
        self.state.read().await.display.clone()
    }

    /// Unique official names across the canonical list.
    pub async fn officials(&self) -> Vec<String> {
        filter::distinct_officials(&self.state.read().await.canonical)
    }

    pub async fn is_degraded(&self) -> bool {
        self.state.read().await.degraded
    }

    pub fn counties(&self) -> &CountyRegistry {
        &self.counties
    }

    pub fn slideshow(&self) -> &SlideshowController {
        &self.slideshow
    }

    pub fn slideshow_state(&self) -> SlideshowState {
        self.slideshow.state()
    }

    pub fn shutdown(&self) {
        self.slideshow.shutdown();
    }
}
