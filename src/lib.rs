//! # govwatch
//!
//! A citizen governance report tracker. Residents file reports against
//! public officials; reports are stored locally or on a report service,
//! searched and filtered, and rotated through a timed slideshow.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────────┐
//! │   Draft +   │──▶│ Submission  │──▶│   ReportStore    │
//! │ attachments │   │  pipeline   │   │ local | remote   │
//! └─────────────┘   └─────────────┘   └────────┬─────────┘
//!                                              │ load_all
//!                                              ▼
//!                                   ┌──────────────────────┐
//!                                   │ Tracker              │
//!                                   │ criteria → display   │
//!                                   │ display → slideshow  │
//!                                   └──────────┬───────────┘
//!                                 ┌────────────┴──────────┐
//!                                 ▼                       ▼
//!                           ┌──────────┐            ┌──────────┐
//!                           │   CLI    │            │   HTTP   │
//!                           │(govwatch)│            │ service  │
//!                           └──────────┘            └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! govwatch submit --type corruption --title "Tender awarded twice" --county 047
//! govwatch list --query tender --order newest
//! govwatch export --output ./backups/
//! govwatch serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | tracing subscriber setup |
//! | [`backend`] | Store selection from config |
//! | [`store_local`] | Key-value file backend |
//! | [`store_remote`] | HTTP report-service backend |
//! | [`submit`] | Draft validation, media encoding, persistence |
//! | [`slideshow`] | Timed slideshow controller |
//! | [`tracker`] | Cache, criteria, display list and notices |
//! | [`server`] | HTTP report service |
//! | [`export`] | Import/export commands |
//! | [`list`] | Listing and slideshow commands |
//!
//! Models, filtering, the store trait and the error type live in
//! `govwatch-core`.

pub mod backend;
pub mod config;
pub mod export;
pub mod list;
pub mod logging;
pub mod server;
pub mod slideshow;
pub mod store_local;
pub mod store_remote;
pub mod submit;
pub mod tracker;
