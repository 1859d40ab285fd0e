//! # govwatch core
//!
//! Shared, runtime-agnostic logic for govwatch: the report model, the
//! [`store::ReportStore`] abstraction, the filter/search engine, the
//! slideshow cursor, and the error taxonomy every frontend reports through.
//!
//! This crate contains no tokio, HTTP, or filesystem I/O. Backends that
//! need those live in the `govwatch` crate.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | `Report`, `Media`, ids and date parsing |
//! | [`error`] | `TrackerError` taxonomy |
//! | [`filter`] | Criteria and the pure `apply` function |
//! | [`slideshow`] | Wrapping index cursor |
//! | [`store`] | `ReportStore` trait, import/export helpers, in-memory backend |
//! | [`counties`] | Code → name registry for jurisdictions |
//! | [`html`] | Description sanitizing and plain-text extraction |

pub mod counties;
pub mod error;
pub mod filter;
pub mod html;
pub mod models;
pub mod slideshow;
pub mod store;

pub use error::{Result, TrackerError};
pub use models::{Media, Official, Report, ReportId};
