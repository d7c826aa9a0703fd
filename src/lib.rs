//! Servline - service line data-entry backend.
//!
//! Proxies a hosted feature service for a small data-entry UI and screens
//! the free-text location description before anything is written upstream.
//!
//! # Modules
//!
//! - [`safety`]: location text sanitizer and its pattern catalog
//! - [`records`]: table rows and form submission validation
//! - [`upstream`]: token cache and feature service client
//! - [`server`]: axum router exposing the JSON API
//! - [`config`]: environment-based configuration
//! - [`error`]: crate error type
//!
//! # Example
//!
//! ```
//! use servline::safety::TextSanitizer;
//!
//! let sanitizer = TextSanitizer::new();
//! let verdict = sanitizer.validate("  Behind   the garage ");
//! assert_eq!(verdict.into_result().unwrap(), "Behind the garage");
//! ```

pub mod config;
pub mod error;
pub mod records;
pub mod safety;
pub mod server;
pub mod upstream;

pub use config::Config;
pub use error::{Result, ServlineError};
pub use records::{ServicePoint, Submission, SubmissionError};
pub use safety::{Rejection, TextSanitizer, Verdict};
pub use server::{router, AppState};
pub use upstream::{ArcGisClient, FeatureService};
