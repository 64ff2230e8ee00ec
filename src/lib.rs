//! Resource Uploadr Library
//!
//! Client for uploading course resources (assignments and lecture recordings)
//! to a learning-management API.
//!
//! # Features
//!
//! - **Validation First**: size and type checks before any network call
//! - **Chunked Uploads**: files larger than one part go through
//!   initiate / upload-part / complete, one part at a time
//! - **Progress**: percentage, smoothed throughput and ETA per session
//! - **Cancellable**: stop between parts; late results are discarded
//!
//! # Example
//!
//! ```no_run
//! use resource_uploadr::api::HttpResourceApi;
//! use resource_uploadr::upload::{CancelToken, LoggingObserver, UploadOrchestrator};
//! use resource_uploadr::config::Config;
//!
//! # async fn example(mut session: resource_uploadr::upload::UploadSession) -> anyhow::Result<()> {
//! let config = Config::load("config.yaml")?;
//! let api = HttpResourceApi::new((&config.api).into())?;
//! let orchestrator = UploadOrchestrator::new(api, config.upload_settings());
//! orchestrator
//!     .run(&mut session, &LoggingObserver, &CancelToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use upload::{UploadError, UploadOrchestrator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
