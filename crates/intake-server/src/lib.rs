//! Intake Server - HTTP front of the document intake service
//!
//! Ties the classifier, the storage service and the student register
//! together behind a small warp API:
//! - `POST /upload` classifies and files one document
//! - `/api/students` CRUD, per-student documents and stats, search
//! - `/health`, locally stored files and the static frontend
//!
//! # Example
//!
//! ```rust,ignore
//! use intake_server::{api, AppConfig, AppState};
//!
//! # async fn example(config: AppConfig) {
//! let state = AppState::from_config(&config).await;
//! warp::serve(api::routes(state)).run(config.addr).await;
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod intake;
pub mod state;
pub mod telemetry;

pub use config::{AppConfig, Args, LogFormat};
pub use error::{handle_rejection, ApiError};
pub use intake::{IntakeError, IntakeReceipt, IntakeService, Upload};
pub use state::AppState;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for embedding the server
    pub use crate::{api::routes, AppConfig, AppState, IntakeService, Upload};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
