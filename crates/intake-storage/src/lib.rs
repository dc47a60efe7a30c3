//! Intake Storage - per-student document folders
//!
//! Files every document into `<student>/<type subfolder>` on a cloud drive,
//! degrading call by call to a local directory:
//! - [`StorageBackend`] seam with [`DriveBackend`] and [`LocalBackend`]
//! - [`DriveService`] with one-shot local failover and a folder memo
//! - Credential bootstrap from a static token or a refresh-token file
//!
//! # Example
//!
//! ```rust,ignore
//! use intake_storage::{DriveService, StorageConfig, UploadFile};
//! use intake_records::{DocumentType, StudentId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = DriveService::from_config(&StorageConfig::default()).await;
//! let file = UploadFile::new("essay.pdf", "application/pdf", b"%PDF".to_vec());
//! let placed = service
//!     .store_document(&StudentId::new("ST102")?, DocumentType::Assignment, None, &file)
//!     .await?;
//! println!("{}", placed.file.shareable_link);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod backend;
pub mod cache;
pub mod config;
pub mod drive;
pub mod error;
pub mod layout;
pub mod local;
pub mod service;

pub use backend::{BackendKind, FolderId, StorageBackend, StoredFile, UploadFile, LOCAL_ID_PREFIX};
pub use cache::FolderCache;
pub use config::{DriveConfig, StorageConfig};
pub use drive::{DriveBackend, DriveCredentials, TokenSource};
pub use error::StorageError;
pub use layout::{subfolder_name, StudentFolders};
pub use local::LocalBackend;
pub use service::{backend_from_config, DriveService, PlacedDocument};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for storage
    pub use crate::{
        BackendKind, DriveService, FolderId, StorageConfig, StorageError, StoredFile, UploadFile,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
