//! Intake Records - the student register
//!
//! Keeps every student and the links to their filed documents in a single
//! JSON document on disk:
//! - Typed identifiers ([`StudentId`], [`RecordId`], [`DocumentType`])
//! - CRUD, search and statistics over students
//! - Per-type document link lists
//!
//! # Example
//!
//! ```rust,ignore
//! use intake_records::{NewStudent, StudentStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = StudentStore::new("data/students.json");
//! let student = store.create(NewStudent::new("st102", "Asha Rao")).await?;
//! assert_eq!(student.student_id.as_str(), "ST102");
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod error;
pub mod model;
pub mod store;

pub use error::RecordError;
pub use model::{
    DocumentLink, DocumentSet, DocumentType, NewDocumentLink, NewStudent, RecordId, Student,
    StudentId, StudentPatch, StudentStats,
};
pub use store::StudentStore;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the student register
    pub use crate::{
        DocumentLink, DocumentType, NewDocumentLink, NewStudent, RecordError, Student, StudentId,
        StudentStore,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
