//! Intake Classifier
//!
//! Decides what an uploaded file is and whose it is:
//! - Document type from an ordered filename pattern table
//! - Student ID from explicit metadata or a second pattern table
//! - A fixed response grammar (`STORE:` / `CREATE_FOLDER:` + `THEN_STORE:` /
//!   `ERROR:`) and its parser
//! - An optional hosted-LLM classifier that falls back to the rules
//!
//! # Example
//!
//! ```rust,ignore
//! use intake_classifier::{ClassificationRequest, Classifier, RuleClassifier};
//!
//! # async fn example() {
//! let classifier = RuleClassifier::new();
//! let request = ClassificationRequest::new("ST102_Math_HW.pdf").with_existing_folder("ST102");
//! let response = classifier.classify(&request).await;
//! assert_eq!(response.to_string(), "STORE: ST102 → assignment");
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod classifier;
pub mod config;
pub mod error;
pub mod llm;
pub mod patterns;
pub mod response;
pub mod rules;

pub use classifier::{classifier_from_config, ClassificationRequest, Classifier, ClassifierKind};
pub use config::LlmConfig;
pub use error::ClassifierError;
pub use llm::{ChatCompletion, LlmClassifier, TextCompletion};
pub use patterns::{detect_document_type, extract_student_id};
pub use response::{parse_response, ClassifierResponse, ErrorToken};
pub use rules::RuleClassifier;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the classifier
    pub use crate::{
        parse_response, ClassificationRequest, Classifier, ClassifierKind, ClassifierResponse,
        ErrorToken, RuleClassifier,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
