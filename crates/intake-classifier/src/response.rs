//! Classifier response grammar
//!
//! ```text
//! STORE: <ID> → <TYPE>
//! CREATE_FOLDER: <ID>
//! THEN_STORE: <TYPE>
//! ERROR: <TOKEN>
//! ```
//!
//! [`ClassifierResponse`]'s `Display` is the only producer of this text;
//! [`parse_response`] reverses it and tolerates the extra prose a language
//! model tends to wrap around it.

use intake_records::{DocumentType, StudentId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static CREATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"CREATE_FOLDER:\s*([A-Za-z0-9_-]+)\s+THEN_STORE:\s*([A-Za-z_-]+)")
        .expect("create pattern is a valid regex")
});

static STORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"STORE:\s*([A-Za-z0-9_-]+)\s*(?:→|->)\s*([A-Za-z_-]+)")
        .expect("store pattern is a valid regex")
});

static ERROR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ERROR:\s*([A-Z_]+)").expect("error pattern is a valid regex"));

/// Error token carried by an `ERROR:` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ErrorToken {
    /// Neither metadata nor filename yielded a student ID
    NoStudentId,
    /// Any other token
    Other(String),
}

impl ErrorToken {
    /// Token text as it appears after `ERROR:`
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoStudentId => "NO_STUDENT_ID",
            Self::Other(token) => token,
        }
    }

    fn from_token(token: &str) -> Self {
        match token {
            "NO_STUDENT_ID" => Self::NoStudentId,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ErrorToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured classifier decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierResponse {
    /// Folder exists; file it
    Store {
        student_id: StudentId,
        document_type: DocumentType,
    },
    /// Folder is missing; create it, then file
    CreateFolderThenStore {
        student_id: StudentId,
        document_type: DocumentType,
    },
    /// No decision possible
    Error(ErrorToken),
}

impl ClassifierResponse {
    /// Build a store-or-create decision from folder existence
    #[must_use]
    pub fn decide(student_id: StudentId, document_type: DocumentType, folder_exists: bool) -> Self {
        if folder_exists {
            Self::Store {
                student_id,
                document_type,
            }
        } else {
            Self::CreateFolderThenStore {
                student_id,
                document_type,
            }
        }
    }

    /// Student ID, unless this is an error
    #[must_use]
    pub fn student_id(&self) -> Option<&StudentId> {
        match self {
            Self::Store { student_id, .. } | Self::CreateFolderThenStore { student_id, .. } => {
                Some(student_id)
            }
            Self::Error(_) => None,
        }
    }

    /// Document type, unless this is an error
    #[must_use]
    pub fn document_type(&self) -> Option<DocumentType> {
        match self {
            Self::Store { document_type, .. }
            | Self::CreateFolderThenStore { document_type, .. } => Some(*document_type),
            Self::Error(_) => None,
        }
    }

    /// Whether the decision asks for a new folder
    #[inline]
    #[must_use]
    pub fn creates_folder(&self) -> bool {
        matches!(self, Self::CreateFolderThenStore { .. })
    }

    /// Short action name (`store`, `createFolderThenStore`, `error`)
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::Store { .. } => "store",
            Self::CreateFolderThenStore { .. } => "createFolderThenStore",
            Self::Error(_) => "error",
        }
    }
}

impl std::fmt::Display for ClassifierResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store {
                student_id,
                document_type,
            } => write!(f, "STORE: {student_id} → {document_type}"),
            Self::CreateFolderThenStore {
                student_id,
                document_type,
            } => write!(f, "CREATE_FOLDER: {student_id}\nTHEN_STORE: {document_type}"),
            Self::Error(token) => write!(f, "ERROR: {token}"),
        }
    }
}

/// Parse response text back into a decision
///
/// Returns `None` for anything that does not follow the grammar, including
/// unknown document types and malformed IDs.
#[must_use]
pub fn parse_response(text: &str) -> Option<ClassifierResponse> {
    if let Some(caps) = CREATE_RE.captures(text) {
        let (student_id, document_type) = decode(&caps[1], &caps[2])?;
        return Some(ClassifierResponse::CreateFolderThenStore {
            student_id,
            document_type,
        });
    }
    if let Some(caps) = STORE_RE.captures(text) {
        let (student_id, document_type) = decode(&caps[1], &caps[2])?;
        return Some(ClassifierResponse::Store {
            student_id,
            document_type,
        });
    }
    ERROR_RE
        .captures(text)
        .map(|caps| ClassifierResponse::Error(ErrorToken::from_token(&caps[1])))
}

fn decode(raw_id: &str, raw_type: &str) -> Option<(StudentId, DocumentType)> {
    let student_id = StudentId::new(raw_id).ok()?;
    let document_type = raw_type.parse().ok()?;
    Some((student_id, document_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> StudentId {
        StudentId::new(raw).unwrap()
    }

    #[test]
    fn store_format() {
        let response = ClassifierResponse::decide(id("ST102"), DocumentType::Assignment, true);
        assert_eq!(response.to_string(), "STORE: ST102 → assignment");
        assert_eq!(response.action(), "store");
    }

    #[test]
    fn create_format() {
        let response = ClassifierResponse::decide(id("ST105"), DocumentType::FeeReceipt, false);
        assert_eq!(
            response.to_string(),
            "CREATE_FOLDER: ST105\nTHEN_STORE: feeReceipt"
        );
        assert!(response.creates_folder());
    }

    #[test]
    fn error_format() {
        let response = ClassifierResponse::Error(ErrorToken::NoStudentId);
        assert_eq!(response.to_string(), "ERROR: NO_STUDENT_ID");
        assert!(response.student_id().is_none());
    }

    #[test]
    fn parse_accepts_ascii_arrow_and_chatter() {
        let text = "Sure! Here is the decision:\nSTORE: st7 -> idCard\nThanks.";
        let parsed = parse_response(text).unwrap();
        assert_eq!(
            parsed,
            ClassifierResponse::Store {
                student_id: id("ST7"),
                document_type: DocumentType::IdCard
            }
        );
    }

    #[test]
    fn parse_create_on_one_line() {
        let parsed = parse_response("CREATE_FOLDER: ST1 THEN_STORE: certificate").unwrap();
        assert!(parsed.creates_folder());
        assert_eq!(parsed.document_type(), Some(DocumentType::Certificate));
    }

    #[test]
    fn parse_error_tokens() {
        assert_eq!(
            parse_response("ERROR: NO_STUDENT_ID"),
            Some(ClassifierResponse::Error(ErrorToken::NoStudentId))
        );
        assert_eq!(
            parse_response("ERROR: QUOTA"),
            Some(ClassifierResponse::Error(ErrorToken::Other("QUOTA".into())))
        );
    }

    #[test]
    fn malformed_text_is_a_null_action() {
        assert_eq!(parse_response(""), None);
        assert_eq!(parse_response("STORE ST1 assignment"), None);
        assert_eq!(parse_response("STORE: ST1 → homework"), None);
        assert_eq!(parse_response("THEN_STORE: assignment"), None);
    }
}
