//! Register types
//!
//! Defines the entities persisted in the register:
//! - Identifiers (record IDs, natural student IDs)
//! - Students and their document link lists
//! - Request payloads for creation and partial updates

use crate::error::RecordError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use ulid::Ulid;

/// Longest accepted student ID
const MAX_STUDENT_ID_LEN: usize = 64;

/// Generated identifier for students and document links (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Ulid);

impl RecordId {
    /// Generate new record ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s.trim())
            .map(Self)
            .map_err(|_| RecordError::validation(format!("invalid record id: {s}")))
    }
}

/// Natural student key
///
/// Always stored uppercased, so equality and hashing are case-insensitive
/// with respect to the raw input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StudentId(String);

impl StudentId {
    /// Normalise and validate a raw student ID
    ///
    /// Accepts ASCII letters, digits, `-` and `_` only; the ID doubles as a
    /// folder name on the storage backends.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, RecordError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(RecordError::validation("studentId is required"));
        }
        if trimmed.len() > MAX_STUDENT_ID_LEN {
            return Err(RecordError::validation(format!(
                "studentId must be at most {MAX_STUDENT_ID_LEN} characters"
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(RecordError::validation(format!(
                "studentId contains invalid characters: {trimmed}"
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Get the normalised ID
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw key
    #[inline]
    #[must_use]
    pub fn matches(&self, raw: &str) -> bool {
        raw.trim().eq_ignore_ascii_case(&self.0)
    }
}

impl TryFrom<String> for StudentId {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StudentId> for String {
    fn from(value: StudentId) -> Self {
        value.0
    }
}

impl FromStr for StudentId {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StudentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Kind of filed document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentType {
    /// Coursework, homework, projects
    Assignment,
    /// Identity documents
    IdCard,
    /// Certificates, diplomas, transcripts
    Certificate,
    /// Fee and payment receipts
    FeeReceipt,
}

impl DocumentType {
    /// All document types in canonical order
    pub const ALL: [Self; 4] = [
        Self::Assignment,
        Self::IdCard,
        Self::Certificate,
        Self::FeeReceipt,
    ];

    /// Wire name (`assignment`, `idCard`, `certificate`, `feeReceipt`)
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::IdCard => "idCard",
            Self::Certificate => "certificate",
            Self::FeeReceipt => "feeReceipt",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = RecordError;

    /// Accepts the wire names case-insensitively, ignoring `_`, `-` and spaces
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "assignment" => Ok(Self::Assignment),
            "idcard" => Ok(Self::IdCard),
            "certificate" => Ok(Self::Certificate),
            "feereceipt" => Ok(Self::FeeReceipt),
            _ => Err(RecordError::validation(format!("unknown document type: {s}"))),
        }
    }
}

/// Link to one stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLink {
    /// Generated link ID
    pub id: RecordId,
    /// Original upload filename
    pub file_name: String,
    /// Link for viewing in a browser
    pub shareable_link: String,
    /// Direct download link
    pub download_link: String,
    /// Storage file ID, `mock-` prefixed for local files
    pub file_id: String,
    /// When the link was recorded
    pub uploaded_at: DateTime<Utc>,
}

/// Link payload produced by a storage upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocumentLink {
    /// Original upload filename
    pub file_name: String,
    /// Link for viewing in a browser
    pub shareable_link: String,
    /// Direct download link
    pub download_link: String,
    /// Storage file ID
    pub file_id: String,
}

impl NewDocumentLink {
    /// Stamp the payload with a fresh ID and upload time
    #[must_use]
    pub fn into_link(self) -> DocumentLink {
        DocumentLink {
            id: RecordId::new(),
            file_name: self.file_name,
            shareable_link: self.shareable_link,
            download_link: self.download_link,
            file_id: self.file_id,
            uploaded_at: Utc::now(),
        }
    }
}

/// The four per-type link lists of a student
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSet {
    /// Coursework
    #[serde(default)]
    pub assignment_links: Vec<DocumentLink>,
    /// Identity documents
    #[serde(default)]
    pub id_card_links: Vec<DocumentLink>,
    /// Certificates and transcripts
    #[serde(default)]
    pub certificate_links: Vec<DocumentLink>,
    /// Fee and payment receipts
    #[serde(default)]
    pub fee_receipt_links: Vec<DocumentLink>,
}

impl DocumentSet {
    /// Links of one type, in upload order
    #[must_use]
    pub fn links(&self, ty: DocumentType) -> &[DocumentLink] {
        match ty {
            DocumentType::Assignment => &self.assignment_links,
            DocumentType::IdCard => &self.id_card_links,
            DocumentType::Certificate => &self.certificate_links,
            DocumentType::FeeReceipt => &self.fee_receipt_links,
        }
    }

    /// Mutable links of one type
    pub fn links_mut(&mut self, ty: DocumentType) -> &mut Vec<DocumentLink> {
        match ty {
            DocumentType::Assignment => &mut self.assignment_links,
            DocumentType::IdCard => &mut self.id_card_links,
            DocumentType::Certificate => &mut self.certificate_links,
            DocumentType::FeeReceipt => &mut self.fee_receipt_links,
        }
    }

    /// Total number of links across all types
    #[must_use]
    pub fn total(&self) -> usize {
        DocumentType::ALL.iter().map(|ty| self.links(*ty).len()).sum()
    }

    /// Iterate over every link with its type
    pub fn iter(&self) -> impl Iterator<Item = (DocumentType, &DocumentLink)> + '_ {
        DocumentType::ALL
            .into_iter()
            .flat_map(move |ty| self.links(ty).iter().map(move |link| (ty, link)))
    }

    /// Most recent upload time
    #[must_use]
    pub fn last_upload(&self) -> Option<DateTime<Utc>> {
        self.iter().map(|(_, link)| link.uploaded_at).max()
    }
}

/// A registered student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Generated record ID
    pub id: RecordId,
    /// Natural key, unique ignoring case
    pub student_id: StudentId,
    /// Display name
    pub name: String,
    /// Department, may be empty
    #[serde(default)]
    pub department: String,
    /// Email, empty or containing `@`
    #[serde(default)]
    pub email: String,
    /// Phone, free text
    #[serde(default)]
    pub phone: String,
    /// Document links by type
    #[serde(default)]
    pub documents: DocumentSet,
    /// Main storage folder, once placed on the primary backend
    #[serde(default)]
    pub drive_folder_id: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Check whether a lookup key (record ID or student ID) refers to this student
    #[must_use]
    pub fn is_keyed_by(&self, key: &str) -> bool {
        self.student_id.matches(key) || self.id.to_string().eq_ignore_ascii_case(key.trim())
    }

    /// Bump the modification time
    #[inline]
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Per-type document statistics
    #[must_use]
    pub fn stats(&self) -> StudentStats {
        let by_type = DocumentType::ALL
            .into_iter()
            .map(|ty| (ty, self.documents.links(ty).len()))
            .collect();
        StudentStats {
            student_id: self.student_id.clone(),
            name: self.name.clone(),
            total_documents: self.documents.total(),
            by_type,
            last_upload_at: self.documents.last_upload(),
            has_drive_folder: self.drive_folder_id.is_some(),
        }
    }
}

/// Creation payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    /// Natural key; required
    #[serde(default)]
    pub student_id: String,
    /// Display name; required
    #[serde(default)]
    pub name: String,
    /// Department
    #[serde(default)]
    pub department: Option<String>,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
    /// Phone
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewStudent {
    /// Create payload with the required fields
    #[must_use]
    pub fn new(student_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// With department
    #[must_use]
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// With email
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// With phone
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Validate and turn into a fresh student record
    pub fn into_student(self) -> Result<Student, RecordError> {
        let student_id = StudentId::new(&self.student_id)?;
        let name = required_name(&self.name)?;
        let email = optional_email(self.email.as_deref())?;
        let now = Utc::now();

        Ok(Student {
            id: RecordId::new(),
            student_id,
            name,
            department: trimmed(self.department.as_deref()),
            email,
            phone: trimmed(self.phone.as_deref()),
            documents: DocumentSet::default(),
            drive_folder_id: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update payload; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    /// New natural key
    #[serde(default)]
    pub student_id: Option<String>,
    /// New display name
    #[serde(default)]
    pub name: Option<String>,
    /// New department
    #[serde(default)]
    pub department: Option<String>,
    /// New email
    #[serde(default)]
    pub email: Option<String>,
    /// New phone
    #[serde(default)]
    pub phone: Option<String>,
    /// New main folder ID; blank clears it
    #[serde(default)]
    pub drive_folder_id: Option<String>,
}

impl StudentPatch {
    /// Check whether the patch changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch to a student
    ///
    /// A changed student ID is validated here; uniqueness is the store's job.
    pub fn apply(&self, student: &mut Student) -> Result<(), RecordError> {
        if let Some(raw) = &self.student_id {
            student.student_id = StudentId::new(raw)?;
        }
        if let Some(name) = &self.name {
            student.name = required_name(name)?;
        }
        if let Some(department) = &self.department {
            student.department = department.trim().to_string();
        }
        if let Some(email) = &self.email {
            student.email = optional_email(Some(email))?;
        }
        if let Some(phone) = &self.phone {
            student.phone = phone.trim().to_string();
        }
        if let Some(folder) = &self.drive_folder_id {
            let folder = folder.trim();
            student.drive_folder_id = (!folder.is_empty()).then(|| folder.to_string());
        }
        student.touch();
        Ok(())
    }
}

/// Document counts for one student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    /// Natural key
    pub student_id: StudentId,
    /// Display name
    pub name: String,
    /// Links across all types
    pub total_documents: usize,
    /// Link count per type, all four types present
    pub by_type: BTreeMap<DocumentType, usize>,
    /// Newest upload, if any
    pub last_upload_at: Option<DateTime<Utc>>,
    /// Whether a main folder ID is recorded
    pub has_drive_folder: bool,
}

fn required_name(raw: &str) -> Result<String, RecordError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RecordError::validation("name is required"));
    }
    Ok(name.to_string())
}

fn optional_email(raw: Option<&str>) -> Result<String, RecordError> {
    let email = raw.unwrap_or_default().trim();
    if !email.is_empty() && !email.contains('@') {
        return Err(RecordError::validation(format!("invalid email: {email}")));
    }
    Ok(email.to_string())
}

fn trimmed(raw: Option<&str>) -> String {
    raw.unwrap_or_default().trim().to_string()
}
