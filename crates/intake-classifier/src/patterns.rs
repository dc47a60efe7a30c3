//! Filename pattern tables
//!
//! Both tables are ordered; the first matching row wins. Document-type
//! patterns match anywhere in the name, so camelCase names such as
//! `JanFeeReceipt.pdf` classify like `Jan_Fee_Receipt.pdf`. Student IDs must
//! not be preceded by a letter or digit.

use intake_records::{DocumentType, StudentId};
use once_cell::sync::Lazy;
use regex::Regex;

/// Patterns per document type, in priority order
const DOCUMENT_PATTERNS: &[(DocumentType, &[&str])] = &[
    (
        DocumentType::IdCard,
        &[
            r"id[ _-]?card",
            r"identity[ _-]?card",
            r"student[ _-]?id[ _-]?card",
            r"aadhaa?r",
            r"passport",
        ],
    ),
    (
        DocumentType::FeeReceipt,
        &[
            r"fees?[ _-]?receipt",
            r"fees?",
            r"receipt",
            r"payment",
            r"invoice",
            r"tuition",
        ],
    ),
    (
        DocumentType::Certificate,
        &[r"certificate", r"cert", r"diploma", r"award", r"transcript"],
    ),
    (
        DocumentType::Assignment,
        &[
            r"assignment",
            r"homework",
            r"hw",
            r"project",
            r"essay",
            r"lab[ _-]?report",
        ],
    ),
];

/// Student ID shapes, in priority order; group 1 is the ID
const STUDENT_ID_PATTERNS: &[&str] = &[
    r"(?i)(?:^|[^a-z0-9])(st\d{3,})",
    r"(?i)(?:^|[^a-z0-9])(stu\d{3,})",
    r"(?i)(?:^|[^a-z0-9])(\d{2}[a-z]{2,4}\d{3,})",
    r"(?i)(?:^|[^a-z0-9])(s\d{5,})",
];

static DOCUMENT_TABLE: Lazy<Vec<(DocumentType, Regex)>> = Lazy::new(|| {
    DOCUMENT_PATTERNS
        .iter()
        .map(|(ty, patterns)| {
            let pattern = format!(r"(?i){}", patterns.join("|"));
            let regex = Regex::new(&pattern).expect("document keyword table is a valid regex");
            (*ty, regex)
        })
        .collect()
});

static STUDENT_ID_TABLE: Lazy<Vec<Regex>> = Lazy::new(|| {
    STUDENT_ID_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("student id table is a valid regex"))
        .collect()
});

/// Classify a filename by the first matching keyword row
///
/// Unmatched names are assignments.
#[must_use]
pub fn detect_document_type(file_name: &str) -> DocumentType {
    DOCUMENT_TABLE
        .iter()
        .find(|(_, regex)| regex.is_match(file_name))
        .map_or(DocumentType::Assignment, |(ty, _)| *ty)
}

/// Extract a student ID from a filename using the first matching row
///
/// The match is uppercased.
#[must_use]
pub fn extract_student_id(file_name: &str) -> Option<StudentId> {
    STUDENT_ID_TABLE.iter().find_map(|regex| {
        regex
            .captures(file_name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| StudentId::new(m.as_str()).ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_types_by_keyword() {
        let cases = [
            ("ST102_Math_HW.pdf", DocumentType::Assignment),
            ("Fee_Receipt_Jan.pdf", DocumentType::FeeReceipt),
            ("tuition-payment-2024.pdf", DocumentType::FeeReceipt),
            ("ST9 ID Card.jpg", DocumentType::IdCard),
            ("passport_scan.png", DocumentType::IdCard),
            ("Certificates.pdf", DocumentType::Certificate),
            ("award-science-fair.pdf", DocumentType::Certificate),
            ("Physics Lab Report.docx", DocumentType::Assignment),
            ("holiday_photo.jpg", DocumentType::Assignment),
        ];
        for (name, expected) in cases {
            assert_eq!(detect_document_type(name), expected, "{name}");
        }
    }

    #[test]
    fn table_order_breaks_ties() {
        // Both an ID card and a receipt keyword: the ID card row comes first
        assert_eq!(
            detect_document_type("id_card_fee_receipt.pdf"),
            DocumentType::IdCard
        );
        // Receipt outranks certificate
        assert_eq!(
            detect_document_type("certificate_fee.pdf"),
            DocumentType::FeeReceipt
        );
    }

    #[test]
    fn camel_case_names_match() {
        let cases = [
            ("MyIdCard.jpg", DocumentType::IdCard),
            ("JanFeeReceipt.pdf", DocumentType::FeeReceipt),
            ("PhysicsCertificate.pdf", DocumentType::Certificate),
            ("MathHomework3.pdf", DocumentType::Assignment),
            ("ST102LabReport.docx", DocumentType::Assignment),
        ];
        for (name, expected) in cases {
            assert_eq!(detect_document_type(name), expected, "{name}");
        }
    }

    #[test]
    fn patterns_match_inside_words() {
        // `cert` is a plain pattern, so it fires inside longer words too
        assert_eq!(detect_document_type("concert.pdf"), DocumentType::Certificate);
        assert_eq!(detect_document_type("coffee_break.pdf"), DocumentType::FeeReceipt);
    }

    #[test]
    fn student_id_extraction_uppercases() {
        assert_eq!(
            extract_student_id("st102_math_hw.pdf").unwrap().as_str(),
            "ST102"
        );
        assert_eq!(
            extract_student_id("report-STU4410.pdf").unwrap().as_str(),
            "STU4410"
        );
        assert_eq!(
            extract_student_id("21cs045_lab.pdf").unwrap().as_str(),
            "21CS045"
        );
        assert_eq!(extract_student_id("s123456.pdf").unwrap().as_str(), "S123456");
    }

    #[test]
    fn student_id_table_order() {
        // An ST id and a roll number: the ST row is tried first
        assert_eq!(
            extract_student_id("21CS045_ST777.pdf").unwrap().as_str(),
            "ST777"
        );
    }

    #[test]
    fn student_id_requires_separator_before() {
        assert!(extract_student_id("TEST1234.pdf").is_none());
        assert!(extract_student_id("Fee_Receipt_Jan.pdf").is_none());
        assert!(extract_student_id("ST12.pdf").is_none());
    }
}
