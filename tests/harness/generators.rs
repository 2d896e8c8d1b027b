// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for upload scenarios.

use base64::{engine::general_purpose::STANDARD, Engine};
use pdf_upload_gateway::models::UploadCandidate;
use pdf_upload_gateway::ClientKey;

/// A small but well-formed looking PDF body of `len` bytes (at least 9).
pub fn pdf_bytes(len: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.resize(len.max(bytes.len()), b' ');
    bytes
}

/// Candidate carrying a valid PDF with an honest declared size.
pub fn pdf_candidate(name: &str) -> UploadCandidate {
    let bytes = pdf_bytes(1024);
    UploadCandidate {
        declared_size: bytes.len() as u64,
        bytes,
        declared_name: name.to_string(),
        declared_content_type: "application/pdf".to_string(),
    }
}

/// Candidate whose bytes are not a PDF but which claims to be one.
pub fn disguised_candidate(name: &str, bytes: &[u8]) -> UploadCandidate {
    UploadCandidate {
        declared_size: bytes.len() as u64,
        bytes: bytes.to_vec(),
        declared_name: name.to_string(),
        declared_content_type: "application/pdf".to_string(),
    }
}

/// Pool of distinct client keys.
pub fn client_keys(count: usize) -> Vec<ClientKey> {
    (0..count)
        .map(|i| ClientKey::new(format!("10.{}.{}.{}", (i >> 16) & 0xFF, (i >> 8) & 0xFF, i & 0xFF)))
        .collect()
}

/// Payloads that must never pass the magic-number gate.
pub fn non_pdf_payloads() -> Vec<&'static [u8]> {
    vec![
        b"",
        b"%",
        b"%PD",
        b"%pdf-1.4",
        b" %PDF-1.4",
        b"\xEF\xBB\xBF%PDF-1.4", // BOM-prefixed
        b"PK\x03\x04",           // zip / docx
        b"\x89PNG\r\n\x1a\n",
        b"GIF89a",
        b"<html><body>%PDF</body></html>",
        b"NOTPDF...",
    ]
}

/// Declared names carrying characters outside the allowed set.
pub fn hostile_names() -> Vec<&'static str> {
    vec![
        "../../etc/passwd",
        "..\\..\\windows\\system32.pdf",
        "<script>alert(1)</script>.pdf",
        "name\0with\0nul.pdf",
        "semi;colon|pipe&amp.pdf",
        "quote\"s'.pdf",
        "emoji-\u{1F4C4}.pdf",
        "r\u{e9}sum\u{e9}.pdf",
        "%2e%2e%2fencoded.pdf",
        "\u{202E}fdp.exe",
    ]
}

/// Declared names long enough to overflow a file name if kept whole.
pub fn overlong_names() -> Vec<String> {
    vec![
        format!("report.{}", "p".repeat(300)),
        format!("{}.{}", "a".repeat(200), "b".repeat(120)),
        format!("{}.pdf", "long name ".repeat(100)),
        "x".repeat(4096),
    ]
}

/// JSON upload envelope as the browser widget sends it.
pub fn upload_body(bytes: &[u8], name: &str, size: u64) -> String {
    serde_json::json!({
        "fileData": STANDARD.encode(bytes),
        "fileName": name,
        "fileSize": size,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_bytes_have_magic() {
        assert!(pdf_bytes(1024).starts_with(b"%PDF"));
        assert_eq!(pdf_bytes(1024).len(), 1024);
        assert_eq!(pdf_bytes(0).len(), 9);
    }

    #[test]
    fn test_client_keys_unique() {
        let keys = client_keys(300);
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), 300);
    }
}
