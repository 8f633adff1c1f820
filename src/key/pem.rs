//! Minimal `PUBLIC KEY` PEM armoring.
//!
//! KMS hands out bare DER; `jsonwebtoken` wants PEM. Only the
//! `SubjectPublicKeyInfo` label is handled.

use base64::{Engine, engine::general_purpose::STANDARD};

use super::KeyError;

const BEGIN: &str = "-----BEGIN PUBLIC KEY-----";
const END: &str = "-----END PUBLIC KEY-----";
const LINE_WIDTH: usize = 64;

/// Wrap DER bytes in a `PUBLIC KEY` PEM envelope.
#[must_use]
pub fn der_to_pem(der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let mut pem = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH + 64);

    pem.push_str(BEGIN);
    pem.push('\n');
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        // base64 is ASCII, so any byte offset is a char boundary
        let (line, tail) = rest.split_at(rest.len().min(LINE_WIDTH));
        pem.push_str(line);
        pem.push('\n');
        rest = tail;
    }
    pem.push_str(END);
    pem.push('\n');
    pem
}

/// Extract the DER bytes from the first `PUBLIC KEY` block in `pem`.
pub fn pem_to_der(pem: &str) -> Result<Vec<u8>, KeyError> {
    let start = pem
        .find(BEGIN)
        .ok_or_else(|| KeyError::Pem("missing BEGIN PUBLIC KEY line".to_string()))?;
    let body = &pem[start + BEGIN.len()..];
    let end = body
        .find(END)
        .ok_or_else(|| KeyError::Pem("missing END PUBLIC KEY line".to_string()))?;

    let encoded: String = body[..end].chars().filter(|c| !c.is_whitespace()).collect();
    if encoded.is_empty() {
        return Err(KeyError::Pem("empty PUBLIC KEY block".to_string()));
    }

    STANDARD
        .decode(encoded)
        .map_err(|e| KeyError::Pem(e.to_string()))
}
