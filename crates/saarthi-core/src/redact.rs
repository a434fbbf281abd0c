//! PII detection and redaction.
//!
//! Utterances are never logged raw. Log previews go through [`log_preview`],
//! which truncates and masks e-mail addresses, phone numbers, SSNs and
//! Luhn-valid card numbers. The same detector feeds PII entities in the
//! offline analyzer backend.

use std::sync::LazyLock;

use regex::Regex;

/// Type of PII detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiiType {
    Email,
    PhoneNumber,
    Ssn,
    CreditCard,
}

impl PiiType {
    /// Placeholder token used in redacted text.
    pub fn placeholder(&self) -> &'static str {
        match self {
            PiiType::Email => "[EMAIL_REDACTED]",
            PiiType::PhoneNumber => "[PHONE_REDACTED]",
            PiiType::Ssn => "[SSN_REDACTED]",
            PiiType::CreditCard => "[CC_REDACTED]",
        }
    }
}

/// A detected PII span (byte offsets into the source text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiiMatch {
    pub pii_type: PiiType,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}")
        .expect("email regex")
});

static SSN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("ssn regex"));

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\+1[ ]?\d{3}[ ]?\d{3}[ ]?\d{4}|\(\d{3}\)[ ]?\d{3}-\d{4}|\b\d{3}[-.]\d{3}[-.]\d{4}|\b[6-9]\d{9})\b",
    )
    .expect("phone regex")
});

static CARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d(?:[ -]?\d){12,18}\b").expect("card regex"));

/// Validate a digit sequence with the Luhn checksum.
fn luhn_check(digits: &[u32]) -> bool {
    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Find every PII span, ordered by position, without overlaps.
pub fn find_pii(text: &str) -> Vec<PiiMatch> {
    let mut found: Vec<PiiMatch> = Vec::new();

    let mut push = |pii_type: PiiType, m: regex::Match<'_>| {
        let overlaps = found
            .iter()
            .any(|f| m.start() < f.end && f.start < m.end());
        if !overlaps {
            found.push(PiiMatch {
                pii_type,
                start: m.start(),
                end: m.end(),
                text: m.as_str().to_string(),
            });
        }
    };

    for m in EMAIL.find_iter(text) {
        push(PiiType::Email, m);
    }
    for m in SSN.find_iter(text) {
        push(PiiType::Ssn, m);
    }
    for m in CARD.find_iter(text) {
        let digits: Vec<u32> = m.as_str().chars().filter_map(|c| c.to_digit(10)).collect();
        if luhn_check(&digits) {
            push(PiiType::CreditCard, m);
        }
    }
    for m in PHONE.find_iter(text) {
        push(PiiType::PhoneNumber, m);
    }

    found.sort_by_key(|m| m.start);
    found
}

/// Replace every PII span with its placeholder. Returns the text and the
/// number of redactions.
pub fn redact(text: &str) -> (String, usize) {
    let matches = find_pii(text);
    if matches.is_empty() {
        return (text.to_string(), 0);
    }
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for m in &matches {
        out.push_str(&text[cursor..m.start]);
        out.push_str(m.pii_type.placeholder());
        cursor = m.end;
    }
    out.push_str(&text[cursor..]);
    (out, matches.len())
}

/// Short, optionally redacted preview of an utterance for log lines.
pub fn log_preview(text: &str, max_chars: usize, redact_pii: bool) -> String {
    let base = if redact_pii {
        redact(text).0
    } else {
        text.to_string()
    };
    let mut preview: String = base.chars().take(max_chars).collect();
    if base.chars().count() > max_chars {
        preview.push('…');
    }
    preview
}
