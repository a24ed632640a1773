// 🔎 Barcode Resolver - Canonical codes + scale-label decoding
//
// Raw scans arrive with whatever the scanner or keyboard produced:
// - UPC-A with its check digit (12 digits)
// - EAN-13 / internal codes (13 digits)
// - Numeric input that lost its leading zeros ("1" → "0000000000001")
// - Variable-weight scale labels with an embedded price ("2PPPPPxCCCC[k]")
//
// Everything resolves to a 13-digit CanonicalCode, the single key used by
// the catalogue and by every inventory list.

use crate::catalogue::CatalogueEntry;
use crate::price::Price;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Length of every canonical code.
pub const CODE_LEN: usize = 13;

/// Leading digit that marks a variable-weight (scale) label.
const SCALE_FLAG: u8 = b'2';

/// Scale payload length once the check digit is gone.
const SCALE_PAYLOAD_LEN: usize = 11;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BarcodeError {
    /// The raw input contained no digits at all.
    #[error("item code is empty or contains no digits")]
    EmptyCode,

    /// More than 13 digits cannot be a catalogue key.
    #[error("item code has {digits} digits, at most 13 are allowed")]
    TooLong { digits: usize },

    /// A stored value that should already be canonical is not.
    #[error("not a canonical 13-digit code: {0:?}")]
    NotCanonical(String),
}

// ============================================================================
// CANONICAL CODE
// ============================================================================

/// Exactly 13 ASCII digits. The universal catalogue / list key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalCode(String);

impl CanonicalCode {
    /// Accept a string that is already canonical (13 digits, nothing else).
    pub fn new(code: impl Into<String>) -> Result<Self, BarcodeError> {
        let code = code.into();
        if code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_digit()) {
            Ok(CanonicalCode(code))
        } else {
            Err(BarcodeError::NotCanonical(code))
        }
    }

    /// Zero-pad on the LEFT (lost leading zeros). Caller guarantees 1..=13 digits.
    fn left_padded(digits: &str) -> Self {
        CanonicalCode(format!("{:0>width$}", digits, width = CODE_LEN))
    }

    /// Zero-fill on the RIGHT (scale-item prefixes). Caller guarantees <= 13 digits.
    fn right_padded(prefix: &str) -> Self {
        CanonicalCode(format!("{:0<width$}", prefix, width = CODE_LEN))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CanonicalCode {
    type Error = BarcodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CanonicalCode::new(value)
    }
}

impl From<CanonicalCode> for String {
    fn from(code: CanonicalCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CanonicalCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CanonicalCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// CODE SHAPE
// ============================================================================

/// Which length rule produced the canonical code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeShape {
    /// 11/12 digits starting with `2`: variable-weight label
    ScaleLabel,

    /// 12 digits: UPC-A, trailing check digit dropped
    UpcA,

    /// 13 digits: EAN-13 or internal code, passed through
    Ean13,

    /// 11 digits, not a scale label: UPC-A whose check digit is already gone
    UpcANoCheck,

    /// Any other length: zero-padded without check-digit handling.
    /// Correctness is not guaranteed, flagged for catalogue audit.
    ShortCode,
}

impl CodeShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeShape::ScaleLabel => "scale label",
            CodeShape::UpcA => "UPC-A",
            CodeShape::Ean13 => "EAN-13",
            CodeShape::UpcANoCheck => "UPC-A (no check digit)",
            CodeShape::ShortCode => "short code",
        }
    }

    /// `AmbiguousLength`: no length rule matched, only the fallback padding.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, CodeShape::ShortCode)
    }
}

// ============================================================================
// CANONICALIZER
// ============================================================================

/// Keep ASCII digits only (scanner prefixes, dashes, CR/LF, BOM, ...).
pub fn strip_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Turn a raw scan into its 13-digit canonical code.
///
/// Length rules, after stripping non-digits:
/// - 11 or 12 digits starting with `2` → scale label, most specific candidate
/// - 12 digits → UPC-A, drop check digit, left-pad
/// - 13 digits → unchanged
/// - anything shorter → left-pad
/// - more than 13 → `TooLong`
pub fn canonicalize(raw: &str) -> Result<CanonicalCode, BarcodeError> {
    canonicalize_digits(&strip_digits(raw)).map(|(code, _)| code)
}

fn canonicalize_digits(digits: &str) -> Result<(CanonicalCode, CodeShape), BarcodeError> {
    if digits.is_empty() {
        return Err(BarcodeError::EmptyCode);
    }
    if digits.len() > CODE_LEN {
        return Err(BarcodeError::TooLong {
            digits: digits.len(),
        });
    }

    if let Some(label) = decode_digits(digits) {
        if let Some(code) = label.candidate_codes.into_iter().next() {
            return Ok((code, CodeShape::ScaleLabel));
        }
    }

    let shaped = match digits.len() {
        12 => (CanonicalCode::left_padded(&digits[..11]), CodeShape::UpcA),
        13 => (CanonicalCode::left_padded(digits), CodeShape::Ean13),
        11 => (CanonicalCode::left_padded(digits), CodeShape::UpcANoCheck),
        _ => (CanonicalCode::left_padded(digits), CodeShape::ShortCode),
    };
    Ok(shaped)
}

// ============================================================================
// SCALE-LABEL DECODER
// ============================================================================

/// Decoded variable-weight label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaleDecodeResult {
    /// Price printed into the label (price-in-cents field / 100)
    pub price: Price,

    /// 5-digit price look-up number
    pub plu: String,

    /// Catalogue keys to try, most specific (7-digit prefix) first
    pub candidate_codes: Vec<CanonicalCode>,
}

/// Decode a variable-weight label, or `None` if the scan is not one.
///
/// Payload layout (11 digits, check digit already removed):
///
/// ```text
///   2 PPPPP x CCCC
///   0 1...5 6 7..10
/// ```
///
/// `P` = PLU, `C` = price in cents. Candidate keys are the first 7 and the
/// first 6 payload digits, zero-filled on the right to 13 digits.
pub fn decode_scale_label(raw: &str) -> Option<ScaleDecodeResult> {
    decode_digits(&strip_digits(raw))
}

fn decode_digits(digits: &str) -> Option<ScaleDecodeResult> {
    if !matches!(digits.len(), 11 | 12) || digits.as_bytes()[0] != SCALE_FLAG {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let payload = &digits[..SCALE_PAYLOAD_LEN];
    let cents: u64 = payload[7..11].parse().ok()?;

    Some(ScaleDecodeResult {
        price: Price::from_cents(cents),
        plu: payload[1..6].to_string(),
        candidate_codes: vec![
            CanonicalCode::right_padded(&payload[..7]),
            CanonicalCode::right_padded(&payload[..6]),
        ],
    })
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Read-only catalogue capability handed to the resolver.
pub trait CatalogueLookup {
    fn lookup(&self, code: &CanonicalCode) -> Option<CatalogueEntry>;
}

impl<F> CatalogueLookup for F
where
    F: Fn(&CanonicalCode) -> Option<CatalogueEntry>,
{
    fn lookup(&self, code: &CanonicalCode) -> Option<CatalogueEntry> {
        self(code)
    }
}

/// Outcome of resolving one raw scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedItem {
    pub code: CanonicalCode,

    /// Catalogue hit, if any. `None` → caller supplies brand/description/price.
    pub entry: Option<CatalogueEntry>,

    /// Price embedded in a scale label. Always wins over the catalogue price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_price: Option<Price>,

    pub shape: CodeShape,
}

impl ResolvedItem {
    pub fn is_scale(&self) -> bool {
        self.override_price.is_some()
    }

    pub fn is_found(&self) -> bool {
        self.entry.is_some()
    }

    /// Price the item should be counted at, when the system knows it.
    pub fn known_price(&self) -> Option<Price> {
        self.override_price
            .or_else(|| self.entry.as_ref().map(|e| e.price))
    }
}

/// Resolve a raw scan against the catalogue.
///
/// Scale labels try each candidate key in order and fall back to the most
/// specific one when none is in the catalogue. Everything else is
/// canonicalized and looked up once.
pub fn resolve<L>(raw: &str, catalogue: &L) -> Result<ResolvedItem, BarcodeError>
where
    L: CatalogueLookup + ?Sized,
{
    let digits = strip_digits(raw);
    if digits.is_empty() {
        return Err(BarcodeError::EmptyCode);
    }

    if let Some(label) = decode_digits(&digits) {
        let hit = label
            .candidate_codes
            .iter()
            .find_map(|code| catalogue.lookup(code).map(|entry| (code.clone(), entry)));

        let (code, entry) = match hit {
            Some((code, entry)) => (code, Some(entry)),
            None => (label.candidate_codes[0].clone(), None),
        };

        tracing::debug!(
            raw,
            code = %code,
            plu = %label.plu,
            price = %label.price,
            found = entry.is_some(),
            "resolved scale label"
        );

        return Ok(ResolvedItem {
            code,
            entry,
            override_price: Some(label.price),
            shape: CodeShape::ScaleLabel,
        });
    }

    let (code, shape) = canonicalize_digits(&digits)?;
    let entry = catalogue.lookup(&code);

    if shape.is_ambiguous() {
        tracing::warn!(
            raw,
            digits = digits.len(),
            code = %code,
            found = entry.is_some(),
            "ambiguous code length, zero-padded without check-digit handling"
        );
    } else {
        tracing::debug!(raw, code = %code, shape = shape.as_str(), found = entry.is_some(), "resolved code");
    }

    Ok(ResolvedItem {
        code,
        entry,
        override_price: None,
        shape,
    })
}

// ============================================================================
// TESTS
// ============================================================================
