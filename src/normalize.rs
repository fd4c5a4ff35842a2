//! Trailing line-terminator normalization.
//!
//! Some provider classes store more text than they were given: a rich-edit
//! control appends `"\r\n"` after the requested text. The difference is the
//! *terminator delta*. It is derived once per document mutation and then
//! applied in exactly one direction per comparison:
//!
//! - subtracted when a provider-reported (raw) length is compared with a
//!   requested length, see [`Normalizer::normalized_len`];
//! - added when a normalized length is compared with a raw provider length,
//!   see [`Normalizer::raw_len`].
//!
//! Applying it twice, or not at all, is the defect this module exists to
//! prevent.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Failure;
use crate::error::Result;

/// The category of text control implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderClass {
    /// A plain edit control. Stores exactly what it is given.
    PlainEdit,
    /// A rich edit control. Appends a trailing `"\r\n"`.
    RichEdit,
}

impl ProviderClass {
    pub const ALL: [ProviderClass; 2] = [ProviderClass::PlainEdit, ProviderClass::RichEdit];

    /// The terminator this class appends to stored text.
    pub fn appended_terminator(self) -> &'static str {
        return match self {
            ProviderClass::PlainEdit => "",
            ProviderClass::RichEdit => "\r\n",
        };
    }

    pub fn name(self) -> &'static str {
        return match self {
            ProviderClass::PlainEdit => "plain-edit",
            ProviderClass::RichEdit => "rich-edit",
        };
    }
}

impl fmt::Display for ProviderClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.name());
    }
}

/// Number of trailing characters a provider added: 0, 1 or 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TerminatorDelta(u8);

impl TerminatorDelta {
    pub const ZERO: TerminatorDelta = TerminatorDelta(0);

    #[inline]
    pub fn get(self) -> usize {
        return self.0 as usize;
    }
}

/// Length in characters of a trailing `"\r\n"`, `"\r"` or `"\n"`.
fn trailing_terminator_len(text: &str) -> usize {
    if text.ends_with("\r\n") {
        return 2;
    }
    if text.ends_with('\r') || text.ends_with('\n') {
        return 1;
    }
    return 0;
}

/// Derive the delta from a raw document text alone.
///
/// Only classes that append a terminator get a nonzero delta; for them, a
/// trailing `"\r\n"` (or lone `"\r"` / `"\n"`) is attributed to the provider.
/// Prefer [`derive_delta`] when the requested text is known, since a sample
/// that itself ends in a terminator is otherwise indistinguishable.
pub fn normalize(raw_text: &str, class: ProviderClass) -> TerminatorDelta {
    if class.appended_terminator().is_empty() {
        return TerminatorDelta::ZERO;
    }
    return TerminatorDelta(trailing_terminator_len(raw_text) as u8);
}

/// Derive the delta by diffing the text actually stored against the text
/// that was requested.
pub fn derive_delta(requested: &str, actual: &str, class: ProviderClass) -> Result<TerminatorDelta> {
    if actual == requested {
        return Ok(TerminatorDelta::ZERO);
    }

    let suffix = match actual.strip_prefix(requested) {
        Some(suffix) if matches!(suffix, "\r\n" | "\r" | "\n") => suffix,
        _ => {
            return Err(Error::verification(Failure::new(
                "SetDocumentText",
                format!("{requested:?}"),
                format!("{requested:?} plus an optional trailing terminator"),
                format!("{actual:?}"),
            )));
        }
    };

    if class.appended_terminator().is_empty() {
        tracing::warn!(%class, ?suffix, "provider class appended a terminator it is not known to append");
    }
    return Ok(TerminatorDelta(suffix.chars().count() as u8));
}

/// Applies one terminator delta consistently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Normalizer {
    delta: TerminatorDelta,
}

impl Normalizer {
    pub fn new(delta: TerminatorDelta) -> Normalizer {
        return Normalizer { delta };
    }

    pub fn delta(&self) -> TerminatorDelta {
        return self.delta;
    }

    /// Raw (provider) length to normalized length.
    pub fn normalized_len(&self, raw_len: usize) -> usize {
        return raw_len.saturating_sub(self.delta.get());
    }

    /// Normalized length to raw (provider) length.
    pub fn raw_len(&self, normalized_len: usize) -> usize {
        return normalized_len + self.delta.get();
    }

    /// Strip the provider-added terminator from a raw text.
    ///
    /// Texts that do not end in a terminator are returned unchanged, so this
    /// is safe on sub-range texts that stop before the document end.
    pub fn strip<'a>(&self, raw_text: &'a str) -> &'a str {
        let trailing = trailing_terminator_len(raw_text).min(self.delta.get());
        if trailing == 0 {
            return raw_text;
        }
        // Terminator characters are single bytes.
        return &raw_text[..raw_text.len() - trailing];
    }

    /// Check a raw length reported by the provider against a requested length.
    pub fn verify_len(&self, operation: &str, requested_len: usize, raw_len: usize) -> Result<()> {
        let normalized = self.normalized_len(raw_len);
        if normalized != requested_len {
            return Err(Error::verification(Failure::new(
                operation,
                format!("delta={}", self.delta.get()),
                format!("length {requested_len} ({} raw)", self.raw_len(requested_len)),
                format!("length {normalized} ({raw_len} raw)"),
            )));
        }
        return Ok(());
    }
}
