//! Per-scenario document snapshots.
//!
//! A [`DocumentSession`] is an explicit value passed to every oracle call. It
//! holds the normalized text, the terminator delta derived when the text was
//! written, and a content hash. Nothing about the current document is kept in
//! ambient state; [`SessionCache`] is an opt-in memoization keyed by content
//! hash.

use rustc_hash::FxHashMap;

use crate::error::Error;
use crate::error::Failure;
use crate::error::Result;
use crate::normalize;
use crate::normalize::Normalizer;
use crate::normalize::ProviderClass;
use crate::normalize::TerminatorDelta;
use crate::outcome::expect_success;
use crate::provider::RangeProvider;
use crate::provider::TextSource;
use crate::range::Range;

/// A blake3 content hash, 32 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 32]);

/// Hash a raw document text together with its provider class.
pub fn content_hash(class: ProviderClass, text: &str) -> ContentHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(class.name().as_bytes());
    hasher.update(&[0]);
    hasher.update(&(text.len() as u64).to_le_bytes());
    hasher.update(text.as_bytes());
    return ContentHash(*hasher.finalize().as_bytes());
}

/// An immutable snapshot of the document for one scenario.
#[derive(Clone, Debug)]
pub struct DocumentSession {
    class: ProviderClass,
    text: String,
    len: usize,
    raw_len: usize,
    normalizer: Normalizer,
    raw_hash: ContentHash,
}

impl DocumentSession {
    /// Build a session from a raw text and an already-derived delta.
    pub fn from_raw(raw: &str, class: ProviderClass, delta: TerminatorDelta) -> DocumentSession {
        let normalizer = Normalizer::new(delta);
        let text = normalizer.strip(raw).to_string();
        let len = text.chars().count();
        return DocumentSession {
            class,
            len,
            raw_len: raw.chars().count(),
            normalizer,
            raw_hash: content_hash(class, raw),
            text,
        };
    }

    /// Write `requested` into the provider and snapshot what it stored.
    ///
    /// The terminator delta is derived by diffing the stored text against
    /// the request, so it is computed exactly once per mutation.
    pub fn establish<S: TextSource + ?Sized>(source: &mut S, requested: &str) -> Result<DocumentSession> {
        let class = source.provider_class();
        let actual = expect_success("SetDocumentText", &format!("{requested:?}"), source.set_document_text(requested))?;
        let delta = normalize::derive_delta(requested, &actual, class)?;
        tracing::debug!(%class, delta = delta.get(), len = requested.chars().count(), "session established");
        return Ok(DocumentSession::from_raw(&actual, class, delta));
    }

    /// Snapshot the provider's current text without writing to it.
    pub fn snapshot<S: TextSource + ?Sized>(source: &S) -> Result<DocumentSession> {
        let class = source.provider_class();
        let raw = expect_success("GetDocumentText", "", source.get_document_text())?;
        let delta = normalize::normalize(&raw, class);
        return Ok(DocumentSession::from_raw(&raw, class, delta));
    }

    pub fn class(&self) -> ProviderClass {
        return self.class;
    }

    /// The normalized text.
    pub fn text(&self) -> &str {
        return &self.text;
    }

    /// Normalized length in characters.
    pub fn len(&self) -> usize {
        return self.len;
    }

    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }

    /// Raw length in characters, terminator included.
    pub fn raw_len(&self) -> usize {
        return self.raw_len;
    }

    pub fn normalizer(&self) -> Normalizer {
        return self.normalizer;
    }

    pub fn delta(&self) -> TerminatorDelta {
        return self.normalizer.delta();
    }

    pub fn raw_hash(&self) -> ContentHash {
        return self.raw_hash;
    }

    /// The whole-document range `{0, len}`.
    pub fn document(&self) -> Range {
        return Range::degenerate(0).with_endpoint(crate::unit::Endpoint::End, self.len);
    }

    /// Reject ranges that do not fit in this document.
    pub fn check_range(&self, range: &Range) -> Result<Range> {
        return Range::within(range.start(), range.end(), self.len);
    }

    /// The normalized text covered by `range`.
    pub fn slice(&self, range: &Range) -> String {
        return range.slice(&self.text);
    }

    /// Check the provider's document range and its full text length.
    ///
    /// The document range must be `{0, len}` in the normalized domain, and the
    /// raw text it returns must be exactly `delta` characters longer.
    pub fn verify_document_range<P: RangeProvider + ?Sized>(&self, provider: &P) -> Result<()> {
        let range = expect_success("DocumentRange", "", provider.document_range())?;
        if range != self.document() {
            return Err(Error::verification(Failure::new(
                "DocumentRange",
                "",
                format!("range {}", self.document()),
                format!("range {range}"),
            )));
        }

        let raw = expect_success("GetText", "-1", provider.text(&range, None))?;
        self.normalizer.verify_len("GetText", self.len, raw.chars().count())?;
        return Ok(());
    }
}

/// Memoized sessions keyed by the hash of (provider class, requested text).
///
/// A cached session is reused without rewriting the provider only when the
/// provider's current raw text still hashes to the cached one.
#[derive(Debug)]
pub struct SessionCache {
    capacity: usize,
    sessions: FxHashMap<ContentHash, DocumentSession>,
    order: Vec<ContentHash>,
}

impl SessionCache {
    pub fn new(capacity: usize) -> SessionCache {
        return SessionCache {
            capacity: capacity.max(1),
            sessions: FxHashMap::default(),
            order: Vec::new(),
        };
    }

    pub fn len(&self) -> usize {
        return self.sessions.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.sessions.is_empty();
    }

    /// Like [`DocumentSession::establish`], skipping the write when the
    /// provider already holds the requested text.
    pub fn establish<S: TextSource + ?Sized>(&mut self, source: &mut S, requested: &str) -> Result<DocumentSession> {
        let key = content_hash(source.provider_class(), requested);

        if let Some(cached) = self.sessions.get(&key) {
            let current = expect_success("GetDocumentText", "", source.get_document_text())?;
            if content_hash(cached.class(), &current) == cached.raw_hash() {
                tracing::debug!("session cache hit");
                return Ok(cached.clone());
            }
        }

        tracing::debug!("session cache miss");
        let session = DocumentSession::establish(source, requested)?;
        if !self.sessions.contains_key(&key) {
            if self.order.len() >= self.capacity {
                let oldest = self.order.remove(0);
                self.sessions.remove(&oldest);
            }
            self.order.push(key);
        }
        self.sessions.insert(key, session.clone());
        return Ok(session);
    }
}
