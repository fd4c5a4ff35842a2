//! Equality checks over ranges, text, attributes and element handles.
//!
//! Element handles and handle-valued attributes are compared by identity
//! only. Nothing here looks inside what a provider hands back beyond the
//! handle value itself.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::attribute::AttributeId;
use crate::attribute::AttributeValue;
use crate::attribute::CATALOG;
use crate::error::Error;
use crate::error::Failure;
use crate::error::Result;
use crate::outcome::expect_success;
use crate::provider::ElementView;
use crate::provider::HandleId;
use crate::provider::RangeProvider;
use crate::provider::SelectionOps;
use crate::provider::TextSource;
use crate::range::Range;
use crate::range::compare_endpoints;
use crate::range::sign;
use crate::session::DocumentSession;
use crate::session::content_hash;
use crate::unit::Endpoint;

/// Attribute values keyed by attribute, as read from one range.
pub type AttributeMap = FxHashMap<AttributeId, AttributeValue>;

/// Order two ranges. `Equal` exactly when both endpoints coincide.
pub fn compare_ranges(a: &Range, b: &Range) -> Ordering {
    return a.start().cmp(&b.start()).then(a.end().cmp(&b.end()));
}

fn strip_terminators(text: &str) -> &str {
    return text.trim_end_matches(['\r', '\n']);
}

/// Compare two texts after stripping trailing line terminators from both.
///
/// With `allow_substring`, either text containing the other is a match.
pub fn matches_text(actual: &str, expected: &str, allow_substring: bool) -> bool {
    let actual = strip_terminators(actual);
    let expected = strip_terminators(expected);
    if allow_substring {
        return actual.contains(expected) || expected.contains(actual);
    }
    return actual == expected;
}

/// Same keys, same values. Handle values compare by identity.
pub fn matches_attribute_dictionaries(actual: &AttributeMap, expected: &AttributeMap) -> bool {
    return actual == expected;
}

/// Same handles, in any order.
pub fn matches_child_sets(actual: &[HandleId], expected: &[HandleId]) -> bool {
    let mut a: SmallVec<[HandleId; 8]> = actual.iter().copied().collect();
    let mut b: SmallVec<[HandleId; 8]> = expected.iter().copied().collect();
    a.sort_unstable();
    b.sort_unstable();
    return a == b;
}

pub fn matches_enclosing_element(actual: HandleId, expected: HandleId) -> bool {
    return actual == expected;
}

fn mismatch(operation: &str, requested: impl Into<String>, expected: impl Into<String>, observed: impl Into<String>) -> Error {
    return Error::verification(Failure::new(operation, requested, expected, observed));
}

/// The provider must agree with the pure endpoint comparison.
pub fn verify_compare_endpoints<P: RangeProvider + ?Sized>(
    provider: &P,
    a: &Range,
    endpoint_a: Endpoint,
    b: &Range,
    endpoint_b: Endpoint,
) -> Result<i32> {
    let requested = format!("{a}, {endpoint_a}, {b}, {endpoint_b}");
    let expected = sign(compare_endpoints(a, endpoint_a, b, endpoint_b));
    let observed = expect_success("CompareEndpoints", &requested, provider.compare_endpoints(a, endpoint_a, b, endpoint_b))?;
    if observed.signum() != expected {
        return Err(mismatch("CompareEndpoints", requested, expected.to_string(), observed.to_string()));
    }
    return Ok(observed);
}

/// A clone must compare equal to its source on both endpoints.
pub fn verify_clone<P: RangeProvider + ?Sized>(provider: &P, source: &Range, clone: &Range) -> Result<()> {
    if compare_ranges(source, clone) != Ordering::Equal {
        return Err(mismatch("Clone", source.to_string(), format!("range {source}"), format!("range {clone}")));
    }
    for endpoint in [Endpoint::Start, Endpoint::End] {
        verify_compare_endpoints(provider, source, endpoint, clone, endpoint)?;
    }
    return Ok(());
}

/// The provider's text for `range` must match the session's snapshot.
pub fn verify_text<P: RangeProvider + ?Sized>(
    provider: &P,
    session: &DocumentSession,
    range: &Range,
    max_len: Option<usize>,
    allow_substring: bool,
) -> Result<String> {
    let range = session.check_range(range)?;
    let mut expected = session.slice(&range);
    if let Some(max) = max_len {
        expected = expected.chars().take(max).collect();
    }
    let requested = format!("{range}, {}", max_len.map_or(-1, |m| m as i64));
    let observed = expect_success("GetText", &requested, provider.text(&range, max_len))?;
    if !matches_text(&observed, &expected, allow_substring) {
        return Err(mismatch("GetText", requested, format!("{expected:?}"), format!("{observed:?}")));
    }
    return Ok(observed);
}

/// Read every catalog attribute over `range`.
pub fn collect_attributes<P: RangeProvider + ?Sized>(provider: &P, range: &Range) -> Result<AttributeMap> {
    let mut map = AttributeMap::default();
    for entry in &CATALOG {
        let value = expect_success("GetAttributeValue", &format!("{range}, {}", entry.key), provider.attribute_value(range, entry.key))?;
        map.insert(entry.key, value);
    }
    return Ok(map);
}

/// Two ranges must report identical attribute dictionaries.
pub fn verify_same_attributes<P: RangeProvider + ?Sized>(provider: &P, a: &Range, b: &Range) -> Result<()> {
    let left = collect_attributes(provider, a)?;
    let right = collect_attributes(provider, b)?;
    if !matches_attribute_dictionaries(&left, &right) {
        let differing: Vec<String> = CATALOG
            .iter()
            .filter(|e| left.get(&e.key) != right.get(&e.key))
            .map(|e| e.key.to_string())
            .collect();
        return Err(mismatch("GetAttributeValue", format!("{a} vs {b}"), "identical attributes", differing.join(", ")));
    }
    return Ok(());
}

pub fn verify_children<V: ElementView + ?Sized>(view: &V, range: &Range, expected: &[HandleId]) -> Result<()> {
    let observed = expect_success("GetChildren", &range.to_string(), view.children(range))?;
    if !matches_child_sets(&observed, expected) {
        return Err(mismatch("GetChildren", range.to_string(), format!("{expected:?}"), format!("{observed:?}")));
    }
    return Ok(());
}

pub fn verify_enclosing_element<V: ElementView + ?Sized>(view: &V, range: &Range, expected: HandleId) -> Result<()> {
    let observed = expect_success("GetEnclosingElement", &range.to_string(), view.enclosing_element(range))?;
    if !matches_enclosing_element(observed, expected) {
        return Err(mismatch("GetEnclosingElement", range.to_string(), format!("{expected:?}"), format!("{observed:?}")));
    }
    return Ok(());
}

/// Degenerate ranges have no rectangles; other ranges have only non-empty
/// ones.
pub fn verify_bounding_rectangles<V: ElementView + ?Sized>(view: &V, range: &Range) -> Result<usize> {
    let rects = expect_success("GetBoundingRectangles", &range.to_string(), view.bounding_rectangles(range))?;
    if range.is_degenerate() && !rects.is_empty() {
        return Err(mismatch("GetBoundingRectangles", range.to_string(), "no rectangles", format!("{} rectangles", rects.len())));
    }
    if rects.iter().any(|r| r.is_empty()) {
        return Err(mismatch("GetBoundingRectangles", range.to_string(), "non-empty rectangles", format!("{rects:?}")));
    }
    return Ok(rects.len());
}

fn document_unchanged<S: TextSource + ?Sized>(source: &S, session: &DocumentSession, operation: &str, requested: &str) -> Result<()> {
    let raw = expect_success("GetDocumentText", "", source.get_document_text())?;
    if content_hash(session.class(), &raw) != session.raw_hash() {
        return Err(mismatch(operation, requested, "document text unchanged", format!("{raw:?}")));
    }
    return Ok(());
}

/// Selecting `range` makes it the only selection and leaves the text alone.
pub fn verify_select<P>(provider: &mut P, session: &DocumentSession, range: &Range) -> Result<()>
where
    P: SelectionOps + TextSource + ?Sized,
{
    let requested = range.to_string();
    expect_success("Select", &requested, provider.select(range))?;
    let selection = expect_success("GetSelection", "", provider.selection())?;
    if selection.as_slice() != [*range] {
        return Err(mismatch("Select", requested, format!("[{range}]"), format!("{selection:?}")));
    }
    return document_unchanged(provider, session, "Select", &requested);
}

/// Adding then removing `range` round-trips the selection.
pub fn verify_add_remove_selection<P>(provider: &mut P, session: &DocumentSession, range: &Range) -> Result<()>
where
    P: SelectionOps + TextSource + ?Sized,
{
    let requested = range.to_string();
    let before = expect_success("GetSelection", "", provider.selection())?;

    expect_success("AddToSelection", &requested, provider.add_to_selection(range))?;
    let added = expect_success("GetSelection", "", provider.selection())?;
    if !added.contains(range) {
        return Err(mismatch("AddToSelection", requested, format!("selection containing {range}"), format!("{added:?}")));
    }

    expect_success("RemoveFromSelection", &requested, provider.remove_from_selection(range))?;
    let removed = expect_success("GetSelection", "", provider.selection())?;
    if removed.contains(range) && !before.contains(range) {
        return Err(mismatch("RemoveFromSelection", requested, format!("selection without {range}"), format!("{removed:?}")));
    }
    return document_unchanged(provider, session, "RemoveFromSelection", &range.to_string());
}

/// Scrolling never changes the document.
pub fn verify_scroll_into_view<P>(provider: &mut P, session: &DocumentSession, range: &Range, align_top: bool) -> Result<()>
where
    P: SelectionOps + TextSource + ?Sized,
{
    let requested = format!("{range}, {align_top}");
    expect_success("ScrollIntoView", &requested, provider.scroll_into_view(range, align_top))?;
    return document_unchanged(provider, session, "ScrollIntoView", &requested);
}
