//! Predicting text and attribute search results.
//!
//! Text search is predicted by scanning the normalized document text on its
//! own, then classifying the found range against the document endpoints.
//! Occurrences that overlap hidden text are skipped.

use crate::attribute;
use crate::attribute::AttributeId;
use crate::attribute::AttributeValue;
use crate::error::Error;
use crate::error::Failure;
use crate::error::Result;
use crate::outcome::ExpectedOutcome;
use crate::outcome::MatchFlags;
use crate::outcome::classify;
use crate::outcome::expect_success;
use crate::outcome::verify_range_outcome;
use crate::provider::ProviderErrorKind;
use crate::provider::RangeProvider;
use crate::range::Range;
use crate::session::DocumentSession;

/// Where the model expects a search to land.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchPrediction {
    pub found: Option<Range>,
    pub flags: MatchFlags,
}

fn fold(ch: char, ignore_case: bool) -> char {
    if !ignore_case {
        return ch;
    }
    return ch.to_lowercase().next().unwrap_or(ch);
}

/// Classify a search result against the document endpoints.
pub fn classify_match(session: &DocumentSession, found: Option<Range>, hidden_excluded: bool) -> MatchFlags {
    let document = session.document();
    return match found {
        Some(range) => MatchFlags {
            matches_first: range.start() == document.start(),
            matches_last: range.end() == document.end(),
            empty: range.is_degenerate(),
            hidden_excluded,
        },
        None => MatchFlags {
            empty: true,
            hidden_excluded,
            ..MatchFlags::default()
        },
    };
}

/// Find `needle` inside `range` of the session text.
///
/// Forward searches return the first visible occurrence, backward searches
/// the last one.
pub fn locate(
    session: &DocumentSession,
    range: &Range,
    needle: &str,
    backward: bool,
    ignore_case: bool,
    hidden: &[Range],
) -> Result<SearchPrediction> {
    let range = session.check_range(range)?;
    let haystack: Vec<char> = session.slice(&range).chars().map(|c| fold(c, ignore_case)).collect();
    let needle: Vec<char> = needle.chars().map(|c| fold(c, ignore_case)).collect();

    let mut hits = Vec::new();
    let mut hidden_excluded = false;
    if !needle.is_empty() && needle.len() <= haystack.len() {
        for (i, window) in haystack.windows(needle.len()).enumerate() {
            if window != needle.as_slice() {
                continue;
            }
            let start = range.start() + i;
            let hit = Range::within(start, start + needle.len(), session.len())?;
            if hidden.iter().any(|h| h.overlaps(&hit)) {
                hidden_excluded = true;
                continue;
            }
            hits.push(hit);
        }
    }

    let found = if backward { hits.last().copied() } else { hits.first().copied() };
    return Ok(SearchPrediction {
        found,
        flags: classify_match(session, found, hidden_excluded),
    });
}

/// The outcome of `FindText`: an empty needle is an invalid argument,
/// anything else is a classified match.
pub fn expected_find_text(
    session: &DocumentSession,
    range: &Range,
    needle: &str,
    backward: bool,
    ignore_case: bool,
    hidden: &[Range],
) -> Result<ExpectedOutcome> {
    if needle.is_empty() {
        return Ok(ExpectedOutcome::Exception(ProviderErrorKind::InvalidArgument));
    }
    let prediction = locate(session, range, needle, backward, ignore_case, hidden)?;
    return Ok(ExpectedOutcome::MatchResult(prediction.flags));
}

/// Run `FindText` and check the result.
///
/// Returns the observed flags, or `None` when the predicted error was
/// raised.
pub fn verify_find_text<P: RangeProvider + ?Sized>(
    provider: &P,
    session: &DocumentSession,
    range: &Range,
    needle: &str,
    backward: bool,
    ignore_case: bool,
    hidden: &[Range],
) -> Result<Option<MatchFlags>> {
    let request = format!("{range}, {needle:?}, backward={backward}, ignore_case={ignore_case}");
    let expected = expected_find_text(session, range, needle, backward, ignore_case, hidden)?;
    let observed = provider.find_text(range, needle, backward, ignore_case);

    if let ExpectedOutcome::Exception(kind) = expected {
        classify("FindText", &request, Some(kind), observed)?;
        return Ok(None);
    }

    let found = verify_range_outcome("FindText", &request, &expected, observed)?;
    let prediction = locate(session, range, needle, backward, ignore_case, hidden)?;
    if found != prediction.found {
        let show = |r: Option<Range>| r.map_or("null".to_string(), |r| format!("range {r}"));
        return Err(Error::verification(Failure::new(
            "FindText",
            request,
            show(prediction.found),
            show(found),
        )));
    }

    let flags = classify_match(session, found, prediction.flags.hidden_excluded);
    if flags != prediction.flags {
        return Err(Error::verification(Failure::new(
            "FindText",
            request,
            prediction.flags.to_string(),
            flags.to_string(),
        )));
    }
    tracing::debug!(%flags, "find text matched");
    return Ok(Some(flags));
}

/// The outcome of `FindAttribute` over `range`.
///
/// A value of the wrong shape is an invalid argument. An unsupported
/// attribute is never found. Otherwise the whole range is found exactly when
/// the document-wide value equals `value`. A mixed document value cannot be
/// predicted and makes the scenario unusable.
pub fn expected_find_attribute<P: RangeProvider + ?Sized>(
    provider: &P,
    session: &DocumentSession,
    range: &Range,
    key: AttributeId,
    value: &AttributeValue,
) -> Result<ExpectedOutcome> {
    let entry = attribute::entry(key);
    if value.value_type() != Some(entry.value_type) {
        return Ok(ExpectedOutcome::Exception(ProviderErrorKind::InvalidArgument));
    }
    if !entry.supported_by(session.class()) {
        return Ok(ExpectedOutcome::Null);
    }

    let document = session.document();
    let current = expect_success(
        "GetAttributeValue",
        &format!("{document}, {key}"),
        provider.attribute_value(&document, key),
    )?;
    if current.is_mixed() {
        return Err(Error::configuration(format!("{key} is mixed over the document")));
    }
    if current != *value {
        return Ok(ExpectedOutcome::Null);
    }
    if range.is_degenerate() {
        return Ok(ExpectedOutcome::EmptyRange);
    }
    return Ok(ExpectedOutcome::MatchingRange(*range));
}

/// Run `FindAttribute` and check the result.
///
/// Array-valued attributes get one allowance: searching for an empty array
/// may come back null even though the document holds that empty array.
pub fn verify_find_attribute<P: RangeProvider + ?Sized>(
    provider: &P,
    session: &DocumentSession,
    range: &Range,
    key: AttributeId,
    value: &AttributeValue,
    backward: bool,
) -> Result<Option<Range>> {
    let range = session.check_range(range)?;
    let request = format!("{range}, {key}, {value:?}, backward={backward}");
    let expected = expected_find_attribute(provider, session, &range, key, value)?;
    let observed = provider.find_attribute(&range, key, value, backward);

    let empty_array_miss = attribute::entry(key).is_array() && value.is_empty_array() && matches!(observed, Ok(None));
    if empty_array_miss && matches!(expected, ExpectedOutcome::MatchingRange(_) | ExpectedOutcome::EmptyRange) {
        tracing::debug!(%key, "empty array not found, accepted");
        return Ok(None);
    }

    return verify_range_outcome("FindAttribute", &request, &expected, observed);
}
