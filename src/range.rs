//! Immutable character ranges over a document snapshot.
//!
//! A range is two character offsets `start <= end`, counted from the start of
//! the normalized document (trailing terminators removed, see
//! [`crate::normalize`]). Every operation that "moves" a range returns a new
//! value.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::error::Error;
use crate::error::Result;
use crate::unit::Endpoint;

/// A span `[start, end)` of character offsets.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Range {
    start: usize,
    end: usize,
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{{{},{}}}", self.start, self.end);
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{{{},{}}}", self.start, self.end);
    }
}

impl Range {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: usize, end: usize) -> Result<Range> {
        if start > end {
            return Err(Error::InvalidRange { start, end, len: end });
        }
        return Ok(Range { start, end });
    }

    /// Create a range that must also fit in a document of `len` characters.
    pub fn within(start: usize, end: usize, len: usize) -> Result<Range> {
        if start > end || end > len {
            return Err(Error::InvalidRange { start, end, len });
        }
        return Ok(Range { start, end });
    }

    /// An empty range at `offset`.
    pub fn degenerate(offset: usize) -> Range {
        return Range {
            start: offset,
            end: offset,
        };
    }

    #[inline]
    pub fn start(&self) -> usize {
        return self.start;
    }

    #[inline]
    pub fn end(&self) -> usize {
        return self.end;
    }

    /// The offset of the selected endpoint.
    #[inline]
    pub fn endpoint(&self, endpoint: Endpoint) -> usize {
        return match endpoint {
            Endpoint::Start => self.start,
            Endpoint::End => self.end,
        };
    }

    /// Number of characters spanned.
    #[inline]
    pub fn len(&self) -> usize {
        return self.end - self.start;
    }

    /// True when `start == end`.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        return self.start == self.end;
    }

    /// Move one endpoint to `offset`.
    ///
    /// Moving the start past the end drags the end along, and moving the end
    /// before the start drags the start along, so the result is always a
    /// valid range and becomes degenerate exactly when the endpoints cross
    /// or meet.
    pub fn with_endpoint(self, endpoint: Endpoint, offset: usize) -> Range {
        return match endpoint {
            Endpoint::Start => Range {
                start: offset,
                end: self.end.max(offset),
            },
            Endpoint::End => Range {
                start: self.start.min(offset),
                end: offset,
            },
        };
    }

    /// Collapse both endpoints onto the selected one.
    pub fn collapse(self, endpoint: Endpoint) -> Range {
        return Range::degenerate(self.endpoint(endpoint));
    }

    /// True when `other` lies entirely inside this range.
    pub fn contains(&self, other: &Range) -> bool {
        return self.start <= other.start && other.end <= self.end;
    }

    /// True when the two ranges share at least one character.
    pub fn overlaps(&self, other: &Range) -> bool {
        return self.start < other.end && other.start < self.end;
    }

    /// The characters of `text` covered by this range.
    ///
    /// Offsets past the end of `text` are clamped.
    pub fn slice(&self, text: &str) -> String {
        return text.chars().skip(self.start).take(self.len()).collect();
    }
}

/// Compare one endpoint of `a` with one endpoint of `b`.
pub fn compare_endpoints(a: &Range, endpoint_a: Endpoint, b: &Range, endpoint_b: Endpoint) -> Ordering {
    return a.endpoint(endpoint_a).cmp(&b.endpoint(endpoint_b));
}

/// Convert an ordering to the `-1 / 0 / +1` convention providers report.
pub fn sign(ordering: Ordering) -> i32 {
    return match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    };
}
