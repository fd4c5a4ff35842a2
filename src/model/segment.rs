//! Independent segmentation of a text into units.
//!
//! The model keeps, for every [`TextUnit`], the sorted list of unit
//! boundaries. Unit `i` spans `[bounds[i], bounds[i + 1])`. An empty text has
//! the single boundary `0` and no units at all.
//!
//! | Unit | Boundaries |
//! |------|------------|
//! | Character | every offset |
//! | Word | category changes, trailing blanks stay with the word before |
//! | Format | text start and end (plain text is one run) |
//! | Line, Paragraph | after `\r\n`, `\r` or `\n` |
//! | Page, Document | text start and end |

use smallvec::SmallVec;

use crate::provider::ProviderResult;
use crate::provider::UnitCounter;
use crate::range::Range;
use crate::unit::TextUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Whitespace,
    Eol,
    Word,
    Punctuation,
}

fn is_word(ch: char) -> bool {
    return ch.is_alphanumeric() || ch == '_';
}

fn categorize(ch: char) -> Category {
    if ch == '\n' || ch == '\r' {
        return Category::Eol;
    }
    if ch.is_whitespace() {
        return Category::Whitespace;
    }
    if is_word(ch) {
        return Category::Word;
    }
    return Category::Punctuation;
}

/// Boundaries of every unit for one text.
#[derive(Debug, Clone)]
pub struct UnitModel {
    len: usize,
    bounds: [Vec<usize>; 7],
}

impl UnitModel {
    pub fn new(text: &str) -> UnitModel {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let whole: Vec<usize> = if len == 0 { vec![0] } else { vec![0, len] };
        let lines = line_bounds(&chars);

        return UnitModel {
            len,
            bounds: [
                (0..=len).collect(),
                word_bounds(&chars),
                whole.clone(),
                lines.clone(),
                lines,
                whole.clone(),
                whole,
            ],
        };
    }

    /// Length of the modelled text in characters.
    pub fn len(&self) -> usize {
        return self.len;
    }

    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }

    /// Sorted unit boundaries, always starting with `0`.
    pub fn bounds(&self, unit: TextUnit) -> &[usize] {
        return &self.bounds[unit.index()];
    }

    /// Total number of units of this kind in the text.
    pub fn total(&self, unit: TextUnit) -> usize {
        return self.bounds(unit).len() - 1;
    }

    /// Number of units overlapping `range`. A degenerate range overlaps none.
    pub fn count_in(&self, range: &Range, unit: TextUnit) -> usize {
        if range.is_degenerate() {
            return 0;
        }
        let bounds = self.bounds(unit);
        // Units whose end is past range.start, minus units whose start is at
        // or past range.end.
        let ending_after = bounds.len() - bounds.partition_point(|&b| b <= range.start());
        let starting_at_or_after = bounds.len() - 1 - bounds[..bounds.len() - 1].partition_point(|&b| b < range.end());
        return ending_after.saturating_sub(starting_at_or_after);
    }

    /// Boundaries strictly after `offset`.
    pub fn bounds_after(&self, offset: usize, unit: TextUnit) -> &[usize] {
        let bounds = self.bounds(unit);
        let first = bounds.partition_point(|&b| b <= offset);
        return &bounds[first..];
    }

    /// Boundaries strictly before `offset`.
    pub fn bounds_before(&self, offset: usize, unit: TextUnit) -> &[usize] {
        let bounds = self.bounds(unit);
        let end = bounds.partition_point(|&b| b < offset);
        return &bounds[..end];
    }

    /// The boundary at or before `offset`.
    pub fn floor(&self, offset: usize, unit: TextUnit) -> usize {
        let bounds = self.bounds(unit);
        let index = bounds.partition_point(|&b| b <= offset);
        return bounds[index.saturating_sub(1)];
    }

    /// The boundary at or after `offset`, or the text end.
    pub fn ceil(&self, offset: usize, unit: TextUnit) -> usize {
        let bounds = self.bounds(unit);
        let index = bounds.partition_point(|&b| b < offset);
        return bounds.get(index).copied().unwrap_or(self.len);
    }

    /// The smallest unit-aligned range containing `range`.
    ///
    /// A degenerate range expands to the unit starting at its offset, or the
    /// last unit when it sits at the text end.
    pub fn enclosing(&self, range: &Range, unit: TextUnit) -> Range {
        if self.len == 0 {
            return Range::degenerate(0);
        }
        let (start, end) = if range.is_degenerate() {
            let offset = range.start().min(self.len - 1);
            let start = self.floor(offset, unit);
            (start, self.ceil(offset + 1, unit))
        } else {
            (self.floor(range.start(), unit), self.ceil(range.end(), unit))
        };
        return Range::degenerate(start).with_endpoint(crate::unit::Endpoint::End, end);
    }

    /// The unit starting at the boundary `start`.
    pub fn unit_at(&self, start: usize, unit: TextUnit) -> Range {
        let end = self.ceil(start + 1, unit);
        return Range::degenerate(start).with_endpoint(crate::unit::Endpoint::End, end.max(start));
    }
}

impl UnitCounter for UnitModel {
    fn count_units_in_range(&self, range: &Range, unit: TextUnit) -> ProviderResult<usize> {
        return Ok(self.count_in(range, unit));
    }
}

fn word_bounds(chars: &[char]) -> Vec<usize> {
    let mut bounds = vec![0];
    for i in 1..chars.len() {
        let prev = categorize(chars[i - 1]);
        let cur = categorize(chars[i]);
        let split = match (prev, cur) {
            (Category::Eol, Category::Eol) => !(chars[i - 1] == '\r' && chars[i] == '\n'),
            (Category::Eol, _) => true,
            (_, Category::Whitespace) => false,
            (a, b) => a != b,
        };
        if split {
            bounds.push(i);
        }
    }
    if !chars.is_empty() {
        bounds.push(chars.len());
    }
    return bounds;
}

fn line_bounds(chars: &[char]) -> Vec<usize> {
    let mut bounds: SmallVec<[usize; 8]> = SmallVec::new();
    bounds.push(0);
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        i += 1;
        if ch == '\r' && chars.get(i) == Some(&'\n') {
            i += 1;
        }
        if ch == '\r' || ch == '\n' {
            bounds.push(i);
        }
    }
    if bounds.last() != Some(&chars.len()) {
        bounds.push(chars.len());
    }
    return bounds.into_vec();
}
