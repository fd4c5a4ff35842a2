//! The in-memory reference provider.

use rustc_hash::FxHashMap;

use crate::attribute;
use crate::attribute::AttributeId;
use crate::attribute::AttributeValue;
use crate::attribute::ValueType;
use crate::normalize::ProviderClass;
use crate::provider::ElementView;
use crate::provider::HandleId;
use crate::provider::ProviderError;
use crate::provider::ProviderErrorKind;
use crate::provider::ProviderResult;
use crate::provider::RangeProvider;
use crate::provider::Rect;
use crate::provider::SelectionOps;
use crate::provider::TextSource;
use crate::provider::UnitCounter;
use crate::range::Range;
use crate::range::compare_endpoints;
use crate::range::sign;
use crate::unit::Endpoint;
use crate::unit::TextUnit;

use super::segment::UnitModel;

/// Handle of the document element itself.
pub const DOCUMENT_HANDLE: HandleId = HandleId(1);

const CHAR_WIDTH: f64 = 8.0;
const LINE_HEIGHT: f64 = 16.0;

/// A conformant in-memory text provider.
///
/// Text is stored normalized. A rich-edit provider appends `"\r\n"` when text
/// is written, and that terminator only shows up in returned text: in
/// [`TextSource::get_document_text`] and in [`RangeProvider::text`] for
/// ranges reaching the document end.
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    class: ProviderClass,
    text: String,
    chars: Vec<char>,
    model: UnitModel,
    hidden: Vec<Range>,
    visible: Option<Vec<Range>>,
    attributes: FxHashMap<AttributeId, AttributeValue>,
    embedded: Vec<(Range, HandleId)>,
    next_handle: u64,
    selection: Vec<Range>,
    scrolled: Option<(Range, bool)>,
    writes: usize,
}

impl MemoryProvider {
    pub fn new(class: ProviderClass) -> MemoryProvider {
        return MemoryProvider {
            class,
            text: String::new(),
            chars: Vec::new(),
            model: UnitModel::new(""),
            hidden: Vec::new(),
            visible: None,
            attributes: FxHashMap::default(),
            embedded: Vec::new(),
            next_handle: DOCUMENT_HANDLE.0 + 1,
            selection: Vec::new(),
            scrolled: None,
            writes: 0,
        };
    }

    /// A provider already holding `text`.
    pub fn with_text(class: ProviderClass, text: &str) -> MemoryProvider {
        let mut provider = MemoryProvider::new(class);
        provider.store(text);
        return provider;
    }

    fn store(&mut self, text: &str) {
        self.text = text.to_string();
        self.chars = text.chars().collect();
        self.model = UnitModel::new(text);
        self.hidden.clear();
        self.visible = None;
        self.embedded.clear();
        self.selection.clear();
        self.scrolled = None;
        self.writes += 1;
    }

    /// Normalized length in characters.
    pub fn len(&self) -> usize {
        return self.chars.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.chars.is_empty();
    }

    /// Number of times the document text has been written.
    pub fn write_count(&self) -> usize {
        return self.writes;
    }

    pub fn model(&self) -> &UnitModel {
        return &self.model;
    }

    /// Mark `range` as hidden text.
    pub fn hide(&mut self, range: Range) {
        self.hidden.push(range);
    }

    pub fn hidden(&self) -> &[Range] {
        return &self.hidden;
    }

    /// Override the visible ranges. By default everything not hidden is
    /// visible.
    pub fn set_visible(&mut self, ranges: Vec<Range>) {
        self.visible = Some(ranges);
    }

    /// Override the document-wide value of an attribute.
    pub fn set_attribute(&mut self, key: AttributeId, value: AttributeValue) {
        self.attributes.insert(key, value);
    }

    /// Embed a child element covering `range` and return its handle.
    pub fn embed(&mut self, range: Range) -> HandleId {
        let handle = HandleId(self.next_handle);
        self.next_handle += 1;
        self.embedded.push((range, handle));
        return handle;
    }

    /// The last range scrolled into view, with its alignment.
    pub fn last_scroll(&self) -> Option<(Range, bool)> {
        return self.scrolled;
    }

    fn check(&self, range: &Range) -> ProviderResult<()> {
        if range.end() > self.len() {
            return Err(ProviderError::new(
                ProviderErrorKind::ArgumentOutOfRange,
                format!("range {range} is outside a document of {} characters", self.len()),
            ));
        }
        return Ok(());
    }

    fn is_hidden_at(&self, offset: usize) -> bool {
        return self.hidden.iter().any(|h| h.start() <= offset && offset < h.end());
    }

    fn uniform_value(&self, key: AttributeId) -> AttributeValue {
        if let Some(value) = self.attributes.get(&key) {
            return value.clone();
        }
        let entry = attribute::entry(key);
        return match (key, entry.value_type) {
            (AttributeId::BackgroundColor, _) => AttributeValue::Color(0xFF_FF_FF),
            (AttributeId::Culture, _) => AttributeValue::Int(1033),
            (AttributeId::FontWeight, _) => AttributeValue::Int(400),
            (AttributeId::FontName, _) => AttributeValue::Text("Courier New".to_string()),
            (AttributeId::FontSize, _) => AttributeValue::Float(10.0),
            (AttributeId::Tabs, _) => AttributeValue::FloatArray(vec![36.0, 72.0]),
            (_, ValueType::Bool) => AttributeValue::Bool(false),
            (_, ValueType::Int) => AttributeValue::Int(0),
            (_, ValueType::Float) => AttributeValue::Float(0.0),
            (_, ValueType::Color) => AttributeValue::Color(0),
            (_, ValueType::Text) => AttributeValue::Text(String::new()),
            (_, ValueType::Enum) => AttributeValue::Enum(0),
            (_, ValueType::FloatArray) => AttributeValue::FloatArray(Vec::new()),
            (_, ValueType::Handle) => AttributeValue::Handle(DOCUMENT_HANDLE),
        };
    }

    /// Maximal runs of `range` with a single value of `key`.
    fn runs(&self, range: &Range, key: AttributeId) -> Vec<(Range, AttributeValue)> {
        if key != AttributeId::IsHidden || self.attributes.contains_key(&key) {
            return vec![(*range, self.uniform_value(key))];
        }
        if range.is_degenerate() {
            return vec![(*range, AttributeValue::Bool(self.is_hidden_at(range.start())))];
        }

        let mut runs = Vec::new();
        let mut run_start = range.start();
        for offset in range.start() + 1..=range.end() {
            let boundary = offset == range.end() || self.is_hidden_at(offset) != self.is_hidden_at(run_start);
            if boundary {
                let run = Range::degenerate(run_start).with_endpoint(Endpoint::End, offset);
                runs.push((run, AttributeValue::Bool(self.is_hidden_at(run_start))));
                run_start = offset;
            }
        }
        return runs;
    }

    fn matches_at(&self, at: usize, needle: &[char], ignore_case: bool) -> bool {
        let fold = |c: char| -> char {
            if ignore_case {
                return c.to_lowercase().next().unwrap_or(c);
            }
            return c;
        };
        return needle
            .iter()
            .zip(&self.chars[at..at + needle.len()])
            .all(|(&a, &b)| fold(a) == fold(b));
    }
}

impl TextSource for MemoryProvider {
    fn provider_class(&self) -> ProviderClass {
        return self.class;
    }

    fn get_document_text(&self) -> ProviderResult<String> {
        return Ok(format!("{}{}", self.text, self.class.appended_terminator()));
    }

    fn set_document_text(&mut self, sample: &str) -> ProviderResult<String> {
        self.store(sample);
        return self.get_document_text();
    }
}

impl UnitCounter for MemoryProvider {
    fn count_units_in_range(&self, range: &Range, unit: TextUnit) -> ProviderResult<usize> {
        self.check(range)?;
        return self.model.count_units_in_range(range, unit);
    }
}

impl ElementView for MemoryProvider {
    fn bounding_rectangles(&self, range: &Range) -> ProviderResult<Vec<Rect>> {
        self.check(range)?;
        if range.is_degenerate() {
            return Ok(Vec::new());
        }

        let lines = self.model.bounds(TextUnit::Line);
        let mut rects = Vec::new();
        for (row, pair) in lines.windows(2).enumerate() {
            let line = Range::degenerate(pair[0]).with_endpoint(Endpoint::End, pair[1]);
            if !line.overlaps(range) {
                continue;
            }
            let from = line.start().max(range.start());
            let to = line.end().min(range.end());
            rects.push(Rect {
                left: (from - line.start()) as f64 * CHAR_WIDTH,
                top: row as f64 * LINE_HEIGHT,
                width: (to - from) as f64 * CHAR_WIDTH,
                height: LINE_HEIGHT,
            });
        }
        return Ok(rects);
    }

    fn children(&self, range: &Range) -> ProviderResult<Vec<HandleId>> {
        self.check(range)?;
        let children = self
            .embedded
            .iter()
            .filter(|(span, _)| span.overlaps(range) || (range.is_degenerate() && span.start() <= range.start() && range.start() < span.end()))
            .map(|(_, handle)| *handle)
            .collect();
        return Ok(children);
    }

    fn enclosing_element(&self, range: &Range) -> ProviderResult<HandleId> {
        self.check(range)?;
        let inner = self
            .embedded
            .iter()
            .filter(|(span, _)| !range.is_degenerate() && span.contains(range))
            .min_by_key(|(span, _)| span.len());
        return Ok(match inner {
            Some((_, handle)) => *handle,
            None => DOCUMENT_HANDLE,
        });
    }
}

impl SelectionOps for MemoryProvider {
    fn scroll_into_view(&mut self, range: &Range, align_top: bool) -> ProviderResult<()> {
        self.check(range)?;
        self.scrolled = Some((*range, align_top));
        return Ok(());
    }

    fn select(&mut self, range: &Range) -> ProviderResult<()> {
        self.check(range)?;
        self.selection = vec![*range];
        return Ok(());
    }

    fn add_to_selection(&mut self, range: &Range) -> ProviderResult<()> {
        self.check(range)?;
        if !self.selection.contains(range) {
            self.selection.push(*range);
        }
        return Ok(());
    }

    fn remove_from_selection(&mut self, range: &Range) -> ProviderResult<()> {
        self.check(range)?;
        self.selection.retain(|selected| selected != range);
        return Ok(());
    }

    fn selection(&self) -> ProviderResult<Vec<Range>> {
        return Ok(self.selection.clone());
    }
}

impl RangeProvider for MemoryProvider {
    fn document_range(&self) -> ProviderResult<Range> {
        return Ok(Range::degenerate(0).with_endpoint(Endpoint::End, self.len()));
    }

    fn text(&self, range: &Range, max_len: Option<usize>) -> ProviderResult<String> {
        self.check(range)?;
        let mut text = range.slice(&self.text);
        if range.end() == self.len() {
            text.push_str(self.class.appended_terminator());
        }
        if let Some(max) = max_len {
            text = text.chars().take(max).collect();
        }
        return Ok(text);
    }

    fn compare_endpoints(&self, a: &Range, endpoint_a: Endpoint, b: &Range, endpoint_b: Endpoint) -> ProviderResult<i32> {
        self.check(a)?;
        self.check(b)?;
        return Ok(sign(compare_endpoints(a, endpoint_a, b, endpoint_b)));
    }

    fn expand_to_enclosing_unit(&self, range: &Range, unit: TextUnit) -> ProviderResult<Range> {
        self.check(range)?;
        return Ok(self.model.enclosing(range, unit));
    }

    fn move_by_unit(&self, range: &Range, unit: TextUnit, count: i32) -> ProviderResult<(Range, i32)> {
        self.check(range)?;
        if count == 0 {
            return Ok((*range, 0));
        }
        let want = count.unsigned_abs() as usize;

        if range.is_degenerate() {
            let (offset, moved) = step(&self.model, range.start(), unit, count);
            return Ok((Range::degenerate(offset), moved));
        }

        // A non-degenerate range moves as one unit whose start walks across
        // unit boundaries. The boundary at the document end is not a start.
        let targets = if count > 0 {
            let after = self.model.bounds_after(range.start(), unit);
            &after[..after.len().saturating_sub(1)]
        } else {
            self.model.bounds_before(range.start(), unit)
        };
        let moved = want.min(targets.len());
        if moved == 0 {
            return Ok((*range, 0));
        }
        let dest = if count > 0 { targets[moved - 1] } else { targets[targets.len() - moved] };
        let signed = moved as i32 * count.signum();
        return Ok((self.model.unit_at(dest, unit), signed));
    }

    fn move_endpoint_by_unit(&self, range: &Range, endpoint: Endpoint, unit: TextUnit, count: i32) -> ProviderResult<(Range, i32)> {
        self.check(range)?;
        let (offset, moved) = step(&self.model, range.endpoint(endpoint), unit, count);
        return Ok((range.with_endpoint(endpoint, offset), moved));
    }

    fn move_endpoint_by_range(&self, range: &Range, endpoint: Endpoint, target: &Range, target_endpoint: Endpoint) -> ProviderResult<Range> {
        self.check(range)?;
        self.check(target)?;
        return Ok(range.with_endpoint(endpoint, target.endpoint(target_endpoint)));
    }

    fn find_text(&self, range: &Range, needle: &str, backward: bool, ignore_case: bool) -> ProviderResult<Option<Range>> {
        self.check(range)?;
        if needle.is_empty() {
            return Err(ProviderError::new(ProviderErrorKind::InvalidArgument, "search text must not be empty"));
        }

        let needle: Vec<char> = needle.chars().collect();
        if needle.len() > range.len() {
            return Ok(None);
        }
        let last = range.end() - needle.len();
        let visible = |at: usize| -> bool {
            let found = Range::degenerate(at).with_endpoint(Endpoint::End, at + needle.len());
            return !self.hidden.iter().any(|h| h.overlaps(&found));
        };
        let hit = |at: &usize| self.matches_at(*at, &needle, ignore_case) && visible(*at);

        let found = if backward {
            (range.start()..=last).rev().find(hit)
        } else {
            (range.start()..=last).find(hit)
        };
        return Ok(found.map(|at| Range::degenerate(at).with_endpoint(Endpoint::End, at + needle.len())));
    }

    fn find_attribute(&self, range: &Range, key: AttributeId, value: &AttributeValue, backward: bool) -> ProviderResult<Option<Range>> {
        self.check(range)?;
        let entry = attribute::entry(key);
        if value.value_type() != Some(entry.value_type) {
            return Err(ProviderError::new(
                ProviderErrorKind::InvalidArgument,
                format!("{key} does not take a value of type {:?}", value.value_type()),
            ));
        }
        if !entry.supported_by(self.class) || value.is_empty_array() {
            return Ok(None);
        }
        let runs = self.runs(range, key);
        let mut matching = runs.into_iter().filter(|(_, v)| v == value).map(|(run, _)| run);
        let found = if backward { matching.last() } else { matching.next() };
        return Ok(found);
    }

    fn attribute_value(&self, range: &Range, key: AttributeId) -> ProviderResult<AttributeValue> {
        self.check(range)?;
        if !attribute::entry(key).supported_by(self.class) {
            return Ok(AttributeValue::NotSupported);
        }
        let runs = self.runs(range, key);
        if runs.len() > 1 {
            return Ok(AttributeValue::Mixed);
        }
        return Ok(runs.into_iter().next().map(|(_, v)| v).unwrap_or(AttributeValue::NotSupported));
    }

    fn visible_ranges(&self) -> ProviderResult<Vec<Range>> {
        if let Some(visible) = &self.visible {
            return Ok(visible.clone());
        }
        if self.is_empty() {
            return Ok(vec![Range::degenerate(0)]);
        }
        let whole = Range::degenerate(0).with_endpoint(Endpoint::End, self.len());
        let runs = self.runs(&whole, AttributeId::IsHidden);
        let visible = runs
            .into_iter()
            .filter(|(_, hidden)| *hidden == AttributeValue::Bool(false))
            .map(|(run, _)| run)
            .collect();
        return Ok(visible);
    }
}

/// Move an offset across `count` unit boundaries, stopping at the document
/// edge. Returns the new offset and the signed number of boundaries crossed.
fn step(model: &UnitModel, offset: usize, unit: TextUnit, count: i32) -> (usize, i32) {
    let want = count.unsigned_abs() as usize;
    if count > 0 {
        let after = model.bounds_after(offset, unit);
        let moved = want.min(after.len());
        let dest = if moved == 0 { offset } else { after[moved - 1] };
        return (dest, moved as i32);
    }
    if count < 0 {
        let before = model.bounds_before(offset, unit);
        let moved = want.min(before.len());
        let dest = if moved == 0 { offset } else { before[before.len() - moved] };
        return (dest, -(moved as i32));
    }
    return (offset, 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(start: usize, end: usize) -> Range {
        return Range::new(start, end).unwrap();
    }

    #[test]
    fn rich_edit_appends_terminator_only_to_text() {
        let mut provider = MemoryProvider::new(ProviderClass::RichEdit);
        let stored = provider.set_document_text("abc").unwrap();
        assert_eq!(stored, "abc\r\n");
        assert_eq!(provider.document_range().unwrap(), r(0, 3));
        assert_eq!(provider.text(&r(0, 3), None).unwrap(), "abc\r\n");
        assert_eq!(provider.text(&r(0, 2), None).unwrap(), "ab");
        assert_eq!(provider.text(&r(0, 3), Some(2)).unwrap(), "ab");
    }

    #[test]
    fn endpoint_moves_saturate() {
        let provider = MemoryProvider::with_text(ProviderClass::PlainEdit, "123456789");
        let (range, moved) = provider.move_endpoint_by_unit(&r(0, 0), Endpoint::End, TextUnit::Document, 1).unwrap();
        assert_eq!((range, moved), (r(0, 9), 1));
        let (range, moved) = provider.move_endpoint_by_unit(&range, Endpoint::End, TextUnit::Document, 1).unwrap();
        assert_eq!((range, moved), (r(0, 9), 0));
    }

    #[test]
    fn moving_a_range_keeps_one_unit() {
        let provider = MemoryProvider::with_text(ProviderClass::PlainEdit, "String 1 String 2");
        let (range, moved) = provider.move_by_unit(&r(2, 4), TextUnit::Word, 2).unwrap();
        assert_eq!((range, moved), (r(9, 16), 2));
        let (range, moved) = provider.move_by_unit(&range, TextUnit::Word, i32::MAX).unwrap();
        assert_eq!((range, moved), (r(16, 17), 1));
        let (range, moved) = provider.move_by_unit(&r(2, 4), TextUnit::Word, -5).unwrap();
        assert_eq!((range, moved), (r(0, 7), -1));
    }

    #[test]
    fn empty_needle_is_invalid() {
        let provider = MemoryProvider::with_text(ProviderClass::PlainEdit, "abc");
        let err = provider.find_text(&r(0, 3), "", false, false).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::InvalidArgument);
    }

    #[test]
    fn search_skips_hidden_text() {
        let mut provider = MemoryProvider::with_text(ProviderClass::PlainEdit, "ab ab ab");
        provider.hide(r(0, 2));
        assert_eq!(provider.find_text(&r(0, 8), "AB", false, true).unwrap(), Some(r(3, 5)));
        assert_eq!(provider.find_text(&r(0, 8), "ab", true, false).unwrap(), Some(r(6, 8)));
        assert_eq!(provider.find_text(&r(0, 8), "AB", false, false).unwrap(), None);
    }

    #[test]
    fn hidden_text_makes_is_hidden_mixed() {
        let mut provider = MemoryProvider::with_text(ProviderClass::RichEdit, "abcdef");
        provider.hide(r(2, 4));
        assert_eq!(provider.attribute_value(&r(0, 6), AttributeId::IsHidden).unwrap(), AttributeValue::Mixed);
        assert_eq!(provider.attribute_value(&r(2, 3), AttributeId::IsHidden).unwrap(), AttributeValue::Bool(true));
        assert_eq!(provider.visible_ranges().unwrap(), vec![r(0, 2), r(4, 6)]);
        assert_eq!(
            provider.find_attribute(&r(0, 6), AttributeId::IsHidden, &AttributeValue::Bool(true), false).unwrap(),
            Some(r(2, 4))
        );
    }

    #[test]
    fn unsupported_attributes() {
        let provider = MemoryProvider::with_text(ProviderClass::PlainEdit, "abc");
        assert_eq!(provider.attribute_value(&r(0, 3), AttributeId::Tabs).unwrap(), AttributeValue::NotSupported);
        assert_eq!(provider.find_attribute(&r(0, 3), AttributeId::Tabs, &AttributeValue::FloatArray(vec![]), false).unwrap(), None);
    }

    #[test]
    fn embedded_children_and_enclosing_element() {
        let mut provider = MemoryProvider::with_text(ProviderClass::RichEdit, "abc def ghi");
        let handle = provider.embed(r(4, 7));
        assert_eq!(provider.children(&r(0, 11)).unwrap(), vec![handle]);
        assert_eq!(provider.children(&r(0, 3)).unwrap(), Vec::<HandleId>::new());
        assert_eq!(provider.enclosing_element(&r(5, 6)).unwrap(), handle);
        assert_eq!(provider.enclosing_element(&r(0, 6)).unwrap(), DOCUMENT_HANDLE);
    }

    #[test]
    fn one_rectangle_per_line() {
        let provider = MemoryProvider::with_text(ProviderClass::PlainEdit, "ab\ncd\nef");
        let rects = provider.bounding_rectangles(&r(1, 7)).unwrap();
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[0].left, CHAR_WIDTH);
        assert_eq!(rects[2].top, 2.0 * LINE_HEIGHT);
        assert!(provider.bounding_rectangles(&r(1, 1)).unwrap().is_empty());
    }

    #[test]
    fn selection_tracks_adds_and_removes() {
        let mut provider = MemoryProvider::with_text(ProviderClass::PlainEdit, "abcdef");
        provider.select(&r(0, 1)).unwrap();
        provider.add_to_selection(&r(3, 4)).unwrap();
        provider.remove_from_selection(&r(0, 1)).unwrap();
        assert_eq!(provider.selection().unwrap(), vec![r(3, 4)]);
        provider.scroll_into_view(&r(3, 4), true).unwrap();
        assert_eq!(provider.last_scroll(), Some((r(3, 4), true)));
    }

    #[test]
    fn out_of_range_is_rejected() {
        let provider = MemoryProvider::with_text(ProviderClass::PlainEdit, "abc");
        let err = provider.text(&r(0, 4), None).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::ArgumentOutOfRange);
    }
}
