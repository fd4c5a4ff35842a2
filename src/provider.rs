//! Collaborator interfaces consumed by the oracles.
//!
//! The text-object provider under test is never modelled in full. Each trait
//! here is one narrow capability, and the oracles only ever take the traits
//! they need. Element handles are opaque: they are compared by identity
//! ([`HandleId`] equality) and never introspected.
//!
//! Offsets passed across these traits are in the normalized domain (see
//! [`crate::normalize`]); a provider-appended terminator only ever shows up in
//! returned *text*.

use serde::Serialize;
use thiserror::Error;

use crate::attribute::AttributeId;
use crate::attribute::AttributeValue;
use crate::normalize::ProviderClass;
use crate::range::Range;
use crate::unit::Endpoint;
use crate::unit::TextUnit;

/// An opaque element handle owned by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HandleId(pub u64);

/// A screen rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn is_empty(&self) -> bool {
        return self.width <= 0.0 || self.height <= 0.0;
    }
}

/// The kind of error a provider raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ProviderErrorKind {
    InvalidArgument,
    ArgumentOutOfRange,
    ArgumentNull,
    InvalidOperation,
    ElementNotAvailable,
    NotSupported,
    Other,
}

/// An error raised by the provider under test.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> ProviderError {
        return ProviderError {
            kind,
            message: message.into(),
        };
    }
}

/// Result of a provider call.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Reads and writes the whole document text.
pub trait TextSource {
    /// The provider class, which decides terminator quirks and attribute
    /// support.
    fn provider_class(&self) -> ProviderClass;

    /// The raw document text, including any provider-appended terminator.
    fn get_document_text(&self) -> ProviderResult<String>;

    /// Replace the document text and return what was actually stored.
    fn set_document_text(&mut self, sample: &str) -> ProviderResult<String>;
}

/// Counts units overlapping a range.
///
/// A degenerate range overlaps no unit. A range that starts or ends inside a
/// unit counts that unit.
pub trait UnitCounter {
    fn count_units_in_range(&self, range: &Range, unit: TextUnit) -> ProviderResult<usize>;
}

/// Geometry and element structure of a range.
pub trait ElementView {
    fn bounding_rectangles(&self, range: &Range) -> ProviderResult<Vec<Rect>>;
    fn children(&self, range: &Range) -> ProviderResult<Vec<HandleId>>;
    fn enclosing_element(&self, range: &Range) -> ProviderResult<HandleId>;
}

/// Side-effecting selection and scrolling operations.
pub trait SelectionOps {
    fn scroll_into_view(&mut self, range: &Range, align_top: bool) -> ProviderResult<()>;
    fn select(&mut self, range: &Range) -> ProviderResult<()>;
    fn add_to_selection(&mut self, range: &Range) -> ProviderResult<()>;
    fn remove_from_selection(&mut self, range: &Range) -> ProviderResult<()>;
    /// The currently selected ranges.
    fn selection(&self) -> ProviderResult<Vec<Range>>;
}

/// The range navigation surface whose behavior is being verified.
pub trait RangeProvider {
    /// The range spanning the whole document.
    fn document_range(&self) -> ProviderResult<Range>;

    /// Text covered by `range`, truncated to `max_len` characters if given.
    fn text(&self, range: &Range, max_len: Option<usize>) -> ProviderResult<String>;

    /// Compare two endpoints, reporting a negative, zero or positive number.
    fn compare_endpoints(&self, a: &Range, endpoint_a: Endpoint, b: &Range, endpoint_b: Endpoint) -> ProviderResult<i32>;

    /// Grow `range` to the boundaries of the unit containing it.
    fn expand_to_enclosing_unit(&self, range: &Range, unit: TextUnit) -> ProviderResult<Range>;

    /// Move the whole range by `count` units, returning the moved range and
    /// the number of units actually moved.
    fn move_by_unit(&self, range: &Range, unit: TextUnit, count: i32) -> ProviderResult<(Range, i32)>;

    /// Move one endpoint by `count` units.
    fn move_endpoint_by_unit(&self, range: &Range, endpoint: Endpoint, unit: TextUnit, count: i32) -> ProviderResult<(Range, i32)>;

    /// Move one endpoint onto an endpoint of `target`.
    fn move_endpoint_by_range(&self, range: &Range, endpoint: Endpoint, target: &Range, target_endpoint: Endpoint) -> ProviderResult<Range>;

    /// Search `range` for `needle`.
    fn find_text(&self, range: &Range, needle: &str, backward: bool, ignore_case: bool) -> ProviderResult<Option<Range>>;

    /// Search `range` for the first run whose `key` attribute equals `value`.
    fn find_attribute(&self, range: &Range, key: AttributeId, value: &AttributeValue, backward: bool) -> ProviderResult<Option<Range>>;

    /// The value of `key` over `range`.
    fn attribute_value(&self, range: &Range, key: AttributeId) -> ProviderResult<AttributeValue>;

    /// Ranges currently visible on screen.
    fn visible_ranges(&self) -> ProviderResult<Vec<Range>>;
}
