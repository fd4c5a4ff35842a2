//! The text attribute support matrix.
//!
//! A fixed, process-wide table records, for every text attribute, which
//! provider classes support it and whether its value is an enumeration. The
//! table is a `const` and is never mutated, so it can be read from any
//! thread without synchronization.
//!
//! When an observed count or value disagrees with the table, either the table
//! is out of date or the provider is non-conformant. Both are reported; the
//! two are never reconciled silently.

use std::fmt;

use serde::Serialize;

use crate::error::Error;
use crate::error::Failure;
use crate::error::Result;
use crate::normalize::ProviderClass;
use crate::provider::HandleId;

/// A text attribute key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AttributeId {
    AnimationStyle,
    BackgroundColor,
    BulletStyle,
    CapStyle,
    Culture,
    FontName,
    FontSize,
    FontWeight,
    ForegroundColor,
    HorizontalTextAlignment,
    IndentationFirstLine,
    IndentationLeading,
    IndentationTrailing,
    IsHidden,
    IsItalic,
    IsReadOnly,
    IsSubscript,
    IsSuperscript,
    MarginBottom,
    MarginLeading,
    MarginTop,
    MarginTrailing,
    OutlineStyles,
    OverlineColor,
    OverlineStyle,
    StrikethroughColor,
    StrikethroughStyle,
    Tabs,
    TextFlowDirections,
    UnderlineColor,
    UnderlineStyle,
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{self:?}Attribute");
    }
}

/// The shape of a concrete attribute value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Color,
    Text,
    Enum,
    FloatArray,
    Handle,
}

/// The value of an attribute over a range.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// 0xRRGGBB.
    Color(u32),
    Text(String),
    /// The numeric value of an enumerated attribute.
    Enum(i32),
    /// Tab stops and other list-valued attributes.
    FloatArray(Vec<f64>),
    /// An opaque object value, compared by identity only.
    Handle(HandleId),
    /// The value is not uniform across the queried range.
    Mixed,
    /// The provider does not support this attribute.
    NotSupported,
}

impl AttributeValue {
    pub fn is_mixed(&self) -> bool {
        return matches!(self, AttributeValue::Mixed);
    }

    pub fn is_not_supported(&self) -> bool {
        return matches!(self, AttributeValue::NotSupported);
    }

    /// True for any value that is neither sentinel.
    pub fn is_concrete(&self) -> bool {
        return !self.is_mixed() && !self.is_not_supported();
    }

    /// The shape of a concrete value; `None` for the sentinels.
    pub fn value_type(&self) -> Option<ValueType> {
        return match self {
            AttributeValue::Bool(_) => Some(ValueType::Bool),
            AttributeValue::Int(_) => Some(ValueType::Int),
            AttributeValue::Float(_) => Some(ValueType::Float),
            AttributeValue::Color(_) => Some(ValueType::Color),
            AttributeValue::Text(_) => Some(ValueType::Text),
            AttributeValue::Enum(_) => Some(ValueType::Enum),
            AttributeValue::FloatArray(_) => Some(ValueType::FloatArray),
            AttributeValue::Handle(_) => Some(ValueType::Handle),
            AttributeValue::Mixed | AttributeValue::NotSupported => None,
        };
    }

    /// True for an array value with no elements.
    pub fn is_empty_array(&self) -> bool {
        return matches!(self, AttributeValue::FloatArray(values) if values.is_empty());
    }
}

/// One row of the support matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AttributeEntry {
    pub key: AttributeId,
    pub plain_edit: bool,
    pub rich_edit: bool,
    pub is_enum: bool,
    pub value_type: ValueType,
}

impl AttributeEntry {
    const fn new(key: AttributeId, plain_edit: bool, rich_edit: bool, value_type: ValueType) -> AttributeEntry {
        return AttributeEntry {
            key,
            plain_edit,
            rich_edit,
            is_enum: matches!(value_type, ValueType::Enum),
            value_type,
        };
    }

    /// Whether `class` supports this attribute.
    pub fn supported_by(&self, class: ProviderClass) -> bool {
        return match class {
            ProviderClass::PlainEdit => self.plain_edit,
            ProviderClass::RichEdit => self.rich_edit,
        };
    }

    /// Whether values of this attribute are lists.
    pub fn is_array(&self) -> bool {
        return self.value_type == ValueType::FloatArray;
    }
}

use AttributeId as A;
use ValueType as V;

/// The support matrix, ordered by [`AttributeId`].
pub const CATALOG: [AttributeEntry; 31] = [
    AttributeEntry::new(A::AnimationStyle, false, false, V::Enum),
    AttributeEntry::new(A::BackgroundColor, true, true, V::Color),
    AttributeEntry::new(A::BulletStyle, false, true, V::Enum),
    AttributeEntry::new(A::CapStyle, false, true, V::Enum),
    AttributeEntry::new(A::Culture, true, true, V::Int),
    AttributeEntry::new(A::FontName, true, true, V::Text),
    AttributeEntry::new(A::FontSize, true, true, V::Float),
    AttributeEntry::new(A::FontWeight, true, true, V::Int),
    AttributeEntry::new(A::ForegroundColor, true, true, V::Color),
    AttributeEntry::new(A::HorizontalTextAlignment, true, true, V::Enum),
    AttributeEntry::new(A::IndentationFirstLine, false, true, V::Float),
    AttributeEntry::new(A::IndentationLeading, false, true, V::Float),
    AttributeEntry::new(A::IndentationTrailing, false, true, V::Float),
    AttributeEntry::new(A::IsHidden, false, true, V::Bool),
    AttributeEntry::new(A::IsItalic, true, true, V::Bool),
    AttributeEntry::new(A::IsReadOnly, true, true, V::Bool),
    AttributeEntry::new(A::IsSubscript, false, true, V::Bool),
    AttributeEntry::new(A::IsSuperscript, false, true, V::Bool),
    AttributeEntry::new(A::MarginBottom, false, true, V::Float),
    AttributeEntry::new(A::MarginLeading, false, true, V::Float),
    AttributeEntry::new(A::MarginTop, false, true, V::Float),
    AttributeEntry::new(A::MarginTrailing, false, true, V::Float),
    AttributeEntry::new(A::OutlineStyles, false, true, V::Enum),
    AttributeEntry::new(A::OverlineColor, false, false, V::Color),
    AttributeEntry::new(A::OverlineStyle, false, false, V::Enum),
    AttributeEntry::new(A::StrikethroughColor, false, false, V::Color),
    AttributeEntry::new(A::StrikethroughStyle, true, true, V::Enum),
    AttributeEntry::new(A::Tabs, false, true, V::FloatArray),
    AttributeEntry::new(A::TextFlowDirections, false, false, V::Enum),
    AttributeEntry::new(A::UnderlineColor, false, true, V::Color),
    AttributeEntry::new(A::UnderlineStyle, true, true, V::Enum),
];

/// Look up the catalog row for `key`.
pub fn entry(key: AttributeId) -> &'static AttributeEntry {
    return &CATALOG[key as usize];
}

/// Which attributes to count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CountFilter {
    /// Attributes the class supports.
    Supported,
    /// Attributes the class does not support.
    Unsupported,
    /// Enumerated attributes the class supports.
    EnumOnly,
}

/// How many catalog attributes pass `filter` for `class`.
pub fn expected_count(class: ProviderClass, filter: CountFilter) -> usize {
    return CATALOG
        .iter()
        .filter(|e| match filter {
            CountFilter::Supported => e.supported_by(class),
            CountFilter::Unsupported => !e.supported_by(class),
            CountFilter::EnumOnly => e.supported_by(class) && e.is_enum,
        })
        .count();
}

/// Check an observed attribute count against the catalog.
pub fn verify_count(class: ProviderClass, filter: CountFilter, observed: usize) -> Result<()> {
    let expected = expected_count(class, filter);
    if expected != observed {
        return Err(Error::verification(Failure::new(
            "AttributeCount",
            format!("{class}, {filter:?}"),
            format!("{expected} (reference table)"),
            format!("{observed} (reference table out of date or provider non-conformant)"),
        )));
    }
    return Ok(());
}

/// Check a value returned by `GetAttributeValue` against the catalog.
///
/// Unsupported attributes must report `NotSupported`; supported ones must
/// not, and concrete values must have the catalogued shape.
pub fn verify_value(key: AttributeId, class: ProviderClass, observed: &AttributeValue) -> Result<()> {
    let entry = entry(key);
    let requested = format!("{key}, {class}");

    if !entry.supported_by(class) {
        if observed.is_not_supported() {
            return Ok(());
        }
        return Err(Error::verification(Failure::new(
            "GetAttributeValue",
            requested,
            "NotSupported",
            format!("{observed:?}"),
        )));
    }

    if observed.is_not_supported() {
        return Err(Error::verification(Failure::new(
            "GetAttributeValue",
            requested,
            format!("a {:?} value", entry.value_type),
            "NotSupported",
        )));
    }

    if let Some(value_type) = observed.value_type() {
        if value_type != entry.value_type {
            return Err(Error::verification(Failure::new(
                "GetAttributeValue",
                requested,
                format!("a {:?} value", entry.value_type),
                format!("{observed:?}"),
            )));
        }
    }
    return Ok(());
}

/// A mixed value over a multi-character range must become concrete once the
/// range is shrunk to a single character.
///
/// Failure is reported as a conformance violation and is not retried.
pub fn verify_mixed_resolution(key: AttributeId, range_value: &AttributeValue, single_value: &AttributeValue) -> Result<()> {
    if !range_value.is_mixed() {
        return Ok(());
    }
    if single_value.is_mixed() {
        return Err(Error::verification(Failure::new(
            "GetAttributeValue",
            format!("{key} on a single character"),
            "a concrete value",
            "MixedValue",
        )));
    }
    return Ok(());
}
