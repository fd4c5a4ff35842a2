//! Text units and range endpoints.
//!
//! Units are totally ordered from finest to coarsest granularity, so
//! `TextUnit::Character < TextUnit::Document`.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A granularity level that ranges can be measured, moved and expanded in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TextUnit {
    Character,
    Word,
    Format,
    Line,
    Paragraph,
    Page,
    Document,
}

impl TextUnit {
    /// Every unit, finest first.
    pub const ALL: [TextUnit; 7] = [
        TextUnit::Character,
        TextUnit::Word,
        TextUnit::Format,
        TextUnit::Line,
        TextUnit::Paragraph,
        TextUnit::Page,
        TextUnit::Document,
    ];

    /// Position of this unit in [`TextUnit::ALL`].
    pub fn index(self) -> usize {
        return self as usize;
    }

    pub fn name(self) -> &'static str {
        return match self {
            TextUnit::Character => "Character",
            TextUnit::Word => "Word",
            TextUnit::Format => "Format",
            TextUnit::Line => "Line",
            TextUnit::Paragraph => "Paragraph",
            TextUnit::Page => "Page",
            TextUnit::Document => "Document",
        };
    }
}

impl fmt::Display for TextUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.name());
    }
}

/// One end of a range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Start,
    End,
}

impl Endpoint {
    /// The other endpoint.
    pub fn opposite(self) -> Endpoint {
        return match self {
            Endpoint::Start => Endpoint::End,
            Endpoint::End => Endpoint::Start,
        };
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Endpoint::Start => f.write_str("Start"),
            Endpoint::End => f.write_str("End"),
        };
    }
}
