//! Named sample texts for text provider scenarios.
//!
//! A scenario starts by writing one of these texts into the provider under
//! test. The texts are chosen to exercise different unit layouts:
//!
//! | Sample | Shape |
//! |--------|-------|
//! | `Empty` | No characters at all |
//! | `Single` | One character |
//! | `Num123` | One nine-character word |
//! | `EasyText` | Five two-word groups on one line |
//! | `MixedCase` | Words differing only in case |
//! | `MultiLine` | Three lines, one paragraph each |
//! | `Paragraphs` | Two paragraphs separated by a blank line |
//! | `Punctuated` | Words mixed with punctuation runs |
//!
//! # Example
//!
//! ```
//! use samples::SampleText;
//!
//! assert_eq!(SampleText::Num123.text(), "123456789");
//! assert_eq!(SampleText::from_name("easy-text"), Some(SampleText::EasyText));
//! ```

use std::fmt;

/// A named sample text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SampleText {
    Empty,
    Single,
    Num123,
    EasyText,
    MixedCase,
    MultiLine,
    Paragraphs,
    Punctuated,
}

impl SampleText {
    /// Every sample, in declaration order.
    pub const ALL: [SampleText; 8] = [
        SampleText::Empty,
        SampleText::Single,
        SampleText::Num123,
        SampleText::EasyText,
        SampleText::MixedCase,
        SampleText::MultiLine,
        SampleText::Paragraphs,
        SampleText::Punctuated,
    ];

    /// The literal text written into the provider.
    pub fn text(self) -> &'static str {
        return match self {
            SampleText::Empty => "",
            SampleText::Single => "X",
            SampleText::Num123 => "123456789",
            SampleText::EasyText => "String 1 String 2 String 3 String 4 String 5",
            SampleText::MixedCase => "alpha Beta GAMMA delta",
            SampleText::MultiLine => "first line\nsecond line\nthird line",
            SampleText::Paragraphs => "One paragraph here.\n\nAnother paragraph, longer than the first.",
            SampleText::Punctuated => "Hello, world... (again)!",
        };
    }

    /// The kebab-case name used in configuration and reports.
    pub fn name(self) -> &'static str {
        return match self {
            SampleText::Empty => "empty",
            SampleText::Single => "single",
            SampleText::Num123 => "num-123",
            SampleText::EasyText => "easy-text",
            SampleText::MixedCase => "mixed-case",
            SampleText::MultiLine => "multi-line",
            SampleText::Paragraphs => "paragraphs",
            SampleText::Punctuated => "punctuated",
        };
    }

    /// Look a sample up by its kebab-case name.
    pub fn from_name(name: &str) -> Option<SampleText> {
        return SampleText::ALL.iter().copied().find(|s| s.name() == name);
    }

    /// Length of the sample in characters (not bytes).
    pub fn char_len(self) -> usize {
        return self.text().chars().count();
    }

    /// True when the text is long enough for random sub-range construction.
    pub fn supports_random_ranges(self) -> bool {
        return self.char_len() >= 8;
    }
}

impl fmt::Display for SampleText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for sample in SampleText::ALL {
            assert_eq!(SampleText::from_name(sample.name()), Some(sample));
        }
        assert_eq!(SampleText::from_name("nope"), None);
    }

    #[test]
    fn char_len_counts_characters() {
        assert_eq!(SampleText::Empty.char_len(), 0);
        assert_eq!(SampleText::Num123.char_len(), 9);
        assert_eq!(SampleText::EasyText.char_len(), SampleText::EasyText.text().len());
    }

    #[test]
    fn short_samples_cannot_host_random_ranges() {
        assert!(!SampleText::Empty.supports_random_ranges());
        assert!(!SampleText::Single.supports_random_ranges());
        assert!(SampleText::Num123.supports_random_ranges());
    }
}
