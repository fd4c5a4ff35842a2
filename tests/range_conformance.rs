//! Conformance suite for the reference provider.
//!
//! Every check here must hold for both provider classes. The suite runs the
//! oracles end to end: write a sample, build ranges, call the provider and
//! compare against the model.
//!
//! # Usage
//!
//! To run the suite against another class, add it to the
//! `run_conformance_tests!` invocations at the bottom of this file.

use rangecheck::config::OracleConfig;
use rangecheck::factory;
use rangecheck::factory::RangeFactory;
use rangecheck::factory::RangeKind;
use rangecheck::factory::Region;
use rangecheck::model::MemoryProvider;
use rangecheck::movement;
use rangecheck::movement::CountExpr;
use rangecheck::movement::Motion;
use rangecheck::normalize::ProviderClass;
use rangecheck::provider::RangeProvider;
use rangecheck::range::Range;
use rangecheck::scenario;
use rangecheck::search;
use rangecheck::session::DocumentSession;
use rangecheck::session::SessionCache;
use rangecheck::unit::Endpoint;
use rangecheck::unit::TextUnit;
use samples::SampleText;

fn setup(class: ProviderClass, sample: SampleText) -> (MemoryProvider, DocumentSession) {
    let mut provider = MemoryProvider::new(class);
    let session = DocumentSession::establish(&mut provider, sample.text()).unwrap();
    return (provider, session);
}

// =============================================================================
// Worked scenarios
// =============================================================================

/// A degenerate range in the middle of "123456789" expands to the fifth
/// character.
pub fn test_middle_character_expansion(class: ProviderClass) {
    let (provider, session) = setup(class, SampleText::Num123);
    let middle = factory::degenerate(&session, Region::Middle);
    assert_eq!(middle, Range::degenerate(4));

    let config = OracleConfig::default();
    let expanded = movement::verify_expand(&provider, &session, &middle, TextUnit::Character, &config.movement).unwrap();
    assert_eq!(expanded, Range::new(4, 5).unwrap());
    assert_eq!(provider.text(&expanded, None).unwrap(), "5");
}

/// The full text length reported by the provider matches the requested
/// length once the appended terminator is removed.
pub fn test_document_length_after_normalization(class: ProviderClass) {
    let (provider, session) = setup(class, SampleText::EasyText);
    assert_eq!(session.len(), 44);
    assert_eq!(session.raw_len(), 44 + class.appended_terminator().len());
    session.verify_document_range(&provider).unwrap();

    let raw = provider.text(&session.document(), None).unwrap();
    assert_eq!(raw.chars().count(), session.raw_len());
    session.normalizer().verify_len("GetText", 44, raw.chars().count()).unwrap();
}

/// Moving the end of an empty range by one document unit covers the whole
/// document, and a second move goes nowhere.
pub fn test_document_unit_move_saturates(class: ProviderClass) {
    let (provider, session) = setup(class, SampleText::Num123);
    let at_start = Range::degenerate(0);
    let motion = Motion::Endpoint(Endpoint::End);

    let (range, moved) = movement::verify_move(&provider, &provider, &session, &at_start, motion, TextUnit::Document, 1, None)
        .unwrap()
        .unwrap();
    assert_eq!(moved, 1);
    assert_eq!(range, session.document());

    let (again, moved) = movement::verify_move(&provider, &provider, &session, &range, motion, TextUnit::Document, 1, None)
        .unwrap()
        .unwrap();
    assert_eq!(moved, 0);
    assert_eq!(again, range);
}

/// Searching for the last block of the easy text ends at the document end.
pub fn test_last_block_matches_last(class: ProviderClass) {
    let (provider, session) = setup(class, SampleText::EasyText);
    let flags = search::verify_find_text(&provider, &session, &session.document(), "String 5", false, false, &[])
        .unwrap()
        .unwrap();
    assert!(flags.matches_last);
    assert!(!flags.matches_first);
}

// =============================================================================
// Expected errors
// =============================================================================

/// An empty needle must be rejected, and that rejection passes the check.
pub fn test_empty_needle_is_expected_error(class: ProviderClass) {
    let (provider, session) = setup(class, SampleText::MixedCase);
    let result = search::verify_find_text(&provider, &session, &session.document(), "", true, true, &[]).unwrap();
    assert_eq!(result, None);
}

/// Predicting an error that the provider does not raise is a failure.
pub fn test_missing_expected_error_fails(class: ProviderClass) {
    let (provider, session) = setup(class, SampleText::Num123);
    let result = movement::verify_move(
        &provider,
        &provider,
        &session,
        &session.document(),
        Motion::Range,
        TextUnit::Word,
        1,
        Some(rangecheck::provider::ProviderErrorKind::InvalidOperation),
    );
    assert!(matches!(result, Err(rangecheck::Error::Verification(_))));
}

// =============================================================================
// Counting
// =============================================================================

/// Moving by `N` from the document start reports `N` characters.
pub fn test_count_expression_over_document(class: ProviderClass) {
    let (provider, session) = setup(class, SampleText::MultiLine);
    let document = session.document();
    let start = document.collapse(Endpoint::Start);
    let n = session.len() as i32;

    let moved = movement::verify_count_expr(
        &provider,
        &provider,
        &start,
        &document,
        Motion::Endpoint(Endpoint::End),
        TextUnit::Character,
        n,
        CountExpr::N,
    )
    .unwrap();
    assert_eq!(moved, n);

    let lines = movement::verify_count_expr(
        &provider,
        &provider,
        &start,
        &document,
        Motion::Endpoint(Endpoint::End),
        TextUnit::Line,
        i32::MAX,
        CountExpr::N,
    )
    .unwrap();
    assert_eq!(lines, 3);
}

/// The move/count table is clean for every sample.
pub fn test_move_count_table(class: ProviderClass) {
    let config = OracleConfig::default();
    for sample in SampleText::ALL {
        let (provider, session) = setup(class, sample);
        let table = scenario::move_count(&provider, &provider, &session, &config).unwrap();
        assert!(table.is_clean(), "{sample}:\n{table}");
        assert_eq!(table.counts[TextUnit::Character.index()], sample.char_len());
    }
}

// =============================================================================
// Factory
// =============================================================================

/// Random sub-ranges stay inside the document and are never the whole of
/// it; documents that are too short are skipped, not failed.
pub fn test_random_ranges(class: ProviderClass) {
    let mut rng = RangeFactory::seeded(42);
    for sample in SampleText::ALL {
        let (provider, session) = setup(class, sample);
        for region in Region::ALL {
            let result = rng.build(RangeKind::Random(region), &session, &provider);
            if !sample.supports_random_ranges() {
                assert!(result.unwrap_err().is_configuration());
                continue;
            }
            let range = result.unwrap();
            assert!(!range.is_degenerate());
            assert!(range.end() <= session.len());
            assert_ne!(range, session.document());
        }
    }
}

/// Unit-sized ranges for the paragraphs sample.
pub fn test_first_units(class: ProviderClass) {
    let (provider, session) = setup(class, SampleText::Paragraphs);
    let mut rng = RangeFactory::seeded(1);
    let word = rng.build(RangeKind::FirstUnit(TextUnit::Word), &session, &provider).unwrap();
    assert_eq!(session.slice(&word), "One ");
    let paragraph = rng.build(RangeKind::FirstUnit(TextUnit::Paragraph), &session, &provider).unwrap();
    assert_eq!(session.slice(&paragraph), "One paragraph here.\n");
    let last = rng.build(RangeKind::LastCharacter, &session, &provider).unwrap();
    assert_eq!(session.slice(&last), ".");
}

// =============================================================================
// Full runs
// =============================================================================

/// Every scenario is clean on every sample.
pub fn test_run_all(class: ProviderClass) {
    let config = OracleConfig::default();
    let mut cache = SessionCache::new(config.session.cache_capacity);
    let mut rng = RangeFactory::seeded(7);
    let mut provider = MemoryProvider::new(class);
    for sample in SampleText::ALL {
        let report = scenario::run_all(&mut provider, sample.text(), &config, &mut cache, &mut rng);
        assert!(report.is_clean(), "{sample}: {report}");
        assert!(report.passed > 0);
    }
}

/// Hidden text is skipped by search and surfaces as a mixed attribute.
pub fn test_hidden_text(class: ProviderClass) {
    let (mut provider, _) = setup(class, SampleText::EasyText);
    let hidden = Range::new(27, 35).unwrap();
    provider.hide(hidden);
    let session = DocumentSession::snapshot(&provider).unwrap();

    let flags = search::verify_find_text(&provider, &session, &session.document(), "String 4", false, false, &[hidden])
        .unwrap()
        .unwrap();
    assert!(flags.empty);
    assert!(flags.hidden_excluded);

    let report = scenario::attribute_sweep(&provider, &session);
    assert!(report.is_clean(), "{report}");
}

/// Reports serialize for an external reporting layer.
pub fn test_reports_serialize(class: ProviderClass) {
    let (provider, session) = setup(class, SampleText::Num123);
    let report = scenario::find_text_coverage(&provider, &session, &[]);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["passed"], 16);
    assert_eq!(json["failures"].as_array().map(|f| f.len()), Some(0));

    let table = scenario::move_count(&provider, &provider, &session, &OracleConfig::default()).unwrap();
    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["raw_len"], 9 + class.appended_terminator().len());
    assert_eq!(json["rows"][0]["cells"][0]["Count"], 9);
    assert_eq!(json["rows"][0]["call"], "MoveEndpointByUnit(Start,TextUnit.*,MaxInt)");
}

// =============================================================================
// Test instantiation
// =============================================================================

macro_rules! run_conformance_tests {
    ($class_name:ident, $class:expr) => {
        mod $class_name {
            use super::*;

            #[test]
            fn middle_character_expansion() {
                test_middle_character_expansion($class);
            }

            #[test]
            fn document_length_after_normalization() {
                test_document_length_after_normalization($class);
            }

            #[test]
            fn document_unit_move_saturates() {
                test_document_unit_move_saturates($class);
            }

            #[test]
            fn last_block_matches_last() {
                test_last_block_matches_last($class);
            }

            #[test]
            fn empty_needle_is_expected_error() {
                test_empty_needle_is_expected_error($class);
            }

            #[test]
            fn missing_expected_error_fails() {
                test_missing_expected_error_fails($class);
            }

            #[test]
            fn count_expression_over_document() {
                test_count_expression_over_document($class);
            }

            #[test]
            fn move_count_table() {
                test_move_count_table($class);
            }

            #[test]
            fn random_ranges() {
                test_random_ranges($class);
            }

            #[test]
            fn first_units() {
                test_first_units($class);
            }

            #[test]
            fn run_all() {
                test_run_all($class);
            }

            #[test]
            fn hidden_text() {
                test_hidden_text($class);
            }

            #[test]
            fn reports_serialize() {
                test_reports_serialize($class);
            }
        }
    };
}

run_conformance_tests!(plain_edit, ProviderClass::PlainEdit);
run_conformance_tests!(rich_edit, ProviderClass::RichEdit);
