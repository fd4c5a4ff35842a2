//! The oracles must notice a misbehaving provider.
//!
//! Each test wraps the reference provider, breaks one operation, and checks
//! that the failure lands in the right bucket.

use rangecheck::Error;
use rangecheck::attribute::AttributeId;
use rangecheck::attribute::AttributeValue;
use rangecheck::config::OracleConfig;
use rangecheck::factory::RangeFactory;
use rangecheck::model::MemoryProvider;
use rangecheck::movement;
use rangecheck::movement::Motion;
use rangecheck::normalize::ProviderClass;
use rangecheck::outcome::Report;
use rangecheck::provider::ProviderError;
use rangecheck::provider::ProviderErrorKind;
use rangecheck::provider::ProviderResult;
use rangecheck::provider::RangeProvider;
use rangecheck::provider::TextSource;
use rangecheck::provider::UnitCounter;
use rangecheck::range::Range;
use rangecheck::scenario;
use rangecheck::scenario::Cell;
use rangecheck::search;
use rangecheck::session::DocumentSession;
use rangecheck::unit::Endpoint;
use rangecheck::unit::TextUnit;
use samples::SampleText;

// =============================================================================
// Faulty provider
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Fault {
    /// `MoveEndpointByUnit` overstates every nonzero count by one.
    OverstatedEndpointCount,
    /// `ExpandToEnclosingUnit` raises for word units.
    WordExpansionRaises,
    /// `FindText` accepts an empty needle.
    EmptyNeedleAccepted,
    /// `GetText` appends one character too many at the document end.
    ExtraTerminator,
    /// Every attribute is reported as unsupported.
    NothingSupported,
    /// `SetDocumentText` drops the last character.
    TruncatingWrite,
    /// Word moves of `MoveEndpointByUnit` end past the document.
    EndpointPastDocument,
}

struct Faulty {
    inner: MemoryProvider,
    fault: Fault,
}

impl Faulty {
    fn new(class: ProviderClass, fault: Fault) -> Faulty {
        return Faulty {
            inner: MemoryProvider::new(class),
            fault,
        };
    }

    fn establish(&mut self, sample: SampleText) -> DocumentSession {
        return DocumentSession::establish(self, sample.text()).unwrap();
    }
}

impl TextSource for Faulty {
    fn provider_class(&self) -> ProviderClass {
        return self.inner.provider_class();
    }

    fn get_document_text(&self) -> ProviderResult<String> {
        return self.inner.get_document_text();
    }

    fn set_document_text(&mut self, sample: &str) -> ProviderResult<String> {
        if self.fault == Fault::TruncatingWrite {
            let mut chars = sample.chars();
            chars.next_back();
            return self.inner.set_document_text(chars.as_str());
        }
        return self.inner.set_document_text(sample);
    }
}

impl RangeProvider for Faulty {
    fn document_range(&self) -> ProviderResult<Range> {
        return self.inner.document_range();
    }

    fn text(&self, range: &Range, max_len: Option<usize>) -> ProviderResult<String> {
        let mut text = self.inner.text(range, max_len)?;
        if self.fault == Fault::ExtraTerminator && range.end() == self.inner.len() {
            text.push('\n');
        }
        return Ok(text);
    }

    fn compare_endpoints(&self, a: &Range, endpoint_a: Endpoint, b: &Range, endpoint_b: Endpoint) -> ProviderResult<i32> {
        return self.inner.compare_endpoints(a, endpoint_a, b, endpoint_b);
    }

    fn expand_to_enclosing_unit(&self, range: &Range, unit: TextUnit) -> ProviderResult<Range> {
        if self.fault == Fault::WordExpansionRaises && unit == TextUnit::Word {
            return Err(ProviderError::new(ProviderErrorKind::Other, "word breaker unavailable"));
        }
        return self.inner.expand_to_enclosing_unit(range, unit);
    }

    fn move_by_unit(&self, range: &Range, unit: TextUnit, count: i32) -> ProviderResult<(Range, i32)> {
        return self.inner.move_by_unit(range, unit, count);
    }

    fn move_endpoint_by_unit(&self, range: &Range, endpoint: Endpoint, unit: TextUnit, count: i32) -> ProviderResult<(Range, i32)> {
        let (moved_range, moved) = self.inner.move_endpoint_by_unit(range, endpoint, unit, count)?;
        if self.fault == Fault::OverstatedEndpointCount {
            return Ok((moved_range, moved + moved.signum()));
        }
        if self.fault == Fault::EndpointPastDocument && unit == TextUnit::Word && moved != 0 {
            let past = Range::new(moved_range.start(), self.inner.len() + 5).unwrap();
            return Ok((past, moved));
        }
        return Ok((moved_range, moved));
    }

    fn move_endpoint_by_range(&self, range: &Range, endpoint: Endpoint, target: &Range, target_endpoint: Endpoint) -> ProviderResult<Range> {
        return self.inner.move_endpoint_by_range(range, endpoint, target, target_endpoint);
    }

    fn find_text(&self, range: &Range, needle: &str, backward: bool, ignore_case: bool) -> ProviderResult<Option<Range>> {
        if self.fault == Fault::EmptyNeedleAccepted && needle.is_empty() {
            return Ok(None);
        }
        return self.inner.find_text(range, needle, backward, ignore_case);
    }

    fn find_attribute(&self, range: &Range, key: AttributeId, value: &AttributeValue, backward: bool) -> ProviderResult<Option<Range>> {
        return self.inner.find_attribute(range, key, value, backward);
    }

    fn attribute_value(&self, range: &Range, key: AttributeId) -> ProviderResult<AttributeValue> {
        if self.fault == Fault::NothingSupported {
            return Ok(AttributeValue::NotSupported);
        }
        return self.inner.attribute_value(range, key);
    }

    fn visible_ranges(&self) -> ProviderResult<Vec<Range>> {
        return self.inner.visible_ranges();
    }
}

/// A unit counter that reports the reference count shifted by `skew`.
struct SkewedCounter<'a> {
    inner: &'a MemoryProvider,
    skew: i64,
}

impl UnitCounter for SkewedCounter<'_> {
    fn count_units_in_range(&self, range: &Range, unit: TextUnit) -> ProviderResult<usize> {
        let count = self.inner.count_units_in_range(range, unit)? as i64;
        return Ok((count + self.skew).max(0) as usize);
    }
}

fn assert_failures_named(report: &Report) {
    for failure in &report.failures {
        assert!(!failure.operation.is_empty(), "{failure}");
        assert_ne!(failure.operation, "internal", "{failure}");
    }
}

// =============================================================================
// Detection
// =============================================================================

#[test]
fn overstated_counts_fail_the_endpoint_rows() {
    let mut provider = Faulty::new(ProviderClass::RichEdit, Fault::OverstatedEndpointCount);
    let session = provider.establish(SampleText::EasyText);
    let table = scenario::move_count(&provider, &provider.inner, &session, &OracleConfig::default()).unwrap();

    assert!(!table.is_clean());
    assert!(table.faults.is_empty());
    // Forward and backward endpoint rows, every unit.
    assert_eq!(table.failures.len(), 2 * TextUnit::ALL.len());
    assert_eq!(table.rows[0].cells[0], Cell::Count(45));
    assert_eq!(table.rows[1].cells[0], Cell::Count(-45));
    assert_eq!(table.rows[2].cells[0], Cell::Count(44));
}

#[test]
fn raising_expansion_is_a_provider_fault() {
    let mut provider = Faulty::new(ProviderClass::PlainEdit, Fault::WordExpansionRaises);
    let session = provider.establish(SampleText::EasyText);
    let table = scenario::move_count(&provider, &provider.inner, &session, &OracleConfig::default()).unwrap();

    assert_eq!(table.faults.len(), 1);
    assert!(table.failures.is_empty());
    assert_eq!(table.rows[4].cells[TextUnit::Word.index()], Cell::Error);
    assert!(table.to_string().contains("Eror"));
}

#[test]
fn accepting_an_empty_needle_is_a_verification_failure() {
    let mut provider = Faulty::new(ProviderClass::PlainEdit, Fault::EmptyNeedleAccepted);
    let session = provider.establish(SampleText::MixedCase);
    let result = search::verify_find_text(&provider, &session, &session.document(), "", false, false, &[]);
    assert!(matches!(result, Err(Error::Verification(_))));

    let report = scenario::find_text_coverage(&provider, &session, &[]);
    assert_eq!(report.failures.len(), 4);
    assert!(report.faults.is_empty());
}

#[test]
fn extra_terminator_breaks_document_length() {
    let mut provider = Faulty::new(ProviderClass::RichEdit, Fault::ExtraTerminator);
    let session = provider.establish(SampleText::EasyText);
    let result = session.verify_document_range(&provider);
    let failure = result.unwrap_err();
    assert_eq!(failure.failure().map(|f| f.operation.as_str()), Some("GetText"));
}

#[test]
fn unsupported_attributes_fail_the_sweep() {
    for class in ProviderClass::ALL {
        let mut provider = Faulty::new(class, Fault::NothingSupported);
        let session = provider.establish(SampleText::Num123);
        let report = scenario::attribute_sweep(&provider, &session);
        assert!(!report.is_clean());
        assert!(report.failures.iter().any(|f| f.operation == "AttributeCount"));
        assert!(report.failures.iter().any(|f| f.operation == "GetAttributeValue"));
    }
}

#[test]
fn truncating_write_is_rejected() {
    let mut provider = Faulty::new(ProviderClass::PlainEdit, Fault::TruncatingWrite);
    let result = DocumentSession::establish(&mut provider, SampleText::Num123.text());
    assert!(matches!(result, Err(Error::Verification(_))));
}

#[test]
fn faults_surface_in_a_full_run() {
    let config = OracleConfig::default();
    let mut factory = RangeFactory::seeded(5);
    let mut provider = Faulty::new(ProviderClass::RichEdit, Fault::OverstatedEndpointCount);
    let session = provider.establish(SampleText::MultiLine);
    let report = scenario::range_sweep(&provider, &provider.inner, &session, &mut factory, &config);
    assert!(!report.is_clean());
    assert!(report.faults.is_empty());
}

#[test]
fn overcounting_counter_is_reported_not_panicked() {
    let mut provider = MemoryProvider::new(ProviderClass::PlainEdit);
    let session = DocumentSession::establish(&mut provider, SampleText::Num123.text()).unwrap();
    let counter = SkewedCounter {
        inner: &provider,
        skew: 20,
    };
    let start = Motion::Endpoint(Endpoint::Start);
    let result = movement::verify_move(&provider, &counter, &session, &Range::degenerate(5), start, TextUnit::Character, -100, None);
    let failure = result.unwrap_err();
    assert_eq!(failure.failure().map(|f| f.operation.as_str()), Some("CountUnits"));

    let mut factory = RangeFactory::seeded(9);
    let report = scenario::range_sweep(&provider, &counter, &session, &mut factory, &OracleConfig::default());
    assert!(report.faults.is_empty());
    assert!(report.failures.iter().any(|f| f.operation == "CountUnits"));
    assert_failures_named(&report);
}

#[test]
fn undercounting_counter_fails_the_moves() {
    let mut provider = MemoryProvider::new(ProviderClass::RichEdit);
    let session = DocumentSession::establish(&mut provider, SampleText::MultiLine.text()).unwrap();
    let counter = SkewedCounter {
        inner: &provider,
        skew: -1,
    };
    let mut factory = RangeFactory::seeded(9);
    let report = scenario::range_sweep(&provider, &counter, &session, &mut factory, &OracleConfig::default());
    assert!(report.faults.is_empty());
    assert!(
        report
            .failures
            .iter()
            .any(|f| f.operation == "MoveEndpointByUnit" && f.expected.starts_with("count"))
    );
    assert_failures_named(&report);
}

#[test]
fn range_past_the_document_keeps_its_context() {
    let mut provider = Faulty::new(ProviderClass::PlainEdit, Fault::EndpointPastDocument);
    let session = provider.establish(SampleText::EasyText);
    let end = Motion::Endpoint(Endpoint::End);
    let result = movement::verify_move(&provider, &provider.inner, &session, &Range::degenerate(0), end, TextUnit::Word, 1, None);
    let error = result.unwrap_err();
    let failure = error.failure().unwrap();
    assert_eq!(failure.operation, "MoveEndpointByUnit");
    assert_eq!(failure.expected, "range within {0,44}");
    assert_eq!(failure.observed, "range {0,49}");

    let mut factory = RangeFactory::seeded(3);
    let report = scenario::range_sweep(&provider, &provider.inner, &session, &mut factory, &OracleConfig::default());
    assert!(report.faults.is_empty());
    assert!(
        report
            .failures
            .iter()
            .any(|f| f.operation == "MoveEndpointByUnit" && f.expected.starts_with("range within"))
    );
    assert_failures_named(&report);
}
