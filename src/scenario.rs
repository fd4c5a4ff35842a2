//! Composite scenarios built from the individual oracles.
//!
//! Each scenario runs against one [`DocumentSession`] and collects every
//! check into a [`Report`] instead of stopping at the first failure. A
//! configuration error skips only the check (or scenario) it belongs to.

use std::fmt;

use serde::Serialize;

use crate::attribute;
use crate::attribute::AttributeValue;
use crate::attribute::CATALOG;
use crate::attribute::CountFilter;
use crate::compare;
use crate::config::OracleConfig;
use crate::error::Error;
use crate::error::Failure;
use crate::error::Result;
use crate::factory::Anchor;
use crate::factory::RangeFactory;
use crate::factory::RangeKind;
use crate::factory::Region;
use crate::movement;
use crate::movement::Motion;
use crate::outcome::Report;
use crate::outcome::expect_success;
use crate::provider::ElementView;
use crate::provider::HandleId;
use crate::provider::ProviderResult;
use crate::provider::RangeProvider;
use crate::provider::SelectionOps;
use crate::provider::TextSource;
use crate::provider::UnitCounter;
use crate::range::Range;
use crate::search;
use crate::session::DocumentSession;
use crate::session::SessionCache;
use crate::unit::Endpoint;
use crate::unit::TextUnit;

// ============================================================================
// Move/count table
// ============================================================================

const LABEL_WIDTH: usize = 55;

/// One cell of the move/count table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Cell {
    Count(i32),
    /// Expansion returned an empty range.
    Empty,
    /// The provider raised an error.
    Error,
}

impl Cell {
    fn render(&self) -> String {
        return match self {
            Cell::Count(count) => count.to_string(),
            Cell::Empty => "Empt".to_string(),
            Cell::Error => "Eror".to_string(),
        };
    }
}

/// One row of the move/count table: one call, every unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MoveCountRow {
    pub call: String,
    /// Every cell of this row is expected to be 0.
    pub expect_zero: bool,
    pub cells: [Cell; 7],
}

/// Counts observed when moving across the whole document by every unit.
#[derive(Clone, Debug, Serialize)]
pub struct MoveCountReport {
    /// Raw length of the document text, terminator included.
    pub raw_len: usize,
    /// Reference unit counts over the document.
    pub counts: [usize; 7],
    /// Rows that must reproduce the reference counts.
    pub rows: Vec<MoveCountRow>,
    /// Rows moving away from the edge already reached, which must be 0.
    pub reverse_rows: Vec<MoveCountRow>,
    pub failures: Vec<Failure>,
    pub faults: Vec<Failure>,
}

impl MoveCountReport {
    pub fn is_clean(&self) -> bool {
        return self.failures.is_empty() && self.faults.is_empty();
    }

    /// Fold this table into a general report, one check per cell.
    pub fn into_report(self) -> Report {
        let cells = (self.rows.len() + self.reverse_rows.len()) * TextUnit::ALL.len();
        let mut report = Report::new();
        report.passed = cells.saturating_sub(self.failures.len() + self.faults.len());
        report.failures = self.failures;
        report.faults = self.faults;
        return report;
    }

    fn write_rule(f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", "-".repeat(LABEL_WIDTH))?;
        for unit in TextUnit::ALL {
            write!(f, "+{}", "-".repeat(unit.name().len()))?;
        }
        return writeln!(f);
    }

    fn write_row(f: &mut fmt::Formatter<'_>, row: &MoveCountRow) -> fmt::Result {
        if row.expect_zero {
            write!(f, "***{:>width$}", row.call, width = LABEL_WIDTH - 3)?;
        } else {
            write!(f, "{:>width$}", row.call, width = LABEL_WIDTH)?;
        }
        for (unit, cell) in TextUnit::ALL.iter().zip(&row.cells) {
            write!(f, "|{:>width$}", cell.render(), width = unit.name().len())?;
        }
        return writeln!(f);
    }
}

impl fmt::Display for MoveCountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Length = {:>3}", self.raw_len)?;
        write!(f, "{}", " ".repeat(LABEL_WIDTH))?;
        for unit in TextUnit::ALL {
            write!(f, "|{unit}")?;
        }
        writeln!(f)?;
        MoveCountReport::write_rule(f)?;

        write!(f, "{:>width$}", "*** CORRECT VALUES ***", width = LABEL_WIDTH)?;
        for (unit, count) in TextUnit::ALL.iter().zip(&self.counts) {
            write!(f, "|{:>width$}", count, width = unit.name().len())?;
        }
        writeln!(f)?;
        MoveCountReport::write_rule(f)?;

        for row in &self.rows {
            MoveCountReport::write_row(f, row)?;
        }
        MoveCountReport::write_rule(f)?;
        for row in &self.reverse_rows {
            MoveCountReport::write_row(f, row)?;
        }
        MoveCountReport::write_rule(f)?;

        for failure in &self.failures {
            writeln!(f, "FAIL  {failure}")?;
        }
        for fault in &self.faults {
            writeln!(f, "FAULT {fault}")?;
        }
        return Ok(());
    }
}

/// Which call a table row makes on a fresh range.
#[derive(Clone, Copy, Debug)]
enum RowCall {
    /// `MoveEndpointByUnit` on the document range.
    Endpoint(Endpoint, i32),
    /// `Move` on an empty range collapsed to one end of the document.
    EmptyRange(Endpoint, i32),
}

impl RowCall {
    fn label(self) -> String {
        let amount = |count: i32| if count > 0 { "MaxInt" } else { "MinInt" };
        return match self {
            RowCall::Endpoint(endpoint, count) => format!("MoveEndpointByUnit({endpoint},TextUnit.*,{})", amount(count)),
            RowCall::EmptyRange(endpoint, count) => format!("EmptyRange@{endpoint}.Move(TextUnit.*,{})", amount(count)),
        };
    }

    fn run<P: RangeProvider + ?Sized>(self, provider: &P, document: &Range, unit: TextUnit) -> ProviderResult<i32> {
        return match self {
            RowCall::Endpoint(endpoint, count) => provider.move_endpoint_by_unit(document, endpoint, unit, count).map(|(_, moved)| moved),
            RowCall::EmptyRange(endpoint, count) => {
                let empty = document.collapse(endpoint);
                provider.move_by_unit(&empty, unit, count).map(|(_, moved)| moved)
            }
        };
    }
}

fn count_row<P: RangeProvider + ?Sized>(
    provider: &P,
    document: &Range,
    call: RowCall,
    expected: &[i64; 7],
    failures: &mut Vec<Failure>,
    faults: &mut Vec<Failure>,
) -> MoveCountRow {
    let label = call.label();
    let mut cells = [Cell::Error; 7];
    for unit in TextUnit::ALL {
        let want = expected[unit.index()];
        cells[unit.index()] = match call.run(provider, document, unit) {
            Ok(count) => {
                if i64::from(count) != want {
                    failures.push(Failure::new(label.clone(), unit.name(), format!("count {want}"), format!("count {count}")));
                }
                Cell::Count(count)
            }
            Err(err) => {
                faults.push(Failure::new(label.clone(), unit.name(), "success", err.to_string()));
                Cell::Error
            }
        };
    }
    return MoveCountRow {
        call: label,
        expect_zero: expected[0] == 0,
        cells,
    };
}

/// Count units by expanding an empty range at the document start, then
/// hopping its start onto its end, until the expansion reaches the document
/// end.
fn expansion_walk<P: RangeProvider + ?Sized>(
    provider: &P,
    session: &DocumentSession,
    counts: &[usize; 7],
    max_steps: usize,
    failures: &mut Vec<Failure>,
    faults: &mut Vec<Failure>,
) -> MoveCountRow {
    let call = "ExpandToEnclosingUnit()@Start";
    let document = session.document();
    let mut cells = [Cell::Count(0); 7];

    for unit in TextUnit::ALL {
        if session.is_empty() {
            continue;
        }
        let mut range = Range::degenerate(0);
        let mut count = 0usize;
        let cell = loop {
            let expanded = match provider.expand_to_enclosing_unit(&range, unit) {
                Ok(expanded) => expanded,
                Err(err) => {
                    faults.push(Failure::new(call, unit.name(), "success", err.to_string()));
                    break Cell::Error;
                }
            };
            count += 1;
            if expanded.is_degenerate() {
                failures.push(Failure::new(call, unit.name(), "a non-empty range", format!("range {expanded}")));
                break Cell::Empty;
            }
            if expanded.end() >= document.end() || count >= max_steps {
                break Cell::Count(count as i32);
            }
            range = expanded.with_endpoint(Endpoint::Start, expanded.end());
        };

        if cell == Cell::Count(count as i32) && count != counts[unit.index()] {
            failures.push(Failure::new(
                call,
                unit.name(),
                format!("count {}", counts[unit.index()]),
                format!("count {count}"),
            ));
        }
        cells[unit.index()] = cell;
    }

    return MoveCountRow {
        call: call.to_string(),
        expect_zero: counts[0] == 0,
        cells,
    };
}

/// Move across the whole document by every unit and compare each reported
/// count with the reference count of that unit.
///
/// Forward rows must reproduce the reference counts (negated for backward
/// moves); the reverse rows start at the edge they move towards and must
/// report 0.
pub fn move_count<P, C>(provider: &P, counter: &C, session: &DocumentSession, config: &OracleConfig) -> Result<MoveCountReport>
where
    P: RangeProvider + ?Sized,
    C: UnitCounter + ?Sized,
{
    let document = session.document();
    let mut counts = [0usize; 7];
    for unit in TextUnit::ALL {
        counts[unit.index()] = expect_success(
            "CountUnits",
            &format!("{document}, {unit}"),
            counter.count_units_in_range(&document, unit),
        )?;
    }

    let forward: [i64; 7] = counts.map(|c| c as i64);
    let backward: [i64; 7] = forward.map(|c| -c);
    let zero = [0i64; 7];

    let mut failures = Vec::new();
    let mut faults = Vec::new();
    let mut rows = Vec::new();
    for (call, expected) in [
        (RowCall::Endpoint(Endpoint::Start, i32::MAX), &forward),
        (RowCall::Endpoint(Endpoint::End, i32::MIN), &backward),
        (RowCall::EmptyRange(Endpoint::Start, i32::MAX), &forward),
        (RowCall::EmptyRange(Endpoint::End, i32::MIN), &backward),
    ] {
        rows.push(count_row(provider, &document, call, expected, &mut failures, &mut faults));
    }
    rows.push(expansion_walk(provider, session, &counts, config.movement.max_walk_steps, &mut failures, &mut faults));

    let mut reverse_rows = Vec::new();
    for call in [
        RowCall::Endpoint(Endpoint::Start, i32::MIN),
        RowCall::Endpoint(Endpoint::End, i32::MAX),
        RowCall::EmptyRange(Endpoint::Start, i32::MIN),
        RowCall::EmptyRange(Endpoint::End, i32::MAX),
    ] {
        reverse_rows.push(count_row(provider, &document, call, &zero, &mut failures, &mut faults));
    }

    for failure in &failures {
        tracing::warn!(%failure, "move count mismatch");
    }
    tracing::info!(class = %session.class(), len = session.len(), failures = failures.len(), "move count finished");
    return Ok(MoveCountReport {
        raw_len: session.raw_len(),
        counts,
        rows,
        reverse_rows,
        failures,
        faults,
    });
}

// ============================================================================
// FindText coverage
// ============================================================================

/// Search the whole document for a fixed set of needles in every
/// direction/case combination.
///
/// The needles are the empty string (an invalid argument), a string that
/// never occurs, the first half of the document and its upper-cased form.
pub fn find_text_coverage<P: RangeProvider + ?Sized>(provider: &P, session: &DocumentSession, hidden: &[Range]) -> Report {
    let mut report = Report::new();
    let document = session.document();
    let half: String = session.text().chars().take(session.len() / 2).collect();

    let mut needles = vec![String::new(), "ATG".to_string()];
    if !half.is_empty() {
        needles.push(half.to_uppercase());
        needles.push(half);
    }

    for needle in &needles {
        for backward in [false, true] {
            for ignore_case in [false, true] {
                report.record(search::verify_find_text(provider, session, &document, needle, backward, ignore_case, hidden));
            }
        }
    }
    tracing::info!(passed = report.passed, failed = report.failures.len(), "find text coverage finished");
    return report;
}

// ============================================================================
// Attribute sweep
// ============================================================================

/// The same array with every element shifted by one.
fn perturbed(value: &AttributeValue) -> Option<AttributeValue> {
    return match value {
        AttributeValue::FloatArray(values) => Some(AttributeValue::FloatArray(values.iter().map(|v| v + 1.0).collect())),
        _ => None,
    };
}

/// Read every catalog attribute over the document, check it against the
/// support matrix, then search for each concrete value in both directions.
pub fn attribute_sweep<P: RangeProvider + ?Sized>(provider: &P, session: &DocumentSession) -> Report {
    let mut report = Report::new();
    let class = session.class();
    let document = session.document();

    let mut supported = 0;
    let mut enums = 0;
    for entry in &CATALOG {
        let key = entry.key;
        let value = match expect_success("GetAttributeValue", &format!("{document}, {key}"), provider.attribute_value(&document, key)) {
            Ok(value) => value,
            Err(err) => {
                report.record::<()>(Err(err));
                continue;
            }
        };
        if !report.record(attribute::verify_value(key, class, &value)) {
            continue;
        }
        if value.is_not_supported() {
            continue;
        }
        supported += 1;
        if entry.is_enum {
            enums += 1;
        }

        if value.is_mixed() {
            if session.is_empty() {
                continue;
            }
            let first = Range::degenerate(0).with_endpoint(Endpoint::End, 1);
            let single = provider.attribute_value(&first, key);
            let resolved = expect_success("GetAttributeValue", &format!("{first}, {key}"), single)
                .and_then(|single| attribute::verify_mixed_resolution(key, &value, &single));
            report.record(resolved);
            continue;
        }

        for backward in [false, true] {
            report.record(search::verify_find_attribute(provider, session, &document, key, &value, backward));
        }
        if let Some(shifted) = perturbed(&value)
            && !value.is_empty_array()
        {
            report.record(search::verify_find_attribute(provider, session, &document, key, &shifted, false));
        }
    }

    report.record(attribute::verify_count(class, CountFilter::Supported, supported));
    report.record(attribute::verify_count(class, CountFilter::Unsupported, CATALOG.len() - supported));
    report.record(attribute::verify_count(class, CountFilter::EnumOnly, enums));
    tracing::info!(%class, supported, passed = report.passed, "attribute sweep finished");
    return report;
}

// ============================================================================
// Range sweep
// ============================================================================

/// Every kind of range the factory can build for this session.
pub fn range_kinds(session: &DocumentSession, config: &OracleConfig) -> Vec<RangeKind> {
    let mut kinds = vec![RangeKind::Document, RangeKind::VisibleUnion];
    kinds.extend(Region::ALL.map(RangeKind::Degenerate));
    if session.len() >= config.factory.random_length_floor() {
        kinds.extend(Region::ALL.map(RangeKind::Random));
    }
    if !session.is_empty() {
        kinds.extend([RangeKind::FirstCharacter, RangeKind::MiddleCharacter, RangeKind::LastCharacter]);
        kinds.extend([TextUnit::Word, TextUnit::Line, TextUnit::Paragraph, TextUnit::Page].map(RangeKind::FirstUnit));
    }
    return kinds;
}

/// Build every kind of range and run the movement and comparison oracles on
/// each one.
pub fn range_sweep<P, C>(
    provider: &P,
    counter: &C,
    session: &DocumentSession,
    factory: &mut RangeFactory,
    config: &OracleConfig,
) -> Report
where
    P: RangeProvider + ?Sized,
    C: UnitCounter + ?Sized,
{
    let mut report = Report::new();
    let document = session.document();

    let mut ranges = Vec::new();
    for kind in range_kinds(session, config) {
        if let Some(range) = report_value(&mut report, factory.build(kind, session, provider)) {
            ranges.push(range);
        }
    }
    if let Some(&anchor) = ranges.iter().find(|r| !r.is_degenerate() && **r != document) {
        for kind in Anchor::ALL.map(|a| RangeKind::Anchored(a, anchor)) {
            if let Some(range) = report_value(&mut report, factory.build(kind, session, provider)) {
                ranges.push(range);
            }
        }
    }

    let motions = [Motion::Range, Motion::Endpoint(Endpoint::Start), Motion::Endpoint(Endpoint::End)];
    for range in &ranges {
        let clone = factory.build(RangeKind::Clone(*range), session, provider);
        report.record(clone.and_then(|clone| compare::verify_clone(provider, range, &clone)));
        report.record(compare::verify_text(provider, session, range, None, false));

        for unit in TextUnit::ALL {
            report.record(movement::verify_expand(provider, session, range, unit, &config.movement));
            for motion in motions {
                for count in [i32::MIN, -2, -1, 0, 1, 2, i32::MAX] {
                    report.record(movement::verify_move(provider, counter, session, range, motion, unit, count, None));
                }
            }
            for forward in [true, false] {
                report.record(movement::verify_saturation(
                    provider,
                    counter,
                    session,
                    range,
                    Motion::Range,
                    unit,
                    forward,
                    &config.movement,
                ));
            }
        }

        for endpoint in [Endpoint::Start, Endpoint::End] {
            for target_endpoint in [Endpoint::Start, Endpoint::End] {
                report.record(movement::verify_move_endpoint_by_range(
                    provider,
                    session,
                    range,
                    endpoint,
                    &document,
                    target_endpoint,
                ));
            }
        }
    }

    tracing::info!(ranges = ranges.len(), passed = report.passed, failed = report.failures.len(), "range sweep finished");
    return report;
}

fn report_value<T>(report: &mut Report, result: Result<T>) -> Option<T> {
    return match result {
        Ok(value) => {
            report.passed += 1;
            Some(value)
        }
        Err(err) => {
            report.record::<()>(Err(err));
            None
        }
    };
}

// ============================================================================
// Element and selection checks
// ============================================================================

/// Side-effecting and structural checks on a handful of ranges.
pub fn element_checks<P>(provider: &mut P, session: &DocumentSession, expected_enclosing: HandleId) -> Report
where
    P: RangeProvider + ElementView + SelectionOps + TextSource + ?Sized,
{
    let mut report = Report::new();
    let document = session.document();
    let middle = Range::degenerate(session.len() / 2);

    for range in [document, middle] {
        report.record(compare::verify_bounding_rectangles(&*provider, &range));
        report.record(compare::verify_enclosing_element(&*provider, &range, expected_enclosing));
        report.record(compare::verify_scroll_into_view(provider, session, &range, true));
        report.record(compare::verify_select(provider, session, &range));
        report.record(compare::verify_add_remove_selection(provider, session, &range));
    }
    return report;
}

// ============================================================================
// Full run
// ============================================================================

/// Write `text` into the provider and run every scenario on it.
pub fn run_all<P>(
    provider: &mut P,
    text: &str,
    config: &OracleConfig,
    cache: &mut SessionCache,
    factory: &mut RangeFactory,
) -> Report
where
    P: RangeProvider + UnitCounter + ElementView + SelectionOps + TextSource,
{
    let mut report = Report::new();
    let session = match cache.establish(provider, text) {
        Ok(session) => session,
        Err(err) => {
            report.record::<()>(Err(err));
            return report;
        }
    };
    tracing::info!(class = %session.class(), len = session.len(), "running scenarios");

    report.record(session.verify_document_range(&*provider));
    let view: &P = provider;
    match move_count(view, view, &session, config) {
        Ok(table) => {
            tracing::debug!("\n{table}");
            report.absorb(table.into_report());
        }
        Err(err) => {
            report.record::<()>(Err(err));
        }
    }
    report.absorb(find_text_coverage(view, &session, &[]));
    report.absorb(attribute_sweep(view, &session));
    report.absorb(range_sweep(view, view, &session, factory, config));

    let enclosing = view.enclosing_element(&session.document());
    match enclosing {
        Ok(handle) => report.absorb(element_checks(provider, &session, handle)),
        Err(err) => {
            report.record::<()>(Err(Error::provider_fault(Failure::new("GetEnclosingElement", "", "success", err.to_string()))));
        }
    }
    return report;
}
