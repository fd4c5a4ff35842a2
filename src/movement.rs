//! Predicting and checking unit-based movement.
//!
//! The count a provider reports for a move is never a clamp of the requested
//! count. It is capped by the number of units actually available between the
//! moving position and the document edge, which this module obtains from an
//! independent [`UnitCounter`]:
//!
//! | Motion | Direction | Units available |
//! |--------|-----------|-----------------|
//! | endpoint at `p`, or degenerate range at `p` | forward | `count([p, len])` |
//! | endpoint at `p`, or degenerate range at `p` | backward | `count([0, p])` |
//! | non-degenerate range starting at `s` | forward | `count([s, len]) - 1` |
//! | non-degenerate range starting at `s` | backward | `count([0, s])` |
//!
//! The reported count is then `sign(requested) * min(|requested|, available)`.

use std::fmt;

use crate::config::MovementConfig;
use crate::error::Error;
use crate::error::Failure;
use crate::error::Result;
use crate::outcome::ExpectedOutcome;
use crate::outcome::classify;
use crate::outcome::expect_success;
use crate::outcome::verify_range_outcome;
use crate::provider::ProviderErrorKind;
use crate::provider::RangeProvider;
use crate::provider::UnitCounter;
use crate::range::Range;
use crate::range::compare_endpoints;
use crate::range::sign;
use crate::session::DocumentSession;
use crate::unit::Endpoint;
use crate::unit::TextUnit;

/// An expected count written in terms of `N`, the number of units in a
/// range: `sign * (N * num / den + offset)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CountExpr {
    negative: bool,
    num: i64,
    den: i64,
    offset: i64,
}

impl CountExpr {
    /// `N`
    pub const N: CountExpr = CountExpr {
        negative: false,
        num: 1,
        den: 1,
        offset: 0,
    };

    /// A count that does not depend on `N`.
    pub const fn constant(value: i64) -> CountExpr {
        return CountExpr {
            negative: false,
            num: 0,
            den: 1,
            offset: value,
        };
    }

    /// `N + k`
    pub const fn plus(self, k: i64) -> CountExpr {
        return CountExpr {
            offset: self.offset + k,
            ..self
        };
    }

    /// `N - k`
    pub const fn minus(self, k: i64) -> CountExpr {
        return self.plus(-k);
    }

    /// `N / 2`, rounded toward zero.
    pub const fn half(self) -> CountExpr {
        return CountExpr {
            den: self.den * 2,
            ..self
        };
    }

    pub const fn neg(self) -> CountExpr {
        return CountExpr {
            negative: !self.negative,
            ..self
        };
    }

    /// Evaluate for a range holding `n` units.
    pub fn eval(&self, n: usize) -> i64 {
        let magnitude = n as i64 * self.num / self.den + self.offset;
        return if self.negative { -magnitude } else { magnitude };
    }
}

impl fmt::Display for CountExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut body = String::new();
        if self.num != 0 {
            body.push('N');
            if self.den != 1 {
                body.push_str(&format!("/{}", self.den));
            }
            if self.offset > 0 {
                body.push_str(&format!("+{}", self.offset));
            } else if self.offset < 0 {
                body.push_str(&format!("{}", self.offset));
            }
        } else {
            body = self.offset.to_string();
        }
        if self.negative {
            if self.num != 0 && self.offset != 0 {
                return write!(f, "-({body})");
            }
            return write!(f, "-{body}");
        }
        return f.write_str(&body);
    }
}

/// How a range is being moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Motion {
    /// `Move`: the whole range.
    Range,
    /// `MoveEndpointByUnit` on one endpoint.
    Endpoint(Endpoint),
}

impl fmt::Display for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Motion::Range => f.write_str("Move"),
            Motion::Endpoint(_) => f.write_str("MoveEndpointByUnit"),
        };
    }
}

/// The model's prediction for one move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovePrediction {
    /// The signed count the provider must report.
    pub count: i32,
    /// The resulting range, when it can be predicted without knowing unit
    /// boundaries (character and document units only).
    pub range: Option<Range>,
}

/// Units the counter sees between `offset` and the document edge.
pub fn units_available<C: UnitCounter + ?Sized>(
    counter: &C,
    session: &DocumentSession,
    offset: usize,
    unit: TextUnit,
    forward: bool,
) -> Result<usize> {
    let span = if forward {
        Range::within(offset, session.len(), session.len())?
    } else {
        Range::within(0, offset, session.len())?
    };
    return expect_success("CountUnits", &format!("{span}, {unit}"), counter.count_units_in_range(&span, unit));
}

/// The counter reported more characters between `offset` and the edge than
/// the document holds.
fn counter_overreach(offset: usize, len: usize, unit: TextUnit, forward: bool, reported: usize) -> Error {
    let (span, room) = if forward {
        (format!("{{{offset},{len}}}"), len - offset)
    } else {
        (format!("{{0,{offset}}}"), offset)
    };
    return Error::verification(Failure::new(
        "CountUnits",
        format!("{span}, {unit}"),
        format!("at most {room} units"),
        format!("count {reported}"),
    ));
}

/// A range returned by the provider, checked against the document bounds.
fn provider_range(session: &DocumentSession, operation: &str, request: &str, range: &Range) -> Result<Range> {
    return session.check_range(range).map_err(|_| {
        Error::verification(Failure::new(
            operation,
            request,
            format!("range within {}", session.document()),
            format!("range {range}"),
        ))
    });
}

/// `sign(requested) * min(|requested|, available)`.
pub fn predict_count(requested: i32, available: usize) -> i32 {
    let magnitude = (requested.unsigned_abs() as usize).min(available);
    // `available` fits in i32 whenever it is the smaller of the two.
    return requested.signum() * magnitude as i32;
}

/// Predict the count and, where possible, the resulting range of a move.
pub fn predict_move<C: UnitCounter + ?Sized>(
    counter: &C,
    session: &DocumentSession,
    range: &Range,
    motion: Motion,
    unit: TextUnit,
    requested: i32,
) -> Result<MovePrediction> {
    let range = session.check_range(range)?;
    if requested == 0 {
        return Ok(MovePrediction {
            count: 0,
            range: Some(range),
        });
    }

    let forward = requested > 0;
    let whole_range = motion == Motion::Range && !range.is_degenerate();
    let offset = match motion {
        Motion::Range => range.start(),
        Motion::Endpoint(endpoint) => range.endpoint(endpoint),
    };
    let reported = units_available(counter, session, offset, unit, forward)?;
    let mut available = reported;
    if whole_range && forward {
        available = available.saturating_sub(1);
    }
    let count = predict_count(requested, available);

    let len = session.len();
    let moved = count.unsigned_abs() as usize;
    let target = match unit {
        TextUnit::Character if forward => match offset.checked_add(moved).filter(|&to| to <= len) {
            Some(to) => Some(to),
            None => return Err(counter_overreach(offset, len, unit, forward, reported)),
        },
        TextUnit::Character => match offset.checked_sub(moved) {
            Some(to) => Some(to),
            None => return Err(counter_overreach(offset, len, unit, forward, reported)),
        },
        TextUnit::Document if moved == 0 => Some(offset),
        TextUnit::Document if forward => Some(len),
        TextUnit::Document => Some(0),
        _ => None,
    };

    let predicted = match (target, motion) {
        (Some(_), _) if count == 0 => Some(range),
        (Some(to), Motion::Endpoint(endpoint)) => Some(range.with_endpoint(endpoint, to)),
        (Some(to), Motion::Range) if range.is_degenerate() => Some(Range::degenerate(to)),
        (Some(to), Motion::Range) if unit == TextUnit::Character => {
            // The moved range keeps one character, so it has to start before the end.
            if to >= len {
                return Err(counter_overreach(offset, len, unit, forward, reported));
            }
            Some(Range::within(to, to + 1, len)?)
        }
        (Some(to), Motion::Range) => Some(Range::within(to, len, len)?),
        (None, _) => None,
    };

    return Ok(MovePrediction {
        count,
        range: predicted,
    });
}

fn call_move<P: RangeProvider + ?Sized>(
    provider: &P,
    range: &Range,
    motion: Motion,
    unit: TextUnit,
    count: i32,
) -> crate::provider::ProviderResult<(Range, i32)> {
    return match motion {
        Motion::Range => provider.move_by_unit(range, unit, count),
        Motion::Endpoint(endpoint) => provider.move_endpoint_by_unit(range, endpoint, unit, count),
    };
}

fn describe(range: &Range, motion: Motion, unit: TextUnit, count: i32) -> String {
    return match motion {
        Motion::Range => format!("{range}, {unit}, {count}"),
        Motion::Endpoint(endpoint) => format!("{range}, {endpoint}, {unit}, {count}"),
    };
}

/// Run one move on the provider and check it against the prediction.
///
/// Returns `None` when `expected_error` was raised as predicted.
pub fn verify_move<P, C>(
    provider: &P,
    counter: &C,
    session: &DocumentSession,
    range: &Range,
    motion: Motion,
    unit: TextUnit,
    requested: i32,
    expected_error: Option<ProviderErrorKind>,
) -> Result<Option<(Range, i32)>>
where
    P: RangeProvider + ?Sized,
    C: UnitCounter + ?Sized,
{
    let operation = motion.to_string();
    let request = describe(range, motion, unit, requested);
    let observed = call_move(provider, range, motion, unit, requested);
    let Some((moved_range, moved)) = classify(&operation, &request, expected_error, observed)? else {
        return Ok(None);
    };

    let prediction = predict_move(counter, session, range, motion, unit, requested)?;
    if moved != prediction.count {
        return Err(Error::verification(Failure::new(
            operation,
            request,
            format!("count {}", prediction.count),
            format!("count {moved}"),
        )));
    }
    if let Some(want) = prediction.range
        && want != moved_range
    {
        return Err(Error::verification(Failure::new(
            operation,
            request,
            format!("range {want}"),
            format!("range {moved_range}"),
        )));
    }
    provider_range(session, &operation, &request, &moved_range)?;
    return Ok(Some((moved_range, moved)));
}

/// Check a move's count against an expression of the units in `counted`.
pub fn verify_count_expr<P: RangeProvider + ?Sized, C: UnitCounter + ?Sized>(
    provider: &P,
    counter: &C,
    range: &Range,
    counted: &Range,
    motion: Motion,
    unit: TextUnit,
    requested: i32,
    expected: CountExpr,
) -> Result<i32> {
    let operation = motion.to_string();
    let request = describe(range, motion, unit, requested);
    let n = expect_success("CountUnits", &format!("{counted}, {unit}"), counter.count_units_in_range(counted, unit))?;
    let (_, moved) = expect_success(&operation, &request, call_move(provider, range, motion, unit, requested))?;
    let want = expected.eval(n);
    if i64::from(moved) != want {
        return Err(Error::verification(Failure::new(
            operation,
            request,
            format!("count {expected} = {want} (N = {n})"),
            format!("count {moved}"),
        )));
    }
    return Ok(moved);
}

/// Move one unit at a time until the provider reports 0, then probe again.
///
/// Every probe after the first zero must also report 0 and leave the range
/// alone, and the total moved must equal what the counter said was
/// available. Returns the total.
pub fn verify_saturation<P, C>(
    provider: &P,
    counter: &C,
    session: &DocumentSession,
    range: &Range,
    motion: Motion,
    unit: TextUnit,
    forward: bool,
    config: &MovementConfig,
) -> Result<usize>
where
    P: RangeProvider + ?Sized,
    C: UnitCounter + ?Sized,
{
    let step = if forward { 1 } else { -1 };
    let expected_total = predict_move(counter, session, range, motion, unit, if forward { i32::MAX } else { -i32::MAX })?.count;
    let operation = motion.to_string();

    let mut current = session.check_range(range)?;
    let mut total = 0usize;
    loop {
        if total > config.max_walk_steps {
            return Err(Error::verification(Failure::new(
                operation,
                describe(range, motion, unit, step),
                format!("saturation within {} steps", config.max_walk_steps),
                format!("still moving at {current}"),
            )));
        }
        let request = describe(&current, motion, unit, step);
        let (next, moved) = expect_success(&operation, &request, call_move(provider, &current, motion, unit, step))?;
        if moved == 0 {
            break;
        }
        if moved != step {
            return Err(Error::verification(Failure::new(
                operation,
                request,
                format!("count {step}"),
                format!("count {moved}"),
            )));
        }
        current = provider_range(session, &operation, &request, &next)?;
        total += 1;
    }

    for _ in 0..config.saturation_probes {
        let request = describe(&current, motion, unit, step);
        let (next, moved) = expect_success(&operation, &request, call_move(provider, &current, motion, unit, step))?;
        if moved != 0 || next != current {
            return Err(Error::verification(Failure::new(
                operation,
                request,
                format!("count 0, range {current}"),
                format!("count {moved}, range {next}"),
            )));
        }
    }

    if total != expected_total.unsigned_abs() as usize {
        return Err(Error::verification(Failure::new(
            operation,
            describe(range, motion, unit, step),
            format!("{} single steps before saturating", expected_total.unsigned_abs()),
            format!("{total} steps"),
        )));
    }
    tracing::debug!(%unit, forward, total, "saturated");
    return Ok(total);
}

/// Expand `range`, then check containment, non-emptiness and idempotence.
///
/// The expansion is cross-checked by a walking range that starts at the
/// document start and advances one unit at a time by endpoint movement. It
/// must land on both endpoints of the expanded range.
pub fn verify_expand<P: RangeProvider + ?Sized>(
    provider: &P,
    session: &DocumentSession,
    range: &Range,
    unit: TextUnit,
    config: &MovementConfig,
) -> Result<Range> {
    let range = session.check_range(range)?;
    let request = format!("{range}, {unit}");
    let fail = |expected: String, observed: String| -> Error {
        return Error::verification(Failure::new("ExpandToEnclosingUnit", request.clone(), expected, observed));
    };

    let expanded = expect_success("ExpandToEnclosingUnit", &request, provider.expand_to_enclosing_unit(&range, unit))?;
    let expanded = provider_range(session, "ExpandToEnclosingUnit", &request, &expanded)?;

    let covers = expanded.start() <= range.start() && range.end() <= expanded.end();
    if !covers {
        return Err(fail(format!("a range containing {range}"), format!("range {expanded}")));
    }
    if !session.is_empty() && expanded.is_degenerate() {
        return Err(fail("a non-empty range".to_string(), format!("range {expanded}")));
    }

    let predicted = match unit {
        TextUnit::Document => Some(session.document()),
        TextUnit::Character if !range.is_degenerate() || session.is_empty() => Some(range),
        TextUnit::Character => {
            let at = range.start().min(session.len() - 1);
            Some(Range::within(at, at + 1, session.len())?)
        }
        _ => None,
    };
    if let Some(want) = predicted
        && want != expanded
    {
        return Err(fail(format!("range {want}"), format!("range {expanded}")));
    }

    let again = expect_success("ExpandToEnclosingUnit", &format!("{expanded}, {unit}"), provider.expand_to_enclosing_unit(&expanded, unit))?;
    if again != expanded {
        return Err(fail(format!("idempotent expansion to {expanded}"), format!("range {again}")));
    }

    verify_walk(provider, &expanded, unit, config)?;
    return Ok(expanded);
}

/// Walk unit boundaries from the document start up to `expanded.end`.
fn verify_walk<P: RangeProvider + ?Sized>(provider: &P, expanded: &Range, unit: TextUnit, config: &MovementConfig) -> Result<()> {
    let mut cursor = 0;
    let mut hit_start = expanded.start() == 0;
    let mut steps = 0;

    while cursor < expanded.end() {
        if steps >= config.max_walk_steps {
            return Err(Error::configuration(format!(
                "walking range did not reach {expanded} within {} steps",
                config.max_walk_steps
            )));
        }
        let walker = Range::degenerate(cursor);
        let request = format!("{walker}, {}, {unit}, 1", Endpoint::End);
        let (next, moved) = expect_success(
            "MoveEndpointByUnit",
            &request,
            provider.move_endpoint_by_unit(&walker, Endpoint::End, unit, 1),
        )?;
        if moved != 1 || next.end() <= cursor {
            return Err(Error::verification(Failure::new(
                "MoveEndpointByUnit",
                request,
                "count 1 past the cursor",
                format!("count {moved}, range {next}"),
            )));
        }
        cursor = next.end();
        hit_start |= cursor == expanded.start();
        steps += 1;
    }

    if !hit_start || cursor != expanded.end() {
        return Err(Error::verification(Failure::new(
            "ExpandToEnclosingUnit",
            format!("{expanded}, {unit}"),
            "endpoints on unit boundaries",
            format!("walk ended at {cursor}, start reached: {hit_start}"),
        )));
    }
    return Ok(());
}

/// Move one endpoint onto another range's endpoint.
///
/// The moved endpoint must then compare equal to the target endpoint, and
/// the result must be degenerate exactly when the model says so.
pub fn verify_move_endpoint_by_range<P: RangeProvider + ?Sized>(
    provider: &P,
    session: &DocumentSession,
    range: &Range,
    endpoint: Endpoint,
    target: &Range,
    target_endpoint: Endpoint,
) -> Result<Range> {
    let range = session.check_range(range)?;
    let target = session.check_range(target)?;
    let request = format!("{range}, {endpoint}, {target}, {target_endpoint}");

    let predicted = range.with_endpoint(endpoint, target.endpoint(target_endpoint));
    let expected = if predicted.is_degenerate() {
        ExpectedOutcome::EmptyRange
    } else {
        ExpectedOutcome::MatchingRange(predicted)
    };

    let observed = provider
        .move_endpoint_by_range(&range, endpoint, &target, target_endpoint)
        .map(Some);
    let Some(moved) = verify_range_outcome("MoveEndpointByRange", &request, &expected, observed)? else {
        return Err(Error::verification(Failure::new("MoveEndpointByRange", request, expected.to_string(), "null")));
    };
    if moved != predicted {
        return Err(Error::verification(Failure::new(
            "MoveEndpointByRange",
            request,
            format!("range {predicted}"),
            format!("range {moved}"),
        )));
    }

    let compared = expect_success(
        "CompareEndpoints",
        &format!("{moved}, {endpoint}, {target}, {target_endpoint}"),
        provider.compare_endpoints(&moved, endpoint, &target, target_endpoint),
    )?;
    let local = sign(compare_endpoints(&moved, endpoint, &target, target_endpoint));
    if compared != 0 || local != 0 {
        return Err(Error::verification(Failure::new(
            "MoveEndpointByRange",
            request,
            "endpoints compare equal",
            format!("CompareEndpoints reported {compared}"),
        )));
    }
    return Ok(moved);
}
