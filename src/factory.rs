//! Construction of ranges of every kind a scenario asks for.
//!
//! Each [`RangeKind`] has one constructor function on [`RangeFactory`]. All
//! kinds are deterministic except [`RangeKind::Random`], whose generator is
//! seeded from [`FactoryConfig::seed`] when one is configured. The factory
//! always reports the exact offsets it chose (logged at debug level and
//! returned as a plain [`Range`]) so callers can predict what happens next.

use std::fmt;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::FactoryConfig;
use crate::config::MIN_RANDOM_LENGTH;
use crate::error::Error;
use crate::error::Failure;
use crate::error::Result;
use crate::outcome::expect_success;
use crate::provider::RangeProvider;
use crate::range::Range;
use crate::session::DocumentSession;
use crate::unit::Endpoint;
use crate::unit::TextUnit;

/// Where in the document a range is placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    Start,
    Middle,
    End,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Start, Region::Middle, Region::End];
}

/// How a range is derived from the endpoints of another range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// `[0, other.start]`
    EndsAtStartOf,
    /// `[other.start, len]`
    StartsAtStartOf,
    /// `[0, other.end]`
    EndsAtEndOf,
    /// `[other.end, len]`
    StartsAtEndOf,
}

impl Anchor {
    pub const ALL: [Anchor; 4] = [
        Anchor::EndsAtStartOf,
        Anchor::StartsAtStartOf,
        Anchor::EndsAtEndOf,
        Anchor::StartsAtEndOf,
    ];
}

/// Every kind of range the factory can build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RangeKind {
    Document,
    Clone(Range),
    Degenerate(Region),
    Random(Region),
    FirstCharacter,
    MiddleCharacter,
    LastCharacter,
    /// The first unit of a coarser granularity: word, line, paragraph, page.
    FirstUnit(TextUnit),
    Anchored(Anchor, Range),
    VisibleUnion,
}

impl fmt::Display for RangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            RangeKind::Clone(source) => write!(f, "Clone({source})"),
            RangeKind::Anchored(anchor, other) => write!(f, "{anchor:?}({other})"),
            RangeKind::FirstUnit(unit) => write!(f, "First{unit}"),
            other => write!(f, "{other:?}"),
        };
    }
}

/// Builds ranges over a [`DocumentSession`].
#[derive(Debug, Clone)]
pub struct RangeFactory {
    rng: StdRng,
    min_random_length: usize,
}

impl RangeFactory {
    pub fn new(config: &FactoryConfig) -> RangeFactory {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        return RangeFactory {
            rng,
            min_random_length: config.random_length_floor(),
        };
    }

    /// A factory with a fixed seed and the default minimum random length.
    pub fn seeded(seed: u64) -> RangeFactory {
        return RangeFactory::new(&FactoryConfig {
            seed: Some(seed),
            min_random_length: MIN_RANDOM_LENGTH,
        });
    }

    /// Build a range of `kind`.
    ///
    /// Only unit-sized ranges and the visible union talk to the provider.
    pub fn build<P: RangeProvider + ?Sized>(
        &mut self,
        kind: RangeKind,
        session: &DocumentSession,
        provider: &P,
    ) -> Result<Range> {
        let range = match kind {
            RangeKind::Document => document(session),
            RangeKind::Clone(source) => clone_of(&source),
            RangeKind::Degenerate(region) => degenerate(session, region),
            RangeKind::Random(region) => self.random(session, region)?,
            RangeKind::FirstCharacter
            | RangeKind::MiddleCharacter
            | RangeKind::LastCharacter
            | RangeKind::FirstUnit(_) => unit_sized(kind, session, provider)?,
            RangeKind::Anchored(anchor, other) => anchored(session, anchor, &other)?,
            RangeKind::VisibleUnion => visible_union(provider)?,
        };
        tracing::debug!(%kind, start = range.start(), end = range.end(), "range built");
        return Ok(range);
    }

    /// A random sub-range in `region`.
    ///
    /// The span is never empty and never the whole document. Documents shorter
    /// than the configured minimum cannot host one.
    pub fn random(&mut self, session: &DocumentSession, region: Region) -> Result<Range> {
        let len = session.len();
        if len < self.min_random_length {
            return Err(Error::configuration(format!(
                "document of {len} characters is too short for a random sub-range (need {})",
                self.min_random_length
            )));
        }

        let k = random_span_unit(len);
        let (start, end) = match region {
            Region::Start => (0, 3 * k + self.next(0, k / 2)),
            Region::Middle => (k + self.next(0, k), len - k - self.next(0, k)),
            Region::End => (len - 3 * k - self.next(0, k / 2), len),
        };
        return Range::within(start, end, len);
    }

    /// A uniform draw from `[lo, hi)`, or `lo` when the interval is empty.
    fn next(&mut self, lo: usize, hi: usize) -> usize {
        if hi <= lo {
            return lo;
        }
        return self.rng.gen_range(lo..hi);
    }
}

/// The step `k` used by random sub-ranges: `len/3 - len/12 + 1`, shrunk
/// until `4k <= len`.
pub fn random_span_unit(len: usize) -> usize {
    let mut k = len / 3 - len / 12 + 1;
    while k > 0 && 4 * k > len {
        k -= 1;
    }
    return k;
}

/// `{0, len}`.
pub fn document(session: &DocumentSession) -> Range {
    return session.document();
}

/// An exact copy of `source`.
pub fn clone_of(source: &Range) -> Range {
    return *source;
}

/// An empty range at the start, middle (`len / 2`) or end.
pub fn degenerate(session: &DocumentSession, region: Region) -> Range {
    let offset = match region {
        Region::Start => 0,
        Region::Middle => session.len() / 2,
        Region::End => session.len(),
    };
    return Range::degenerate(offset);
}

/// A range derived from the endpoints of `other` and the document length.
pub fn anchored(session: &DocumentSession, anchor: Anchor, other: &Range) -> Result<Range> {
    let len = session.len();
    let other = session.check_range(other)?;
    let (start, end) = match anchor {
        Anchor::EndsAtStartOf => (0, other.start()),
        Anchor::StartsAtStartOf => (other.start(), len),
        Anchor::EndsAtEndOf => (0, other.end()),
        Anchor::StartsAtEndOf => (other.end(), len),
    };
    return Range::within(start, end, len);
}

/// The smallest range covering every visible range.
pub fn visible_union<P: RangeProvider + ?Sized>(provider: &P) -> Result<Range> {
    let visible = expect_success("GetVisibleRanges", "", provider.visible_ranges())?;
    let start = visible.iter().map(|r| r.start()).min();
    let end = visible.iter().map(|r| r.end()).max();
    return match (start, end) {
        (Some(start), Some(end)) => Range::new(start, end),
        _ => Err(Error::configuration("provider reports no visible ranges")),
    };
}

/// Build a one-unit range by collapsing and moving one endpoint one unit.
///
/// The provider must report exactly the requested movement, otherwise the
/// range would be silently wrong and construction fails.
pub fn unit_sized<P: RangeProvider + ?Sized>(kind: RangeKind, session: &DocumentSession, provider: &P) -> Result<Range> {
    if session.is_empty() {
        return Err(Error::configuration(format!("{kind} needs a non-empty document")));
    }

    let len = session.len();
    let (seed, endpoint, unit, count) = match kind {
        RangeKind::FirstCharacter => (0, Endpoint::End, TextUnit::Character, 1),
        RangeKind::MiddleCharacter => (len / 2, Endpoint::End, TextUnit::Character, 1),
        RangeKind::LastCharacter => (len, Endpoint::Start, TextUnit::Character, -1),
        RangeKind::FirstUnit(unit) => (0, Endpoint::End, unit, 1),
        _ => return Err(Error::configuration(format!("{kind} is not a unit-sized range"))),
    };

    let collapsed = Range::degenerate(seed);
    let requested = format!("{collapsed}, {endpoint}, {unit}, {count}");
    let (range, moved) = expect_success(
        "MoveEndpointByUnit",
        &requested,
        provider.move_endpoint_by_unit(&collapsed, endpoint, unit, count),
    )?;
    if moved != count {
        return Err(Error::verification(Failure::new(
            "MoveEndpointByUnit",
            requested,
            format!("count {count}"),
            format!("count {moved}"),
        )));
    }
    if session.check_range(&range).is_err() {
        return Err(Error::verification(Failure::new(
            "MoveEndpointByUnit",
            requested,
            format!("range within {}", session.document()),
            format!("range {range}"),
        )));
    }
    return Ok(range);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemoryProvider;
    use crate::normalize::ProviderClass;

    fn setup(text: &str) -> (MemoryProvider, DocumentSession) {
        let mut provider = MemoryProvider::new(ProviderClass::PlainEdit);
        let session = DocumentSession::establish(&mut provider, text).unwrap();
        return (provider, session);
    }

    #[test]
    fn degenerate_middle_of_odd_length() {
        let (_, session) = setup("123456789");
        assert_eq!(degenerate(&session, Region::Middle), Range::degenerate(4));
        assert_eq!(degenerate(&session, Region::End), Range::degenerate(9));
    }

    #[test]
    fn span_unit_shrinks_until_it_fits() {
        assert_eq!(random_span_unit(8), 2);
        assert_eq!(random_span_unit(9), 2);
        assert_eq!(random_span_unit(44), 11);
        for len in 8..500 {
            assert!(4 * random_span_unit(len) <= len);
        }
    }

    #[test]
    fn random_ranges_are_proper_subranges() {
        let (_, session) = setup("String 1 String 2 String 3 String 4 String 5");
        let mut factory = RangeFactory::seeded(11);
        for _ in 0..50 {
            for region in Region::ALL {
                let r = factory.random(&session, region).unwrap();
                assert!(r.len() > 0 && r.len() < session.len(), "{region:?} {r}");
            }
        }
    }

    #[test]
    fn short_document_cannot_host_random_range() {
        let (_, session) = setup("1234567");
        let err = RangeFactory::seeded(1).random(&session, Region::Start).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn configured_minimum_cannot_go_below_eight() {
        let (_, session) = setup("abc");
        let mut factory = RangeFactory::new(&FactoryConfig {
            seed: Some(3),
            min_random_length: 1,
        });
        for region in Region::ALL {
            assert!(factory.random(&session, region).unwrap_err().is_configuration());
        }
    }

    #[test]
    fn seeded_factories_agree() {
        let (provider, session) = setup("123456789abcdef");
        let mut a = RangeFactory::seeded(5);
        let mut b = RangeFactory::seeded(5);
        for region in Region::ALL {
            let kind = RangeKind::Random(region);
            assert_eq!(a.build(kind, &session, &provider).unwrap(), b.build(kind, &session, &provider).unwrap());
        }
    }

    #[test]
    fn unit_sized_ranges() {
        let (provider, session) = setup("String 1 String 2");
        let mut factory = RangeFactory::seeded(0);
        let mut build = |kind| factory.build(kind, &session, &provider).unwrap();
        assert_eq!(build(RangeKind::FirstCharacter), Range::new(0, 1).unwrap());
        assert_eq!(build(RangeKind::LastCharacter), Range::new(16, 17).unwrap());
        assert_eq!(build(RangeKind::MiddleCharacter), Range::new(8, 9).unwrap());
        assert_eq!(build(RangeKind::FirstUnit(TextUnit::Word)), Range::new(0, 7).unwrap());
        assert_eq!(build(RangeKind::FirstUnit(TextUnit::Page)), Range::new(0, 17).unwrap());
    }

    #[test]
    fn unit_sized_needs_text() {
        let (provider, session) = setup("");
        let err = unit_sized(RangeKind::FirstCharacter, &session, &provider).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn anchored_ranges() {
        let (_, session) = setup("123456789");
        let other = Range::new(3, 6).unwrap();
        let expect = [(0, 3), (3, 9), (0, 6), (6, 9)];
        for (anchor, (start, end)) in Anchor::ALL.into_iter().zip(expect) {
            assert_eq!(anchored(&session, anchor, &other).unwrap(), Range::new(start, end).unwrap());
        }
    }

    #[test]
    fn visible_union_spans_all_pieces() {
        let (mut provider, _) = setup("123456789");
        provider.hide(Range::new(3, 5).unwrap());
        assert_eq!(visible_union(&provider).unwrap(), Range::new(0, 9).unwrap());

        provider.set_visible(vec![Range::new(2, 3).unwrap(), Range::new(6, 7).unwrap()]);
        assert_eq!(visible_union(&provider).unwrap(), Range::new(2, 7).unwrap());

        provider.set_visible(Vec::new());
        assert!(visible_union(&provider).unwrap_err().is_configuration());
    }
}
