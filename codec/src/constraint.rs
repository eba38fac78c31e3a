//! Size constraints and the alignment rules that depend on them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{PerError, PerResult, Violation};

/// Upper bound below which a length is a constrained whole number.
pub(crate) const CONSTRAINED_LENGTH_LIMIT: usize = 65_536;

/// One permitted `[lower, upper]` item count.
///
/// `extended` marks a range that belongs to the extension part of the
/// constraint rather than the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SizeRange {
    pub lower: usize,
    pub upper: usize,
    pub extended: bool,
}

impl SizeRange {
    /// A root range.
    #[must_use]
    pub const fn new(lower: usize, upper: usize) -> Self {
        Self {
            lower,
            upper,
            extended: false,
        }
    }

    /// An extension range.
    #[must_use]
    pub const fn extension(lower: usize, upper: usize) -> Self {
        Self {
            lower,
            upper,
            extended: true,
        }
    }

    #[must_use]
    pub const fn contains(&self, size: usize) -> bool {
        self.lower <= size && size <= self.upper
    }

    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        self.lower == self.upper
    }

    /// Whether the range is small enough for a bit-field length.
    #[must_use]
    pub const fn is_constrained(&self) -> bool {
        self.upper < CONSTRAINED_LENGTH_LIMIT
    }
}

/// A union of permitted sizes with an optional extension marker.
///
/// A session holds at most one active constraint. The length codec takes
/// it, so it applies to exactly one length determinant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SizeConstraint {
    ranges: Vec<SizeRange>,
}

impl SizeConstraint {
    /// `SIZE(lower..upper)`.
    #[must_use]
    pub fn range(lower: usize, upper: usize) -> Self {
        Self {
            ranges: vec![SizeRange::new(lower, upper)],
        }
    }

    /// `SIZE(n)`.
    #[must_use]
    pub fn fixed(size: usize) -> Self {
        Self::range(size, size)
    }

    /// `SIZE(lower..upper, ...)`: any other size goes through the extension.
    #[must_use]
    pub fn extensible(lower: usize, upper: usize) -> Self {
        Self::range(lower, upper).with(SizeRange::extension(0, usize::MAX))
    }

    /// Appends a range to the union.
    #[must_use]
    pub fn with(mut self, range: SizeRange) -> Self {
        self.ranges.push(range);
        self
    }

    #[must_use]
    pub fn ranges(&self) -> &[SizeRange] {
        &self.ranges
    }

    /// Whether the constraint has an extension part.
    #[must_use]
    pub fn is_extensible(&self) -> bool {
        self.ranges.iter().any(|range| range.extended)
    }

    /// Whether only one size is permitted.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        !self.is_extensible() && self.select(false).is_some_and(|range| range.is_fixed())
    }

    /// The effective range of the root (`extension == false`) or extension
    /// part: the smallest lower and largest upper bound of its ranges.
    #[must_use]
    pub fn select(&self, extension: bool) -> Option<SizeRange> {
        self.ranges
            .iter()
            .filter(|range| range.extended == extension)
            .fold(None, |acc: Option<SizeRange>, range| {
                Some(acc.map_or(*range, |eff| SizeRange {
                    lower: eff.lower.min(range.lower),
                    upper: eff.upper.max(range.upper),
                    extended: extension,
                }))
            })
    }

    /// The effective range of the part that permits `size`, root first.
    #[must_use]
    pub fn check(&self, size: usize) -> Option<SizeRange> {
        [false, true].into_iter().find_map(|extension| {
            self.ranges
                .iter()
                .any(|range| range.extended == extension && range.contains(size))
                .then(|| self.select(extension))
                .flatten()
        })
    }

    /// Merges a newly declared constraint into this one.
    ///
    /// The existing constraint stays in force when the new one is at least
    /// as wide as one of its ranges at either end; otherwise the narrower
    /// declaration contradicts it.
    pub fn merge(&mut self, other: &Self) -> PerResult<()> {
        if self.ranges.is_empty() {
            self.ranges.clone_from(&other.ranges);
            return Ok(());
        }
        let widens = other.ranges.iter().any(|new| {
            self.ranges
                .iter()
                .any(|old| new.lower <= old.lower || new.upper >= old.upper)
        });
        if widens {
            Ok(())
        } else {
            let length = other.ranges.first().map_or(0, |range| range.lower);
            Err(PerError::ConstraintViolation(Violation::Size { length }))
        }
    }
}

/// Whether an octet or bit string needs alignment before its contents.
///
/// Counts above the threshold (16 bits, 2 octets) are always aligned;
/// fixed sizes at or below it never are; other sizes align unless the
/// selected range pins the length.
pub(crate) fn string_needs_alignment(
    constraint: Option<&SizeConstraint>,
    count: usize,
    bit_string: bool,
) -> PerResult<bool> {
    let threshold = if bit_string { 16 } else { 2 };
    let Some(constraint) = constraint else {
        return Ok(true);
    };
    if count > threshold {
        return Ok(true);
    }
    if constraint.is_fixed() {
        return Ok(false);
    }
    match constraint.check(count) {
        Some(range) => Ok(range.upper != range.lower || range.extended),
        None => Err(PerError::ConstraintViolation(Violation::Size {
            length: count,
        })),
    }
}

/// Whether a character string of `len` characters of `bits` each needs
/// alignment before its contents.
pub(crate) fn char_string_needs_alignment(
    constraint: Option<&SizeConstraint>,
    len: usize,
    bits: u8,
) -> bool {
    let mut align = len > 0;
    let extensible = constraint.is_some_and(SizeConstraint::is_extensible);
    let (lower, upper) = constraint
        .and_then(|c| c.check(len))
        .map_or((0, usize::MAX), |range| (range.lower, range.upper));

    if !extensible && upper < CONSTRAINED_LENGTH_LIMIT {
        let bit_range = upper * usize::from(bits);
        if upper == lower {
            if bit_range <= 16 {
                align = false;
            }
        } else if bit_range < 16 {
            align = false;
        }
    }
    align
}
