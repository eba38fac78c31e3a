//! OBJECT IDENTIFIER values.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::diag::{log_err, log_fail};
use crate::error::{OidReason, PerError, PerResult};
use crate::length::LengthDeterminant;
use crate::session::Session;

/// Maximum number of arcs in an object identifier.
pub const MAX_OID_ARCS: usize = 128;

/// A validated object identifier.
///
/// Always has 2 to [`MAX_OID_ARCS`] arcs, a first arc of 0, 1 or 2, and a
/// second arc below 40 unless the first is 2.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<u32>", into = "Vec<u32>"))]
pub struct ObjectIdentifier {
    arcs: Vec<u32>,
}

impl ObjectIdentifier {
    /// Validates `arcs`.
    ///
    /// # Errors
    ///
    /// [`PerError::InvalidObjectId`] naming the broken rule.
    pub fn new(arcs: impl Into<Vec<u32>>) -> PerResult<Self> {
        let arcs = arcs.into();
        let count = arcs.len();
        if count < 2 {
            return Err(PerError::InvalidObjectId(OidReason::TooFewArcs { count }));
        }
        if count > MAX_OID_ARCS {
            return Err(PerError::InvalidObjectId(OidReason::TooManyArcs { count }));
        }
        let (first, second) = (arcs[0], arcs[1]);
        if first > 2 {
            return Err(PerError::InvalidObjectId(OidReason::FirstArc { arc: first }));
        }
        if first < 2 && second > 39 {
            return Err(PerError::InvalidObjectId(OidReason::SecondArc { arc: second }));
        }
        merge_arcs(first, second)?;
        Ok(Self { arcs })
    }

    #[must_use]
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Content octets: the merged first sub-identifier `arc0 * 40 + arc1`,
    /// then each remaining arc, all base 128 with continuation bits.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.arcs.len() + 4);
        // Validated on construction.
        let merged = self.arcs[0] * 40 + self.arcs[1];
        push_sub_identifier(&mut out, merged);
        for &arc in &self.arcs[2..] {
            push_sub_identifier(&mut out, arc);
        }
        out
    }

    /// Parses content octets back into arcs.
    ///
    /// # Errors
    ///
    /// [`PerError::InvalidObjectId`] for truncated or oversized
    /// sub-identifiers and for too many arcs.
    pub fn from_contents(contents: &[u8]) -> PerResult<Self> {
        let mut arcs = Vec::new();
        let mut octets = contents.iter();
        while octets.len() > 0 {
            let mut value = 0u32;
            loop {
                let Some(&octet) = octets.next() else {
                    return Err(PerError::InvalidObjectId(OidReason::Truncated));
                };
                value = value
                    .checked_mul(128)
                    .and_then(|v| v.checked_add(u32::from(octet & 0x7F)))
                    .ok_or(PerError::InvalidObjectId(OidReason::ArcOverflow))?;
                if octet & 0x80 == 0 {
                    break;
                }
            }
            if arcs.is_empty() {
                let first = (value / 40).min(2);
                arcs.push(first);
                arcs.push(value - 40 * first);
            } else {
                arcs.push(value);
            }
            if arcs.len() > MAX_OID_ARCS {
                return Err(PerError::InvalidObjectId(OidReason::TooManyArcs {
                    count: arcs.len(),
                }));
            }
        }
        Self::new(arcs)
    }
}

fn merge_arcs(first: u32, second: u32) -> PerResult<u32> {
    (first * 40)
        .checked_add(second)
        .ok_or(PerError::InvalidObjectId(OidReason::ArcOverflow))
}

fn push_sub_identifier(out: &mut Vec<u8>, value: u32) {
    let groups = (u32::BITS - value.leading_zeros()).div_ceil(7).max(1);
    for shift in (0..groups).rev() {
        let mut octet = ((value >> (7 * shift)) & 0x7F) as u8;
        if shift != 0 {
            octet |= 0x80;
        }
        out.push(octet);
    }
}

impl TryFrom<Vec<u32>> for ObjectIdentifier {
    type Error = PerError;

    fn try_from(arcs: Vec<u32>) -> PerResult<Self> {
        Self::new(arcs)
    }
}

impl From<ObjectIdentifier> for Vec<u32> {
    fn from(oid: ObjectIdentifier) -> Self {
        oid.arcs
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.arcs.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{arc}")?;
        }
        Ok(())
    }
}

/// Parses dotted notation such as `0.0.8.2250.0.4`.
impl FromStr for ObjectIdentifier {
    type Err = PerError;

    fn from_str(s: &str) -> PerResult<Self> {
        let arcs = s
            .split('.')
            .map(|arc| arc.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| PerError::InvalidFormat("object identifier arc is not a number"))?;
        Self::new(arcs)
    }
}

impl Session<'_> {
    /// Encodes an object identifier: an unconstrained length, then its
    /// content octets. A pending size constraint is discarded.
    pub fn encode_object_identifier(&mut self, oid: &ObjectIdentifier) -> PerResult<()> {
        let contents = oid.contents();
        self.size_constraint = None;
        log_err!(self, self.encode_length(contents.len()));
        self.buffer.align();
        log_err!(self, self.buffer.write_octets(&contents, contents.len() * 8));
        Ok(())
    }

    pub fn decode_object_identifier(&mut self) -> PerResult<ObjectIdentifier> {
        self.size_constraint = None;
        let length = match log_err!(self, self.decode_length()) {
            LengthDeterminant::Complete(n) => n,
            LengthDeterminant::Fragment(n) => log_fail!(
                self,
                PerError::InvalidLength {
                    length: n,
                    reason: "object identifier cannot be fragmented",
                }
            ),
        };
        self.buffer.align();
        log_err!(self, self.buffer.ensure_readable(length * 8));
        let mut contents = vec![0u8; length];
        log_err!(self, self.buffer.read_octets(&mut contents, length * 8));
        Ok(log_err!(self, ObjectIdentifier::from_contents(&contents)))
    }
}
