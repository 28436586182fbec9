//! Bin-range interval arithmetic and position range resolution.

use crate::error::{OpsError, OpsResult};
use crate::state::Position;

/// A closed interval of bin ids, `lower <= upper`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinRange {
    pub lower: i32,
    pub upper: i32,
}

impl BinRange {
    pub fn new(lower: i32, upper: i32) -> OpsResult<Self> {
        if lower > upper {
            return Err(OpsError::InvalidParameters(format!(
                "bin range lower {lower} exceeds upper {upper}"
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Symmetric range around the active bin
    pub fn around(active_id: i32, radius: i32) -> OpsResult<Self> {
        if radius < 0 {
            return Err(OpsError::InvalidParameters(format!(
                "negative bin range radius {radius}"
            )));
        }
        Ok(Self {
            lower: active_id.saturating_sub(radius),
            upper: active_id.saturating_add(radius),
        })
    }

    pub fn contains(&self, bin_id: i32) -> bool {
        bin_id >= self.lower && bin_id <= self.upper
    }

    pub fn overlaps(&self, other: &BinRange) -> bool {
        !(other.upper < self.lower || other.lower > self.upper)
    }

    /// Intersection of two ranges, `None` when disjoint
    pub fn intersect(&self, other: &BinRange) -> Option<BinRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(BinRange {
            lower: self.lower.max(other.lower),
            upper: self.upper.min(other.upper),
        })
    }
}

/// A position together with the sub-range of it that falls inside a query
#[derive(Clone, Copy, Debug)]
pub struct ClippedPosition {
    pub position: Position,
    pub range: BinRange,
}

/// Resolve which positions overlap `query`, clipping each to the query range.
///
/// Returns an empty vector when nothing overlaps; erroring on an empty result
/// is the caller's decision. Output order follows input order.
pub fn resolve(positions: &[Position], query: BinRange) -> Vec<ClippedPosition> {
    positions
        .iter()
        .filter_map(|position| {
            let occupied = BinRange {
                lower: position.lower_bin_id,
                upper: position.upper_bin_id,
            };
            query.intersect(&occupied).map(|range| ClippedPosition {
                position: *position,
                range,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey::Pubkey;

    fn position(lower: i32, upper: i32) -> Position {
        Position {
            address: Pubkey::new_unique(),
            pair: Pubkey::new_unique(),
            owner: Pubkey::new_unique(),
            position_mint: Pubkey::new_unique(),
            lower_bin_id: lower,
            upper_bin_id: upper,
        }
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(BinRange::new(5, 4).is_err());
        assert!(BinRange::new(5, 5).is_ok());
    }

    #[test]
    fn clips_overlapping_position_to_query() {
        // Query [activeId - 10, activeId + 10] with activeId = 100
        let query = BinRange::around(100, 10).unwrap();
        assert_eq!(query, BinRange { lower: 90, upper: 110 });

        let clipped = resolve(&[position(95, 115)], query);
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].range, BinRange { lower: 95, upper: 110 });
    }

    #[test]
    fn excludes_disjoint_position() {
        let query = BinRange::around(100, 10).unwrap();
        // upper 85 < query lower 90
        assert!(resolve(&[position(50, 85)], query).is_empty());
        // lower 111 > query upper 110
        assert!(resolve(&[position(111, 140)], query).is_empty());
    }

    #[test]
    fn keeps_single_bin_touching_boundary() {
        let query = BinRange::new(90, 110).unwrap();
        let clipped = resolve(&[position(110, 130)], query);
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].range, BinRange { lower: 110, upper: 110 });
    }

    #[test]
    fn empty_inputs_yield_empty_output() {
        let query = BinRange::new(0, 10).unwrap();
        assert!(resolve(&[], query).is_empty());
    }

    #[test]
    fn output_order_follows_input_order() {
        let query = BinRange::new(0, 100).unwrap();
        let a = position(10, 20);
        let b = position(-5, 5);
        let c = position(200, 300); // dropped
        let d = position(90, 150);

        let clipped = resolve(&[a, b, c, d], query);
        let addresses: Vec<_> = clipped.iter().map(|c| c.position.address).collect();
        assert_eq!(addresses, vec![a.address, b.address, d.address]);
        assert_eq!(clipped[1].range, BinRange { lower: 0, upper: 5 });
        assert_eq!(clipped[2].range, BinRange { lower: 90, upper: 100 });
    }
}
