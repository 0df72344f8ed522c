use std::fmt::{self, Display, Formatter};

/// The bits a field occupies, counted from the least significant bit.
///
/// A one-bit field is always a [`Position::Single`]; a [`Position::Range`] has `low < high`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    Single(u32),
    Range { low: u32, high: u32 },
}

impl Position {
    /// Builds the position covering `a..=b` or `b..=a`, whichever is ordered.
    pub fn span(a: u32, b: u32) -> Self {
        match a.cmp(&b) {
            std::cmp::Ordering::Equal => Self::Single(a),
            std::cmp::Ordering::Less => Self::Range { low: a, high: b },
            std::cmp::Ordering::Greater => Self::Range { low: b, high: a },
        }
    }

    /// Builds the position of a `length`-bit field whose lowest bit is `low`, or `None` when the
    /// field would reach past `u32::MAX`.
    pub fn starting_at(low: u32, length: u32) -> Option<Self> {
        debug_assert!(length > 0);
        let high = low.checked_add(length - 1)?;
        Some(Self::span(low, high))
    }

    pub fn min(self) -> u32 {
        match self {
            Self::Single(bit) => bit,
            Self::Range { low, .. } => low,
        }
    }

    pub fn max(self) -> u32 {
        match self {
            Self::Single(bit) => bit,
            Self::Range { high, .. } => high,
        }
    }

    /// Saturates at `u32::MAX` for the single range spanning every bit.
    pub fn len(self) -> u32 {
        (self.max() - self.min()).saturating_add(1)
    }

    pub fn contains(self, bit: u32) -> bool {
        (self.min()..=self.max()).contains(&bit)
    }
}

/// Formats as `high:low`, the way datasheets list bit ranges.
impl Display for Position {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(&format!("{}:{}", self.max(), self.min()))
    }
}

#[cfg(test)]
mod tests {
    use super::Position;

    #[test]
    fn span_orders_endpoints() {
        assert_eq!(Position::span(7, 4), Position::Range { low: 4, high: 7 });
        assert_eq!(Position::span(4, 7), Position::Range { low: 4, high: 7 });
        assert_eq!(Position::span(3, 3), Position::Single(3));
    }

    #[test]
    fn starting_at() {
        assert_eq!(Position::starting_at(0, 1), Some(Position::Single(0)));
        assert_eq!(
            Position::starting_at(3, 13),
            Some(Position::Range { low: 3, high: 15 }),
        );
        assert_eq!(Position::starting_at(3, 13).map(Position::len), Some(13));
        assert_eq!(Position::starting_at(u32::MAX, 1), Some(Position::Single(u32::MAX)));
        assert_eq!(Position::starting_at(u32::MAX, 2), None);
        assert_eq!(Position::starting_at(1, u32::MAX), None);
    }

    #[test]
    fn len_saturates() {
        let everything = Position::Range {
            low: 0,
            high: u32::MAX,
        };
        assert_eq!(everything.len(), u32::MAX);
    }

    #[test]
    fn contains() {
        let range = Position::Range { low: 4, high: 7 };
        assert!(range.contains(4));
        assert!(range.contains(7));
        assert!(!range.contains(3));
        assert!(!range.contains(8));
        assert!(Position::Single(0).contains(0));
        assert!(!Position::Single(0).contains(1));
    }

    #[test]
    fn display_pads() {
        assert_eq!(format!("{:>7}", Position::Range { low: 17, high: 31 }), "  31:17");
        assert_eq!(format!("{}", Position::Single(0)), "0:0");
    }
}
