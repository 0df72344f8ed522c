use std::fmt::{self, Display, Formatter};

use snafu::ensure;

use crate::error::{
    EmptyFieldSnafu, FieldLengthMismatchSnafu, FieldOverflowSnafu, InconsistentFieldCountsSnafu,
    PositionOverflowSnafu, Result, UnknownFieldSnafu, ValueOverflowSnafu,
};
use crate::fill::{fill_gaps, RESERVED_NAME};
use crate::infer::{canonicalize, infer};
use crate::position::Position;
use crate::spec;

/// A named or reserved group of contiguous bits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub position: Position,
}

impl Field {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    pub fn length(&self) -> u32 {
        self.position.len()
    }

    /// The lowest bit of the field.
    pub fn offset(&self) -> u32 {
        self.position.min()
    }

    /// The field's bits, not shifted into position.
    pub fn value_mask(&self) -> u64 {
        low_bits(self.length())
    }
}

fn low_bits(n: u32) -> u64 {
    if n >= 64 {
        u64::MAX
    } else {
        (1 << n) - 1
    }
}

fn shl(value: u64, by: u32) -> u64 {
    value.checked_shl(by).unwrap_or(0)
}

fn shr(value: u64, by: u32) -> u64 {
    value.checked_shr(by).unwrap_or(0)
}

/// Sums field lengths, failing on the first field that takes the total past `u32::MAX`.
fn total_bits<'a>(
    register: &str,
    fields: impl IntoIterator<Item = (&'a str, &'a u32)>,
) -> Result<u32> {
    fields.into_iter().try_fold(0u32, |total, (field, &length)| {
        total.checked_add(length).ok_or_else(|| {
            PositionOverflowSnafu {
                register,
                field,
            }
            .build()
        })
    })
}

fn fits(value: u64, n_bits: u32) -> bool {
    n_bits >= 64 || value >> n_bits == 0
}

/// A register layout and its current value.
///
/// The fields are ordered from bit 0 upward and cover every bit of the register exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Register {
    name: String,
    fields: Vec<Field>,
    value: u64,
}

impl Register {
    /// Builds a register from parallel lists of field names, lengths and positions.
    ///
    /// Without positions, the fields are read as they would be drawn: from the most significant
    /// bit downward. Positions that leave holes get reserved fields, like a parsed spec does.
    pub fn new(
        name: impl Into<String>,
        names: Vec<String>,
        lengths: Vec<u32>,
        positions: Option<Vec<Position>>,
        value: u64,
    ) -> Result<Self> {
        let name = name.into();
        let n_positions = positions.as_ref().map_or(names.len(), Vec::len);
        ensure!(
            names.len() == lengths.len() && names.len() == n_positions,
            InconsistentFieldCountsSnafu {
                register: &name,
                names: names.len(),
                lengths: lengths.len(),
                positions: n_positions,
            }
        );
        if let Some(field) = names.iter().zip(&lengths).find(|(_, length)| **length == 0) {
            return EmptyFieldSnafu {
                register: &name,
                field: field.0,
            }
            .fail();
        }

        let fields = match positions {
            Some(positions) => {
                let mut fields = Vec::with_capacity(names.len());
                for ((field, length), position) in names.into_iter().zip(lengths).zip(positions) {
                    ensure!(
                        length == position.len(),
                        FieldLengthMismatchSnafu {
                            register: &name,
                            field,
                            length,
                            position,
                            covered: position.len(),
                        }
                    );
                    fields.push(Field::new(field, position));
                }
                fill_gaps(canonicalize(&name, fields)?)
            }
            None => {
                let mut next_high = total_bits(&name, names.iter().map(String::as_str).zip(&lengths))?;
                let mut fields: Vec<_> = names
                    .into_iter()
                    .zip(lengths)
                    .map(|(field, length)| {
                        next_high -= length;
                        Field::new(field, Position::span(next_high, next_high + length - 1))
                    })
                    .collect();
                fields.reverse();
                fields
            }
        };
        Self::from_fields(name, fields, value)
    }

    /// Builds a register around `value`, one anonymous bit per field unless told otherwise.
    ///
    /// The default width is the number of whole bytes needed to hold `value`.
    pub fn from_value(
        name: impl Into<String>,
        value: u64,
        names: Option<Vec<String>>,
        lengths: Option<Vec<u32>>,
    ) -> Result<Self> {
        let lengths = lengths.unwrap_or_else(|| {
            let n_bytes = match value.checked_ilog2() {
                Some(log2) => log2 / 8 + 1,
                None => 1,
            };
            vec![1; n_bytes as usize * 8]
        });
        let names = names.unwrap_or_else(|| vec![RESERVED_NAME.to_string(); lengths.len()]);
        Self::new(name, names, lengths, None, value)
    }

    /// Builds a register from a field spec such as `"Reserved:31:17 COUNTFLAG:@1 ENABLE:0"`.
    ///
    /// Malformed tokens are logged and skipped; see [`spec`](crate::spec) for the syntax.
    pub fn from_spec(spec: &str, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let parsed = spec::parse(spec);
        let fields = fill_gaps(infer(&name, parsed.fields)?);
        Self::from_fields(name, fields, 0)
    }

    fn from_fields(name: String, fields: Vec<Field>, value: u64) -> Result<Self> {
        // The fields are contiguous from bit 0, so the register holds one bit past the last one.
        if let Some(last) = fields.last() {
            ensure!(
                last.position.max() < u32::MAX,
                PositionOverflowSnafu {
                    register: &name,
                    field: &last.name,
                }
            );
        }
        let register = Self {
            name,
            fields,
            value: 0,
        };
        register.check_value(value)?;
        Ok(Self { value, ..register })
    }

    fn check_value(&self, value: u64) -> Result<()> {
        let n_bits = self.n_bits();
        ensure!(
            fits(value, n_bits),
            ValueOverflowSnafu {
                register: &self.name,
                value,
                n_bits,
            }
        );
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fields from bit 0 upward, including reserved ones.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn n_bits(&self) -> u32 {
        self.fields.iter().map(Field::length).sum()
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn set(&mut self, value: u64) -> Result<()> {
        self.check_value(value)?;
        self.value = value;
        Ok(())
    }

    /// Finds the lowest field with the given name.
    pub fn field(&self, name: &str) -> Result<&Field> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .ok_or_else(|| {
                UnknownFieldSnafu {
                    register: &self.name,
                    field: name,
                }
                .build()
            })
    }

    /// Extracts a field from the current value.
    pub fn get(&self, name: &str) -> Result<u64> {
        let field = self.field(name)?;
        Ok(shr(self.value, field.offset()) & field.value_mask())
    }

    /// Replaces a field in the current value.
    pub fn set_field(&mut self, name: &str, value: u64) -> Result<()> {
        self.value = self.insert(self.value, name, value)?;
        Ok(())
    }

    /// Packs `(field, value)` pairs into a raw register value. Unlisted fields are zero.
    pub fn raw_from<'a>(&self, values: impl IntoIterator<Item = (&'a str, u64)>) -> Result<u64> {
        values
            .into_iter()
            .try_fold(0, |raw, (name, value)| self.insert(raw, name, value))
    }

    fn insert(&self, raw: u64, name: &str, value: u64) -> Result<u64> {
        let field = self.field(name)?;
        let offset = field.offset();
        ensure!(
            fits(value, field.length()) && fits(value, 64 - offset.min(64)),
            FieldOverflowSnafu {
                register: &self.name,
                field: name,
                value,
                length: field.length(),
            }
        );
        let mask = shl(field.value_mask(), offset);
        Ok((raw & !mask) | shl(value, offset))
    }

    /// The value in hex, zero-padded to the register width.
    pub fn hex(&self) -> String {
        let digits = self.n_bits().div_ceil(4) as usize;
        format!("0x{:0digits$x}", self.value)
    }

    /// The value in binary, zero-padded to the register width.
    pub fn bin(&self) -> String {
        let digits = self.n_bits() as usize;
        format!("0b{:0digits$b}", self.value)
    }
}

/// `{}` gives a one-line summary; `{:#}` lists every field with its bits.
impl Display for Register {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if !f.alternate() {
            return write!(
                f,
                "Register({}-bit, {}: {})",
                self.n_bits(),
                self.name,
                self.hex()
            );
        }

        writeln!(f, "Register({}-bit, {}):", self.n_bits(), self.name)?;
        let name_width = self.fields.iter().map(|field| field.name.len()).max();
        let name_width = name_width.unwrap_or(0);
        for field in &self.fields {
            let bits = shr(self.value, field.offset()) & field.value_mask();
            writeln!(
                f,
                "  {:>5} {:>3} │ {:name_width$}: {:0length$b}",
                field.position,
                format!("#{}", field.length()),
                field.name,
                bits,
                length = field.length() as usize,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::TestResult;

    use super::*;
    use crate::error::Error;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn layout(register: &Register) -> Vec<(&str, Position)> {
        register
            .fields()
            .iter()
            .map(|field| (field.name.as_str(), field.position))
            .collect()
    }

    #[test]
    fn from_spec_purely_ascending() {
        let register = Register::from_spec("A:0 B:1 C:2", "R").unwrap();
        assert_eq!(
            layout(&register),
            [
                ("A", Position::Single(0)),
                ("B", Position::Single(1)),
                ("C", Position::Single(2)),
            ],
        );
        assert_eq!(register.n_bits(), 3);
    }

    #[test]
    fn from_spec_descending_ranges() {
        let register = Register::from_spec("X:7:4 Y:3:0", "R").unwrap();
        assert_eq!(
            layout(&register),
            [
                ("Y", Position::Range { low: 0, high: 3 }),
                ("X", Position::Range { low: 4, high: 7 }),
            ],
        );
        assert_eq!(register.n_bits(), 8);
    }

    #[test]
    fn from_spec_fills_gaps() {
        let register = Register::from_spec(
            "reserved:11 lock_gconf:10 shaft2:9 shaft1:8 test_mode:7 reserved:6:4 \
             poscmp_enable:3 reserved:2:0",
            "GCONF",
        )
        .unwrap();
        assert_eq!(register.n_bits(), 12);
        assert_eq!(
            layout(&register)[..3],
            [
                ("reserved", Position::Range { low: 0, high: 2 }),
                ("poscmp_enable", Position::Single(3)),
                ("reserved", Position::Range { low: 4, high: 6 }),
            ],
        );

        let register = Register::from_spec("a:7 b:2", "R").unwrap();
        assert_eq!(
            layout(&register),
            [
                ("_", Position::Range { low: 0, high: 1 }),
                ("b", Position::Single(2)),
                ("_", Position::Range { low: 3, high: 6 }),
                ("a", Position::Single(7)),
            ],
        );
    }

    #[test]
    fn from_spec_skips_malformed_tokens() {
        let register = Register::from_spec("A:0 bogus B:1 C:1:2:3 D:2", "R").unwrap();
        assert_eq!(
            layout(&register),
            [
                ("A", Position::Single(0)),
                ("B", Position::Single(1)),
                ("D", Position::Single(2)),
            ],
        );
        assert_eq!(
            register.field("C"),
            Err(Error::UnknownField {
                register: "R".to_string(),
                field: "C".to_string(),
            }),
        );
    }

    #[test]
    fn positions_past_the_last_bit() {
        let overflow = |field: &str| {
            Err(Error::PositionOverflow {
                register: "R".to_string(),
                field: field.to_string(),
            })
        };
        assert_eq!(Register::from_spec("A:4294967295 B:@1", "R"), overflow("B"));
        assert_eq!(Register::from_spec("A:@4294967295 B:@1", "R"), overflow("B"));
        assert_eq!(Register::from_spec("A:4294967295", "R"), overflow("A"));
        assert_eq!(
            Register::new("R", names(&["A", "B"]), vec![u32::MAX, 1], None, 0),
            overflow("B"),
        );
    }

    #[test]
    fn value_overflow() {
        let spec = "A:0 B:1 C:2 D:3 E:4 F:5 G:6 H:7";
        let mut register = Register::from_spec(spec, "R").unwrap();
        assert_eq!(register.set(255), Ok(()));
        assert_eq!(
            register.set(256),
            Err(Error::ValueOverflow {
                register: "R".to_string(),
                value: 256,
                n_bits: 8,
            }),
        );
        assert_eq!(register.value(), 255);

        let result = Register::new("R", names(&["a"]), vec![8], None, 256);
        assert!(matches!(result, Err(Error::ValueOverflow { .. })));
    }

    #[test]
    fn inconsistent_counts() {
        let result = Register::new("R", names(&["a", "b"]), vec![1], None, 0);
        assert_eq!(
            result,
            Err(Error::InconsistentFieldCounts {
                register: "R".to_string(),
                names: 2,
                lengths: 1,
                positions: 2,
            }),
        );
        let result = Register::new(
            "R",
            names(&["a", "b"]),
            vec![1, 1],
            Some(vec![Position::Single(0)]),
            0,
        );
        assert!(matches!(result, Err(Error::InconsistentFieldCounts { positions: 1, .. })));
    }

    #[test]
    fn new_without_positions_reads_msb_first() {
        let register = Register::new("R", names(&["hi", "lo"]), vec![3, 5], None, 0b101_00001)
            .unwrap();
        assert_eq!(
            layout(&register),
            [
                ("lo", Position::Range { low: 0, high: 4 }),
                ("hi", Position::Range { low: 5, high: 7 }),
            ],
        );
        assert_eq!(register.get("hi"), Ok(0b101));
        assert_eq!(register.get("lo"), Ok(0b00001));
    }

    #[test]
    fn new_with_positions_checks_lengths() {
        let result = Register::new(
            "R",
            names(&["a"]),
            vec![2],
            Some(vec![Position::Range { low: 0, high: 3 }]),
            0,
        );
        assert!(matches!(result, Err(Error::FieldLengthMismatch { covered: 4, .. })));

        let register = Register::new(
            "R",
            names(&["a", "b"]),
            vec![1, 2],
            Some(vec![Position::Single(1), Position::Range { low: 4, high: 5 }]),
            0,
        )
        .unwrap();
        assert_eq!(register.n_bits(), 6);
        assert_eq!(register.fields().len(), 4);
    }

    #[test]
    fn from_value_defaults() {
        let register = Register::from_value("R", 0x1ff, None, None).unwrap();
        assert_eq!(register.n_bits(), 16);
        assert!(register.fields().iter().all(|field| field.name == "_"));
        assert_eq!(Register::from_value("R", 0, None, None).unwrap().n_bits(), 8);
        assert_eq!(Register::from_value("R", 0xff, None, None).unwrap().n_bits(), 8);
    }

    #[test]
    fn field_access() {
        let mut register = Register::from_spec("toff:3:0 hstrt:6:4 hend:10:7", "CHOPCONF").unwrap();
        register.set_field("hstrt", 4).unwrap();
        register.set_field("toff", 5).unwrap();
        register.set_field("hend", 1).unwrap();
        assert_eq!(register.value(), 0xc5);
        assert_eq!(register.get("hstrt"), Ok(4));
        assert_eq!(
            register.set_field("toff", 16),
            Err(Error::FieldOverflow {
                register: "CHOPCONF".to_string(),
                field: "toff".to_string(),
                value: 16,
                length: 4,
            }),
        );
        assert!(matches!(register.get("tbl"), Err(Error::UnknownField { .. })));
        assert_eq!(
            register.raw_from([("toff", 5), ("hstrt", 4), ("hend", 1)]),
            Ok(0xc5),
        );
    }

    #[test]
    fn hex_and_bin() {
        let mut register = Register::from_spec("a:@4 b:@8", "R").unwrap();
        register.set(0x1a).unwrap();
        assert_eq!(register.hex(), "0x01a");
        assert_eq!(register.bin(), "0b000000011010");
        assert_eq!(register.to_string(), "Register(12-bit, R: 0x01a)");
    }

    #[test]
    fn long_display() {
        let mut register = Register::from_spec("ENABLE:0 TICKINT:1 CLKSOURCE:2 count:7:4", "CTRL")
            .unwrap();
        register.set(0b0110_0101).unwrap();
        assert_eq!(
            format!("{register:#}"),
            "Register(8-bit, CTRL):\n\
             \x20   0:0  #1 │ ENABLE   : 1\n\
             \x20   1:1  #1 │ TICKINT  : 0\n\
             \x20   2:2  #1 │ CLKSOURCE: 1\n\
             \x20   3:3  #1 │ _        : 0\n\
             \x20   7:4  #4 │ count    : 0110\n",
        );
    }

    #[quickcheck]
    fn raw_round_trip(lengths: Vec<u8>, values: Vec<u64>) -> TestResult {
        let lengths: Vec<u32> = lengths.iter().map(|&n| u32::from(n % 8) + 1).collect();
        if lengths.is_empty() || lengths.iter().sum::<u32>() > 64 {
            return TestResult::discard();
        }
        let spec: Vec<String> = lengths
            .iter()
            .enumerate()
            .map(|(index, length)| format!("f{index}:@{length}"))
            .collect();
        let register = Register::from_spec(&spec.join(" "), "R").unwrap();

        let names: Vec<String> = (0..lengths.len()).map(|index| format!("f{index}")).collect();
        let field_values: Vec<(&str, u64)> = names
            .iter()
            .zip(&lengths)
            .zip(values.iter().chain(std::iter::repeat(&0)))
            .map(|((name, &length), &value)| (name.as_str(), value & low_bits(length)))
            .collect();

        let mut register = register;
        let raw = register.raw_from(field_values.iter().copied()).unwrap();
        register.set(raw).unwrap();
        TestResult::from_bool(
            field_values
                .iter()
                .all(|&(name, value)| register.get(name) == Ok(value)),
        )
    }

    /// Writes ascending fields, then the same fields top-down with reversed ranges, and expects
    /// one layout.
    #[quickcheck]
    fn order_invariance(lengths: Vec<u8>, elide: Vec<bool>) -> TestResult {
        let lengths: Vec<u32> = lengths.iter().map(|&n| u32::from(n % 6) + 1).collect();
        if lengths.len() < 2 {
            return TestResult::discard();
        }
        let mut ascending = Vec::new();
        let mut low = 0;
        for (index, &length) in lengths.iter().enumerate() {
            let high = low + length - 1;
            let inner = index != 0 && index != lengths.len() - 1;
            let elided = inner && elide.get(index).copied().unwrap_or(false);
            ascending.push(match (elided, length) {
                (true, _) => (format!("f{index}:@{length}"), format!("f{index}:@{length}")),
                (false, 1) => (format!("f{index}:{low}"), format!("f{index}:{low}")),
                (false, _) => (
                    format!("f{index}:{low}:{high}"),
                    format!("f{index}:{high}:{low}"),
                ),
            });
            low = high + 1;
        }
        let forward: Vec<&str> = ascending.iter().map(|(up, _)| up.as_str()).collect();
        let backward: Vec<&str> = ascending.iter().rev().map(|(_, down)| down.as_str()).collect();

        let forward = Register::from_spec(&forward.join(" "), "R").unwrap();
        let backward = Register::from_spec(&backward.join(" "), "R").unwrap();
        TestResult::from_bool(forward.fields() == backward.fields())
    }
}
