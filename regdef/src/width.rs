use snafu::ensure;

use crate::error::{Result, UnsupportedWidthSnafu, WidthOverflowSnafu};

/// Widths of the `stdint.h` types a register value can be stored in.
pub const STANDARD_WIDTHS: [u32; 4] = [8, 16, 32, 64];

/// The integer type generated code stores a register value in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegerType {
    pub name: String,
    pub width: u32,
}

impl IntegerType {
    pub fn for_width(width: u32) -> Self {
        Self {
            name: format!("uint{width}_t"),
            width,
        }
    }
}

/// Picks the narrowest standard width holding `n_bits`.
pub fn select(register: &str, n_bits: u32) -> Result<u32> {
    match STANDARD_WIDTHS.iter().copied().find(|&width| width >= n_bits) {
        Some(width) => Ok(width),
        None => WidthOverflowSnafu {
            register,
            n_bits,
            width: STANDARD_WIDTHS[STANDARD_WIDTHS.len() - 1],
        }
        .fail(),
    }
}

/// Checks an explicitly requested width.
pub fn check_override(register: &str, n_bits: u32, width: u32) -> Result<u32> {
    ensure!(
        STANDARD_WIDTHS.binary_search(&width).is_ok(),
        UnsupportedWidthSnafu { width }
    );
    ensure!(
        width >= n_bits,
        WidthOverflowSnafu {
            register,
            n_bits,
            width,
        }
    );
    Ok(width)
}

/// Resolves the integer type for a register of `n_bits`.
///
/// A type name wins over a width. A type name is used verbatim; when it spells out its width (as
/// in `uint16_t` or `uint_fast32_t`) that width must hold the register.
pub fn resolve(
    register: &str,
    n_bits: u32,
    type_name: Option<&str>,
    width: Option<u32>,
) -> Result<IntegerType> {
    if let Some(name) = type_name {
        let width = match declared_width(name) {
            Some(width) => {
                ensure!(
                    width >= n_bits,
                    WidthOverflowSnafu {
                        register,
                        n_bits,
                        width,
                    }
                );
                width
            }
            None => select(register, n_bits).unwrap_or(n_bits),
        };
        return Ok(IntegerType {
            name: name.to_string(),
            width,
        });
    }

    let width = match width {
        Some(width) => check_override(register, n_bits, width)?,
        None => select(register, n_bits)?,
    };
    Ok(IntegerType::for_width(width))
}

/// Reads the width out of `uintN_t`, `uint_fastN_t` and `uint_leastN_t`.
fn declared_width(type_name: &str) -> Option<u32> {
    let digits = type_name
        .strip_prefix("uint")?
        .strip_suffix("_t")?
        .trim_start_matches("_fast")
        .trim_start_matches("_least");
    digits.parse().ok()
}
