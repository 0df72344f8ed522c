//! Hardware register layouts and C/C++ definitions generated from them.
//!
//! A register is described by a field spec, a whitespace-separated list of `NAME:BIT`,
//! `NAME:@COUNT` and `NAME:START:END` tokens:
//!
//! ```
//! use regdef::{render_masks, Address, CodegenOptions, Register};
//!
//! let mut syst = Register::from_spec("enable:0 tickint:1 clksource:2 _:@13 countflag:16", "SYST")?;
//! syst.set_field("clksource", 1)?;
//! assert_eq!(syst.value(), 0x4);
//!
//! let code = render_masks(&syst, &Address::Single(0x10), &CodegenOptions::default())?;
//! assert!(code.contains("constexpr uint32_t SYST_COUNTFLAG_POS = 16U;"));
//! # Ok::<(), regdef::Error>(())
//! ```
//!
//! Positions left out are inferred from the neighbouring fields, and bits no field covers become
//! reserved gap fields, so every register covers `0..n_bits` without holes.

#[cfg(test)]
#[macro_use]
extern crate quickcheck_macros;

pub mod doc;
mod error;
mod fill;
pub mod gen;
pub mod infer;
pub mod json;
mod position;
mod register;
mod reserved;
pub mod spec;
pub mod width;

pub use crate::error::{Error, Result};
pub use crate::fill::{fill_gaps, RESERVED_NAME};
pub use crate::gen::{
    render, render_masks, render_masks_with, render_struct, render_struct_with, Address,
    CodegenOptions, Dialect, Style,
};
pub use crate::position::Position;
pub use crate::register::{Field, Register};
pub use crate::reserved::{IsReserved, ReservedPattern};
