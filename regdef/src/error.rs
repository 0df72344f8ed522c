use snafu::Snafu;

use crate::position::Position;

/// Errors raised while building a register layout or generating code for it.
///
/// [`Error::MalformedFieldToken`] is the only recoverable variant: the spec parser collects it
/// next to the fields it did accept. Every other variant aborts the register it names.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("ignoring field {token:?}: {reason}"))]
    MalformedFieldToken { token: String, reason: String },

    #[snafu(display(
        "register {register}: value {value:#x} does not fit in {n_bits} bit(s)"
    ))]
    ValueOverflow {
        register: String,
        value: u64,
        n_bits: u32,
    },

    #[snafu(display(
        "register {register}: value {value:#x} does not fit in the {length}-bit field {field}"
    ))]
    FieldOverflow {
        register: String,
        field: String,
        value: u64,
        length: u32,
    },

    #[snafu(display("register {register}: field {field} has no bits"))]
    EmptyField { register: String, field: String },

    #[snafu(display(
        "register {register}: field {field} is {length} bit(s) long but its position {position} \
         covers {covered}"
    ))]
    FieldLengthMismatch {
        register: String,
        field: String,
        length: u32,
        position: Position,
        covered: u32,
    },

    #[snafu(display("register {register} has no field named {field}"))]
    UnknownField { register: String, field: String },

    #[snafu(display(
        "register {register}: {names} name(s), {lengths} length(s) and {positions} position(s) \
         were given"
    ))]
    InconsistentFieldCounts {
        register: String,
        names: usize,
        lengths: usize,
        positions: usize,
    },

    #[snafu(display(
        "register {register}: could not assume bit order, fields {first} and {second} both \
         start at bit {bit}"
    ))]
    AmbiguousBitOrder {
        register: String,
        first: String,
        second: String,
        bit: u32,
    },

    #[snafu(display(
        "register {register}: positions are neither increasing nor decreasing, field {before} \
         (bit {before_bit}) is followed by field {after} (bit {after_bit})"
    ))]
    NonMonotonicPositions {
        register: String,
        before: String,
        after: String,
        before_bit: u32,
        after_bit: u32,
    },

    #[snafu(display(
        "register {register}: cannot hold {n_bits} bit(s) in a {width}-bit integer"
    ))]
    WidthOverflow {
        register: String,
        n_bits: u32,
        width: u32,
    },

    #[snafu(display("unsupported integer width {width}, expected one of 8, 16, 32 or 64"))]
    UnsupportedWidth { width: u32 },

    #[snafu(display("register {register}: field {field} extends past the highest bit position"))]
    PositionOverflow { register: String, field: String },

    #[snafu(display("invalid reserved-name pattern {pattern:?}: {message}"))]
    InvalidReservedPattern { pattern: String, message: String },

    #[snafu(display("entry {entry:?}: {message}"))]
    Document { entry: String, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
