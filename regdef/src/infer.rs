//! Resolves the positions of parsed fields.
//!
//! The author may list fields from the least significant bit upward or from the most significant
//! bit downward, and may leave most positions out. The order is decided by the first two explicit
//! positions; every missing position is then packed right after its predecessor.

use std::cmp::Ordering;

use crate::error::{
    AmbiguousBitOrderSnafu, NonMonotonicPositionsSnafu, PositionOverflowSnafu, Result,
};
use crate::position::Position;
use crate::register::Field;
use crate::spec::FieldSpec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitOrder {
    /// Fields are listed starting from bit 0.
    Ascending,
    /// Fields are listed starting from the most significant bit.
    Descending,
}

/// Decides the order the fields were written in.
///
/// With fewer than two explicit positions the fields are assumed to ascend from bit 0. Otherwise
/// only the lowest bits of the first two explicit positions are compared.
pub fn bit_order(register: &str, specs: &[FieldSpec]) -> Result<BitOrder> {
    let mut explicit = specs
        .iter()
        .filter_map(|spec| spec.position.map(|position| (spec, position.min())));
    let (Some((first, first_bit)), Some((second, second_bit))) =
        (explicit.next(), explicit.next())
    else {
        return Ok(BitOrder::Ascending);
    };
    match first_bit.cmp(&second_bit) {
        Ordering::Less => Ok(BitOrder::Ascending),
        Ordering::Greater => Ok(BitOrder::Descending),
        Ordering::Equal => AmbiguousBitOrderSnafu {
            register,
            first: &first.name,
            second: &second.name,
            bit: first_bit,
        }
        .fail(),
    }
}

/// Turns parsed fields into positioned fields ordered from bit 0 upward.
///
/// The result is contiguous only where the author made it so; gaps are left to
/// [`fill_gaps`](crate::fill::fill_gaps).
pub fn infer(register: &str, mut specs: Vec<FieldSpec>) -> Result<Vec<Field>> {
    let order = bit_order(register, &specs)?;
    log::debug!("register {register}: fields are listed in {order:?} order");
    if order == BitOrder::Descending {
        specs.reverse();
    }

    let mut fields: Vec<Field> = Vec::with_capacity(specs.len());
    for spec in specs {
        let position = match spec.position {
            Some(position) => Position::span(position.min(), position.max()),
            None => fields
                .last()
                .map_or(Some(0), |prev| prev.position.max().checked_add(1))
                .and_then(|low| Position::starting_at(low, spec.length))
                .ok_or_else(|| {
                    PositionOverflowSnafu {
                        register,
                        field: &spec.name,
                    }
                    .build()
                })?,
        };
        fields.push(Field::new(spec.name, position));
    }

    canonicalize(register, fields)
}

/// Checks that the fields' endpoints form one strictly monotonic sequence and returns the fields
/// ordered from bit 0 upward.
pub fn canonicalize(register: &str, mut fields: Vec<Field>) -> Result<Vec<Field>> {
    match first_violation(&fields, BitOrder::Ascending) {
        None => Ok(fields),
        Some(violation) => {
            if first_violation(&fields, BitOrder::Descending).is_none() {
                fields.reverse();
                return Ok(fields);
            }
            let (before, after) = violation;
            NonMonotonicPositionsSnafu {
                register,
                before: &fields[before.0].name,
                after: &fields[after.0].name,
                before_bit: before.1,
                after_bit: after.1,
            }
            .fail()
        }
    }
}

type Endpoint = (usize, u32);

/// Finds the first pair of consecutive endpoints that breaks `order`, as (field index, bit).
fn first_violation(fields: &[Field], order: BitOrder) -> Option<(Endpoint, Endpoint)> {
    let endpoints: Vec<Endpoint> = fields
        .iter()
        .enumerate()
        .flat_map(|(index, field)| {
            let (first, last) = match order {
                BitOrder::Ascending => (field.position.min(), field.position.max()),
                BitOrder::Descending => (field.position.max(), field.position.min()),
            };
            let last = (first != last).then_some((index, last));
            std::iter::once((index, first)).chain(last)
        })
        .collect();

    endpoints
        .windows(2)
        .find(|pair| match order {
            BitOrder::Ascending => pair[0].1 >= pair[1].1,
            BitOrder::Descending => pair[0].1 <= pair[1].1,
        })
        .map(|pair| (pair[0], pair[1]))
}
