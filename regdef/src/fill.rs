use crate::position::Position;
use crate::register::Field;

/// Name given to the fields synthesized for uncovered bits.
pub const RESERVED_NAME: &str = "_";

/// Inserts a reserved field into every hole below and between `fields`.
///
/// `fields` must be ordered from bit 0 upward without overlaps, as returned by
/// [`infer`](crate::infer::infer). Afterwards the fields cover every bit from 0 to the highest one
/// exactly once.
pub fn fill_gaps(fields: Vec<Field>) -> Vec<Field> {
    let mut filled = Vec::with_capacity(fields.len());
    let mut next_bit = 0;
    for field in fields {
        let low = field.position.min();
        if low > next_bit {
            let gap = Position::span(next_bit, low - 1);
            log::debug!("reserving bits {gap} below field {}", field.name);
            filled.push(Field::new(RESERVED_NAME, gap));
        }
        // Fields ascend strictly, so nothing follows one ending at `u32::MAX`.
        next_bit = field.position.max().saturating_add(1);
        filled.push(field);
    }
    filled
}
