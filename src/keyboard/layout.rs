//! Key grids for row/column matrix keyboards.

use crate::error::Error;

/// Immutable description of a matrix keyboard: grid size, the value
/// reported when no key is resolved, and the keys in row-major order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardLayout {
    pub num_rows: u8,
    pub num_cols: u8,
    pub null_key: char,
    pub keys: &'static [char],
}

impl KeyboardLayout {
    pub const fn new(num_rows: u8, num_cols: u8, null_key: char, keys: &'static [char]) -> Self {
        Self {
            num_rows,
            num_cols,
            null_key,
            keys,
        }
    }

    /// The grid must be non-empty and hold exactly `num_rows * num_cols` keys.
    pub fn validate(&self) -> Result<(), Error> {
        let cells = self.num_rows as usize * self.num_cols as usize;
        if cells == 0 || self.keys.len() != cells {
            return Err(Error::InvalidLayout);
        }
        Ok(())
    }

    /// Key at (`row`, `col`), `None` outside the grid.
    pub fn key(&self, row: u8, col: u8) -> Option<char> {
        if row >= self.num_rows || col >= self.num_cols {
            return None;
        }
        self.keys
            .get(row as usize * self.num_cols as usize + col as usize)
            .copied()
    }
}

/// 4x4 keypad:
///
/// ```text
/// 1 2 3 A
/// 4 5 6 B
/// 7 8 9 C
/// * 0 # D
/// ```
pub static STANDARD_KEYBOARD: KeyboardLayout = KeyboardLayout::new(
    4,
    4,
    '\0',
    &[
        '1', '2', '3', 'A', //
        '4', '5', '6', 'B', //
        '7', '8', '9', 'C', //
        '*', '0', '#', 'D',
    ],
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_is_valid() {
        assert_eq!(STANDARD_KEYBOARD.validate(), Ok(()));
        assert_eq!(STANDARD_KEYBOARD.key(0, 0), Some('1'));
        assert_eq!(STANDARD_KEYBOARD.key(1, 3), Some('B'));
        assert_eq!(STANDARD_KEYBOARD.key(3, 0), Some('*'));
        assert_eq!(STANDARD_KEYBOARD.key(3, 3), Some('D'));
    }

    #[test]
    fn out_of_grid_lookups_return_none() {
        assert_eq!(STANDARD_KEYBOARD.key(4, 0), None);
        assert_eq!(STANDARD_KEYBOARD.key(0, 4), None);
    }

    #[test]
    fn mismatched_grid_is_invalid() {
        let short = KeyboardLayout::new(2, 2, '\0', &['1', '2', '3']);
        assert_eq!(short.validate(), Err(Error::InvalidLayout));

        let empty = KeyboardLayout::new(0, 4, '\0', &[]);
        assert_eq!(empty.validate(), Err(Error::InvalidLayout));
    }

    #[test]
    fn non_square_grid_is_row_major() {
        let wide = KeyboardLayout::new(2, 3, '-', &['a', 'b', 'c', 'd', 'e', 'f']);
        assert_eq!(wide.validate(), Ok(()));
        assert_eq!(wide.key(1, 0), Some('d'));
        assert_eq!(wide.key(0, 2), Some('c'));
    }
}
