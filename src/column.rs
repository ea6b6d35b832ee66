// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

/// Column letters for a 0-indexed column: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_letter(index: usize) -> String {
    let mut name = String::new();
    let mut n = index + 1;

    while n > 0 {
        n -= 1;
        name.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }

    name
}

/// Inverse of [`column_letter`]. Returns `None` for anything but A-Z.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |acc, c| {
        if !c.is_ascii_uppercase() {
            return None;
        }
        acc.checked_mul(26)?
            .checked_add(c as usize - 'A' as usize + 1)
    })
    .map(|n| n - 1)
}

/// A1-style reference for a 0-indexed column and 1-indexed row.
pub fn cell_ref(column: usize, row: u32) -> String {
    format!("{}{}", column_letter(column), row)
}

/// Splits `"AB12"` into `(27, 12)`.
pub fn parse_cell_ref(cell: &str) -> Option<(usize, u32)> {
    let split = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(split);
    let column = column_index(&letters.to_ascii_uppercase())?;
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((column, row))
}
