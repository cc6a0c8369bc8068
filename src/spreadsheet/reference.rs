//! A1-style cell references.

/// Converts column letters to a 0-based index ("A" -> 0, "AB" -> 27).
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for character in letters.chars() {
        let digit = match character {
            'A'..='Z' => character as usize - 'A' as usize + 1,
            'a'..='z' => character as usize - 'a' as usize + 1,
            _ => return None,
        };
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

/// Converts a 1-based row number to a 0-based index ("1" -> 0).
pub(crate) fn row_to_index(digits: &str) -> Option<usize> {
    digits.parse::<usize>().ok()?.checked_sub(1)
}

/// Converts a cell reference such as "B3" or "$B$3" to a 0-based `(row, col)` pair.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|character: char| character.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    Some((row_to_index(digits)?, col_to_index(letters)?))
}

/// Converts a 0-based column index to its letters (0 -> "A", 27 -> "AB").
pub(crate) fn index_to_col(col: usize) -> String {
    let mut column = col + 1;
    let mut letters = String::new();
    while column > 0 {
        column -= 1;
        letters.insert(0, (b'A' + (column % 26) as u8) as char);
        column /= 26;
    }
    letters
}
