//! A1-style cell references addressed against a named worksheet.

/// Converts a 1-based column number to letters (1 = A, 27 = AA).
pub fn column_letters(col: usize) -> String {
    let mut column = col;
    let mut letters = String::new();
    while column > 0 {
        column -= 1;
        letters.insert(0, (b'A' + (column % 26) as u8) as char);
        column /= 26;
    }
    letters
}

/// Converts 1-based row & column numbers to an A1 reference.
pub fn cell_reference(row: usize, col: usize) -> String {
    format!("{}{}", column_letters(col), row)
}

/// Quotes a worksheet title for use in a range (`'My Sheet'!A1`).
pub fn worksheet_range(worksheet: &str, cells: Option<&str>) -> String {
    let title = format!("'{}'", worksheet.replace('\'', "''"));
    match cells {
        Some(cells) => format!("{}!{}", title, cells),
        None => title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(52), "AZ");
        assert_eq!(column_letters(703), "AAA");
    }

    #[test]
    fn references() {
        assert_eq!(cell_reference(3, 2), "B3");
        assert_eq!(cell_reference(10, 27), "AA10");
    }

    #[test]
    fn quoted_ranges() {
        assert_eq!(worksheet_range("Calls", None), "'Calls'");
        assert_eq!(worksheet_range("Agent's log", Some("C2")), "'Agent''s log'!C2");
    }
}
