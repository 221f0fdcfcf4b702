//! A1-style cell references

/// Column letters for a 0-based column (`0` -> `A`, `26` -> `AA`)
pub(crate) fn column_name(col: u32) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Reference for a 1-based row and 0-based column
pub(crate) fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", column_name(col), row)
}

/// Parse `B7` / `$B$7` into (1-based row, 0-based column)
pub(crate) fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.trim();
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    let letters = letters.trim_matches('$');
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        let value = u32::from(c.to_ascii_uppercase() as u8 - b'A') + 1;
        col = col.checked_mul(26)?.checked_add(value)?;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row, col - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(4), "E");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_cell_ref("A1"), Some((1, 0)));
        assert_eq!(parse_cell_ref("E12"), Some((12, 4)));
        assert_eq!(parse_cell_ref("$AA$3"), Some((3, 26)));
        assert_eq!(parse_cell_ref("b2"), Some((2, 1)));
        assert_eq!(parse_cell_ref("12"), None);
        assert_eq!(parse_cell_ref("A0"), None);
        assert_eq!(parse_cell_ref("A"), None);
    }

    #[test]
    fn test_ref_roundtrip() {
        for (row, col) in [(1, 0), (2, 25), (100, 26), (1048576, 16383)] {
            assert_eq!(parse_cell_ref(&cell_ref(row, col)), Some((row, col)));
        }
    }
}
