//! Rendering numeric cells as the operator sees them

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// What a date/time number format shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DateKind {
    Date,
    Time,
    DateTime,
}

impl DateKind {
    fn pattern(self) -> &'static str {
        match self {
            DateKind::Date => "%Y-%m-%d",
            DateKind::Time => "%H:%M",
            DateKind::DateTime => "%Y-%m-%d %H:%M",
        }
    }
}

/// Date kind of a built-in number format id
pub(crate) fn builtin_kind(id: u32) -> Option<DateKind> {
    match id {
        14..=17 => Some(DateKind::Date),
        18..=21 | 45..=47 => Some(DateKind::Time),
        22 => Some(DateKind::DateTime),
        _ => None,
    }
}

/// Date kind of a custom format code, if it formats dates or times
pub(crate) fn custom_kind(code: &str) -> Option<DateKind> {
    // Only the first section (positive numbers) matters
    let section = code.split(';').next().unwrap_or("");
    let mut tokens = String::new();
    let mut chars = section.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '\\' => {
                chars.next();
            }
            '[' => {
                let inner: String = chars.by_ref().take_while(|&b| b != ']').collect();
                // [h], [mm], [ss] are elapsed time; [$-409], [Red] are not tokens
                if inner.chars().all(|b| matches!(b.to_ascii_lowercase(), 'h' | 'm' | 's')) {
                    tokens.push_str(&inner.to_ascii_lowercase());
                }
            }
            _ => tokens.push(c.to_ascii_lowercase()),
        }
    }
    if tokens.contains("general") {
        return None;
    }

    let has_time = tokens.contains('h') || tokens.contains('s');
    let has_date =
        tokens.contains('y') || tokens.contains('d') || (tokens.contains('m') && !has_time);
    match (has_date, has_time) {
        (true, true) => Some(DateKind::DateTime),
        (true, false) => Some(DateKind::Date),
        (false, true) => Some(DateKind::Time),
        (false, false) => None,
    }
}

/// Render a date serial number in the given kind.
///
/// Returns `None` for serials outside the representable range.
pub(crate) fn render_serial(serial: f64, kind: DateKind, date1904: bool) -> Option<String> {
    if !serial.is_finite() || !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = if date1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else if serial < 60.0 {
        // Serials before the phantom 1900-02-29 are one day off
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };

    let days = serial.trunc() as i64;
    let seconds = (serial.fract() * 86_400.0).round() as i64;
    let moment: NaiveDateTime = epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(seconds))?;
    Some(moment.format(kind.pattern()).to_string())
}

/// Plain numbers: integers without a decimal point
pub(crate) fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_kinds() {
        assert_eq!(builtin_kind(0), None);
        assert_eq!(builtin_kind(14), Some(DateKind::Date));
        assert_eq!(builtin_kind(20), Some(DateKind::Time));
        assert_eq!(builtin_kind(22), Some(DateKind::DateTime));
        assert_eq!(builtin_kind(49), None);
    }

    #[test]
    fn test_custom_kinds() {
        assert_eq!(custom_kind("yyyy-mm-dd"), Some(DateKind::Date));
        assert_eq!(custom_kind("dd/mm/yyyy"), Some(DateKind::Date));
        assert_eq!(custom_kind("mmm yyyy"), Some(DateKind::Date));
        assert_eq!(custom_kind("h:mm AM/PM"), Some(DateKind::Time));
        assert_eq!(custom_kind("[h]:mm:ss"), Some(DateKind::Time));
        assert_eq!(custom_kind("yyyy-mm-dd hh:mm"), Some(DateKind::DateTime));
        assert_eq!(custom_kind("[$-409]dddd, mmmm dd, yyyy"), Some(DateKind::Date));
        assert_eq!(custom_kind("0.00"), None);
        assert_eq!(custom_kind("#,##0;[Red]-#,##0"), None);
        assert_eq!(custom_kind("0 \"days\""), None);
        assert_eq!(custom_kind("General"), None);
    }

    #[test]
    fn test_render_dates() {
        assert_eq!(render_serial(45658.0, DateKind::Date, false).unwrap(), "2025-01-01");
        assert_eq!(render_serial(1.0, DateKind::Date, false).unwrap(), "1900-01-01");
        assert_eq!(render_serial(61.0, DateKind::Date, false).unwrap(), "1900-03-01");
        assert_eq!(render_serial(0.0, DateKind::Date, true).unwrap(), "1904-01-01");
    }

    #[test]
    fn test_render_times() {
        assert_eq!(render_serial(0.4166666666, DateKind::Time, false).unwrap(), "10:00");
        assert_eq!(render_serial(0.604166666, DateKind::Time, false).unwrap(), "14:30");
        assert_eq!(
            render_serial(45658.4375, DateKind::DateTime, false).unwrap(),
            "2025-01-01 10:30"
        );
    }

    #[test]
    fn test_render_out_of_range() {
        assert_eq!(render_serial(-1.0, DateKind::Date, false), None);
        assert_eq!(render_serial(f64::NAN, DateKind::Date, false), None);
    }

    #[test]
    fn test_render_number() {
        assert_eq!(render_number(42.0), "42");
        assert_eq!(render_number(-3.0), "-3");
        assert_eq!(render_number(2.5), "2.5");
        assert_eq!(render_number(9876543210.0), "9876543210");
    }
}
