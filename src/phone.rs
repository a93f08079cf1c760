use crate::constants::PHONE_COUNTRY_PREFIX;
use crate::table::Cell;
use once_cell::sync::Lazy;
use regex::Regex;

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("valid regex"));

/// Reduces a phone string to its digits and prepends the country prefix when the
/// digits look like a national number (area code plus subscriber, 10 or 11 digits).
///
/// Any other length passes through unchanged: this is a heuristic, not validation.
pub fn normalize_phone(raw: &str) -> String {
    let digits = NON_DIGITS.replace_all(raw, "");
    match digits.len() {
        10 | 11 => format!("{}{}", PHONE_COUNTRY_PREFIX, digits),
        _ => digits.into_owned(),
    }
}

/// Same as [`normalize_phone`] for a report cell. Empty cells give `""`.
/// Numeric cells are read as whole numbers, so a phone stored as `11988887777.0`
/// in a spreadsheet does not pick up a trailing zero.
pub fn normalize_phone_cell(cell: &Cell) -> String {
    match cell {
        Cell::Empty | Cell::Bool(_) => String::new(),
        Cell::Text(s) => normalize_phone(s),
        Cell::Int(i) => normalize_phone(&i.to_string()),
        Cell::Float(f) if f.is_finite() && f.fract() == 0.0 => normalize_phone(&format!("{:.0}", f)),
        Cell::Float(f) => normalize_phone(&f.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_national_mobile_number() {
        assert_eq!(normalize_phone("(11) 98888-7777"), "5511988887777");
    }

    #[test]
    fn ten_digit_landline_gets_prefix() {
        assert_eq!(normalize_phone("11 3333-4444"), "551133334444");
    }

    #[test]
    fn empty_and_digitless_inputs_give_empty_string() {
        assert_eq!(normalize_phone(""), "");
        assert_eq!(normalize_phone("n/a"), "");
        assert_eq!(normalize_phone_cell(&Cell::Empty), "");
    }

    #[test]
    fn short_numbers_pass_through() {
        assert_eq!(normalize_phone("123"), "123");
    }

    #[test]
    fn already_prefixed_numbers_are_stable() {
        assert_eq!(normalize_phone("5511988887777"), "5511988887777");
        assert_eq!(normalize_phone("551133334444"), "551133334444");
        let once = normalize_phone("+55 (11) 98888-7777");
        assert_eq!(normalize_phone(&once), once);
    }

    #[test]
    fn numeric_cells_are_read_as_whole_numbers() {
        assert_eq!(normalize_phone_cell(&Cell::Float(11988887777.0)), "5511988887777");
        assert_eq!(normalize_phone_cell(&Cell::Int(1133334444)), "551133334444");
    }
}
