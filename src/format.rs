//! pt-BR display formatting for values shown on list screens.

use crate::value::{Value, parse_instant};

/// Separator between the currency symbol and the amount.
const NBSP: char = '\u{a0}';

/// `R$ 1.234,56`. Anything that is not a number formats as zero.
pub fn format_currency(value: &Value) -> String {
    let n = match value {
        Value::Number(n) if n.is_finite() => *n,
        _ => 0.0,
    };
    let body = format_decimal(n.abs(), 2);
    let sign = if n < 0.0 && body != "0,00" { "-" } else { "" };
    format!("{sign}R${NBSP}{body}")
}

/// Grouped number with a fixed count of decimals, e.g. `1.234,5`.
/// Anything that is not a number formats as `0`.
pub fn format_number(value: &Value, decimals: usize) -> String {
    match value {
        Value::Number(n) if n.is_finite() => {
            let body = format_decimal(n.abs(), decimals);
            let zero = body.chars().all(|c| c == '0' || c == ',' || c == '.');
            if *n < 0.0 && !zero {
                format!("-{body}")
            } else {
                body
            }
        }
        _ => "0".to_string(),
    }
}

/// `dd/mm/yyyy`, or empty when the text is not a date.
pub fn format_date(s: &str) -> String {
    parse_instant(s.trim())
        .map(|at| at.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

/// `dd/mm/yyyy, HH:MM` in UTC, or empty when the text is not a date.
pub fn format_date_time(s: &str) -> String {
    parse_instant(s.trim())
        .map(|at| at.format("%d/%m/%Y, %H:%M").to_string())
        .unwrap_or_default()
}

/// `123.456.789-09` for an eleven-digit CPF; other input comes back as its
/// digits.
pub fn format_cpf(cpf: &str) -> String {
    let digits = only_digits(cpf);
    if digits.len() != 11 {
        return digits;
    }
    format!(
        "{}.{}.{}-{}",
        &digits[..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..]
    )
}

/// `(11) 3456-7890` or `(11) 93456-7890`; other lengths are returned as
/// given.
pub fn format_phone(phone: &str) -> String {
    let digits = only_digits(phone);
    match digits.len() {
        10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        11 => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
        _ => phone.to_string(),
    }
}

/// Simplified CPF check: eleven digits, not all the same. Check digits are
/// not verified.
pub fn is_valid_cpf(cpf: &str) -> bool {
    let digits = only_digits(cpf);
    if digits.len() != 11 {
        return false;
    }
    let first = digits.as_bytes()[0];
    !digits.bytes().all(|b| b == first)
}

fn only_digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Fixed decimals with `.` thousands grouping and `,` as decimal mark.
fn format_decimal(n: f64, decimals: usize) -> String {
    let fixed = format!("{n:.decimals$}");
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{grouped},{f}"),
        None => grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(&Value::Number(1234.5)), "R$\u{a0}1.234,50");
        assert_eq!(format_currency(&Value::Number(0.0)), "R$\u{a0}0,00");
        assert_eq!(format_currency(&Value::Number(-9.999)), "-R$\u{a0}10,00");
        assert_eq!(format_currency(&Value::from("12")), "R$\u{a0}0,00");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(&Value::Number(1234567.0), 0), "1.234.567");
        assert_eq!(format_number(&Value::Number(1234.5), 1), "1.234,5");
        assert_eq!(format_number(&Value::Number(999.0), 2), "999,00");
        assert_eq!(format_number(&Value::Number(-0.001), 2), "0,00");
        assert_eq!(format_number(&Value::Null, 2), "0");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-09"), "09/03/2024");
        assert_eq!(format_date("2024-03-09T23:15:00Z"), "09/03/2024");
        assert_eq!(format_date(""), "");
        assert_eq!(format_date("amanhã"), "");
        assert_eq!(format_date_time("2024-03-09T23:15:00Z"), "09/03/2024, 23:15");
    }

    #[test]
    fn test_format_cpf() {
        assert_eq!(format_cpf("12345678909"), "123.456.789-09");
        assert_eq!(format_cpf("123.456.789-09"), "123.456.789-09");
        assert_eq!(format_cpf("1234"), "1234");
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("1134567890"), "(11) 3456-7890");
        assert_eq!(format_phone("(11) 93456-7890"), "(11) 93456-7890");
        assert_eq!(format_phone("11934567890"), "(11) 93456-7890");
        assert_eq!(format_phone("123"), "123");
    }

    #[test]
    fn test_is_valid_cpf() {
        assert!(is_valid_cpf("123.456.789-09"));
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(!is_valid_cpf("1234567890"));
        assert!(!is_valid_cpf(""));
    }
}
