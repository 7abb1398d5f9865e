//! Formateo y normalización de valores de entrada/salida: importes, teléfonos,
//! marcas de tiempo y hash de contraseñas.

use chrono::{Local, NaiveDateTime, Timelike};
use sha2::{Digest, Sha256};

use crate::DomainError;

/// Formato de marca de tiempo persistido (hora local, precisión de segundos).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Hora local actual truncada a segundos.
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, DomainError> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| DomainError::validation(format!("invalid date/time '{value}' (expected YYYY-MM-DD HH:MM:SS): {e}")))
}

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Versión corta para listados: `YYYY-MM-DD HH:MM`.
pub fn short_timestamp(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

/// SHA-256 en hex minúsculas; es el formato que guarda la tabla `users`.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `1500000.0` -> `"1 500 000,00"`.
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return "0,00".to_string();
    }
    let rendered = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && rendered != "0.00" { "-" } else { "" };
    format!("{sign}{grouped},{frac_part}")
}

/// Inversa tolerante de `format_amount`; texto ilegible produce `0.0`.
pub fn parse_amount(text: &str) -> f64 {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).map(|c| if c == ',' { '.' } else { c }).collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Normaliza un teléfono ruso a `+7 (xxx) xxx-xxxx`. Si no se reconoce el
/// formato, devuelve la entrada sin cambios.
pub fn format_phone(phone: &str) -> String {
    if phone.is_empty() {
        return String::new();
    }
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let local = match digits.len() {
        11 if digits.starts_with('7') || digits.starts_with('8') => &digits[1..],
        10 => digits.as_str(),
        _ => return phone.to_string(),
    };
    format!("+7 ({}) {}-{}", &local[..3], &local[3..6], &local[6..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_use_space_groups_and_comma() {
        assert_eq!(format_amount(1_500_000.0), "1 500 000,00");
        assert_eq!(format_amount(950.5), "950,50");
        assert_eq!(format_amount(0.0), "0,00");
        assert_eq!(format_amount(-1234.5), "-1 234,50");
        assert_eq!(format_amount(f64::NAN), "0,00");
    }

    #[test]
    fn parse_amount_is_lenient() {
        assert_eq!(parse_amount("1 500 000,00"), 1_500_000.0);
        assert_eq!(parse_amount("12.5"), 12.5);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(format_phone("84951234567"), "+7 (495) 123-4567");
        assert_eq!(format_phone("+7 495 123 45 67"), "+7 (495) 123-4567");
        assert_eq!(format_phone("4951234567"), "+7 (495) 123-4567");
        assert_eq!(format_phone("12345"), "12345");
        assert_eq!(format_phone(""), "");
    }

    #[test]
    fn password_hash_is_sha256_hex() {
        assert_eq!(hash_password("admin"), "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918");
        assert_eq!(hash_password("123").len(), 64);
    }

    #[test]
    fn timestamps_roundtrip() {
        let ts = parse_timestamp("2025-03-01 18:00:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2025-03-01 18:00:00");
        assert_eq!(short_timestamp(&ts), "2025-03-01 18:00");
        assert!(parse_timestamp("01.03.2025").is_err());
        assert_eq!(now_local().nanosecond(), 0);
    }
}
