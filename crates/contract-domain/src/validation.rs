//! Reglas de validación de identificadores fiscales y datos de contacto.
//!
//! Todas las funciones son puras: reciben texto y devuelven `bool`. Los
//! borradores (`OrganizationDraft`, ...) las combinan para producir
//! `DomainError::Validation` con el campo que falla.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::organization::OrganizationType;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+7 \(\d{3}\) \d{3}-\d{4}$").expect("phone pattern"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

const INN10_WEIGHTS: [u32; 9] = [2, 4, 10, 3, 5, 9, 4, 6, 8];
const INN12_FIRST_WEIGHTS: [u32; 10] = [7, 2, 4, 10, 3, 5, 9, 4, 6, 8];
const INN12_SECOND_WEIGHTS: [u32; 11] = [3, 7, 2, 4, 10, 3, 5, 9, 4, 6, 8];

fn digits_of(value: &str) -> Option<Vec<u32>> {
    if value.is_empty() {
        return None;
    }
    value.chars().map(|c| if c.is_ascii_digit() { c.to_digit(10) } else { None }).collect()
}

/// Suma ponderada módulo 11; un resto de 10 se reduce a 0.
fn control_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let rem = sum % 11;
    if rem > 9 { rem % 10 } else { rem }
}

fn inn12_is_valid(d: &[u32]) -> bool {
    control_digit(&d[..10], &INN12_FIRST_WEIGHTS) == d[10]
    && control_digit(&d[..11], &INN12_SECOND_WEIGHTS) == d[11]
}

/// Valida un ИНН según el tipo de organización.
///
/// - Persona jurídica: 10 dígitos (un dígito de control) o 12 dígitos (dos).
/// - Empresario individual: sólo 12 dígitos.
pub fn validate_inn(inn: &str, org_type: OrganizationType) -> bool {
    let Some(d) = digits_of(inn) else { return false };
    match (org_type, d.len()) {
        (OrganizationType::Legal, 10) => control_digit(&d[..9], &INN10_WEIGHTS) == d[9],
        (_, 12) => inn12_is_valid(&d),
        _ => false,
    }
}

/// КПП: exactamente nueve dígitos.
pub fn validate_kpp(kpp: &str) -> bool {
    kpp.len() == 9 && kpp.bytes().all(|b| b.is_ascii_digit())
}

/// Valida ОГРН (13 dígitos, módulo 11) u ОГРНИП (15 dígitos, módulo 13).
pub fn validate_ogrn(ogrn: &str, org_type: OrganizationType) -> bool {
    let Some(d) = digits_of(ogrn) else { return false };
    let (expected_len, modulus) = match org_type {
        OrganizationType::Legal => (13, 11u64),
        OrganizationType::Individual => (15, 13u64),
    };
    if d.len() != expected_len {
        return false;
    }
    // 14 dígitos caben de sobra en u64
    let body = d[..expected_len - 1].iter().fold(0u64, |acc, x| acc * 10 + *x as u64);
    let mut check = body % modulus;
    if check > 9 {
        check %= 10;
    }
    check == d[expected_len - 1] as u64
}

/// Teléfono en formato `+7 (xxx) xxx-xxxx`.
pub fn validate_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inn_legal_ten_digits() {
        assert!(validate_inn("7703234453", OrganizationType::Legal));
        assert!(validate_inn("7703270067", OrganizationType::Legal));
        assert!(!validate_inn("7703234454", OrganizationType::Legal));
    }

    #[test]
    fn inn_rejects_non_digits_and_wrong_length() {
        assert!(!validate_inn("77032344a3", OrganizationType::Legal));
        assert!(!validate_inn("", OrganizationType::Legal));
        assert!(!validate_inn("770323445", OrganizationType::Legal));
        // diez dígitos no valen para un empresario individual
        assert!(!validate_inn("7703234453", OrganizationType::Individual));
    }

    #[test]
    fn inn_twelve_digits() {
        assert!(validate_inn("500100732259", OrganizationType::Individual));
        assert!(validate_inn("500100732259", OrganizationType::Legal));
        assert!(!validate_inn("500100732258", OrganizationType::Individual));
    }

    #[test]
    fn kpp_needs_nine_digits() {
        assert!(validate_kpp("770301001"));
        assert!(!validate_kpp("77030100"));
        assert!(!validate_kpp("77030100x"));
    }

    #[test]
    fn ogrn_checksums() {
        assert!(validate_ogrn("1027739292448", OrganizationType::Legal));
        assert!(!validate_ogrn("1027739292449", OrganizationType::Legal));
        assert!(validate_ogrn("304500116000157", OrganizationType::Individual));
        assert!(!validate_ogrn("1027739292448", OrganizationType::Individual));
    }

    #[test]
    fn phone_and_email_patterns() {
        assert!(validate_phone("+7 (495) 123-4567"));
        assert!(!validate_phone("+7 (495) 785-81-11"));
        assert!(!validate_phone("84951234567"));
        assert!(validate_email("info@postavchik.ru"));
        assert!(!validate_email("info@postavchik"));
        assert!(!validate_email("no at sign.ru"));
    }
}
