//! Checksum and structural validators
//!
//! Pure functions: they never panic and never allocate more than a copy of
//! the input. Every validator first strips separators, so callers may pass the
//! raw matched text.

use crate::domain::Category;
use regex::Regex;
use std::sync::OnceLock;

/// Control letters for Spanish identity numbers, indexed by `number % 23`
const ID_CONTROL_LETTERS: &[u8; 23] = b"TRWAGMYFPDXBNJZSQVHLCKE";

/// Control letters for company tax codes, indexed by the control digit
const CIF_CONTROL_LETTERS: &[u8; 10] = b"JABCDEFGHI";

/// Valid first letters of a company tax code
const CIF_ORG_LETTERS: &str = "ABCDEFGHJNPQRSUVW";

/// IBAN lengths for countries where the national length is known
const IBAN_LENGTHS: &[(&str, usize)] = &[
    ("AD", 24),
    ("AT", 20),
    ("BE", 16),
    ("CH", 21),
    ("DE", 22),
    ("DK", 18),
    ("ES", 24),
    ("FI", 18),
    ("FR", 27),
    ("GB", 22),
    ("IE", 22),
    ("IT", 27),
    ("LU", 20),
    ("NL", 18),
    ("NO", 15),
    ("PL", 28),
    ("PT", 25),
    ("SE", 24),
];

/// Keywords signalling that a nearby value is a credential
pub const CREDENTIAL_KEYWORDS: &[&str] = &[
    "password",
    "contraseña",
    "clave",
    "pwd",
    "pass",
    "api_key",
    "apikey",
    "api key",
    "token",
    "bearer",
    "authorization",
    "auth",
    "secret",
    "secreto",
    "cookie",
    "session",
    "sesion",
    "credential",
    "credencial",
    "ssh-rsa",
    "private key",
    "clave privada",
    "begin private key",
    "begin rsa private key",
    "access_token",
    "refresh_token",
];

/// Keywords signalling health-related content
pub const HEALTH_KEYWORDS: &[&str] = &[
    "diagnóstico",
    "diagnostico",
    "diagnosis",
    "medicación",
    "medicacion",
    "medication",
    "medicina",
    "receta",
    "prescription",
    "enfermedad",
    "disease",
    "illness",
    "tratamiento",
    "treatment",
    "historia clínica",
    "historia clinica",
    "medical history",
    "carencia",
    "preexistencia",
    "preexisting",
    "copago",
    "coinsurance",
    "reembolso",
    "reimbursement",
    "síntoma",
    "sintoma",
    "symptom",
    "alergia",
    "allergy",
    "cirugía",
    "cirugia",
    "surgery",
    "hospitalización",
    "hospitalizacion",
    "hospitalization",
    "paciente",
    "patient",
];

fn strip_separators(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Validate an IBAN with the ISO 13616 mod-97 check
///
/// Spaces, dots and hyphens are ignored.
///
/// # Example
///
/// ```
/// use redline::core::detection::validators::validate_iban;
///
/// assert!(validate_iban("ES91 2100 0418 4502 0005 1332"));
/// assert!(!validate_iban("ES92 2100 0418 4502 0005 1332"));
/// ```
pub fn validate_iban(value: &str) -> bool {
    let iban = strip_separators(value);
    if !(15..=34).contains(&iban.len()) {
        return false;
    }

    let bytes = iban.as_bytes();
    if !bytes[..2].iter().all(u8::is_ascii_alphabetic) || !bytes[2..4].iter().all(u8::is_ascii_digit)
    {
        return false;
    }

    if let Some((_, expected)) = IBAN_LENGTHS.iter().find(|(cc, _)| *cc == &iban[..2]) {
        if iban.len() != *expected {
            return false;
        }
    }

    // Move the first four characters to the end and fold letters to 10..35
    let mut remainder: u32 = 0;
    for b in bytes[4..].iter().chain(bytes[..4].iter()) {
        let digits = match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'A'..=b'Z' => u32::from(b - b'A') + 10,
            _ => return false,
        };
        remainder = if digits >= 10 {
            (remainder * 100 + digits) % 97
        } else {
            (remainder * 10 + digits) % 97
        };
    }

    remainder == 1
}

/// Validate a payment card number with the Luhn algorithm
///
/// Accepts 13 to 19 digits after removing spaces, dots and hyphens.
pub fn validate_credit_card(value: &str) -> bool {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '.')
        .collect();
    if !(13..=19).contains(&cleaned.len()) || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let sum: u32 = cleaned
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

fn id_control_letter(number: u32) -> char {
    char::from(ID_CONTROL_LETTERS[(number % 23) as usize])
}

/// Validate a Spanish DNI: eight digits and a control letter
pub fn validate_dni(value: &str) -> bool {
    let id = strip_separators(value);
    if id.len() != 9 {
        return false;
    }
    let (digits, letter) = id.split_at(8);
    match (digits.parse::<u32>(), letter.chars().next()) {
        (Ok(number), Some(letter)) if digits.bytes().all(|b| b.is_ascii_digit()) => {
            id_control_letter(number) == letter
        }
        _ => false,
    }
}

/// Validate a Spanish NIE: X/Y/Z, seven digits and a control letter
pub fn validate_nie(value: &str) -> bool {
    let id = strip_separators(value);
    if id.len() != 9 {
        return false;
    }
    let prefix = match id.as_bytes()[0] {
        b'X' => '0',
        b'Y' => '1',
        b'Z' => '2',
        _ => return false,
    };
    let mut as_dni = String::with_capacity(9);
    as_dni.push(prefix);
    as_dni.push_str(&id[1..]);
    validate_dni(&as_dni)
}

/// Validate a Spanish company tax code (CIF)
///
/// The control character is a digit, a letter from `JABCDEFGHI`, or either,
/// depending on the organisation letter.
pub fn validate_cif(value: &str) -> bool {
    let cif = strip_separators(value);
    if cif.len() != 9 {
        return false;
    }
    let bytes = cif.as_bytes();
    let org = char::from(bytes[0]);
    if !CIF_ORG_LETTERS.contains(org) || !bytes[1..8].iter().all(u8::is_ascii_digit) {
        return false;
    }

    let mut sum = 0u32;
    for (i, b) in bytes[1..8].iter().enumerate() {
        let d = u32::from(b - b'0');
        if i % 2 == 0 {
            let doubled = d * 2;
            sum += doubled / 10 + doubled % 10;
        } else {
            sum += d;
        }
    }
    let control_digit = (10 - sum % 10) % 10;
    let control_letter = CIF_CONTROL_LETTERS[control_digit as usize];
    let control = bytes[8];

    let digit_ok = control == b'0' + control_digit as u8;
    let letter_ok = control == control_letter;
    match org {
        'K' | 'P' | 'Q' | 'S' | 'N' | 'W' => letter_ok,
        'A' | 'B' | 'E' | 'H' => digit_ok,
        _ => digit_ok || letter_ok,
    }
}

fn email_regex() -> &'static Option<Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
        )
        .ok()
    })
}

/// Structural email check: local part, `@`, dotted domain of valid labels
pub fn validate_email(value: &str) -> bool {
    match email_regex() {
        Some(re) => re.is_match(value.trim()),
        None => false,
    }
}

/// Validate a Spanish phone number
///
/// An optional `+34`/`34` prefix is removed, then exactly nine digits starting
/// with 6, 7, 8 or 9 must remain.
pub fn validate_phone(value: &str) -> bool {
    let mut digits: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
        .collect();

    if let Some(rest) = digits.strip_prefix("+34") {
        digits = rest.to_string();
    } else if digits.len() == 11 && digits.starts_with("34") {
        digits = digits[2..].to_string();
    }

    digits.len() == 9
        && digits.bytes().all(|b| b.is_ascii_digit())
        && matches!(digits.as_bytes()[0], b'6'..=b'9')
}

/// Whether `context` contains any credential keyword (case-insensitive)
pub fn has_credential_indicators(context: &str) -> bool {
    contains_any(context, CREDENTIAL_KEYWORDS)
}

/// Whether `context` contains any health keyword (case-insensitive)
pub fn has_health_indicators(context: &str) -> bool {
    contains_any(context, HEALTH_KEYWORDS)
}

pub(crate) fn contains_any(haystack: &str, keywords: &[impl AsRef<str>]) -> bool {
    let lower = haystack.to_lowercase();
    keywords
        .iter()
        .any(|k| lower.contains(&k.as_ref().to_lowercase()))
}

/// Run the validator registered for `category`
///
/// Returns `None` when the category has no validator.
pub fn validate(category: Category, value: &str) -> Option<bool> {
    let result = match category {
        Category::Iban => validate_iban(value),
        Category::CreditCard => validate_credit_card(value),
        Category::Dni => validate_dni(value),
        Category::Nie => validate_nie(value),
        Category::Cif => validate_cif(value),
        Category::Email => validate_email(value),
        Category::Phone => validate_phone(value),
        _ => return None,
    };
    Some(result)
}
