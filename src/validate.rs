//! Checksum validation for Bulgarian national identifiers.
//!
//! Two identifier schemes appear in regulatory filings:
//!
//! * **EGN** — the 10-digit unified civil number carried by persons. The
//!   first six digits encode a birth date with the century folded into the
//!   month field, the next three are a serial, and the last is a mod-11
//!   check digit over fixed weights.
//! * **EIK/BULSTAT** — the 9- or 13-digit company code. Both lengths use a
//!   mod-11 check digit with an alternate-weight recomputation when the
//!   first pass yields remainder 10.
//!
//! Both validators are total: malformed input (wrong length, non-digit
//! characters, impossible dates) returns `false` rather than panicking.
//! Nothing here performs I/O, so the functions are freely usable from the
//! trust-boundary recompute in [`crate::pipeline::extract`] and from tests.

/// Weights for the EGN check digit, applied to digits 1–9.
const EGN_WEIGHTS: [u32; 9] = [2, 4, 8, 5, 10, 9, 7, 3, 6];

/// Weights for the 9-digit EIK check digit, applied to digits 1–8.
const EIK_WEIGHTS: [u32; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
/// Alternate weights used when the first EIK pass yields remainder 10.
const EIK_WEIGHTS_ALT: [u32; 8] = [3, 4, 5, 6, 7, 8, 9, 10];

/// Weights for the 13-digit EIK extension, applied to digits 10–13.
const EIK_EXT_WEIGHTS: [u32; 4] = [2, 7, 3, 5];
/// Alternate extension weights for the remainder-10 recomputation.
const EIK_EXT_WEIGHTS_ALT: [u32; 4] = [4, 9, 5, 7];

/// Validate a person's EGN.
///
/// The identifier must be exactly 10 ASCII digits, encode a real calendar
/// date (month > 40 means 2000s, month > 20 means 1800s, otherwise 1900s),
/// and carry a correct mod-11 check digit (remainder 10 maps to 0).
pub fn validate_person_id(id: &str) -> bool {
    let digits = match parse_digits(id, 10) {
        Some(d) => d,
        None => return false,
    };

    let year = digits[0] * 10 + digits[1];
    let month = digits[2] * 10 + digits[3];
    let day = digits[4] * 10 + digits[5];

    let (month, year) = if month > 40 {
        (month - 40, year + 2000)
    } else if month > 20 {
        (month - 20, year + 1800)
    } else {
        (month, year + 1900)
    };

    if !is_valid_date(day, month, year) {
        return false;
    }

    let sum: u32 = digits[..9]
        .iter()
        .zip(EGN_WEIGHTS.iter())
        .map(|(d, w)| d * w)
        .sum();
    let mut check = sum % 11;
    if check == 10 {
        check = 0;
    }

    check == digits[9]
}

/// Validate a company EIK/BULSTAT number (9 or 13 digits).
///
/// A 13-digit identifier is only valid when its leading 9 digits pass on
/// their own; the 4-digit extension check cannot rescue a bad prefix.
pub fn validate_company_id(id: &str) -> bool {
    if !id.bytes().all(|b| b.is_ascii_digit()) || id.is_empty() {
        return false;
    }
    match id.len() {
        9 => validate_eik_base(id),
        13 => validate_eik_base(&id[..9]) && validate_eik_extension(id),
        _ => false,
    }
}

/// Check-digit verification for the leading 9 digits of an EIK.
fn validate_eik_base(id: &str) -> bool {
    let digits = match parse_digits(id, 9) {
        Some(d) => d,
        None => return false,
    };

    let sum: u32 = digits[..8]
        .iter()
        .zip(EIK_WEIGHTS.iter())
        .map(|(d, w)| d * w)
        .sum();
    let mut remainder = sum % 11;

    if remainder == 10 {
        let alt: u32 = digits[..8]
            .iter()
            .zip(EIK_WEIGHTS_ALT.iter())
            .map(|(d, w)| d * w)
            .sum();
        remainder = alt % 11;
        if remainder == 10 {
            remainder = 0;
        }
    }

    remainder == digits[8]
}

/// Check-digit verification for digits 10–13 of a 13-digit EIK.
fn validate_eik_extension(id: &str) -> bool {
    let digits = match parse_digits(id, 13) {
        Some(d) => d,
        None => return false,
    };

    let sum: u32 = digits[9..13]
        .iter()
        .zip(EIK_EXT_WEIGHTS.iter())
        .map(|(d, w)| d * w)
        .sum();
    let mut remainder = sum % 11;

    if remainder == 10 {
        let alt: u32 = digits[9..13]
            .iter()
            .zip(EIK_EXT_WEIGHTS_ALT.iter())
            .map(|(d, w)| d * w)
            .sum();
        remainder = alt % 11;
        if remainder == 10 {
            remainder = 0;
        }
    }

    remainder == digits[12]
}

/// Parse `id` into exactly `len` decimal digits, or `None` on any deviation.
fn parse_digits(id: &str, len: usize) -> Option<Vec<u32>> {
    if id.len() != len {
        return None;
    }
    id.chars().map(|c| c.to_digit(10)).collect()
}

/// True when (day, month, year) is a real Gregorian calendar date.
fn is_valid_date(day: u32, month: u32, year: u32) -> bool {
    if !(1..=12).contains(&month) {
        return false;
    }
    (1..=days_in_month(month, year)).contains(&day)
}

fn days_in_month(month: u32, year: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
