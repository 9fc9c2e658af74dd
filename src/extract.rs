// Tolerant field extraction from portal text fragments.
//
// The portals render prices and floor areas inconsistently ("350 000 zł",
// "1.200.000", "45,5 m²", "45m2"), so both extractors are pattern based and
// degrade to `None` instead of failing.
use once_cell::sync::Lazy;
use regex::Regex;

/// Grosze tail such as ",00" or ".50" directly before a non-digit; thousands
/// separators never match because they are followed by three digits.
static DECIMAL_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,.]\d{1,2}(\D|$)").expect("decimal tail regex"));

/// First number followed by an `m` unit: matches "45 m²", "45m2" and "45 m".
static AREA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+[.,]?\d*)\s*m").expect("area regex"));

/// Extracts a whole-PLN price from free text. Returns `None` (never zero)
/// when no digit survives, so callers can tell "unparseable" from "zero".
pub fn extract_price(text: &str) -> Option<f64> {
    let normalized = DECIMAL_TAIL.replace_all(text, "$1");
    let digits: String = normalized.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Extracts a floor area in square meters from free text, typically a title
/// like "Mieszkanie 45,5 m² Centrum".
pub fn extract_area(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    let caps = AREA.captures(&lower)?;
    caps[1].replace(',', ".").parse::<f64>().ok()
}
