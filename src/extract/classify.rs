/// Markers that identify a price line, paired with the currency they imply
const CURRENCY_MARKERS: &[(&str, &str)] = &[("₱", "PHP"), ("PHP", "PHP"), ("$", "USD")];

/// Token that identifies a mileage line (matched case-insensitively)
const DISTANCE_UNIT: &str = "km";

/// Titles shorter than this are treated as noise
const MIN_TITLE_CHARS: usize = 6;

/// Card text split into its recognized parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedLines {
    pub title: String,
    pub price: String,
    pub mileage: String,
    pub location: String,
}

/// Classifies the lines of a listing card
///
/// Each line is tested in order:
///
/// 1. contains a currency marker: price (a later price line replaces an earlier one)
/// 2. contains `km`: mileage
/// 3. no title yet and long enough: title
/// 4. no location yet, a title exists, and the line differs from price and mileage: location
///
/// Anything else is ignored.
pub fn classify_lines(text: &str) -> ClassifiedLines {
    let mut out = ClassifiedLines::default();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if CURRENCY_MARKERS.iter().any(|(marker, _)| line.contains(marker)) {
            out.price = line.to_string();
        } else if line.to_lowercase().contains(DISTANCE_UNIT) {
            out.mileage = line.to_string();
        } else if out.title.is_empty() && line.chars().count() >= MIN_TITLE_CHARS {
            out.title = line.to_string();
        } else if out.location.is_empty()
            && !out.title.is_empty()
            && line != out.price
            && line != out.mileage
        {
            out.location = line.to_string();
        }
    }

    out
}

/// Infers an ISO currency code from a price line
pub fn detect_currency(price: &str) -> Option<String> {
    CURRENCY_MARKERS
        .iter()
        .find(|(marker, _)| price.contains(marker))
        .map(|(_, code)| code.to_string())
}

/// Picks a model year (1900-2099) out of a title
pub fn detect_year(title: &str) -> Option<String> {
    title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find(|token| {
            token.len() == 4
                && token.chars().all(|c| c.is_ascii_digit())
                && (token.starts_with("19") || token.starts_with("20"))
        })
        .map(str::to_string)
}
