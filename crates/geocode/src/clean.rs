//! Normalisation of place names returned by geocoders.
//!
//! Geocoders tend to return administrative names ("City of Westminster",
//! "Hlavní město Praha", "Stadt Köln"). Filenames want the name people use.

/// Administrative prefixes, stripped case-insensitively. Longer variants
/// first so "Capital City of " wins over "City of ".
const PREFIXES: &[&str] = &[
    "Capital City of ",
    "City of ",
    "Municipality of ",
    "Municipal Unit of ",
    "Borough of ",
    "Town of ",
    "Village of ",
    "District of ",
    "County of ",
    "Province of ",
    "State of ",
    "Region of ",
    "Δημοτική Κοινότητα ",
    "Δήμος ",
    "Stadt ",
    "Gemeinde ",
    "Kreis ",
    "Ville de ",
    "Commune de ",
    "Ciudad de ",
    "Municipio de ",
    "Città di ",
    "Comune di ",
    "Cidade de ",
    "Município de ",
    "Gemeente ",
    "Hlavní město ",
    "Miasto ",
    "Gmina ",
];

/// Administrative suffixes, stripped case-insensitively when preceded by a space.
/// " City" is not one of them: it is part of names like "Mexico City".
const SUFFIXES: &[&str] = &[
    " Metropolitan Area",
    " Metro Area",
    " Urban Area",
    " Municipality",
    " Borough",
    " District",
    " County",
    " Province",
    " Region",
];

/// Whole-name replacements, matched case-insensitively after stripping.
const COMMON_NAMES: &[(&str, &str)] = &[
    ("prague", "Prague"),
    ("praha", "Prague"),
    ("wien", "Vienna"),
    ("münchen", "Munich"),
    ("köln", "Cologne"),
    ("firenze", "Florence"),
    ("roma", "Rome"),
    ("milano", "Milan"),
    ("venezia", "Venice"),
    ("napoli", "Naples"),
    ("lisboa", "Lisbon"),
    ("warszawa", "Warsaw"),
    ("moskva", "Moscow"),
    ("sankt-peterburg", "Saint Petersburg"),
    ("new york city", "New York"),
    ("καρλοβάσι", "Karlovasi"),
    ("καρλοβασίου", "Karlovasi"),
];

/// Words dropped wherever they appear, unless nothing else would remain.
const ADMINISTRATIVE_WORDS: &[&str] = &[
    "administrative",
    "admin",
    "metropolitan",
    "metro",
    "urban",
    "greater",
    "central",
    "downtown",
    "inner",
    "outer",
];

/// Reduces a geocoder's place name to its common form.
///
/// Never returns an empty string for a non-blank input: if cleaning would
/// remove everything, the trimmed input is returned unchanged.
///
/// ```
/// use renamr_geocode::clean_label;
/// assert_eq!(clean_label("Hlavní město Praha"), "Prague");
/// assert_eq!(clean_label("City of Westminster"), "Westminster");
/// assert_eq!(clean_label("Greater London"), "London");
/// ```
pub fn clean_label(raw: &str) -> String {
    let original = raw.trim();
    let mut cleaned = original;

    if let Some(rest) = PREFIXES.iter().find_map(|prefix| strip_prefix_ignore_case(cleaned, prefix)) {
        cleaned = rest.trim();
    }
    // "Harris County Metro Area" needs two passes.
    while let Some(rest) = SUFFIXES.iter().find_map(|suffix| strip_suffix_ignore_case(cleaned, suffix)) {
        cleaned = rest.trim();
    }

    let lower = cleaned.to_lowercase();
    if let Some((_, common)) = COMMON_NAMES.iter().find(|(local, _)| *local == lower) {
        return (*common).to_string();
    }

    let words: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|word| !ADMINISTRATIVE_WORDS.contains(&word.to_lowercase().as_str()))
        .collect();
    let result = if words.is_empty() { cleaned.to_string() } else { words.join(" ") };
    if result.is_empty() {
        return original.to_string();
    }
    if result != original {
        tracing::trace!(original, cleaned = %result, "Cleaned place label");
    }
    result
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Strips `prefix` from `s` ignoring case, leaving at least one character.
fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = s.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;
        if !chars_eq_ignore_case(actual, expected) {
            return None;
        }
    }
    let (index, _) = chars.next()?;
    Some(&s[index..])
}

/// Strips `suffix` from `s` ignoring case, leaving at least one character.
fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let mut chars = s.char_indices().rev();
    let mut start = s.len();
    for expected in suffix.chars().rev() {
        let (index, actual) = chars.next()?;
        if !chars_eq_ignore_case(actual, expected) {
            return None;
        }
        start = index;
    }
    chars.next()?;
    Some(&s[..start])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Prague", "Prague")]
    #[case("Praha", "Prague")]
    #[case("Hlavní město Praha", "Prague")]
    #[case("Wien", "Vienna")]
    #[case("Stadt Köln", "Cologne")]
    #[case("München", "Munich")]
    #[case("Roma Capitale", "Roma Capitale")]
    #[case("Comune di Firenze", "Florence")]
    #[case("CITY OF WESTMINSTER", "WESTMINSTER")]
    #[case("Capital City of Athens", "Athens")]
    #[case("Mexico City", "Mexico City")]
    #[case("Quebec City", "Quebec City")]
    #[case("Mexico City Municipality", "Mexico City")]
    #[case("Harris County Metro Area", "Harris")]
    #[case("New York City", "New York")]
    #[case("Greater London", "London")]
    #[case("Downtown Central", "Downtown Central")]
    #[case("Velocity", "Velocity")]
    #[case("Ville de Paris", "Paris")]
    #[case("Gemeente Amsterdam", "Amsterdam")]
    #[case("Δήμος Σάμου", "Σάμου")]
    #[case("  Lisboa  ", "Lisbon")]
    #[case("City", "City")]
    fn test_clean_label(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_label(raw), expected);
    }

    #[test]
    fn test_blank_input_stays_blank() {
        assert_eq!(clean_label("   "), "");
    }

    #[rstest]
    #[case("Stadt Köln", "stadt ", Some("Köln"))]
    #[case("ÉCOLE", "école", None)]
    #[case("Stadt ", "stadt ", None)]
    #[case("Sta", "stadt ", None)]
    fn test_strip_prefix_ignore_case(#[case] s: &str, #[case] prefix: &str, #[case] expected: Option<&str>) {
        assert_eq!(strip_prefix_ignore_case(s, prefix), expected);
    }

    #[rstest]
    #[case("Mexico City", " city", Some("Mexico"))]
    #[case("Velocity", " city", None)]
    #[case(" City", " city", None)]
    fn test_strip_suffix_ignore_case(#[case] s: &str, #[case] suffix: &str, #[case] expected: Option<&str>) {
        assert_eq!(strip_suffix_ignore_case(s, suffix), expected);
    }
}
