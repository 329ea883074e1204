//! Folder name normalization to the canonical "Title (Year)" form.

use std::sync::LazyLock;

use regex::Regex;

static RE_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("Failed to create regex pattern for brackets"));

static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Failed to create regex pattern for whitespace"));

/// Two four-digit numbers, the second optionally in parentheses: "1080 (2020)".
static RE_TWO_NUMBERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})\s*\(?\s*(\d{4})\s*\)?$").expect("Failed to create regex pattern for two numbers")
});

/// Everything up to the first year between 1900 and 2099.
static RE_TITLE_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)\s*\(?\s*\b(19\d{2}|20\d{2})\b\)?").expect("Failed to create regex pattern for title and year")
});

static RE_TRAILING_OPEN_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s(]+$").expect("Failed to create regex pattern for trailing parenthesis"));

static RE_YEAR_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d{4}\)$").expect("Failed to create regex pattern for year suffix"));

/// Remove bracketed annotations, replace separator dots with spaces and collapse whitespace.
#[must_use]
pub fn clean_name(name: &str) -> String {
    let without_brackets = RE_BRACKETS.replace_all(name, "");
    let spaced = without_brackets.replace('.', " ");
    RE_WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

/// Return the canonical folder name in the form "Title (Year)".
///
/// A name consisting of exactly two four-digit numbers uses the first one as the title,
/// so "1080 (2020)" stays as is even though 1080 is not a real title.
/// Otherwise everything up to the first year in the range 1900-2099 is used as the title.
/// Names without a year are returned cleaned but otherwise unchanged.
///
/// ```rust
/// use media_tidy::name::normalize_name;
///
/// assert_eq!(normalize_name("The.Matrix.1999.[1080p]"), "The Matrix (1999)");
/// assert_eq!(normalize_name("Heat"), "Heat");
/// ```
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let name_clean = clean_name(name);

    if let Some(captures) = RE_TWO_NUMBERS.captures(&name_clean) {
        return format!("{} ({})", &captures[1], &captures[2]);
    }

    if let Some(captures) = RE_TITLE_YEAR.captures(&name_clean) {
        let title = RE_TRAILING_OPEN_PAREN.replace(captures[1].trim(), "");
        if title.is_empty() {
            return name_clean;
        }
        return format!("{title} ({})", &captures[2]);
    }

    name_clean
}

/// Return the bare show title used for grouping TV folders.
///
/// Strips a trailing " (YYYY)" from the normalized name.
/// Only used as a grouping key, never as a final folder name.
#[must_use]
pub fn tv_normalize_name(name: &str) -> String {
    let normalized = normalize_name(name);
    let bare_title = RE_YEAR_SUFFIX.replace(&normalized, "").trim().to_string();
    if bare_title.is_empty() { normalized } else { bare_title }
}

/// Check if a folder name ends with a year in parentheses, like "Show (2019)".
#[must_use]
pub fn has_year_suffix(name: &str) -> bool {
    RE_YEAR_SUFFIX.is_match(name)
}

#[cfg(test)]
mod normalize_tests {
    use super::*;

    #[test]
    fn dotted_name_with_year_and_tag() {
        assert_eq!(normalize_name("The.Matrix.1999.[1080p]"), "The Matrix (1999)");
        assert_eq!(normalize_name("Heat.1995.[BluRay].[x264]"), "Heat (1995)");
        assert_eq!(normalize_name("Movie.Name.2010"), "Movie Name (2010)");
    }

    #[test]
    fn release_tags_after_year_are_dropped() {
        assert_eq!(normalize_name("Alien.1979.Directors.Cut.1080p.BluRay"), "Alien (1979)");
    }

    #[test]
    fn already_canonical_name_is_unchanged() {
        assert_eq!(normalize_name("The Matrix (1999)"), "The Matrix (1999)");
    }

    #[test]
    fn year_directly_after_parenthesis() {
        assert_eq!(normalize_name("Movie(2010)"), "Movie (2010)");
        assert_eq!(normalize_name("Movie ( 2010 )"), "Movie (2010)");
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(normalize_name("  Movie   Name  (2010) "), "Movie Name (2010)");
        assert_eq!(normalize_name("Movie\tName\n2010"), "Movie Name (2010)");
    }

    #[test]
    fn brackets_are_removed_anywhere() {
        assert_eq!(normalize_name("[Group] Some.Movie"), "Some Movie");
        assert_eq!(normalize_name("Some [extended] Movie 2004"), "Some Movie (2004)");
    }

    #[test]
    fn two_numbers_use_first_as_title() {
        assert_eq!(normalize_name("1080 (2020)"), "1080 (2020)");
        assert_eq!(normalize_name("1080 2020"), "1080 (2020)");
        assert_eq!(normalize_name("1080.2020"), "1080 (2020)");
        assert_eq!(normalize_name("[tag]1917(2019)"), "1917 (2019)");
    }

    #[test]
    fn name_without_year_is_only_cleaned() {
        assert_eq!(normalize_name("Some.Movie"), "Some Movie");
        assert_eq!(normalize_name("Heat"), "Heat");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn two_digit_year_is_not_a_year() {
        assert_eq!(normalize_name("Movie 99"), "Movie 99");
        assert_eq!(normalize_name("Movie.'99"), "Movie '99");
    }

    #[test]
    fn year_outside_range_is_not_a_year() {
        assert_eq!(normalize_name("Movie 1899"), "Movie 1899");
        assert_eq!(normalize_name("Movie 2100"), "Movie 2100");
    }

    #[test]
    fn year_must_be_a_separate_token() {
        assert_eq!(normalize_name("Movie 19999"), "Movie 19999");
        assert_eq!(normalize_name("Movie2010"), "Movie2010");
    }

    #[test]
    fn first_year_token_wins() {
        assert_eq!(normalize_name("Blade Runner 2049 (2017)"), "Blade Runner (2049)");
    }

    #[test]
    fn leading_year_without_title_is_only_cleaned() {
        assert_eq!(normalize_name("2001.A.Space.Odyssey.1968"), "2001 A Space Odyssey 1968");
        assert_eq!(normalize_name("(2019)"), "(2019)");
    }

    #[test]
    fn mixed_separators() {
        assert_eq!(normalize_name("Some.Movie Name.2012 [720p]"), "Some Movie Name (2012)");
    }
}
