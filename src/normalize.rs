//! Canonicalization of individual field values before they enter a record.
//!
//! Everything here is pure: no function touches a record or fails loudly.
//! A DOI that does not look like one is reported as such and the caller
//! decides what to do with it.

use std::sync::OnceLock;

use regex::Regex;

const DOI_PATTERN: &str = r"(?xi)
    ^(
        (\(?doi(\s)*\)?:?(\s)*)         # 'doi:' or 'doi' or '(doi)'
        |(https?://(dx\.)?doi\.org/)    # or 'http://(dx.)doi.org/'
    )?
    (?P<doi>10\.                        # 10. is mandatory
    \d{4}                               # registrant, four digits
    (/|%2f)                             # / (possibly urlencoded)
    [\w\-_:;()/.<>]+                    # suffix
    [\w\-_:;()/<>])                     # last suffix char is not a full stop
";

fn doi_regex() -> &'static Regex {
    static DOI_REGEX: OnceLock<Regex> = OnceLock::new();
    DOI_REGEX.get_or_init(|| Regex::new(DOI_PATTERN).expect("DOI pattern compiles"))
}

/// Returns true if `raw` starts with something shaped like a DOI.
///
/// Accepts the bare form (`10.1234/abc`) as well as `doi:`, `(doi)` and
/// `https://doi.org/` style prefixes. Only the start of the string is
/// anchored.
pub fn is_valid_doi(raw: &str) -> bool {
    doi_regex().is_match(raw)
}

/// A name fragment is initials if it holds only `A-Z`, `.` and spaces,
/// with at least one letter.
pub fn is_author_initials(fragment: &str) -> bool {
    fragment.chars().any(|c| c.is_ascii_uppercase())
        && fragment
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == '.' || c == ' ')
}

/// Normalize a `"surname, rest"` author name.
///
/// When `rest` is made of initials they are compacted to `J.K.` form.
/// Names without a comma are returned as given.
pub fn normalize_author_name(full_name: &str) -> String {
    let Some((surname, rest)) = full_name.split_once(',') else {
        return full_name.to_string();
    };

    let surname = surname.trim_end();
    let rest = rest.trim();
    if rest.is_empty() {
        return full_name.trim().to_string();
    }

    if is_author_initials(rest) {
        let initials: String = rest
            .chars()
            .filter(char::is_ascii_uppercase)
            .map(|c| format!("{c}."))
            .collect();
        format!("{surname}, {initials}")
    } else {
        format!("{surname}, {rest}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doi_bare() {
        assert!(is_valid_doi("10.1103/PhysRevD.94.054021"));
        assert!(is_valid_doi("10.1088/1475-7516/2016/09/012"));
    }

    #[test]
    fn doi_with_prefixes() {
        assert!(is_valid_doi("doi:10.1103/PhysRevLett.116.061102"));
        assert!(is_valid_doi("DOI: 10.1103/PhysRevLett.116.061102"));
        assert!(is_valid_doi("(doi)10.1103/PhysRevLett.116.061102"));
        assert!(is_valid_doi("https://doi.org/10.1016/j.physletb.2012.08.020"));
        assert!(is_valid_doi("http://dx.doi.org/10.1016/j.physletb.2012.08.020"));
    }

    #[test]
    fn doi_urlencoded_slash() {
        assert!(is_valid_doi("10.1234%2fabcd"));
        assert!(is_valid_doi("10.1234%2Fabcd"));
    }

    #[test]
    fn doi_rejected() {
        assert!(!is_valid_doi("not-a-doi"));
        assert!(!is_valid_doi(""));
        assert!(!is_valid_doi("10.123/abc"));
        assert!(!is_valid_doi("11.1234/abc"));
        assert!(!is_valid_doi("10.1234/"));
        assert!(!is_valid_doi("10.1234/."));
        assert!(!is_valid_doi("see 10.1234/abc"));
    }

    #[test]
    fn initials() {
        assert!(is_author_initials("J.K."));
        assert!(is_author_initials(" J. K."));
        assert!(is_author_initials("JK"));
        assert!(!is_author_initials("John"));
        assert!(!is_author_initials("J.-P."));
        assert!(!is_author_initials("j.k."));
        assert!(!is_author_initials("."));
        assert!(!is_author_initials(". ."));
    }

    #[test]
    fn name_with_initials_compacted() {
        assert_eq!(normalize_author_name("Smith, J. K."), "Smith, J.K.");
        assert_eq!(normalize_author_name("Smith, J K"), "Smith, J.K.");
        assert_eq!(normalize_author_name("Smith,J.K."), "Smith, J.K.");
    }

    #[test]
    fn name_with_given_name_kept() {
        assert_eq!(normalize_author_name("Smith, John"), "Smith, John");
        assert_eq!(normalize_author_name("Smith, John Paul"), "Smith, John Paul");
    }

    #[test]
    fn name_without_comma_unchanged() {
        assert_eq!(normalize_author_name("John Smith"), "John Smith");
        assert_eq!(normalize_author_name("CMS Collaboration"), "CMS Collaboration");
    }

    #[test]
    fn name_with_trailing_comma() {
        assert_eq!(normalize_author_name("Smith, "), "Smith,");
    }

    #[test]
    fn name_with_only_periods_kept() {
        assert_eq!(normalize_author_name("Smith, ."), "Smith, .");
        assert_eq!(normalize_author_name("Smith, . ."), "Smith, . .");
    }
}
