// Utility functions

/// Case-insensitive substring match in either direction. Tolerates partial
/// and compound municipality names ("Oslo" vs "Oslo kommune").
pub fn contains_either_way(field: &str, term: &str) -> bool {
    let field = field.trim().to_lowercase();
    let term = term.trim().to_lowercase();
    if field.is_empty() || term.is_empty() {
        return false;
    }
    field.contains(&term) || term.contains(&field)
}

/// Parses a percentage such as `"12,4 %"`, `"4.5%"` or `"7"`.
pub fn parse_percentage(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .trim()
        .replace(',', ".")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Sort key giving Norwegian alphabetical order: æ, ø, å after z.
pub fn norwegian_sort_key(text: &str) -> Vec<u32> {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'æ' => 'z' as u32 + 1,
            'ø' | 'ö' => 'z' as u32 + 2,
            'å' => 'z' as u32 + 3,
            'ä' => 'z' as u32 + 1,
            other => other as u32,
        })
        .collect()
}

/// Search text safe for a `like` pattern: trimmed, lower-cased, at most 100
/// characters, `%`, `_` and `\\` escaped and `*` wildcards removed.
pub fn search_term(term: &str) -> String {
    let mut escaped = String::new();
    for c in term.trim().to_lowercase().chars().take(100) {
        match c {
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '*' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn either_way_matching_handles_compound_names() {
        assert!(contains_either_way("Oslo kommune", "oslo"));
        assert!(contains_either_way("Oslo", "oslo kommune"));
        assert!(!contains_either_way("Bergen", "Oslo"));
        assert!(!contains_either_way("", "Oslo"));
    }

    #[test]
    fn percentages_parse_with_comma_or_dot() {
        assert_eq!(parse_percentage("12,4 %"), Some(12.4));
        assert_eq!(parse_percentage("4.5%"), Some(4.5));
        assert_eq!(parse_percentage(" 7 "), Some(7.0));
        assert_eq!(parse_percentage("fra 9 %"), None);
        assert_eq!(parse_percentage(""), None);
    }

    #[test]
    fn norwegian_letters_sort_last() {
        let mut names = vec!["Ålesund", "Bergen", "Ørland", "Zeta", "Ænes"];
        names.sort_by_key(|n| norwegian_sort_key(n));
        assert_eq!(names, vec!["Bergen", "Zeta", "Ænes", "Ørland", "Ålesund"]);
    }

    #[test]
    fn search_terms_escape_wildcards() {
        assert_eq!(search_term("  Oslo "), "oslo");
        assert_eq!(search_term("50%_OFF*"), "50\\%\\_off");
        assert_eq!(search_term(&"Å".repeat(120)).chars().count(), 100);
    }
}
