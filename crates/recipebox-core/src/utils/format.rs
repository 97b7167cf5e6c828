/// Case-insensitive substring test. `needle` should already be lowercased.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(needle)
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Collapse free text (ingredients, instructions) onto one line for list rows
pub fn preview_line(text: &str, max_len: usize) -> String {
    let joined = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    truncate_string(&joined, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Pad Thai", "thai"));
        assert!(contains_ignore_case("ITALIAN", "ital"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("Tacos", "sushi"));
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Crème brûlée", 8), "Crème...");
    }

    #[test]
    fn test_preview_line() {
        assert_eq!(preview_line("2 eggs\n\n 1 cup flour \nsalt", 40), "2 eggs, 1 cup flour, salt");
        assert_eq!(preview_line("a\nb\nc\nd", 6), "a, ...");
    }
}
