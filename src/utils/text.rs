//! Text processing utilities.

/// Check if content has meaningful text (anything beyond whitespace).
pub fn has_meaningful_content(content: &str) -> bool {
    content.chars().any(|c| !c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_meaningful_content() {
        assert!(!has_meaningful_content(""));
        assert!(!has_meaningful_content("   \n\n   "));
        assert!(!has_meaningful_content(&" \t".repeat(1000)));
        assert!(has_meaningful_content("a"));
        assert!(has_meaningful_content(
            "This is a meaningful piece of content."
        ));
    }
}
