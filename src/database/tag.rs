use itertools::Itertools;

use super::Ulid;

/// Tags are flexible, events can carry any number of them. They are created
/// on demand the first time a name is referenced.
#[derive(Debug, Clone, Default, sqlx::FromRow, serde::Serialize)]
pub struct Tag {
    pub id: Ulid,
    pub name: String,
}

/// Normalizes a comma-separated tag input into the distinct tag names it
/// references: segments are trimmed, empty segments discarded, duplicates
/// collapsed (first occurrence wins).
pub fn parse_tag_names(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .unique()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_discards_empty_segments() {
        assert_eq!(parse_tag_names("a, b ,, c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(parse_tag_names("  rust ,  async  "), vec!["rust", "async"]);
    }

    #[test]
    fn test_parse_deduplicates() {
        assert_eq!(parse_tag_names("rust, async, rust"), vec!["rust", "async"]);
    }

    #[test]
    fn test_parse_idempotent() {
        let first = parse_tag_names("a, b ,, c");
        let again = parse_tag_names(&first.join(", "));
        assert_eq!(first, again);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_tag_names("").is_empty());
        assert!(parse_tag_names(" , , ").is_empty());
    }
}
