use std::collections::HashSet;

/// Hard cap on the numeric suffix search so a pathological taken-set cannot
/// spin forever.
const MAX_SUFFIX: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("nothing slug-worthy in input")]
    Empty,
    #[error("exhausted slug suffixes for {0}")]
    Exhausted(String),
}

/// Normalizes a title or name into a URL-safe slug: lowercase, runs of
/// non-alphanumeric characters become a single hyphen, no leading or
/// trailing hyphens.
pub fn slugify(base: &str) -> String {
    let mut slug = String::with_capacity(base.len());
    let mut pending_hyphen = false;

    for c in base.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Produces a slug for `base` that is not in `taken`.
///
/// Collisions are first disambiguated with the optional `discriminator`
/// (events pass the start date as `YYYYMMDD`), then with an incrementing
/// numeric suffix. Deterministic for a fixed `taken` set.
pub fn unique_slugify(
    base: &str,
    discriminator: Option<&str>,
    taken: &HashSet<String>,
) -> Result<String, SlugError> {
    let slug = slugify(base);
    if slug.is_empty() {
        return Err(SlugError::Empty);
    }

    if !taken.contains(&slug) {
        return Ok(slug);
    }

    let slug = match discriminator {
        Some(discriminator) => {
            let discriminated = format!("{}-{}", slug, slugify(discriminator));
            if !taken.contains(&discriminated) {
                return Ok(discriminated);
            }
            discriminated
        }
        None => slug,
    };

    for n in 2..=MAX_SUFFIX {
        let candidate = format!("{}-{}", slug, n);
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
    }

    Err(SlugError::Exhausted(slug))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taken(slugs: &[&str]) -> HashSet<String> {
        slugs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust 2021  "), "rust-2021");
        assert_eq!(slugify("a---b"), "a-b");
        assert_eq!(slugify("ÅSA Löfgren"), "åsa-löfgren");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_no_collision_returns_base() {
        let slug = unique_slugify("Intro to Rust", None, &taken(&[])).unwrap();
        assert_eq!(slug, "intro-to-rust");
    }

    #[test]
    fn test_collision_appends_numeric_suffix() {
        let existing = taken(&["intro-to-rust"]);
        assert_eq!(unique_slugify("Intro to Rust", None, &existing).unwrap(), "intro-to-rust-2");

        let existing = taken(&["intro-to-rust", "intro-to-rust-2"]);
        assert_eq!(unique_slugify("Intro to Rust", None, &existing).unwrap(), "intro-to-rust-3");
    }

    #[test]
    fn test_collision_prefers_discriminator() {
        let existing = taken(&["town-hall"]);
        let slug = unique_slugify("Town Hall", Some("20260823"), &existing).unwrap();
        assert_eq!(slug, "town-hall-20260823");

        let existing = taken(&["town-hall", "town-hall-20260823"]);
        let slug = unique_slugify("Town Hall", Some("20260823"), &existing).unwrap();
        assert_eq!(slug, "town-hall-20260823-2");
    }

    #[test]
    fn test_deterministic() {
        let existing = taken(&["weekly-update", "weekly-update-2"]);
        let a = unique_slugify("Weekly Update", None, &existing).unwrap();
        let b = unique_slugify("Weekly Update", None, &existing).unwrap();
        assert_eq!(a, b);
        assert!(!existing.contains(&a));
    }

    #[test]
    fn test_empty_base() {
        assert_eq!(unique_slugify("???", None, &taken(&[])), Err(SlugError::Empty));
    }

    #[test]
    fn test_exhaustion() {
        let mut existing = taken(&["x"]);
        for n in 2..=MAX_SUFFIX {
            existing.insert(format!("x-{}", n));
        }
        assert!(matches!(
            unique_slugify("x", None, &existing),
            Err(SlugError::Exhausted(_))
        ));
    }
}
