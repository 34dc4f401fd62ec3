//! Realm, guild and character name normalization.
//!
//! The Blizzard API addresses realms and guilds by slug (`area-52`,
//! `stand-and-deliver`) and characters by their lower-cased name.

use crate::common::error::{ApiError, ApiResult};

/// Convert a realm or guild name into its API slug.
///
/// Lower-cases, trims surrounding whitespace and replaces internal spaces
/// with hyphens. Fails with [`ApiError::Validation`] when nothing is left
/// after trimming.
pub fn slugify(raw: &str, field: &'static str) -> ApiResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation { field });
    }
    Ok(trimmed.to_lowercase().replace(' ', "-"))
}

/// Normalize a character name for a profile lookup.
///
/// Character names are lower-cased and trimmed, never hyphenated.
pub fn character_key(raw: &str) -> ApiResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation { field: "character name" });
    }
    Ok(trimmed.to_lowercase())
}

/// Case-insensitive character name comparison.
pub fn same_character(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Stormrage", "realm").unwrap(), "stormrage");
        assert_eq!(slugify("Area 52", "realm").unwrap(), "area-52");
        assert_eq!(
            slugify("  Stand and Deliver ", "guild").unwrap(),
            "stand-and-deliver"
        );
    }

    #[test]
    fn test_slugify_is_idempotent() {
        let inputs = [
            "Stormrage",
            "Area 52",
            "  Stand and Deliver ",
            "already-a-slug",
            "Kel'Thuzad",
            "Twisting  Nether",
            "ÉLUNE",
        ];
        for input in inputs {
            let once = slugify(input, "realm").unwrap();
            let twice = slugify(&once, "realm").unwrap();
            assert_eq!(once, twice, "slugify not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_slugify_rejects_blank() {
        assert!(matches!(
            slugify("", "realm"),
            Err(ApiError::Validation { field: "realm" })
        ));
        assert!(matches!(
            slugify("   ", "guild"),
            Err(ApiError::Validation { field: "guild" })
        ));
    }

    #[test]
    fn test_character_key_not_hyphenated() {
        assert_eq!(character_key(" Arthas ").unwrap(), "arthas");
        assert!(character_key("\t").is_err());
    }

    #[test]
    fn test_same_character_ignores_case() {
        assert!(same_character("ARTHAS", "arthas"));
        assert!(!same_character("Arthas", "Jaina"));
    }
}
