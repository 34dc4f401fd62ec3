//! Blizzard profile API payloads.
//!
//! Only the fields the bot reads are modelled; everything else in the
//! responses is ignored by serde.

use serde::Deserialize;

/// `GET /profile/wow/character/{realm}/{name}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterProfile {
    pub faction: Option<FactionRef>,
    pub guild: Option<GuildRef>,
}

/// Guild sub-object of a character profile.
///
/// Guildless characters may carry an empty object here, so every field
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuildRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub realm: RealmRef,
    pub faction: Option<FactionRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RealmRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FactionRef {
    #[serde(default)]
    pub name: String,
}

/// `GET /data/wow/guild/{realm}/{guild}/roster` response.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildRoster {
    #[serde(default)]
    pub members: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    pub character: RosterCharacter,
    pub rank: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterCharacter {
    pub name: String,
    #[serde(default)]
    pub realm: RealmRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_with_guild() {
        let json = r#"{
            "id": 123,
            "name": "Arthas",
            "realm": {"key": {"href": "x"}, "name": "Stormrage", "id": 60, "slug": "stormrage"},
            "faction": {"type": "HORDE", "name": "Horde"},
            "guild": {
                "name": "Stand and Deliver",
                "id": 70395110,
                "realm": {"name": "Stormrage", "id": 60, "slug": "stormrage"},
                "faction": {"type": "HORDE", "name": "Horde"}
            },
            "level": 80
        }"#;
        let profile: CharacterProfile = serde_json::from_str(json).unwrap();
        let guild = profile.guild.unwrap();
        assert_eq!(guild.id, 70395110);
        assert_eq!(guild.realm.slug, "stormrage");
        assert_eq!(guild.faction.unwrap().name, "Horde");
        assert_eq!(profile.faction.unwrap().name, "Horde");
    }

    #[test]
    fn test_profile_with_empty_guild_object() {
        let json = r#"{"name": "Loner", "realm": {"name": "Stormrage", "id": 60, "slug": "stormrage"}, "guild": {}}"#;
        let profile: CharacterProfile = serde_json::from_str(json).unwrap();
        assert!(profile.guild.unwrap().name.is_empty());
        assert!(profile.faction.is_none());
    }

    #[test]
    fn test_roster_parsing() {
        let json = r#"{
            "guild": {"name": "Stand and Deliver", "id": 70395110},
            "members": [
                {"character": {"name": "Jaina", "id": 1, "realm": {"id": 60, "slug": "stormrage"}}, "rank": 0},
                {"character": {"name": "Arthas", "id": 2, "realm": {"id": 60, "slug": "stormrage"}}, "rank": 4}
            ]
        }"#;
        let roster: GuildRoster = serde_json::from_str(json).unwrap();
        assert_eq!(roster.members.len(), 2);
        assert_eq!(roster.members[1].rank, 4);
        assert_eq!(roster.members[1].character.realm.slug, "stormrage");
    }
}
