//! In-memory [`BlizzardApi`] used by dispatcher and pipeline tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::blizzard::api::{BlizzardApi, Guild, GuildMembership, GuildRank, Realm};
use crate::blizzard::slug::{character_key, slugify};
use crate::common::error::{ApiError, ApiResult};

/// Characters keyed by `name-realmslug`, rosters keyed by `realmslug/guildslug`.
#[derive(Default)]
pub struct MockBlizzardApi {
    characters: Mutex<HashMap<String, Option<Guild>>>,
    rosters: Mutex<HashMap<String, Vec<(String, u32)>>>,
    failing: Mutex<Option<u16>>,
    pub roster_calls: AtomicUsize,
}

impl MockBlizzardApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str, realm: &str) -> ApiResult<String> {
        Ok(format!("{}-{}", character_key(name)?, slugify(realm, "realm")?))
    }

    pub fn add_character(&self, name: &str, realm: &str, guild: Option<Guild>) {
        let key = Self::key(name, realm).unwrap();
        self.characters.lock().unwrap().insert(key, guild);
    }

    pub fn add_roster(&self, realm_slug: &str, guild_slug: &str, members: &[(&str, u32)]) {
        self.rosters.lock().unwrap().insert(
            format!("{}/{}", realm_slug, guild_slug),
            members.iter().map(|(n, r)| (n.to_string(), *r)).collect(),
        );
    }

    /// Make every lookup fail with the given HTTP status.
    pub fn fail_with(&self, status: u16) {
        *self.failing.lock().unwrap() = Some(status);
    }

    fn check_failing(&self) -> ApiResult<()> {
        match *self.failing.lock().unwrap() {
            Some(status) => Err(ApiError::Status {
                status,
                detail: "mock failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// A guild on a single realm, as the character endpoint would report it.
pub fn test_guild(name: &str, id: u64, realm: &str) -> Guild {
    Guild {
        name: name.to_string(),
        id,
        realm: Realm {
            name: realm.to_string(),
            id: 1,
            slug: realm.to_lowercase().replace(' ', "-"),
        },
        faction_name: "Horde".to_string(),
    }
}

#[async_trait]
impl BlizzardApi for MockBlizzardApi {
    async fn character_exists(&self, name: &str, realm: &str) -> ApiResult<bool> {
        let key = Self::key(name, realm)?;
        self.check_failing()?;
        Ok(self.characters.lock().unwrap().contains_key(&key))
    }

    async fn get_character_guild(&self, name: &str, realm: &str) -> ApiResult<Option<Guild>> {
        let key = Self::key(name, realm)?;
        self.check_failing()?;
        Ok(self.characters.lock().unwrap().get(&key).cloned().flatten())
    }

    async fn get_guild_member_info(
        &self,
        name: &str,
        realm_slug: &str,
        guild_slug: &str,
    ) -> ApiResult<Option<GuildMembership>> {
        self.roster_calls.fetch_add(1, Ordering::SeqCst);
        let wanted = character_key(name)?;
        let rosters = self.rosters.lock().unwrap();
        let Some(members) = rosters.get(&format!("{}/{}", realm_slug, guild_slug)) else {
            return Err(ApiError::GuildNotFound {
                realm: realm_slug.to_string(),
                guild: guild_slug.to_string(),
            });
        };

        Ok(members
            .iter()
            .find(|(member, _)| member.to_lowercase() == wanted)
            .map(|(member, rank)| GuildMembership {
                character_name: member.clone(),
                realm_slug: realm_slug.to_string(),
                rank: GuildRank::Known(*rank),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blizzard::api::GuildInfo;

    #[tokio::test]
    async fn test_guild_info_with_rank() {
        let api = MockBlizzardApi::new();
        api.add_character("Arthas", "Stormrage", Some(test_guild("Stand and Deliver", 70395110, "Stormrage")));
        api.add_roster("stormrage", "stand-and-deliver", &[("Jaina", 0), ("Arthas", 2)]);

        let info = api.get_guild_info("arthas", "stormrage").await.unwrap().unwrap();
        assert_eq!(
            info,
            GuildInfo {
                guild_name: "Stand and Deliver".to_string(),
                rank: GuildRank::Known(2),
                faction_name: "Horde".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_guild_info_unknown_rank_without_roster() {
        let api = MockBlizzardApi::new();
        api.add_character("Arthas", "Stormrage", Some(test_guild("Stand and Deliver", 70395110, "Stormrage")));

        let info = api.get_guild_info("Arthas", "Stormrage").await.unwrap().unwrap();
        assert_eq!(info.rank, GuildRank::Unknown);
        assert_eq!(info.guild_name, "Stand and Deliver");
    }

    #[tokio::test]
    async fn test_guild_info_unknown_rank_when_off_roster() {
        let api = MockBlizzardApi::new();
        api.add_character("Arthas", "Stormrage", Some(test_guild("Stand and Deliver", 70395110, "Stormrage")));
        api.add_roster("stormrage", "stand-and-deliver", &[("Jaina", 0)]);

        let info = api.get_guild_info("Arthas", "Stormrage").await.unwrap().unwrap();
        assert_eq!(info.rank, GuildRank::Unknown);
    }

    #[tokio::test]
    async fn test_guildless_character_not_in_any_guild() {
        let api = MockBlizzardApi::new();
        api.add_character("Loner", "Stormrage", None);

        assert!(api.character_exists("Loner", "Stormrage").await.unwrap());
        for gid in [0, 1, 70395110, u64::MAX] {
            assert!(!api.is_character_in_guild("Loner", "Stormrage", gid).await.unwrap());
        }
        assert!(api.get_guild_info("Loner", "Stormrage").await.unwrap().is_none());
        assert_eq!(api.roster_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_character_skips_roster() {
        let api = MockBlizzardApi::new();

        assert!(!api.character_exists("Nobody", "Fakerealm").await.unwrap());
        assert!(api.get_character_guild("Nobody", "Fakerealm").await.unwrap().is_none());
        assert!(api.get_guild_info("Nobody", "Fakerealm").await.unwrap().is_none());
        assert_eq!(api.roster_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_guild_lookup_failure_propagates() {
        let api = MockBlizzardApi::new();
        api.add_character("Arthas", "Stormrage", Some(test_guild("Stand and Deliver", 70395110, "Stormrage")));
        api.fail_with(500);

        let err = api.get_guild_info("Arthas", "Stormrage").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
        assert_eq!(api.roster_calls.load(Ordering::SeqCst), 0);
    }
}
