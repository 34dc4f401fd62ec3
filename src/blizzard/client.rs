//! HTTP-backed Blizzard API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::blizzard::api::{BlizzardApi, Guild, GuildMembership, GuildRank, Realm};
use crate::blizzard::models::{CharacterProfile, GuildRoster};
use crate::blizzard::slug::{character_key, same_character, slugify};
use crate::blizzard::token::{ClientCredentials, TokenManager};
use crate::common::error::{ApiError, ApiResult, ConfigError};
use crate::config::types::BlizzardConfig;

/// Outcome of a bearer-authenticated GET.
enum Fetched<T> {
    Found(T),
    NotFound,
}

/// Blizzard API client with a shared, lazily refreshed token.
pub struct BlizzardClient {
    http: reqwest::Client,
    api_base: Url,
    namespace: String,
    locale: String,
    tokens: TokenManager,
}

impl BlizzardClient {
    /// Build a client from configuration.
    pub fn from_config(config: &BlizzardConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "blizzard".to_string(),
                message: e.to_string(),
            })?;

        let tokens = TokenManager::new(ClientCredentials::new(
            http.clone(),
            config.oauth_url(),
            config.client_id.clone(),
            config.client_secret.clone(),
        ));

        Self::new(http, &config.api_url(), &config.namespace, &config.locale, tokens)
    }

    pub fn new(
        http: reqwest::Client,
        api_base: &str,
        namespace: &str,
        locale: &str,
        tokens: TokenManager,
    ) -> Result<Self, ConfigError> {
        let api_base = Url::parse(api_base).map_err(|e| ConfigError::InvalidValue {
            field: "blizzard.api_url".to_string(),
            message: e.to_string(),
        })?;
        if api_base.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                field: "blizzard.api_url".to_string(),
                message: format!("'{}' cannot be used as a base URL", api_base),
            });
        }

        Ok(Self {
            http,
            api_base,
            namespace: namespace.to_string(),
            locale: locale.to_string(),
            tokens,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Bearer-authenticated GET. 404 maps to [`Fetched::NotFound`]; any other
    /// non-2xx status is an [`ApiError::Status`]. The body is left unread on
    /// success.
    async fn get(&self, url: Url) -> ApiResult<Fetched<reqwest::Response>> {
        let token = self.tokens.get_valid_token().await?;

        debug!("GET {}", url.path());
        let response = self
            .http
            .get(url)
            .bearer_auth(&token.value)
            .query(&[("namespace", &self.namespace), ("locale", &self.locale)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Fetched::NotFound);
        }
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(Fetched::Found(response))
    }

    /// GET and decode a JSON document.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ApiResult<Fetched<T>> {
        match self.get(url).await? {
            Fetched::Found(response) => {
                let body = response.bytes().await?;
                Ok(Fetched::Found(serde_json::from_slice(&body)?))
            }
            Fetched::NotFound => Ok(Fetched::NotFound),
        }
    }

    async fn character_profile(&self, name: &str, realm: &str) -> ApiResult<Option<CharacterProfile>> {
        let name = character_key(name)?;
        let realm = slugify(realm, "realm")?;
        let url = self.endpoint(&["profile", "wow", "character", &realm, &name]);

        match self.get_json(url).await? {
            Fetched::Found(profile) => Ok(Some(profile)),
            Fetched::NotFound => Ok(None),
        }
    }
}

#[async_trait]
impl BlizzardApi for BlizzardClient {
    async fn character_exists(&self, name: &str, realm: &str) -> ApiResult<bool> {
        let name = character_key(name)?;
        let realm = slugify(realm, "realm")?;
        let url = self.endpoint(&["profile", "wow", "character", &realm, &name]);

        match self.get(url).await? {
            Fetched::Found(_) => Ok(true),
            Fetched::NotFound => Ok(false),
        }
    }

    async fn get_character_guild(&self, name: &str, realm: &str) -> ApiResult<Option<Guild>> {
        let Some(profile) = self.character_profile(name, realm).await? else {
            return Ok(None);
        };

        let character_faction = profile.faction.map(|f| f.name).unwrap_or_default();
        let guild = match profile.guild {
            Some(guild) if !guild.name.is_empty() => guild,
            _ => return Ok(None),
        };

        Ok(Some(Guild {
            name: guild.name,
            id: guild.id,
            realm: Realm {
                name: guild.realm.name,
                id: guild.realm.id,
                slug: guild.realm.slug,
            },
            faction_name: guild
                .faction
                .map(|f| f.name)
                .filter(|name| !name.is_empty())
                .unwrap_or(character_faction),
        }))
    }

    async fn get_guild_member_info(
        &self,
        name: &str,
        realm_slug: &str,
        guild_slug: &str,
    ) -> ApiResult<Option<GuildMembership>> {
        character_key(name)?;
        let realm_slug = slugify(realm_slug, "realm")?;
        let guild_slug = slugify(guild_slug, "guild")?;
        let url = self.endpoint(&["data", "wow", "guild", &realm_slug, &guild_slug, "roster"]);

        let roster: GuildRoster = match self.get_json(url).await? {
            Fetched::Found(roster) => roster,
            Fetched::NotFound => {
                return Err(ApiError::GuildNotFound {
                    realm: realm_slug,
                    guild: guild_slug,
                })
            }
        };

        Ok(roster
            .members
            .into_iter()
            .find(|entry| same_character(&entry.character.name, name))
            .map(|entry| GuildMembership {
                character_name: entry.character.name,
                realm_slug: if entry.character.realm.slug.is_empty() {
                    realm_slug.clone()
                } else {
                    entry.character.realm.slug
                },
                rank: GuildRank::Known(entry.rank),
            }))
    }
}
