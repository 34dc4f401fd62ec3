//! [`RoleGateway`] backed by the Discord REST API.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::http::{Http, HttpError};
use serenity::model::id::{GuildId, RoleId, UserId};
use tracing::debug;

use crate::common::error::{DiscordError, DiscordResult};
use crate::roles::{RoleGateway, RoleGrant};

/// Reads and grants roles for members of one Discord server.
pub struct SerenityRoleGateway {
    http: Arc<Http>,
    guild_id: GuildId,
}

impl SerenityRoleGateway {
    pub fn new(http: Arc<Http>, guild_id: GuildId) -> Self {
        Self { http, guild_id }
    }
}

#[async_trait]
impl RoleGateway for SerenityRoleGateway {
    async fn member_roles(&self, user: UserId) -> DiscordResult<HashSet<RoleId>> {
        match self.http.get_member(self.guild_id, user).await {
            Ok(member) => Ok(member.roles.into_iter().collect()),
            Err(serenity::Error::Http(HttpError::UnsuccessfulRequest(response)))
                if response.status_code.as_u16() == 404 =>
            {
                Err(DiscordError::MemberNotFound {
                    guild_id: self.guild_id.get(),
                    user_id: user.get(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn grant_role(&self, user: UserId, grant: &RoleGrant) -> DiscordResult<()> {
        let reason = format!("Verified WoW character ({})", grant.reason);
        debug!("Adding role {} to {} in {}", grant.role_id, user, self.guild_id);

        self.http
            .add_member_role(self.guild_id, user, grant.role_id, Some(&reason))
            .await
            .map_err(|e| DiscordError::RoleGrantFailed {
                role_id: grant.role_id.get(),
                message: e.to_string(),
            })
    }
}
