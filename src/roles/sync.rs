//! Applying reconciled role grants to a Discord member.

use std::collections::HashSet;

use async_trait::async_trait;
use serenity::model::id::{RoleId, UserId};
use tracing::info;

use crate::common::error::DiscordResult;
use crate::roles::reconcile::{reconcile_roles, RoleGrant, RolePolicy};

/// Read and grant member roles on the chat platform.
#[async_trait]
pub trait RoleGateway: Send + Sync {
    async fn member_roles(&self, user: UserId) -> DiscordResult<HashSet<RoleId>>;

    async fn grant_role(&self, user: UserId, grant: &RoleGrant) -> DiscordResult<()>;
}

/// What a sync did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSyncOutcome {
    /// Grants applied by this call, in order.
    pub granted: Vec<RoleGrant>,
    /// Qualifying roles the member held before this call.
    pub already_held: Vec<RoleId>,
}

impl RoleSyncOutcome {
    /// True when the member already held every role they qualify for.
    pub fn already_satisfied(&self) -> bool {
        self.granted.is_empty()
    }
}

/// Fetch the member's roles, reconcile and apply the missing grants.
///
/// Stops at the first failed grant; earlier grants stay applied.
pub async fn sync_roles(
    gateway: &dyn RoleGateway,
    user: UserId,
    character_exists: bool,
    is_guild_member: bool,
    policy: &RolePolicy,
) -> DiscordResult<RoleSyncOutcome> {
    if !character_exists {
        return Ok(RoleSyncOutcome::default());
    }

    let current = gateway.member_roles(user).await?;
    let grants = reconcile_roles(&current, character_exists, is_guild_member, policy);

    let mut outcome = RoleSyncOutcome::default();
    if current.contains(&policy.community_role) {
        outcome.already_held.push(policy.community_role);
    }
    if is_guild_member {
        outcome
            .already_held
            .extend(policy.guild_roles.iter().filter(|role| current.contains(*role)).copied());
    }

    for grant in grants {
        gateway.grant_role(user, &grant).await?;
        info!("Granted {} role {} to user {}", grant.reason, grant.role_id, user);
        outcome.granted.push(grant);
    }
    Ok(outcome)
}
