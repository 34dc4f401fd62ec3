//! Role reconciliation.
//!
//! Computes which roles a verified member is missing. Only the community
//! role and the entry-level guild role are granted automatically; higher
//! guild tiers are assigned by hand.

use std::collections::HashSet;
use std::fmt;

use serenity::model::id::RoleId;

/// Roles handed out on verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    /// Granted to every member with a verified character.
    pub community_role: RoleId,
    /// Guild roles ordered from lowest to highest tier.
    pub guild_roles: Vec<RoleId>,
}

/// Why a role is being granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantReason {
    Community,
    GuildMember,
}

impl fmt::Display for GrantReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Community => write!(f, "community"),
            Self::GuildMember => write!(f, "guild-member"),
        }
    }
}

/// A role that should be added to the member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGrant {
    pub role_id: RoleId,
    pub reason: GrantReason,
}

/// Compute the grants needed to bring `current` in line with the member's
/// verified status. Roles already held are never granted again.
pub fn reconcile_roles(
    current: &HashSet<RoleId>,
    character_exists: bool,
    is_guild_member: bool,
    policy: &RolePolicy,
) -> Vec<RoleGrant> {
    let mut grants = Vec::new();
    if !character_exists {
        return grants;
    }

    if !current.contains(&policy.community_role) {
        grants.push(RoleGrant {
            role_id: policy.community_role,
            reason: GrantReason::Community,
        });
    }

    if is_guild_member && !policy.guild_roles.iter().any(|role| current.contains(role)) {
        if let Some(&entry_role) = policy.guild_roles.first() {
            grants.push(RoleGrant {
                role_id: entry_role,
                reason: GrantReason::GuildMember,
            });
        }
    }

    grants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RolePolicy {
        RolePolicy {
            community_role: RoleId::new(100),
            guild_roles: vec![RoleId::new(201), RoleId::new(202), RoleId::new(203)],
        }
    }

    fn roles(ids: &[u64]) -> HashSet<RoleId> {
        ids.iter().copied().map(RoleId::new).collect()
    }

    #[test]
    fn test_unverified_gets_nothing() {
        assert!(reconcile_roles(&roles(&[]), false, true, &policy()).is_empty());
        assert!(reconcile_roles(&roles(&[]), false, false, &policy()).is_empty());
    }

    #[test]
    fn test_verified_non_member_gets_community_only() {
        let grants = reconcile_roles(&roles(&[]), true, false, &policy());
        assert_eq!(
            grants,
            vec![RoleGrant {
                role_id: RoleId::new(100),
                reason: GrantReason::Community,
            }]
        );
    }

    #[test]
    fn test_member_gets_community_and_entry_tier() {
        let grants = reconcile_roles(&roles(&[]), true, true, &policy());
        assert_eq!(grants.len(), 2);
        assert_eq!(grants[1].role_id, RoleId::new(201));
        assert_eq!(grants[1].reason, GrantReason::GuildMember);
    }

    #[test]
    fn test_higher_tier_suppresses_entry_grant() {
        let grants = reconcile_roles(&roles(&[100, 203]), true, true, &policy());
        assert!(grants.is_empty());
    }

    #[test]
    fn test_second_pass_is_idempotent() {
        let policy = policy();
        let mut current = roles(&[42]);

        let first = reconcile_roles(&current, true, true, &policy);
        assert_eq!(first.len(), 2);
        current.extend(first.iter().map(|g| g.role_id));

        let second = reconcile_roles(&current, true, true, &policy);
        assert!(second.is_empty());
    }

    #[test]
    fn test_empty_guild_role_list() {
        let policy = RolePolicy {
            community_role: RoleId::new(100),
            guild_roles: Vec::new(),
        };
        let grants = reconcile_roles(&roles(&[100]), true, true, &policy);
        assert!(grants.is_empty());
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(GrantReason::Community.to_string(), "community");
        assert_eq!(GrantReason::GuildMember.to_string(), "guild-member");
    }
}
