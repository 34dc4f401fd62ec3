//! Command execution.
//!
//! Turns parsed commands into store/API calls and user-facing replies. Kept
//! free of serenity's `Context` so it can be driven directly in tests.

use std::sync::Arc;

use serenity::model::id::UserId;
use tracing::{error, info, warn};

use crate::blizzard::BlizzardApi;
use crate::common::error::ApiError;
use crate::config::types::GuildTarget;
use crate::discord::commands::{AdminCommand, Command, Parsed, ADMIN_HELP_TEXT, HELP_TEXT};
use crate::roles::{sync_roles, RoleGateway, RolePolicy, RoleSyncOutcome};
use crate::store::{CharacterRegistration, RegistrationStore};

const NOT_REGISTERED: &str =
    "You haven't registered a character yet. Use !register <character_name> <server> to register.";

/// Who sent a command and from where.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub author_id: UserId,
    pub author_name: String,
    pub is_direct_message: bool,
}

/// Result of the guild membership check during registration.
enum Membership {
    NotChecked,
    Checked(bool),
    Failed(ApiError),
}

/// Executes commands against the registration store and Blizzard API.
pub struct Dispatcher {
    store: RegistrationStore,
    api: Arc<dyn BlizzardApi>,
    policy: RolePolicy,
    guild: Option<GuildTarget>,
}

impl Dispatcher {
    pub fn new(
        store: RegistrationStore,
        api: Arc<dyn BlizzardApi>,
        policy: RolePolicy,
        guild: Option<GuildTarget>,
    ) -> Self {
        Self {
            store,
            api,
            policy,
            guild,
        }
    }

    /// Handle a parsed message. Returns the reply to send, if any.
    ///
    /// `roles` is the role gateway for the Discord server the member should
    /// be synced in; without one, registration skips role sync.
    pub async fn handle(
        &self,
        invocation: &Invocation,
        parsed: Parsed,
        roles: Option<&dyn RoleGateway>,
    ) -> Option<String> {
        match parsed {
            Parsed::Ignored => None,
            Parsed::Usage { admin: false, text } => Some(text.to_string()),
            Parsed::Usage { admin: true, text } => {
                if let Err(reply) = self.admin_gate(invocation).await? {
                    return Some(reply);
                }
                Some(text.to_string())
            }
            Parsed::Command(Command::Admin(command)) => {
                if let Err(reply) = self.admin_gate(invocation).await? {
                    return Some(reply);
                }
                Some(self.handle_admin(command).await)
            }
            Parsed::Command(Command::Register { character, realm }) => {
                Some(self.register(invocation, &character, &realm, roles).await)
            }
            Parsed::Command(Command::WhoAmI) => Some(self.whoami(invocation).await),
            Parsed::Command(Command::Guild) => Some(self.guild_info(invocation).await),
            Parsed::Command(Command::Help) => Some(HELP_TEXT.to_string()),
            Parsed::Command(Command::Ping) => Some("Pong🏓".to_string()),
            Parsed::Command(Command::Bye) => Some("Good Bye👋".to_string()),
        }
    }

    /// `None` when the invocation must be ignored silently, `Some(Err)` when
    /// the admin lookup itself failed, `Some(Ok)` when allowed.
    async fn admin_gate(&self, invocation: &Invocation) -> Option<Result<(), String>> {
        if !invocation.is_direct_message {
            return None;
        }
        match self.store.is_admin(&invocation.author_name).await {
            Ok(true) => Some(Ok(())),
            Ok(false) => None,
            Err(e) => {
                error!("Error checking admin status: {}", e);
                Some(Err(format!("Error checking admin status: {}", e)))
            }
        }
    }

    async fn register(
        &self,
        invocation: &Invocation,
        character: &str,
        realm: &str,
        roles: Option<&dyn RoleGateway>,
    ) -> String {
        info!(
            "!register from {}: {} on {}",
            invocation.author_name, character, realm
        );

        match self.api.character_exists(character, realm).await {
            Ok(true) => {}
            Ok(false) => {
                return format!(
                    "Character {} was not found on realm {}. Please check the spelling and try again.",
                    character, realm
                )
            }
            Err(e) => {
                warn!("Character lookup for {} on {} failed: {}", character, realm, e);
                return format!("Could not verify character {}: {}", character, describe_api_error(&e));
            }
        }

        let registration = CharacterRegistration::new(&invocation.author_name, character, realm);
        if let Err(e) = self.store.register_character(&registration).await {
            error!("Failed to store registration for {}: {}", invocation.author_name, e);
            return format!("Failed to register character: {}", e);
        }

        let membership = match &self.guild {
            Some(target) => match self.api.is_character_in_guild(character, realm, target.id).await {
                Ok(is_member) => Membership::Checked(is_member),
                Err(e) => {
                    warn!("Guild membership check for {} failed: {}", character, e);
                    Membership::Failed(e)
                }
            },
            None => Membership::NotChecked,
        };
        let is_member = matches!(membership, Membership::Checked(true));

        let mut reply = format!("Successfully registered character {} on server {}", character, realm);
        if let (true, Some(target)) = (is_member, &self.guild) {
            reply.push_str(&format!(" ({} member)", target.name));
        }
        if let Membership::Failed(e) = &membership {
            reply.push_str(&format!(
                "\nCould not verify guild membership ({}), so guild roles were not granted. Try registering again later.",
                describe_api_error(e)
            ));
        }

        match roles {
            Some(gateway) => {
                match sync_roles(gateway, invocation.author_id, true, is_member, &self.policy).await {
                    Ok(outcome) => reply.push_str(&describe_role_sync(&outcome)),
                    Err(e) => {
                        error!("Role sync for {} failed: {}", invocation.author_name, e);
                        reply.push_str(&format!(
                            "\nYour registration was saved, but your roles could not be updated: {}. Please contact an admin.",
                            e
                        ));
                    }
                }
            }
            None => reply.push_str("\nRoles are only synced when you register from the server."),
        }

        reply
    }

    async fn whoami(&self, invocation: &Invocation) -> String {
        match self.store.get_character(&invocation.author_name).await {
            Ok(Some(registration)) => format!(
                "Your registered character is {} on server {}",
                registration.character_name, registration.server
            ),
            Ok(None) => NOT_REGISTERED.to_string(),
            Err(e) => format!("Error: {}", e),
        }
    }

    async fn guild_info(&self, invocation: &Invocation) -> String {
        let registration = match self.store.get_character(&invocation.author_name).await {
            Ok(Some(registration)) => registration,
            Ok(None) => return NOT_REGISTERED.to_string(),
            Err(e) => return format!("Error: {}", e),
        };

        match self
            .api
            .get_guild_info(&registration.character_name, &registration.server)
            .await
        {
            Ok(Some(info)) => format!(
                "Guild: {}\nRank: {}\nFaction: {}",
                info.guild_name, info.rank, info.faction_name
            ),
            Ok(None) => "Character is not in a guild".to_string(),
            Err(e) => format!("Failed to get guild info: {}", describe_api_error(&e)),
        }
    }

    async fn handle_admin(&self, command: AdminCommand) -> String {
        match command {
            AdminCommand::AddAdmin { username } => match self.store.add_admin(&username).await {
                Ok(()) => {
                    info!("Added admin {}", username);
                    format!("Successfully added {} as admin", username)
                }
                Err(e) => format!("Error adding admin: {}", e),
            },
            AdminCommand::RemoveAdmin { username } => match self.store.remove_admin(&username).await {
                Ok(true) => format!("Successfully removed {} as admin", username),
                Ok(false) => format!("{} is not an admin", username),
                Err(e) => format!("Error removing admin: {}", e),
            },
            AdminCommand::RegisterUser {
                username,
                character,
                realm,
            } => {
                let registration = CharacterRegistration::new(&username, &character, &realm);
                match self.store.register_character(&registration).await {
                    Ok(()) => format!(
                        "Successfully registered character {} on server {} for {}",
                        character, realm, username
                    ),
                    Err(e) => format!("Error registering character: {}", e),
                }
            }
            AdminCommand::RemoveUser { username } => match self.store.remove_registration(&username).await {
                Ok(true) => format!("Successfully removed registration for {}", username),
                Ok(false) => format!("No registration found for {}", username),
                Err(e) => format!("Error removing registration: {}", e),
            },
            AdminCommand::ListUsers => match self.store.list_registrations().await {
                Ok(registrations) if registrations.is_empty() => "No registered users found".to_string(),
                Ok(registrations) => {
                    let mut response = String::from("Registered users:\n");
                    for r in registrations {
                        response.push_str(&format!(
                            "- {}: {} on {}\n",
                            r.discord_username, r.character_name, r.server
                        ));
                    }
                    response
                }
                Err(e) => format!("Error getting registrations: {}", e),
            },
            AdminCommand::Help => ADMIN_HELP_TEXT.to_string(),
        }
    }
}

/// User-facing text for a resolution failure.
pub fn describe_api_error(error: &ApiError) -> String {
    match error {
        ApiError::Validation { field } => format!("{} must not be empty", field),
        ApiError::Auth(_) => "the Blizzard API rejected our credentials, please try again later".to_string(),
        ApiError::GuildNotFound { realm, guild } => {
            format!("guild {} was not found on realm {}", guild, realm)
        }
        ApiError::Status { status, .. } => format!("the Blizzard API returned an error (status {})", status),
        ApiError::Transport(_) => "the Blizzard API could not be reached".to_string(),
        ApiError::Parse(_) => "the Blizzard API sent an unexpected response".to_string(),
    }
}

fn describe_role_sync(outcome: &RoleSyncOutcome) -> String {
    if outcome.already_satisfied() {
        return "\nYou already have all the roles you qualify for.".to_string();
    }

    let granted: Vec<String> = outcome
        .granted
        .iter()
        .map(|g| format!("<@&{}> ({})", g.role_id, g.reason))
        .collect();
    let mut summary = format!("\nGranted roles: {}", granted.join(", "));

    if !outcome.already_held.is_empty() {
        let held: Vec<String> = outcome
            .already_held
            .iter()
            .map(|role| format!("<@&{}>", role))
            .collect();
        summary.push_str(&format!("\nAlready had: {}", held.join(", ")));
    }
    summary
}
