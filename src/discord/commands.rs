//! Discord bot commands (!register, !guild, admin commands, etc).
//!
//! Parsing only; execution lives in [`crate::discord::dispatch`].

use tracing::debug;

/// A recognised command with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!register <character> <realm>`
    Register { character: String, realm: String },
    /// `!whoami`
    WhoAmI,
    /// `!guild`
    Guild,
    /// `!help`
    Help,
    /// `!ping`
    Ping,
    /// `!bye`
    Bye,
    /// DM-only admin commands.
    Admin(AdminCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    AddAdmin { username: String },
    RemoveAdmin { username: String },
    RegisterUser { username: String, character: String, realm: String },
    RemoveUser { username: String },
    ListUsers,
    Help,
}

impl AdminCommand {
    /// Usage line shown when arguments don't match.
    pub fn usage(name: &str) -> Option<&'static str> {
        match name {
            "!addadmin" => Some("Usage: !addadmin <discord_username>"),
            "!removeadmin" => Some("Usage: !removeadmin <discord_username>"),
            "!register-user" => Some("Usage: !register-user <discord_username> <character_name> <server>"),
            "!remove-user" => Some("Usage: !remove-user <discord_username>"),
            _ => None,
        }
    }
}

/// Result of parsing a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// Not addressed to the bot.
    Ignored,
    /// A known command with wrong arguments.
    Usage { admin: bool, text: &'static str },
    Command(Command),
}

pub const REGISTER_USAGE: &str = "Usage: !register <character_name> <server>";

pub const HELP_TEXT: &str = "Available commands:
!help - Show this help message
!register <character_name> <server> - Register your character
!whoami - Show your registered character
!guild - Show your guild information
!ping - Pong
!bye - Say goodbye";

pub const ADMIN_HELP_TEXT: &str = "Available admin commands (DM only):
!admin-help - Show this help message
!addadmin <discord_username> - Add a new admin
!removeadmin <discord_username> - Remove an admin
!register-user <discord_username> <character_name> <server> - Register a character for a user
!remove-user <discord_username> - Remove a user's registration
!list-users - List all registered users";

/// Parse a message into a command.
///
/// Realm names may contain spaces, so the realm is everything after the
/// character name.
pub fn parse_command(content: &str) -> Parsed {
    let args: Vec<&str> = content.split_whitespace().collect();
    let Some(&name) = args.first() else {
        return Parsed::Ignored;
    };
    if !name.starts_with('!') {
        return Parsed::Ignored;
    }
    let name = name.to_lowercase();

    debug!("Processing command: {} with {} args", name, args.len() - 1);

    let command = match name.as_str() {
        "!register" => match args.len() {
            n if n >= 3 => Command::Register {
                character: args[1].to_string(),
                realm: args[2..].join(" "),
            },
            _ => {
                return Parsed::Usage {
                    admin: false,
                    text: REGISTER_USAGE,
                }
            }
        },
        "!whoami" => Command::WhoAmI,
        "!guild" => Command::Guild,
        "!help" => Command::Help,
        "!ping" => Command::Ping,
        "!bye" => Command::Bye,
        "!admin-help" => Command::Admin(AdminCommand::Help),
        "!list-users" => Command::Admin(AdminCommand::ListUsers),
        "!addadmin" | "!removeadmin" | "!remove-user" => {
            if args.len() != 2 {
                return admin_usage(&name);
            }
            let username = args[1].to_string();
            Command::Admin(match name.as_str() {
                "!addadmin" => AdminCommand::AddAdmin { username },
                "!removeadmin" => AdminCommand::RemoveAdmin { username },
                _ => AdminCommand::RemoveUser { username },
            })
        }
        "!register-user" => {
            if args.len() < 4 {
                return admin_usage(&name);
            }
            Command::Admin(AdminCommand::RegisterUser {
                username: args[1].to_string(),
                character: args[2].to_string(),
                realm: args[3..].join(" "),
            })
        }
        _ => return Parsed::Ignored,
    };

    Parsed::Command(command)
}

fn admin_usage(name: &str) -> Parsed {
    match AdminCommand::usage(name) {
        Some(text) => Parsed::Usage { admin: true, text },
        None => Parsed::Ignored,
    }
}
