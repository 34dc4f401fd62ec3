//! Persistent character registrations and bot admins.

pub mod sqlite;

pub use sqlite::{CharacterRegistration, RegistrationStore};
