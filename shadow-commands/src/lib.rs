pub mod general;
pub mod moderation;
pub mod replies;
pub mod router;

use std::collections::HashMap;

use shadow_core::{BoxFuture, CommandContext, Error};
use shadow_database::model::users::Role;

pub use router::{DispatchOutcome, dispatch};

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
    pub required_role: Role,
}

pub type CommandHandler = for<'a> fn(CommandContext<'a>) -> BoxFuture<'a, Result<(), Error>>;

#[derive(Clone, Copy)]
pub struct Command {
    pub meta: &'static CommandMeta,
    pub handler: CommandHandler,
}

pub const COMMANDS: &[CommandMeta] = &[
    general::menu::META,
    general::profile::META,
    general::stats::META,
    general::help::META,
    general::bot_status::META,
    moderation::warn::META,
    moderation::block::META,
    moderation::unblock::META,
    moderation::promote::META,
    moderation::demote::META,
];

pub fn commands() -> Vec<Command> {
    vec![
        general::menu::command(),
        general::profile::command(),
        general::stats::command(),
        general::help::command(),
        general::bot_status::command(),
        moderation::warn::command(),
        moderation::block::command(),
        moderation::unblock::command(),
        moderation::promote::command(),
        moderation::demote::command(),
    ]
}

/// Immutable name to command table, built once at startup.
pub struct CommandRegistry {
    commands: HashMap<&'static str, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::from_commands(commands())
    }

    pub fn from_commands(commands: Vec<Command>) -> Self {
        Self {
            commands: commands
                .into_iter()
                .map(|command| (command.meta.name, command))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Commands `role` may run, in menu order.
pub fn visible_commands(role: Role) -> impl Iterator<Item = &'static CommandMeta> {
    COMMANDS
        .iter()
        .filter(move |meta| role.satisfies(meta.required_role))
}

#[cfg(test)]
mod tests {
    use shadow_database::model::users::Role;

    use super::{COMMANDS, CommandRegistry, commands, visible_commands};

    #[test]
    fn registry_matches_metadata() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.len(), COMMANDS.len());
        assert_eq!(commands().len(), COMMANDS.len());

        for meta in COMMANDS {
            let command = registry.get(meta.name).unwrap();
            assert_eq!(command.meta.usage, meta.usage);
            assert!(meta.usage.contains(meta.name));
        }
    }

    #[test]
    fn privileged_commands_are_gated() {
        let registry = CommandRegistry::new();
        let role_of = |name: &str| registry.get(name).unwrap().meta.required_role;

        assert_eq!(role_of("اوامر"), Role::User);
        assert_eq!(role_of("معلوماتي"), Role::User);
        assert_eq!(role_of("الاحصائيات"), Role::User);
        assert_eq!(role_of("المساعدة"), Role::User);
        assert_eq!(role_of("تحذير"), Role::Admin);
        assert_eq!(role_of("حالة_البوت"), Role::Developer);
        assert_eq!(role_of("حظر"), Role::Developer);
        assert_eq!(role_of("الغاء_حظر"), Role::Developer);
        assert_eq!(role_of("ترقية"), Role::Developer);
        assert_eq!(role_of("تنزيل"), Role::Developer);
    }

    #[test]
    fn visibility_follows_role() {
        assert_eq!(visible_commands(Role::User).count(), 4);
        assert_eq!(visible_commands(Role::Admin).count(), 5);
        assert_eq!(visible_commands(Role::Developer).count(), COMMANDS.len());
    }
}
