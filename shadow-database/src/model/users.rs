use std::fmt;
use std::str::FromStr;

/// Permission lattice. Variant order is the privilege order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    #[default]
    User,
    Admin,
    Developer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Developer => "developer",
        }
    }

    /// Display title shown in profiles and menus.
    pub fn title(self) -> &'static str {
        match self {
            Self::User => "ساكن الظل",
            Self::Admin => "حارس الظل",
            Self::Developer => "سيد الظل",
        }
    }

    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "developer" => Ok(Self::Developer),
            other => anyhow::bail!("unknown user role `{other}`"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockRecord {
    pub reason: String,
    /// `None` when the block was applied automatically.
    pub blocked_by: Option<String>,
    pub blocked_at: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub identity: String,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub experience: u64,
    pub level: u64,
    pub diamonds: u64,
    pub warnings: u32,
    pub block: Option<BlockRecord>,
    pub total_commands_used: u64,
    pub last_activity: u64,
    pub registered_at: u64,
    pub updated_at: u64,
}

/// Optional profile data supplied by the messaging client.
#[derive(Clone, Debug, Default)]
pub struct ProfileHints {
    pub display_name: String,
    pub username: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelProgress {
    pub current: u64,
    pub required: u64,
    pub remaining: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WarningOutcome {
    pub warnings: u32,
    /// True when this warning triggered the automatic block.
    pub auto_blocked: bool,
    /// True when the target was already blocked and nothing changed.
    pub ignored: bool,
}

/// Level reached with `experience` points when every level costs `threshold`.
pub fn level_for_experience(experience: u64, threshold: u64) -> u64 {
    experience / threshold.max(1) + 1
}

impl User {
    pub fn is_blocked(&self) -> bool {
        self.block.is_some()
    }

    pub fn display_label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            "مجهول الظل"
        } else {
            &self.display_name
        }
    }

    /// Grant experience and return the resulting level.
    pub fn grant_experience(&mut self, points: u64, threshold: u64) -> u64 {
        self.experience = self.experience.saturating_add(points);
        self.level = self.level.max(level_for_experience(self.experience, threshold));
        self.level
    }

    pub fn grant_diamonds(&mut self, amount: u64) -> u64 {
        self.diamonds = self.diamonds.saturating_add(amount);
        self.diamonds
    }

    pub fn level_progress(&self, threshold: u64) -> LevelProgress {
        let threshold = threshold.max(1);
        let level_floor = self.level.saturating_sub(1).saturating_mul(threshold);
        let next_level = self.level.saturating_mul(threshold);
        LevelProgress {
            current: self.experience.saturating_sub(level_floor).min(threshold),
            required: threshold,
            remaining: next_level.saturating_sub(self.experience),
        }
    }

    pub fn apply_warning(&mut self, max_warnings: u32, now: u64) -> WarningOutcome {
        if self.is_blocked() {
            return WarningOutcome {
                warnings: self.warnings,
                auto_blocked: false,
                ignored: true,
            };
        }

        self.warnings = self.warnings.saturating_add(1);
        let auto_blocked = self.warnings >= max_warnings;
        if auto_blocked {
            self.block = Some(BlockRecord {
                reason: format!("تم الحظر تلقائياً بعد {max_warnings} تحذيرات"),
                blocked_by: None,
                blocked_at: now,
            });
        }

        WarningOutcome {
            warnings: self.warnings,
            auto_blocked,
            ignored: false,
        }
    }

    pub fn apply_block(&mut self, reason: &str, blocked_by: &str, now: u64) -> Result<(), ModerationError> {
        if self.is_blocked() {
            return Err(ModerationError::AlreadyBlocked);
        }

        self.block = Some(BlockRecord {
            reason: reason.to_owned(),
            blocked_by: Some(blocked_by.to_owned()),
            blocked_at: now,
        });
        Ok(())
    }

    pub fn apply_unblock(&mut self) -> Result<(), ModerationError> {
        if self.block.take().is_none() {
            return Err(ModerationError::NotBlocked);
        }

        self.warnings = 0;
        Ok(())
    }
}

/// Refusals raised by moderation operations. Display text is user facing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModerationError {
    UserNotFound,
    AlreadyBlocked,
    NotBlocked,
    AlreadyPrivileged,
    NotAdmin,
    CannotModerate,
}

impl fmt::Display for ModerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::UserNotFound => "المستخدم غير موجود",
            Self::AlreadyBlocked => "المستخدم محظور بالفعل",
            Self::NotBlocked => "المستخدم غير محظور",
            Self::AlreadyPrivileged => "المستخدم مشرف بالفعل أو مطور",
            Self::NotAdmin => "المستخدم ليس مشرفاً",
            Self::CannotModerate => "لا يمكنك تنفيذ هذا الإجراء على هذا المستخدم",
        };
        f.write_str(message)
    }
}

impl std::error::Error for ModerationError {}

/// An actor may only act on someone of strictly lower rank, never on itself.
pub fn ensure_can_moderate(actor: &User, target: &User) -> Result<(), ModerationError> {
    if actor.identity == target.identity || target.role >= actor.role {
        return Err(ModerationError::CannotModerate);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn sample_user(identity: &str, role: Role) -> User {
    User {
        id: 0,
        identity: identity.to_owned(),
        username: String::new(),
        display_name: format!("user {identity}"),
        role,
        experience: 0,
        level: 1,
        diamonds: 0,
        warnings: 0,
        block: None,
        total_commands_used: 0,
        last_activity: 0,
        registered_at: 0,
        updated_at: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ModerationError, Role, ensure_can_moderate, level_for_experience, sample_user,
    };

    #[test]
    fn role_order_is_privilege_order() {
        assert!(Role::Developer.satisfies(Role::Admin));
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(Role::Admin.satisfies(Role::User));
        assert!(!Role::User.satisfies(Role::Admin));
        assert!(!Role::Admin.satisfies(Role::Developer));
        assert_eq!("developer".parse::<Role>().unwrap(), Role::Developer);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn level_is_a_function_of_experience() {
        assert_eq!(level_for_experience(0, 100), 1);
        assert_eq!(level_for_experience(99, 100), 1);
        assert_eq!(level_for_experience(100, 100), 2);
        assert_eq!(level_for_experience(350, 100), 4);
        assert_eq!(level_for_experience(5, 0), 6);
    }

    #[test]
    fn experience_never_decreases() {
        let mut user = sample_user("1", Role::User);
        let mut previous = 0;
        for points in [0, 10, 90, 0, 250] {
            let level = user.grant_experience(points, 100);
            assert!(user.experience >= previous);
            assert_eq!(level, level_for_experience(user.experience, 100));
            previous = user.experience;
        }
        assert_eq!(user.experience, 350);
        assert_eq!(user.level, 4);
    }

    #[test]
    fn progress_within_level() {
        let mut user = sample_user("1", Role::User);
        user.grant_experience(130, 100);

        let progress = user.level_progress(100);
        assert_eq!(progress.current, 30);
        assert_eq!(progress.required, 100);
        assert_eq!(progress.remaining, 70);
    }

    #[test]
    fn third_warning_blocks_once() {
        let mut user = sample_user("1", Role::User);

        assert!(!user.apply_warning(3, 10).auto_blocked);
        assert!(!user.apply_warning(3, 11).auto_blocked);
        let third = user.apply_warning(3, 12);
        assert!(third.auto_blocked);
        assert_eq!(third.warnings, 3);

        let block = user.block.clone().unwrap();
        assert_eq!(block.blocked_by, None);
        assert_eq!(block.blocked_at, 12);

        let fourth = user.apply_warning(3, 13);
        assert!(fourth.ignored);
        assert!(!fourth.auto_blocked);
        assert_eq!(user.warnings, 3);
        assert_eq!(user.block, Some(block));
    }

    #[test]
    fn block_and_unblock_are_guarded() {
        let mut user = sample_user("1", Role::User);
        assert_eq!(user.apply_unblock(), Err(ModerationError::NotBlocked));

        user.apply_block("spam", "9", 5).unwrap();
        let snapshot = user.clone();
        assert_eq!(
            user.apply_block("again", "9", 6),
            Err(ModerationError::AlreadyBlocked)
        );
        assert_eq!(user, snapshot);

        user.warnings = 2;
        user.apply_unblock().unwrap();
        assert!(!user.is_blocked());
        assert_eq!(user.warnings, 0);
    }

    #[test]
    fn moderation_requires_strictly_higher_rank() {
        let developer = sample_user("1", Role::Developer);
        let admin = sample_user("2", Role::Admin);
        let other_admin = sample_user("3", Role::Admin);
        let user = sample_user("4", Role::User);

        assert!(ensure_can_moderate(&developer, &admin).is_ok());
        assert!(ensure_can_moderate(&admin, &user).is_ok());
        assert_eq!(
            ensure_can_moderate(&admin, &other_admin),
            Err(ModerationError::CannotModerate)
        );
        assert_eq!(
            ensure_can_moderate(&admin, &developer),
            Err(ModerationError::CannotModerate)
        );
        assert_eq!(
            ensure_can_moderate(&developer, &developer),
            Err(ModerationError::CannotModerate)
        );
    }
}
