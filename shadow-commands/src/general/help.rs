use shadow_core::{BoxFuture, CommandContext, Error};
use shadow_database::model::users::Role;
use shadow_utils::{COMMAND_PREFIXES, DISPLAY_PREFIX};

use crate::{COMMANDS, Command, CommandMeta, visible_commands};

pub const META: CommandMeta = CommandMeta {
    name: "المساعدة",
    desc: "دليل الظل",
    category: "general",
    usage: ".المساعدة [اسم_الأمر]",
    required_role: Role::User,
};

pub fn command() -> Command {
    Command {
        meta: &META,
        handler,
    }
}

fn handler(ctx: CommandContext<'_>) -> BoxFuture<'_, Result<(), Error>> {
    Box::pin(run(ctx))
}

async fn run(ctx: CommandContext<'_>) -> Result<(), Error> {
    if let Some(query) = ctx.args.first() {
        let wanted = query.trim_start_matches(COMMAND_PREFIXES).to_lowercase();
        let found = COMMANDS
            .iter()
            .find(|meta| meta.name == wanted && ctx.user.role.satisfies(meta.required_role));

        let text = match found {
            Some(meta) => command_help(meta),
            None => format!("🌑 لا يوجد أمر باسم \"{wanted}\" في دليل الظل"),
        };
        return ctx.reply(text).await;
    }

    ctx.reply(guide(ctx.user.role)).await
}

fn command_help(meta: &CommandMeta) -> String {
    format!(
        "🌑 *{DISPLAY_PREFIX}{}*\n📝 {}\n📌 الاستخدام: {}",
        meta.name, meta.desc, meta.usage
    )
}

fn guide(role: Role) -> String {
    let mut lines = vec![
        "╭─────────────────────────".to_owned(),
        "│ 🌑 *دليل حديقة الظل*".to_owned(),
        "├─────────────────────────".to_owned(),
        "│ 📋 *أوامر الظل المتاحة لك:*".to_owned(),
    ];
    for meta in visible_commands(role) {
        lines.push(format!("│ • {DISPLAY_PREFIX}{} - {}", meta.name, meta.desc));
    }
    lines.extend(
        [
            "├─────────────────────────",
            "│ 💡 *نصائح الظل:*",
            "│ • استخدم النقطة (.) قبل كل أمر",
            "│ • اكسب قوة الظل باستخدام الأوامر",
            "│ • احصل على جواهر الظل مع كل أمر",
            "│ • تجنب الإفراط في استخدام قوة الظل",
            "├─────────────────────────",
            "│ 🔧 *للدعم في الظل:*",
            "│ تواصل مع أسياد الظل عند الحاجة",
            "╰─────────────────────────",
        ]
        .map(str::to_owned),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use shadow_database::model::users::Role;

    use super::guide;

    #[test]
    fn guide_hides_privileged_commands() {
        let user_guide = guide(Role::User);
        assert!(user_guide.contains(".معلوماتي"));
        assert!(!user_guide.contains(".حظر"));

        let developer_guide = guide(Role::Developer);
        assert!(developer_guide.contains(".حظر"));
        assert!(developer_guide.contains(".تحذير"));
    }
}
