use shadow_core::{BoxFuture, CommandContext, Error};
use shadow_database::model::users::Role;
use shadow_utils::DISPLAY_PREFIX;

use crate::{Command, CommandMeta, visible_commands};

pub const META: CommandMeta = CommandMeta {
    name: "اوامر",
    desc: "قائمة أوامر الظل",
    category: "general",
    usage: ".اوامر",
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

const SUPERSCRIPTS: [&str; 10] = ["¹", "²", "³", "⁴", "⁵", "⁶", "⁷", "⁸", "⁹", "¹⁰"];

async fn run(ctx: CommandContext<'_>) -> Result<(), Error> {
    let user = ctx.user;

    let mut lines = vec![
        "⊱⊹•─═╾═─•┈⧽┊🌑┊⧼┈•─═╼═─•⊹⊰".to_owned(),
        format!("⌗› مـرحـبـا بـكـ فـي حـديـقـة الـظـل ˼@{}˹", ctx.message.sender),
        String::new(),
        "> ˼👤˹ مـعـلـومـاتـك فـي الـظـل".to_owned(),
        format!("│┊🪪 الـاسـم: ˼{}˹", user.display_label()),
        format!("│┊👤 الـرتـبـه: ˼{}˹", user.role.title()),
        format!("│┊🌟 قـوة الـظـل: ˼{}˹", user.experience),
        format!("│┊💎 جـواهـر الـظـل: ˼{}˹", user.diamonds),
        format!("│┊🏆 مـسـتـوى الـظـل: ˼{}˹", user.level),
        String::new(),
        "> ˼🌑˹ أوامـر حـديـقـة الـظـل".to_owned(),
    ];

    let entries = visible_commands(user.role).filter(|meta| meta.name != META.name);
    for (index, meta) in entries.enumerate() {
        let marker = SUPERSCRIPTS.get(index).copied().unwrap_or("•");
        lines.push(format!("│┊{marker} ⌗ {DISPLAY_PREFIX}{}", meta.name));
        lines.push(format!("*⧉↢{} ❯*", meta.desc));
    }
    lines.push("⊱⊹•─═╾═─•┈⧽┊🌑┊⧼┈•─═╼═─•⊹⊰".to_owned());

    ctx.reply_mentioning_sender(lines.join("\n")).await
}
