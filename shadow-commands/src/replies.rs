//! Fixed reply texts shared across the router and handlers.

use shadow_database::model::users::Role;
use shadow_utils::DISPLAY_PREFIX;
use shadow_utils::formatting::format_time_remaining;

pub const GENERIC_FAILURE: &str = "🌑 حدث خطأ في الظل أثناء تنفيذ الأمر. حاول مرة أخرى.";

pub fn unknown_command_message(name: &str) -> String {
    format!(
        "🌑 الأمر \"{name}\" غير موجود في حديقة الظل.\nاكتب \"{DISPLAY_PREFIX}اوامر\" لرؤية أوامر الظل المتاحة."
    )
}

pub fn permission_denied_message(required: Role) -> String {
    let audience = match required {
        Role::Developer => "لأسياد الظل",
        Role::Admin => "لحراس الظل",
        Role::User => "لسكان الظل",
    };
    format!("🌑 هذا الأمر متاح {audience} فقط")
}

pub fn rate_limited_message(retry_after_secs: u64) -> String {
    format!(
        "🌑 لقد تجاوزت حد استخدام أوامر الظل. انتظر {} قبل المحاولة مرة أخرى.",
        format_time_remaining(retry_after_secs)
    )
}

pub fn usage_message(prompt: &str, usage: &str) -> String {
    format!("🌑 {prompt}\nمثال: {usage}")
}
