//! WhatsApp address helpers.

pub const USER_SUFFIX: &str = "@s.whatsapp.net";
pub const GROUP_SUFFIX: &str = "@g.us";

pub fn is_group(jid: &str) -> bool {
    jid.ends_with(GROUP_SUFFIX)
}

/// Strip the user-server suffix, leaving the bare phone identity.
pub fn user_identity(jid: &str) -> &str {
    jid.strip_suffix(USER_SUFFIX).unwrap_or(jid)
}

/// Build a full user address from a bare identity.
pub fn user_jid(identity: &str) -> String {
    if identity.contains('@') {
        identity.to_owned()
    } else {
        format!("{identity}{USER_SUFFIX}")
    }
}

/// The part of any address before `@`, used when mentioning it in text.
pub fn local_part(jid: &str) -> &str {
    jid.split('@').next().unwrap_or(jid)
}

#[cfg(test)]
mod tests {
    use super::{is_group, local_part, user_identity, user_jid};

    #[test]
    fn address_helpers() {
        assert!(is_group("12036304@g.us"));
        assert!(!is_group("966500000000@s.whatsapp.net"));
        assert_eq!(user_identity("966500000000@s.whatsapp.net"), "966500000000");
        assert_eq!(user_identity("12036304@g.us"), "12036304@g.us");
        assert_eq!(user_jid("966500000000"), "966500000000@s.whatsapp.net");
        assert_eq!(user_jid("x@g.us"), "x@g.us");
        assert_eq!(local_part("966500000000@s.whatsapp.net"), "966500000000");
    }
}
