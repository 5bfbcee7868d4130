//! Prefix command parsing.

use crate::config::COMMAND_CHECK_PERMISSIONS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CheckPermissions,
}

/// Parses `<prefix><name> [args...]`. The prefix must open the message.
/// Returns `None` for anything that is not a known command.
pub fn parse(content: &str, prefix: &str) -> Option<Command> {
    let rest = content.strip_prefix(prefix)?;
    let name = rest.split_whitespace().next()?;

    // A space between prefix and name is not a command.
    if !rest.starts_with(name) {
        return None;
    }

    match name {
        COMMAND_CHECK_PERMISSIONS => Some(Command::CheckPermissions),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_permissions() {
        assert_eq!(parse("!check_permissions", "!"), Some(Command::CheckPermissions));
        assert_eq!(
            parse("!check_permissions now please", "!"),
            Some(Command::CheckPermissions)
        );
        assert_eq!(parse("?check_permissions", "?"), Some(Command::CheckPermissions));
        assert_eq!(parse("bot!check_permissions", "bot!"), Some(Command::CheckPermissions));
    }

    #[test]
    fn test_parse_rejects_other_messages() {
        assert_eq!(parse("check_permissions", "!"), None);
        assert_eq!(parse("?check_permissions", "!"), None);
        assert_eq!(parse("! check_permissions", "!"), None);
        assert_eq!(parse("!check_permission", "!"), None);
        assert_eq!(parse("!", "!"), None);
        assert_eq!(parse("hello", "!"), None);
    }

    #[test]
    fn test_parse_requires_prefix_at_start() {
        assert_eq!(parse(" !check_permissions", "!"), None);
        assert_eq!(parse("\n!check_permissions", "!"), None);
    }
}
