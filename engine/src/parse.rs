//! Slash-command text front-end.
//!
//! `/blam @user | /blam add @user | /blam remove @user | /blam list`
//! `/idv | /idv on | /idv off | /idv test | /idv enforce`
//! `/idv whitelist @user | /idv whitelist all | /idv whitelist remove @user | /idv whitelist list`

use blam_types::{Command, MemberId, WhitelistTarget};
use thiserror::Error;

pub const BLAM_USAGE: &str = "Usage: /blam @user | /blam [add/remove] @user | /blam list";
pub const IDV_USAGE: &str =
    "Usage: /idv [on/off/test/enforce] | /idv whitelist [@user/all/list] | /idv whitelist remove @user";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("{0}")]
    Usage(&'static str),

    #[error("Please mention a user, e.g. /blam @user (got '{0}')")]
    InvalidMention(String),
}

/// Accept `<@U123>`, `<@U123|name>`, or a bare `U123`.
pub fn parse_mention(token: &str) -> Option<MemberId> {
    let inner = match token.strip_prefix("<@") {
        Some(rest) => rest.strip_suffix('>')?,
        None => token,
    };
    let id = MemberId::from(inner.split('|').next().unwrap_or_default());
    id.is_well_formed().then_some(id)
}

fn mention(tokens: &[&str], idx: usize) -> Result<MemberId, ParseError> {
    let token = tokens.get(idx).copied().ok_or(ParseError::InvalidMention(String::new()))?;
    parse_mention(token).ok_or_else(|| ParseError::InvalidMention(token.to_string()))
}

pub fn parse_blam_text(text: &str) -> Result<Command, ParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let Some(first) = tokens.first() else {
        return Err(ParseError::Usage(BLAM_USAGE));
    };
    match first.to_ascii_lowercase().as_str() {
        "list" => Ok(Command::List),
        "add" => Ok(Command::Blam { member: mention(&tokens, 1)? }),
        "remove" => Ok(Command::Unblam { member: mention(&tokens, 1)? }),
        _ => Ok(Command::Blam { member: mention(&tokens, 0)? }),
    }
}

pub fn parse_idv_text(text: &str) -> Result<Command, ParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let lowered: Vec<String> = tokens.iter().map(|t| t.to_ascii_lowercase()).collect();
    let words: Vec<&str> = lowered.iter().map(String::as_str).collect();

    match words.as_slice() {
        [] | ["on"] => Ok(Command::LockIdv),
        ["off"] => Ok(Command::UnlockIdv),
        ["test"] => Ok(Command::IdvTest),
        ["enforce"] => Ok(Command::Enforce),
        ["whitelist", "all"] => Ok(Command::WhitelistAdd {
            target: WhitelistTarget::AllCurrentMembers,
        }),
        ["whitelist", "list"] => Ok(Command::WhitelistList),
        ["whitelist", "remove", _] => Ok(Command::WhitelistRemove {
            member: mention(&tokens, 2)?,
        }),
        ["whitelist", _] => Ok(Command::WhitelistAdd {
            target: WhitelistTarget::Member(mention(&tokens, 1)?),
        }),
        _ => Err(ParseError::Usage(IDV_USAGE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions() {
        assert_eq!(parse_mention("<@U0123ABC>"), Some(MemberId::from("U0123ABC")));
        assert_eq!(parse_mention("<@W0123ABC|someone>"), Some(MemberId::from("W0123ABC")));
        assert_eq!(parse_mention("U0123ABC"), Some(MemberId::from("U0123ABC")));
        assert_eq!(parse_mention("<@C0123ABC>"), None);
        assert_eq!(parse_mention("<@U0123ABC"), None);
        assert_eq!(parse_mention("@someone"), None);
    }

    #[test]
    fn blam_forms() {
        let u = MemberId::from("U0123ABC");
        assert_eq!(parse_blam_text("<@U0123ABC>"), Ok(Command::Blam { member: u.clone() }));
        assert_eq!(parse_blam_text("add <@U0123ABC|x>"), Ok(Command::Blam { member: u.clone() }));
        assert_eq!(parse_blam_text("REMOVE <@U0123ABC>"), Ok(Command::Unblam { member: u }));
        assert_eq!(parse_blam_text("list"), Ok(Command::List));
    }

    #[test]
    fn blam_errors() {
        assert_eq!(parse_blam_text("  "), Err(ParseError::Usage(BLAM_USAGE)));
        assert_eq!(parse_blam_text("remove"), Err(ParseError::InvalidMention(String::new())));
        assert_eq!(
            parse_blam_text("bob"),
            Err(ParseError::InvalidMention("bob".to_string()))
        );
    }

    #[test]
    fn idv_forms() {
        assert_eq!(parse_idv_text(""), Ok(Command::LockIdv));
        assert_eq!(parse_idv_text("off"), Ok(Command::UnlockIdv));
        assert_eq!(parse_idv_text("Test"), Ok(Command::IdvTest));
        assert_eq!(parse_idv_text("enforce"), Ok(Command::Enforce));
        assert_eq!(
            parse_idv_text("whitelist all"),
            Ok(Command::WhitelistAdd { target: WhitelistTarget::AllCurrentMembers })
        );
        assert_eq!(
            parse_idv_text("whitelist <@U0123ABC>"),
            Ok(Command::WhitelistAdd { target: WhitelistTarget::Member(MemberId::from("U0123ABC")) })
        );
        assert_eq!(
            parse_idv_text("whitelist remove <@U0123ABC>"),
            Ok(Command::WhitelistRemove { member: MemberId::from("U0123ABC") })
        );
        assert_eq!(parse_idv_text("whitelist list"), Ok(Command::WhitelistList));
        assert_eq!(parse_idv_text("sideways"), Err(ParseError::Usage(IDV_USAGE)));
    }
}
