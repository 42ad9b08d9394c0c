use tally_core::PartyId;

/// Who a charge is aimed at.
#[derive(Clone, Debug, PartialEq)]
pub enum ChargeTargets {
    Mentions(Vec<PartyId>),
    AllMembers,
}

/// Typed request extracted from one chat message.
///
/// The amount stays text until dispatch: this parser only decides what kind
/// of request the message is, `Money::parse` decides whether the amount is
/// usable.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Charge {
        targets: ChargeTargets,
        amount: String,
        reason: Option<String>,
    },
    Balance {
        personal: bool,
    },
    History {
        days: i64,
    },
    Entries,
    Cancel,
    Help,
    Start,
    Unknown,
}

impl Command {
    /// `None` for text that is neither a slash command nor a mention-led
    /// charge; such messages get no reply at all.
    pub fn parse(text: &str) -> Option<Command> {
        let trimmed = text.trim();
        if let Some(rest) = trimmed.strip_prefix('/') {
            return Some(Self::parse_slash(rest));
        }
        Self::parse_charge(trimmed)
    }

    fn parse_slash(rest: &str) -> Command {
        let mut parts = rest.split_whitespace();
        let name = match parts.next() {
            Some(name) => name,
            None => return Command::Unknown,
        };
        // Group chats address commands as /balance@botname.
        let name = name.split('@').next().unwrap_or(name);
        match name {
            "balance" => Command::Balance {
                personal: parts.next() == Some("me"),
            },
            "history" => {
                let days = parts
                    .next()
                    .and_then(|arg| arg.parse::<i64>().ok())
                    .filter(|days| *days > 0)
                    .unwrap_or(1);
                Command::History { days }
            }
            "debts" => Command::Entries,
            "cancel" => Command::Cancel,
            "help" => Command::Help,
            "start" => Command::Start,
            _ => Command::Unknown,
        }
    }

    fn parse_charge(text: &str) -> Option<Command> {
        let mut tokens = text.split_whitespace().peekable();
        let mut mentions = Vec::new();
        let mut all_members = false;
        while let Some(token) = tokens.peek() {
            match token.strip_prefix('@') {
                Some("") => return None,
                Some("all") => {
                    all_members = true;
                    tokens.next();
                }
                Some(name) => {
                    mentions.push(PartyId::new(name));
                    tokens.next();
                }
                None => break,
            }
        }
        if !all_members && mentions.is_empty() {
            return None;
        }
        let amount = tokens.next()?.to_string();
        if !amount.chars().next()?.is_ascii_digit() {
            return None;
        }
        let reason_text = tokens.collect::<Vec<_>>().join(" ");
        let reason = (!reason_text.is_empty()).then_some(reason_text);
        // @all wins when both appear, like the reference bot's dispatch order.
        let targets = if all_members {
            ChargeTargets::AllMembers
        } else {
            ChargeTargets::Mentions(mentions)
        };
        Some(Command::Charge {
            targets,
            amount,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_mention_charge() {
        assert_eq!(
            Command::parse("@ivan 50 обед"),
            Some(Command::Charge {
                targets: ChargeTargets::Mentions(vec![PartyId::new("ivan")]),
                amount: "50".to_owned(),
                reason: Some("обед".to_owned()),
            })
        );
    }

    #[test]
    fn parses_multi_mention_charge_without_reason() {
        assert_eq!(
            Command::parse("@ivan @maria 100.50"),
            Some(Command::Charge {
                targets: ChargeTargets::Mentions(vec![
                    PartyId::new("ivan"),
                    PartyId::new("maria")
                ]),
                amount: "100.50".to_owned(),
                reason: None,
            })
        );
    }

    #[test]
    fn parses_all_members_charge() {
        assert_eq!(
            Command::parse("@all 150 вечеринка"),
            Some(Command::Charge {
                targets: ChargeTargets::AllMembers,
                amount: "150".to_owned(),
                reason: Some("вечеринка".to_owned()),
            })
        );
    }

    #[test]
    fn all_wins_over_explicit_mentions() {
        let command = Command::parse("@all @ivan 90").unwrap();
        assert!(matches!(
            command,
            Command::Charge {
                targets: ChargeTargets::AllMembers,
                ..
            }
        ));
    }

    #[test]
    fn mention_without_amount_is_not_a_charge() {
        assert_eq!(Command::parse("@ivan привет"), None);
        assert_eq!(Command::parse("@ivan"), None);
    }

    #[test]
    fn plain_chatter_gets_no_command() {
        assert_eq!(Command::parse("когда обед?"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn parses_slash_commands() {
        assert_eq!(
            Command::parse("/balance"),
            Some(Command::Balance { personal: false })
        );
        assert_eq!(
            Command::parse("/balance me"),
            Some(Command::Balance { personal: true })
        );
        assert_eq!(Command::parse("/history 30"), Some(Command::History { days: 30 }));
        assert_eq!(Command::parse("/debts"), Some(Command::Entries));
        assert_eq!(Command::parse("/cancel"), Some(Command::Cancel));
        assert_eq!(Command::parse("/help"), Some(Command::Help));
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/frobnicate"), Some(Command::Unknown));
    }

    #[test]
    fn bot_suffix_is_stripped() {
        assert_eq!(
            Command::parse("/balance@tally_bot"),
            Some(Command::Balance { personal: false })
        );
    }

    #[test]
    fn history_falls_back_to_one_day() {
        assert_eq!(Command::parse("/history"), Some(Command::History { days: 1 }));
        assert_eq!(Command::parse("/history abc"), Some(Command::History { days: 1 }));
        assert_eq!(Command::parse("/history -3"), Some(Command::History { days: 1 }));
        assert_eq!(Command::parse("/history 0"), Some(Command::History { days: 1 }));
    }
}
