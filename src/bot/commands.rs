use thiserror::Error;

/// Parsed chat command. Price-level validation (target above buy, stop
/// below buy) happens at dispatch, where a reply channel exists.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Help,
    AddStock {
        symbol: String,
        buy: f64,
        target: f64,
        stop: f64,
        notes: String,
    },
    RemoveStock {
        symbol: String,
    },
    List,
    Alerts,
    Portfolio,
    Insights {
        symbol: String,
    },
    BuyAdvice {
        symbol: String,
    },
    SellAdvice {
        symbol: String,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("❌ **Usage:** `{0}`")]
    Usage(&'static str),
    #[error("❌ **Missing parameters!**\n\nRequired: `buy=XX target=YY stop=ZZ`")]
    MissingParams,
    #[error("❌ **Invalid price format!** Use numbers only (e.g., 150.50)")]
    BadNumber,
    #[error("❓ Unknown command. Use /help to see what I understand")]
    Unknown,
}

const ADD_USAGE: &str = "/add_stock SYMBOL buy=XX target=YY stop=ZZ notes=TEXT";
const REMOVE_USAGE: &str = "/remove_stock SYMBOL";
const INSIGHTS_USAGE: &str = "/insights SYMBOL";

const KNOWN_KEYS: [&str; 4] = ["buy", "target", "stop", "notes"];

impl Command {
    /// Parse a chat message. Returns `None` for plain text that is not a
    /// command at all; those messages are ignored.
    pub fn parse(text: &str) -> Option<Result<Command, CommandError>> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }

        let mut parts = text.split_whitespace();
        let command = parts.next()?;
        // Telegram appends "@botname" in group chats.
        let command = command.split('@').next().unwrap_or(command);
        let rest: Vec<&str> = parts.collect();

        Some(match command {
            "/start" => Ok(Command::Start),
            "/help" => Ok(Command::Help),
            "/list" => Ok(Command::List),
            "/alerts" => Ok(Command::Alerts),
            "/portfolio" => Ok(Command::Portfolio),
            "/add_stock" => parse_add(&rest),
            "/remove_stock" => match rest.first() {
                Some(symbol) => Ok(Command::RemoveStock {
                    symbol: symbol.to_uppercase(),
                }),
                None => Err(CommandError::Usage(REMOVE_USAGE)),
            },
            "/insights" => match rest.first() {
                Some(symbol) => Ok(Command::Insights {
                    symbol: symbol.to_uppercase(),
                }),
                None => Err(CommandError::Usage(INSIGHTS_USAGE)),
            },
            "/buy_advice" => match rest.first() {
                Some(symbol) => Ok(Command::BuyAdvice {
                    symbol: symbol.to_uppercase(),
                }),
                None => Err(CommandError::Usage("/buy_advice SYMBOL")),
            },
            "/sell_advice" => match rest.first() {
                Some(symbol) => Ok(Command::SellAdvice {
                    symbol: symbol.to_uppercase(),
                }),
                None => Err(CommandError::Usage("/sell_advice SYMBOL")),
            },
            _ => Err(CommandError::Unknown),
        })
    }
}

fn parse_add(args: &[&str]) -> Result<Command, CommandError> {
    let Some((symbol, params)) = args.split_first() else {
        return Err(CommandError::Usage(ADD_USAGE));
    };

    let buy = kv_number(params, "buy")?;
    let target = kv_number(params, "target")?;
    let stop = kv_number(params, "stop")?;
    let notes = notes_text(params);

    Ok(Command::AddStock {
        symbol: symbol.to_uppercase(),
        buy,
        target,
        stop,
        notes,
    })
}

fn kv_number(params: &[&str], key: &str) -> Result<f64, CommandError> {
    let prefix = format!("{}=", key);
    let raw = params
        .iter()
        .find_map(|p| p.strip_prefix(prefix.as_str()))
        .ok_or(CommandError::MissingParams)?;
    raw.parse().map_err(|_| CommandError::BadNumber)
}

/// Everything after `notes=` up to the next known `key=` token.
fn notes_text(params: &[&str]) -> String {
    let mut collected: Vec<&str> = Vec::new();
    let mut in_notes = false;

    for &param in params {
        if let Some(first) = param.strip_prefix("notes=") {
            in_notes = true;
            if !first.is_empty() {
                collected.push(first);
            }
            continue;
        }
        if in_notes {
            let is_key = KNOWN_KEYS
                .iter()
                .any(|k| param.starts_with(&format!("{}=", k)));
            if is_key {
                break;
            }
            collected.push(param);
        }
    }

    collected.join(" ")
}
