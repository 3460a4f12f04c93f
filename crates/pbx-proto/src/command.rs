/// A parsed client command (§4.4). `line` passed to [`parse_command`] is
/// expected to already have trailing CR/LF and leading whitespace
/// stripped by the caller (the driver does this once per line read).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pickup,
    Hangup,
    /// Decimal extension to dial. Malformed or missing digits decode to
    /// `0`, matching the reference implementation's use of `atoi`.
    Dial(i64),
    /// Chat text with the leading whitespace after `chat` stripped.
    Chat(String),
    /// Anything else — dispatched to nothing, may be logged by the driver.
    Unknown(String),
}

/// Parse one already-trimmed input line into a [`Command`].
pub fn parse_command(line: &str) -> Command {
    if let Some(rest) = match_keyword(line, "pickup") {
        let _ = rest;
        return Command::Pickup;
    }
    if let Some(rest) = match_keyword(line, "hangup") {
        let _ = rest;
        return Command::Hangup;
    }
    if let Some(rest) = match_keyword(line, "dial") {
        return Command::Dial(atoi_like(rest.trim_start()));
    }
    if let Some(rest) = match_keyword(line, "chat") {
        return Command::Chat(rest.trim_start().to_string());
    }
    Command::Unknown(line.to_string())
}

/// Matches `line` against `keyword` the way the reference server does:
/// the keyword must be followed by either end-of-string or whitespace,
/// so `dialback` is not a `dial` command but `dial 7` and `dial` both are.
fn match_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

/// `atoi`-style parse: optional sign, then leading digits, stopping at
/// the first non-digit; no digits at all yields `0`.
fn atoi_like(s: &str) -> i64 {
    let mut chars = s.chars().peekable();
    let mut sign = 1i64;
    if let Some(&c) = chars.peek() {
        if c == '+' || c == '-' {
            if c == '-' {
                sign = -1;
            }
            chars.next();
        }
    }
    let mut value: i64 = 0;
    let mut saw_digit = false;
    for c in chars {
        match c.to_digit(10) {
            Some(d) => {
                saw_digit = true;
                value = value.saturating_mul(10).saturating_add(d as i64);
            }
            None => break,
        }
    }
    if saw_digit {
        value * sign
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pickup_and_hangup() {
        assert_eq!(parse_command("pickup"), Command::Pickup);
        assert_eq!(parse_command("hangup"), Command::Hangup);
    }

    #[test]
    fn dial_parses_extension() {
        assert_eq!(parse_command("dial 7"), Command::Dial(7));
        assert_eq!(parse_command("dial   42"), Command::Dial(42));
    }

    #[test]
    fn dial_with_garbage_defaults_to_zero() {
        assert_eq!(parse_command("dial abc"), Command::Dial(0));
    }

    #[test]
    fn chat_strips_leading_whitespace_only() {
        assert_eq!(parse_command("chat hello world"), Command::Chat("hello world".to_string()));
        assert_eq!(parse_command("chat   hi"), Command::Chat("hi".to_string()));
        assert_eq!(parse_command("chat"), Command::Chat(String::new()));
    }

    #[test]
    fn unrelated_prefix_is_not_a_command() {
        assert_eq!(parse_command("dialback"), Command::Unknown("dialback".to_string()));
        assert_eq!(parse_command("pickupx"), Command::Unknown("pickupx".to_string()));
    }

    #[test]
    fn unknown_lines_are_ignored() {
        assert_eq!(parse_command("frobnicate"), Command::Unknown("frobnicate".to_string()));
    }
}
