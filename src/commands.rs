/// What an incoming text asks for, in dispatch priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`
    Start,
    /// `/hadith`
    Hadith,
    /// Text made only of decimal digits, carried as the parsed value.
    /// Values too large for `i64` saturate to `i64::MAX`.
    Page(i64),
    Fallback,
}

impl Command {
    pub fn classify(text: &str) -> Self {
        match command_name(text) {
            Some("start") => return Command::Start,
            Some("hadith") => return Command::Hadith,
            _ => {}
        }

        match parse_digits(text) {
            Some(value) => Command::Page(value),
            None => Command::Fallback,
        }
    }
}

/// Bot command name in `text`, without the slash or an `@botname` suffix.
/// The text must start with the slash; arguments after the first
/// whitespace are ignored.
fn command_name(text: &str) -> Option<&str> {
    if !text.starts_with('/') {
        return None;
    }
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// ASCII and the two Arabic-Indic digit sets only, not every Unicode `Nd` digit.
fn decimal_digit(c: char) -> Option<u32> {
    match c {
        '0'..='9' => c.to_digit(10),
        // Arabic-Indic
        '\u{0660}'..='\u{0669}' => Some(c as u32 - 0x0660),
        // Extended Arabic-Indic (Persian, Urdu)
        '\u{06F0}'..='\u{06F9}' => Some(c as u32 - 0x06F0),
        _ => None,
    }
}

/// Parse `text` if every character is a decimal digit.
fn parse_digits(text: &str) -> Option<i64> {
    if text.is_empty() {
        return None;
    }

    let mut value: i64 = 0;
    for c in text.chars() {
        let digit = decimal_digit(c)?;
        value = value.saturating_mul(10).saturating_add(i64::from(digit));
    }
    Some(value)
}
