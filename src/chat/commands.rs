//! Slash commands typed into the input box.

/// Commands with their help text.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/clear", "Clear the conversation"),
    ("/copy", "Copy the last response (/copy N copies code block N)"),
    ("/export", "Export the conversation as markdown"),
    ("/help", "Show help"),
    ("/notify", "Enable desktop notifications"),
    ("/quit", "Exit"),
];

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Clear,
    /// `None` copies the whole message, `Some(n)` the n-th code block (1-based).
    Copy(Option<usize>),
    Export,
    Help,
    Notify,
    Quit,
    Unknown(String),
    /// `/copy` with an argument that is not a block number.
    Invalid(String),
}

/// Parse input starting with `/`. Anything else is a chat message.
pub fn parse_command(input: &str) -> Option<Command> {
    let rest = input.trim().strip_prefix('/')?;
    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    let command = match cmd.as_str() {
        "clear" | "cls" => Command::Clear,
        "copy" | "c" => {
            if args.is_empty() {
                Command::Copy(None)
            } else {
                match args.parse::<usize>() {
                    Ok(n) if n > 0 => Command::Copy(Some(n)),
                    _ => Command::Invalid(format!("Not a code block number: {}", args)),
                }
            }
        }
        "export" => Command::Export,
        "help" | "h" | "?" => Command::Help,
        "notify" => Command::Notify,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    };
    Some(command)
}

/// Help text for the modal.
pub fn help_text() -> String {
    let mut text = String::from("Commands:\n");
    for (name, description) in COMMANDS {
        text.push_str(&format!("  {:<10} {}\n", name, description));
    }
    text.push_str("\nKeys:\n");
    text.push_str("  Enter      Send\n");
    text.push_str("  Alt+Enter  New line\n");
    text.push_str("  PgUp/PgDn  Scroll\n");
    text.push_str("  Ctrl+C     Quit\n");
    text
}
