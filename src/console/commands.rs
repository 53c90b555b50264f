/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Plain text is sent to the assistant.
    Message(String),
    Ingest(Vec<String>),
    ShowSession,
    SaveSession {
        tenant_id: String,
        api_key: String,
        session_id: String,
    },
    CreateTenant(String),
    Clear,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP_TEXT: &str = "\
Commands:
  /session                          show the current tenant and session
  /session <tenant> <key> [<id>]    save credentials (session id optional)
  /tenant <id>                      create a tenant and start a new session
  /ingest <path>...                 upload files or directories ('-' reads stdin)
  /clear                            clear the transcript
  /help                             show this help
  /quit                             leave the shell
Anything else is sent as a chat message.";

pub struct CommandParser;

impl CommandParser {
    /// `None` for a blank line.
    pub fn parse(input: &str) -> Option<ShellCommand> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        let Some(rest) = input.strip_prefix('/') else {
            return Some(ShellCommand::Message(input.to_string()));
        };

        let parts: Vec<&str> = rest.split_whitespace().collect();
        let Some((command, args)) = parts.split_first() else {
            return Some(ShellCommand::Help);
        };

        let parsed = match command.to_lowercase().as_str() {
            "session" => parse_session_command(args),
            "tenant" => match args {
                [tenant_id] => ShellCommand::CreateTenant(tenant_id.to_string()),
                _ => ShellCommand::Unknown("tenant requires exactly one id".to_string()),
            },
            "ingest" if args.is_empty() => ShellCommand::Unknown("ingest requires at least one path".to_string()),
            "ingest" => ShellCommand::Ingest(args.iter().map(|arg| arg.to_string()).collect()),
            "clear" => ShellCommand::Clear,
            "help" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            _ => ShellCommand::Unknown(command.to_string()),
        };
        Some(parsed)
    }
}

fn parse_session_command(args: &[&str]) -> ShellCommand {
    match args {
        [] => ShellCommand::ShowSession,
        [tenant_id, api_key] => ShellCommand::SaveSession {
            tenant_id: tenant_id.to_string(),
            api_key: api_key.to_string(),
            session_id: String::new(),
        },
        [tenant_id, api_key, session_id] => ShellCommand::SaveSession {
            tenant_id: tenant_id.to_string(),
            api_key: api_key.to_string(),
            session_id: session_id.to_string(),
        },
        _ => ShellCommand::Unknown("session takes <tenant> <key> [<id>]".to_string()),
    }
}
