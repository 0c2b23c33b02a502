pub mod autocleanup;
pub mod moderation;
pub mod utility;

mod checks;

use tracing::{debug, error};
use twilight_model::gateway::payload::incoming::MessageCreate;

use sweeper_core::Context;
use sweeper_utils::COMMAND_PREFIX;

// Global command meta data
pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::ping::META,
    utility::help::META,
    utility::channelstats::META,
    utility::backup::META,
    moderation::clear::META,
    moderation::clearall::META,
    moderation::clearuser::META,
    moderation::clearold::META,
    autocleanup::enable::META,
    autocleanup::stop::META,
    autocleanup::list::META,
    autocleanup::sweep::META,
    // Add new commands here
];

/// A prefixed command split into its name, first argument and remaining text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedCommand<'a> {
    pub name: String,
    pub arg1: Option<&'a str>,
    pub arg_tail: Option<&'a str>,
}

/// Split `!name arg1 rest...`; `None` when the prefix is missing.
pub fn parse_command(content: &str) -> Option<ParsedCommand<'_>> {
    let content = content.trim().strip_prefix(COMMAND_PREFIX)?.trim();

    let mut command_and_rest = content.splitn(2, char::is_whitespace);
    let name = command_and_rest.next().unwrap_or("").to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }

    let rest = command_and_rest
        .next()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let (arg1, arg_tail) = match rest {
        Some(value) => {
            let mut args = value.splitn(2, char::is_whitespace);
            let first = args.next().filter(|arg| !arg.is_empty());
            let tail = args
                .next()
                .map(str::trim)
                .filter(|remaining| !remaining.is_empty());

            (first, tail)
        }
        None => (None, None),
    };

    Some(ParsedCommand {
        name,
        arg1,
        arg_tail,
    })
}

/// Entry point for every `MessageCreate` event.
///
/// Pending confirmations see the message first so a `confirm` reply never
/// reaches command dispatch.
pub async fn handle_message(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    if msg.author.bot {
        return Ok(());
    }

    if ctx
        .confirmations
        .offer(msg.channel_id, msg.author.id, &msg.content)
        .await
    {
        return Ok(());
    }

    let content = msg.content.clone();
    let Some(command) = parse_command(&content) else {
        return Ok(());
    };

    let arg1 = command.arg1;
    let arg_tail = command.arg_tail;
    debug!(command = %command.name, channel_id = msg.channel_id.get(), "dispatching command");

    let channel_id = msg.channel_id;
    let result = match command.name.as_str() {
        "ping" => utility::ping::run(ctx.clone(), msg).await,
        "help" => utility::help::run(ctx.clone(), msg, arg1).await,
        "channelstats" => utility::channelstats::run(ctx.clone(), msg, arg1).await,
        "backup" => utility::backup::run(ctx.clone(), msg, arg1, arg_tail).await,

        "clear" => moderation::clear::run(ctx.clone(), msg, arg1).await,
        "clearall" => moderation::clearall::run(ctx.clone(), msg).await,
        "clearuser" => moderation::clearuser::run(ctx.clone(), msg, arg1, arg_tail).await,
        "clearold" => moderation::clearold::run(ctx.clone(), msg, arg1).await,

        "autocleanup" => autocleanup::enable::run(ctx.clone(), msg, arg1, arg_tail).await,
        "stopauto" => autocleanup::stop::run(ctx.clone(), msg, arg1).await,
        "listauto" => autocleanup::list::run(ctx.clone(), msg).await,
        "runcleanup" => autocleanup::sweep::run(ctx.clone(), msg).await,
        // Add new commands here
        _ => {
            let out = format!("Command not found. Use `{COMMAND_PREFIX}help` to see available commands.");
            ctx.http.create_message(msg.channel_id).content(&out).await?;
            Ok(())
        }
    };

    if let Err(source) = &result {
        error!(?source, command = %command.name, "command failed");

        let out = checks::failure_reply(source);
        if let Err(reply_error) = ctx.http.create_message(channel_id).content(&out).await {
            error!(?reply_error, command = %command.name, "failed to report command failure");
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_name_and_arguments() {
        let parsed = parse_command("!clearuser <@42>  25 ").unwrap();
        assert_eq!(parsed.name, "clearuser");
        assert_eq!(parsed.arg1, Some("<@42>"));
        assert_eq!(parsed.arg_tail, Some("25"));
    }

    #[test]
    fn lowercases_the_name_only() {
        let parsed = parse_command("  !AutoCleanup <#1> 14").unwrap();
        assert_eq!(parsed.name, "autocleanup");
        assert_eq!(parsed.arg1, Some("<#1>"));
        assert_eq!(parsed.arg_tail, Some("14"));
    }

    #[test]
    fn bare_command_has_no_arguments() {
        let parsed = parse_command("!listauto").unwrap();
        assert_eq!(parsed.arg1, None);
        assert_eq!(parsed.arg_tail, None);
    }

    #[test]
    fn ignores_unprefixed_and_empty() {
        assert_eq!(parse_command("clear 10"), None);
        assert_eq!(parse_command("!"), None);
        assert_eq!(parse_command("!   "), None);
    }

    #[test]
    fn catalog_lists_the_supported_commands() {
        let mut names: Vec<&str> = COMMANDS.iter().map(|command| command.name).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            [
                "autocleanup",
                "backup",
                "channelstats",
                "clear",
                "clearall",
                "clearold",
                "clearuser",
                "help",
                "listauto",
                "ping",
                "runcleanup",
                "stopauto",
            ]
        );
    }

    #[test]
    fn command_names_are_unique() {
        let mut names: Vec<&str> = COMMANDS.iter().map(|command| command.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COMMANDS.len());
    }
}
