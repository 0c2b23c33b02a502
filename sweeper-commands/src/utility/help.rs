use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::utility::embeds::{grouped_help_description, help_embed, unknown_category_message};
use crate::{COMMANDS, CommandMeta};
use sweeper_core::Context;

pub const META: CommandMeta = CommandMeta {
    name: "help",
    desc: "Lists out all available commands.",
    category: "utility",
    usage: "!help [category]",
};

/// Render the command catalog, optionally filtered by category.
pub async fn run(ctx: Context, msg: Box<MessageCreate>, arg1: Option<&str>) -> anyhow::Result<()> {
    let http = &ctx.http;
    let category = arg1.map(str::to_ascii_lowercase);

    let mut categories: Vec<&str> = COMMANDS.iter().map(|c| c.category).collect();
    categories.sort_unstable();
    categories.dedup();

    if let Some(wanted_category) = category.as_deref()
        && !categories.contains(&wanted_category)
    {
        let out = unknown_category_message(wanted_category, &categories);
        http.create_message(msg.channel_id).content(&out).await?;
        return Ok(());
    }

    let commands = sorted_commands(category.as_deref());
    let description = grouped_help_description(&commands);
    let embed = help_embed(description)?;
    http.create_message(msg.channel_id).embeds(&[embed]).await?;

    Ok(())
}

fn sorted_commands(category: Option<&str>) -> Vec<&'static CommandMeta> {
    let mut commands: Vec<&'static CommandMeta> = COMMANDS
        .iter()
        .filter(|command| category.is_none_or(|wanted| command.category == wanted))
        .collect();
    commands.sort_by_key(|command| (command.category, command.name));
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_grouped_by_category() {
        let commands = sorted_commands(None);
        assert_eq!(commands.len(), COMMANDS.len());
        assert!(
            commands
                .windows(2)
                .all(|pair| (pair[0].category, pair[0].name) <= (pair[1].category, pair[1].name))
        );
    }

    #[test]
    fn category_filter() {
        let commands = sorted_commands(Some("autocleanup"));
        assert!(!commands.is_empty());
        assert!(commands.iter().all(|command| command.category == "autocleanup"));
    }
}
