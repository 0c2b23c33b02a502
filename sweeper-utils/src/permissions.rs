use twilight_http::Client;
use twilight_model::{gateway::payload::incoming::MessageCreate, guild::Permissions};

/// Named permission gates enforced before a command handler runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Capability {
    ManageMessages,
    Administrator,
}

impl Capability {
    pub fn permissions(self) -> Permissions {
        match self {
            Self::ManageMessages => Permissions::MANAGE_MESSAGES,
            Self::Administrator => Permissions::ADMINISTRATOR,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::ManageMessages => "Manage Messages",
            Self::Administrator => "Administrator",
        }
    }

    pub fn denied_message(self) -> String {
        format!(
            "You need '{}' permission to use this command.",
            self.display_name()
        )
    }

    /// Administrator implies every other capability.
    pub fn is_granted_by(self, perms: Permissions) -> bool {
        perms.contains(Permissions::ADMINISTRATOR) || perms.contains(self.permissions())
    }
}

/// Resolve the invoking author's effective guild permissions for a message command.
///
/// Returns `Ok(None)` when the message is not from a guild context.
pub async fn resolve_message_author_permissions(
    http: &Client,
    msg: &MessageCreate,
) -> anyhow::Result<Option<Permissions>> {
    if let Some(perms) = msg.member.as_ref().and_then(|m| m.permissions) {
        return Ok(Some(perms));
    }

    let Some(guild_id) = msg.guild_id else {
        return Ok(None);
    };

    let guild = http.guild(guild_id).await?.model().await?;
    if guild.owner_id == msg.author.id {
        return Ok(Some(Permissions::all()));
    }

    let member = http
        .guild_member(guild_id, msg.author.id)
        .await?
        .model()
        .await?;

    let resolved = guild
        .roles
        .iter()
        .filter(|role| role.id == guild_id.cast() || member.roles.contains(&role.id))
        .fold(Permissions::empty(), |acc, role| acc | role.permissions);

    Ok(Some(resolved))
}

/// Check whether the message author holds a capability.
///
/// Returns `Ok(false)` when the message is outside a guild context.
pub async fn has_capability(
    http: &Client,
    msg: &MessageCreate,
    capability: Capability,
) -> anyhow::Result<bool> {
    let Some(perms) = resolve_message_author_permissions(http, msg).await? else {
        return Ok(false);
    };

    Ok(capability.is_granted_by(perms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrator_grants_everything() {
        assert!(Capability::ManageMessages.is_granted_by(Permissions::ADMINISTRATOR));
        assert!(Capability::Administrator.is_granted_by(Permissions::ADMINISTRATOR));
    }

    #[test]
    fn manage_messages_is_not_administrator() {
        assert!(Capability::ManageMessages.is_granted_by(Permissions::MANAGE_MESSAGES));
        assert!(!Capability::Administrator.is_granted_by(Permissions::MANAGE_MESSAGES));
        assert!(!Capability::ManageMessages.is_granted_by(Permissions::SEND_MESSAGES));
    }

    #[test]
    fn denial_names_the_capability() {
        assert_eq!(
            Capability::Administrator.denied_message(),
            "You need 'Administrator' permission to use this command."
        );
    }
}
