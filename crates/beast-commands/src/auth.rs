//! Who is invoking a command, computed once per invocation.

use crate::definition::Requirement;
use beast_common::{Capabilities, UserId};
use beast_config::ConfigDocument;

/// Owner, team and capability facts about the invoking user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationContext {
    /// The invoking user.
    pub user: UserId,
    /// Whether the user is in the owner set.
    pub is_owner: bool,
    /// Whether the user is in the global team list.
    pub is_team: bool,
    /// Member permissions in the invoking guild.
    pub capabilities: Capabilities,
    /// Owner to name in rejection messages.
    pub owner_contact: Option<UserId>,
}

impl AuthorizationContext {
    /// Resolve the owner set (environment owner, `ownerId`, `owners`,
    /// `_global.owners`) and team membership for `user`.
    #[must_use]
    pub fn resolve(
        env_owner: Option<UserId>,
        doc: &ConfigDocument,
        user: UserId,
        capabilities: Capabilities,
    ) -> Self {
        let document_owners = doc.document_owners();
        let is_owner = env_owner == Some(user) || document_owners.contains(&user);
        Self {
            user,
            is_owner,
            is_team: doc.global.team.contains(&user),
            capabilities,
            owner_contact: env_owner.or_else(|| document_owners.first().copied()),
        }
    }

    /// Whether the user may run something that needs `requirement`.
    #[must_use]
    pub const fn satisfies(&self, requirement: Requirement) -> bool {
        if self.is_owner {
            return true;
        }
        let caps = self.capabilities;
        match requirement {
            Requirement::Everyone => true,
            Requirement::ManageGuild => caps.can_manage_guild(),
            Requirement::ManageMessages => caps.can_manage_messages(),
            Requirement::ManageRoles => caps.can_manage_roles(),
            Requirement::Administrator => caps.administrator,
            Requirement::Team => self.is_team || caps.can_manage_guild(),
            Requirement::Owner => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beast_common::test_utils::discord_fixtures::{member_id, other_member_id, owner_id};

    fn doc_with(owners: &[UserId], team: &[UserId]) -> ConfigDocument {
        let mut doc = ConfigDocument::default();
        doc.global.owners = owners.to_vec();
        doc.global.team = team.to_vec();
        doc
    }

    #[test]
    fn test_owner_sources_are_unioned() {
        let mut doc = ConfigDocument::default();
        doc.owner_id = Some(member_id());
        let auth = AuthorizationContext::resolve(Some(owner_id()), &doc, member_id(), Capabilities::NONE);
        assert!(auth.is_owner);
        assert_eq!(auth.owner_contact, Some(owner_id()));

        let auth = AuthorizationContext::resolve(None, &doc, member_id(), Capabilities::NONE);
        assert_eq!(auth.owner_contact, Some(member_id()));

        let auth = AuthorizationContext::resolve(None, &doc, other_member_id(), Capabilities::NONE);
        assert!(!auth.is_owner);
    }

    #[test]
    fn test_requirements() {
        let doc = doc_with(&[owner_id()], &[member_id()]);
        let team = AuthorizationContext::resolve(None, &doc, member_id(), Capabilities::NONE);
        assert!(team.satisfies(Requirement::Team));
        assert!(!team.satisfies(Requirement::ManageMessages));
        assert!(!team.satisfies(Requirement::Owner));

        let admin = Capabilities {
            administrator: true,
            ..Capabilities::NONE
        };
        let admin = AuthorizationContext::resolve(None, &doc, other_member_id(), admin);
        assert!(admin.satisfies(Requirement::ManageRoles));
        assert!(admin.satisfies(Requirement::Team));
        assert!(!admin.satisfies(Requirement::Owner));

        let owner = AuthorizationContext::resolve(None, &doc, owner_id(), Capabilities::NONE);
        assert!(owner.satisfies(Requirement::Owner));
        assert!(owner.satisfies(Requirement::Administrator));
    }
}
