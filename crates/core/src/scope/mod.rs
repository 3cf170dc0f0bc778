//! Tenant scope resolution.
//!
//! Every operation receives an explicit [`Actor`] describing who is
//! acting and which organization/branch they belong to. The resolver
//! turns that into either a blanket decision on a concrete target or a
//! [`TenantScope`] the query layer composes into listing predicates;
//! rows are never fetched first and filtered afterwards.

mod error;

pub use error::ScopeError;

use uuid::Uuid;

/// The user performing an operation.
///
/// Constructed at the API boundary from validated claims and passed
/// down explicitly; core code never reads ambient authentication
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// The acting user's ID.
    pub user_id: Uuid,
    /// Organization the user is scoped to, if any.
    pub organization_id: Option<Uuid>,
    /// Branch the user is scoped to, if any.
    pub branch_id: Option<Uuid>,
    /// Super admins bypass all tenant checks.
    pub super_admin: bool,
}

impl Actor {
    /// Creates a super admin actor.
    #[must_use]
    pub const fn super_admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            organization_id: None,
            branch_id: None,
            super_admin: true,
        }
    }

    /// Creates an actor scoped to a whole organization.
    #[must_use]
    pub const fn organization_scoped(user_id: Uuid, organization_id: Uuid) -> Self {
        Self {
            user_id,
            organization_id: Some(organization_id),
            branch_id: None,
            super_admin: false,
        }
    }

    /// Creates an actor scoped to a single branch.
    #[must_use]
    pub const fn branch_scoped(user_id: Uuid, organization_id: Uuid, branch_id: Uuid) -> Self {
        Self {
            user_id,
            organization_id: Some(organization_id),
            branch_id: Some(branch_id),
            super_admin: false,
        }
    }
}

/// The query predicate an actor's scope reduces to.
///
/// The repository layer translates this into SQL conditions; `Denied`
/// becomes the always-false predicate so listings come back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// No restriction (super admin).
    Unrestricted,
    /// All branches belonging to this organization.
    Organization(Uuid),
    /// Exactly this branch.
    Branch(Uuid),
    /// No access at all.
    Denied,
}

/// Organization/branch pairing of a concrete target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantRef {
    /// Organization owning the target.
    pub organization_id: Uuid,
    /// Branch owning the target.
    pub branch_id: Uuid,
}

/// Stateless tenant scope resolver.
///
/// Rules are evaluated in order: super admin, organization-wide,
/// branch-exact, then deny.
pub struct ScopeResolver;

impl ScopeResolver {
    /// Resolves the listing predicate for an actor.
    #[must_use]
    pub fn scope_for(actor: &Actor) -> TenantScope {
        if actor.super_admin {
            return TenantScope::Unrestricted;
        }
        if let Some(branch_id) = actor.branch_id {
            return TenantScope::Branch(branch_id);
        }
        if let Some(organization_id) = actor.organization_id {
            return TenantScope::Organization(organization_id);
        }
        TenantScope::Denied
    }

    /// Decides whether the actor may read or write the given target.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::AccessDenied`] when the target falls
    /// outside the actor's organization/branch boundary.
    pub fn authorize(actor: &Actor, target: TenantRef) -> Result<(), ScopeError> {
        match Self::scope_for(actor) {
            TenantScope::Unrestricted => Ok(()),
            TenantScope::Branch(branch_id) => {
                if target.branch_id == branch_id {
                    Ok(())
                } else {
                    Err(ScopeError::AccessDenied {
                        user_id: actor.user_id,
                    })
                }
            }
            TenantScope::Organization(organization_id) => {
                if target.organization_id == organization_id {
                    Ok(())
                } else {
                    Err(ScopeError::AccessDenied {
                        user_id: actor.user_id,
                    })
                }
            }
            TenantScope::Denied => Err(ScopeError::AccessDenied {
                user_id: actor.user_id,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(org: Uuid, branch: Uuid) -> TenantRef {
        TenantRef {
            organization_id: org,
            branch_id: branch,
        }
    }

    #[test]
    fn test_super_admin_is_unrestricted() {
        let actor = Actor::super_admin(Uuid::new_v4());
        assert_eq!(ScopeResolver::scope_for(&actor), TenantScope::Unrestricted);
        assert!(ScopeResolver::authorize(&actor, target(Uuid::new_v4(), Uuid::new_v4())).is_ok());
    }

    #[test]
    fn test_org_scoped_sees_all_branches_of_own_org() {
        let org = Uuid::new_v4();
        let actor = Actor::organization_scoped(Uuid::new_v4(), org);

        assert_eq!(ScopeResolver::scope_for(&actor), TenantScope::Organization(org));
        assert!(ScopeResolver::authorize(&actor, target(org, Uuid::new_v4())).is_ok());
        assert!(ScopeResolver::authorize(&actor, target(org, Uuid::new_v4())).is_ok());
    }

    #[test]
    fn test_org_scoped_denied_other_org() {
        let actor = Actor::organization_scoped(Uuid::new_v4(), Uuid::new_v4());
        let err =
            ScopeResolver::authorize(&actor, target(Uuid::new_v4(), Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, ScopeError::AccessDenied { .. }));
    }

    #[test]
    fn test_branch_scoped_requires_exact_branch() {
        let org = Uuid::new_v4();
        let branch = Uuid::new_v4();
        let actor = Actor::branch_scoped(Uuid::new_v4(), org, branch);

        assert_eq!(ScopeResolver::scope_for(&actor), TenantScope::Branch(branch));
        assert!(ScopeResolver::authorize(&actor, target(org, branch)).is_ok());
        // Another branch of the same organization is still off-limits.
        assert!(ScopeResolver::authorize(&actor, target(org, Uuid::new_v4())).is_err());
    }

    #[test]
    fn test_branch_rule_wins_over_org_rule() {
        // A branch-scoped user must not fall back to organization-wide
        // access even though they carry an organization_id.
        let org = Uuid::new_v4();
        let actor = Actor::branch_scoped(Uuid::new_v4(), org, Uuid::new_v4());
        assert!(ScopeResolver::authorize(&actor, target(org, Uuid::new_v4())).is_err());
    }

    #[test]
    fn test_unscoped_user_denied() {
        let actor = Actor {
            user_id: Uuid::new_v4(),
            organization_id: None,
            branch_id: None,
            super_admin: false,
        };
        assert_eq!(ScopeResolver::scope_for(&actor), TenantScope::Denied);
        assert!(ScopeResolver::authorize(&actor, target(Uuid::new_v4(), Uuid::new_v4())).is_err());
    }
}
