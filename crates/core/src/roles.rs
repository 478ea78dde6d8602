//! Well-known role names and the project-manager capability predicate.
//!
//! Role names are stored verbatim in `users.role`; the `team_member`
//! default lives in the migration and must stay in sync with these
//! constants.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_TEAM_MEMBER: &str = "team_member";
pub const ROLE_USER: &str = "user";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_TEAM_MEMBER, ROLE_USER];

/// The team-role designation that grants budget-decision capability to a
/// team member. Checked as a literal because `team_role` is operator-entered
/// free text in the staff directory.
pub const PROJECT_MANAGER_DESIGNATION: &str = "Gerente de Projetos";

/// Whether the caller may decide budgets (accept/decline, confirm
/// contracts, schedule deliveries). Admins always can; team members only
/// with the project-manager designation.
pub fn is_project_manager(role: &str, team_role: Option<&str>) -> bool {
    role == ROLE_ADMIN
        || (role == ROLE_TEAM_MEMBER && team_role == Some(PROJECT_MANAGER_DESIGNATION))
}

/// Validate that a role string is one of the accepted values.
pub fn validate_role(role: &str) -> Result<(), String> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        ))
    }
}
