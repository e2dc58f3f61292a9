//! Wire DTOs for the ProfMed REST API.
//!
//! DESIGN
//! ======
//! These mirror the backend's JSON responses field for field. Optional fields
//! the backend sometimes omits (or sends as `null`) default instead of failing
//! the whole decode, since the profile is a read-only projection of server state.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Authenticated user as returned by the login exchanges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    /// Normalized phone number (`7XXXXXXXXXX`).
    pub phone_number: String,
    pub phone_verified: bool,
    /// ISO-8601 timestamp, if the backend knows it.
    #[serde(default)]
    pub date_joined: Option<String>,
}

/// Access/refresh bearer token pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair").field("access", &"<redacted>").field("refresh", &"<redacted>").finish()
    }
}

/// Response body of `verify-otp` and `login-password`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserSummary,
    pub tokens: TokenPair,
}

/// Plain `{ "message": ... }` acknowledgement used by several auth endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Acknowledgement of `send-otp`, echoing the normalized phone number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpSent {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

// =============================================================================
// ROLES
// =============================================================================

/// Dashboard-level role. A user may hold several; one is primary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employer,
    Clinic,
    Patient,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Employer => "employer",
            Self::Clinic => "clinic",
            Self::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role grant as reported by `GET /auth/profile/`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleGrant {
    EmployerOwner,
    EmployerStaff,
    ClinicOwner,
    ClinicStaff,
    Patient,
    #[serde(other)]
    Unknown,
}

impl RoleGrant {
    /// Dashboard role this grant belongs to; `None` for unrecognized grants.
    #[must_use]
    pub fn role(self) -> Option<Role> {
        match self {
            Self::EmployerOwner | Self::EmployerStaff => Some(Role::Employer),
            Self::ClinicOwner | Self::ClinicStaff => Some(Role::Clinic),
            Self::Patient => Some(Role::Patient),
            Self::Unknown => None,
        }
    }
}

// =============================================================================
// PROFILE
// =============================================================================

/// Organization kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationType {
    Employer,
    Clinic,
}

/// A user's membership in an organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMembership {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OrganizationType,
    /// Membership role: `owner`, `hr`, `doctor`, `registrar`, ...
    pub role: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
}

/// User block of the profile payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUser {
    pub id: i64,
    pub phone_number: String,
    pub phone_verified: bool,
    #[serde(default)]
    pub date_joined: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub has_password: Option<bool>,
}

/// Employee record when the user is a patient of an employer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub id: i64,
    pub employer_id: i64,
    pub employer_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub iin: String,
    #[serde(default)]
    pub position_id: Option<i64>,
    #[serde(default)]
    pub position_name: Option<String>,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub hire_date: Option<String>,
}

/// Medical staff record from the user's first clinic membership.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffSummary {
    pub organization_id: i64,
    pub organization_name: String,
    pub role: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
}

/// Role/organization projection returned by `GET /auth/profile/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: ProfileUser,
    #[serde(rename = "roles", default)]
    pub grants: Vec<RoleGrant>,
    pub primary_role: Role,
    #[serde(default)]
    pub organizations: Vec<OrganizationMembership>,
    #[serde(default)]
    pub employee: Option<EmployeeSummary>,
    #[serde(default)]
    pub medical_staff: Option<StaffSummary>,
}

impl UserProfile {
    /// Set of dashboard roles held through any grant.
    #[must_use]
    pub fn roles(&self) -> BTreeSet<Role> {
        self.grants.iter().filter_map(|g| g.role()).collect()
    }

    #[must_use]
    pub fn has_grant(&self, grant: RoleGrant) -> bool {
        self.grants.contains(&grant)
    }

    /// First membership in an organization of `kind`.
    #[must_use]
    pub fn first_organization(&self, kind: OrganizationType) -> Option<&OrganizationMembership> {
        self.organizations.iter().find(|o| o.kind == kind)
    }

    /// `Фамилия Имя Отчество` when the backend knows the name parts.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.user.last_name, &self.user.first_name, &self.user.middle_name]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}
