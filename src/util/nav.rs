//! Role-dependent dashboard navigation.

#[cfg(test)]
#[path = "nav_test.rs"]
mod nav_test;

use crate::net::types::{OrganizationType, Role, RoleGrant, UserProfile};

/// One entry of the dashboard menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

const HOME: NavItem = NavItem { label: "Главная", path: "/dashboard" };
const EMPLOYEES: NavItem = NavItem { label: "Сотрудники", path: "/dashboard/employees" };
const EXAMINATIONS: NavItem = NavItem { label: "Осмотры", path: "/dashboard/examinations" };
const MY_EXAMINATIONS: NavItem = NavItem { label: "Мои осмотры", path: "/dashboard/examinations" };
const CALENDAR_PLANS: NavItem = NavItem { label: "Календарные планы", path: "/dashboard/calendar-plans" };
const PARTNERSHIPS: NavItem = NavItem { label: "Партнерства", path: "/dashboard/partnerships" };
const SUBSCRIPTIONS: NavItem = NavItem { label: "Подписки", path: "/dashboard/subscriptions" };
const REGISTRY: NavItem = NavItem { label: "Регистратура", path: "/dashboard/clinic/registry" };
const DOCUMENTS: NavItem = NavItem { label: "Документы", path: "/dashboard/documents" };
const STAFF: NavItem = NavItem { label: "Медработники", path: "/dashboard/clinic/staff" };

/// Dashboard layout selected by the primary role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DashboardVariant {
    Employer,
    Clinic,
    Patient,
}

impl Role {
    #[must_use]
    pub fn dashboard_variant(self) -> DashboardVariant {
        match self {
            Self::Employer => DashboardVariant::Employer,
            Self::Clinic => DashboardVariant::Clinic,
            Self::Patient => DashboardVariant::Patient,
        }
    }
}

/// Menu for a user; empty until the profile is loaded.
#[must_use]
pub fn navigation_for(profile: Option<&UserProfile>) -> Vec<NavItem> {
    let Some(profile) = profile else {
        return Vec::new();
    };

    match profile.primary_role.dashboard_variant() {
        DashboardVariant::Employer => vec![HOME, EMPLOYEES, EXAMINATIONS, CALENDAR_PLANS, PARTNERSHIPS, SUBSCRIPTIONS],
        DashboardVariant::Clinic => clinic_navigation(profile),
        DashboardVariant::Patient => vec![HOME, MY_EXAMINATIONS, SUBSCRIPTIONS],
    }
}

fn clinic_navigation(profile: &UserProfile) -> Vec<NavItem> {
    let is_owner = profile.has_grant(RoleGrant::ClinicOwner);
    let membership_role =
        profile.first_organization(OrganizationType::Clinic).map_or("doctor", |org| org.role.as_str());

    let mut items = vec![HOME];
    if is_owner || membership_role == "registrar" {
        items.push(REGISTRY);
    }
    items.push(EXAMINATIONS);
    if is_owner {
        items.extend([PARTNERSHIPS, DOCUMENTS, STAFF, SUBSCRIPTIONS]);
    }
    items
}
