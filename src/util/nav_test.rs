use super::*;
use crate::net::types::{OrganizationMembership, ProfileUser};

fn profile(primary_role: Role, grants: Vec<RoleGrant>, clinic_role: Option<&str>) -> UserProfile {
    UserProfile {
        user: ProfileUser {
            id: 1,
            phone_number: "77001234567".into(),
            phone_verified: true,
            date_joined: None,
            first_name: None,
            last_name: None,
            middle_name: None,
            has_password: None,
        },
        grants,
        primary_role,
        organizations: clinic_role
            .map(|role| OrganizationMembership {
                id: 3,
                name: "Клиника".into(),
                kind: OrganizationType::Clinic,
                role: role.into(),
                specialization: None,
                license_number: None,
            })
            .into_iter()
            .collect(),
        employee: None,
        medical_staff: None,
    }
}

fn paths(items: &[NavItem]) -> Vec<&'static str> {
    items.iter().map(|i| i.path).collect()
}

#[test]
fn no_profile_no_menu() {
    assert!(navigation_for(None).is_empty());
}

#[test]
fn employer_menu() {
    let p = profile(Role::Employer, vec![RoleGrant::EmployerOwner], None);
    assert_eq!(
        paths(&navigation_for(Some(&p))),
        vec![
            "/dashboard",
            "/dashboard/employees",
            "/dashboard/examinations",
            "/dashboard/calendar-plans",
            "/dashboard/partnerships",
            "/dashboard/subscriptions",
        ]
    );
}

#[test]
fn clinic_doctor_menu() {
    let p = profile(Role::Clinic, vec![RoleGrant::ClinicStaff], Some("doctor"));
    assert_eq!(paths(&navigation_for(Some(&p))), vec!["/dashboard", "/dashboard/examinations"]);
}

#[test]
fn clinic_registrar_gets_registry_second() {
    let p = profile(Role::Clinic, vec![RoleGrant::ClinicStaff], Some("registrar"));
    assert_eq!(
        paths(&navigation_for(Some(&p))),
        vec!["/dashboard", "/dashboard/clinic/registry", "/dashboard/examinations"]
    );
}

#[test]
fn clinic_owner_gets_admin_items() {
    let p = profile(Role::Clinic, vec![RoleGrant::ClinicOwner], Some("owner"));
    assert_eq!(
        paths(&navigation_for(Some(&p))),
        vec![
            "/dashboard",
            "/dashboard/clinic/registry",
            "/dashboard/examinations",
            "/dashboard/partnerships",
            "/dashboard/documents",
            "/dashboard/clinic/staff",
            "/dashboard/subscriptions",
        ]
    );
}

#[test]
fn patient_menu_labels() {
    let p = profile(Role::Patient, vec![RoleGrant::Patient], None);
    let labels: Vec<&str> = navigation_for(Some(&p)).iter().map(|i| i.label).collect();
    assert_eq!(labels, vec!["Главная", "Мои осмотры", "Подписки"]);
}

#[test]
fn dashboard_variant_follows_role() {
    assert_eq!(Role::Clinic.dashboard_variant(), DashboardVariant::Clinic);
    assert_eq!(Role::Employer.dashboard_variant(), DashboardVariant::Employer);
}
