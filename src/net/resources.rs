//! Thin wrappers over the remaining REST groups.
//!
//! The backend owns these schemas, so payloads travel as `serde_json::Value`.
//! Each group is a borrowed view over the client: `client.examinations().get(42)`.

use serde_json::{Value, json};

use super::client::ApiClient;
use super::error::ApiError;

type ApiResult = Result<Value, ApiError>;

macro_rules! resource_group {
    ($(#[$meta:meta])* $name:ident, $accessor:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $name<'a> {
            client: &'a ApiClient,
        }

        impl ApiClient {
            #[must_use]
            pub fn $accessor(&self) -> $name<'_> {
                $name { client: self }
            }
        }
    };
}

resource_group!(
    /// `/subscriptions/`
    Subscriptions,
    subscriptions
);
resource_group!(
    /// `/organizations/organizations/`
    Organizations,
    organizations
);
resource_group!(
    /// `/organizations/employees/`
    Employees,
    employees
);
resource_group!(
    /// `/compliance/`: harmful factors, professions, contraindications.
    Compliance,
    compliance
);
resource_group!(
    /// `/examinations/examinations/`
    Examinations,
    examinations
);
resource_group!(
    /// `/documents/documents/`
    Documents,
    documents
);
resource_group!(
    /// `/documents/calendar-plans/`
    CalendarPlans,
    calendar_plans
);
resource_group!(
    /// `/organizations/partnerships/`
    Partnerships,
    partnerships
);

// =============================================================================
// Subscriptions
// =============================================================================

impl Subscriptions<'_> {
    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn plans(&self) -> ApiResult {
        self.client.get("/subscriptions/plans/").await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn current(&self) -> ApiResult {
        self.client.get("/subscriptions/subscriptions/my_subscriptions/").await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn request(&self, organization_id: i64, plan_id: i64) -> ApiResult {
        self.client
            .post(
                "/subscriptions/subscriptions/request_subscription/",
                &json!({ "organization_id": organization_id, "plan_id": plan_id }),
            )
            .await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn approve(&self, subscription_id: i64, duration_months: u32) -> ApiResult {
        self.client
            .post(
                &format!("/subscriptions/subscriptions/{subscription_id}/approve/"),
                &json!({ "duration_months": duration_months }),
            )
            .await
    }
}

// =============================================================================
// Organizations
// =============================================================================

/// New member for [`Organizations::add_member`]. Omitted optional fields are
/// sent as empty strings.
#[derive(Clone, Debug, Default)]
pub struct NewMember<'a> {
    pub phone_number: &'a str,
    pub role: &'a str,
    pub specialization: Option<&'a str>,
    pub license_number: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub middle_name: Option<&'a str>,
}

impl Organizations<'_> {
    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn list(&self) -> ApiResult {
        self.client.get("/organizations/organizations/").await
    }

    /// # Errors
    ///
    /// `Status` carrying the backend's validation message when the payload is
    /// rejected, otherwise any request error.
    pub async fn create(&self, data: &Value) -> ApiResult {
        self.client.post("/organizations/organizations/", data).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn get(&self, id: i64) -> ApiResult {
        self.client.get(&format!("/organizations/organizations/{id}/")).await
    }

    /// # Errors
    ///
    /// `Status` carrying the backend's validation message when the payload is
    /// rejected, otherwise any request error.
    pub async fn update(&self, id: i64, data: &Value) -> ApiResult {
        self.client.put(&format!("/organizations/organizations/{id}/"), data).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn delete(&self, id: i64) -> ApiResult {
        self.client.delete(&format!("/organizations/organizations/{id}/")).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn all_clinics(&self) -> ApiResult {
        self.client.get("/organizations/organizations/all_clinics/").await
    }

    /// # Errors
    ///
    /// `Status` carrying the backend's validation message when the payload is
    /// rejected, otherwise any request error.
    pub async fn add_member(&self, id: i64, member: &NewMember<'_>) -> ApiResult {
        let body = json!({
            "phone_number": member.phone_number,
            "role": member.role,
            "specialization": member.specialization.unwrap_or_default(),
            "license_number": member.license_number.unwrap_or_default(),
            "first_name": member.first_name.unwrap_or_default(),
            "last_name": member.last_name.unwrap_or_default(),
            "middle_name": member.middle_name.unwrap_or_default(),
        });
        self.client.post(&format!("/organizations/organizations/{id}/add_member/"), &body).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn members(&self, id: i64) -> ApiResult {
        self.client.get(&format!("/organizations/organizations/{id}/members/")).await
    }
}

// =============================================================================
// Employees
// =============================================================================

impl Employees<'_> {
    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn list(&self) -> ApiResult {
        self.client.get("/organizations/employees/").await
    }

    /// # Errors
    ///
    /// `Status` carrying the backend's validation message when the payload is
    /// rejected, otherwise any request error.
    pub async fn create(&self, data: &Value) -> ApiResult {
        self.client.post("/organizations/employees/", data).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn get(&self, id: i64) -> ApiResult {
        self.client.get(&format!("/organizations/employees/{id}/")).await
    }

    /// # Errors
    ///
    /// `Status` carrying the backend's validation message when the payload is
    /// rejected, otherwise any request error.
    pub async fn update(&self, id: i64, data: &Value) -> ApiResult {
        self.client.put(&format!("/organizations/employees/{id}/"), data).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn delete(&self, id: i64) -> ApiResult {
        self.client.delete(&format!("/organizations/employees/{id}/")).await
    }

    /// Upload an Excel roster as the multipart field `file`.
    ///
    /// # Errors
    ///
    /// `Status` with the backend's message when the roster is rejected,
    /// otherwise any request error.
    pub async fn import_excel(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_owned());
        let form = reqwest::multipart::Form::new().part("file", part);
        self.client.post_multipart("/organizations/employees/import_excel/", form).await
    }
}

// =============================================================================
// Compliance
// =============================================================================

impl Compliance<'_> {
    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn factors(&self) -> ApiResult {
        self.client.get("/compliance/factors/").await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn factor(&self, id: i64) -> ApiResult {
        self.client.get(&format!("/compliance/factors/{id}/")).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn professions(&self) -> ApiResult {
        self.client.get("/compliance/professions/").await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn profession(&self, id: i64) -> ApiResult {
        self.client.get(&format!("/compliance/professions/{id}/")).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn auto_map_factors(&self, profession_name: &str) -> ApiResult {
        self.client
            .post("/compliance/professions/auto_map_factors/", &json!({ "profession_name": profession_name }))
            .await
    }

    /// Contraindications, optionally narrowed to one harmful factor.
    ///
    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn contraindications(&self, harmful_factor_id: Option<i64>) -> ApiResult {
        const PATH: &str = "/compliance/contraindications/";
        match harmful_factor_id {
            Some(id) => self.client.get_with_query(PATH, &[("harmful_factor_id", id)]).await,
            None => self.client.get(PATH).await,
        }
    }
}

// =============================================================================
// Examinations
// =============================================================================

impl Examinations<'_> {
    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn list(&self) -> ApiResult {
        self.client.get("/examinations/examinations/").await
    }

    /// # Errors
    ///
    /// `Status` carrying the backend's validation message when the payload is
    /// rejected, otherwise any request error.
    pub async fn create(&self, data: &Value) -> ApiResult {
        self.client.post("/examinations/examinations/", data).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn get(&self, id: i64) -> ApiResult {
        self.client.get(&format!("/examinations/examinations/{id}/")).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn start(&self, id: i64) -> ApiResult {
        self.client.post_empty(&format!("/examinations/examinations/{id}/start/")).await
    }

    /// # Errors
    ///
    /// `Status` carrying the backend's validation message when the payload is
    /// rejected, otherwise any request error.
    pub async fn add_doctor_examination(&self, id: i64, data: &Value) -> ApiResult {
        self.client.post(&format!("/examinations/examinations/{id}/add_doctor_examination/"), data).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn complete(&self, id: i64, result: &str, profpathologist_id: Option<i64>) -> ApiResult {
        self.client
            .post(
                &format!("/examinations/examinations/{id}/complete/"),
                &json!({ "result": result, "profpathologist_id": profpathologist_id }),
            )
            .await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn by_qr(&self, qr_code: &str) -> ApiResult {
        self.client.get_with_query("/examinations/examinations/by_qr/", &[("qr_code", qr_code)]).await
    }
}

// =============================================================================
// Documents
// =============================================================================

impl Documents<'_> {
    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn list(&self) -> ApiResult {
        self.client.get("/documents/documents/").await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn get(&self, id: i64) -> ApiResult {
        self.client.get(&format!("/documents/documents/{id}/")).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn get_or_generate_appendix_3(&self, employer_id: i64, year: i32) -> ApiResult {
        self.client
            .get_with_query(
                "/documents/documents/get_or_generate_appendix_3/",
                &[("employer_id", employer_id), ("year", i64::from(year))],
            )
            .await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn generate_appendix_3(&self, employer_id: i64, year: i32) -> ApiResult {
        self.client
            .post("/documents/documents/generate_appendix_3/", &json!({ "employer_id": employer_id, "year": year }))
            .await
    }

    /// `start_date` and `end_date` are ISO dates (`YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn generate_calendar_plan(
        &self,
        employer_id: i64,
        clinic_id: i64,
        year: i32,
        start_date: &str,
        end_date: Option<&str>,
    ) -> ApiResult {
        self.client
            .post(
                "/documents/documents/generate_calendar_plan/",
                &json!({
                    "employer_id": employer_id,
                    "clinic_id": clinic_id,
                    "year": year,
                    "start_date": start_date,
                    "end_date": end_date,
                }),
            )
            .await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn generate_final_act(&self, employer_id: i64, clinic_id: i64, year: i32) -> ApiResult {
        self.client
            .post(
                "/documents/documents/generate_final_act/",
                &json!({ "employer_id": employer_id, "clinic_id": clinic_id, "year": year }),
            )
            .await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn request_signature(&self, id: i64, role: &str) -> ApiResult {
        self.client.post(&format!("/documents/documents/{id}/request_signature/"), &json!({ "role": role })).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn verify_and_sign(&self, id: i64, role: &str, otp_code: &str) -> ApiResult {
        self.client
            .post(
                &format!("/documents/documents/{id}/verify_and_sign/"),
                &json!({ "role": role, "otp_code": otp_code }),
            )
            .await
    }
}

// =============================================================================
// Calendar plans
// =============================================================================

impl CalendarPlans<'_> {
    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn list(&self) -> ApiResult {
        self.client.get("/documents/calendar-plans/").await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn get(&self, id: i64) -> ApiResult {
        self.client.get(&format!("/documents/calendar-plans/{id}/")).await
    }

    /// # Errors
    ///
    /// `Status` carrying the backend's validation message when the payload is
    /// rejected, otherwise any request error.
    pub async fn update(&self, id: i64, data: &Value) -> ApiResult {
        self.client.put(&format!("/documents/calendar-plans/{id}/"), data).await
    }

    /// # Errors
    ///
    /// `Status` carrying the backend's validation message when the payload is
    /// rejected, otherwise any request error.
    pub async fn partial_update(&self, id: i64, data: &Value) -> ApiResult {
        self.client.patch(&format!("/documents/calendar-plans/{id}/"), data).await
    }
}

// =============================================================================
// Partnerships
// =============================================================================

/// Terms for [`Partnerships::confirm`].
#[derive(Clone, Debug)]
pub struct PartnershipTerms {
    pub pricing: Value,
    pub default_price: f64,
    pub notes: String,
    /// ISO date the partnership lapses, if any.
    pub expires_at: Option<String>,
}

impl Default for PartnershipTerms {
    fn default() -> Self {
        Self { pricing: json!({}), default_price: 0.0, notes: String::new(), expires_at: None }
    }
}

impl Partnerships<'_> {
    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn list(&self) -> ApiResult {
        self.client.get("/organizations/partnerships/").await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn get(&self, id: i64) -> ApiResult {
        self.client.get(&format!("/organizations/partnerships/{id}/")).await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn request(&self, employer_id: i64, clinic_id: i64, default_price: f64) -> ApiResult {
        self.client
            .post(
                "/organizations/partnerships/request_partnership/",
                &json!({ "employer_id": employer_id, "clinic_id": clinic_id, "default_price": default_price }),
            )
            .await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn available_clinics(&self, employer_id: i64) -> ApiResult {
        self.client
            .get_with_query("/organizations/partnerships/available_clinics/", &[("employer_id", employer_id)])
            .await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn partner_employers(&self) -> ApiResult {
        self.client.get("/organizations/partnerships/partner_employers/").await
    }

    /// # Errors
    ///
    /// `Status` carrying the backend's validation message when the payload is
    /// rejected, otherwise any request error.
    pub async fn confirm(&self, id: i64, terms: &PartnershipTerms) -> ApiResult {
        self.client
            .post(
                &format!("/organizations/partnerships/{id}/confirm/"),
                &json!({
                    "pricing": terms.pricing,
                    "default_price": terms.default_price,
                    "notes": terms.notes,
                    "expires_at": terms.expires_at,
                }),
            )
            .await
    }

    /// # Errors
    ///
    /// Any request error, including `Status` for a missing or forbidden record.
    pub async fn reject(&self, id: i64) -> ApiResult {
        self.client.post_empty(&format!("/organizations/partnerships/{id}/reject/")).await
    }
}
