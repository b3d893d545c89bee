use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::Modify;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vacation Approval API",
        version = "1.0.0",
        description = "Vacation plan submission and multi-stage approval"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // Health
        crate::handlers::health::health_check,

        // Vacation plans
        crate::handlers::vacation_plans_handler::get_vacation_plans,
        crate::handlers::vacation_plans_handler::get_vacation_plan,
        crate::handlers::vacation_plans_handler::create_vacation_plan,
        crate::handlers::vacation_plans_handler::delete_vacation_plan,
        crate::handlers::vacation_plans_handler::edit_approvers,
        crate::handlers::vacation_plans_handler::approve,
        crate::handlers::vacation_plans_handler::cancel_approve,
        crate::handlers::vacation_plans_handler::reject,
        crate::handlers::vacation_plans_handler::cancel_reject,

        // Vacations
        crate::handlers::vacations_handler::get_vacations,
        crate::handlers::vacations_handler::get_vacation,
        crate::handlers::vacations_handler::update_vacation,
        crate::handlers::vacations_handler::delete_vacation,
        crate::handlers::vacations_handler::reject_vacation,
        crate::handlers::vacations_handler::cancel_reject_vacation,
    ),
    components(
        schemas(
            crate::models::VacationPlan,
            crate::models::ApproverOrder,
            crate::models::ApplyVacation,

            crate::models::CreateVacationPlanInput,
            crate::models::VacationInput,
            crate::models::EditApproversInput,
            crate::models::StageDecisionInput,
            crate::models::VacationPlanMutationResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check"),
        (name = "vacation-plans", description = "Vacation plans and their approval chain"),
        (name = "vacations", description = "Individual leave entries"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("__session"))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_workflow_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/vacation-plans",
            "/api/vacation-plans/{id}/approve",
            "/api/vacation-plans/{id}/cancel-reject",
            "/api/vacations/{id}/reject",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("VacationPlan"));
    }
}
