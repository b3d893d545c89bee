use axum::{
    http::{header, Method, Request},
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{handlers, middleware as mw, openapi::ApiDoc, AppState};

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    // Vacation plan routes
    let plan_routes = Router::new()
        .route(
            "/",
            get(handlers::vacation_plans_handler::get_vacation_plans)
                .post(handlers::vacation_plans_handler::create_vacation_plan),
        )
        .route(
            "/{id}",
            get(handlers::vacation_plans_handler::get_vacation_plan)
                .delete(handlers::vacation_plans_handler::delete_vacation_plan),
        )
        .route("/{id}/approvers", put(handlers::vacation_plans_handler::edit_approvers))
        .route("/{id}/approve", post(handlers::vacation_plans_handler::approve))
        .route("/{id}/cancel-approve", post(handlers::vacation_plans_handler::cancel_approve))
        .route("/{id}/reject", post(handlers::vacation_plans_handler::reject))
        .route("/{id}/cancel-reject", post(handlers::vacation_plans_handler::cancel_reject));

    // Leave entry routes
    let vacation_routes = Router::new()
        .route("/", get(handlers::vacations_handler::get_vacations))
        .route(
            "/{id}",
            get(handlers::vacations_handler::get_vacation)
                .put(handlers::vacations_handler::update_vacation)
                .delete(handlers::vacations_handler::delete_vacation),
        )
        .route("/{id}/reject", post(handlers::vacations_handler::reject_vacation))
        .route(
            "/{id}/cancel-reject",
            post(handlers::vacations_handler::cancel_reject_vacation),
        );

    let debug_routes = Router::new()
        .route("/debug", get(handlers::debug_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), mw::require_debug_key));

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<axum::body::Body>| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .merge(debug_routes)
        .nest("/api/vacation-plans", plan_routes)
        .nest("/api/vacations", vacation_routes)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .layer(middleware::from_fn(mw::metrics_middleware))
        .layer(middleware::from_fn(mw::request_id_middleware))
        .layer(trace)
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Response, StatusCode},
    };
    use serde_json::{json, Value};
    use sqlx::PgPool;
    use tower::ServiceExt;

    use crate::{
        auth::jwt::issue_jwt,
        db::memory::MemoryPlanRepository,
        handlers::MetricsState,
        middleware::REQUEST_ID_HEADER,
        workflow::WorkflowService,
        AppConfig,
    };

    const SECRET: &str = "router-test-secret-0123";
    const OWNER: i32 = 1;
    const A: i32 = 10;
    const B: i32 = 20;

    fn test_app() -> Router {
        let config = AppConfig {
            database_url: "postgres://localhost/unused".to_string(),
            jwt_secret: SECRET.to_string(),
            debug_key: "debug-key".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            cors_origin: "http://localhost:3000".parse().unwrap(),
            run_migrations: false,
        };
        let db = PgPool::connect_lazy(&config.database_url).unwrap();
        let state = Arc::new(AppState {
            db,
            workflow: WorkflowService::new(Arc::new(MemoryPlanRepository::new())),
            config,
            metrics: Arc::new(MetricsState::detached()),
        });
        build_router(state)
    }

    fn request(method: Method, uri: &str, member_id: Option<i32>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(member_id) = member_id {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", issue_jwt(member_id, SECRET, 300)));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_plan(app: &Router) -> Value {
        let body = json!({
            "approvers": [A, B],
            "vacations": [
                { "start_date": "2024-07-01", "end_date": "2024-07-05" },
                { "start_date": "2024-08-12", "end_date": "2024-08-12", "half_first": true }
            ]
        });
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/vacation-plans", Some(OWNER), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    #[tokio::test]
    async fn test_health_echoes_request_id() {
        let response = test_app()
            .oneshot(request(Method::GET, "/health", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = test_app()
            .oneshot(request(Method::GET, "/api/vacation-plans/1", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_signed_with_other_key_is_unauthorized() {
        let token = issue_jwt(OWNER, "a-different-secret-entirely", 300);
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/vacation-plans/1")
                    .header(header::COOKIE, format!("__session={}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_approval_flow_over_http() {
        let app = test_app();
        let plan = create_plan(&app).await;
        let id = plan["id"].as_i64().unwrap();
        assert_eq!(plan["approve_stage"], 0);
        assert_eq!(plan["vacations"].as_array().unwrap().len(), 2);

        // B cannot act before A
        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/vacation-plans/{id}/approve"),
                Some(B),
                Some(json!({ "stage": 1 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["code"], "NOT_AUTHORIZED_APPROVER");

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/vacation-plans/{id}/approve"),
                Some(A),
                Some(json!({ "stage": 1, "version": plan["version"] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let approved = json_body(response).await;
        assert_eq!(approved["approve_stage"], 1);
        assert_eq!(approved["completed"], false);

        // Replaying the old version is a conflict
        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/vacation-plans/{id}/approve"),
                Some(B),
                Some(json!({ "stage": 2, "version": plan["version"] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/vacation-plans/{id}/approve"),
                Some(B),
                Some(json!({ "stage": 2 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let completed = json_body(response).await;
        assert_eq!(completed["completed"], true);
        assert_eq!(completed["vacations"][1]["approve_stage"], 2);
    }

    #[tokio::test]
    async fn test_stage_out_of_order_is_bad_request() {
        let app = test_app();
        let id = create_plan(&app).await["id"].as_i64().unwrap();

        let response = app
            .oneshot(request(
                Method::POST,
                &format!("/api/vacation-plans/{id}/approve"),
                Some(A),
                Some(json!({ "stage": 2 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "INVALID_STAGE_ORDER");
    }

    #[tokio::test]
    async fn test_empty_chain_is_unprocessable() {
        let body = json!({
            "approvers": [],
            "vacations": [{ "start_date": "2024-07-01", "end_date": "2024-07-05" }]
        });
        let response = test_app()
            .oneshot(request(Method::POST, "/api/vacation-plans", Some(OWNER), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_list_plans_for_approver() {
        let app = test_app();
        create_plan(&app).await;

        let response = app
            .clone()
            .oneshot(request(
                Method::GET,
                &format!("/api/vacation-plans?approver_id={A}&year=2024&month=8"),
                Some(A),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let plans = json_body(response).await;
        assert_eq!(plans.as_array().unwrap().len(), 1);
        assert_eq!(plans[0]["vacations"].as_array().unwrap().len(), 1);

        let response = app
            .oneshot(request(Method::GET, "/api/vacation-plans?year=2024", Some(A), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reject_single_vacation() {
        let app = test_app();
        let plan = create_plan(&app).await;
        let vacation_id = plan["vacations"][0]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(request(Method::POST, &format!("/api/vacations/{vacation_id}/reject"), Some(A), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["rejected"], true);

        let response = app
            .oneshot(request(Method::GET, &format!("/api/vacations/{vacation_id}"), Some(OWNER), None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["rejected"], true);
    }

    #[tokio::test]
    async fn test_debug_requires_key() {
        let response = test_app()
            .oneshot(request(Method::GET, "/debug", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_openapi_document_served() {
        let response = test_app()
            .oneshot(request(Method::GET, "/api-docs/openapi.json", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"]["/api/vacation-plans/{id}/approve"].is_object());
    }

    #[tokio::test]
    async fn test_scalar_viewer_served() {
        let response = test_app()
            .oneshot(request(Method::GET, "/scalar", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Vacation Approval API"));
    }

    #[tokio::test]
    async fn test_locked_plan_entry_edit_is_bad_request() {
        let app = test_app();
        let plan = create_plan(&app).await;
        let id = plan["id"].as_i64().unwrap();
        let vacation_id = plan["vacations"][0]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/vacation-plans/{id}/approve"),
                Some(A),
                Some(json!({ "stage": 1 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request(
                Method::PUT,
                &format!("/api/vacations/{vacation_id}"),
                Some(OWNER),
                Some(json!({ "start_date": "2024-07-01", "end_date": "2024-07-31" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "PLAN_LOCKED");
    }
}
