pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::booking::handlers as booking_handlers;
use crate::resume::MAX_FILE_SIZE;
use crate::session::handlers as session_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route(
            "/api/upload-application",
            post(booking_handlers::handle_upload_application),
        )
        .route(
            "/api/schedule-interview",
            post(booking_handlers::handle_schedule_interview),
        )
        .route(
            "/api/booking/:token",
            get(booking_handlers::handle_get_booking),
        )
        .route(
            "/api/connection-details",
            post(session_handlers::handle_connection_details),
        )
        // Room for multipart framing on top of the file-size cap.
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 1024 * 1024))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::base_config;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    /// State wired to unreachable backends; only handler paths that fail
    /// before any network call are exercised here.
    fn test_state() -> AppState {
        let config = base_config();
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("lazy pool");
        let credentials =
            aws_sdk_s3::config::Credentials::new("test", "test", None, None, "static");
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.s3_endpoint)
            .build();
        AppState {
            db,
            s3: aws_sdk_s3::Client::from_conf(s3_config),
            email: None,
            config,
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn test_root_reports_service_ok() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "interview-scheduling-api");
    }

    #[tokio::test]
    async fn test_connection_details_requires_livekit_config() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/connection-details")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "CONFIG_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("LIVEKIT_URL"));
    }

    #[tokio::test]
    async fn test_schedule_interview_rejects_missing_fields() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/schedule-interview")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Missing required fields"));
    }

    #[tokio::test]
    async fn test_schedule_interview_rejects_unparsable_datetime() {
        let app = build_router(test_state());
        let payload = serde_json::json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "phone": "+911234567890",
            "datetime": "next tuesday"
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/schedule-interview")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Invalid datetime format"));
    }

    fn multipart_request(field_name: &str, filename: &str) -> Request<Body> {
        let boundary = "test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{field_name}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             payload-bytes\r\n\
             --{boundary}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/upload-application")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_application_rejects_unsupported_extension() {
        let app = build_router(test_state());
        let response = app
            .oneshot(multipart_request("file", "resume.exe"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]["message"].as_str().unwrap().contains(".exe"));
    }

    #[tokio::test]
    async fn test_upload_application_requires_file_field() {
        let app = build_router(test_state());
        let response = app
            .oneshot(multipart_request("attachment", "resume.pdf"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Missing required field: file"));
    }
}
