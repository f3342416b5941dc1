use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, Response, StatusCode},
    Router,
};
use matreq_api::{
    auth::{AuthConfig, AuthService, Roles},
    config::AppConfig,
    db,
    events::{self, EventSender},
    handlers::AppServices,
    services::users::CreateUserRequest,
    AppState,
};
use sea_orm::EntityTrait;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Helper harness for spinning up an application state backed by an
/// in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub auth_service: Arc<AuthService>,
    _event_task: tokio::task::JoinHandle<()>,
}

/// A seeded user plus a minted access token.
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        // A single connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_cfg = AuthConfig::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
            Duration::from_secs(cfg.refresh_token_expiration as u64),
        );
        let auth_service = Arc::new(AuthService::new(auth_cfg, db_arc.clone()));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", matreq_api::api_v1_routes())
            .nest(
                "/auth",
                matreq_api::auth::auth_routes().with_state(auth_service.clone()),
            )
            .layer({
                let auth = auth_service.clone();
                axum::middleware::from_fn(move |mut req: Request<Body>, next: axum::middleware::Next| {
                    let auth = auth.clone();
                    async move {
                        req.extensions_mut().insert(auth);
                        next.run(req).await
                    }
                })
            })
            .layer(axum::middleware::from_fn(
                matreq_api::middleware_helpers::request_id::request_id_middleware,
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            auth_service,
            _event_task: event_task,
        }
    }

    /// Seed a user with the given role and mint an access token for them.
    pub async fn seed_user(&self, role: &str) -> TestUser {
        let suffix = Uuid::new_v4().simple().to_string();
        let email = format!("{role}-{}@example.com", &suffix[..8]);
        let created = self
            .state
            .services
            .users
            .create_user(CreateUserRequest {
                name: format!("{role} user"),
                email: email.clone(),
                password: "correct horse battery staple".to_string(),
                role: role.to_string(),
                business_unit_id: None,
                department_id: None,
            })
            .await
            .expect("seed user");

        let model = matreq_api::entities::user::Entity::find_by_id(created.id)
            .one(&*self.state.db)
            .await
            .expect("load seeded user")
            .expect("seeded user exists");
        let tokens = self
            .auth_service
            .generate_token(&model)
            .await
            .expect("mint token");

        TestUser {
            id: created.id,
            token: tokens.access_token,
        }
    }

    pub async fn seed_admin(&self) -> TestUser {
        self.seed_user(Roles::ADMIN).await
    }

    /// Fire a request with an optional bearer token and JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }
}

/// Decode a response body as JSON.
pub async fn response_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Assert a status and decode the body in one step.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> Value {
    assert_eq!(response.status(), status, "unexpected response status");
    response_json(response).await
}
