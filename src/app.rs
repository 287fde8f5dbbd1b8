use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{ContextFactory, SuVerifier};
use crate::config::AppConfig;
use crate::dispatch::GatewayState;
use crate::handlers::{protected, public};
use crate::managers::ManagerFactory;
use crate::shell::SystemShell;

/// Wire the system shell, the su verifier and the given managers into a
/// GatewayState according to `config`
pub fn system_state(config: &AppConfig, managers: Arc<dyn ManagerFactory>) -> GatewayState {
    let shell = SystemShell::new(&config.shell);
    let verifier = SuVerifier::new(shell.clone(), config.shell.getent_program.clone())
        .with_launcher(config.shell.verify_launcher.clone());
    let contexts = ContextFactory::new(Arc::new(verifier), Arc::new(shell))
        .with_audit(config.security.enable_audit_logging);

    GatewayState::new(contexts, managers).with_schemes(config.security.credential_schemes)
}

/// Full router with global middleware
pub fn app(state: GatewayState, config: &AppConfig) -> Router {
    let mut router = routes(state).layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

/// Routes only, no global layers
pub fn routes(state: GatewayState) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected
        .merge(user_routes())
        .merge(group_routes())
        .merge(crontab_routes())
        .merge(host_routes())
        .merge(storage_routes())
        .merge(hardware_routes())
        .with_state(state)
}

fn user_routes() -> Router<GatewayState> {
    use protected::user;

    Router::new()
        .route("/user/login", get(user::login))
        .route("/user", get(user::list).post(user::create))
        .route("/user/", get(user::list).post(user::create))
        .route(
            "/user/:user",
            get(user::get).put(user::update).delete(user::delete),
        )
}

fn group_routes() -> Router<GatewayState> {
    use axum::routing::delete;
    use protected::group;

    Router::new()
        .route("/group", get(group::list).post(group::create))
        .route("/group/", get(group::list).post(group::create))
        .route(
            "/group/:group",
            get(group::get).put(group::update).delete(group::delete),
        )
        // Membership
        .route("/group/:group/add/:user", post(group::add_member))
        .route("/group/:group/remove/:user", delete(group::remove_member))
}

fn crontab_routes() -> Router<GatewayState> {
    use protected::crontab;

    let jobs = get(crontab::list)
        .post(crontab::create)
        .put(crontab::update)
        .delete(crontab::delete);

    Router::new()
        .route("/crontab", jobs.clone())
        .route("/crontab/", jobs)
}

fn host_routes() -> Router<GatewayState> {
    Router::new().route("/host", get(protected::host::get))
}

fn storage_routes() -> Router<GatewayState> {
    use protected::storage;

    Router::new()
        .route("/storage/disk", get(storage::disks))
        .route("/storage/disk/", get(storage::disks))
}

fn hardware_routes() -> Router<GatewayState> {
    use protected::hardware::{cpu, gpu, ram};

    Router::new()
        .route("/hardware/cpu", get(cpu::get))
        .route("/hardware/cpu/use", get(cpu::usage))
        .route("/hardware/cpu/temperature", get(cpu::temperature))
        .route("/hardware/gpu", get(gpu::get))
        .route("/hardware/gpu/use", get(gpu::usage))
        .route("/hardware/gpu/temperature", get(gpu::temperature))
        .route("/hardware/ram", get(ram::get))
        .route("/hardware/ram/", get(ram::get))
        .route("/hardware/ram/use", get(ram::usage))
}

fn cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static(crate::auth::credentials::USERNAME_HEADER),
            HeaderName::from_static(crate::auth::credentials::PASSWORD_HEADER),
        ])
}
