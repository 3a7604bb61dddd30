pub mod auth;
pub mod client;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod models;
pub mod resources;
pub mod validation;

use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use auth::session::SessionStore;

/// Estado global de la aplicación, compartido por todos los handlers.
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub sessions: Mutex<SessionStore>,
}

/// Construye el router completo de la API v1 sobre el estado dado.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handlers::sistema::salud))
        // Auth
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        .route("/api/v1/auth/user", get(handlers::auth::perfil))
        // Categorías
        .route(
            "/api/v1/categorias",
            get(handlers::categorias::listar).post(handlers::categorias::crear),
        )
        .route(
            "/api/v1/categorias/:id",
            get(handlers::categorias::mostrar)
                .put(handlers::categorias::actualizar)
                .delete(handlers::categorias::eliminar),
        )
        // Productos
        .route(
            "/api/v1/productos",
            get(handlers::productos::listar).post(handlers::productos::crear),
        )
        .route(
            "/api/v1/productos/stock-bajo",
            get(handlers::productos::stock_bajo),
        )
        .route(
            "/api/v1/productos/:id",
            get(handlers::productos::mostrar)
                .put(handlers::productos::actualizar)
                .delete(handlers::productos::eliminar),
        )
        // Clientes
        .route(
            "/api/v1/clientes",
            get(handlers::clientes::listar).post(handlers::clientes::crear),
        )
        .route(
            "/api/v1/clientes/:id",
            get(handlers::clientes::mostrar)
                .put(handlers::clientes::actualizar)
                .delete(handlers::clientes::eliminar),
        )
        .route(
            "/api/v1/clientes/:id/restaurar",
            post(handlers::clientes::restaurar),
        )
        // Proveedores
        .route(
            "/api/v1/proveedores",
            get(handlers::proveedores::listar).post(handlers::proveedores::crear),
        )
        .route(
            "/api/v1/proveedores/:id",
            get(handlers::proveedores::mostrar)
                .put(handlers::proveedores::actualizar)
                .delete(handlers::proveedores::eliminar),
        )
        .route(
            "/api/v1/proveedores/:id/restaurar",
            post(handlers::proveedores::restaurar),
        )
        // Ventas
        .route(
            "/api/v1/ventas",
            get(handlers::ventas::listar).post(handlers::ventas::crear),
        )
        .route(
            "/api/v1/ventas/:id",
            get(handlers::ventas::mostrar).put(handlers::ventas::actualizar),
        )
        .route("/api/v1/ventas/:id/anular", post(handlers::ventas::anular))
        // Compras
        .route(
            "/api/v1/compras",
            get(handlers::compras::listar).post(handlers::compras::crear),
        )
        .route(
            "/api/v1/compras/:id",
            get(handlers::compras::mostrar).put(handlers::compras::actualizar),
        )
        .route("/api/v1/compras/:id/anular", post(handlers::compras::anular))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Arranque completo: configuración → logger → base de datos → servidor HTTP.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::init_config();

    let data_dir = config.data_dir();
    if let Err(e) = logger::init_global_logger(&data_dir) {
        eprintln!("Advertencia: no se pudo inicializar el logger: {}", e);
    }

    log_info!("APP", "Iniciando aplicación", serde_json::json!({
        "version": config.version,
        "environment": config.environment.as_str(),
    }));

    let pool = database::connection::init_db(&data_dir).await?;

    log_info!("DATABASE", "Pool de conexiones inicializado", serde_json::json!({
        "pool_size": pool.size(),
    }));

    let ttl = chrono::Duration::minutes(config.security.session_timeout_mins as i64);
    let state = Arc::new(AppState {
        db: pool,
        sessions: Mutex::new(SessionStore::new(ttl)),
    });

    let app = build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log_info!("HTTP", "Servidor escuchando", serde_json::json!({ "addr": addr }));

    axum::serve(listener, app).await?;
    Ok(())
}
