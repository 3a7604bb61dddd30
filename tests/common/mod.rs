//! Utilidades compartidas por las suites de integración: base de datos
//! en memoria, router montado y helpers de autenticación.

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;

use sistema_ventas::auth::session::SessionStore;
use sistema_ventas::database::migrations::run_migrations;
use sistema_ventas::{build_router, AppState};

/// Crea una base SQLite en memoria con el esquema completo y devuelve el
/// router y el estado compartido.
pub async fn setup_app() -> (Router, Arc<AppState>) {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("no se pudo abrir la base en memoria");

    run_migrations(&pool).await.expect("migraciones fallidas");

    let state = Arc::new(AppState {
        db: pool,
        sessions: Mutex::new(SessionStore::new(chrono::Duration::hours(8))),
    });

    (build_router(state.clone()), state)
}

/// Inserta un usuario con password bcrypt (costo bajo para tests).
pub async fn crear_usuario(state: &AppState, email: &str, password: &str, estado: bool) -> i64 {
    let hash = bcrypt::hash(password, 4).unwrap();

    let res = sqlx::query("INSERT INTO users (name, email, password_hash, estado) VALUES (?, ?, ?, ?)")
        .bind("Usuario de Prueba")
        .bind(email)
        .bind(&hash)
        .bind(estado)
        .execute(&state.db)
        .await
        .unwrap();

    res.last_insert_rowid()
}

/// Usuario activo listo para autenticar; devuelve (user_id, token).
pub async fn usuario_autenticado(state: &AppState) -> (i64, String) {
    let user_id = crear_usuario(state, "test@example.com", "password123", true).await;
    let token = emitir_token(state, user_id, "test@example.com");
    (user_id, token)
}

/// Emite un token de sesión directamente sobre el almacén.
pub fn emitir_token(state: &AppState, user_id: i64, email: &str) -> String {
    state
        .sessions
        .lock()
        .unwrap()
        .create(user_id, "Usuario de Prueba".into(), email.into())
}

/// Inserta una categoría directamente (equivalente al factory de tests).
pub async fn crear_categoria(state: &AppState, nombre: &str) -> i64 {
    let res = sqlx::query("INSERT INTO categorias (nombre, descripcion, estado) VALUES (?, ?, 1)")
        .bind(nombre)
        .bind("Categoría de prueba")
        .execute(&state.db)
        .await
        .unwrap();

    res.last_insert_rowid()
}

/// Ejecuta una petición JSON contra el router y devuelve (status, body).
pub async fn peticion(
    app: &Router,
    metodo: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(metodo).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}
