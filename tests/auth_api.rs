//! Tests de autenticación: login, logout y perfil.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn usuario_puede_hacer_login_con_credenciales_validas() {
    let (app, state) = setup_app().await;
    crear_usuario(&state, "test@example.com", "password123", true).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({
            "email": "test@example.com",
            "password": "password123",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["message"].is_string());
    assert!(body["data"]["token"].is_string());
    assert!(body["data"]["user"]["id"].is_i64());
    assert_eq!(body["data"]["user"]["name"], "Usuario de Prueba");
    assert_eq!(body["data"]["user"]["email"], "test@example.com");
}

#[tokio::test]
async fn usuario_no_puede_hacer_login_con_credenciales_invalidas() {
    let (app, state) = setup_app().await;
    crear_usuario(&state, "test@example.com", "password123", true).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({
            "email": "test@example.com",
            "password": "wrongpassword",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null() || body.get("data").is_none());
}

#[tokio::test]
async fn usuario_inactivo_no_puede_hacer_login() {
    let (app, state) = setup_app().await;
    crear_usuario(&state, "inactive@example.com", "password123", false).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({
            "email": "inactive@example.com",
            "password": "password123",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Su cuenta está inactiva. Contacte al administrador."
    );
}

#[tokio::test]
async fn login_requiere_email_y_password() {
    let (app, _state) = setup_app().await;

    let (status, body) = peticion(&app, "POST", "/api/v1/auth/login", None, Some(json!({}))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["password"].is_array());
}

#[tokio::test]
async fn email_mal_formado_devuelve_422() {
    let (app, _state) = setup_app().await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({
            "email": "sin-arroba",
            "password": "password123",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"].get("password").is_none());
}

#[tokio::test]
async fn usuario_autenticado_puede_hacer_logout() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let (status, body) = peticion(&app, "POST", "/api/v1/auth/logout", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // El token revocado deja de ser válido.
    let (status, _) = peticion(&app, "GET", "/api/v1/auth/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn usuario_autenticado_puede_obtener_su_perfil() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let (status, body) = peticion(&app, "GET", "/api/v1/auth/user", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "test@example.com");
    assert_eq!(body["data"]["name"], "Usuario de Prueba");
}

#[tokio::test]
async fn usuario_no_autenticado_no_accede_a_rutas_protegidas() {
    let (app, _state) = setup_app().await;

    let (status, _) = peticion(&app, "GET", "/api/v1/auth/user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = peticion(&app, "GET", "/api/v1/auth/user", Some("token-falso"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_no_requiere_autenticacion() {
    let (app, _state) = setup_app().await;

    let (status, body) = peticion(&app, "GET", "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "ok");
}

#[tokio::test]
async fn login_actualiza_ultimo_acceso() {
    let (app, state) = setup_app().await;
    let user_id = crear_usuario(&state, "test@example.com", "password123", true).await;

    peticion(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({
            "email": "test@example.com",
            "password": "password123",
        })),
    )
    .await;

    let (last_login,): (Option<String>,) =
        sqlx::query_as("SELECT last_login_at FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&state.db)
            .await
            .unwrap();

    assert!(last_login.is_some());
}
