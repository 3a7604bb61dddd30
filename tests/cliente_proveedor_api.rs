//! Tests de clientes y proveedores: personas embebidas, nombre para
//! mostrar, borrado lógico y restauración.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn crear_cliente_persona_natural() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/clientes",
        Some(&token),
        Some(json!({
            "nombres": "María",
            "apellidos": "Quispe",
            "telefono": "987654321",
            "email": "maria@example.com",
            "tipo_documento": "DNI",
            "numero_documento": "45678912",
            "dias_credito": 15,
            "credito_disponible": 300.0,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "cuerpo: {}", body);
    assert_eq!(body["data"]["codigo"], "CLIE000001");
    assert_eq!(body["data"]["nombre"], "María Quispe");
    assert_eq!(body["data"]["telefono"], "987654321");
    assert_eq!(body["data"]["dias_credito"], 15);
}

#[tokio::test]
async fn cliente_empresa_usa_razon_social() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/clientes",
        Some(&token),
        Some(json!({
            "razon_social": "Comercial Andina SAC",
            "tipo_documento": "RUC",
            "numero_documento": "20123456789",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "cuerpo: {}", body);
    // Sin nombres personales, el nombre cae a la razón social.
    assert_eq!(body["data"]["nombre"], "Comercial Andina SAC");
}

#[tokio::test]
async fn cliente_requiere_nombres_o_razon_social() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/clientes",
        Some(&token),
        Some(json!({
            "tipo_documento": "DNI",
            "numero_documento": "11111111",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["nombres"].is_array());
}

#[tokio::test]
async fn documento_duplicado_devuelve_conflicto() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let payload = json!({
        "nombres": "Ana",
        "tipo_documento": "DNI",
        "numero_documento": "22222222",
    });

    let (status, _) = peticion(&app, "POST", "/api/v1/clientes", Some(&token), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = peticion(&app, "POST", "/api/v1/clientes", Some(&token), Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn borrado_logico_y_restauracion_de_cliente() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let (_, body) = peticion(
        &app,
        "POST",
        "/api/v1/clientes",
        Some(&token),
        Some(json!({
            "nombres": "Efímero",
            "tipo_documento": "DNI",
            "numero_documento": "33333333",
        })),
    )
    .await;
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = peticion(
        &app,
        "DELETE",
        &format!("/api/v1/clientes/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Excluido de listados y del detalle por defecto.
    let (_, body) = peticion(&app, "GET", "/api/v1/clientes", Some(&token), None).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 0);

    let (status, _) = peticion(
        &app,
        "GET",
        &format!("/api/v1/clientes/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Visible en el conjunto recuperable.
    let (_, body) = peticion(
        &app,
        "GET",
        "/api/v1/clientes?eliminados=true",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 1);

    // Restaurar lo devuelve a los listados.
    let (status, _) = peticion(
        &app,
        "POST",
        &format!("/api/v1/clientes/{}/restaurar", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = peticion(&app, "GET", "/api/v1/clientes", Some(&token), None).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 1);

    // Restaurar dos veces no tiene efecto.
    let (status, _) = peticion(
        &app,
        "POST",
        &format!("/api/v1/clientes/{}/restaurar", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn crear_proveedor_con_credito() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/proveedores",
        Some(&token),
        Some(json!({
            "razon_social": "Distribuidora Norte EIRL",
            "tipo_documento": "RUC",
            "numero_documento": "20987654321",
            "tipo_proveedor": "PRODUCTO",
            "rubro": "Abarrotes",
            "limite_credito": 10000.0,
            "dias_credito": 45,
            "calificacion": 4,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "cuerpo: {}", body);
    assert_eq!(body["data"]["codigo"], "PROV000001");
    assert_eq!(body["data"]["nombre"], "Distribuidora Norte EIRL");
    // Sin compras a crédito aún: disponible = límite.
    assert_eq!(body["data"]["credito_disponible"], 10000.0);
}

#[tokio::test]
async fn calificacion_fuera_de_rango_devuelve_422() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/proveedores",
        Some(&token),
        Some(json!({
            "razon_social": "Proveedor X",
            "tipo_documento": "RUC",
            "numero_documento": "20111111111",
            "tipo_proveedor": "PRODUCTO",
            "calificacion": 6,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["calificacion"].is_array());
}

#[tokio::test]
async fn borrado_logico_de_proveedor() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let (_, body) = peticion(
        &app,
        "POST",
        "/api/v1/proveedores",
        Some(&token),
        Some(json!({
            "razon_social": "Proveedor Saliente",
            "tipo_documento": "RUC",
            "numero_documento": "20222222222",
            "tipo_proveedor": "SERVICIO",
        })),
    )
    .await;
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = peticion(
        &app,
        "DELETE",
        &format!("/api/v1/proveedores/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = peticion(&app, "GET", "/api/v1/proveedores", Some(&token), None).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 0);

    let (status, _) = peticion(
        &app,
        "POST",
        &format!("/api/v1/proveedores/{}/restaurar", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
