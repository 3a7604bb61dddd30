//! Tests del flujo de ventas: registro con detalles, stock, crédito
//! y anulación.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

async fn crear_cliente_api(app: &axum::Router, token: &str) -> i64 {
    let (status, body) = peticion(
        app,
        "POST",
        "/api/v1/clientes",
        Some(token),
        Some(json!({
            "nombres": "María",
            "apellidos": "Quispe",
            "tipo_documento": "DNI",
            "numero_documento": "45678912",
            "dias_credito": 30,
            "credito_disponible": 500.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "cuerpo: {}", body);
    body["data"]["id"].as_i64().unwrap()
}

async fn crear_producto_api(app: &axum::Router, token: &str, stock: i64) -> i64 {
    let (status, body) = peticion(
        app,
        "POST",
        "/api/v1/productos",
        Some(token),
        Some(json!({
            "nombre": "Arroz extra 5kg",
            "precio_compra": 20.0,
            "precio_venta": 50.0,
            "stock": stock,
            "stock_minimo": 2,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "cuerpo: {}", body);
    body["data"]["id"].as_i64().unwrap()
}

async fn stock_actual(state: &sistema_ventas::AppState, producto_id: i64) -> i64 {
    let (stock,): (i64,) = sqlx::query_as("SELECT stock FROM productos WHERE id = ?")
        .bind(producto_id)
        .fetch_one(&state.db)
        .await
        .unwrap();
    stock
}

#[tokio::test]
async fn registrar_venta_calcula_importes_y_descuenta_stock() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let cliente_id = crear_cliente_api(&app, &token).await;
    let producto_id = crear_producto_api(&app, &token, 10).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/ventas",
        Some(&token),
        Some(json!({
            "cliente_id": cliente_id,
            "tipo_venta": "CONTADO",
            "tipo_comprobante": "BOLETA",
            "fecha_venta": "2026-08-01",
            "porcentaje_impuesto": 18.0,
            "detalles": [
                { "producto_id": producto_id, "cantidad": 2, "precio_unitario": 50.0 }
            ],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "cuerpo: {}", body);
    assert_eq!(body["data"]["codigo"], "VENT000001");
    assert_eq!(body["data"]["subtotal"], 100.0);
    assert_eq!(body["data"]["impuesto"], 18.0);
    assert_eq!(body["data"]["total"], 118.0);
    assert_eq!(body["data"]["estado"], "PENDIENTE");
    assert_eq!(body["data"]["can_edit"], true);

    // Cliente y detalles vienen cargados en la respuesta.
    assert_eq!(body["data"]["cliente"]["nombre"], "María Quispe");
    let detalles = body["data"]["detalles"].as_array().unwrap();
    assert_eq!(detalles.len(), 1);
    assert_eq!(detalles[0]["producto_nombre"], "Arroz extra 5kg");
    assert_eq!(detalles[0]["total"], 100.0);

    assert_eq!(stock_actual(&state, producto_id).await, 8);
}

#[tokio::test]
async fn descuento_de_linea_y_de_cabecera() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let cliente_id = crear_cliente_api(&app, &token).await;
    let producto_id = crear_producto_api(&app, &token, 10).await;

    let (_, body) = peticion(
        &app,
        "POST",
        "/api/v1/ventas",
        Some(&token),
        Some(json!({
            "cliente_id": cliente_id,
            "tipo_venta": "CONTADO",
            "tipo_comprobante": "FACTURA",
            "fecha_venta": "2026-08-01",
            "porcentaje_impuesto": 18.0,
            "porcentaje_descuento": 10.0,
            "detalles": [
                { "producto_id": producto_id, "cantidad": 2, "precio_unitario": 50.0 },
                { "producto_id": producto_id, "cantidad": 1, "precio_unitario": 100.0,
                  "porcentaje_descuento": 10.0 }
            ],
        })),
    )
    .await;

    // líneas: 100 y 90 → subtotal 190; descuento 19; base 171;
    // impuesto 30.78; total 201.78
    assert_eq!(body["data"]["subtotal"], 190.0);
    assert_eq!(body["data"]["descuento"], 19.0);
    assert_eq!(body["data"]["impuesto"], 30.78);
    assert_eq!(body["data"]["total"], 201.78);
}

#[tokio::test]
async fn venta_sin_detalles_devuelve_422() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let cliente_id = crear_cliente_api(&app, &token).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/ventas",
        Some(&token),
        Some(json!({
            "cliente_id": cliente_id,
            "tipo_venta": "CONTADO",
            "tipo_comprobante": "BOLETA",
            "fecha_venta": "2026-08-01",
            "detalles": [],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["detalles"].is_array());
}

#[tokio::test]
async fn stock_insuficiente_devuelve_422_y_no_persiste() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let cliente_id = crear_cliente_api(&app, &token).await;
    let producto_id = crear_producto_api(&app, &token, 1).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/ventas",
        Some(&token),
        Some(json!({
            "cliente_id": cliente_id,
            "tipo_venta": "CONTADO",
            "tipo_comprobante": "BOLETA",
            "fecha_venta": "2026-08-01",
            "detalles": [
                { "producto_id": producto_id, "cantidad": 5, "precio_unitario": 50.0 }
            ],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["detalles"].is_array());

    // La transacción se revierte completa: ni venta ni stock tocado.
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ventas")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(stock_actual(&state, producto_id).await, 1);
}

#[tokio::test]
async fn venta_a_credito_consume_credito_y_fija_vencimiento() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let cliente_id = crear_cliente_api(&app, &token).await;
    let producto_id = crear_producto_api(&app, &token, 10).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/ventas",
        Some(&token),
        Some(json!({
            "cliente_id": cliente_id,
            "tipo_venta": "CREDITO",
            "tipo_comprobante": "FACTURA",
            "fecha_venta": "2026-08-01",
            "detalles": [
                { "producto_id": producto_id, "cantidad": 2, "precio_unitario": 50.0 }
            ],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "cuerpo: {}", body);
    // 30 días de crédito del cliente a partir de la fecha de venta.
    assert_eq!(body["data"]["fecha_vencimiento"], "2026-08-31");

    let (credito,): (f64,) =
        sqlx::query_as("SELECT credito_disponible FROM clientes WHERE id = ?")
            .bind(cliente_id)
            .fetch_one(&state.db)
            .await
            .unwrap();
    assert_eq!(credito, 400.0);
}

#[tokio::test]
async fn venta_a_credito_sin_credito_suficiente_devuelve_422() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let cliente_id = crear_cliente_api(&app, &token).await;
    let producto_id = crear_producto_api(&app, &token, 100).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/ventas",
        Some(&token),
        Some(json!({
            "cliente_id": cliente_id,
            "tipo_venta": "CREDITO",
            "tipo_comprobante": "FACTURA",
            "fecha_venta": "2026-08-01",
            "detalles": [
                { "producto_id": producto_id, "cantidad": 20, "precio_unitario": 50.0 }
            ],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["cliente_id"].is_array());
}

#[tokio::test]
async fn anular_venta_repone_stock_y_credito() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let cliente_id = crear_cliente_api(&app, &token).await;
    let producto_id = crear_producto_api(&app, &token, 10).await;

    let (_, body) = peticion(
        &app,
        "POST",
        "/api/v1/ventas",
        Some(&token),
        Some(json!({
            "cliente_id": cliente_id,
            "tipo_venta": "CREDITO",
            "tipo_comprobante": "FACTURA",
            "fecha_venta": "2026-08-01",
            "detalles": [
                { "producto_id": producto_id, "cantidad": 3, "precio_unitario": 50.0 }
            ],
        })),
    )
    .await;
    let venta_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(stock_actual(&state, producto_id).await, 7);

    let (status, body) = peticion(
        &app,
        "POST",
        &format!("/api/v1/ventas/{}/anular", venta_id),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["estado"], "ANULADA");
    assert_eq!(body["data"]["can_edit"], false);
    assert_eq!(stock_actual(&state, producto_id).await, 10);

    let (credito,): (f64,) =
        sqlx::query_as("SELECT credito_disponible FROM clientes WHERE id = ?")
            .bind(cliente_id)
            .fetch_one(&state.db)
            .await
            .unwrap();
    assert_eq!(credito, 500.0);

    // Una venta anulada no puede anularse otra vez.
    let (status, _) = peticion(
        &app,
        "POST",
        &format!("/api/v1/ventas/{}/anular", venta_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn actualizar_cabecera_mientras_es_editable() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let cliente_id = crear_cliente_api(&app, &token).await;
    let producto_id = crear_producto_api(&app, &token, 10).await;

    let (_, body) = peticion(
        &app,
        "POST",
        "/api/v1/ventas",
        Some(&token),
        Some(json!({
            "cliente_id": cliente_id,
            "tipo_venta": "CONTADO",
            "tipo_comprobante": "BOLETA",
            "fecha_venta": "2026-08-01",
            "detalles": [
                { "producto_id": producto_id, "cantidad": 1, "precio_unitario": 50.0 }
            ],
        })),
    )
    .await;
    let venta_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = peticion(
        &app,
        "PUT",
        &format!("/api/v1/ventas/{}", venta_id),
        Some(&token),
        Some(json!({ "observaciones": "Entrega a domicilio" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["observaciones"], "Entrega a domicilio");

    // Una venta anulada deja de ser editable.
    peticion(
        &app,
        "POST",
        &format!("/api/v1/ventas/{}/anular", venta_id),
        Some(&token),
        None,
    )
    .await;

    let (status, _) = peticion(
        &app,
        "PUT",
        &format!("/api/v1/ventas/{}", venta_id),
        Some(&token),
        Some(json!({ "observaciones": "tarde" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn listado_paginado_con_cliente_cargado() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let cliente_id = crear_cliente_api(&app, &token).await;
    let producto_id = crear_producto_api(&app, &token, 50).await;

    for _ in 0..3 {
        peticion(
            &app,
            "POST",
            "/api/v1/ventas",
            Some(&token),
            Some(json!({
                "cliente_id": cliente_id,
                "tipo_venta": "CONTADO",
                "tipo_comprobante": "BOLETA",
                "fecha_venta": "2026-08-01",
                "detalles": [
                    { "producto_id": producto_id, "cantidad": 1, "precio_unitario": 50.0 }
                ],
            })),
        )
        .await;
    }

    let (status, body) = peticion(&app, "GET", "/api/v1/ventas", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["page"], 1);
    let filas = body["data"]["data"].as_array().unwrap();
    assert_eq!(filas.len(), 3);
    assert_eq!(filas[0]["cliente"]["nombre"], "María Quispe");
    // El listado no carga los detalles.
    assert!(filas[0].get("detalles").is_none());
}

#[tokio::test]
async fn venta_para_cliente_inexistente_devuelve_422() {
    let (app, state) = setup_app().await;
    let (_user_id, token) = usuario_autenticado(&state).await;

    let producto_id = crear_producto_api(&app, &token, 10).await;

    let (status, body) = peticion(
        &app,
        "POST",
        "/api/v1/ventas",
        Some(&token),
        Some(json!({
            "cliente_id": 999,
            "tipo_venta": "CONTADO",
            "tipo_comprobante": "BOLETA",
            "fecha_venta": "2026-08-01",
            "detalles": [
                { "producto_id": producto_id, "cantidad": 1, "precio_unitario": 50.0 }
            ],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["cliente_id"].is_array());
}
