use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use super::personas::{actualizar_persona, insertar_persona, validar_persona, PersonaDatos};
use crate::auth::guard;
use crate::errors::{ApiError, ValidationErrors};
use crate::models::cliente::{Cliente, ClienteConPersona, ClienteFiltro, ClientePayload};
use crate::resources::{ApiResponse, ClienteResource, ResourceCollection};
use crate::validation;
use crate::{log_info, AppState};

pub(crate) const SELECT_CON_PERSONA: &str = "
    SELECT c.id, c.persona_id, c.codigo, c.dias_credito, c.credito_disponible,
           c.estado, c.deleted_at,
           p.nombres, p.apellidos, p.razon_social, p.telefono, p.email
    FROM clientes c
    INNER JOIN personas p ON c.persona_id = p.id
";

struct ClienteValidado {
    persona: PersonaDatos,
    dias_credito: i64,
    credito_disponible: f64,
    estado: bool,
}

fn validar_payload(payload: &ClientePayload) -> Result<ClienteValidado, ApiError> {
    let mut errores = ValidationErrors::new();

    let persona = validar_persona(
        &mut errores,
        &payload.nombres,
        &payload.apellidos,
        &payload.razon_social,
        &payload.telefono,
        &payload.email,
        &payload.tipo_documento,
        &payload.numero_documento,
    );

    let dias_credito = payload.dias_credito.unwrap_or(0);
    if dias_credito < 0 {
        errores.agregar("dias_credito", "Los días de crédito no pueden ser negativos");
    }

    let credito_disponible = payload.credito_disponible.unwrap_or(0.0);
    if let Err(msg) = validation::validar_monto(credito_disponible) {
        errores.agregar("credito_disponible", msg);
    }

    errores.into_result()?;

    Ok(ClienteValidado {
        persona,
        dias_credito,
        credito_disponible,
        estado: payload.estado.unwrap_or(true),
    })
}

async fn buscar_cliente(state: &AppState, id: i64) -> Result<ClienteConPersona, ApiError> {
    let sql = format!("{} WHERE c.id = ? AND c.{}", SELECT_CON_PERSONA, Cliente::SCOPE_SIN_ELIMINAR);

    sqlx::query_as::<_, ClienteConPersona>(&sql)
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Cliente no encontrado".into()))
}

/// Listar clientes. Por defecto excluye los eliminados; con
/// `?eliminados=true` muestra el conjunto recuperable.
pub async fn listar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(filtro): Query<ClienteFiltro>,
) -> Result<Json<ApiResponse<ResourceCollection<ClienteResource>>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let mut sql = format!(
        "{} WHERE c.{}",
        SELECT_CON_PERSONA,
        if filtro.eliminados == Some(true) {
            "deleted_at IS NOT NULL"
        } else {
            Cliente::SCOPE_SIN_ELIMINAR
        }
    );

    let buscar = filtro
        .buscar
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()));

    if buscar.is_some() {
        sql.push_str(
            " AND (LOWER(p.nombres) LIKE ? OR LOWER(p.apellidos) LIKE ?
               OR LOWER(p.razon_social) LIKE ? OR LOWER(c.codigo) LIKE ?)",
        );
    }

    sql.push_str(" ORDER BY c.codigo ASC");

    let mut query = sqlx::query_as::<_, ClienteConPersona>(&sql);

    if let Some(termino) = &buscar {
        query = query
            .bind(termino.clone())
            .bind(termino.clone())
            .bind(termino.clone())
            .bind(termino.clone());
    }

    let clientes = query.fetch_all(&state.db).await?;

    let recursos = clientes.iter().map(ClienteResource::new).collect();

    Ok(Json(ApiResponse::ok(ResourceCollection::new(recursos))))
}

/// Ver un cliente.
pub async fn mostrar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ClienteResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let cliente = buscar_cliente(&state, id).await?;

    Ok(Json(ApiResponse::ok(ClienteResource::new(&cliente))))
}

/// Crear cliente junto con su persona, en una sola transacción.
pub async fn crear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ClientePayload>,
) -> Result<(StatusCode, Json<ApiResponse<ClienteResource>>), ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;

    let datos = validar_payload(&payload)?;

    let mut intentos = 0;
    let id = loop {
        let codigo = Cliente::generar_codigo(&state.db).await?;

        let mut tx = state.db.begin().await?;

        let persona_id = insertar_persona(&mut tx, &datos.persona).await?;

        let result = sqlx::query(
            "INSERT INTO clientes (persona_id, codigo, dias_credito, credito_disponible, estado)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(persona_id)
        .bind(&codigo)
        .bind(datos.dias_credito)
        .bind(datos.credito_disponible)
        .bind(datos.estado)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(res) => {
                let id = res.last_insert_rowid();
                tx.commit().await?;
                break id;
            }
            // Choque del código con otra creación concurrente: reintentar.
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() && intentos < 2 => {
                intentos += 1;
            }
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Err(ApiError::Conflict(
                    "No se pudo asignar un código único, reintente".into(),
                ));
            }
            Err(e) => return Err(e.into()),
        }
    };

    log_info!("CLIENTES", "Cliente creado", serde_json::json!({
        "id": id,
        "user_id": ctx.user_id,
    }));

    let cliente = buscar_cliente(&state, id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::con_mensaje(
            "Cliente creado correctamente",
            ClienteResource::new(&cliente),
        )),
    ))
}

/// Actualizar cliente y su persona.
pub async fn actualizar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<ClientePayload>,
) -> Result<Json<ApiResponse<ClienteResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let actual = buscar_cliente(&state, id).await?;

    let datos = validar_payload(&payload)?;

    let mut tx = state.db.begin().await?;

    actualizar_persona(&mut tx, actual.persona_id, &datos.persona).await?;

    sqlx::query(
        "UPDATE clientes SET dias_credito = ?, credito_disponible = ?, estado = ?,
         updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(datos.dias_credito)
    .bind(datos.credito_disponible)
    .bind(datos.estado)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let cliente = buscar_cliente(&state, id).await?;

    Ok(Json(ApiResponse::con_mensaje(
        "Cliente actualizado correctamente",
        ClienteResource::new(&cliente),
    )))
}

/// Borrado lógico: el cliente desaparece de los listados por defecto
/// pero sigue recuperable con /restaurar.
pub async fn eliminar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;

    let result = sqlx::query(
        "UPDATE clientes SET deleted_at = CURRENT_TIMESTAMP
         WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Cliente no encontrado".into()));
    }

    log_info!("CLIENTES", "Cliente eliminado", serde_json::json!({
        "id": id,
        "user_id": ctx.user_id,
    }));

    Ok(Json(ApiResponse::con_mensaje(
        "Cliente eliminado correctamente",
        serde_json::Value::Null,
    )))
}

/// Recuperar un cliente eliminado lógicamente.
pub async fn restaurar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ClienteResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let result = sqlx::query(
        "UPDATE clientes SET deleted_at = NULL, updated_at = CURRENT_TIMESTAMP
         WHERE id = ? AND deleted_at IS NOT NULL",
    )
    .bind(id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(
            "Cliente no encontrado o no está eliminado".into(),
        ));
    }

    let cliente = buscar_cliente(&state, id).await?;

    Ok(Json(ApiResponse::con_mensaje(
        "Cliente restaurado correctamente",
        ClienteResource::new(&cliente),
    )))
}
