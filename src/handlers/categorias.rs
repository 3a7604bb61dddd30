use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::auth::guard;
use crate::errors::{ApiError, ValidationErrors};
use crate::models::categoria::{Categoria, CategoriaFiltro, CategoriaPayload};
use crate::resources::{ApiResponse, CategoriaResource, ResourceCollection};
use crate::validation;
use crate::{log_info, AppState};

/// Valida el payload y devuelve (nombre, descripcion, estado).
fn validar_payload(payload: &CategoriaPayload) -> Result<(String, Option<String>, bool), ApiError> {
    let mut errores = ValidationErrors::new();

    let nombre = match payload.nombre.as_deref().map(str::trim) {
        None | Some("") => {
            errores.agregar("nombre", "El campo nombre es obligatorio");
            String::new()
        }
        Some(nombre) => {
            if let Err(msg) = validation::validar_nombre(nombre) {
                errores.agregar("nombre", msg);
            }
            nombre.to_string()
        }
    };

    if let Some(desc) = payload.descripcion.as_deref() {
        if let Err(msg) = validation::validar_observaciones(desc) {
            errores.agregar("descripcion", msg);
        }
    }

    errores.into_result()?;

    Ok((
        nombre,
        payload.descripcion.clone(),
        payload.estado.unwrap_or(true),
    ))
}

async fn buscar_categoria(state: &AppState, id: i64) -> Result<Categoria, ApiError> {
    sqlx::query_as::<_, Categoria>("SELECT * FROM categorias WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Categoría no encontrada".into()))
}

/// Listar categorías, con filtro opcional por estado.
pub async fn listar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(filtro): Query<CategoriaFiltro>,
) -> Result<Json<ApiResponse<ResourceCollection<CategoriaResource>>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let mut sql = String::from("SELECT * FROM categorias WHERE 1=1");

    match filtro.estado {
        Some(true) => {
            sql.push_str(" AND ");
            sql.push_str(Categoria::SCOPE_ACTIVAS);
        }
        Some(false) => {
            sql.push_str(" AND ");
            sql.push_str(Categoria::SCOPE_INACTIVAS);
        }
        None => {}
    }

    sql.push_str(" ORDER BY nombre ASC");

    let categorias = sqlx::query_as::<_, Categoria>(&sql)
        .fetch_all(&state.db)
        .await?;

    let recursos = categorias.iter().map(CategoriaResource::new).collect();

    Ok(Json(ApiResponse::ok(ResourceCollection::new(recursos))))
}

/// Ver una categoría.
pub async fn mostrar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoriaResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let categoria = buscar_categoria(&state, id).await?;

    Ok(Json(ApiResponse::ok(CategoriaResource::new(&categoria))))
}

/// Crear categoría.
pub async fn crear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CategoriaPayload>,
) -> Result<(StatusCode, Json<ApiResponse<CategoriaResource>>), ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;

    let (nombre, descripcion, estado) = validar_payload(&payload)?;

    let result = sqlx::query("INSERT INTO categorias (nombre, descripcion, estado) VALUES (?, ?, ?)")
        .bind(&nombre)
        .bind(&descripcion)
        .bind(estado)
        .execute(&state.db)
        .await;

    let id = match result {
        Ok(res) => res.last_insert_rowid(),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Err(ApiError::Conflict("La categoría ya existe".into()));
        }
        Err(e) => return Err(e.into()),
    };

    log_info!("CATEGORIAS", "Categoría creada", serde_json::json!({
        "id": id,
        "user_id": ctx.user_id,
    }));

    let categoria = buscar_categoria(&state, id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::con_mensaje(
            "Categoría creada correctamente",
            CategoriaResource::new(&categoria),
        )),
    ))
}

/// Actualizar categoría.
pub async fn actualizar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<CategoriaPayload>,
) -> Result<Json<ApiResponse<CategoriaResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    buscar_categoria(&state, id).await?;

    let (nombre, descripcion, estado) = validar_payload(&payload)?;

    let result = sqlx::query(
        "UPDATE categorias SET nombre = ?, descripcion = ?, estado = ?,
         updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(&nombre)
    .bind(&descripcion)
    .bind(estado)
    .bind(id)
    .execute(&state.db)
    .await;

    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Err(ApiError::Conflict("La categoría ya existe".into()));
        }
        Err(e) => return Err(e.into()),
    }

    let categoria = buscar_categoria(&state, id).await?;

    Ok(Json(ApiResponse::con_mensaje(
        "Categoría actualizada correctamente",
        CategoriaResource::new(&categoria),
    )))
}

/// Eliminar categoría (borrado físico; los productos quedan sin categoría).
pub async fn eliminar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;

    let result = sqlx::query("DELETE FROM categorias WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Categoría no encontrada".into()));
    }

    log_info!("CATEGORIAS", "Categoría eliminada", serde_json::json!({
        "id": id,
        "user_id": ctx.user_id,
    }));

    Ok(Json(ApiResponse::con_mensaje(
        "Categoría eliminada correctamente",
        serde_json::Value::Null,
    )))
}
