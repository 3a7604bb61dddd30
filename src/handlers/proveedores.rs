use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use super::personas::{actualizar_persona, insertar_persona, validar_persona, PersonaDatos};
use crate::auth::guard;
use crate::errors::{ApiError, ValidationErrors};
use crate::models::proveedor::{
    Proveedor, ProveedorConPersona, ProveedorFiltro, ProveedorPayload,
};
use crate::resources::{ApiResponse, ProveedorResource, ResourceCollection};
use crate::validation;
use crate::{log_info, AppState};

pub(crate) const SELECT_CON_PERSONA: &str = "
    SELECT pr.id, pr.persona_id, pr.codigo, pr.tipo_proveedor, pr.rubro,
           pr.limite_credito, pr.credito_usado, pr.dias_credito, pr.calificacion,
           pr.total_compras, pr.ultima_compra, pr.estado, pr.deleted_at,
           p.nombres, p.apellidos, p.razon_social, p.telefono, p.email
    FROM proveedores pr
    INNER JOIN personas p ON pr.persona_id = p.id
";

struct ProveedorValidado {
    persona: PersonaDatos,
    tipo_proveedor: String,
    rubro: Option<String>,
    limite_credito: f64,
    dias_credito: i64,
    descuento_general: f64,
    cuenta_bancaria: Option<String>,
    banco: Option<String>,
    nombre_contacto: Option<String>,
    cargo_contacto: Option<String>,
    telefono_contacto: Option<String>,
    email_contacto: Option<String>,
    observaciones: Option<String>,
    fecha_registro: Option<String>,
    calificacion: i64,
    estado: bool,
}

fn validar_payload(payload: &ProveedorPayload) -> Result<ProveedorValidado, ApiError> {
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

    let tipo_proveedor = match payload.tipo_proveedor.as_deref().map(str::trim) {
        None | Some("") => {
            errores.agregar("tipo_proveedor", "El campo tipo_proveedor es obligatorio");
            String::new()
        }
        Some(tipo @ ("PRODUCTO" | "SERVICIO" | "AMBOS")) => tipo.to_string(),
        Some(_) => {
            errores.agregar(
                "tipo_proveedor",
                "El tipo de proveedor debe ser PRODUCTO, SERVICIO o AMBOS",
            );
            String::new()
        }
    };

    let limite_credito = payload.limite_credito.unwrap_or(0.0);
    if let Err(msg) = validation::validar_monto(limite_credito) {
        errores.agregar("limite_credito", msg);
    }

    let dias_credito = payload.dias_credito.unwrap_or(0);
    if dias_credito < 0 {
        errores.agregar("dias_credito", "Los días de crédito no pueden ser negativos");
    }

    let descuento_general = payload.descuento_general.unwrap_or(0.0);
    if let Err(msg) = validation::validar_porcentaje(descuento_general) {
        errores.agregar("descuento_general", msg);
    }

    let calificacion = payload.calificacion.unwrap_or(3);
    if let Err(msg) = validation::validar_calificacion(calificacion) {
        errores.agregar("calificacion", msg);
    }

    if let Some(observaciones) = payload.observaciones.as_deref() {
        if let Err(msg) = validation::validar_observaciones(observaciones) {
            errores.agregar("observaciones", msg);
        }
    }

    let fecha_registro = match payload.fecha_registro.as_deref() {
        Some(fecha) => match validation::validar_fecha(fecha) {
            Ok(_) => Some(fecha.trim().to_string()),
            Err(msg) => {
                errores.agregar("fecha_registro", msg);
                None
            }
        },
        None => None,
    };

    if let Some(email_contacto) = payload.email_contacto.as_deref().map(str::trim) {
        if !email_contacto.is_empty() {
            if let Err(msg) = validation::validar_email(email_contacto) {
                errores.agregar("email_contacto", msg);
            }
        }
    }

    errores.into_result()?;

    Ok(ProveedorValidado {
        persona,
        tipo_proveedor,
        rubro: payload.rubro.clone(),
        limite_credito,
        dias_credito,
        descuento_general,
        cuenta_bancaria: payload.cuenta_bancaria.clone(),
        banco: payload.banco.clone(),
        nombre_contacto: payload.nombre_contacto.clone(),
        cargo_contacto: payload.cargo_contacto.clone(),
        telefono_contacto: payload.telefono_contacto.clone(),
        email_contacto: payload.email_contacto.clone(),
        observaciones: payload.observaciones.clone(),
        fecha_registro,
        calificacion,
        estado: payload.estado.unwrap_or(true),
    })
}

async fn buscar_proveedor(state: &AppState, id: i64) -> Result<ProveedorConPersona, ApiError> {
    let sql = format!(
        "{} WHERE pr.id = ? AND pr.{}",
        SELECT_CON_PERSONA,
        Proveedor::SCOPE_SIN_ELIMINAR
    );

    sqlx::query_as::<_, ProveedorConPersona>(&sql)
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Proveedor no encontrado".into()))
}

/// Listar proveedores; `?eliminados=true` muestra el conjunto recuperable.
pub async fn listar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(filtro): Query<ProveedorFiltro>,
) -> Result<Json<ApiResponse<ResourceCollection<ProveedorResource>>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let mut sql = format!(
        "{} WHERE pr.{}",
        SELECT_CON_PERSONA,
        if filtro.eliminados == Some(true) {
            "deleted_at IS NOT NULL"
        } else {
            Proveedor::SCOPE_SIN_ELIMINAR
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
            " AND (LOWER(p.nombres) LIKE ? OR LOWER(p.razon_social) LIKE ?
               OR LOWER(pr.codigo) LIKE ? OR LOWER(pr.rubro) LIKE ?)",
        );
    }

    sql.push_str(" ORDER BY pr.codigo ASC");

    let mut query = sqlx::query_as::<_, ProveedorConPersona>(&sql);

    if let Some(termino) = &buscar {
        query = query
            .bind(termino.clone())
            .bind(termino.clone())
            .bind(termino.clone())
            .bind(termino.clone());
    }

    let proveedores = query.fetch_all(&state.db).await?;

    let recursos = proveedores.iter().map(ProveedorResource::new).collect();

    Ok(Json(ApiResponse::ok(ResourceCollection::new(recursos))))
}

/// Ver un proveedor.
pub async fn mostrar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProveedorResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let proveedor = buscar_proveedor(&state, id).await?;

    Ok(Json(ApiResponse::ok(ProveedorResource::new(&proveedor))))
}

/// Crear proveedor junto con su persona.
pub async fn crear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ProveedorPayload>,
) -> Result<(StatusCode, Json<ApiResponse<ProveedorResource>>), ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;

    let datos = validar_payload(&payload)?;

    let mut intentos = 0;
    let id = loop {
        let codigo = Proveedor::generar_codigo(&state.db).await?;

        let mut tx = state.db.begin().await?;

        let persona_id = insertar_persona(&mut tx, &datos.persona).await?;

        let result = sqlx::query(
            "INSERT INTO proveedores (persona_id, codigo, tipo_proveedor, rubro, limite_credito,
             dias_credito, descuento_general, cuenta_bancaria, banco, nombre_contacto,
             cargo_contacto, telefono_contacto, email_contacto, observaciones, fecha_registro,
             calificacion, estado)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(persona_id)
        .bind(&codigo)
        .bind(&datos.tipo_proveedor)
        .bind(&datos.rubro)
        .bind(datos.limite_credito)
        .bind(datos.dias_credito)
        .bind(datos.descuento_general)
        .bind(&datos.cuenta_bancaria)
        .bind(&datos.banco)
        .bind(&datos.nombre_contacto)
        .bind(&datos.cargo_contacto)
        .bind(&datos.telefono_contacto)
        .bind(&datos.email_contacto)
        .bind(&datos.observaciones)
        .bind(&datos.fecha_registro)
        .bind(datos.calificacion)
        .bind(datos.estado)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(res) => {
                let id = res.last_insert_rowid();
                tx.commit().await?;
                break id;
            }
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

    log_info!("PROVEEDORES", "Proveedor creado", serde_json::json!({
        "id": id,
        "user_id": ctx.user_id,
    }));

    let proveedor = buscar_proveedor(&state, id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::con_mensaje(
            "Proveedor creado correctamente",
            ProveedorResource::new(&proveedor),
        )),
    ))
}

/// Actualizar proveedor y su persona.
pub async fn actualizar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<ProveedorPayload>,
) -> Result<Json<ApiResponse<ProveedorResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let actual = buscar_proveedor(&state, id).await?;

    let datos = validar_payload(&payload)?;

    let mut tx = state.db.begin().await?;

    actualizar_persona(&mut tx, actual.persona_id, &datos.persona).await?;

    sqlx::query(
        "UPDATE proveedores SET tipo_proveedor = ?, rubro = ?, limite_credito = ?,
         dias_credito = ?, descuento_general = ?, cuenta_bancaria = ?, banco = ?,
         nombre_contacto = ?, cargo_contacto = ?, telefono_contacto = ?, email_contacto = ?,
         observaciones = ?, fecha_registro = ?, calificacion = ?, estado = ?,
         updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(&datos.tipo_proveedor)
    .bind(&datos.rubro)
    .bind(datos.limite_credito)
    .bind(datos.dias_credito)
    .bind(datos.descuento_general)
    .bind(&datos.cuenta_bancaria)
    .bind(&datos.banco)
    .bind(&datos.nombre_contacto)
    .bind(&datos.cargo_contacto)
    .bind(&datos.telefono_contacto)
    .bind(&datos.email_contacto)
    .bind(&datos.observaciones)
    .bind(&datos.fecha_registro)
    .bind(datos.calificacion)
    .bind(datos.estado)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let proveedor = buscar_proveedor(&state, id).await?;

    Ok(Json(ApiResponse::con_mensaje(
        "Proveedor actualizado correctamente",
        ProveedorResource::new(&proveedor),
    )))
}

/// Borrado lógico del proveedor.
pub async fn eliminar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;

    let result = sqlx::query(
        "UPDATE proveedores SET deleted_at = CURRENT_TIMESTAMP
         WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Proveedor no encontrado".into()));
    }

    log_info!("PROVEEDORES", "Proveedor eliminado", serde_json::json!({
        "id": id,
        "user_id": ctx.user_id,
    }));

    Ok(Json(ApiResponse::con_mensaje(
        "Proveedor eliminado correctamente",
        serde_json::Value::Null,
    )))
}

/// Recuperar un proveedor eliminado lógicamente.
pub async fn restaurar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProveedorResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let result = sqlx::query(
        "UPDATE proveedores SET deleted_at = NULL, updated_at = CURRENT_TIMESTAMP
         WHERE id = ? AND deleted_at IS NOT NULL",
    )
    .bind(id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(
            "Proveedor no encontrado o no está eliminado".into(),
        ));
    }

    let proveedor = buscar_proveedor(&state, id).await?;

    Ok(Json(ApiResponse::con_mensaje(
        "Proveedor restaurado correctamente",
        ProveedorResource::new(&proveedor),
    )))
}
