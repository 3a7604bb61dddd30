use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Duration;

use crate::auth::guard;
use crate::errors::{ApiError, ValidationErrors};
use crate::models::compra::{
    Compra, CompraFiltro, CompraPayload, CompraUpdatePayload, DetalleCompraConProducto,
};
use crate::models::documento::{
    calcular_linea, calcular_totales, ImportesLinea, ESTADO_ANULADA,
};
use crate::models::proveedor::ProveedorConPersona;
use crate::resources::{ApiResponse, CompraResource, PaginatedCollection};
use crate::validation;
use crate::{log_info, AppState};

const POR_PAGINA: i64 = 20;

const SELECT_DETALLES: &str = "
    SELECT d.id, d.compra_id, d.producto_id, p.nombre AS producto_nombre,
           d.cantidad, d.precio_unitario, d.porcentaje_descuento, d.descuento,
           d.subtotal, d.total
    FROM compra_detalles d
    LEFT JOIN productos p ON d.producto_id = p.id
";

struct LineaValidada {
    producto_id: i64,
    cantidad: i64,
    precio_unitario: f64,
    porcentaje_descuento: f64,
    importes: ImportesLinea,
}

struct CompraValidada {
    proveedor_id: i64,
    tipo_compra: String,
    tipo_comprobante: String,
    numero_comprobante: Option<String>,
    fecha_compra: String,
    fecha_vencimiento: Option<String>,
    porcentaje_impuesto: f64,
    porcentaje_descuento: f64,
    observaciones: Option<String>,
    lineas: Vec<LineaValidada>,
}

fn validar_payload(payload: &CompraPayload) -> Result<CompraValidada, ApiError> {
    let mut errores = ValidationErrors::new();

    let proveedor_id = match payload.proveedor_id {
        None => {
            errores.agregar("proveedor_id", "El campo proveedor_id es obligatorio");
            0
        }
        Some(id) => id,
    };

    let tipo_compra = match payload.tipo_compra.as_deref() {
        None => {
            errores.agregar("tipo_compra", "El campo tipo_compra es obligatorio");
            String::new()
        }
        Some(tipo @ (Compra::TIPO_CONTADO | Compra::TIPO_CREDITO)) => tipo.to_string(),
        Some(_) => {
            errores.agregar("tipo_compra", "El tipo de compra debe ser CONTADO o CREDITO");
            String::new()
        }
    };

    let tipo_comprobante = match payload.tipo_comprobante.as_deref() {
        None => {
            errores.agregar("tipo_comprobante", "El campo tipo_comprobante es obligatorio");
            String::new()
        }
        Some(tipo @ ("BOLETA" | "FACTURA" | "TICKET")) => tipo.to_string(),
        Some(_) => {
            errores.agregar(
                "tipo_comprobante",
                "El tipo de comprobante debe ser BOLETA, FACTURA o TICKET",
            );
            String::new()
        }
    };

    let fecha_compra = match payload.fecha_compra.as_deref() {
        None => {
            errores.agregar("fecha_compra", "El campo fecha_compra es obligatorio");
            String::new()
        }
        Some(fecha) => match validation::validar_fecha(fecha) {
            Ok(_) => fecha.trim().to_string(),
            Err(msg) => {
                errores.agregar("fecha_compra", msg);
                String::new()
            }
        },
    };

    let fecha_vencimiento = match payload.fecha_vencimiento.as_deref() {
        Some(fecha) => match validation::validar_fecha(fecha) {
            Ok(_) => Some(fecha.trim().to_string()),
            Err(msg) => {
                errores.agregar("fecha_vencimiento", msg);
                None
            }
        },
        None => None,
    };

    let porcentaje_impuesto = payload.porcentaje_impuesto.unwrap_or(0.0);
    if let Err(msg) = validation::validar_porcentaje(porcentaje_impuesto) {
        errores.agregar("porcentaje_impuesto", msg);
    }

    let porcentaje_descuento = payload.porcentaje_descuento.unwrap_or(0.0);
    if let Err(msg) = validation::validar_porcentaje(porcentaje_descuento) {
        errores.agregar("porcentaje_descuento", msg);
    }

    if let Some(observaciones) = payload.observaciones.as_deref() {
        if let Err(msg) = validation::validar_observaciones(observaciones) {
            errores.agregar("observaciones", msg);
        }
    }

    let mut lineas = Vec::new();

    match payload.detalles.as_deref() {
        None | Some([]) => {
            errores.agregar("detalles", "La compra debe tener al menos un detalle");
        }
        Some(detalles) => {
            for (i, detalle) in detalles.iter().enumerate() {
                let producto_id = match detalle.producto_id {
                    None => {
                        errores.agregar(
                            &format!("detalles.{}.producto_id", i),
                            "El campo producto_id es obligatorio",
                        );
                        0
                    }
                    Some(id) => id,
                };

                let cantidad = detalle.cantidad.unwrap_or(0);
                if let Err(msg) = validation::validar_cantidad(cantidad) {
                    errores.agregar(&format!("detalles.{}.cantidad", i), msg);
                }

                let precio_unitario = detalle.precio_unitario.unwrap_or(-1.0);
                if let Err(msg) = validation::validar_monto(precio_unitario) {
                    errores.agregar(&format!("detalles.{}.precio_unitario", i), msg);
                }

                let porcentaje_descuento = detalle.porcentaje_descuento.unwrap_or(0.0);
                if let Err(msg) = validation::validar_porcentaje(porcentaje_descuento) {
                    errores.agregar(&format!("detalles.{}.porcentaje_descuento", i), msg);
                }

                lineas.push(LineaValidada {
                    producto_id,
                    cantidad,
                    precio_unitario,
                    porcentaje_descuento,
                    importes: calcular_linea(cantidad, precio_unitario, porcentaje_descuento),
                });
            }
        }
    }

    errores.into_result()?;

    Ok(CompraValidada {
        proveedor_id,
        tipo_compra,
        tipo_comprobante,
        numero_comprobante: payload.numero_comprobante.clone(),
        fecha_compra,
        fecha_vencimiento,
        porcentaje_impuesto,
        porcentaje_descuento,
        observaciones: payload.observaciones.clone(),
        lineas,
    })
}

async fn buscar_compra(state: &AppState, id: i64) -> Result<Compra, ApiError> {
    sqlx::query_as::<_, Compra>("SELECT * FROM compras WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Compra no encontrada".into()))
}

async fn cargar_proveedor(
    state: &AppState,
    id: i64,
) -> Result<Option<ProveedorConPersona>, ApiError> {
    let sql = format!("{} WHERE pr.id = ?", super::proveedores::SELECT_CON_PERSONA);

    Ok(sqlx::query_as::<_, ProveedorConPersona>(&sql)
        .bind(id)
        .fetch_optional(&state.db)
        .await?)
}

async fn cargar_detalles(
    state: &AppState,
    compra_id: i64,
) -> Result<Vec<DetalleCompraConProducto>, ApiError> {
    let sql = format!("{} WHERE d.compra_id = ? ORDER BY d.id ASC", SELECT_DETALLES);

    Ok(sqlx::query_as::<_, DetalleCompraConProducto>(&sql)
        .bind(compra_id)
        .fetch_all(&state.db)
        .await?)
}

/// Listar compras paginadas, con el proveedor cargado para cada una.
pub async fn listar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(filtro): Query<CompraFiltro>,
) -> Result<Json<ApiResponse<PaginatedCollection<CompraResource>>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let mut count_sql = String::from("SELECT COUNT(*) FROM compras WHERE 1=1");
    let mut data_sql = String::from("SELECT * FROM compras WHERE 1=1");

    let mut condiciones = String::new();

    if filtro.proveedor_id.is_some() {
        condiciones.push_str(" AND proveedor_id = ?");
    }

    if filtro.estado.is_some() {
        condiciones.push_str(" AND estado = ?");
    }

    if filtro.fecha.is_some() {
        condiciones.push_str(" AND fecha_compra = ?");
    }

    count_sql.push_str(&condiciones);
    data_sql.push_str(&condiciones);

    let page = filtro.page.unwrap_or(1).max(1);
    data_sql.push_str(" ORDER BY id DESC LIMIT ? OFFSET ?");

    let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
    let mut data_query = sqlx::query_as::<_, Compra>(&data_sql);

    if let Some(proveedor_id) = filtro.proveedor_id {
        count_query = count_query.bind(proveedor_id);
        data_query = data_query.bind(proveedor_id);
    }

    if let Some(estado) = &filtro.estado {
        count_query = count_query.bind(estado.clone());
        data_query = data_query.bind(estado.clone());
    }

    if let Some(fecha) = &filtro.fecha {
        count_query = count_query.bind(fecha.clone());
        data_query = data_query.bind(fecha.clone());
    }

    let total = count_query.fetch_one(&state.db).await?.0;

    let compras = data_query
        .bind(POR_PAGINA)
        .bind((page - 1) * POR_PAGINA)
        .fetch_all(&state.db)
        .await?;

    let ids: Vec<i64> = compras
        .iter()
        .map(|c| c.proveedor_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut proveedores: HashMap<i64, ProveedorConPersona> = HashMap::new();

    if !ids.is_empty() {
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "{} WHERE pr.id IN ({})",
            super::proveedores::SELECT_CON_PERSONA,
            placeholders
        );

        let mut query = sqlx::query_as::<_, ProveedorConPersona>(&sql);
        for id in &ids {
            query = query.bind(*id);
        }

        for proveedor in query.fetch_all(&state.db).await? {
            proveedores.insert(proveedor.id, proveedor);
        }
    }

    let recursos = compras
        .iter()
        .map(|compra| {
            CompraResource::con_relaciones(compra, proveedores.get(&compra.proveedor_id), None)
        })
        .collect();

    Ok(Json(ApiResponse::ok(PaginatedCollection {
        data: recursos,
        total,
        page,
        per_page: POR_PAGINA,
    })))
}

/// Ver una compra completa: cabecera, proveedor y detalles.
pub async fn mostrar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CompraResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let compra = buscar_compra(&state, id).await?;
    let proveedor = cargar_proveedor(&state, compra.proveedor_id).await?;
    let detalles = cargar_detalles(&state, id).await?;

    Ok(Json(ApiResponse::ok(CompraResource::con_relaciones(
        &compra,
        proveedor.as_ref(),
        Some(&detalles),
    ))))
}

/// Registrar una compra: inserta cabecera y detalles, incrementa stock y
/// mantiene los agregados del proveedor (total de compras, última compra,
/// crédito usado en compras a crédito). Todo dentro de una transacción.
pub async fn crear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CompraPayload>,
) -> Result<(StatusCode, Json<ApiResponse<CompraResource>>), ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;

    let datos = validar_payload(&payload)?;

    let proveedor = cargar_proveedor(&state, datos.proveedor_id)
        .await?
        .filter(|p| p.deleted_at.is_none());

    let proveedor = match proveedor {
        Some(p) => p,
        None => {
            let mut errores = ValidationErrors::new();
            errores.agregar("proveedor_id", "El proveedor indicado no existe");
            return Err(ApiError::Validation(errores));
        }
    };

    let importes: Vec<ImportesLinea> = datos.lineas.iter().map(|l| l.importes).collect();
    let totales = calcular_totales(
        &importes,
        datos.porcentaje_impuesto,
        datos.porcentaje_descuento,
    );

    let es_credito = datos.tipo_compra == Compra::TIPO_CREDITO;

    if es_credito && proveedor.credito_disponible() < totales.total {
        let mut errores = ValidationErrors::new();
        errores.agregar(
            "proveedor_id",
            "La compra excede el crédito disponible con el proveedor",
        );
        return Err(ApiError::Validation(errores));
    }

    let fecha_vencimiento = match (&datos.fecha_vencimiento, es_credito) {
        (Some(fecha), _) => Some(fecha.clone()),
        (None, true) => validation::validar_fecha(&datos.fecha_compra)
            .ok()
            .map(|fecha| {
                (fecha + Duration::days(proveedor.dias_credito))
                    .format("%Y-%m-%d")
                    .to_string()
            }),
        (None, false) => None,
    };

    let mut intentos = 0;
    let id = loop {
        let codigo = Compra::generar_codigo(&state.db).await?;

        let mut tx = state.db.begin().await?;

        let result = sqlx::query(
            "INSERT INTO compras (codigo, proveedor_id, tipo_compra, tipo_comprobante,
             numero_comprobante, fecha_compra, fecha_vencimiento, subtotal,
             porcentaje_impuesto, impuesto, porcentaje_descuento, descuento, total,
             observaciones)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&codigo)
        .bind(datos.proveedor_id)
        .bind(&datos.tipo_compra)
        .bind(&datos.tipo_comprobante)
        .bind(&datos.numero_comprobante)
        .bind(&datos.fecha_compra)
        .bind(&fecha_vencimiento)
        .bind(totales.subtotal)
        .bind(datos.porcentaje_impuesto)
        .bind(totales.impuesto)
        .bind(datos.porcentaje_descuento)
        .bind(totales.descuento)
        .bind(totales.total)
        .bind(&datos.observaciones)
        .execute(&mut *tx)
        .await;

        let compra_id = match result {
            Ok(res) => res.last_insert_rowid(),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() && intentos < 2 => {
                intentos += 1;
                continue;
            }
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Err(ApiError::Conflict(
                    "No se pudo asignar un código único, reintente".into(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        for linea in &datos.lineas {
            let existe: Option<(i64,)> = sqlx::query_as("SELECT id FROM productos WHERE id = ?")
                .bind(linea.producto_id)
                .fetch_optional(&mut *tx)
                .await?;

            if existe.is_none() {
                let mut errores = ValidationErrors::new();
                errores.agregar(
                    "detalles",
                    format!("El producto {} no existe", linea.producto_id),
                );
                return Err(ApiError::Validation(errores));
            }

            sqlx::query(
                "INSERT INTO compra_detalles (compra_id, producto_id, cantidad, precio_unitario,
                 porcentaje_descuento, descuento, subtotal, total)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(compra_id)
            .bind(linea.producto_id)
            .bind(linea.cantidad)
            .bind(linea.precio_unitario)
            .bind(linea.porcentaje_descuento)
            .bind(linea.importes.descuento)
            .bind(linea.importes.subtotal)
            .bind(linea.importes.total)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE productos SET stock = stock + ?, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?",
            )
            .bind(linea.cantidad)
            .bind(linea.producto_id)
            .execute(&mut *tx)
            .await?;
        }

        // Agregados del proveedor.
        sqlx::query(
            "UPDATE proveedores SET total_compras = total_compras + ?, ultima_compra = ?,
             updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(totales.total)
        .bind(&datos.fecha_compra)
        .bind(datos.proveedor_id)
        .execute(&mut *tx)
        .await?;

        if es_credito {
            sqlx::query(
                "UPDATE proveedores SET credito_usado = credito_usado + ?,
                 updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            )
            .bind(totales.total)
            .bind(datos.proveedor_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        break compra_id;
    };

    log_info!("COMPRAS", "Compra registrada", serde_json::json!({
        "id": id,
        "total": totales.total,
        "user_id": ctx.user_id,
    }));

    let compra = buscar_compra(&state, id).await?;
    let proveedor = cargar_proveedor(&state, compra.proveedor_id).await?;
    let detalles = cargar_detalles(&state, id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::con_mensaje(
            "Compra registrada correctamente",
            CompraResource::con_relaciones(&compra, proveedor.as_ref(), Some(&detalles)),
        )),
    ))
}

/// Actualizar la cabecera de una compra aún editable.
pub async fn actualizar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<CompraUpdatePayload>,
) -> Result<Json<ApiResponse<CompraResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let compra = buscar_compra(&state, id).await?;

    if !compra.puede_editarse() {
        return Err(ApiError::Authorization("La compra ya no puede modificarse".into()));
    }

    let mut errores = ValidationErrors::new();

    let tipo_comprobante = match payload.tipo_comprobante.as_deref() {
        None => compra.tipo_comprobante.clone(),
        Some(tipo @ ("BOLETA" | "FACTURA" | "TICKET")) => tipo.to_string(),
        Some(_) => {
            errores.agregar(
                "tipo_comprobante",
                "El tipo de comprobante debe ser BOLETA, FACTURA o TICKET",
            );
            String::new()
        }
    };

    let fecha_vencimiento = match payload.fecha_vencimiento.as_deref() {
        None => compra.fecha_vencimiento.clone(),
        Some(fecha) => match validation::validar_fecha(fecha) {
            Ok(_) => Some(fecha.trim().to_string()),
            Err(msg) => {
                errores.agregar("fecha_vencimiento", msg);
                None
            }
        },
    };

    if let Some(observaciones) = payload.observaciones.as_deref() {
        if let Err(msg) = validation::validar_observaciones(observaciones) {
            errores.agregar("observaciones", msg);
        }
    }

    errores.into_result()?;

    let numero_comprobante = payload
        .numero_comprobante
        .clone()
        .or(compra.numero_comprobante.clone());
    let observaciones = payload
        .observaciones
        .clone()
        .or(compra.observaciones.clone());

    sqlx::query(
        "UPDATE compras SET tipo_comprobante = ?, numero_comprobante = ?,
         fecha_vencimiento = ?, observaciones = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(&tipo_comprobante)
    .bind(&numero_comprobante)
    .bind(&fecha_vencimiento)
    .bind(&observaciones)
    .bind(id)
    .execute(&state.db)
    .await?;

    let compra = buscar_compra(&state, id).await?;
    let proveedor = cargar_proveedor(&state, compra.proveedor_id).await?;
    let detalles = cargar_detalles(&state, id).await?;

    Ok(Json(ApiResponse::con_mensaje(
        "Compra actualizada correctamente",
        CompraResource::con_relaciones(&compra, proveedor.as_ref(), Some(&detalles)),
    )))
}

/// Anular una compra: retira el stock ingresado y revierte los agregados
/// del proveedor. Si parte del stock ya se vendió, la anulación no puede
/// dejar existencias negativas.
pub async fn anular(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CompraResource>>, ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;

    let compra = buscar_compra(&state, id).await?;

    if compra.estado == ESTADO_ANULADA {
        return Err(ApiError::Conflict("La compra ya está anulada".into()));
    }

    let mut tx = state.db.begin().await?;

    sqlx::query(
        "UPDATE compras SET estado = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(ESTADO_ANULADA)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let lineas: Vec<(i64, i64)> =
        sqlx::query_as("SELECT producto_id, cantidad FROM compra_detalles WHERE compra_id = ?")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

    for (producto_id, cantidad) in lineas {
        let stock: (i64,) = sqlx::query_as("SELECT stock FROM productos WHERE id = ?")
            .bind(producto_id)
            .fetch_one(&mut *tx)
            .await?;

        if stock.0 < cantidad {
            let mut errores = ValidationErrors::new();
            errores.agregar(
                "detalles",
                format!(
                    "No se puede anular: el stock del producto {} ya fue consumido",
                    producto_id
                ),
            );
            return Err(ApiError::Validation(errores));
        }

        sqlx::query(
            "UPDATE productos SET stock = stock - ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(cantidad)
        .bind(producto_id)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "UPDATE proveedores SET total_compras = total_compras - ?,
         updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(compra.total)
    .bind(compra.proveedor_id)
    .execute(&mut *tx)
    .await?;

    if compra.tipo_compra == Compra::TIPO_CREDITO {
        sqlx::query(
            "UPDATE proveedores SET credito_usado = credito_usado - ?,
             updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(compra.total)
        .bind(compra.proveedor_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    log_info!("COMPRAS", "Compra anulada", serde_json::json!({
        "id": id,
        "user_id": ctx.user_id,
    }));

    let compra = buscar_compra(&state, id).await?;
    let proveedor = cargar_proveedor(&state, compra.proveedor_id).await?;
    let detalles = cargar_detalles(&state, id).await?;

    Ok(Json(ApiResponse::con_mensaje(
        "Compra anulada correctamente",
        CompraResource::con_relaciones(&compra, proveedor.as_ref(), Some(&detalles)),
    )))
}
