use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Duration;

use crate::auth::guard;
use crate::errors::{ApiError, ValidationErrors};
use crate::models::cliente::ClienteConPersona;
use crate::models::documento::{
    calcular_linea, calcular_totales, ImportesLinea, ESTADO_ANULADA,
};
use crate::models::venta::{
    DetalleVentaConProducto, Venta, VentaFiltro, VentaPayload, VentaUpdatePayload,
};
use crate::resources::{ApiResponse, PaginatedCollection, VentaResource};
use crate::validation;
use crate::{log_info, AppState};

const POR_PAGINA: i64 = 20;

const SELECT_DETALLES: &str = "
    SELECT d.id, d.venta_id, d.producto_id, p.nombre AS producto_nombre,
           d.cantidad, d.precio_unitario, d.porcentaje_descuento, d.descuento,
           d.subtotal, d.total
    FROM venta_detalles d
    LEFT JOIN productos p ON d.producto_id = p.id
";

struct LineaValidada {
    producto_id: i64,
    cantidad: i64,
    precio_unitario: f64,
    porcentaje_descuento: f64,
    importes: ImportesLinea,
}

struct VentaValidada {
    cliente_id: i64,
    tipo_venta: String,
    tipo_comprobante: String,
    numero_comprobante: Option<String>,
    fecha_venta: String,
    fecha_vencimiento: Option<String>,
    porcentaje_impuesto: f64,
    porcentaje_descuento: f64,
    observaciones: Option<String>,
    lineas: Vec<LineaValidada>,
}

fn validar_payload(payload: &VentaPayload) -> Result<VentaValidada, ApiError> {
    let mut errores = ValidationErrors::new();

    let cliente_id = match payload.cliente_id {
        None => {
            errores.agregar("cliente_id", "El campo cliente_id es obligatorio");
            0
        }
        Some(id) => id,
    };

    let tipo_venta = match payload.tipo_venta.as_deref() {
        None => {
            errores.agregar("tipo_venta", "El campo tipo_venta es obligatorio");
            String::new()
        }
        Some(tipo @ (Venta::TIPO_CONTADO | Venta::TIPO_CREDITO)) => tipo.to_string(),
        Some(_) => {
            errores.agregar("tipo_venta", "El tipo de venta debe ser CONTADO o CREDITO");
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

    let fecha_venta = match payload.fecha_venta.as_deref() {
        None => {
            errores.agregar("fecha_venta", "El campo fecha_venta es obligatorio");
            String::new()
        }
        Some(fecha) => match validation::validar_fecha(fecha) {
            Ok(_) => fecha.trim().to_string(),
            Err(msg) => {
                errores.agregar("fecha_venta", msg);
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
            errores.agregar("detalles", "La venta debe tener al menos un detalle");
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

    Ok(VentaValidada {
        cliente_id,
        tipo_venta,
        tipo_comprobante,
        numero_comprobante: payload.numero_comprobante.clone(),
        fecha_venta,
        fecha_vencimiento,
        porcentaje_impuesto,
        porcentaje_descuento,
        observaciones: payload.observaciones.clone(),
        lineas,
    })
}

async fn buscar_venta(state: &AppState, id: i64) -> Result<Venta, ApiError> {
    sqlx::query_as::<_, Venta>("SELECT * FROM ventas WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Venta no encontrada".into()))
}

/// Carga el cliente con su persona, sin excluir eliminados: un cliente
/// borrado después de la venta sigue mostrándose en el documento.
async fn cargar_cliente(state: &AppState, id: i64) -> Result<Option<ClienteConPersona>, ApiError> {
    let sql = format!("{} WHERE c.id = ?", super::clientes::SELECT_CON_PERSONA);

    Ok(sqlx::query_as::<_, ClienteConPersona>(&sql)
        .bind(id)
        .fetch_optional(&state.db)
        .await?)
}

async fn cargar_detalles(
    state: &AppState,
    venta_id: i64,
) -> Result<Vec<DetalleVentaConProducto>, ApiError> {
    let sql = format!("{} WHERE d.venta_id = ? ORDER BY d.id ASC", SELECT_DETALLES);

    Ok(sqlx::query_as::<_, DetalleVentaConProducto>(&sql)
        .bind(venta_id)
        .fetch_all(&state.db)
        .await?)
}

/// Listar ventas paginadas, con el cliente cargado para cada una.
pub async fn listar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(filtro): Query<VentaFiltro>,
) -> Result<Json<ApiResponse<PaginatedCollection<VentaResource>>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let mut count_sql = String::from("SELECT COUNT(*) FROM ventas WHERE 1=1");
    let mut data_sql = String::from("SELECT * FROM ventas WHERE 1=1");

    let mut condiciones = String::new();

    if filtro.cliente_id.is_some() {
        condiciones.push_str(" AND cliente_id = ?");
    }

    if filtro.estado.is_some() {
        condiciones.push_str(" AND estado = ?");
    }

    if filtro.fecha.is_some() {
        condiciones.push_str(" AND fecha_venta = ?");
    }

    count_sql.push_str(&condiciones);
    data_sql.push_str(&condiciones);

    let page = filtro.page.unwrap_or(1).max(1);
    data_sql.push_str(" ORDER BY id DESC LIMIT ? OFFSET ?");

    let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
    let mut data_query = sqlx::query_as::<_, Venta>(&data_sql);

    if let Some(cliente_id) = filtro.cliente_id {
        count_query = count_query.bind(cliente_id);
        data_query = data_query.bind(cliente_id);
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

    let ventas = data_query
        .bind(POR_PAGINA)
        .bind((page - 1) * POR_PAGINA)
        .fetch_all(&state.db)
        .await?;

    // Carga de clientes en bloque para evitar una consulta por fila.
    let ids: Vec<i64> = ventas
        .iter()
        .map(|v| v.cliente_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut clientes: HashMap<i64, ClienteConPersona> = HashMap::new();

    if !ids.is_empty() {
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "{} WHERE c.id IN ({})",
            super::clientes::SELECT_CON_PERSONA,
            placeholders
        );

        let mut query = sqlx::query_as::<_, ClienteConPersona>(&sql);
        for id in &ids {
            query = query.bind(*id);
        }

        for cliente in query.fetch_all(&state.db).await? {
            clientes.insert(cliente.id, cliente);
        }
    }

    let recursos = ventas
        .iter()
        .map(|venta| VentaResource::con_relaciones(venta, clientes.get(&venta.cliente_id), None))
        .collect();

    Ok(Json(ApiResponse::ok(PaginatedCollection {
        data: recursos,
        total,
        page,
        per_page: POR_PAGINA,
    })))
}

/// Ver una venta completa: cabecera, cliente y detalles.
pub async fn mostrar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<VentaResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let venta = buscar_venta(&state, id).await?;
    let cliente = cargar_cliente(&state, venta.cliente_id).await?;
    let detalles = cargar_detalles(&state, id).await?;

    Ok(Json(ApiResponse::ok(VentaResource::con_relaciones(
        &venta,
        cliente.as_ref(),
        Some(&detalles),
    ))))
}

/// Registrar una venta: inserta cabecera y detalles, descuenta stock y,
/// en ventas a crédito, consume el crédito disponible del cliente.
/// Todo dentro de una transacción.
pub async fn crear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<VentaPayload>,
) -> Result<(StatusCode, Json<ApiResponse<VentaResource>>), ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;

    let datos = validar_payload(&payload)?;

    let cliente = cargar_cliente(&state, datos.cliente_id)
        .await?
        .filter(|c| c.deleted_at.is_none());

    let cliente = match cliente {
        Some(c) => c,
        None => {
            let mut errores = ValidationErrors::new();
            errores.agregar("cliente_id", "El cliente indicado no existe");
            return Err(ApiError::Validation(errores));
        }
    };

    let importes: Vec<ImportesLinea> = datos.lineas.iter().map(|l| l.importes).collect();
    let totales = calcular_totales(
        &importes,
        datos.porcentaje_impuesto,
        datos.porcentaje_descuento,
    );

    let es_credito = datos.tipo_venta == Venta::TIPO_CREDITO;

    if es_credito && cliente.credito_disponible < totales.total {
        let mut errores = ValidationErrors::new();
        errores.agregar(
            "cliente_id",
            "El cliente no tiene crédito disponible suficiente",
        );
        return Err(ApiError::Validation(errores));
    }

    // En ventas a crédito sin vencimiento explícito, se deriva de los
    // días de crédito del cliente.
    let fecha_vencimiento = match (&datos.fecha_vencimiento, es_credito) {
        (Some(fecha), _) => Some(fecha.clone()),
        (None, true) => validation::validar_fecha(&datos.fecha_venta)
            .ok()
            .map(|fecha| {
                (fecha + Duration::days(cliente.dias_credito))
                    .format("%Y-%m-%d")
                    .to_string()
            }),
        (None, false) => None,
    };

    let mut intentos = 0;
    let id = loop {
        let codigo = Venta::generar_codigo(&state.db).await?;

        let mut tx = state.db.begin().await?;

        let result = sqlx::query(
            "INSERT INTO ventas (codigo, cliente_id, tipo_venta, tipo_comprobante,
             numero_comprobante, fecha_venta, fecha_vencimiento, subtotal,
             porcentaje_impuesto, impuesto, porcentaje_descuento, descuento, total,
             observaciones)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&codigo)
        .bind(datos.cliente_id)
        .bind(&datos.tipo_venta)
        .bind(&datos.tipo_comprobante)
        .bind(&datos.numero_comprobante)
        .bind(&datos.fecha_venta)
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

        let venta_id = match result {
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
            let producto: Option<(String, i64, bool)> =
                sqlx::query_as("SELECT nombre, stock, estado FROM productos WHERE id = ?")
                    .bind(linea.producto_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            let (nombre, stock, activo) = match producto {
                Some(p) => p,
                None => {
                    let mut errores = ValidationErrors::new();
                    errores.agregar(
                        "detalles",
                        format!("El producto {} no existe", linea.producto_id),
                    );
                    return Err(ApiError::Validation(errores));
                }
            };

            if !activo {
                let mut errores = ValidationErrors::new();
                errores.agregar("detalles", format!("El producto {} está inactivo", nombre));
                return Err(ApiError::Validation(errores));
            }

            if stock < linea.cantidad {
                let mut errores = ValidationErrors::new();
                errores.agregar(
                    "detalles",
                    format!("Stock insuficiente para el producto {}", nombre),
                );
                return Err(ApiError::Validation(errores));
            }

            sqlx::query(
                "INSERT INTO venta_detalles (venta_id, producto_id, cantidad, precio_unitario,
                 porcentaje_descuento, descuento, subtotal, total)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(venta_id)
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
                "UPDATE productos SET stock = stock - ?, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?",
            )
            .bind(linea.cantidad)
            .bind(linea.producto_id)
            .execute(&mut *tx)
            .await?;
        }

        if es_credito {
            sqlx::query(
                "UPDATE clientes SET credito_disponible = credito_disponible - ?,
                 updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            )
            .bind(totales.total)
            .bind(datos.cliente_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        break venta_id;
    };

    log_info!("VENTAS", "Venta registrada", serde_json::json!({
        "id": id,
        "total": totales.total,
        "user_id": ctx.user_id,
    }));

    let venta = buscar_venta(&state, id).await?;
    let cliente = cargar_cliente(&state, venta.cliente_id).await?;
    let detalles = cargar_detalles(&state, id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::con_mensaje(
            "Venta registrada correctamente",
            VentaResource::con_relaciones(&venta, cliente.as_ref(), Some(&detalles)),
        )),
    ))
}

/// Actualizar la cabecera de una venta aún editable. Los detalles y los
/// importes son inmutables después de la creación.
pub async fn actualizar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<VentaUpdatePayload>,
) -> Result<Json<ApiResponse<VentaResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let venta = buscar_venta(&state, id).await?;

    if !venta.puede_editarse() {
        return Err(ApiError::Authorization("La venta ya no puede modificarse".into()));
    }

    let mut errores = ValidationErrors::new();

    let tipo_comprobante = match payload.tipo_comprobante.as_deref() {
        None => venta.tipo_comprobante.clone(),
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
        None => venta.fecha_vencimiento.clone(),
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
        .or(venta.numero_comprobante.clone());
    let observaciones = payload.observaciones.clone().or(venta.observaciones.clone());

    sqlx::query(
        "UPDATE ventas SET tipo_comprobante = ?, numero_comprobante = ?,
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

    let venta = buscar_venta(&state, id).await?;
    let cliente = cargar_cliente(&state, venta.cliente_id).await?;
    let detalles = cargar_detalles(&state, id).await?;

    Ok(Json(ApiResponse::con_mensaje(
        "Venta actualizada correctamente",
        VentaResource::con_relaciones(&venta, cliente.as_ref(), Some(&detalles)),
    )))
}

/// Anular una venta: repone el stock de cada línea y devuelve el crédito
/// consumido en ventas a crédito.
pub async fn anular(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<VentaResource>>, ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;

    let venta = buscar_venta(&state, id).await?;

    if venta.estado == ESTADO_ANULADA {
        return Err(ApiError::Conflict("La venta ya está anulada".into()));
    }

    let mut tx = state.db.begin().await?;

    sqlx::query(
        "UPDATE ventas SET estado = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(ESTADO_ANULADA)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let lineas: Vec<(i64, i64)> =
        sqlx::query_as("SELECT producto_id, cantidad FROM venta_detalles WHERE venta_id = ?")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

    for (producto_id, cantidad) in lineas {
        sqlx::query(
            "UPDATE productos SET stock = stock + ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(cantidad)
        .bind(producto_id)
        .execute(&mut *tx)
        .await?;
    }

    if venta.tipo_venta == Venta::TIPO_CREDITO {
        sqlx::query(
            "UPDATE clientes SET credito_disponible = credito_disponible + ?,
             updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(venta.total)
        .bind(venta.cliente_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    log_info!("VENTAS", "Venta anulada", serde_json::json!({
        "id": id,
        "user_id": ctx.user_id,
    }));

    let venta = buscar_venta(&state, id).await?;
    let cliente = cargar_cliente(&state, venta.cliente_id).await?;
    let detalles = cargar_detalles(&state, id).await?;

    Ok(Json(ApiResponse::con_mensaje(
        "Venta anulada correctamente",
        VentaResource::con_relaciones(&venta, cliente.as_ref(), Some(&detalles)),
    )))
}
