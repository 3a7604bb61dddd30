use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::auth::guard;
use crate::errors::{ApiError, ValidationErrors};
use crate::models::categoria::Categoria;
use crate::models::producto::{Producto, ProductoFiltro, ProductoPayload};
use crate::resources::{ApiResponse, ProductoResource, ResourceCollection};
use crate::validation;
use crate::{log_info, AppState};

/// Campos validados de un payload de producto.
struct ProductoValidado {
    nombre: String,
    descripcion: Option<String>,
    categoria_id: Option<i64>,
    precio_compra: f64,
    precio_venta: f64,
    stock: i64,
    stock_minimo: i64,
    unidad_medida: String,
    imagen: Option<String>,
    estado: bool,
}

async fn validar_payload(
    state: &AppState,
    payload: &ProductoPayload,
) -> Result<ProductoValidado, ApiError> {
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

    let precio_venta = match payload.precio_venta {
        None => {
            errores.agregar("precio_venta", "El campo precio_venta es obligatorio");
            0.0
        }
        Some(precio) => {
            if let Err(msg) = validation::validar_monto(precio) {
                errores.agregar("precio_venta", msg);
            }
            precio
        }
    };

    let precio_compra = payload.precio_compra.unwrap_or(0.0);
    if let Err(msg) = validation::validar_monto(precio_compra) {
        errores.agregar("precio_compra", msg);
    }

    let stock = payload.stock.unwrap_or(0);
    if let Err(msg) = validation::validar_stock(stock) {
        errores.agregar("stock", msg);
    }

    let stock_minimo = payload.stock_minimo.unwrap_or(0);
    if let Err(msg) = validation::validar_stock(stock_minimo) {
        errores.agregar("stock_minimo", msg);
    }

    // La categoría, si viene, debe existir.
    if let Some(categoria_id) = payload.categoria_id {
        let existe: Option<(i64,)> = sqlx::query_as("SELECT id FROM categorias WHERE id = ?")
            .bind(categoria_id)
            .fetch_optional(&state.db)
            .await?;

        if existe.is_none() {
            errores.agregar("categoria_id", "La categoría indicada no existe");
        }
    }

    errores.into_result()?;

    Ok(ProductoValidado {
        nombre,
        descripcion: payload.descripcion.clone(),
        categoria_id: payload.categoria_id,
        precio_compra,
        precio_venta,
        stock,
        stock_minimo,
        unidad_medida: payload
            .unidad_medida
            .clone()
            .unwrap_or_else(|| "UNIDAD".to_string()),
        imagen: payload.imagen.clone(),
        estado: payload.estado.unwrap_or(true),
    })
}

async fn buscar_producto(state: &AppState, id: i64) -> Result<Producto, ApiError> {
    sqlx::query_as::<_, Producto>("SELECT * FROM productos WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Producto no encontrado".into()))
}

/// Listar productos con filtros combinables: búsqueda, categoría,
/// estado y stock bajo.
pub async fn listar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(filtro): Query<ProductoFiltro>,
) -> Result<Json<ApiResponse<ResourceCollection<ProductoResource>>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let mut sql = String::from("SELECT * FROM productos WHERE 1=1");

    match filtro.estado {
        Some(true) => {
            sql.push_str(" AND ");
            sql.push_str(Producto::SCOPE_ACTIVOS);
        }
        Some(false) => {
            sql.push_str(" AND ");
            sql.push_str(Producto::SCOPE_INACTIVOS);
        }
        None => {}
    }

    if filtro.stock_bajo == Some(true) {
        sql.push_str(" AND ");
        sql.push_str(Producto::SCOPE_STOCK_BAJO);
    }

    if filtro.categoria_id.is_some() {
        sql.push_str(" AND categoria_id = ?");
    }

    let buscar = filtro
        .buscar
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()));

    if buscar.is_some() {
        sql.push_str(" AND (LOWER(nombre) LIKE ? OR LOWER(codigo) LIKE ?)");
    }

    sql.push_str(" ORDER BY nombre ASC");

    let mut query = sqlx::query_as::<_, Producto>(&sql);

    if let Some(categoria_id) = filtro.categoria_id {
        query = query.bind(categoria_id);
    }

    if let Some(termino) = &buscar {
        query = query.bind(termino.clone()).bind(termino.clone());
    }

    let productos = query.fetch_all(&state.db).await?;

    let recursos = productos.iter().map(ProductoResource::new).collect();

    Ok(Json(ApiResponse::ok(ResourceCollection::new(recursos))))
}

/// Productos activos en o por debajo del stock mínimo.
pub async fn stock_bajo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<ResourceCollection<ProductoResource>>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let sql = format!(
        "SELECT * FROM productos WHERE {} AND {} ORDER BY stock ASC",
        Producto::SCOPE_ACTIVOS,
        Producto::SCOPE_STOCK_BAJO,
    );

    let productos = sqlx::query_as::<_, Producto>(&sql)
        .fetch_all(&state.db)
        .await?;

    let recursos = productos.iter().map(ProductoResource::new).collect();

    Ok(Json(ApiResponse::ok(ResourceCollection::new(recursos))))
}

/// Ver un producto con su categoría cargada.
pub async fn mostrar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductoResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    let producto = buscar_producto(&state, id).await?;

    let categoria = match producto.categoria_id {
        Some(categoria_id) => {
            sqlx::query_as::<_, Categoria>("SELECT * FROM categorias WHERE id = ?")
                .bind(categoria_id)
                .fetch_optional(&state.db)
                .await?
        }
        None => None,
    };

    Ok(Json(ApiResponse::ok(ProductoResource::con_categoria(
        &producto,
        categoria.as_ref(),
    ))))
}

/// Crear producto. El código se genera en secuencia (PROD000001, ...);
/// ante un choque concurrente del UNIQUE se reintenta con el siguiente.
pub async fn crear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ProductoPayload>,
) -> Result<(StatusCode, Json<ApiResponse<ProductoResource>>), ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;

    let datos = validar_payload(&state, &payload).await?;

    let mut intentos = 0;
    let id = loop {
        let codigo = Producto::generar_codigo(&state.db).await?;

        let result = sqlx::query(
            "INSERT INTO productos (codigo, nombre, descripcion, categoria_id, precio_compra,
             precio_venta, stock, stock_minimo, unidad_medida, imagen, estado)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&codigo)
        .bind(&datos.nombre)
        .bind(&datos.descripcion)
        .bind(datos.categoria_id)
        .bind(datos.precio_compra)
        .bind(datos.precio_venta)
        .bind(datos.stock)
        .bind(datos.stock_minimo)
        .bind(&datos.unidad_medida)
        .bind(&datos.imagen)
        .bind(datos.estado)
        .execute(&state.db)
        .await;

        match result {
            Ok(res) => break res.last_insert_rowid(),
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

    log_info!("PRODUCTOS", "Producto creado", serde_json::json!({
        "id": id,
        "user_id": ctx.user_id,
    }));

    let producto = buscar_producto(&state, id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::con_mensaje(
            "Producto creado correctamente",
            ProductoResource::new(&producto),
        )),
    ))
}

/// Actualizar producto. El código de negocio no se modifica.
pub async fn actualizar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<ProductoPayload>,
) -> Result<Json<ApiResponse<ProductoResource>>, ApiError> {
    guard::authenticate(&state, &headers)?;

    buscar_producto(&state, id).await?;

    let datos = validar_payload(&state, &payload).await?;

    sqlx::query(
        "UPDATE productos SET nombre = ?, descripcion = ?, categoria_id = ?, precio_compra = ?,
         precio_venta = ?, stock = ?, stock_minimo = ?, unidad_medida = ?, imagen = ?,
         estado = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(&datos.nombre)
    .bind(&datos.descripcion)
    .bind(datos.categoria_id)
    .bind(datos.precio_compra)
    .bind(datos.precio_venta)
    .bind(datos.stock)
    .bind(datos.stock_minimo)
    .bind(&datos.unidad_medida)
    .bind(&datos.imagen)
    .bind(datos.estado)
    .bind(id)
    .execute(&state.db)
    .await?;

    let producto = buscar_producto(&state, id).await?;

    Ok(Json(ApiResponse::con_mensaje(
        "Producto actualizado correctamente",
        ProductoResource::new(&producto),
    )))
}

/// Eliminar producto (borrado físico). Un producto con movimientos queda
/// protegido por las claves foráneas y responde conflicto.
pub async fn eliminar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;

    let result = sqlx::query("DELETE FROM productos WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await;

    match result {
        Ok(res) if res.rows_affected() == 0 => {
            return Err(ApiError::NotFound("Producto no encontrado".into()));
        }
        Ok(_) => {}
        Err(sqlx::Error::Database(err)) if err.is_foreign_key_violation() => {
            return Err(ApiError::Conflict(
                "No se puede eliminar un producto con movimientos asociados".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    log_info!("PRODUCTOS", "Producto eliminado", serde_json::json!({
        "id": id,
        "user_id": ctx.user_id,
    }));

    Ok(Json(ApiResponse::con_mensaje(
        "Producto eliminado correctamente",
        serde_json::Value::Null,
    )))
}
