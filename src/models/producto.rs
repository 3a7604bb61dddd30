use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::{redondear2, siguiente_codigo};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Producto {
    pub id: i64,
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub categoria_id: Option<i64>,
    pub precio_compra: f64,
    pub precio_venta: f64,
    pub stock: i64,
    pub stock_minimo: i64,
    pub unidad_medida: String,
    pub imagen: Option<String>,
    pub estado: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Producto {
    pub const PREFIJO_CODIGO: &'static str = "PROD";

    pub const SCOPE_ACTIVOS: &'static str = "estado = 1";
    pub const SCOPE_INACTIVOS: &'static str = "estado = 0";
    pub const SCOPE_STOCK_BAJO: &'static str = "stock <= stock_minimo";

    /// Margen de utilidad en porcentaje, redondeado a 2 decimales.
    /// Con precio de compra 0 el margen es 0 (no hay base de cálculo).
    pub fn margen_utilidad(&self) -> f64 {
        margen_utilidad(self.precio_compra, self.precio_venta)
    }

    /// Stock en o por debajo del mínimo configurado.
    pub fn tiene_stock_bajo(&self) -> bool {
        self.stock <= self.stock_minimo
    }

    /// Genera el siguiente código de producto leyendo el último emitido.
    /// La unicidad final la da la restricción UNIQUE; el que inserta
    /// reintenta ante un conflicto concurrente.
    pub async fn generar_codigo(pool: &SqlitePool) -> Result<String, sqlx::Error> {
        let ultimo: Option<(String,)> =
            sqlx::query_as("SELECT codigo FROM productos ORDER BY id DESC LIMIT 1")
                .fetch_optional(pool)
                .await?;

        Ok(siguiente_codigo(
            Self::PREFIJO_CODIGO,
            ultimo.as_ref().map(|(c,)| c.as_str()),
        ))
    }
}

pub fn margen_utilidad(precio_compra: f64, precio_venta: f64) -> f64 {
    if precio_compra > 0.0 {
        redondear2(((precio_venta - precio_compra) / precio_compra) * 100.0)
    } else {
        0.0
    }
}

/// Payload de creación de producto.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProductoPayload {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub categoria_id: Option<i64>,
    pub precio_compra: Option<f64>,
    pub precio_venta: Option<f64>,
    pub stock: Option<i64>,
    pub stock_minimo: Option<i64>,
    pub unidad_medida: Option<String>,
    pub imagen: Option<String>,
    pub estado: Option<bool>,
}

/// Filtros de listado de productos.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProductoFiltro {
    pub buscar: Option<String>,
    pub categoria_id: Option<i64>,
    pub estado: Option<bool>,
    pub stock_bajo: Option<bool>,
}
