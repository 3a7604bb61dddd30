use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::documento::puede_editarse_en;
use super::siguiente_codigo;
use super::venta::DetallePayload;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Compra {
    pub id: i64,
    pub codigo: String,
    pub proveedor_id: i64,
    pub tipo_compra: String,
    pub tipo_comprobante: String,
    pub numero_comprobante: Option<String>,
    pub fecha_compra: String,
    pub fecha_vencimiento: Option<String>,
    pub subtotal: f64,
    pub porcentaje_impuesto: f64,
    pub impuesto: f64,
    pub porcentaje_descuento: f64,
    pub descuento: f64,
    pub total: f64,
    pub estado: String,
    pub observaciones: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DetalleCompra {
    pub id: i64,
    pub compra_id: i64,
    pub producto_id: i64,
    pub cantidad: i64,
    pub precio_unitario: f64,
    pub porcentaje_descuento: f64,
    pub descuento: f64,
    pub subtotal: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DetalleCompraConProducto {
    pub id: i64,
    pub compra_id: i64,
    pub producto_id: i64,
    pub producto_nombre: Option<String>,
    pub cantidad: i64,
    pub precio_unitario: f64,
    pub porcentaje_descuento: f64,
    pub descuento: f64,
    pub subtotal: f64,
    pub total: f64,
}

impl Compra {
    pub const PREFIJO_CODIGO: &'static str = "COMP";

    pub const TIPO_CONTADO: &'static str = "CONTADO";
    pub const TIPO_CREDITO: &'static str = "CREDITO";

    pub fn puede_editarse(&self) -> bool {
        puede_editarse_en(&self.estado, self.created_at.as_deref(), Utc::now())
    }

    pub async fn generar_codigo(pool: &SqlitePool) -> Result<String, sqlx::Error> {
        let ultimo: Option<(String,)> =
            sqlx::query_as("SELECT codigo FROM compras ORDER BY id DESC LIMIT 1")
                .fetch_optional(pool)
                .await?;

        Ok(siguiente_codigo(
            Self::PREFIJO_CODIGO,
            ultimo.as_ref().map(|(c,)| c.as_str()),
        ))
    }
}

/// Filtros de listado de compras.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CompraFiltro {
    pub page: Option<i64>,
    pub proveedor_id: Option<i64>,
    pub estado: Option<String>,
    pub fecha: Option<String>,
}

/// Payload de creación de compra.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CompraPayload {
    pub proveedor_id: Option<i64>,
    pub tipo_compra: Option<String>,
    pub tipo_comprobante: Option<String>,
    pub numero_comprobante: Option<String>,
    pub fecha_compra: Option<String>,
    pub fecha_vencimiento: Option<String>,
    pub porcentaje_impuesto: Option<f64>,
    pub porcentaje_descuento: Option<f64>,
    pub observaciones: Option<String>,
    pub detalles: Option<Vec<DetallePayload>>,
}

/// Payload de actualización de cabecera.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CompraUpdatePayload {
    pub tipo_comprobante: Option<String>,
    pub numero_comprobante: Option<String>,
    pub fecha_vencimiento: Option<String>,
    pub observaciones: Option<String>,
}
