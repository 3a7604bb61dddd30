use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::documento::puede_editarse_en;
use super::siguiente_codigo;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Venta {
    pub id: i64,
    pub codigo: String,
    pub cliente_id: i64,
    pub tipo_venta: String,
    pub tipo_comprobante: String,
    pub numero_comprobante: Option<String>,
    pub fecha_venta: String,
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
pub struct DetalleVenta {
    pub id: i64,
    pub venta_id: i64,
    pub producto_id: i64,
    pub cantidad: i64,
    pub precio_unitario: f64,
    pub porcentaje_descuento: f64,
    pub descuento: f64,
    pub subtotal: f64,
    pub total: f64,
}

/// Detalle con el nombre del producto (resultado de JOIN).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DetalleVentaConProducto {
    pub id: i64,
    pub venta_id: i64,
    pub producto_id: i64,
    pub producto_nombre: Option<String>,
    pub cantidad: i64,
    pub precio_unitario: f64,
    pub porcentaje_descuento: f64,
    pub descuento: f64,
    pub subtotal: f64,
    pub total: f64,
}

impl Venta {
    pub const PREFIJO_CODIGO: &'static str = "VENT";

    pub const TIPO_CONTADO: &'static str = "CONTADO";
    pub const TIPO_CREDITO: &'static str = "CREDITO";

    /// Editable mientras está PENDIENTE y con menos de 24 h de antigüedad.
    pub fn puede_editarse(&self) -> bool {
        puede_editarse_en(&self.estado, self.created_at.as_deref(), Utc::now())
    }

    pub async fn generar_codigo(pool: &SqlitePool) -> Result<String, sqlx::Error> {
        let ultimo: Option<(String,)> =
            sqlx::query_as("SELECT codigo FROM ventas ORDER BY id DESC LIMIT 1")
                .fetch_optional(pool)
                .await?;

        Ok(siguiente_codigo(
            Self::PREFIJO_CODIGO,
            ultimo.as_ref().map(|(c,)| c.as_str()),
        ))
    }
}

/// Filtros de listado de ventas.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct VentaFiltro {
    pub page: Option<i64>,
    pub cliente_id: Option<i64>,
    pub estado: Option<String>,
    pub fecha: Option<String>,
}

/// Payload de creación de venta. Los importes se calculan en el servidor.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct VentaPayload {
    pub cliente_id: Option<i64>,
    pub tipo_venta: Option<String>,
    pub tipo_comprobante: Option<String>,
    pub numero_comprobante: Option<String>,
    pub fecha_venta: Option<String>,
    pub fecha_vencimiento: Option<String>,
    pub porcentaje_impuesto: Option<f64>,
    pub porcentaje_descuento: Option<f64>,
    pub observaciones: Option<String>,
    pub detalles: Option<Vec<DetallePayload>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DetallePayload {
    pub producto_id: Option<i64>,
    pub cantidad: Option<i64>,
    pub precio_unitario: Option<f64>,
    pub porcentaje_descuento: Option<f64>,
}

/// Payload de actualización de cabecera (los detalles son inmutables).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct VentaUpdatePayload {
    pub tipo_comprobante: Option<String>,
    pub numero_comprobante: Option<String>,
    pub fecha_vencimiento: Option<String>,
    pub observaciones: Option<String>,
}
