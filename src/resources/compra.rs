use serde::Serialize;

use super::{iso8601, ProveedorResource};
use crate::models::compra::{Compra, DetalleCompraConProducto};
use crate::models::proveedor::ProveedorConPersona;

#[derive(Debug, Serialize)]
pub struct CompraResource {
    pub id: i64,
    pub codigo: String,
    /// Solo presente si la relación fue cargada por quien consulta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proveedor: Option<ProveedorResource>,
    pub tipo_compra: String,
    pub tipo_comprobante: String,
    pub numero_comprobante: Option<String>,
    pub fecha_compra: String,
    pub fecha_vencimiento: Option<String>,
    pub porcentaje_impuesto: f64,
    pub porcentaje_descuento: f64,
    pub total: f64,
    pub estado: String,
    pub observaciones: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detalles: Option<Vec<DetalleCompraResource>>,
    pub can_edit: bool,
    pub created_at: Option<String>,
}

impl CompraResource {
    pub fn new(compra: &Compra) -> Self {
        Self::con_relaciones(compra, None, None)
    }

    pub fn con_relaciones(
        compra: &Compra,
        proveedor: Option<&ProveedorConPersona>,
        detalles: Option<&[DetalleCompraConProducto]>,
    ) -> Self {
        Self {
            id: compra.id,
            codigo: compra.codigo.clone(),
            proveedor: proveedor.map(ProveedorResource::new),
            tipo_compra: compra.tipo_compra.clone(),
            tipo_comprobante: compra.tipo_comprobante.clone(),
            numero_comprobante: compra.numero_comprobante.clone(),
            fecha_compra: compra.fecha_compra.clone(),
            fecha_vencimiento: compra.fecha_vencimiento.clone(),
            porcentaje_impuesto: compra.porcentaje_impuesto,
            porcentaje_descuento: compra.porcentaje_descuento,
            total: compra.total,
            estado: compra.estado.clone(),
            observaciones: compra.observaciones.clone(),
            detalles: detalles.map(|d| d.iter().map(DetalleCompraResource::new).collect()),
            can_edit: compra.puede_editarse(),
            created_at: iso8601(&compra.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetalleCompraResource {
    pub id: i64,
    pub producto_id: i64,
    pub producto_nombre: Option<String>,
    pub cantidad: i64,
    pub precio_unitario: f64,
    pub porcentaje_descuento: f64,
    pub descuento: f64,
    pub subtotal: f64,
    pub total: f64,
}

impl DetalleCompraResource {
    pub fn new(detalle: &DetalleCompraConProducto) -> Self {
        Self {
            id: detalle.id,
            producto_id: detalle.producto_id,
            producto_nombre: detalle.producto_nombre.clone(),
            cantidad: detalle.cantidad,
            precio_unitario: detalle.precio_unitario,
            porcentaje_descuento: detalle.porcentaje_descuento,
            descuento: detalle.descuento,
            subtotal: detalle.subtotal,
            total: detalle.total,
        }
    }
}
