use serde::Serialize;

use super::{iso8601, ClienteResource};
use crate::models::cliente::ClienteConPersona;
use crate::models::venta::{DetalleVentaConProducto, Venta};

#[derive(Debug, Serialize)]
pub struct VentaResource {
    pub id: i64,
    pub codigo: String,
    /// Solo presente si la relación fue cargada por quien consulta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliente: Option<ClienteResource>,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detalles: Option<Vec<DetalleVentaResource>>,
    pub can_edit: bool,
    pub created_at: Option<String>,
}

impl VentaResource {
    pub fn new(venta: &Venta) -> Self {
        Self::con_relaciones(venta, None, None)
    }

    pub fn con_relaciones(
        venta: &Venta,
        cliente: Option<&ClienteConPersona>,
        detalles: Option<&[DetalleVentaConProducto]>,
    ) -> Self {
        Self {
            id: venta.id,
            codigo: venta.codigo.clone(),
            cliente: cliente.map(ClienteResource::new),
            tipo_venta: venta.tipo_venta.clone(),
            tipo_comprobante: venta.tipo_comprobante.clone(),
            numero_comprobante: venta.numero_comprobante.clone(),
            fecha_venta: venta.fecha_venta.clone(),
            fecha_vencimiento: venta.fecha_vencimiento.clone(),
            subtotal: venta.subtotal,
            porcentaje_impuesto: venta.porcentaje_impuesto,
            impuesto: venta.impuesto,
            porcentaje_descuento: venta.porcentaje_descuento,
            descuento: venta.descuento,
            total: venta.total,
            estado: venta.estado.clone(),
            observaciones: venta.observaciones.clone(),
            detalles: detalles.map(|d| d.iter().map(DetalleVentaResource::new).collect()),
            can_edit: venta.puede_editarse(),
            created_at: iso8601(&venta.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetalleVentaResource {
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

impl DetalleVentaResource {
    pub fn new(detalle: &DetalleVentaConProducto) -> Self {
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
