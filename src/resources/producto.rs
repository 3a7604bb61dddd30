use serde::Serialize;

use super::{iso8601, CategoriaResource};
use crate::models::categoria::Categoria;
use crate::models::producto::Producto;

#[derive(Debug, Serialize)]
pub struct ProductoResource {
    pub id: i64,
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub categoria_id: Option<i64>,
    /// Solo presente si la relación fue cargada por quien consulta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoria: Option<CategoriaResource>,
    pub precio_compra: f64,
    pub precio_venta: f64,
    pub margen_utilidad: f64,
    pub stock: i64,
    pub stock_minimo: i64,
    pub tiene_stock_bajo: bool,
    pub unidad_medida: String,
    pub imagen: Option<String>,
    pub imagen_url: Option<String>,
    pub estado: bool,
    pub created_at: Option<String>,
}

impl ProductoResource {
    pub fn new(producto: &Producto) -> Self {
        Self::con_categoria(producto, None)
    }

    pub fn con_categoria(producto: &Producto, categoria: Option<&Categoria>) -> Self {
        Self {
            id: producto.id,
            codigo: producto.codigo.clone(),
            nombre: producto.nombre.clone(),
            descripcion: producto.descripcion.clone(),
            categoria_id: producto.categoria_id,
            categoria: categoria.map(CategoriaResource::new),
            precio_compra: producto.precio_compra,
            precio_venta: producto.precio_venta,
            margen_utilidad: producto.margen_utilidad(),
            stock: producto.stock,
            stock_minimo: producto.stock_minimo,
            tiene_stock_bajo: producto.tiene_stock_bajo(),
            unidad_medida: producto.unidad_medida.clone(),
            imagen: producto.imagen.clone(),
            imagen_url: producto
                .imagen
                .as_ref()
                .map(|img| format!("/storage/{}", img)),
            estado: producto.estado,
            created_at: iso8601(&producto.created_at),
        }
    }
}
