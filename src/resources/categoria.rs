use serde::Serialize;

use super::iso8601;
use crate::models::categoria::Categoria;

#[derive(Debug, Serialize)]
pub struct CategoriaResource {
    pub id: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub estado: bool,
    pub created_at: Option<String>,
}

impl CategoriaResource {
    pub fn new(categoria: &Categoria) -> Self {
        Self {
            id: categoria.id,
            nombre: categoria.nombre.clone(),
            descripcion: categoria.descripcion.clone(),
            estado: categoria.estado,
            created_at: iso8601(&categoria.created_at),
        }
    }
}
