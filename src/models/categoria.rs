use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Categoria {
    pub id: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub estado: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Categoria {
    pub const SCOPE_ACTIVAS: &'static str = "estado = 1";
    pub const SCOPE_INACTIVAS: &'static str = "estado = 0";
}

/// Filtros de listado de categorías.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CategoriaFiltro {
    pub estado: Option<bool>,
}

/// Payload de creación/actualización de categoría.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CategoriaPayload {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub estado: Option<bool>,
}
