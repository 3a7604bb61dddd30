use serde::Serialize;

use crate::models::proveedor::ProveedorConPersona;

#[derive(Debug, Serialize)]
pub struct ProveedorResource {
    pub id: i64,
    pub codigo: String,
    /// Nombre personal, o razón social, o null.
    pub nombre: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub dias_credito: i64,
    pub credito_disponible: f64,
    pub estado: bool,
}

impl ProveedorResource {
    pub fn new(proveedor: &ProveedorConPersona) -> Self {
        Self {
            id: proveedor.id,
            codigo: proveedor.codigo.clone(),
            nombre: proveedor.nombre_display(),
            telefono: proveedor.telefono.clone(),
            email: proveedor.email.clone(),
            dias_credito: proveedor.dias_credito,
            credito_disponible: proveedor.credito_disponible(),
            estado: proveedor.estado,
        }
    }
}
