use serde::Serialize;

use crate::models::cliente::ClienteConPersona;

#[derive(Debug, Serialize)]
pub struct ClienteResource {
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

impl ClienteResource {
    pub fn new(cliente: &ClienteConPersona) -> Self {
        Self {
            id: cliente.id,
            codigo: cliente.codigo.clone(),
            nombre: cliente.nombre_display(),
            telefono: cliente.telefono.clone(),
            email: cliente.email.clone(),
            dias_credito: cliente.dias_credito,
            credito_disponible: cliente.credito_disponible,
            estado: cliente.estado,
        }
    }
}
