use serde::{Deserialize, Serialize};

/// Identidad compartida por clientes y proveedores: persona natural
/// (nombres/apellidos) o jurídica (razon_social).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Persona {
    pub id: i64,
    pub nombres: Option<String>,
    pub apellidos: Option<String>,
    pub razon_social: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub tipo_documento: String,
    pub numero_documento: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Persona {
    /// Nombre completo de la persona natural, si tiene nombres.
    pub fn nombre_completo(&self) -> Option<String> {
        nombre_completo(&self.nombres, &self.apellidos)
    }

    /// Nombre para mostrar: nombre completo, si no razón social, si no None.
    pub fn nombre_display(&self) -> Option<String> {
        nombre_display(&self.nombres, &self.apellidos, &self.razon_social)
    }
}

pub fn nombre_completo(nombres: &Option<String>, apellidos: &Option<String>) -> Option<String> {
    let nombres = nombres.as_deref().map(str::trim).filter(|s| !s.is_empty())?;

    match apellidos.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(apellidos) => Some(format!("{} {}", nombres, apellidos)),
        None => Some(nombres.to_string()),
    }
}

/// Cadena de respaldo de dos niveles: nombre personal → razón social → None.
pub fn nombre_display(
    nombres: &Option<String>,
    apellidos: &Option<String>,
    razon_social: &Option<String>,
) -> Option<String> {
    nombre_completo(nombres, apellidos).or_else(|| {
        razon_social
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    })
}
