use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::{redondear2, siguiente_codigo, Ciclo};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Proveedor {
    pub id: i64,
    pub persona_id: i64,
    pub codigo: String,
    pub tipo_proveedor: String,
    pub rubro: Option<String>,
    pub limite_credito: f64,
    pub credito_usado: f64,
    pub dias_credito: i64,
    pub descuento_general: f64,
    pub cuenta_bancaria: Option<String>,
    pub banco: Option<String>,
    pub nombre_contacto: Option<String>,
    pub cargo_contacto: Option<String>,
    pub telefono_contacto: Option<String>,
    pub email_contacto: Option<String>,
    pub observaciones: Option<String>,
    pub fecha_registro: Option<String>,
    pub ultima_compra: Option<String>,
    pub total_compras: f64,
    pub calificacion: i64,
    pub estado: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub deleted_at: Option<String>,
}

/// Proveedor con su persona cargada (resultado de JOIN).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProveedorConPersona {
    pub id: i64,
    pub persona_id: i64,
    pub codigo: String,
    pub tipo_proveedor: String,
    pub rubro: Option<String>,
    pub limite_credito: f64,
    pub credito_usado: f64,
    pub dias_credito: i64,
    pub calificacion: i64,
    pub total_compras: f64,
    pub ultima_compra: Option<String>,
    pub estado: bool,
    pub deleted_at: Option<String>,
    pub nombres: Option<String>,
    pub apellidos: Option<String>,
    pub razon_social: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
}

impl Proveedor {
    pub const PREFIJO_CODIGO: &'static str = "PROV";

    pub const SCOPE_SIN_ELIMINAR: &'static str = "deleted_at IS NULL";

    pub fn ciclo(&self) -> Ciclo {
        Ciclo::desde_deleted_at(&self.deleted_at)
    }

    /// Crédito aún disponible: límite menos lo consumido.
    pub fn credito_disponible(&self) -> f64 {
        credito_disponible(self.limite_credito, self.credito_usado)
    }

    pub async fn generar_codigo(pool: &SqlitePool) -> Result<String, sqlx::Error> {
        let ultimo: Option<(String,)> =
            sqlx::query_as("SELECT codigo FROM proveedores ORDER BY id DESC LIMIT 1")
                .fetch_optional(pool)
                .await?;

        Ok(siguiente_codigo(
            Self::PREFIJO_CODIGO,
            ultimo.as_ref().map(|(c,)| c.as_str()),
        ))
    }
}

impl ProveedorConPersona {
    pub fn nombre_display(&self) -> Option<String> {
        super::persona::nombre_display(&self.nombres, &self.apellidos, &self.razon_social)
    }

    pub fn credito_disponible(&self) -> f64 {
        credito_disponible(self.limite_credito, self.credito_usado)
    }
}

pub fn credito_disponible(limite: f64, usado: f64) -> f64 {
    redondear2(limite - usado)
}

/// Filtros de listado de proveedores.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProveedorFiltro {
    pub buscar: Option<String>,
    pub eliminados: Option<bool>,
}

/// Payload de creación/actualización de proveedor.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProveedorPayload {
    pub nombres: Option<String>,
    pub apellidos: Option<String>,
    pub razon_social: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub tipo_documento: Option<String>,
    pub numero_documento: Option<String>,
    pub tipo_proveedor: Option<String>,
    pub rubro: Option<String>,
    pub limite_credito: Option<f64>,
    pub dias_credito: Option<i64>,
    pub descuento_general: Option<f64>,
    pub cuenta_bancaria: Option<String>,
    pub banco: Option<String>,
    pub nombre_contacto: Option<String>,
    pub cargo_contacto: Option<String>,
    pub telefono_contacto: Option<String>,
    pub email_contacto: Option<String>,
    pub observaciones: Option<String>,
    pub fecha_registro: Option<String>,
    pub calificacion: Option<i64>,
    pub estado: Option<bool>,
}
