use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::{siguiente_codigo, Ciclo};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cliente {
    pub id: i64,
    pub persona_id: i64,
    pub codigo: String,
    pub dias_credito: i64,
    pub credito_disponible: f64,
    pub estado: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub deleted_at: Option<String>,
}

/// Cliente con su persona cargada (resultado de JOIN).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClienteConPersona {
    pub id: i64,
    pub persona_id: i64,
    pub codigo: String,
    pub dias_credito: i64,
    pub credito_disponible: f64,
    pub estado: bool,
    pub deleted_at: Option<String>,
    pub nombres: Option<String>,
    pub apellidos: Option<String>,
    pub razon_social: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
}

impl Cliente {
    pub const PREFIJO_CODIGO: &'static str = "CLIE";

    pub const SCOPE_SIN_ELIMINAR: &'static str = "deleted_at IS NULL";

    pub fn ciclo(&self) -> Ciclo {
        Ciclo::desde_deleted_at(&self.deleted_at)
    }

    pub async fn generar_codigo(pool: &SqlitePool) -> Result<String, sqlx::Error> {
        let ultimo: Option<(String,)> =
            sqlx::query_as("SELECT codigo FROM clientes ORDER BY id DESC LIMIT 1")
                .fetch_optional(pool)
                .await?;

        Ok(siguiente_codigo(
            Self::PREFIJO_CODIGO,
            ultimo.as_ref().map(|(c,)| c.as_str()),
        ))
    }
}

impl ClienteConPersona {
    /// Nombre para mostrar: nombre personal → razón social → None.
    pub fn nombre_display(&self) -> Option<String> {
        super::persona::nombre_display(&self.nombres, &self.apellidos, &self.razon_social)
    }
}

/// Filtros de listado de clientes.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClienteFiltro {
    pub buscar: Option<String>,
    pub eliminados: Option<bool>,
}

/// Payload de creación/actualización de cliente (datos de persona inline).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClientePayload {
    pub nombres: Option<String>,
    pub apellidos: Option<String>,
    pub razon_social: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub tipo_documento: Option<String>,
    pub numero_documento: Option<String>,
    pub dias_credito: Option<i64>,
    pub credito_disponible: Option<f64>,
    pub estado: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ciclo_segun_deleted_at() {
        let mut cliente = Cliente {
            id: 1,
            persona_id: 1,
            codigo: "CLIE000001".into(),
            dias_credito: 0,
            credito_disponible: 0.0,
            estado: true,
            created_at: None,
            updated_at: None,
            deleted_at: None,
        };

        assert_eq!(cliente.ciclo(), Ciclo::Activo);

        cliente.deleted_at = Some("2026-08-01 10:00:00".into());
        assert_eq!(cliente.ciclo(), Ciclo::Eliminado);
    }
}
