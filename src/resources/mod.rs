//! Transformadores de recursos: dan forma JSON estable y versionada a los
//! modelos cargados. Nunca disparan consultas; las relaciones anidadas
//! solo se incluyen si quien llama las cargó explícitamente.

pub mod categoria;
pub mod cliente;
pub mod compra;
pub mod producto;
pub mod proveedor;
pub mod user;
pub mod venta;

pub use categoria::CategoriaResource;
pub use cliente::ClienteResource;
pub use compra::{CompraResource, DetalleCompraResource};
pub use producto::ProductoResource;
pub use proveedor::ProveedorResource;
pub use user::UserResource;
pub use venta::{DetalleVentaResource, VentaResource};

use serde::Serialize;

use crate::models::documento::parsear_timestamp;

/// Envoltura estándar de respuestas exitosas: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn con_mensaje(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

/// Colección de recursos, envuelta una vez más bajo `data`.
#[derive(Debug, Serialize)]
pub struct ResourceCollection<T: Serialize> {
    pub data: Vec<T>,
}

impl<T: Serialize> ResourceCollection<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data }
    }
}

/// Colección paginada para listados de documentos.
#[derive(Debug, Serialize)]
pub struct PaginatedCollection<T: Serialize> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Convierte un DATETIME de SQLite a ISO 8601 (`2026-01-06T01:20:53+00:00`).
/// Un valor ilegible pasa sin transformar antes que perderse.
pub fn iso8601(valor: &Option<String>) -> Option<String> {
    valor.as_ref().map(|v| {
        parsear_timestamp(v)
            .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, false))
            .unwrap_or_else(|| v.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso8601_desde_formato_sqlite() {
        assert_eq!(
            iso8601(&Some("2026-01-06 01:20:53".into())),
            Some("2026-01-06T01:20:53+00:00".into())
        );
    }

    #[test]
    fn iso8601_nulo_queda_nulo() {
        assert_eq!(iso8601(&None), None);
    }

    #[test]
    fn envoltura_exitosa() {
        let json = serde_json::to_value(ApiResponse::ok(vec![1, 2, 3])).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"][0], 1);
        assert!(json.get("message").is_none());
    }

    #[test]
    fn coleccion_anida_bajo_data() {
        let json =
            serde_json::to_value(ApiResponse::ok(ResourceCollection::new(vec!["a", "b"]))).unwrap();
        assert_eq!(json["data"]["data"][1], "b");
    }
}
