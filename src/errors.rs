use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errores de validación con detalle por campo, para respuestas 422.
#[derive(Debug, Default, Serialize)]
pub struct ValidationErrors {
    #[serde(flatten)]
    errores: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agregar(&mut self, campo: &str, mensaje: impl Into<String>) {
        self.errores
            .entry(campo.to_string())
            .or_default()
            .push(mensaje.into());
    }

    pub fn esta_vacio(&self) -> bool {
        self.errores.is_empty()
    }

    pub fn contiene(&self, campo: &str) -> bool {
        self.errores.contains_key(campo)
    }

    /// Convierte en Err(ApiError::Validation) si hay algún error acumulado.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.esta_vacio() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Los datos proporcionados no son válidos.")]
    Validation(ValidationErrors),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Error de base de datos: {0}")]
    Database(sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return ApiError::NotFound("Registro no encontrado".into());
        }

        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return ApiError::Conflict("El registro ya existe".into());
            }
            if db.is_foreign_key_violation() {
                return ApiError::Conflict("El registro está referenciado por otros datos".into());
            }
        }

        ApiError::Database(err)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Mensaje expuesto al cliente. Los errores internos no filtran detalle.
    fn mensaje_publico(&self) -> String {
        match self {
            ApiError::Database(_) | ApiError::Internal(_) => {
                "Error interno del servidor".to_string()
            }
            otro => otro.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            crate::log_error!("HTTP", "Error interno", self.to_string());
        }

        let body = match &self {
            ApiError::Validation(errores) => serde_json::json!({
                "success": false,
                "message": self.mensaje_publico(),
                "errors": errores,
            }),
            _ => serde_json::json!({
                "success": false,
                "message": self.mensaje_publico(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acumula_errores_por_campo() {
        let mut errores = ValidationErrors::new();
        assert!(errores.esta_vacio());

        errores.agregar("email", "El campo email es obligatorio");
        errores.agregar("email", "El formato no es válido");
        errores.agregar("password", "El campo password es obligatorio");

        assert!(!errores.esta_vacio());
        assert!(errores.contiene("email"));
        assert!(errores.contiene("password"));

        let json = serde_json::to_value(&errores).unwrap();
        assert_eq!(json["email"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn into_result_vacio_es_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn row_not_found_mapea_a_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
