use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::errors::ApiError;
use crate::AppState;

/// Identidad autenticada de la petición en curso. Se pasa explícitamente
/// a quien la necesite; no existe estado de "usuario actual" ambiente.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: i64,
    pub name: String,
    pub email: String,
}

/// Extrae el token bearer del header Authorization.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Authentication("No autenticado".into()))
}

/// Valida la sesión del token bearer y devuelve el contexto autenticado.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, ApiError> {
    let token = bearer_token(headers)?;

    let store = state
        .sessions
        .lock()
        .map_err(|_| ApiError::Internal("No se pudo acceder al almacén de sesiones".into()))?;

    let sesion = store
        .validate(token)
        .map_err(ApiError::Authentication)?;

    Ok(AuthContext {
        user_id: sesion.user_id,
        name: sesion.name.clone(),
        email: sesion.email.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extrae_token_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc-123"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc-123");
    }

    #[test]
    fn header_ausente_es_401() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(ApiError::Authentication(_))
        ));
    }

    #[test]
    fn esquema_distinto_es_401() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());
    }
}
