use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub login_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Almacén en memoria de sesiones activas, indexado por token bearer.
pub struct SessionStore {
    sessions: HashMap<String, SessionData>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    /// Crea una sesión nueva y devuelve su token (UUID v4).
    pub fn create(&mut self, user_id: i64, name: String, email: String) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        self.sessions.insert(
            token.clone(),
            SessionData {
                user_id,
                name,
                email,
                login_at: now,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Valida un token: debe existir y no estar expirado.
    pub fn validate(&self, token: &str) -> Result<&SessionData, String> {
        match self.sessions.get(token) {
            None => Err("Sesión no válida, inicie sesión nuevamente".into()),
            Some(s) if Utc::now() > s.expires_at => {
                Err("Sesión expirada, inicie sesión nuevamente".into())
            }
            Some(s) => Ok(s),
        }
    }

    /// Elimina la sesión (logout). Idempotente.
    pub fn destroy(&mut self, token: &str) {
        self.sessions.remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(Duration::hours(8))
    }

    #[test]
    fn crear_y_validar_sesion() {
        let mut store = store();
        let token = store.create(1, "Ana".into(), "ana@example.com".into());

        let sesion = store.validate(&token).expect("sesión válida");
        assert_eq!(sesion.user_id, 1);
        assert_eq!(sesion.email, "ana@example.com");
    }

    #[test]
    fn token_desconocido_es_invalido() {
        let store = store();
        assert!(store.validate("no-existe").is_err());
    }

    #[test]
    fn sesion_expirada_es_invalida() {
        let mut store = SessionStore::new(Duration::minutes(-1));
        let token = store.create(1, "Ana".into(), "ana@example.com".into());
        assert!(store.validate(&token).is_err());
    }

    #[test]
    fn destroy_invalida_el_token() {
        let mut store = store();
        let token = store.create(1, "Ana".into(), "ana@example.com".into());
        store.destroy(&token);
        assert!(store.validate(&token).is_err());
    }

    #[test]
    fn tokens_son_unicos() {
        let mut store = store();
        let a = store.create(1, "Ana".into(), "ana@example.com".into());
        let b = store.create(1, "Ana".into(), "ana@example.com".into());
        assert_ne!(a, b);
    }
}
