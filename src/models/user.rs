use serde::{Deserialize, Serialize};

/// Fila completa de la tabla users — solo para query_as.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub estado: bool,
    pub created_at: Option<String>,
    pub last_login_at: Option<String>,
}

/// Usuario expuesto por la API (sin password_hash).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub estado: bool,
    pub created_at: Option<String>,
    pub last_login_at: Option<String>,
}

impl From<DbUser> for User {
    fn from(u: DbUser) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            estado: u.estado,
            created_at: u.created_at,
            last_login_at: u.last_login_at,
        }
    }
}

/// Datos de usuario dentro de la respuesta de login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUserData {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Payload de login. Campos opcionales para validar presencia a mano
/// y responder 422 con detalle por campo.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}
