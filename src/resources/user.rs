use serde::Serialize;

use super::iso8601;
use crate::models::user::User;

#[derive(Debug, Serialize)]
pub struct UserResource {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub estado: bool,
    pub last_login_at: Option<String>,
}

impl UserResource {
    pub fn new(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            estado: user.estado,
            last_login_at: iso8601(&user.last_login_at),
        }
    }
}
