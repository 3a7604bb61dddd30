use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::auth::guard;
use crate::errors::{ApiError, ValidationErrors};
use crate::models::user::{AuthUserData, DbUser, LoginPayload, User};
use crate::resources::{ApiResponse, UserResource};
use crate::validation;
use crate::{log_info, log_warn, AppState};

/// Login: valida credenciales, verifica que la cuenta esté activa y emite
/// un token de sesión.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let mut errores = ValidationErrors::new();

    match payload.email.as_deref().map(str::trim) {
        None | Some("") => errores.agregar("email", "El campo email es obligatorio"),
        Some(email) => {
            if let Err(msg) = validation::validar_email(email) {
                errores.agregar("email", msg);
            }
        }
    }

    if payload.password.as_deref().unwrap_or("").is_empty() {
        errores.agregar("password", "El campo password es obligatorio");
    }

    errores.into_result()?;

    let email = payload.email.as_deref().unwrap_or("").trim().to_lowercase();
    let password = payload.password.as_deref().unwrap_or("");

    let user = sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    let user = match user {
        Some(u) => u,
        None => {
            log_warn!("AUTH", "Intento de login con email desconocido");
            return Err(ApiError::Authentication("Credenciales incorrectas".into()));
        }
    };

    let valido = bcrypt::verify(password, &user.password_hash)
        .map_err(|_| ApiError::Internal("No se pudo verificar el password".into()))?;

    if !valido {
        log_warn!("AUTH", "Password incorrecto en login");
        return Err(ApiError::Authentication("Credenciales incorrectas".into()));
    }

    if !user.estado {
        return Err(ApiError::Authorization(
            "Su cuenta está inactiva. Contacte al administrador.".into(),
        ));
    }

    // Registrar último acceso; si falla no bloquea el login.
    sqlx::query("UPDATE users SET last_login_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(user.id)
        .execute(&state.db)
        .await
        .ok();

    let token = state
        .sessions
        .lock()
        .map_err(|_| ApiError::Internal("No se pudo acceder al almacén de sesiones".into()))?
        .create(user.id, user.name.clone(), user.email.clone());

    log_info!("AUTH", "Inicio de sesión", serde_json::json!({
        "user_id": user.id,
    }));

    Ok(Json(ApiResponse::con_mensaje(
        "Inicio de sesión exitoso",
        serde_json::json!({
            "token": token,
            "user": AuthUserData {
                id: user.id,
                name: user.name,
                email: user.email,
            },
        }),
    )))
}

/// Logout: revoca el token presentado. Las siguientes peticiones con él
/// reciben 401.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;
    let token = guard::bearer_token(&headers)?;

    state
        .sessions
        .lock()
        .map_err(|_| ApiError::Internal("No se pudo acceder al almacén de sesiones".into()))?
        .destroy(token);

    log_info!("AUTH", "Cierre de sesión", serde_json::json!({
        "user_id": ctx.user_id,
    }));

    Ok(Json(ApiResponse::con_mensaje(
        "Sesión cerrada correctamente",
        serde_json::Value::Null,
    )))
}

/// Perfil del usuario autenticado.
pub async fn perfil(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<UserResource>>, ApiError> {
    let ctx = guard::authenticate(&state, &headers)?;

    let user = sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE id = ?")
        .bind(ctx.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Usuario no encontrado".into()))?;

    Ok(Json(ApiResponse::ok(UserResource::new(&User::from(user)))))
}
