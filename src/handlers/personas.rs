//! Datos de persona embebidos en los payloads de clientes y proveedores.

use sqlx::{Sqlite, Transaction};

use crate::errors::{ApiError, ValidationErrors};
use crate::validation;

/// Campos de persona ya validados, listos para insertar/actualizar.
#[derive(Debug, Clone)]
pub struct PersonaDatos {
    pub nombres: Option<String>,
    pub apellidos: Option<String>,
    pub razon_social: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub tipo_documento: String,
    pub numero_documento: String,
}

fn limpiar(valor: &Option<String>) -> Option<String> {
    valor
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Acumula en `errores` los problemas de los campos de persona y devuelve
/// los datos normalizados. Una persona necesita nombres o razón social.
pub fn validar_persona(
    errores: &mut ValidationErrors,
    nombres: &Option<String>,
    apellidos: &Option<String>,
    razon_social: &Option<String>,
    telefono: &Option<String>,
    email: &Option<String>,
    tipo_documento: &Option<String>,
    numero_documento: &Option<String>,
) -> PersonaDatos {
    let nombres = limpiar(nombres);
    let apellidos = limpiar(apellidos);
    let razon_social = limpiar(razon_social);
    let telefono = limpiar(telefono);
    let email = limpiar(email);

    if nombres.is_none() && razon_social.is_none() {
        errores.agregar("nombres", "Debe indicar nombres o razón social");
    }

    if let Some(telefono) = &telefono {
        if let Err(msg) = validation::validar_telefono(telefono) {
            errores.agregar("telefono", msg);
        }
    }

    if let Some(email) = &email {
        if let Err(msg) = validation::validar_email(email) {
            errores.agregar("email", msg);
        }
    }

    let tipo_documento = match limpiar(tipo_documento) {
        None => {
            errores.agregar("tipo_documento", "El campo tipo_documento es obligatorio");
            String::new()
        }
        Some(tipo) => {
            if let Err(msg) = validation::validar_tipo_documento(&tipo) {
                errores.agregar("tipo_documento", msg);
            }
            tipo
        }
    };

    let numero_documento = match limpiar(numero_documento) {
        None => {
            errores.agregar(
                "numero_documento",
                "El campo numero_documento es obligatorio",
            );
            String::new()
        }
        Some(numero) => numero,
    };

    PersonaDatos {
        nombres,
        apellidos,
        razon_social,
        telefono,
        email,
        tipo_documento,
        numero_documento,
    }
}

/// Inserta la persona dentro de la transacción y devuelve su id.
/// Un número de documento repetido responde conflicto.
pub async fn insertar_persona(
    tx: &mut Transaction<'_, Sqlite>,
    datos: &PersonaDatos,
) -> Result<i64, ApiError> {
    let result = sqlx::query(
        "INSERT INTO personas (nombres, apellidos, razon_social, telefono, email,
         tipo_documento, numero_documento)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&datos.nombres)
    .bind(&datos.apellidos)
    .bind(&datos.razon_social)
    .bind(&datos.telefono)
    .bind(&datos.email)
    .bind(&datos.tipo_documento)
    .bind(&datos.numero_documento)
    .execute(&mut **tx)
    .await;

    match result {
        Ok(res) => Ok(res.last_insert_rowid()),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Err(ApiError::Conflict(
            "Ya existe una persona con ese número de documento".into(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Actualiza la persona referenciada dentro de la transacción.
pub async fn actualizar_persona(
    tx: &mut Transaction<'_, Sqlite>,
    persona_id: i64,
    datos: &PersonaDatos,
) -> Result<(), ApiError> {
    let result = sqlx::query(
        "UPDATE personas SET nombres = ?, apellidos = ?, razon_social = ?, telefono = ?,
         email = ?, tipo_documento = ?, numero_documento = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(&datos.nombres)
    .bind(&datos.apellidos)
    .bind(&datos.razon_social)
    .bind(&datos.telefono)
    .bind(&datos.email)
    .bind(&datos.tipo_documento)
    .bind(&datos.numero_documento)
    .bind(persona_id)
    .execute(&mut **tx)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Err(ApiError::Conflict(
            "Ya existe una persona con ese número de documento".into(),
        )),
        Err(e) => Err(e.into()),
    }
}
