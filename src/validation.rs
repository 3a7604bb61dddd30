//! Validación de entrada.
//!
//! Funciones por campo que devuelven `Result<(), String>` con el mensaje
//! de error; los handlers las acumulan en un `ValidationErrors` para
//! responder 422 con detalle por campo.

use chrono::NaiveDate;

pub type ValidationResult = Result<(), String>;

/// Valida formato de email (chequeo básico local@dominio.tld).
pub fn validar_email(email: &str) -> ValidationResult {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err("El email no puede estar vacío".into());
    }

    if trimmed.len() > 254 {
        return Err("El email es demasiado largo (máximo 254 caracteres)".into());
    }

    let partes: Vec<&str> = trimmed.split('@').collect();
    if partes.len() != 2 {
        return Err("El formato del email no es válido".into());
    }

    let (local, dominio) = (partes[0], partes[1]);

    if local.is_empty() || local.len() > 64 {
        return Err("El formato del email no es válido".into());
    }

    if !dominio.contains('.') {
        return Err("El dominio del email no es válido".into());
    }

    Ok(())
}

/// Valida un nombre genérico (2-150 caracteres).
pub fn validar_nombre(nombre: &str) -> ValidationResult {
    let trimmed = nombre.trim();

    if trimmed.is_empty() {
        return Err("El nombre no puede estar vacío".into());
    }

    if trimmed.len() < 2 || trimmed.len() > 150 {
        return Err("El nombre debe tener entre 2 y 150 caracteres".into());
    }

    Ok(())
}

/// Valida un teléfono: 6-15 dígitos, separadores permitidos.
pub fn validar_telefono(telefono: &str) -> ValidationResult {
    let digitos: String = telefono.chars().filter(|c| c.is_numeric()).collect();

    if digitos.len() < 6 || digitos.len() > 15 {
        return Err("El teléfono debe tener entre 6 y 15 dígitos".into());
    }

    Ok(())
}

/// Valida fortaleza mínima de password.
pub fn validar_password(password: &str, min_len: usize) -> ValidationResult {
    if password.is_empty() {
        return Err("El password no puede estar vacío".into());
    }

    if password.len() < min_len {
        return Err(format!("El password debe tener al menos {} caracteres", min_len));
    }

    if password.len() > 128 {
        return Err("El password es demasiado largo (máximo 128 caracteres)".into());
    }

    Ok(())
}

/// Valida un monto monetario no negativo y finito.
pub fn validar_monto(monto: f64) -> ValidationResult {
    if monto.is_nan() || monto.is_infinite() {
        return Err("El monto no es válido".into());
    }

    if monto < 0.0 {
        return Err("El monto no puede ser negativo".into());
    }

    if monto > 1_000_000_000.0 {
        return Err("El monto excede el máximo permitido".into());
    }

    Ok(())
}

/// Valida un porcentaje 0-100.
pub fn validar_porcentaje(valor: f64) -> ValidationResult {
    if valor.is_nan() || valor.is_infinite() || !(0.0..=100.0).contains(&valor) {
        return Err("El porcentaje debe estar entre 0 y 100".into());
    }

    Ok(())
}

/// Valida una cantidad entera positiva.
pub fn validar_cantidad(cantidad: i64) -> ValidationResult {
    if cantidad <= 0 {
        return Err("La cantidad debe ser mayor que cero".into());
    }

    if cantidad > 1_000_000 {
        return Err("La cantidad excede el máximo permitido".into());
    }

    Ok(())
}

/// Valida una cantidad de stock no negativa.
pub fn validar_stock(stock: i64) -> ValidationResult {
    if stock < 0 {
        return Err("El stock no puede ser negativo".into());
    }

    Ok(())
}

/// Valida y parsea una fecha en formato YYYY-MM-DD.
pub fn validar_fecha(fecha: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(fecha.trim(), "%Y-%m-%d")
        .map_err(|_| "La fecha debe tener formato YYYY-MM-DD".to_string())
}

/// Valida tipo de documento de identidad.
pub fn validar_tipo_documento(tipo: &str) -> ValidationResult {
    match tipo {
        "DNI" | "RUC" | "CE" | "PASAPORTE" => Ok(()),
        _ => Err("El tipo de documento debe ser DNI, RUC, CE o PASAPORTE".into()),
    }
}

/// Valida calificación de proveedor (1-5).
pub fn validar_calificacion(valor: i64) -> ValidationResult {
    if !(1..=5).contains(&valor) {
        return Err("La calificación debe estar entre 1 y 5".into());
    }

    Ok(())
}

/// Valida observaciones/notas de texto libre.
pub fn validar_observaciones(texto: &str) -> ValidationResult {
    if texto.len() > 500 {
        return Err("Las observaciones son demasiado largas (máximo 500 caracteres)".into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_valido() {
        assert!(validar_email("usuario@example.com").is_ok());
    }

    #[test]
    fn email_invalido() {
        assert!(validar_email("").is_err());
        assert!(validar_email("sin-arroba").is_err());
        assert!(validar_email("doble@@example.com").is_err());
        assert!(validar_email("a@sindominio").is_err());
    }

    #[test]
    fn porcentaje_fuera_de_rango() {
        assert!(validar_porcentaje(0.0).is_ok());
        assert!(validar_porcentaje(100.0).is_ok());
        assert!(validar_porcentaje(-1.0).is_err());
        assert!(validar_porcentaje(100.5).is_err());
        assert!(validar_porcentaje(f64::NAN).is_err());
    }

    #[test]
    fn fecha_formato() {
        assert!(validar_fecha("2026-01-15").is_ok());
        assert!(validar_fecha("15/01/2026").is_err());
        assert!(validar_fecha("2026-13-01").is_err());
    }

    #[test]
    fn cantidad_positiva() {
        assert!(validar_cantidad(1).is_ok());
        assert!(validar_cantidad(0).is_err());
        assert!(validar_cantidad(-3).is_err());
    }

    #[test]
    fn password_con_longitud_minima() {
        assert!(validar_password("password123", 8).is_ok());
        assert!(validar_password("corto", 8).is_err());
        assert!(validar_password("", 8).is_err());
    }

    #[test]
    fn tipo_documento_conocido() {
        assert!(validar_tipo_documento("DNI").is_ok());
        assert!(validar_tipo_documento("RUC").is_ok());
        assert!(validar_tipo_documento("OTRO").is_err());
    }
}
