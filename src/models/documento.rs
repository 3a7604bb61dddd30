//! Cálculos compartidos por documentos de venta y compra:
//! importes de línea, totales de cabecera y regla de editabilidad.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use super::redondear2;

pub const ESTADO_PENDIENTE: &str = "PENDIENTE";
pub const ESTADO_PAGADA: &str = "PAGADA";
pub const ESTADO_ANULADA: &str = "ANULADA";

/// Ventana desde la creación durante la cual el documento sigue editable.
const HORAS_EDITABLE: i64 = 24;

/// Importes calculados de una línea de detalle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportesLinea {
    pub subtotal: f64,
    pub descuento: f64,
    pub total: f64,
}

/// Totales calculados de la cabecera del documento.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalesDocumento {
    pub subtotal: f64,
    pub descuento: f64,
    pub impuesto: f64,
    pub total: f64,
}

/// Importes de una línea: subtotal = cantidad × precio; el descuento
/// porcentual se aplica sobre el subtotal.
pub fn calcular_linea(cantidad: i64, precio_unitario: f64, porcentaje_descuento: f64) -> ImportesLinea {
    let subtotal = redondear2(cantidad as f64 * precio_unitario);
    let descuento = redondear2(subtotal * porcentaje_descuento / 100.0);
    let total = redondear2(subtotal - descuento);

    ImportesLinea {
        subtotal,
        descuento,
        total,
    }
}

/// Totales de cabecera: el subtotal suma los totales de línea; sobre la
/// base descontada se aplica el impuesto.
pub fn calcular_totales(
    lineas: &[ImportesLinea],
    porcentaje_impuesto: f64,
    porcentaje_descuento: f64,
) -> TotalesDocumento {
    let subtotal = redondear2(lineas.iter().map(|l| l.total).sum());
    let descuento = redondear2(subtotal * porcentaje_descuento / 100.0);
    let base = subtotal - descuento;
    let impuesto = redondear2(base * porcentaje_impuesto / 100.0);
    let total = redondear2(base + impuesto);

    TotalesDocumento {
        subtotal,
        descuento,
        impuesto,
        total,
    }
}

/// Un documento puede editarse mientras sigue PENDIENTE y tiene menos de
/// 24 horas desde su creación.
pub fn puede_editarse_en(estado: &str, created_at: Option<&str>, ahora: DateTime<Utc>) -> bool {
    if estado != ESTADO_PENDIENTE {
        return false;
    }

    match created_at.and_then(parsear_timestamp) {
        Some(creado) => ahora - creado < Duration::hours(HORAS_EDITABLE),
        // Sin timestamp legible no se bloquea la edición de un PENDIENTE.
        None => true,
    }
}

/// Parsea el formato DATETIME de SQLite (`YYYY-MM-DD HH:MM:SS`) como UTC.
pub fn parsear_timestamp(valor: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(valor, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linea_sin_descuento() {
        let linea = calcular_linea(3, 10.0, 0.0);
        assert_eq!(linea.subtotal, 30.0);
        assert_eq!(linea.descuento, 0.0);
        assert_eq!(linea.total, 30.0);
    }

    #[test]
    fn linea_con_descuento_porcentual() {
        let linea = calcular_linea(2, 50.0, 10.0);
        assert_eq!(linea.subtotal, 100.0);
        assert_eq!(linea.descuento, 10.0);
        assert_eq!(linea.total, 90.0);
    }

    #[test]
    fn totales_con_impuesto_y_descuento() {
        let lineas = vec![calcular_linea(2, 50.0, 0.0), calcular_linea(1, 100.0, 10.0)];
        // subtotal = 100 + 90 = 190; descuento 10% = 19; base = 171;
        // impuesto 18% = 30.78; total = 201.78
        let totales = calcular_totales(&lineas, 18.0, 10.0);
        assert_eq!(totales.subtotal, 190.0);
        assert_eq!(totales.descuento, 19.0);
        assert_eq!(totales.impuesto, 30.78);
        assert_eq!(totales.total, 201.78);
    }

    #[test]
    fn totales_sin_lineas() {
        let totales = calcular_totales(&[], 18.0, 0.0);
        assert_eq!(totales.total, 0.0);
    }

    #[test]
    fn editable_recien_creada_pendiente() {
        let ahora = Utc::now();
        let creado = (ahora - Duration::hours(1)).format("%Y-%m-%d %H:%M:%S").to_string();
        assert!(puede_editarse_en(ESTADO_PENDIENTE, Some(&creado), ahora));
    }

    #[test]
    fn no_editable_despues_de_24h() {
        let ahora = Utc::now();
        let creado = (ahora - Duration::hours(25)).format("%Y-%m-%d %H:%M:%S").to_string();
        assert!(!puede_editarse_en(ESTADO_PENDIENTE, Some(&creado), ahora));
    }

    #[test]
    fn no_editable_si_no_esta_pendiente() {
        let ahora = Utc::now();
        let creado = ahora.format("%Y-%m-%d %H:%M:%S").to_string();
        assert!(!puede_editarse_en(ESTADO_ANULADA, Some(&creado), ahora));
        assert!(!puede_editarse_en(ESTADO_PAGADA, Some(&creado), ahora));
    }
}
