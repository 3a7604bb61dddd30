pub mod categoria;
pub mod cliente;
pub mod compra;
pub mod documento;
pub mod persona;
pub mod producto;
pub mod proveedor;
pub mod user;
pub mod venta;

/// Longitud del prefijo de los códigos de negocio (PROD, CLIE, VENT...).
pub const CODIGO_PREFIJO_LEN: usize = 4;

/// Ancho del sufijo numérico, con relleno de ceros.
pub const CODIGO_ANCHO: usize = 6;

/// Calcula el siguiente código de negocio a partir del último emitido.
///
/// Sin registro previo arranca en 1 (`PROD000001`). El sufijo numérico
/// del último código se incrementa y se rellena a 6 dígitos. La unicidad
/// real la garantiza la restricción UNIQUE de la columna; bajo escrituras
/// concurrentes quien inserta debe reintentar ante el conflicto.
pub fn siguiente_codigo(prefijo: &str, ultimo: Option<&str>) -> String {
    let numero = ultimo
        .and_then(|codigo| codigo.get(CODIGO_PREFIJO_LEN..))
        .and_then(|sufijo| sufijo.parse::<i64>().ok())
        .map(|n| n + 1)
        .unwrap_or(1);

    format!("{}{:0ancho$}", prefijo, numero, ancho = CODIGO_ANCHO)
}

/// Redondeo monetario estándar a 2 decimales.
pub fn redondear2(valor: f64) -> f64 {
    (valor * 100.0).round() / 100.0
}

/// Estado de ciclo de vida de entidades con borrado lógico.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ciclo {
    Activo,
    Eliminado,
}

impl Ciclo {
    pub fn desde_deleted_at(deleted_at: &Option<String>) -> Self {
        if deleted_at.is_some() {
            Ciclo::Eliminado
        } else {
            Ciclo::Activo
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primer_codigo_sin_registros() {
        assert_eq!(siguiente_codigo("PROD", None), "PROD000001");
    }

    #[test]
    fn incrementa_el_ultimo_codigo() {
        assert_eq!(
            siguiente_codigo("PROD", Some("PROD000041")),
            "PROD000042"
        );
    }

    #[test]
    fn codigo_ilegible_arranca_de_nuevo() {
        assert_eq!(siguiente_codigo("CLIE", Some("CLIE-XYZ")), "CLIE000001");
        assert_eq!(siguiente_codigo("CLIE", Some("X")), "CLIE000001");
    }

    #[test]
    fn desborda_el_ancho_sin_truncar() {
        assert_eq!(
            siguiente_codigo("VENT", Some("VENT999999")),
            "VENT1000000"
        );
    }

    #[test]
    fn redondeo_a_dos_decimales() {
        assert_eq!(redondear2(33.333333), 33.33);
        assert_eq!(redondear2(66.666666), 66.67);
        assert_eq!(redondear2(10.0), 10.0);
    }

    #[test]
    fn ciclo_desde_deleted_at() {
        assert_eq!(Ciclo::desde_deleted_at(&None), Ciclo::Activo);
        assert_eq!(
            Ciclo::desde_deleted_at(&Some("2026-01-01 00:00:00".into())),
            Ciclo::Eliminado
        );
    }
}
