//! Componente de formulario de login.
//!
//! Modela el contrato del formulario del frontend: un único envío en
//! vuelo a la vez, botón deshabilitado con etiqueta de carga mientras la
//! petición está pendiente, y mapeo de errores por código de estado. En
//! caso de éxito entrega el usuario autenticado al callback del llamador;
//! no gestiona navegación ni almacenamiento.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

pub const ETIQUETA_ENVIAR: &str = "Iniciar Sesión";
pub const ETIQUETA_CARGANDO: &str = "Ingresando...";

pub const MENSAJE_CREDENCIALES: &str = "Credenciales incorrectas";
pub const MENSAJE_CUENTA_INACTIVA: &str = "Su cuenta está inactiva. Contacte al administrador.";
pub const MENSAJE_CONEXION: &str = "Error de conexión. Intente nuevamente.";

/// Usuario autenticado entregado al llamador tras un login exitoso.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UsuarioAutenticado {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
    user: UsuarioAutenticado,
}

#[derive(Debug, Deserialize)]
struct RespuestaLogin {
    data: LoginData,
}

#[derive(Debug, Deserialize)]
struct RespuestaError {
    message: Option<String>,
}

/// Cliente HTTP con timeouts explícitos, reutilizado entre envíos.
fn http_client() -> Result<Client, String> {
    Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| format!("No se pudo crear el cliente HTTP: {}", e))
}

/// Resultado de un login exitoso: el token emitido y el usuario.
#[derive(Debug, Clone)]
pub struct LoginExitoso {
    pub token: String,
    pub user: UsuarioAutenticado,
}

pub struct LoginForm {
    pub email: String,
    pub password: String,
    base_url: String,
    client: Client,
    enviando: bool,
    error: Option<String>,
}

impl LoginForm {
    pub fn new(base_url: impl Into<String>) -> Result<Self, String> {
        Ok(Self {
            email: String::new(),
            password: String::new(),
            base_url: base_url.into(),
            client: http_client()?,
            enviando: false,
            error: None,
        })
    }

    /// El control de envío está deshabilitado solo mientras hay una
    /// petición en vuelo.
    pub fn boton_deshabilitado(&self) -> bool {
        self.enviando
    }

    /// Etiqueta del botón según el estado de carga.
    pub fn etiqueta_boton(&self) -> &'static str {
        if self.enviando {
            ETIQUETA_CARGANDO
        } else {
            ETIQUETA_ENVIAR
        }
    }

    /// Mensaje de error visible, si el último envío falló.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Marca el inicio de un envío. Falla si ya hay uno en vuelo: el
    /// componente admite una sola petición pendiente.
    fn comenzar_envio(&mut self) -> Result<(), ()> {
        if self.enviando {
            return Err(());
        }
        self.enviando = true;
        self.error = None;
        Ok(())
    }

    /// Resuelve el envío: rehabilita el control y fija el error si lo hubo.
    fn resolver(&mut self, resultado: Result<LoginExitoso, String>) -> Option<LoginExitoso> {
        self.enviando = false;
        match resultado {
            Ok(exito) => {
                self.error = None;
                Some(exito)
            }
            Err(mensaje) => {
                self.error = Some(mensaje);
                None
            }
        }
    }

    /// Envía las credenciales. Devuelve el resultado y además lo entrega
    /// al callback en caso de éxito. Un envío con otro ya en vuelo no hace
    /// nada y devuelve None.
    pub async fn enviar<F>(&mut self, mut on_success: F) -> Option<LoginExitoso>
    where
        F: FnMut(&UsuarioAutenticado),
    {
        if self.comenzar_envio().is_err() {
            return None;
        }

        let resultado = solicitar_login(
            &self.client,
            &self.base_url,
            &self.email,
            &self.password,
        )
        .await;

        let exito = self.resolver(resultado);

        if let Some(exito) = &exito {
            on_success(&exito.user);
        }

        exito
    }
}

/// Mapea el desenlace HTTP a un mensaje visible. 401 y 403 muestran el
/// mensaje del servidor; cualquier otro fallo muestra el genérico.
pub fn mapear_error(status: u16, mensaje_servidor: Option<String>) -> String {
    match status {
        401 => mensaje_servidor.unwrap_or_else(|| MENSAJE_CREDENCIALES.to_string()),
        403 => mensaje_servidor.unwrap_or_else(|| MENSAJE_CUENTA_INACTIVA.to_string()),
        _ => MENSAJE_CONEXION.to_string(),
    }
}

async fn solicitar_login(
    client: &Client,
    base_url: &str,
    email: &str,
    password: &str,
) -> Result<LoginExitoso, String> {
    let respuesta = client
        .post(format!("{}/api/v1/auth/login", base_url))
        .json(&serde_json::json!({
            "email": email,
            "password": password,
        }))
        .send()
        .await;

    let respuesta = match respuesta {
        Ok(r) => r,
        Err(_) => return Err(MENSAJE_CONEXION.to_string()),
    };

    let status = respuesta.status().as_u16();

    if status == 200 {
        let cuerpo: RespuestaLogin = respuesta
            .json()
            .await
            .map_err(|_| MENSAJE_CONEXION.to_string())?;

        return Ok(LoginExitoso {
            token: cuerpo.data.token,
            user: cuerpo.data.user,
        });
    }

    let mensaje = respuesta
        .json::<RespuestaError>()
        .await
        .ok()
        .and_then(|r| r.message);

    Err(mapear_error(status, mensaje))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etiqueta_segun_estado() {
        let mut form = LoginForm::new("http://localhost").unwrap();
        assert_eq!(form.etiqueta_boton(), ETIQUETA_ENVIAR);
        assert!(!form.boton_deshabilitado());

        form.comenzar_envio().unwrap();
        assert_eq!(form.etiqueta_boton(), ETIQUETA_CARGANDO);
        assert!(form.boton_deshabilitado());
    }

    #[test]
    fn un_solo_envio_en_vuelo() {
        let mut form = LoginForm::new("http://localhost").unwrap();
        assert!(form.comenzar_envio().is_ok());
        assert!(form.comenzar_envio().is_err());
    }

    #[test]
    fn resolver_rehabilita_el_control() {
        let mut form = LoginForm::new("http://localhost").unwrap();
        form.comenzar_envio().unwrap();

        form.resolver(Err("Credenciales incorrectas".into()));

        assert!(!form.boton_deshabilitado());
        assert_eq!(form.error(), Some("Credenciales incorrectas"));
    }

    #[test]
    fn resolver_exitoso_limpia_el_error() {
        let mut form = LoginForm::new("http://localhost").unwrap();
        form.comenzar_envio().unwrap();
        form.resolver(Err("fallo".into()));

        form.comenzar_envio().unwrap();
        let exito = form.resolver(Ok(LoginExitoso {
            token: "t".into(),
            user: UsuarioAutenticado {
                id: 1,
                name: "Ana".into(),
                email: "ana@example.com".into(),
            },
        }));

        assert!(exito.is_some());
        assert_eq!(form.error(), None);
    }

    #[test]
    fn mapeo_de_errores_por_status() {
        // 401 y 403 toman el mensaje del payload del servidor.
        assert_eq!(
            mapear_error(401, Some("Credenciales incorrectas".into())),
            "Credenciales incorrectas"
        );
        assert_eq!(
            mapear_error(403, Some("Su cuenta está inactiva. Contacte al administrador.".into())),
            "Su cuenta está inactiva. Contacte al administrador."
        );
        // Sin payload caen a los textos por defecto.
        assert_eq!(mapear_error(401, None), MENSAJE_CREDENCIALES);
        assert_eq!(mapear_error(403, None), MENSAJE_CUENTA_INACTIVA);
        // Cualquier otro fallo muestra el genérico.
        assert_eq!(mapear_error(500, Some("boom".into())), MENSAJE_CONEXION);
        assert_eq!(mapear_error(0, None), MENSAJE_CONEXION);
    }
}
