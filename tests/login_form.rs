//! Tests del componente de login contra el servidor real.

mod common;

use common::*;
use sistema_ventas::client::login::{
    LoginForm, ETIQUETA_CARGANDO, ETIQUETA_ENVIAR, MENSAJE_CONEXION,
};

/// Levanta el servidor sobre un puerto efímero y devuelve su URL base.
async fn servir_app() -> (String, std::sync::Arc<sistema_ventas::AppState>) {
    let (app, state) = setup_app().await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

#[tokio::test]
async fn login_exitoso_entrega_el_usuario_al_callback() {
    let (base_url, state) = servir_app().await;
    crear_usuario(&state, "test@example.com", "password123", true).await;

    let mut form = LoginForm::new(&base_url).unwrap();
    form.email = "test@example.com".into();
    form.password = "password123".into();

    let mut recibido = None;
    let exito = form.enviar(|user| recibido = Some(user.clone())).await;

    let exito = exito.expect("el login debió ser exitoso");
    assert!(!exito.token.is_empty());

    let recibido = recibido.expect("el callback debió recibir el usuario");
    assert_eq!(recibido.email, "test@example.com");
    assert_eq!(recibido.name, "Usuario de Prueba");

    assert_eq!(form.error(), None);
    assert!(!form.boton_deshabilitado());
    assert_eq!(form.etiqueta_boton(), ETIQUETA_ENVIAR);

    // El token emitido sirve para consumir la API protegida.
    let cliente = reqwest::Client::new();
    let respuesta = cliente
        .get(format!("{}/api/v1/auth/user", base_url))
        .header("Authorization", format!("Bearer {}", exito.token))
        .send()
        .await
        .unwrap();
    assert_eq!(respuesta.status().as_u16(), 200);
}

#[tokio::test]
async fn credenciales_rechazadas_muestran_el_mensaje_del_servidor() {
    let (base_url, state) = servir_app().await;
    crear_usuario(&state, "test@example.com", "password123", true).await;

    let mut form = LoginForm::new(&base_url).unwrap();
    form.email = "test@example.com".into();
    form.password = "wrongpassword".into();

    let exito = form.enviar(|_| {}).await;

    assert!(exito.is_none());
    assert_eq!(form.error(), Some("Credenciales incorrectas"));
    // El control se rehabilita tras el rechazo.
    assert!(!form.boton_deshabilitado());
    assert_eq!(form.etiqueta_boton(), ETIQUETA_ENVIAR);
}

#[tokio::test]
async fn cuenta_inactiva_muestra_el_texto_exacto_del_servidor() {
    let (base_url, state) = servir_app().await;
    crear_usuario(&state, "inactive@example.com", "password123", false).await;

    let mut form = LoginForm::new(&base_url).unwrap();
    form.email = "inactive@example.com".into();
    form.password = "password123".into();

    let mut llamado = false;
    let exito = form.enviar(|_| llamado = true).await;

    assert!(exito.is_none());
    assert!(!llamado, "el callback no debe dispararse en un rechazo");
    assert_eq!(
        form.error(),
        Some("Su cuenta está inactiva. Contacte al administrador.")
    );
    assert!(!form.boton_deshabilitado());
}

#[tokio::test]
async fn fallo_de_red_muestra_el_mensaje_generico() {
    // Puerto reservado y liberado: nadie escucha ahí.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut form = LoginForm::new(format!("http://{}", addr)).unwrap();
    form.email = "test@example.com".into();
    form.password = "password123".into();

    let exito = form.enviar(|_| {}).await;

    assert!(exito.is_none());
    assert_eq!(form.error(), Some(MENSAJE_CONEXION));
    assert!(!form.boton_deshabilitado());
}

#[tokio::test]
async fn errores_de_validacion_422_muestran_el_mensaje_generico() {
    let (base_url, _state) = servir_app().await;

    let mut form = LoginForm::new(&base_url).unwrap();
    // Sin credenciales: el servidor responde 422, que no es un estado
    // con mensaje propio en el componente.
    let exito = form.enviar(|_| {}).await;

    assert!(exito.is_none());
    assert_eq!(form.error(), Some(MENSAJE_CONEXION));
}

#[tokio::test]
async fn etiqueta_de_carga_definida() {
    assert_eq!(ETIQUETA_CARGANDO, "Ingresando...");
    assert_eq!(ETIQUETA_ENVIAR, "Iniciar Sesión");
}
