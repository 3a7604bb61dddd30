//! Configuración por entorno.
//!
//! Prioridad de fuentes:
//! 1. Variables de entorno (mayor prioridad)
//! 2. Archivo .env
//! 3. Valores por defecto

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::{env, fs};

/// Modo de ejecución de la aplicación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Lee APP_ENV; por defecto Development.
    pub fn from_env() -> Self {
        match env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()).as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub app_name: String,
    pub version: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Ruta del archivo SQLite (relativa al directorio de datos).
    pub path: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Vigencia de los tokens de sesión, en minutos.
    pub session_timeout_mins: u64,
    pub min_password_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub log_to_file: bool,
    pub log_to_stdout: bool,
    pub json_format: bool,
    pub max_file_size_mb: u64,
    pub max_log_files: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let environment = Environment::from_env();

        Self {
            environment,
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "Sistema de Ventas".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),

            server: ServerConfig {
                host: env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("APP_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8080),
            },

            database: DatabaseConfig {
                path: env::var("DB_PATH").unwrap_or_else(|_| "ventas.db".to_string()),
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DB_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
                connect_timeout_secs: 30,
                idle_timeout_secs: 600,
            },

            security: SecurityConfig {
                session_timeout_mins: env::var("SESSION_TIMEOUT_MINS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(480),
                min_password_length: 8,
            },

            logging: LoggingConfig {
                level: env::var("RUST_LOG").unwrap_or_else(|_| {
                    if environment.is_production() { "warn".to_string() } else { "debug".to_string() }
                }),
                log_to_file: true,
                log_to_stdout: env::var("LOG_TO_STDOUT")
                    .map(|s| s == "true")
                    .unwrap_or(true),
                json_format: environment.is_production(),
                max_file_size_mb: 10,
                max_log_files: 5,
            },
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        Self::default()
    }

    /// Carga variables desde un archivo .env (formato clave=valor) si existe.
    pub fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        let content = fs::read_to_string(path).ok()?;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                env::set_var(key, value);
            }
        }

        Some(Self::default())
    }

    /// Directorio de datos de la aplicación (base de datos y logs).
    pub fn data_dir(&self) -> PathBuf {
        env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"))
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}

static GLOBAL_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Inicializa la configuración global (idempotente).
pub fn init_config() -> &'static AppConfig {
    GLOBAL_CONFIG.get_or_init(AppConfig::load)
}

/// Obtiene la configuración global; debe llamarse después de init_config().
pub fn get_config() -> &'static AppConfig {
    GLOBAL_CONFIG
        .get()
        .expect("Configuración no inicializada. Llamar init_config() primero.")
}
