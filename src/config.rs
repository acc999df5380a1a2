use std::env;
use std::path::PathBuf;

/// Configuración del backend, resuelta desde variables de entorno
/// (con `.env` opcional vía dotenv). Todos los campos tienen default
/// para poder levantar el servidor en desarrollo sin configurar nada.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub db_path: PathBuf,
    pub jwt_secreto: String,
    pub token_ttl_horas: i64,
    /// Clave inicial del admin sembrado cuando la tabla usuarios está vacía.
    pub admin_clave_inicial: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_refresh_token: String,
    pub spreadsheet_id: String,
    /// Rango destino en la planilla, formato A1 (p. ej. "Cargas!A1").
    pub sheet_range: String,
    pub sync_max_reintentos: u32,
    pub sync_delay_inicial_ms: u64,
    pub sync_delay_max_ms: u64,
}

fn var_o(nombre: &str, default: &str) -> String {
    env::var(nombre).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn desde_env() -> Config {
        let _ = dotenv::dotenv();

        Config {
            bind: var_o("SIPIO_BIND", "127.0.0.1:8080"),
            db_path: PathBuf::from(var_o("SIPIO_DB_PATH", "data/sipio.db")),
            jwt_secreto: var_o("SIPIO_JWT_SECRETO", "sipio-dev-secreto"),
            token_ttl_horas: env::var("SIPIO_TOKEN_TTL_HORAS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8),
            admin_clave_inicial: var_o("SIPIO_ADMIN_CLAVE", "cambiar.ya"),
            google_client_id: var_o("GOOGLE_CLIENT_ID", ""),
            google_client_secret: var_o("GOOGLE_CLIENT_SECRET", ""),
            google_refresh_token: var_o("GOOGLE_REFRESH_TOKEN", ""),
            spreadsheet_id: var_o("SIPIO_SPREADSHEET_ID", ""),
            sheet_range: var_o("SIPIO_SHEET_RANGE", "Cargas!A1"),
            sync_max_reintentos: env::var("SIPIO_SYNC_MAX_REINTENTOS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            sync_delay_inicial_ms: env::var("SIPIO_SYNC_DELAY_INICIAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
            sync_delay_max_ms: env::var("SIPIO_SYNC_DELAY_MAX_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10000),
        }
    }

    /// Credenciales mínimas para poder sincronizar contra Sheets.
    pub fn sheets_configurado(&self) -> bool {
        !self.google_client_id.is_empty()
            && !self.google_client_secret.is_empty()
            && !self.google_refresh_token.is_empty()
            && !self.spreadsheet_id.is_empty()
    }
}
