use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::errors::{SipioError, SipioResult};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct RespuestaToken {
    access_token: String,
}

/// Canjea el refresh token por un access token de corta vida.
pub async fn obtener_access_token(config: &Config) -> SipioResult<String> {
    let http = reqwest::Client::new();
    let respuesta = http
        .post(TOKEN_URL)
        .form(&[
            ("client_id", config.google_client_id.as_str()),
            ("client_secret", config.google_client_secret.as_str()),
            ("refresh_token", config.google_refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await?;

    let status = respuesta.status();
    if !status.is_success() {
        let cuerpo = respuesta.text().await.unwrap_or_default();
        return Err(SipioError::Sincronizacion(format!(
            "HTTP {}: fallo al refrescar token: {}",
            status.as_u16(),
            cuerpo
        )));
    }

    let token: RespuestaToken = respuesta.json().await?;
    Ok(token.access_token)
}

/// Cliente mínimo de la API de Sheets v4 (sólo lo que usa la sincronización).
pub struct SheetsClient {
    http: reqwest::Client,
    access_token: String,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn nuevo(access_token: String, spreadsheet_id: String) -> SheetsClient {
        SheetsClient {
            http: reqwest::Client::new(),
            access_token,
            spreadsheet_id,
        }
    }

    /// Agrega filas al final del rango con `values:append`.
    pub async fn append_filas(
        &self,
        rango: &str,
        filas: &[Vec<serde_json::Value>],
    ) -> SipioResult<()> {
        let url = format!(
            "{}/{}/values/{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            SHEETS_BASE, self.spreadsheet_id, rango
        );
        let respuesta = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "values": filas }))
            .send()
            .await?;

        let status = respuesta.status();
        if !status.is_success() {
            let cuerpo = respuesta.text().await.unwrap_or_default();
            return Err(SipioError::Sincronizacion(format!(
                "HTTP {}: append rechazado: {}",
                status.as_u16(),
                cuerpo
            )));
        }
        Ok(())
    }
}

/// Extrae el código HTTP del mensaje de error si está presente
/// (formato "HTTP {status}: ...").
fn extraer_status(msg: &str) -> Option<u16> {
    let prefijo = "HTTP ";
    let inicio = msg.find(prefijo)? + prefijo.len();
    let fin = msg[inicio..].find(':').unwrap_or(msg[inicio..].len());
    msg[inicio..inicio + fin].trim().parse().ok()
}

/// Un error de sincronización se reintenta sólo si es de red o 5xx;
/// un 4xx es definitivo (credenciales, rango o payload inválidos).
pub fn es_reintentable(error: &SipioError) -> bool {
    match error {
        SipioError::Sincronizacion(msg) => match extraer_status(msg) {
            Some(status) => status >= 500,
            None => true,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_5xx_se_reintenta() {
        let e = SipioError::Sincronizacion("HTTP 503: backend caído".to_string());
        assert!(es_reintentable(&e));
    }

    #[test]
    fn status_4xx_no_se_reintenta() {
        let e = SipioError::Sincronizacion("HTTP 401: token vencido".to_string());
        assert!(!es_reintentable(&e));
    }

    #[test]
    fn error_de_red_se_reintenta() {
        let e = SipioError::Sincronizacion("connection reset by peer".to_string());
        assert!(es_reintentable(&e));
    }

    #[test]
    fn error_de_dominio_no_se_reintenta() {
        let e = SipioError::DatoInvalido("x".to_string());
        assert!(!es_reintentable(&e));
    }
}
