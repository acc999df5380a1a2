use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::db::cargas::CargaPublicable;
use crate::errors::{SipioError, SipioResult};
use crate::sheets::client::{SheetsClient, es_reintentable, obtener_access_token};

#[derive(Debug, Clone, Serialize)]
pub struct ResumenSync {
    pub publicadas: usize,
    pub intentos: u32,
}

/// Una carga publicable como fila de la planilla.
pub fn carga_a_fila(c: &CargaPublicable) -> Vec<serde_json::Value> {
    vec![
        json!(c.ministerio),
        json!(c.linea),
        json!(c.codigo),
        json!(c.indicador),
        json!(c.anio),
        json!(c.mes),
        json!(c.valor),
        c.meta.map(|m| json!(m)).unwrap_or(json!("")),
        json!(c.fecha_validacion),
    ]
}

async fn append_con_reintentos(
    client: &SheetsClient,
    config: &Config,
    filas: &[Vec<serde_json::Value>],
) -> SipioResult<u32> {
    let mut delay_ms = config.sync_delay_inicial_ms;
    let mut intento = 1u32;
    loop {
        match client.append_filas(&config.sheet_range, filas).await {
            Ok(()) => return Ok(intento),
            Err(e) if es_reintentable(&e) && intento <= config.sync_max_reintentos => {
                warn!(
                    intento,
                    delay_ms,
                    error = %e,
                    "append a Sheets falló, reintentando"
                );
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                delay_ms = (delay_ms * 2).min(config.sync_delay_max_ms);
                intento += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Corrida de sincronización: toma todas las cargas validadas sin publicar,
/// las agrega a la planilla en un solo lote y recién entonces las marca
/// publicadas. Si el append falla, ninguna carga queda marcada.
pub async fn ejecutar_sync(
    config: &Config,
    usuario_id: Option<i64>,
    email: Option<&str>,
) -> SipioResult<ResumenSync> {
    if !config.sheets_configurado() {
        return Err(SipioError::Sincronizacion(
            "faltan credenciales de Google Sheets en la configuración".to_string(),
        ));
    }

    let pendientes = {
        let conn = db::abrir().map_err(|e| SipioError::Almacenamiento(e.to_string()))?;
        db::cargas::validadas_sin_publicar(&conn)
            .map_err(|e| SipioError::Almacenamiento(e.to_string()))?
    };

    if pendientes.is_empty() {
        info!("sincronización sin cargas pendientes");
        return Ok(ResumenSync {
            publicadas: 0,
            intentos: 0,
        });
    }

    let token = obtener_access_token(config).await?;
    let client = SheetsClient::nuevo(token, config.spreadsheet_id.clone());
    let filas: Vec<Vec<serde_json::Value>> = pendientes.iter().map(carga_a_fila).collect();

    let intentos = append_con_reintentos(&client, config, &filas).await?;

    let ts = Utc::now().to_rfc3339();
    let conn = db::abrir().map_err(|e| SipioError::Almacenamiento(e.to_string()))?;
    for c in &pendientes {
        db::cargas::marcar_publicada(&conn, c.carga_id, &ts)
            .map_err(|e| SipioError::Almacenamiento(e.to_string()))?;
    }
    let detalle = json!({
        "publicadas": pendientes.len(),
        "intentos": intentos,
        "rango": config.sheet_range,
    });
    if let Err(e) = db::auditoria::registrar(
        &conn,
        usuario_id,
        email,
        "sync",
        "carga",
        None,
        Some(&detalle),
    ) {
        warn!(error = %e, "no se pudo auditar la corrida de sync");
    }

    info!(publicadas = pendientes.len(), intentos, "sincronización completada");
    Ok(ResumenSync {
        publicadas: pendientes.len(),
        intentos,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fila_con_meta_y_sin_meta() {
        let base = CargaPublicable {
            carga_id: 1,
            ministerio: "Salud".to_string(),
            linea: "Hospitales".to_string(),
            codigo: "SAL-001".to_string(),
            indicador: "Camas de internación".to_string(),
            anio: 2026,
            mes: 6,
            valor: 1250.0,
            meta: Some(1300.0),
            fecha_validacion: "2026-07-01T12:00:00Z".to_string(),
        };
        let fila = carga_a_fila(&base);
        assert_eq!(fila.len(), 9);
        assert_eq!(fila[2], json!("SAL-001"));
        assert_eq!(fila[7], json!(1300.0));

        let sin_meta = CargaPublicable { meta: None, ..base };
        assert_eq!(carga_a_fila(&sin_meta)[7], json!(""));
    }
}
