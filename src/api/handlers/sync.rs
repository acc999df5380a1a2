use actix_web::{HttpResponse, Responder};
use serde_json::json;
use std::sync::{Arc, OnceLock};
use tokio::sync::Semaphore;

use crate::auth::Claims;
use crate::config::Config;
use crate::db;
use crate::sheets;

/// POST /sync/ejecutar (admin) — a lo sumo una corrida en vuelo.
pub async fn sync_ejecutar_handler(claims: Claims) -> impl Responder {
    if !claims.es_admin() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol admin"}));
    }

    static SYNC_SEM: OnceLock<Arc<Semaphore>> = OnceLock::new();
    let sem = SYNC_SEM
        .get_or_init(|| Arc::new(Semaphore::new(1)))
        .clone();
    let _permiso = match sem.try_acquire_owned() {
        Ok(p) => p,
        Err(_) => {
            return HttpResponse::Conflict()
                .json(json!({"error": "ya hay una sincronización en curso"}));
        }
    };

    let config = Config::desde_env();
    match sheets::ejecutar_sync(&config, Some(claims.sub), Some(&claims.email)).await {
        Ok(resumen) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "publicadas": resumen.publicadas,
            "intentos": resumen.intentos,
        })),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"status": "error", "error": format!("{}", e)})),
    }
}

/// GET /sync/estado — resumen de cargas por estado y última corrida.
pub async fn sync_estado_handler(claims: Claims) -> impl Responder {
    if !claims.puede_revisar() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol revisor o admin"}));
    }
    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };

    let resumen = match db::cargas::resumen_estados(&conn) {
        Ok(r) => r,
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)}));
        }
    };
    let pendientes = match db::cargas::validadas_sin_publicar(&conn) {
        Ok(p) => p.len(),
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)}));
        }
    };
    let ultima = match db::auditoria::ultimo_por_accion(&conn, "sync") {
        Ok(u) => u,
        Err(_) => None,
    };

    HttpResponse::Ok().json(json!({
        "cargas": resumen,
        "pendientes_de_publicar": pendientes,
        "ultima_corrida": ultima,
        "sheets_configurado": Config::desde_env().sheets_configurado(),
    }))
}
