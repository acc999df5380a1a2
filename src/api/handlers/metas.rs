use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use crate::auth::Claims;
use crate::db;

#[derive(Debug, Deserialize)]
pub struct MetaItem {
    pub mes: u32,
    pub valor: f64,
}

#[derive(Debug, Deserialize)]
pub struct MetasUpsertRequest {
    pub anio: i32,
    pub metas: Vec<MetaItem>,
}

/// GET /indicadores/{id}/metas?anio=2026
pub async fn metas_listar_handler(
    _claims: Claims,
    path: web::Path<i64>,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let indicador_id = path.into_inner();
    let anio = match query.get("anio").and_then(|s| s.parse::<i32>().ok()) {
        Some(a) => a,
        None => {
            return HttpResponse::BadRequest()
                .json(json!({"error": "parámetro anio es requerido"}));
        }
    };

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::metas::listar(&conn, indicador_id, anio) {
        Ok(ms) => HttpResponse::Ok().json(json!({
            "indicador_id": indicador_id,
            "anio": anio,
            "metas": ms,
        })),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)})),
    }
}

/// PUT /indicadores/{id}/metas (revisor/admin) — upsert en lote de un año.
pub async fn metas_upsert_handler(
    claims: Claims,
    path: web::Path<i64>,
    body: web::Json<MetasUpsertRequest>,
) -> impl Responder {
    if !claims.puede_revisar() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol revisor o admin"}));
    }
    let indicador_id = path.into_inner();
    let pedido = body.into_inner();
    if pedido.metas.is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "lista de metas vacía"}));
    }

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };

    match db::indicadores::por_id(&conn, indicador_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({"error": "indicador no encontrado"}));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)}));
        }
    }

    let pares: Vec<(u32, f64)> = pedido.metas.iter().map(|m| (m.mes, m.valor)).collect();
    match db::metas::upsert_lote(&conn, indicador_id, pedido.anio, &pares) {
        Ok(escritas) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "metas_upsert",
                "indicador",
                Some(indicador_id),
                Some(&json!({"anio": pedido.anio, "escritas": escritas})),
            );
            HttpResponse::Ok().json(json!({"status": "ok", "escritas": escritas}))
        }
        Err(e) => HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
    }
}
