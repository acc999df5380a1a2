use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use crate::auth::Claims;
use crate::db;

#[derive(Debug, Deserialize)]
pub struct MinisterioRequest {
    pub nombre: String,
    pub sigla: String,
    #[serde(default = "activo_default")]
    pub activo: bool,
}

fn activo_default() -> bool {
    true
}

/// GET /ministerios?solo_activos=true
pub async fn ministerios_listar_handler(
    _claims: Claims,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let solo_activos = query
        .get("solo_activos")
        .map(|s| s == "true" || s == "1")
        .unwrap_or(false);

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::ministerios::listar(&conn, solo_activos) {
        Ok(ms) => HttpResponse::Ok().json(json!({"ministerios": ms})),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("fallo el listado: {}", e)})),
    }
}

/// POST /ministerios (admin)
pub async fn ministerios_crear_handler(
    claims: Claims,
    body: web::Json<MinisterioRequest>,
) -> impl Responder {
    if !claims.es_admin() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol admin"}));
    }
    let pedido = body.into_inner();
    if pedido.nombre.trim().is_empty() || pedido.sigla.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "nombre y sigla son requeridos"}));
    }

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::ministerios::crear(&conn, &pedido.nombre, &pedido.sigla) {
        Ok(m) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "crear",
                "ministerio",
                Some(m.id),
                Some(&json!({"nombre": m.nombre, "sigla": m.sigla})),
            );
            HttpResponse::Created().json(m)
        }
        Err(e) => HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
    }
}

/// GET /ministerios/{id}
pub async fn ministerios_detalle_handler(_claims: Claims, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();
    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::ministerios::por_id(&conn, id) {
        Ok(Some(m)) => HttpResponse::Ok().json(m),
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "ministerio no encontrado"})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)})),
    }
}

/// PUT /ministerios/{id} (admin)
pub async fn ministerios_actualizar_handler(
    claims: Claims,
    path: web::Path<i64>,
    body: web::Json<MinisterioRequest>,
) -> impl Responder {
    if !claims.es_admin() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol admin"}));
    }
    let id = path.into_inner();
    let pedido = body.into_inner();

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::ministerios::actualizar(&conn, id, &pedido.nombre, &pedido.sigla, pedido.activo) {
        Ok(true) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "actualizar",
                "ministerio",
                Some(id),
                Some(&json!({"nombre": pedido.nombre, "activo": pedido.activo})),
            );
            HttpResponse::Ok().json(json!({"status": "ok"}))
        }
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "ministerio no encontrado"})),
        Err(e) => HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
    }
}

/// DELETE /ministerios/{id} (admin; rechazado si tiene líneas)
pub async fn ministerios_eliminar_handler(claims: Claims, path: web::Path<i64>) -> impl Responder {
    if !claims.es_admin() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol admin"}));
    }
    let id = path.into_inner();
    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::ministerios::eliminar(&conn, id) {
        Ok(true) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "eliminar",
                "ministerio",
                Some(id),
                None,
            );
            HttpResponse::Ok().json(json!({"status": "eliminado", "id": id}))
        }
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "ministerio no encontrado"})),
        Err(e) => HttpResponse::Conflict().json(json!({"error": format!("{}", e)})),
    }
}
