use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use crate::auth::Claims;
use crate::db;
use crate::models::Periodicidad;

#[derive(Debug, Deserialize)]
pub struct IndicadorCrearRequest {
    pub linea_id: i64,
    pub codigo: String,
    pub nombre: String,
    pub unidad_medida: Option<String>,
    pub periodicidad: String,
}

#[derive(Debug, Deserialize)]
pub struct IndicadorActualizarRequest {
    pub nombre: String,
    pub unidad_medida: Option<String>,
    pub periodicidad: String,
    #[serde(default = "activo_default")]
    pub activo: bool,
}

fn activo_default() -> bool {
    true
}

/// GET /indicadores?linea_id=
pub async fn indicadores_listar_handler(
    _claims: Claims,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let linea_id = query.get("linea_id").and_then(|s| s.parse::<i64>().ok());

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::indicadores::listar(&conn, linea_id) {
        Ok(is) => HttpResponse::Ok().json(json!({"indicadores": is})),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("fallo el listado: {}", e)})),
    }
}

/// POST /indicadores (admin)
pub async fn indicadores_crear_handler(
    claims: Claims,
    body: web::Json<IndicadorCrearRequest>,
) -> impl Responder {
    if !claims.es_admin() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol admin"}));
    }
    let pedido = body.into_inner();
    if pedido.codigo.trim().is_empty() || pedido.nombre.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "código y nombre son requeridos"}));
    }
    let periodicidad = match Periodicidad::parse(&pedido.periodicidad) {
        Some(p) => p,
        None => {
            return HttpResponse::BadRequest().json(json!({
                "error": format!("periodicidad desconocida: '{}'", pedido.periodicidad),
                "valores": ["mensual", "trimestral", "semestral", "anual"],
            }));
        }
    };

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::indicadores::crear(
        &conn,
        pedido.linea_id,
        &pedido.codigo,
        &pedido.nombre,
        pedido.unidad_medida.as_deref(),
        periodicidad,
    ) {
        Ok(i) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "crear",
                "indicador",
                Some(i.id),
                Some(&json!({"codigo": i.codigo, "linea_id": i.linea_id})),
            );
            HttpResponse::Created().json(i)
        }
        Err(e) => HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
    }
}

/// GET /indicadores/{id}
pub async fn indicadores_detalle_handler(_claims: Claims, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();
    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::indicadores::por_id(&conn, id) {
        Ok(Some(i)) => HttpResponse::Ok().json(i),
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "indicador no encontrado"})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)})),
    }
}

/// PUT /indicadores/{id} (admin)
pub async fn indicadores_actualizar_handler(
    claims: Claims,
    path: web::Path<i64>,
    body: web::Json<IndicadorActualizarRequest>,
) -> impl Responder {
    if !claims.es_admin() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol admin"}));
    }
    let id = path.into_inner();
    let pedido = body.into_inner();
    let periodicidad = match Periodicidad::parse(&pedido.periodicidad) {
        Some(p) => p,
        None => {
            return HttpResponse::BadRequest().json(json!({
                "error": format!("periodicidad desconocida: '{}'", pedido.periodicidad),
            }));
        }
    };

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::indicadores::actualizar(
        &conn,
        id,
        &pedido.nombre,
        pedido.unidad_medida.as_deref(),
        periodicidad,
        pedido.activo,
    ) {
        Ok(true) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "actualizar",
                "indicador",
                Some(id),
                Some(&json!({"nombre": pedido.nombre, "activo": pedido.activo})),
            );
            HttpResponse::Ok().json(json!({"status": "ok"}))
        }
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "indicador no encontrado"})),
        Err(e) => HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
    }
}

/// DELETE /indicadores/{id} (admin; rechazado si tiene cargas)
pub async fn indicadores_eliminar_handler(claims: Claims, path: web::Path<i64>) -> impl Responder {
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
    match db::indicadores::eliminar(&conn, id) {
        Ok(true) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "eliminar",
                "indicador",
                Some(id),
                None,
            );
            HttpResponse::Ok().json(json!({"status": "eliminado", "id": id}))
        }
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "indicador no encontrado"})),
        Err(e) => HttpResponse::Conflict().json(json!({"error": format!("{}", e)})),
    }
}
