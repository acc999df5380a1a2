use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use crate::auth::Claims;
use crate::db;

#[derive(Debug, Deserialize)]
pub struct LineaCrearRequest {
    pub ministerio_id: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LineaActualizarRequest {
    pub nombre: String,
    pub descripcion: Option<String>,
    #[serde(default = "activo_default")]
    pub activo: bool,
}

fn activo_default() -> bool {
    true
}

/// GET /lineas?ministerio_id=
pub async fn lineas_listar_handler(
    _claims: Claims,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let ministerio_id = query.get("ministerio_id").and_then(|s| s.parse::<i64>().ok());

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::lineas::listar(&conn, ministerio_id) {
        Ok(ls) => HttpResponse::Ok().json(json!({"lineas": ls})),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("fallo el listado: {}", e)})),
    }
}

/// POST /lineas (admin)
pub async fn lineas_crear_handler(
    claims: Claims,
    body: web::Json<LineaCrearRequest>,
) -> impl Responder {
    if !claims.es_admin() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol admin"}));
    }
    let pedido = body.into_inner();
    if pedido.nombre.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "nombre es requerido"}));
    }

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::lineas::crear(
        &conn,
        pedido.ministerio_id,
        &pedido.nombre,
        pedido.descripcion.as_deref(),
    ) {
        Ok(l) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "crear",
                "linea",
                Some(l.id),
                Some(&json!({"nombre": l.nombre, "ministerio_id": l.ministerio_id})),
            );
            HttpResponse::Created().json(l)
        }
        Err(e) => HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
    }
}

/// GET /lineas/{id}
pub async fn lineas_detalle_handler(_claims: Claims, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();
    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::lineas::por_id(&conn, id) {
        Ok(Some(l)) => HttpResponse::Ok().json(l),
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "línea no encontrada"})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)})),
    }
}

/// PUT /lineas/{id} (admin)
pub async fn lineas_actualizar_handler(
    claims: Claims,
    path: web::Path<i64>,
    body: web::Json<LineaActualizarRequest>,
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
    match db::lineas::actualizar(
        &conn,
        id,
        &pedido.nombre,
        pedido.descripcion.as_deref(),
        pedido.activo,
    ) {
        Ok(true) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "actualizar",
                "linea",
                Some(id),
                Some(&json!({"nombre": pedido.nombre, "activo": pedido.activo})),
            );
            HttpResponse::Ok().json(json!({"status": "ok"}))
        }
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "línea no encontrada"})),
        Err(e) => HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
    }
}

/// DELETE /lineas/{id} (admin; rechazado si tiene indicadores)
pub async fn lineas_eliminar_handler(claims: Claims, path: web::Path<i64>) -> impl Responder {
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
    match db::lineas::eliminar(&conn, id) {
        Ok(true) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "eliminar",
                "linea",
                Some(id),
                None,
            );
            HttpResponse::Ok().json(json!({"status": "eliminado", "id": id}))
        }
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "línea no encontrada"})),
        Err(e) => HttpResponse::Conflict().json(json!({"error": format!("{}", e)})),
    }
}
