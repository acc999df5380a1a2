use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;

use crate::auth::Claims;
use crate::db;
use crate::models::Rol;

#[derive(Debug, Deserialize)]
pub struct UsuarioCrearRequest {
    pub email: String,
    pub nombre: String,
    pub clave: String,
    pub rol: String,
    pub ministerio_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UsuarioActualizarRequest {
    pub nombre: String,
    pub rol: String,
    pub ministerio_id: Option<i64>,
    #[serde(default = "activo_default")]
    pub activo: bool,
}

fn activo_default() -> bool {
    true
}

/// GET /usuarios (admin)
pub async fn usuarios_listar_handler(claims: Claims) -> impl Responder {
    if !claims.es_admin() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol admin"}));
    }
    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::usuarios::listar(&conn) {
        Ok(us) => HttpResponse::Ok().json(json!({"usuarios": us})),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("fallo el listado: {}", e)})),
    }
}

/// POST /usuarios (admin)
pub async fn usuarios_crear_handler(
    claims: Claims,
    body: web::Json<UsuarioCrearRequest>,
) -> impl Responder {
    if !claims.es_admin() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol admin"}));
    }
    let pedido = body.into_inner();
    let rol = match Rol::parse(&pedido.rol) {
        Some(r) => r,
        None => {
            return HttpResponse::BadRequest().json(json!({
                "error": format!("rol desconocido: '{}'", pedido.rol),
                "valores": ["admin", "revisor", "operador"],
            }));
        }
    };
    if pedido.clave.len() < 8 {
        return HttpResponse::BadRequest()
            .json(json!({"error": "la clave debe tener al menos 8 caracteres"}));
    }

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::usuarios::crear(
        &conn,
        &pedido.email,
        &pedido.nombre,
        &pedido.clave,
        rol,
        pedido.ministerio_id,
    ) {
        Ok(u) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "crear",
                "usuario",
                Some(u.id),
                Some(&json!({"email": u.email, "rol": u.rol.as_str()})),
            );
            HttpResponse::Created().json(u)
        }
        Err(e) => HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
    }
}

/// GET /usuarios/{id} (admin, o el propio usuario)
pub async fn usuarios_detalle_handler(claims: Claims, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();
    if !claims.es_admin() && claims.sub != id {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol admin"}));
    }
    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::usuarios::por_id(&conn, id) {
        Ok(Some(u)) => HttpResponse::Ok().json(u),
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "usuario no encontrado"})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)})),
    }
}

/// PUT /usuarios/{id} (admin)
pub async fn usuarios_actualizar_handler(
    claims: Claims,
    path: web::Path<i64>,
    body: web::Json<UsuarioActualizarRequest>,
) -> impl Responder {
    if !claims.es_admin() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol admin"}));
    }
    let id = path.into_inner();
    let pedido = body.into_inner();
    let rol = match Rol::parse(&pedido.rol) {
        Some(r) => r,
        None => {
            return HttpResponse::BadRequest()
                .json(json!({"error": format!("rol desconocido: '{}'", pedido.rol)}));
        }
    };

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::usuarios::actualizar(&conn, id, &pedido.nombre, rol, pedido.ministerio_id, pedido.activo)
    {
        Ok(true) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "actualizar",
                "usuario",
                Some(id),
                Some(&json!({"rol": rol.as_str(), "activo": pedido.activo})),
            );
            HttpResponse::Ok().json(json!({"status": "ok"}))
        }
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "usuario no encontrado"})),
        Err(e) => HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
    }
}

/// DELETE /usuarios/{id} (admin) — baja lógica, el historial de cargas queda.
pub async fn usuarios_eliminar_handler(claims: Claims, path: web::Path<i64>) -> impl Responder {
    if !claims.es_admin() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol admin"}));
    }
    let id = path.into_inner();
    if id == claims.sub {
        return HttpResponse::BadRequest()
            .json(json!({"error": "un admin no puede darse de baja a sí mismo"}));
    }
    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::usuarios::desactivar(&conn, id) {
        Ok(true) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "desactivar",
                "usuario",
                Some(id),
                None,
            );
            HttpResponse::Ok().json(json!({"status": "desactivado", "id": id}))
        }
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "usuario no encontrado"})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)})),
    }
}
