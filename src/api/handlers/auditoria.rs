use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use std::collections::HashMap;

use crate::auth::Claims;
use crate::db;
use crate::db::auditoria::FiltrosAuditoria;

/// GET /auditoria?entidad=&accion=&usuario_id=&limite= (admin)
pub async fn auditoria_listar_handler(
    claims: Claims,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    if !claims.es_admin() {
        return HttpResponse::Forbidden().json(json!({"error": "requiere rol admin"}));
    }
    let qm = query.into_inner();
    let filtros = FiltrosAuditoria {
        entidad: qm.get("entidad").cloned(),
        accion: qm.get("accion").cloned(),
        usuario_id: qm.get("usuario_id").and_then(|s| s.parse().ok()),
        limite: qm.get("limite").and_then(|s| s.parse().ok()),
    };

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };
    match db::auditoria::listar(&conn, &filtros) {
        Ok(rs) => HttpResponse::Ok().json(json!({"total": rs.len(), "registros": rs})),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("fallo el listado: {}", e)})),
    }
}
