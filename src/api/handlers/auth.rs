use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{Claims, emitir_token};
use crate::config::Config;
use crate::db;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub clave: String,
}

/// POST /auth/login
pub async fn login_handler(body: web::Json<LoginRequest>) -> impl Responder {
    let pedido = body.into_inner();
    if pedido.email.trim().is_empty() || pedido.clave.is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "email y clave son requeridos"}));
    }

    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };

    let usuario = match db::usuarios::autenticar(&conn, &pedido.email, &pedido.clave) {
        Ok(Some(u)) => u,
        Ok(None) => {
            return HttpResponse::Unauthorized().json(json!({"error": "credenciales inválidas"}));
        }
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("fallo de autenticación: {}", e)}));
        }
    };

    let config = Config::desde_env();
    let token = match emitir_token(&usuario, &config.jwt_secreto, config.token_ttl_horas) {
        Ok(t) => t,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo emitir el token: {}", e)}));
        }
    };

    let _ = db::auditoria::registrar(
        &conn,
        Some(usuario.id),
        Some(&usuario.email),
        "login",
        "usuario",
        Some(usuario.id),
        None,
    );

    HttpResponse::Ok().json(json!({
        "token": token,
        "usuario": usuario,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CambiarClaveRequest {
    pub clave_actual: String,
    pub clave_nueva: String,
}

/// POST /auth/cambiar_clave — cada usuario cambia su propia clave.
pub async fn cambiar_clave_handler(
    claims: Claims,
    body: web::Json<CambiarClaveRequest>,
) -> impl Responder {
    let pedido = body.into_inner();
    let conn = match db::abrir() {
        Ok(c) => c,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}));
        }
    };

    match db::usuarios::autenticar(&conn, &claims.email, &pedido.clave_actual) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::Unauthorized().json(json!({"error": "clave actual incorrecta"}));
        }
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("fallo de autenticación: {}", e)}));
        }
    }

    match db::usuarios::cambiar_clave(&conn, claims.sub, &pedido.clave_nueva) {
        Ok(true) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "cambiar_clave",
                "usuario",
                Some(claims.sub),
                None,
            );
            HttpResponse::Ok().json(json!({"status": "ok"}))
        }
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "usuario no encontrado"})),
        Err(e) => HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
    }
}
