use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};

use crate::config::Config;
use crate::models::{Rol, Usuario};

/// Claims del token de sesión.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Id del usuario.
    pub sub: i64,
    pub email: String,
    pub rol: Rol,
    pub ministerio_id: Option<i64>,
    pub exp: usize,
}

impl Claims {
    pub fn es_admin(&self) -> bool {
        self.rol == Rol::Admin
    }

    pub fn puede_revisar(&self) -> bool {
        matches!(self.rol, Rol::Admin | Rol::Revisor)
    }

    /// Un operador sólo alcanza cargas de su propio ministerio.
    pub fn alcanza_ministerio(&self, ministerio_id: i64) -> bool {
        match self.rol {
            Rol::Admin | Rol::Revisor => true,
            Rol::Operador => self.ministerio_id == Some(ministerio_id),
        }
    }
}

pub fn emitir_token(
    usuario: &Usuario,
    secreto: &str,
    ttl_horas: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = Utc::now()
        .checked_add_signed(chrono::Duration::hours(ttl_horas))
        .map(|t| t.timestamp() as usize)
        .unwrap_or(0);
    let claims = Claims {
        sub: usuario.id,
        email: usuario.email.clone(),
        rol: usuario.rol,
        ministerio_id: usuario.ministerio_id,
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secreto.as_bytes()),
    )
}

pub fn decodificar_token(token: &str, secreto: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secreto.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn claims_desde_request(req: &HttpRequest) -> Result<Claims, actix_web::Error> {
    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| actix_web::error::ErrorUnauthorized("falta header Authorization"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| actix_web::error::ErrorUnauthorized("se espera esquema Bearer"))?;

    let config = Config::desde_env();
    decodificar_token(token.trim(), &config.jwt_secreto)
        .map_err(|e| actix_web::error::ErrorUnauthorized(format!("token inválido: {}", e)))
}

/// Extractor actix: decodifica el Bearer token en `Claims` o corta con 401.
impl FromRequest for Claims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Claims, actix_web::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_desde_request(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usuario_prueba() -> Usuario {
        Usuario {
            id: 7,
            email: "operadora@salud.gob.ar".to_string(),
            nombre: "Operadora Salud".to_string(),
            clave_hash: String::new(),
            rol: Rol::Operador,
            ministerio_id: Some(3),
            activo: true,
        }
    }

    #[test]
    fn emitir_y_decodificar() {
        let token = emitir_token(&usuario_prueba(), "secreto-de-prueba", 2).expect("emitir");
        let claims = decodificar_token(&token, "secreto-de-prueba").expect("decodificar");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.rol, Rol::Operador);
        assert_eq!(claims.ministerio_id, Some(3));
    }

    #[test]
    fn secreto_distinto_rechaza() {
        let token = emitir_token(&usuario_prueba(), "secreto-a", 2).expect("emitir");
        assert!(decodificar_token(&token, "secreto-b").is_err());
    }

    #[test]
    fn alcance_por_ministerio() {
        let token = emitir_token(&usuario_prueba(), "s", 1).expect("emitir");
        let claims = decodificar_token(&token, "s").expect("decodificar");
        assert!(claims.alcanza_ministerio(3));
        assert!(!claims.alcanza_ministerio(4));
    }
}
