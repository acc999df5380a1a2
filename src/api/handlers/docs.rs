use actix_web::{HttpResponse, Responder};
use serde_json::json;

/// GET /salud
pub async fn salud_handler() -> impl Responder {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

/// GET /ayuda — descripción de la API con ejemplos de uso.
pub async fn ayuda_handler() -> impl Responder {
    let ejemplo_carga = json!({
        "indicador_id": 12,
        "anio": 2026,
        "mes": 6,
        "valor": 1250.0
    });

    let ayuda = json!({
        "description": "API de seguimiento de indicadores. Todas las rutas salvo /auth/login, /salud y /ayuda requieren header 'Authorization: Bearer <token>'. El token se obtiene con POST /auth/login {email, clave}.",
        "flujo_de_revision": "borrador -enviar-> pendiente -validar|observar|rechazar-> validado|observado|rechazado; observado -enviar-> pendiente. Las validadas se publican a Google Sheets con POST /sync/ejecutar.",
        "roles": {
            "admin": "catálogo completo, usuarios, auditoría y sincronización",
            "revisor": "revisa cargas pendientes y administra metas",
            "operador": "crea, corrige y envía cargas de su ministerio"
        },
        "post_cargas_ejemplo": ejemplo_carga,
        "importacion": "POST /cargas/importar con multipart .xlsx (columnas: Indicador, Año, Mes, Valor). La plantilla sale de GET /cargas/plantilla.",
        "filtros_listado": "/cargas?ministerio_id=&indicador_id=&estado=&anio=&mes=",
    });

    HttpResponse::Ok().json(ayuda)
}
