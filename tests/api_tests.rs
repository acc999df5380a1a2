// Tests de extremo HTTP: levantan la App completa con la misma tabla de
// rutas del servidor y recorren el flujo login -> catálogo -> carga ->
// revisión usando los tres roles.

use actix_web::{App, test};
use serde_json::{Value, json};

use sipio::db;
use sipio::server::configurar_rutas;

fn preparar_entorno() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("sipio-test.db");
    // set_var es unsafe en edición 2024; acá el proceso de test es dueño
    // de su entorno.
    unsafe {
        std::env::set_var("SIPIO_DB_PATH", &db_path);
        std::env::set_var("SIPIO_JWT_SECRETO", "secreto-de-tests");
        std::env::set_var("GOOGLE_CLIENT_ID", "");
        std::env::set_var("GOOGLE_CLIENT_SECRET", "");
        std::env::set_var("GOOGLE_REFRESH_TOKEN", "");
        std::env::set_var("SIPIO_SPREADSHEET_ID", "");
    }
    db::init_db("clave-admin-inicial").expect("init almacén");
    dir
}

async fn post_json(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    ruta: &str,
    token: Option<&str>,
    cuerpo: Value,
) -> (u16, Value) {
    let mut req = test::TestRequest::post().uri(ruta).set_json(cuerpo);
    if let Some(t) = token {
        req = req.insert_header(("Authorization", format!("Bearer {}", t)));
    }
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

async fn get_json(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    ruta: &str,
    token: Option<&str>,
) -> (u16, Value) {
    let mut req = test::TestRequest::get().uri(ruta);
    if let Some(t) = token {
        req = req.insert_header(("Authorization", format!("Bearer {}", t)));
    }
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

#[actix_web::test]
async fn flujo_completo_por_http() {
    let _dir = preparar_entorno();
    let app = test::init_service(App::new().configure(configurar_rutas)).await;

    // Rutas públicas.
    let (status, _) = get_json(&app, "/salud", None).await;
    assert_eq!(status, 200);
    let (status, ayuda) = get_json(&app, "/ayuda", None).await;
    assert_eq!(status, 200);
    assert!(ayuda["description"].as_str().unwrap_or("").contains("Bearer"));

    // Sin token no se pasa (la respuesta del extractor no es JSON).
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/ministerios").to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 401);

    // Login del admin sembrado.
    let (status, login) = post_json(
        &app,
        "/auth/login",
        None,
        json!({"email": "admin@sipio.gob.ar", "clave": "clave-admin-inicial"}),
    )
    .await;
    assert_eq!(status, 200, "login admin: {}", login);
    let token_admin = login["token"].as_str().expect("token").to_string();

    let (status, _) = post_json(
        &app,
        "/auth/login",
        None,
        json!({"email": "admin@sipio.gob.ar", "clave": "incorrecta"}),
    )
    .await;
    assert_eq!(status, 401);

    // Catálogo: ministerio -> línea -> indicador.
    let (status, ministerio) = post_json(
        &app,
        "/ministerios",
        Some(&token_admin),
        json!({"nombre": "Ministerio de Salud", "sigla": "SAL"}),
    )
    .await;
    assert_eq!(status, 201, "crear ministerio: {}", ministerio);
    let ministerio_id = ministerio["id"].as_i64().expect("id");

    let (status, linea) = post_json(
        &app,
        "/lineas",
        Some(&token_admin),
        json!({"ministerio_id": ministerio_id, "nombre": "Fortalecimiento hospitalario"}),
    )
    .await;
    assert_eq!(status, 201, "crear línea: {}", linea);
    let linea_id = linea["id"].as_i64().expect("id");

    let (status, indicador) = post_json(
        &app,
        "/indicadores",
        Some(&token_admin),
        json!({
            "linea_id": linea_id,
            "codigo": "SAL-001",
            "nombre": "Camas de internación",
            "unidad_medida": "camas",
            "periodicidad": "mensual"
        }),
    )
    .await;
    assert_eq!(status, 201, "crear indicador: {}", indicador);
    let indicador_id = indicador["id"].as_i64().expect("id");

    // Metas del año.
    let (status, _) = get_json(
        &app,
        &format!("/indicadores/{}/metas?anio=2026", indicador_id),
        Some(&token_admin),
    )
    .await;
    assert_eq!(status, 200);

    // Alta de operador y login.
    let (status, operador) = post_json(
        &app,
        "/usuarios",
        Some(&token_admin),
        json!({
            "email": "operadora@salud.gob.ar",
            "nombre": "Operadora Salud",
            "clave": "clave-segura",
            "rol": "operador",
            "ministerio_id": ministerio_id
        }),
    )
    .await;
    assert_eq!(status, 201, "crear operador: {}", operador);

    let (status, login_op) = post_json(
        &app,
        "/auth/login",
        None,
        json!({"email": "operadora@salud.gob.ar", "clave": "clave-segura"}),
    )
    .await;
    assert_eq!(status, 200);
    let token_operador = login_op["token"].as_str().expect("token").to_string();

    // El operador no toca catálogo ni auditoría.
    let (status, _) = post_json(
        &app,
        "/ministerios",
        Some(&token_operador),
        json!({"nombre": "Otro", "sigla": "OTR"}),
    )
    .await;
    assert_eq!(status, 403);
    let (status, _) = get_json(&app, "/auditoria", Some(&token_operador)).await;
    assert_eq!(status, 403);

    // Carga: alta, envío y validación.
    let (status, carga) = post_json(
        &app,
        "/cargas",
        Some(&token_operador),
        json!({"indicador_id": indicador_id, "anio": 2026, "mes": 6, "valor": 1250.0}),
    )
    .await;
    assert_eq!(status, 201, "crear carga: {}", carga);
    let carga_id = carga["id"].as_i64().expect("id");
    assert_eq!(carga["estado"], "borrador");

    // Período duplicado -> 409.
    let (status, _) = post_json(
        &app,
        "/cargas",
        Some(&token_operador),
        json!({"indicador_id": indicador_id, "anio": 2026, "mes": 6, "valor": 999.0}),
    )
    .await;
    assert_eq!(status, 409);

    // El operador no valida su propia carga.
    let (status, _) = post_json(
        &app,
        &format!("/cargas/{}/validar", carga_id),
        Some(&token_operador),
        json!({}),
    )
    .await;
    assert_eq!(status, 403);

    // Validar desde borrador tampoco corresponde (ni siquiera para admin).
    let (status, _) = post_json(
        &app,
        &format!("/cargas/{}/validar", carga_id),
        Some(&token_admin),
        json!({}),
    )
    .await;
    assert_eq!(status, 409);

    let (status, _) = post_json(
        &app,
        &format!("/cargas/{}/enviar", carga_id),
        Some(&token_operador),
        json!({}),
    )
    .await;
    assert_eq!(status, 200);

    // Observación sin texto -> 400.
    let (status, _) = post_json(
        &app,
        &format!("/cargas/{}/observar", carga_id),
        Some(&token_admin),
        json!({}),
    )
    .await;
    assert_eq!(status, 400);

    let (status, cuerpo) = post_json(
        &app,
        &format!("/cargas/{}/validar", carga_id),
        Some(&token_admin),
        json!({}),
    )
    .await;
    assert_eq!(status, 200, "validar: {}", cuerpo);

    // Validada ya no es editable.
    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/cargas/{}", carga_id))
            .insert_header(("Authorization", format!("Bearer {}", token_operador)))
            .set_json(json!({"valor": 1.0}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 409);

    // Estado de sincronización: una carga espera publicación.
    let (status, estado) = get_json(&app, "/sync/estado", Some(&token_admin)).await;
    assert_eq!(status, 200);
    assert_eq!(estado["pendientes_de_publicar"], 1);
    assert_eq!(estado["sheets_configurado"], false);

    // Sin credenciales de Sheets la corrida falla con error claro.
    let (status, sync) = post_json(&app, "/sync/ejecutar", Some(&token_admin), json!({})).await;
    assert_eq!(status, 500);
    assert!(sync["error"].as_str().unwrap_or("").contains("credenciales"));

    // La auditoría registró el recorrido.
    let (status, auditoria) = get_json(&app, "/auditoria?entidad=carga", Some(&token_admin)).await;
    assert_eq!(status, 200);
    assert!(auditoria["total"].as_i64().unwrap_or(0) >= 3);
}
