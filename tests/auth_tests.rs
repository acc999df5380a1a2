use rusqlite::Connection;

use sipio::auth::{claves, decodificar_token, emitir_token};
use sipio::db;
use sipio::models::Rol;

fn conexion_de_prueba() -> Connection {
    let conn = Connection::open_in_memory().expect("sqlite en memoria");
    db::init_esquema(&conn).expect("esquema");
    conn
}

#[test]
fn autenticacion_contra_el_almacen() {
    let conn = conexion_de_prueba();
    let ministerio = db::ministerios::crear(&conn, "Ministerio de Educación", "EDU").expect("ministerio");
    db::usuarios::crear(
        &conn,
        "Operador@Educacion.gob.ar",
        "Operador Educación",
        "clave-segura",
        Rol::Operador,
        Some(ministerio.id),
    )
    .expect("usuario");

    // El email se normaliza a minúsculas al crear y al autenticar.
    let u = db::usuarios::autenticar(&conn, "operador@educacion.gob.ar", "clave-segura")
        .expect("autenticar")
        .expect("credenciales válidas");
    assert_eq!(u.email, "operador@educacion.gob.ar");

    assert!(db::usuarios::autenticar(&conn, "operador@educacion.gob.ar", "clave-mala")
        .expect("autenticar")
        .is_none());
    assert!(db::usuarios::autenticar(&conn, "nadie@educacion.gob.ar", "clave-segura")
        .expect("autenticar")
        .is_none());
}

#[test]
fn usuario_desactivado_no_entra() {
    let conn = conexion_de_prueba();
    let u = db::usuarios::crear(
        &conn,
        "revisora@sipio.gob.ar",
        "Revisora",
        "clave-segura",
        Rol::Revisor,
        None,
    )
    .expect("usuario");

    db::usuarios::desactivar(&conn, u.id).expect("baja lógica");
    assert!(db::usuarios::autenticar(&conn, "revisora@sipio.gob.ar", "clave-segura")
        .expect("autenticar")
        .is_none());
}

#[test]
fn cambio_de_clave_invalida_la_anterior() {
    let conn = conexion_de_prueba();
    let u = db::usuarios::crear(
        &conn,
        "admin2@sipio.gob.ar",
        "Admin Dos",
        "clave-original",
        Rol::Admin,
        None,
    )
    .expect("usuario");

    db::usuarios::cambiar_clave(&conn, u.id, "clave-nueva-larga").expect("cambio");
    assert!(db::usuarios::autenticar(&conn, "admin2@sipio.gob.ar", "clave-original")
        .expect("autenticar")
        .is_none());
    assert!(db::usuarios::autenticar(&conn, "admin2@sipio.gob.ar", "clave-nueva-larga")
        .expect("autenticar")
        .is_some());

    // Clave demasiado corta se rechaza.
    assert!(db::usuarios::cambiar_clave(&conn, u.id, "corta").is_err());
}

#[test]
fn operador_sin_ministerio_se_rechaza() {
    let conn = conexion_de_prueba();
    let r = db::usuarios::crear(
        &conn,
        "suelto@sipio.gob.ar",
        "Sin Ministerio",
        "clave-segura",
        Rol::Operador,
        None,
    );
    assert!(r.is_err());
}

#[test]
fn token_refleja_el_usuario() {
    let conn = conexion_de_prueba();
    let ministerio = db::ministerios::crear(&conn, "Ministerio de Obras", "OBR").expect("ministerio");
    let u = db::usuarios::crear(
        &conn,
        "operador@obras.gob.ar",
        "Operador Obras",
        "clave-segura",
        Rol::Operador,
        Some(ministerio.id),
    )
    .expect("usuario");

    let token = emitir_token(&u, "secreto", 4).expect("emitir");
    let claims = decodificar_token(&token, "secreto").expect("decodificar");
    assert_eq!(claims.sub, u.id);
    assert_eq!(claims.rol, Rol::Operador);
    assert_eq!(claims.ministerio_id, Some(ministerio.id));
    assert!(!claims.es_admin());
    assert!(!claims.puede_revisar());
    assert!(claims.alcanza_ministerio(ministerio.id));
}

#[test]
fn hash_almacenado_no_expone_la_clave() {
    let h = claves::hashear("clave-segura");
    assert!(!h.contains("clave-segura"));
    assert!(claves::verificar("clave-segura", &h));
}
