use rusqlite::Connection;

use sipio::db;
use sipio::db::cargas::FiltrosCarga;
use sipio::errors::SipioError;
use sipio::models::{Estado, Periodicidad, Rol};

fn conexion_de_prueba() -> Connection {
    let conn = Connection::open_in_memory().expect("sqlite en memoria");
    conn.execute_batch("PRAGMA foreign_keys = ON;").expect("pragma");
    db::init_esquema(&conn).expect("esquema");
    conn
}

struct Contexto {
    ministerio_id: i64,
    indicador_mensual: sipio::models::Indicador,
    indicador_trimestral: sipio::models::Indicador,
    usuario_id: i64,
}

fn armar_catalogo(conn: &Connection) -> Contexto {
    let ministerio = db::ministerios::crear(conn, "Ministerio de Salud", "sal").expect("ministerio");
    let linea = db::lineas::crear(conn, ministerio.id, "Fortalecimiento hospitalario", None)
        .expect("línea");
    let mensual = db::indicadores::crear(
        conn,
        linea.id,
        "sal-001",
        "Camas de internación",
        Some("camas"),
        Periodicidad::Mensual,
    )
    .expect("indicador mensual");
    let trimestral = db::indicadores::crear(
        conn,
        linea.id,
        "SAL-002",
        "Consultas ambulatorias",
        None,
        Periodicidad::Trimestral,
    )
    .expect("indicador trimestral");
    let usuario = db::usuarios::crear(
        conn,
        "operadora@salud.gob.ar",
        "Operadora Salud",
        "clave-segura",
        Rol::Operador,
        Some(ministerio.id),
    )
    .expect("usuario");

    Contexto {
        ministerio_id: ministerio.id,
        indicador_mensual: mensual,
        indicador_trimestral: trimestral,
        usuario_id: usuario.id,
    }
}

#[test]
fn codigo_y_sigla_se_normalizan_a_mayusculas() {
    let conn = conexion_de_prueba();
    let ctx = armar_catalogo(&conn);
    assert_eq!(ctx.indicador_mensual.codigo, "SAL-001");
    let m = db::ministerios::por_id(&conn, ctx.ministerio_id)
        .expect("consulta")
        .expect("existe");
    assert_eq!(m.sigla, "SAL");
}

#[test]
fn carga_duplicada_se_rechaza_y_rechazada_libera_el_periodo() {
    let conn = conexion_de_prueba();
    let ctx = armar_catalogo(&conn);

    let carga = db::cargas::crear(
        &conn,
        &ctx.indicador_mensual,
        ctx.ministerio_id,
        ctx.usuario_id,
        2026,
        5,
        120.0,
    )
    .expect("primera carga");
    assert_eq!(carga.estado, Estado::Borrador);

    let duplicada = db::cargas::crear(
        &conn,
        &ctx.indicador_mensual,
        ctx.ministerio_id,
        ctx.usuario_id,
        2026,
        5,
        99.0,
    );
    match duplicada {
        Err(e) => {
            let e = e.downcast_ref::<SipioError>().expect("error de dominio");
            assert!(matches!(e, SipioError::CargaDuplicada { .. }));
        }
        Ok(_) => panic!("debió rechazar el período duplicado"),
    }

    // Una carga rechazada no bloquea un nuevo intento para el mismo período.
    db::cargas::actualizar_estado(&conn, carga.id, Estado::Rechazado, None).expect("rechazo");
    db::cargas::crear(
        &conn,
        &ctx.indicador_mensual,
        ctx.ministerio_id,
        ctx.usuario_id,
        2026,
        5,
        110.0,
    )
    .expect("el período rechazado queda libre");
}

#[test]
fn periodicidad_trimestral_rechaza_meses_fuera_de_grilla() {
    let conn = conexion_de_prueba();
    let ctx = armar_catalogo(&conn);

    let fuera = db::cargas::crear(
        &conn,
        &ctx.indicador_trimestral,
        ctx.ministerio_id,
        ctx.usuario_id,
        2026,
        2,
        10.0,
    );
    match fuera {
        Err(e) => {
            let e = e.downcast_ref::<SipioError>().expect("error de dominio");
            assert!(matches!(e, SipioError::PeriodoInvalido { .. }));
        }
        Ok(_) => panic!("febrero no es un mes trimestral"),
    }

    db::cargas::crear(
        &conn,
        &ctx.indicador_trimestral,
        ctx.ministerio_id,
        ctx.usuario_id,
        2026,
        6,
        10.0,
    )
    .expect("junio sí es trimestral");
}

#[test]
fn listado_con_filtros_combinados() {
    let conn = conexion_de_prueba();
    let ctx = armar_catalogo(&conn);

    for mes in [1u32, 2, 3] {
        db::cargas::crear(
            &conn,
            &ctx.indicador_mensual,
            ctx.ministerio_id,
            ctx.usuario_id,
            2026,
            mes,
            mes as f64 * 10.0,
        )
        .expect("carga");
    }

    let todas = db::cargas::listar(&conn, &FiltrosCarga::default()).expect("listar");
    assert_eq!(todas.len(), 3);

    let de_marzo = db::cargas::listar(
        &conn,
        &FiltrosCarga {
            mes: Some(3),
            anio: Some(2026),
            ..Default::default()
        },
    )
    .expect("listar filtrado");
    assert_eq!(de_marzo.len(), 1);
    assert_eq!(de_marzo[0].valor, 30.0);

    let pendientes = db::cargas::listar(
        &conn,
        &FiltrosCarga {
            estado: Some(Estado::Pendiente),
            ..Default::default()
        },
    )
    .expect("listar por estado");
    assert!(pendientes.is_empty());
}

#[test]
fn publicacion_junta_catalogo_y_meta() {
    let conn = conexion_de_prueba();
    let ctx = armar_catalogo(&conn);

    db::metas::upsert_lote(&conn, ctx.indicador_mensual.id, 2026, &[(5, 130.0)])
        .expect("meta");

    let carga = db::cargas::crear(
        &conn,
        &ctx.indicador_mensual,
        ctx.ministerio_id,
        ctx.usuario_id,
        2026,
        5,
        120.0,
    )
    .expect("carga");

    // Nada validado todavía.
    assert!(db::cargas::validadas_sin_publicar(&conn)
        .expect("consulta")
        .is_empty());

    db::cargas::actualizar_estado(&conn, carga.id, Estado::Validado, None).expect("validar");
    let publicables = db::cargas::validadas_sin_publicar(&conn).expect("consulta");
    assert_eq!(publicables.len(), 1);
    let p = &publicables[0];
    assert_eq!(p.ministerio, "Ministerio de Salud");
    assert_eq!(p.codigo, "SAL-001");
    assert_eq!(p.meta, Some(130.0));

    db::cargas::marcar_publicada(&conn, carga.id, "2026-08-06T12:00:00Z").expect("publicar");
    assert!(db::cargas::validadas_sin_publicar(&conn)
        .expect("consulta")
        .is_empty());

    let recargada = db::cargas::por_id(&conn, carga.id)
        .expect("consulta")
        .expect("existe");
    assert!(recargada.publicado);
    assert_eq!(
        recargada.fecha_publicacion.as_deref(),
        Some("2026-08-06T12:00:00Z")
    );
}

#[test]
fn eliminaciones_con_dependientes_se_rechazan() {
    let conn = conexion_de_prueba();
    let ctx = armar_catalogo(&conn);

    assert!(db::ministerios::eliminar(&conn, ctx.ministerio_id).is_err());
    assert!(db::lineas::eliminar(&conn, ctx.indicador_mensual.linea_id).is_err());

    db::cargas::crear(
        &conn,
        &ctx.indicador_mensual,
        ctx.ministerio_id,
        ctx.usuario_id,
        2026,
        1,
        1.0,
    )
    .expect("carga");
    assert!(db::indicadores::eliminar(&conn, ctx.indicador_mensual.id).is_err());

    // Sin cargas sí se puede.
    assert!(db::indicadores::eliminar(&conn, ctx.indicador_trimestral.id).expect("eliminar"));
}

#[test]
fn auditoria_registra_y_filtra() {
    let conn = conexion_de_prueba();
    let ctx = armar_catalogo(&conn);

    db::auditoria::registrar(
        &conn,
        Some(ctx.usuario_id),
        Some("operadora@salud.gob.ar"),
        "crear",
        "carga",
        Some(1),
        Some(&serde_json::json!({"mes": 5})),
    )
    .expect("registrar");
    db::auditoria::registrar(&conn, None, None, "sync", "carga", None, None).expect("registrar");

    let todo = db::auditoria::listar(&conn, &Default::default()).expect("listar");
    assert_eq!(todo.len(), 2);

    let solo_sync = db::auditoria::listar(
        &conn,
        &db::auditoria::FiltrosAuditoria {
            accion: Some("sync".to_string()),
            ..Default::default()
        },
    )
    .expect("listar filtrado");
    assert_eq!(solo_sync.len(), 1);

    let ultima = db::auditoria::ultimo_por_accion(&conn, "sync")
        .expect("consulta")
        .expect("existe");
    assert_eq!(ultima.accion, "sync");
}

#[test]
fn sembrado_de_admin_es_idempotente() {
    let conn = conexion_de_prueba();
    db::conn::sembrar_admin(&conn, "clave-inicial").expect("sembrar");
    db::conn::sembrar_admin(&conn, "otra-clave").expect("re-sembrar");

    let usuarios = db::usuarios::listar(&conn).expect("listar");
    assert_eq!(usuarios.len(), 1);
    assert_eq!(usuarios[0].rol, Rol::Admin);

    let admin = db::usuarios::autenticar(&conn, "admin@sipio.gob.ar", "clave-inicial")
        .expect("autenticar")
        .expect("la clave original sigue vigente");
    assert!(admin.activo);
}
