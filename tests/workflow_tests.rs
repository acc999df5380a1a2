// Ciclo de vida completo de una carga contra el almacén, aplicando el
// flujo de revisión como lo hacen los handlers.

use rusqlite::Connection;

use sipio::db;
use sipio::errors::SipioError;
use sipio::models::{Estado, Periodicidad, Rol};
use sipio::workflow;

fn conexion_de_prueba() -> Connection {
    let conn = Connection::open_in_memory().expect("sqlite en memoria");
    db::init_esquema(&conn).expect("esquema");
    conn
}

fn transicionar(
    conn: &Connection,
    carga_id: i64,
    destino: Estado,
    rol: Rol,
    es_propietaria: bool,
    observacion: Option<&str>,
) -> Result<Estado, SipioError> {
    let carga = db::cargas::por_id(conn, carga_id)
        .expect("consulta")
        .expect("la carga existe");
    let t = workflow::aplicar_transicion(
        carga.estado,
        destino,
        rol,
        es_propietaria,
        observacion.map(|s| s.to_string()),
    )?;
    db::cargas::actualizar_estado(conn, carga_id, t.estado, t.observacion.as_deref())
        .expect("actualización");
    Ok(t.estado)
}

#[test]
fn ciclo_observacion_y_validacion() {
    let conn = conexion_de_prueba();
    let ministerio = db::ministerios::crear(&conn, "Ministerio de Obras", "OBR").expect("ministerio");
    let linea = db::lineas::crear(&conn, ministerio.id, "Obra pública", None).expect("línea");
    let indicador = db::indicadores::crear(
        &conn,
        linea.id,
        "OBR-010",
        "Kilómetros pavimentados",
        Some("km"),
        Periodicidad::Mensual,
    )
    .expect("indicador");
    let operador = db::usuarios::crear(
        &conn,
        "operador@obras.gob.ar",
        "Operador Obras",
        "clave-segura",
        Rol::Operador,
        Some(ministerio.id),
    )
    .expect("usuario");

    let carga = db::cargas::crear(&conn, &indicador, ministerio.id, operador.id, 2026, 4, 42.0)
        .expect("carga en borrador");

    // El operador envía, el revisor observa.
    transicionar(&conn, carga.id, Estado::Pendiente, Rol::Operador, true, None).expect("enviar");
    transicionar(
        &conn,
        carga.id,
        Estado::Observado,
        Rol::Revisor,
        false,
        Some("falta el dato de la zona sur"),
    )
    .expect("observar");

    let observada = db::cargas::por_id(&conn, carga.id).expect("consulta").expect("existe");
    assert_eq!(observada.estado, Estado::Observado);
    assert_eq!(
        observada.observacion.as_deref(),
        Some("falta el dato de la zona sur")
    );

    // El operador corrige el valor (la carga observada sigue editable) y reenvía.
    assert!(workflow::puede_editar(observada.estado));
    db::cargas::actualizar_valor(&conn, carga.id, 47.5).expect("corrección");
    transicionar(&conn, carga.id, Estado::Pendiente, Rol::Operador, true, None).expect("reenviar");

    let reenviada = db::cargas::por_id(&conn, carga.id).expect("consulta").expect("existe");
    assert_eq!(reenviada.observacion, None, "el reenvío limpia la observación");

    // Validación final.
    transicionar(&conn, carga.id, Estado::Validado, Rol::Revisor, false, None).expect("validar");
    let validada = db::cargas::por_id(&conn, carga.id).expect("consulta").expect("existe");
    assert_eq!(validada.estado, Estado::Validado);
    assert_eq!(validada.valor, 47.5);
    assert!(!workflow::puede_editar(validada.estado));

    // Una carga validada salió del ciclo de revisión.
    let r = transicionar(&conn, carga.id, Estado::Pendiente, Rol::Admin, true, None);
    assert!(matches!(r, Err(SipioError::TransicionInvalida { .. })));
}

#[test]
fn tabla_de_transiciones() {
    assert_eq!(
        workflow::transiciones_validas(Estado::Pendiente),
        &[Estado::Validado, Estado::Observado, Estado::Rechazado]
    );
    assert!(workflow::transiciones_validas(Estado::Validado).is_empty());
    assert!(workflow::transiciones_validas(Estado::Rechazado).is_empty());
}
