use rusqlite::{Connection, OptionalExtension, params};
use std::error::Error;

use crate::models::Ministerio;

fn fila_a_ministerio(row: &rusqlite::Row<'_>) -> rusqlite::Result<Ministerio> {
    Ok(Ministerio {
        id: row.get(0)?,
        nombre: row.get(1)?,
        sigla: row.get(2)?,
        activo: row.get::<_, i64>(3)? != 0,
    })
}

pub fn crear(conn: &Connection, nombre: &str, sigla: &str) -> Result<Ministerio, Box<dyn Error>> {
    conn.execute(
        "INSERT INTO ministerios (nombre, sigla, activo) VALUES (?1, ?2, 1)",
        params![nombre.trim(), sigla.trim().to_uppercase()],
    )?;
    let id = conn.last_insert_rowid();
    por_id(conn, id)?.ok_or_else(|| "ministerio recién creado no encontrado".into())
}

pub fn por_id(conn: &Connection, id: i64) -> Result<Option<Ministerio>, Box<dyn Error>> {
    let m = conn
        .query_row(
            "SELECT id, nombre, sigla, activo FROM ministerios WHERE id = ?1",
            params![id],
            fila_a_ministerio,
        )
        .optional()?;
    Ok(m)
}

pub fn listar(conn: &Connection, solo_activos: bool) -> Result<Vec<Ministerio>, Box<dyn Error>> {
    let sql = if solo_activos {
        "SELECT id, nombre, sigla, activo FROM ministerios WHERE activo = 1 ORDER BY nombre"
    } else {
        "SELECT id, nombre, sigla, activo FROM ministerios ORDER BY nombre"
    };
    let mut stmt = conn.prepare(sql)?;
    let filas = stmt.query_map([], fila_a_ministerio)?;
    let mut res = Vec::new();
    for f in filas {
        res.push(f?);
    }
    Ok(res)
}

pub fn actualizar(
    conn: &Connection,
    id: i64,
    nombre: &str,
    sigla: &str,
    activo: bool,
) -> Result<bool, Box<dyn Error>> {
    let n = conn.execute(
        "UPDATE ministerios SET nombre = ?1, sigla = ?2, activo = ?3 WHERE id = ?4",
        params![nombre.trim(), sigla.trim().to_uppercase(), activo as i64, id],
    )?;
    Ok(n > 0)
}

/// Borra un ministerio sin dependencias. Con líneas asociadas se rechaza.
pub fn eliminar(conn: &Connection, id: i64) -> Result<bool, Box<dyn Error>> {
    let dependientes: i64 = conn.query_row(
        "SELECT COUNT(*) FROM lineas WHERE ministerio_id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    if dependientes > 0 {
        return Err(format!("el ministerio {} tiene {} líneas asociadas", id, dependientes).into());
    }
    let n = conn.execute("DELETE FROM ministerios WHERE id = ?1", params![id])?;
    Ok(n > 0)
}
