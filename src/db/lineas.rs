use rusqlite::{Connection, OptionalExtension, params};
use std::error::Error;

use crate::models::Linea;

fn fila_a_linea(row: &rusqlite::Row<'_>) -> rusqlite::Result<Linea> {
    Ok(Linea {
        id: row.get(0)?,
        ministerio_id: row.get(1)?,
        nombre: row.get(2)?,
        descripcion: row.get(3)?,
        activo: row.get::<_, i64>(4)? != 0,
    })
}

pub fn crear(
    conn: &Connection,
    ministerio_id: i64,
    nombre: &str,
    descripcion: Option<&str>,
) -> Result<Linea, Box<dyn Error>> {
    let existe: i64 = conn.query_row(
        "SELECT COUNT(*) FROM ministerios WHERE id = ?1",
        params![ministerio_id],
        |row| row.get(0),
    )?;
    if existe == 0 {
        return Err(format!("ministerio {} inexistente", ministerio_id).into());
    }
    conn.execute(
        "INSERT INTO lineas (ministerio_id, nombre, descripcion, activo) VALUES (?1, ?2, ?3, 1)",
        params![ministerio_id, nombre.trim(), descripcion],
    )?;
    let id = conn.last_insert_rowid();
    por_id(conn, id)?.ok_or_else(|| "línea recién creada no encontrada".into())
}

pub fn por_id(conn: &Connection, id: i64) -> Result<Option<Linea>, Box<dyn Error>> {
    let l = conn
        .query_row(
            "SELECT id, ministerio_id, nombre, descripcion, activo FROM lineas WHERE id = ?1",
            params![id],
            fila_a_linea,
        )
        .optional()?;
    Ok(l)
}

pub fn listar(
    conn: &Connection,
    ministerio_id: Option<i64>,
) -> Result<Vec<Linea>, Box<dyn Error>> {
    let mut res = Vec::new();
    match ministerio_id {
        Some(mid) => {
            let mut stmt = conn.prepare(
                "SELECT id, ministerio_id, nombre, descripcion, activo
                 FROM lineas WHERE ministerio_id = ?1 ORDER BY nombre",
            )?;
            let filas = stmt.query_map(params![mid], fila_a_linea)?;
            for f in filas {
                res.push(f?);
            }
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, ministerio_id, nombre, descripcion, activo
                 FROM lineas ORDER BY ministerio_id, nombre",
            )?;
            let filas = stmt.query_map([], fila_a_linea)?;
            for f in filas {
                res.push(f?);
            }
        }
    }
    Ok(res)
}

pub fn actualizar(
    conn: &Connection,
    id: i64,
    nombre: &str,
    descripcion: Option<&str>,
    activo: bool,
) -> Result<bool, Box<dyn Error>> {
    let n = conn.execute(
        "UPDATE lineas SET nombre = ?1, descripcion = ?2, activo = ?3 WHERE id = ?4",
        params![nombre.trim(), descripcion, activo as i64, id],
    )?;
    Ok(n > 0)
}

pub fn eliminar(conn: &Connection, id: i64) -> Result<bool, Box<dyn Error>> {
    let dependientes: i64 = conn.query_row(
        "SELECT COUNT(*) FROM indicadores WHERE linea_id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    if dependientes > 0 {
        return Err(format!("la línea {} tiene {} indicadores asociados", id, dependientes).into());
    }
    let n = conn.execute("DELETE FROM lineas WHERE id = ?1", params![id])?;
    Ok(n > 0)
}
