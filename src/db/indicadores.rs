use rusqlite::{Connection, OptionalExtension, params};
use std::error::Error;

use crate::models::{Indicador, Periodicidad};

fn fila_a_indicador(row: &rusqlite::Row<'_>) -> rusqlite::Result<Indicador> {
    let periodicidad_raw: String = row.get(4)?;
    let periodicidad = Periodicidad::parse(&periodicidad_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("periodicidad desconocida: {}", periodicidad_raw).into(),
        )
    })?;
    Ok(Indicador {
        id: row.get(0)?,
        linea_id: row.get(1)?,
        codigo: row.get(2)?,
        nombre: row.get(3)?,
        periodicidad,
        unidad_medida: row.get(5)?,
        activo: row.get::<_, i64>(6)? != 0,
    })
}

const COLUMNAS: &str = "id, linea_id, codigo, nombre, periodicidad, unidad_medida, activo";

pub fn crear(
    conn: &Connection,
    linea_id: i64,
    codigo: &str,
    nombre: &str,
    unidad_medida: Option<&str>,
    periodicidad: Periodicidad,
) -> Result<Indicador, Box<dyn Error>> {
    let existe: i64 = conn.query_row(
        "SELECT COUNT(*) FROM lineas WHERE id = ?1",
        params![linea_id],
        |row| row.get(0),
    )?;
    if existe == 0 {
        return Err(format!("línea {} inexistente", linea_id).into());
    }
    conn.execute(
        "INSERT INTO indicadores (linea_id, codigo, nombre, unidad_medida, periodicidad, activo)
         VALUES (?1, ?2, ?3, ?4, ?5, 1)",
        params![
            linea_id,
            codigo.trim().to_uppercase(),
            nombre.trim(),
            unidad_medida,
            periodicidad.as_str()
        ],
    )?;
    let id = conn.last_insert_rowid();
    por_id(conn, id)?.ok_or_else(|| "indicador recién creado no encontrado".into())
}

pub fn por_id(conn: &Connection, id: i64) -> Result<Option<Indicador>, Box<dyn Error>> {
    let i = conn
        .query_row(
            &format!("SELECT {} FROM indicadores WHERE id = ?1", COLUMNAS),
            params![id],
            fila_a_indicador,
        )
        .optional()?;
    Ok(i)
}

pub fn por_codigo(conn: &Connection, codigo: &str) -> Result<Option<Indicador>, Box<dyn Error>> {
    let i = conn
        .query_row(
            &format!("SELECT {} FROM indicadores WHERE codigo = ?1", COLUMNAS),
            params![codigo.trim().to_uppercase()],
            fila_a_indicador,
        )
        .optional()?;
    Ok(i)
}

pub fn listar(conn: &Connection, linea_id: Option<i64>) -> Result<Vec<Indicador>, Box<dyn Error>> {
    let mut res = Vec::new();
    match linea_id {
        Some(lid) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM indicadores WHERE linea_id = ?1 ORDER BY codigo",
                COLUMNAS
            ))?;
            let filas = stmt.query_map(params![lid], fila_a_indicador)?;
            for f in filas {
                res.push(f?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM indicadores ORDER BY codigo",
                COLUMNAS
            ))?;
            let filas = stmt.query_map([], fila_a_indicador)?;
            for f in filas {
                res.push(f?);
            }
        }
    }
    Ok(res)
}

/// Indicadores activos de un ministerio (vía sus líneas). Usado por la
/// importación para restringir la resolución al ministerio del usuario.
pub fn activos_de_ministerio(
    conn: &Connection,
    ministerio_id: i64,
) -> Result<Vec<Indicador>, Box<dyn Error>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM indicadores i
         WHERE i.activo = 1
           AND i.linea_id IN (SELECT id FROM lineas WHERE ministerio_id = ?1)
         ORDER BY i.codigo",
        "i.id, i.linea_id, i.codigo, i.nombre, i.periodicidad, i.unidad_medida, i.activo"
    ))?;
    let filas = stmt.query_map(params![ministerio_id], fila_a_indicador)?;
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
    unidad_medida: Option<&str>,
    periodicidad: Periodicidad,
    activo: bool,
) -> Result<bool, Box<dyn Error>> {
    let n = conn.execute(
        "UPDATE indicadores
         SET nombre = ?1, unidad_medida = ?2, periodicidad = ?3, activo = ?4
         WHERE id = ?5",
        params![
            nombre.trim(),
            unidad_medida,
            periodicidad.as_str(),
            activo as i64,
            id
        ],
    )?;
    Ok(n > 0)
}

pub fn eliminar(conn: &Connection, id: i64) -> Result<bool, Box<dyn Error>> {
    let dependientes: i64 = conn.query_row(
        "SELECT COUNT(*) FROM cargas WHERE indicador_id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    if dependientes > 0 {
        return Err(format!("el indicador {} tiene {} cargas asociadas", id, dependientes).into());
    }
    conn.execute(
        "DELETE FROM metas_mensuales WHERE indicador_id = ?1",
        params![id],
    )?;
    let n = conn.execute("DELETE FROM indicadores WHERE id = ?1", params![id])?;
    Ok(n > 0)
}

/// Ministerio dueño del indicador (a través de su línea).
pub fn ministerio_de(conn: &Connection, indicador_id: i64) -> Result<Option<i64>, Box<dyn Error>> {
    let m = conn
        .query_row(
            "SELECT l.ministerio_id FROM indicadores i
             JOIN lineas l ON l.id = i.linea_id
             WHERE i.id = ?1",
            params![indicador_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(m)
}
