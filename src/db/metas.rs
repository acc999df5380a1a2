use rusqlite::{Connection, OptionalExtension, params};
use std::error::Error;

use crate::models::MetaMensual;

fn fila_a_meta(row: &rusqlite::Row<'_>) -> rusqlite::Result<MetaMensual> {
    Ok(MetaMensual {
        id: row.get(0)?,
        indicador_id: row.get(1)?,
        anio: row.get(2)?,
        mes: row.get::<_, i64>(3)? as u32,
        valor: row.get(4)?,
    })
}

/// Alta/actualización en lote de las metas de un año. Devuelve la cantidad
/// de filas escritas.
pub fn upsert_lote(
    conn: &Connection,
    indicador_id: i64,
    anio: i32,
    metas: &[(u32, f64)],
) -> Result<usize, Box<dyn Error>> {
    let mut escritas = 0usize;
    for (mes, valor) in metas {
        if !(1..=12).contains(mes) {
            return Err(format!("mes fuera de rango: {}", mes).into());
        }
        conn.execute(
            "INSERT INTO metas_mensuales (indicador_id, anio, mes, valor)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(indicador_id, anio, mes) DO UPDATE SET valor = excluded.valor",
            params![indicador_id, anio, *mes as i64, valor],
        )?;
        escritas += 1;
    }
    Ok(escritas)
}

pub fn listar(
    conn: &Connection,
    indicador_id: i64,
    anio: i32,
) -> Result<Vec<MetaMensual>, Box<dyn Error>> {
    let mut stmt = conn.prepare(
        "SELECT id, indicador_id, anio, mes, valor
         FROM metas_mensuales WHERE indicador_id = ?1 AND anio = ?2 ORDER BY mes",
    )?;
    let filas = stmt.query_map(params![indicador_id, anio], fila_a_meta)?;
    let mut res = Vec::new();
    for f in filas {
        res.push(f?);
    }
    Ok(res)
}

pub fn por_periodo(
    conn: &Connection,
    indicador_id: i64,
    anio: i32,
    mes: u32,
) -> Result<Option<f64>, Box<dyn Error>> {
    let v = conn
        .query_row(
            "SELECT valor FROM metas_mensuales
             WHERE indicador_id = ?1 AND anio = ?2 AND mes = ?3",
            params![indicador_id, anio, mes as i64],
            |row| row.get(0),
        )
        .optional()?;
    Ok(v)
}
