use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::error::Error;

use crate::models::RegistroAuditoria;

fn fila_a_registro(row: &rusqlite::Row<'_>) -> rusqlite::Result<RegistroAuditoria> {
    Ok(RegistroAuditoria {
        id: row.get(0)?,
        ts: row.get(1)?,
        usuario_id: row.get(2)?,
        email: row.get(3)?,
        accion: row.get(4)?,
        entidad: row.get(5)?,
        entidad_id: row.get(6)?,
        detalle_json: row.get(7)?,
    })
}

const COLUMNAS: &str = "id, ts, usuario_id, email, accion, entidad, entidad_id, detalle_json";

/// Inserta un registro de auditoría. Best-effort en los llamadores: una
/// auditoría fallida no debe voltear la operación ya hecha.
pub fn registrar(
    conn: &Connection,
    usuario_id: Option<i64>,
    email: Option<&str>,
    accion: &str,
    entidad: &str,
    entidad_id: Option<i64>,
    detalle: Option<&serde_json::Value>,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO auditoria (ts, usuario_id, email, accion, entidad, entidad_id, detalle_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            Utc::now().to_rfc3339(),
            usuario_id,
            email,
            accion,
            entidad,
            entidad_id,
            detalle.map(|d| d.to_string()),
        ],
    )?;
    Ok(())
}

#[derive(Debug, Default, Clone)]
pub struct FiltrosAuditoria {
    pub entidad: Option<String>,
    pub accion: Option<String>,
    pub usuario_id: Option<i64>,
    pub limite: Option<usize>,
}

pub fn listar(
    conn: &Connection,
    filtros: &FiltrosAuditoria,
) -> Result<Vec<RegistroAuditoria>, Box<dyn Error>> {
    let mut condiciones: Vec<&str> = Vec::new();
    let mut valores: Vec<Value> = Vec::new();

    if let Some(entidad) = &filtros.entidad {
        condiciones.push("entidad = ?");
        valores.push(Value::Text(entidad.clone()));
    }
    if let Some(accion) = &filtros.accion {
        condiciones.push("accion = ?");
        valores.push(Value::Text(accion.clone()));
    }
    if let Some(uid) = filtros.usuario_id {
        condiciones.push("usuario_id = ?");
        valores.push(Value::Integer(uid));
    }

    let mut sql = format!("SELECT {} FROM auditoria", COLUMNAS);
    if !condiciones.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&condiciones.join(" AND "));
    }
    sql.push_str(" ORDER BY id DESC LIMIT ");
    sql.push_str(&filtros.limite.unwrap_or(100).to_string());

    let mut stmt = conn.prepare(&sql)?;
    let filas = stmt.query_map(params_from_iter(valores.iter()), fila_a_registro)?;
    let mut res = Vec::new();
    for f in filas {
        res.push(f?);
    }
    Ok(res)
}

/// Último registro de una acción dada (p. ej. la última corrida de sync).
pub fn ultimo_por_accion(
    conn: &Connection,
    accion: &str,
) -> Result<Option<RegistroAuditoria>, Box<dyn Error>> {
    let r = conn
        .query_row(
            &format!(
                "SELECT {} FROM auditoria WHERE accion = ?1 ORDER BY id DESC LIMIT 1",
                COLUMNAS
            ),
            params![accion],
            fila_a_registro,
        )
        .optional()?;
    Ok(r)
}
