use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;
use std::error::Error;

use crate::errors::SipioError;
use crate::models::{Carga, Estado, Indicador};

fn fila_a_carga(row: &rusqlite::Row<'_>) -> rusqlite::Result<Carga> {
    let estado_raw: String = row.get(7)?;
    let estado = Estado::parse(&estado_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            format!("estado desconocido: {}", estado_raw).into(),
        )
    })?;
    Ok(Carga {
        id: row.get(0)?,
        indicador_id: row.get(1)?,
        ministerio_id: row.get(2)?,
        usuario_id: row.get(3)?,
        anio: row.get(4)?,
        mes: row.get::<_, i64>(5)? as u32,
        valor: row.get(6)?,
        estado,
        observacion: row.get(8)?,
        publicado: row.get::<_, i64>(9)? != 0,
        fecha_publicacion: row.get(10)?,
        creado_en: row.get(11)?,
        actualizado_en: row.get(12)?,
    })
}

const COLUMNAS: &str = "id, indicador_id, ministerio_id, usuario_id, anio, mes, valor, estado, \
                        observacion, publicado, fecha_publicacion, creado_en, actualizado_en";

/// Filtros de listado; todos opcionales y combinables.
#[derive(Debug, Default, Clone)]
pub struct FiltrosCarga {
    pub ministerio_id: Option<i64>,
    pub indicador_id: Option<i64>,
    pub estado: Option<Estado>,
    pub anio: Option<i32>,
    pub mes: Option<u32>,
}

/// Alta de una carga en borrador. Valida la grilla de periodicidad y la
/// unicidad del período (las rechazadas no bloquean un reintento).
pub fn crear(
    conn: &Connection,
    indicador: &Indicador,
    ministerio_id: i64,
    usuario_id: i64,
    anio: i32,
    mes: u32,
    valor: f64,
) -> Result<Carga, Box<dyn Error>> {
    if !indicador.periodicidad.mes_valido(mes) {
        return Err(Box::new(SipioError::PeriodoInvalido {
            mes,
            periodicidad: indicador.periodicidad.as_str().to_string(),
        }));
    }

    let activa: i64 = conn.query_row(
        "SELECT COUNT(*) FROM cargas
         WHERE indicador_id = ?1 AND anio = ?2 AND mes = ?3 AND estado != 'rechazado'",
        params![indicador.id, anio, mes as i64],
        |row| row.get(0),
    )?;
    if activa > 0 {
        return Err(Box::new(SipioError::CargaDuplicada {
            indicador_id: indicador.id,
            anio,
            mes,
        }));
    }

    let ahora = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO cargas
            (indicador_id, ministerio_id, usuario_id, anio, mes, valor,
             estado, observacion, publicado, fecha_publicacion, creado_en, actualizado_en)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, 0, NULL, ?8, ?8)",
        params![
            indicador.id,
            ministerio_id,
            usuario_id,
            anio,
            mes as i64,
            valor,
            Estado::Borrador.as_str(),
            ahora
        ],
    )?;
    let id = conn.last_insert_rowid();
    por_id(conn, id)?.ok_or_else(|| "carga recién creada no encontrada".into())
}

pub fn por_id(conn: &Connection, id: i64) -> Result<Option<Carga>, Box<dyn Error>> {
    let c = conn
        .query_row(
            &format!("SELECT {} FROM cargas WHERE id = ?1", COLUMNAS),
            params![id],
            fila_a_carga,
        )
        .optional()?;
    Ok(c)
}

pub fn listar(conn: &Connection, filtros: &FiltrosCarga) -> Result<Vec<Carga>, Box<dyn Error>> {
    let mut condiciones: Vec<&str> = Vec::new();
    let mut valores: Vec<Value> = Vec::new();

    if let Some(mid) = filtros.ministerio_id {
        condiciones.push("ministerio_id = ?");
        valores.push(Value::Integer(mid));
    }
    if let Some(iid) = filtros.indicador_id {
        condiciones.push("indicador_id = ?");
        valores.push(Value::Integer(iid));
    }
    if let Some(estado) = filtros.estado {
        condiciones.push("estado = ?");
        valores.push(Value::Text(estado.as_str().to_string()));
    }
    if let Some(anio) = filtros.anio {
        condiciones.push("anio = ?");
        valores.push(Value::Integer(anio as i64));
    }
    if let Some(mes) = filtros.mes {
        condiciones.push("mes = ?");
        valores.push(Value::Integer(mes as i64));
    }

    let mut sql = format!("SELECT {} FROM cargas", COLUMNAS);
    if !condiciones.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&condiciones.join(" AND "));
    }
    sql.push_str(" ORDER BY anio DESC, mes DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let filas = stmt.query_map(params_from_iter(valores.iter()), fila_a_carga)?;
    let mut res = Vec::new();
    for f in filas {
        res.push(f?);
    }
    Ok(res)
}

pub fn actualizar_valor(conn: &Connection, id: i64, valor: f64) -> Result<bool, Box<dyn Error>> {
    let n = conn.execute(
        "UPDATE cargas SET valor = ?1, actualizado_en = ?2 WHERE id = ?3",
        params![valor, Utc::now().to_rfc3339(), id],
    )?;
    Ok(n > 0)
}

pub fn actualizar_estado(
    conn: &Connection,
    id: i64,
    estado: Estado,
    observacion: Option<&str>,
) -> Result<bool, Box<dyn Error>> {
    let n = conn.execute(
        "UPDATE cargas SET estado = ?1, observacion = ?2, actualizado_en = ?3 WHERE id = ?4",
        params![estado.as_str(), observacion, Utc::now().to_rfc3339(), id],
    )?;
    Ok(n > 0)
}

pub fn marcar_publicada(conn: &Connection, id: i64, ts: &str) -> Result<bool, Box<dyn Error>> {
    let n = conn.execute(
        "UPDATE cargas SET publicado = 1, fecha_publicacion = ?1, actualizado_en = ?1 WHERE id = ?2",
        params![ts, id],
    )?;
    Ok(n > 0)
}

/// Fila lista para publicar en la planilla: carga validada con su contexto
/// de catálogo y la meta del período (si existe).
#[derive(Debug, Clone, Serialize)]
pub struct CargaPublicable {
    pub carga_id: i64,
    pub ministerio: String,
    pub linea: String,
    pub codigo: String,
    pub indicador: String,
    pub anio: i32,
    pub mes: u32,
    pub valor: f64,
    pub meta: Option<f64>,
    pub fecha_validacion: String,
}

pub fn validadas_sin_publicar(conn: &Connection) -> Result<Vec<CargaPublicable>, Box<dyn Error>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, m.nombre, l.nombre, i.codigo, i.nombre, c.anio, c.mes, c.valor,
                mm.valor, c.actualizado_en
         FROM cargas c
         JOIN indicadores i ON i.id = c.indicador_id
         JOIN lineas l ON l.id = i.linea_id
         JOIN ministerios m ON m.id = c.ministerio_id
         LEFT JOIN metas_mensuales mm
                ON mm.indicador_id = c.indicador_id AND mm.anio = c.anio AND mm.mes = c.mes
         WHERE c.estado = 'validado' AND c.publicado = 0
         ORDER BY c.anio, c.mes, i.codigo",
    )?;
    let filas = stmt.query_map([], |row| {
        Ok(CargaPublicable {
            carga_id: row.get(0)?,
            ministerio: row.get(1)?,
            linea: row.get(2)?,
            codigo: row.get(3)?,
            indicador: row.get(4)?,
            anio: row.get(5)?,
            mes: row.get::<_, i64>(6)? as u32,
            valor: row.get(7)?,
            meta: row.get(8)?,
            fecha_validacion: row.get(9)?,
        })
    })?;
    let mut res = Vec::new();
    for f in filas {
        res.push(f?);
    }
    Ok(res)
}

/// Conteo de cargas por estado más el total de publicadas.
pub fn resumen_estados(conn: &Connection) -> Result<serde_json::Value, Box<dyn Error>> {
    let mut stmt = conn.prepare("SELECT estado, COUNT(*) FROM cargas GROUP BY estado")?;
    let filas = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    let mut por_estado = serde_json::Map::new();
    for f in filas {
        let (estado, cuenta) = f?;
        por_estado.insert(estado, serde_json::json!(cuenta));
    }
    let publicadas: i64 = conn.query_row(
        "SELECT COUNT(*) FROM cargas WHERE publicado = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(serde_json::json!({
        "por_estado": por_estado,
        "publicadas": publicadas,
    }))
}
