use rusqlite::{Connection, OptionalExtension, params};
use std::error::Error;

use crate::auth::claves;
use crate::models::{Rol, Usuario};

fn fila_a_usuario(row: &rusqlite::Row<'_>) -> rusqlite::Result<Usuario> {
    let rol_raw: String = row.get(4)?;
    let rol = Rol::parse(&rol_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("rol desconocido: {}", rol_raw).into(),
        )
    })?;
    Ok(Usuario {
        id: row.get(0)?,
        email: row.get(1)?,
        nombre: row.get(2)?,
        clave_hash: row.get(3)?,
        rol,
        ministerio_id: row.get(5)?,
        activo: row.get::<_, i64>(6)? != 0,
    })
}

const COLUMNAS: &str = "id, email, nombre, clave_hash, rol, ministerio_id, activo";

pub fn crear(
    conn: &Connection,
    email: &str,
    nombre: &str,
    clave: &str,
    rol: Rol,
    ministerio_id: Option<i64>,
) -> Result<Usuario, Box<dyn Error>> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(format!("email inválido: '{}'", email).into());
    }
    if rol == Rol::Operador && ministerio_id.is_none() {
        return Err("un operador requiere ministerio asignado".into());
    }
    let hash = claves::hashear(clave);
    conn.execute(
        "INSERT INTO usuarios (email, nombre, clave_hash, rol, ministerio_id, activo)
         VALUES (?1, ?2, ?3, ?4, ?5, 1)",
        params![email, nombre.trim(), hash, rol.as_str(), ministerio_id],
    )?;
    let id = conn.last_insert_rowid();
    por_id(conn, id)?.ok_or_else(|| "usuario recién creado no encontrado".into())
}

pub fn por_id(conn: &Connection, id: i64) -> Result<Option<Usuario>, Box<dyn Error>> {
    let u = conn
        .query_row(
            &format!("SELECT {} FROM usuarios WHERE id = ?1", COLUMNAS),
            params![id],
            fila_a_usuario,
        )
        .optional()?;
    Ok(u)
}

pub fn por_email(conn: &Connection, email: &str) -> Result<Option<Usuario>, Box<dyn Error>> {
    let u = conn
        .query_row(
            &format!("SELECT {} FROM usuarios WHERE email = ?1", COLUMNAS),
            params![email.trim().to_lowercase()],
            fila_a_usuario,
        )
        .optional()?;
    Ok(u)
}

pub fn listar(conn: &Connection) -> Result<Vec<Usuario>, Box<dyn Error>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM usuarios ORDER BY email", COLUMNAS))?;
    let filas = stmt.query_map([], fila_a_usuario)?;
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
    rol: Rol,
    ministerio_id: Option<i64>,
    activo: bool,
) -> Result<bool, Box<dyn Error>> {
    if rol == Rol::Operador && ministerio_id.is_none() {
        return Err("un operador requiere ministerio asignado".into());
    }
    let n = conn.execute(
        "UPDATE usuarios SET nombre = ?1, rol = ?2, ministerio_id = ?3, activo = ?4 WHERE id = ?5",
        params![nombre.trim(), rol.as_str(), ministerio_id, activo as i64, id],
    )?;
    Ok(n > 0)
}

pub fn cambiar_clave(conn: &Connection, id: i64, clave_nueva: &str) -> Result<bool, Box<dyn Error>> {
    if clave_nueva.len() < 8 {
        return Err("la clave debe tener al menos 8 caracteres".into());
    }
    let hash = claves::hashear(clave_nueva);
    let n = conn.execute(
        "UPDATE usuarios SET clave_hash = ?1 WHERE id = ?2",
        params![hash, id],
    )?;
    Ok(n > 0)
}

/// La baja de usuarios es lógica: las cargas históricas referencian al autor.
pub fn desactivar(conn: &Connection, id: i64) -> Result<bool, Box<dyn Error>> {
    let n = conn.execute(
        "UPDATE usuarios SET activo = 0 WHERE id = ?1",
        params![id],
    )?;
    Ok(n > 0)
}

/// Login: email + clave contra el hash almacenado. Usuarios inactivos no entran.
pub fn autenticar(
    conn: &Connection,
    email: &str,
    clave: &str,
) -> Result<Option<Usuario>, Box<dyn Error>> {
    let usuario = match por_email(conn, email)? {
        Some(u) => u,
        None => return Ok(None),
    };
    if !usuario.activo || !claves::verificar(clave, &usuario.clave_hash) {
        return Ok(None);
    }
    Ok(Some(usuario))
}
