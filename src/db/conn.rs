use rusqlite::Connection;
use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use crate::auth::claves;
use crate::models::Rol;

// load .env at module init if present
fn load_dotenv() {
    let _ = dotenv::dotenv();
}

/// Ruta del archivo SQLite. Honra SIPIO_DB_PATH / SIPIO_DB_URL
/// (sqlite:// y file:// se aceptan como URL de archivo local).
pub fn db_path() -> PathBuf {
    load_dotenv();
    if let Ok(p) = env::var("SIPIO_DB_PATH") {
        PathBuf::from(p)
    } else if let Ok(p) = env::var("SIPIO_DB_URL") {
        if p.starts_with("sqlite://") {
            PathBuf::from(p.trim_start_matches("sqlite://"))
        } else if p.starts_with("file://") {
            PathBuf::from(p.trim_start_matches("file://"))
        } else {
            PathBuf::from("data/sipio.db")
        }
    } else {
        PathBuf::from("data/sipio.db")
    }
}

/// Abre una conexión de vida corta al almacén configurado.
pub fn abrir() -> Result<Connection, Box<dyn Error>> {
    let path = db_path();
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

/// Crea el esquema completo sobre una conexión ya abierta.
pub fn init_esquema(conn: &Connection) -> Result<(), Box<dyn Error>> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS ministerios (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nombre TEXT NOT NULL UNIQUE,
            sigla TEXT NOT NULL,
            activo INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS lineas (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ministerio_id INTEGER NOT NULL REFERENCES ministerios(id),
            nombre TEXT NOT NULL,
            descripcion TEXT,
            activo INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS indicadores (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            linea_id INTEGER NOT NULL REFERENCES lineas(id),
            codigo TEXT NOT NULL UNIQUE,
            nombre TEXT NOT NULL,
            unidad_medida TEXT,
            periodicidad TEXT NOT NULL,
            activo INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS metas_mensuales (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            indicador_id INTEGER NOT NULL REFERENCES indicadores(id),
            anio INTEGER NOT NULL,
            mes INTEGER NOT NULL,
            valor REAL NOT NULL,
            UNIQUE(indicador_id, anio, mes)
        );

        CREATE TABLE IF NOT EXISTS usuarios (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            nombre TEXT NOT NULL,
            clave_hash TEXT NOT NULL,
            rol TEXT NOT NULL,
            ministerio_id INTEGER REFERENCES ministerios(id),
            activo INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS cargas (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            indicador_id INTEGER NOT NULL REFERENCES indicadores(id),
            ministerio_id INTEGER NOT NULL REFERENCES ministerios(id),
            usuario_id INTEGER NOT NULL REFERENCES usuarios(id),
            anio INTEGER NOT NULL,
            mes INTEGER NOT NULL,
            valor REAL NOT NULL,
            estado TEXT NOT NULL,
            observacion TEXT,
            publicado INTEGER NOT NULL DEFAULT 0,
            fecha_publicacion TEXT,
            creado_en TEXT NOT NULL,
            actualizado_en TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cargas_periodo
            ON cargas(indicador_id, anio, mes);

        CREATE TABLE IF NOT EXISTS auditoria (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ts TEXT NOT NULL,
            usuario_id INTEGER,
            email TEXT,
            accion TEXT NOT NULL,
            entidad TEXT NOT NULL,
            entidad_id INTEGER,
            detalle_json TEXT
        );",
    )?;
    Ok(())
}

/// Inicializa el almacén: esquema + admin inicial si la tabla de
/// usuarios está vacía.
pub fn init_db(admin_clave_inicial: &str) -> Result<(), Box<dyn Error>> {
    let conn = abrir()?;
    init_esquema(&conn)?;
    sembrar_admin(&conn, admin_clave_inicial)?;
    Ok(())
}

/// Crea el admin inicial sólo si no hay ningún usuario registrado.
pub fn sembrar_admin(conn: &Connection, clave: &str) -> Result<(), Box<dyn Error>> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM usuarios", [], |row| row.get(0))?;
    if total > 0 {
        return Ok(());
    }
    let hash = claves::hashear(clave);
    conn.execute(
        "INSERT INTO usuarios (email, nombre, clave_hash, rol, ministerio_id, activo)
         VALUES (?1, ?2, ?3, ?4, NULL, 1)",
        rusqlite::params!["admin@sipio.gob.ar", "Administrador", hash, Rol::Admin.as_str()],
    )?;
    Ok(())
}
