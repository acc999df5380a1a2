pub mod auditoria;
pub mod cargas;
pub mod conn;
pub mod indicadores;
pub mod lineas;
pub mod metas;
pub mod ministerios;
pub mod usuarios;

pub use conn::{abrir, db_path, init_db, init_esquema};
