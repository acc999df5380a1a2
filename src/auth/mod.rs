pub mod claves;
pub mod jwt;

pub use jwt::{Claims, decodificar_token, emitir_token};
