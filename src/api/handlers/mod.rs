pub mod auditoria;
pub mod auth;
pub mod cargas;
pub mod docs;
pub mod indicadores;
pub mod lineas;
pub mod metas;
pub mod ministerios;
pub mod sync;
pub mod usuarios;

pub use auditoria::*;
pub use auth::*;
pub use cargas::*;
pub use docs::*;
pub use indicadores::*;
pub use lineas::*;
pub use metas::*;
pub use ministerios::*;
pub use sync::*;
pub use usuarios::*;
