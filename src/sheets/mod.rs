pub mod client;
pub mod sync;

pub use client::{SheetsClient, es_reintentable, obtener_access_token};
pub use sync::{ResumenSync, ejecutar_sync};
