// Biblioteca raíz del crate `sipio`.
// Reexporta los módulos principales y la función de conveniencia
// `run_server` que levanta la API.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod excel;
pub mod models;
pub mod server;
pub mod sheets;
pub mod workflow;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;
