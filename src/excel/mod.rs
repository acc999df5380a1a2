//! Módulo `excel` dividido en submódulos para mantener el código organizado.
//!
//! Submódulos:
//! - `io`: helpers y utilidades para lectura/parseo de Excel
//! - `importar`: lectura masiva de cargas desde planillas .xlsx
//! - `plantilla`: generación de plantilla de importación y export de cargas

pub mod importar;
pub mod io;
pub mod plantilla;

pub use importar::{ResultadoImportacion, leer_cargas_xlsx, resolver_indicador};
pub use io::{cell_to_string, normalizar_encabezado, normalizar_nombre};
pub use plantilla::{FilaExport, exportar_cargas, generar_plantilla};
