use serde::Serialize;
use std::error::Error;
use std::path::Path;

use crate::models::Indicador;

/// Fila del export de cargas a planilla.
#[derive(Debug, Clone, Serialize)]
pub struct FilaExport {
    pub codigo: String,
    pub indicador: String,
    pub ministerio: String,
    pub anio: i32,
    pub mes: u32,
    pub valor: f64,
    pub estado: String,
    pub publicado: bool,
}

/// Coordenada A1 para las primeras columnas (alcanza para estas hojas).
fn celda(col: usize, fila: u32) -> String {
    let letras = ["A", "B", "C", "D", "E", "F", "G", "H"];
    format!("{}{}", letras[col], fila)
}

const ENCABEZADOS_CARGAS: [&str; 4] = ["Indicador", "Año", "Mes", "Valor"];

/// Genera la plantilla de importación: la hoja principal con los
/// encabezados de carga y una hoja "Indicadores" con el catálogo
/// disponible como referencia.
pub fn generar_plantilla<P: AsRef<Path>>(
    path: P,
    indicadores: &[Indicador],
) -> Result<(), Box<dyn Error>> {
    let mut book = umya_spreadsheet::new_file();

    let hoja = book
        .get_sheet_by_name_mut("Sheet1")
        .map_err(|e| format!("hoja inicial no encontrada: {}", e))?;
    for (col, titulo) in ENCABEZADOS_CARGAS.iter().enumerate() {
        hoja.get_cell_mut(&celda(col, 1)).set_value(*titulo);
    }

    let catalogo = book
        .new_sheet("Indicadores")
        .map_err(|e| format!("no se pudo crear hoja de catálogo: {}", e))?;
    for (col, titulo) in ["Código", "Nombre", "Periodicidad", "Unidad"].iter().enumerate() {
        catalogo.get_cell_mut(&celda(col, 1)).set_value(*titulo);
    }
    for (i, ind) in indicadores.iter().enumerate() {
        let fila = i as u32 + 2;
        catalogo.get_cell_mut(&celda(0, fila)).set_value(ind.codigo.clone());
        catalogo.get_cell_mut(&celda(1, fila)).set_value(ind.nombre.clone());
        catalogo
            .get_cell_mut(&celda(2, fila))
            .set_value(ind.periodicidad.as_str());
        catalogo
            .get_cell_mut(&celda(3, fila))
            .set_value(ind.unidad_medida.clone().unwrap_or_default());
    }

    umya_spreadsheet::writer::xlsx::write(&book, path.as_ref())
        .map_err(|e| format!("no se pudo escribir xlsx: {:?}", e))?;
    Ok(())
}

/// Escribe el export de cargas (una hoja, una fila por carga).
pub fn exportar_cargas<P: AsRef<Path>>(
    path: P,
    filas: &[FilaExport],
) -> Result<(), Box<dyn Error>> {
    let mut book = umya_spreadsheet::new_file();
    let hoja = book
        .get_sheet_by_name_mut("Sheet1")
        .map_err(|e| format!("hoja inicial no encontrada: {}", e))?;

    let encabezados = [
        "Código", "Indicador", "Ministerio", "Año", "Mes", "Valor", "Estado", "Publicado",
    ];
    for (col, titulo) in encabezados.iter().enumerate() {
        hoja.get_cell_mut(&celda(col, 1)).set_value(*titulo);
    }

    for (i, f) in filas.iter().enumerate() {
        let fila = i as u32 + 2;
        hoja.get_cell_mut(&celda(0, fila)).set_value(f.codigo.clone());
        hoja.get_cell_mut(&celda(1, fila)).set_value(f.indicador.clone());
        hoja.get_cell_mut(&celda(2, fila)).set_value(f.ministerio.clone());
        hoja.get_cell_mut(&celda(3, fila)).set_value(f.anio.to_string());
        hoja.get_cell_mut(&celda(4, fila)).set_value(f.mes.to_string());
        hoja.get_cell_mut(&celda(5, fila)).set_value(f.valor.to_string());
        hoja.get_cell_mut(&celda(6, fila)).set_value(f.estado.clone());
        hoja.get_cell_mut(&celda(7, fila))
            .set_value(if f.publicado { "sí" } else { "no" });
    }

    umya_spreadsheet::writer::xlsx::write(&book, path.as_ref())
        .map_err(|e| format!("no se pudo escribir xlsx: {:?}", e))?;
    Ok(())
}
