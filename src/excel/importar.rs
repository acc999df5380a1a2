use calamine::{Data, Reader, open_workbook_auto};
use serde::Serialize;
use std::error::Error;
use std::path::Path;

use crate::excel::io::{cell_to_string, normalizar_nombre};
use crate::models::Indicador;

/// Una fila de la planilla resuelta contra el catálogo.
#[derive(Debug, Clone, Serialize)]
pub struct FilaCarga {
    /// Número de fila en la planilla (1-based, contando el encabezado).
    pub fila: usize,
    pub indicador_id: i64,
    pub codigo: String,
    pub anio: i32,
    pub mes: u32,
    pub valor: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RechazoFila {
    pub fila: usize,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ResultadoImportacion {
    pub filas: Vec<FilaCarga>,
    pub rechazos: Vec<RechazoFila>,
}

/// Resuelve el texto de la columna indicador contra el catálogo: primero
/// código exacto, después nombre normalizado, después similitud
/// Jaro-Winkler (>= 0.90) sobre el nombre.
pub fn resolver_indicador<'a>(
    indicadores: &'a [Indicador],
    texto: &str,
) -> Option<&'a Indicador> {
    let texto = texto.trim();
    if texto.is_empty() {
        return None;
    }

    let codigo = texto.to_uppercase();
    if let Some(i) = indicadores.iter().find(|i| i.codigo == codigo) {
        return Some(i);
    }

    let nombre = normalizar_nombre(texto);
    if let Some(i) = indicadores
        .iter()
        .find(|i| normalizar_nombre(&i.nombre) == nombre)
    {
        return Some(i);
    }

    let mut mejor: Option<(&Indicador, f64)> = None;
    for i in indicadores {
        let puntaje = strsim::jaro_winkler(&nombre, &normalizar_nombre(&i.nombre));
        if puntaje >= 0.90 && mejor.map(|(_, p)| puntaje > p).unwrap_or(true) {
            mejor = Some((i, puntaje));
        }
    }
    mejor.map(|(i, _)| i)
}

struct IndicesColumnas {
    indicador: usize,
    anio: usize,
    mes: usize,
    valor: usize,
}

fn detectar_columnas(encabezados: &[String]) -> Result<IndicesColumnas, Box<dyn Error>> {
    let mut idx_indicador: Option<usize> = None;
    let mut idx_anio: Option<usize> = None;
    let mut idx_mes: Option<usize> = None;
    let mut idx_valor: Option<usize> = None;

    for (i, h) in encabezados.iter().enumerate() {
        // normalizar_nombre pisa tildes: "Año" -> "ano", "Período" -> "periodo"
        let h = normalizar_nombre(h);
        if h.contains("indicador") || h.contains("codigo") {
            idx_indicador.get_or_insert(i);
        }
        if h == "ano" || h.contains("anio") || h.contains("anodecarga") {
            idx_anio.get_or_insert(i);
        }
        if h == "mes" || h.contains("periodo") {
            idx_mes.get_or_insert(i);
        }
        if h.contains("valor") || h.contains("dato") {
            idx_valor.get_or_insert(i);
        }
    }

    match (idx_indicador, idx_anio, idx_mes, idx_valor) {
        (Some(indicador), Some(anio), Some(mes), Some(valor)) => Ok(IndicesColumnas {
            indicador,
            anio,
            mes,
            valor,
        }),
        _ => Err("la planilla debe tener columnas indicador, año, mes y valor".into()),
    }
}

fn parsear_fila(
    numero: usize,
    celdas: &[Data],
    idx: &IndicesColumnas,
    indicadores: &[Indicador],
) -> Result<FilaCarga, String> {
    let texto_indicador = cell_to_string(celdas.get(idx.indicador).unwrap_or(&Data::Empty));
    let indicador = resolver_indicador(indicadores, &texto_indicador)
        .ok_or_else(|| format!("indicador no reconocido: '{}'", texto_indicador))?;

    let anio_raw = cell_to_string(celdas.get(idx.anio).unwrap_or(&Data::Empty));
    let anio: i32 = anio_raw
        .parse()
        .map_err(|_| format!("año inválido: '{}'", anio_raw))?;
    if !(2000..=2100).contains(&anio) {
        return Err(format!("año fuera de rango: {}", anio));
    }

    let mes_raw = cell_to_string(celdas.get(idx.mes).unwrap_or(&Data::Empty));
    let mes: u32 = mes_raw
        .parse()
        .map_err(|_| format!("mes inválido: '{}'", mes_raw))?;
    if !(1..=12).contains(&mes) {
        return Err(format!("mes fuera de rango: {}", mes));
    }

    let valor_raw = cell_to_string(celdas.get(idx.valor).unwrap_or(&Data::Empty)).replace(',', ".");
    let valor: f64 = valor_raw
        .parse()
        .map_err(|_| format!("valor inválido: '{}'", valor_raw))?;

    Ok(FilaCarga {
        fila: numero,
        indicador_id: indicador.id,
        codigo: indicador.codigo.clone(),
        anio,
        mes,
        valor,
    })
}

/// Lee una planilla de cargas. Cada fila se resuelve y parsea de forma
/// independiente: una fila mala se informa en `rechazos` y no corta la
/// importación. Las validaciones de negocio (periodicidad, duplicados)
/// quedan a cargo del alta de cada carga.
pub fn leer_cargas_xlsx<P: AsRef<Path>>(
    path: P,
    indicadores: &[Indicador],
) -> Result<ResultadoImportacion, Box<dyn Error>> {
    let mut workbook = open_workbook_auto(path)?;
    let nombres = workbook.sheet_names().to_owned();
    let primera = nombres
        .first()
        .cloned()
        .ok_or("la planilla no tiene hojas")?;
    let rango = workbook.worksheet_range(&primera)?;

    let mut filas_iter = rango.rows();
    let encabezados: Vec<String> = filas_iter
        .next()
        .ok_or("la planilla está vacía")?
        .iter()
        .map(cell_to_string)
        .collect();
    let idx = detectar_columnas(&encabezados)?;

    let mut resultado = ResultadoImportacion::default();
    for (i, fila) in filas_iter.enumerate() {
        let numero = i + 2; // 1-based, después del encabezado
        if fila.iter().all(|c| cell_to_string(c).is_empty()) {
            continue;
        }
        match parsear_fila(numero, fila, &idx, indicadores) {
            Ok(f) => resultado.filas.push(f),
            Err(e) => resultado.rechazos.push(RechazoFila {
                fila: numero,
                error: e,
            }),
        }
    }
    Ok(resultado)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Periodicidad;

    fn indicadores_prueba() -> Vec<Indicador> {
        vec![
            Indicador {
                id: 1,
                linea_id: 1,
                codigo: "SAL-001".to_string(),
                nombre: "Camas de internación".to_string(),
                unidad_medida: Some("camas".to_string()),
                periodicidad: Periodicidad::Mensual,
                activo: true,
            },
            Indicador {
                id: 2,
                linea_id: 1,
                codigo: "SAL-002".to_string(),
                nombre: "Consultas ambulatorias".to_string(),
                unidad_medida: None,
                periodicidad: Periodicidad::Trimestral,
                activo: true,
            },
        ]
    }

    #[test]
    fn resuelve_por_codigo_exacto() {
        let inds = indicadores_prueba();
        let r = resolver_indicador(&inds, "sal-001").expect("debe resolver por código");
        assert_eq!(r.id, 1);
    }

    #[test]
    fn resuelve_por_nombre_normalizado() {
        let inds = indicadores_prueba();
        let r = resolver_indicador(&inds, "CAMAS DE INTERNACION").expect("debe resolver por nombre");
        assert_eq!(r.id, 1);
    }

    #[test]
    fn resuelve_por_similitud() {
        let inds = indicadores_prueba();
        let r = resolver_indicador(&inds, "consultas ambulatoria").expect("debe resolver fuzzy");
        assert_eq!(r.id, 2);
    }

    #[test]
    fn texto_lejano_no_resuelve() {
        let inds = indicadores_prueba();
        assert!(resolver_indicador(&inds, "kilómetros de ruta pavimentada").is_none());
        assert!(resolver_indicador(&inds, "").is_none());
    }

    #[test]
    fn detecta_columnas_con_sinonimos() {
        let enc = vec![
            "Código de indicador".to_string(),
            "Año".to_string(),
            "Mes".to_string(),
            "Valor reportado".to_string(),
        ];
        let idx = detectar_columnas(&enc).expect("debe detectar columnas");
        assert_eq!(idx.indicador, 0);
        assert_eq!(idx.anio, 1);
        assert_eq!(idx.mes, 2);
        assert_eq!(idx.valor, 3);
    }

    #[test]
    fn encabezado_incompleto_falla() {
        let enc = vec!["Indicador".to_string(), "Valor".to_string()];
        assert!(detectar_columnas(&enc).is_err());
    }
}
