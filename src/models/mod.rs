// Estructuras de datos principales

use serde::{Deserialize, Serialize};

/// Estado de revisión de una carga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Estado {
    Borrador,
    Pendiente,
    Validado,
    Observado,
    Rechazado,
}

impl Estado {
    pub fn as_str(&self) -> &'static str {
        match self {
            Estado::Borrador => "borrador",
            Estado::Pendiente => "pendiente",
            Estado::Validado => "validado",
            Estado::Observado => "observado",
            Estado::Rechazado => "rechazado",
        }
    }

    pub fn parse(s: &str) -> Option<Estado> {
        match s.trim().to_lowercase().as_str() {
            "borrador" => Some(Estado::Borrador),
            "pendiente" => Some(Estado::Pendiente),
            "validado" => Some(Estado::Validado),
            "observado" => Some(Estado::Observado),
            "rechazado" => Some(Estado::Rechazado),
            _ => None,
        }
    }
}

/// Rol de un usuario del sistema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Admin,
    Revisor,
    Operador,
}

impl Rol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Admin => "admin",
            Rol::Revisor => "revisor",
            Rol::Operador => "operador",
        }
    }

    pub fn parse(s: &str) -> Option<Rol> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Rol::Admin),
            "revisor" => Some(Rol::Revisor),
            "operador" => Some(Rol::Operador),
            _ => None,
        }
    }
}

/// Periodicidad de reporte de un indicador. Determina en qué meses se
/// aceptan cargas (trimestral: 3/6/9/12, semestral: 6/12, anual: 12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Periodicidad {
    Mensual,
    Trimestral,
    Semestral,
    Anual,
}

impl Periodicidad {
    pub fn as_str(&self) -> &'static str {
        match self {
            Periodicidad::Mensual => "mensual",
            Periodicidad::Trimestral => "trimestral",
            Periodicidad::Semestral => "semestral",
            Periodicidad::Anual => "anual",
        }
    }

    pub fn parse(s: &str) -> Option<Periodicidad> {
        match s.trim().to_lowercase().as_str() {
            "mensual" => Some(Periodicidad::Mensual),
            "trimestral" => Some(Periodicidad::Trimestral),
            "semestral" => Some(Periodicidad::Semestral),
            "anual" => Some(Periodicidad::Anual),
            _ => None,
        }
    }

    /// Indica si `mes` (1-12) cae en la grilla de reporte.
    pub fn mes_valido(&self, mes: u32) -> bool {
        if !(1..=12).contains(&mes) {
            return false;
        }
        match self {
            Periodicidad::Mensual => true,
            Periodicidad::Trimestral => mes % 3 == 0,
            Periodicidad::Semestral => mes == 6 || mes == 12,
            Periodicidad::Anual => mes == 12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ministerio {
    pub id: i64,
    pub nombre: String,
    pub sigla: String,
    pub activo: bool,
}

/// Línea de compromiso dentro de un ministerio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Linea {
    pub id: i64,
    pub ministerio_id: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub activo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicador {
    pub id: i64,
    pub linea_id: i64,
    /// Código corto estable (p. ej. "SAL-012") usado en planillas y dashboards.
    pub codigo: String,
    pub nombre: String,
    pub unidad_medida: Option<String>,
    pub periodicidad: Periodicidad,
    pub activo: bool,
}

/// Meta numérica mensual de un indicador.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaMensual {
    pub id: i64,
    pub indicador_id: i64,
    pub anio: i32,
    pub mes: u32,
    pub valor: f64,
}

/// Una carga: el dato de un período para un indicador, enviado por un
/// usuario ministerial y revisado según el flujo de estados.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carga {
    pub id: i64,
    pub indicador_id: i64,
    pub ministerio_id: i64,
    pub usuario_id: i64,
    pub anio: i32,
    pub mes: u32,
    pub valor: f64,
    pub estado: Estado,
    /// Comentario del revisor cuando la carga queda observada.
    pub observacion: Option<String>,
    pub publicado: bool,
    pub fecha_publicacion: Option<String>,
    pub creado_en: String,
    pub actualizado_en: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usuario {
    pub id: i64,
    pub email: String,
    pub nombre: String,
    #[serde(skip_serializing, default)]
    pub clave_hash: String,
    pub rol: Rol,
    /// Ministerio al que pertenece; None para admin/revisor transversales.
    pub ministerio_id: Option<i64>,
    pub activo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistroAuditoria {
    pub id: i64,
    pub ts: String,
    pub usuario_id: Option<i64>,
    pub email: Option<String>,
    pub accion: String,
    pub entidad: String,
    pub entidad_id: Option<i64>,
    pub detalle_json: Option<String>,
}
