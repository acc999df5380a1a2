use crate::models::Estado;
use thiserror::Error;

/// Errores de dominio del backend SIPIO.
#[derive(Debug, Error)]
pub enum SipioError {
    /// Transición de estado no contemplada en el flujo de revisión.
    #[error("transición inválida: {desde:?} -> {hacia:?}")]
    TransicionInvalida { desde: Estado, hacia: Estado },

    /// El rol del usuario no alcanza para la operación pedida.
    #[error("operación no permitida para el rol: {0}")]
    NoAutorizado(String),

    /// La carga no se puede modificar en su estado actual.
    #[error("la carga no es editable en estado {0:?}")]
    NoEditable(Estado),

    #[error("ya existe una carga activa para el indicador {indicador_id} en {anio}-{mes:02}")]
    CargaDuplicada { indicador_id: i64, anio: i32, mes: u32 },

    #[error("el mes {mes} no corresponde a la periodicidad {periodicidad}")]
    PeriodoInvalido { mes: u32, periodicidad: String },

    #[error("observación requerida para observar una carga")]
    ObservacionRequerida,

    #[error("entidad no encontrada: {0}")]
    NoEncontrado(String),

    #[error("dato inválido: {0}")]
    DatoInvalido(String),

    #[error("error de almacenamiento: {0}")]
    Almacenamiento(String),

    #[error("error de sincronización: {0}")]
    Sincronizacion(String),
}

impl From<rusqlite::Error> for SipioError {
    fn from(err: rusqlite::Error) -> Self {
        SipioError::Almacenamiento(err.to_string())
    }
}

impl From<reqwest::Error> for SipioError {
    fn from(err: reqwest::Error) -> Self {
        SipioError::Sincronizacion(err.to_string())
    }
}

pub type SipioResult<T> = Result<T, SipioError>;
