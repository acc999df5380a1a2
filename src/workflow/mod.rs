// Flujo de revisión de cargas.
//
// borrador --enviar--> pendiente --validar--> validado
//                               --observar--> observado --enviar--> pendiente
//                               --rechazar--> rechazado (terminal)
//
// `publicado` no es un estado: es una marca que la sincronización pone
// sobre cargas validadas.

use crate::errors::{SipioError, SipioResult};
use crate::models::{Estado, Rol};

/// Estados alcanzables desde `estado` en un solo paso.
pub fn transiciones_validas(estado: Estado) -> &'static [Estado] {
    match estado {
        Estado::Borrador => &[Estado::Pendiente],
        Estado::Pendiente => &[Estado::Validado, Estado::Observado, Estado::Rechazado],
        Estado::Observado => &[Estado::Pendiente],
        Estado::Validado => &[],
        Estado::Rechazado => &[],
    }
}

/// El valor y el período de una carga sólo se tocan mientras el dato
/// sigue en manos del ministerio.
pub fn puede_editar(estado: Estado) -> bool {
    matches!(estado, Estado::Borrador | Estado::Observado)
}

fn es_revision(destino: Estado) -> bool {
    matches!(
        destino,
        Estado::Validado | Estado::Observado | Estado::Rechazado
    )
}

/// Resultado de una transición aplicada: nuevo estado y observación a
/// persistir (se limpia al reenviar una carga observada).
#[derive(Debug, Clone, PartialEq)]
pub struct Transicion {
    pub estado: Estado,
    pub observacion: Option<String>,
}

/// Valida y aplica una transición del flujo de revisión.
///
/// - `es_propietaria`: la carga pertenece al ministerio del usuario.
/// - `observacion`: requerida cuando `destino == Observado`.
pub fn aplicar_transicion(
    actual: Estado,
    destino: Estado,
    rol: Rol,
    es_propietaria: bool,
    observacion: Option<String>,
) -> SipioResult<Transicion> {
    if !transiciones_validas(actual).contains(&destino) {
        return Err(SipioError::TransicionInvalida {
            desde: actual,
            hacia: destino,
        });
    }

    if es_revision(destino) {
        // Sólo revisores y admin resuelven cargas pendientes.
        if !matches!(rol, Rol::Revisor | Rol::Admin) {
            return Err(SipioError::NoAutorizado(rol.as_str().to_string()));
        }
    } else {
        // Enviar (borrador/observado -> pendiente) es del ministerio dueño.
        match rol {
            Rol::Admin => {}
            Rol::Operador if es_propietaria => {}
            _ => return Err(SipioError::NoAutorizado(rol.as_str().to_string())),
        }
    }

    let observacion = match destino {
        Estado::Observado => {
            let texto = observacion
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty());
            match texto {
                Some(t) => Some(t),
                None => return Err(SipioError::ObservacionRequerida),
            }
        }
        // Al reenviar una carga observada la observación previa se limpia.
        Estado::Pendiente => None,
        _ => observacion,
    };

    Ok(Transicion {
        estado: destino,
        observacion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enviar_borrador_propio() {
        let t = aplicar_transicion(Estado::Borrador, Estado::Pendiente, Rol::Operador, true, None)
            .expect("el operador dueño debe poder enviar");
        assert_eq!(t.estado, Estado::Pendiente);
    }

    #[test]
    fn operador_no_envia_carga_ajena() {
        let r = aplicar_transicion(Estado::Borrador, Estado::Pendiente, Rol::Operador, false, None);
        assert!(matches!(r, Err(SipioError::NoAutorizado(_))));
    }

    #[test]
    fn revisor_no_envia_borradores() {
        let r = aplicar_transicion(Estado::Borrador, Estado::Pendiente, Rol::Revisor, false, None);
        assert!(matches!(r, Err(SipioError::NoAutorizado(_))));
    }

    #[test]
    fn observar_requiere_texto() {
        let r = aplicar_transicion(
            Estado::Pendiente,
            Estado::Observado,
            Rol::Revisor,
            false,
            Some("   ".to_string()),
        );
        assert!(matches!(r, Err(SipioError::ObservacionRequerida)));
    }

    #[test]
    fn reenvio_limpia_observacion() {
        let t = aplicar_transicion(
            Estado::Observado,
            Estado::Pendiente,
            Rol::Operador,
            true,
            Some("ya corregido".to_string()),
        )
        .expect("reenvío válido");
        assert_eq!(t.observacion, None);
    }

    #[test]
    fn rechazado_es_terminal() {
        for destino in [Estado::Borrador, Estado::Pendiente, Estado::Validado] {
            let r = aplicar_transicion(Estado::Rechazado, destino, Rol::Admin, true, None);
            assert!(matches!(r, Err(SipioError::TransicionInvalida { .. })));
        }
    }

    #[test]
    fn operador_no_valida() {
        let r = aplicar_transicion(Estado::Pendiente, Estado::Validado, Rol::Operador, true, None);
        assert!(matches!(r, Err(SipioError::NoAutorizado(_))));
    }

    #[test]
    fn edicion_solo_en_borrador_y_observado() {
        assert!(puede_editar(Estado::Borrador));
        assert!(puede_editar(Estado::Observado));
        assert!(!puede_editar(Estado::Pendiente));
        assert!(!puede_editar(Estado::Validado));
        assert!(!puede_editar(Estado::Rechazado));
    }
}
