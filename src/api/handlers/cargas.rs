use actix_multipart::Multipart;
use actix_web::{HttpResponse, Responder, web};
use futures_util::stream::StreamExt;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tokio::io::AsyncWriteExt;

use crate::auth::Claims;
use crate::db;
use crate::db::cargas::FiltrosCarga;
use crate::errors::SipioError;
use crate::excel;
use crate::excel::plantilla::FilaExport;
use crate::models::{Carga, Estado, Rol};
use crate::workflow;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn abrir_o_error() -> Result<Connection, HttpResponse> {
    db::abrir().map_err(|e| {
        HttpResponse::InternalServerError()
            .json(json!({"error": format!("no se pudo abrir el almacén: {}", e)}))
    })
}

fn filtros_desde_query(claims: &Claims, qm: &HashMap<String, String>) -> FiltrosCarga {
    let mut filtros = FiltrosCarga {
        ministerio_id: qm.get("ministerio_id").and_then(|s| s.parse().ok()),
        indicador_id: qm.get("indicador_id").and_then(|s| s.parse().ok()),
        estado: qm.get("estado").and_then(|s| Estado::parse(s)),
        anio: qm.get("anio").and_then(|s| s.parse().ok()),
        mes: qm.get("mes").and_then(|s| s.parse().ok()),
    };
    // Un operador sólo ve su propio ministerio, pida lo que pida.
    if claims.rol == Rol::Operador {
        filtros.ministerio_id = claims.ministerio_id;
    }
    filtros
}

/// GET /cargas?ministerio_id=&indicador_id=&estado=&anio=&mes=
pub async fn cargas_listar_handler(
    claims: Claims,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let conn = match abrir_o_error() {
        Ok(c) => c,
        Err(r) => return r,
    };
    let filtros = filtros_desde_query(&claims, &query.into_inner());
    match db::cargas::listar(&conn, &filtros) {
        Ok(cs) => HttpResponse::Ok().json(json!({"total": cs.len(), "cargas": cs})),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("fallo el listado: {}", e)})),
    }
}

#[derive(Debug, Deserialize)]
pub struct CargaCrearRequest {
    pub indicador_id: i64,
    pub anio: i32,
    pub mes: u32,
    pub valor: f64,
}

/// POST /cargas — alta en borrador para el ministerio del indicador.
pub async fn cargas_crear_handler(
    claims: Claims,
    body: web::Json<CargaCrearRequest>,
) -> impl Responder {
    if claims.rol == Rol::Revisor {
        return HttpResponse::Forbidden()
            .json(json!({"error": "un revisor no crea cargas"}));
    }
    let pedido = body.into_inner();
    let conn = match abrir_o_error() {
        Ok(c) => c,
        Err(r) => return r,
    };

    let indicador = match db::indicadores::por_id(&conn, pedido.indicador_id) {
        Ok(Some(i)) if i.activo => i,
        Ok(Some(_)) => {
            return HttpResponse::BadRequest().json(json!({"error": "el indicador está inactivo"}));
        }
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({"error": "indicador no encontrado"}));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)}));
        }
    };

    let ministerio_id = match db::indicadores::ministerio_de(&conn, indicador.id) {
        Ok(Some(m)) => m,
        Ok(None) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": "el indicador no tiene ministerio asociado"}));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)}));
        }
    };
    if !claims.alcanza_ministerio(ministerio_id) {
        return HttpResponse::Forbidden()
            .json(json!({"error": "el indicador pertenece a otro ministerio"}));
    }

    match db::cargas::crear(
        &conn,
        &indicador,
        ministerio_id,
        claims.sub,
        pedido.anio,
        pedido.mes,
        pedido.valor,
    ) {
        Ok(c) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "crear",
                "carga",
                Some(c.id),
                Some(&json!({"indicador_id": c.indicador_id, "anio": c.anio, "mes": c.mes})),
            );
            HttpResponse::Created().json(c)
        }
        Err(e) => match e.downcast_ref::<SipioError>() {
            Some(SipioError::CargaDuplicada { .. }) => {
                HttpResponse::Conflict().json(json!({"error": format!("{}", e)}))
            }
            _ => HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
        },
    }
}

fn carga_visible(claims: &Claims, carga: &Carga) -> bool {
    claims.alcanza_ministerio(carga.ministerio_id)
}

/// GET /cargas/{id}
pub async fn cargas_detalle_handler(claims: Claims, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();
    let conn = match abrir_o_error() {
        Ok(c) => c,
        Err(r) => return r,
    };
    match db::cargas::por_id(&conn, id) {
        Ok(Some(c)) if carga_visible(&claims, &c) => HttpResponse::Ok().json(c),
        Ok(Some(_)) => {
            HttpResponse::Forbidden().json(json!({"error": "carga de otro ministerio"}))
        }
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "carga no encontrada"})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)})),
    }
}

#[derive(Debug, Deserialize)]
pub struct CargaActualizarRequest {
    pub valor: f64,
}

/// PUT /cargas/{id} — corrige el valor mientras la carga siga editable.
pub async fn cargas_actualizar_handler(
    claims: Claims,
    path: web::Path<i64>,
    body: web::Json<CargaActualizarRequest>,
) -> impl Responder {
    if claims.rol == Rol::Revisor {
        return HttpResponse::Forbidden()
            .json(json!({"error": "un revisor no edita valores de carga"}));
    }
    let id = path.into_inner();
    let conn = match abrir_o_error() {
        Ok(c) => c,
        Err(r) => return r,
    };
    let carga = match db::cargas::por_id(&conn, id) {
        Ok(Some(c)) => c,
        Ok(None) => return HttpResponse::NotFound().json(json!({"error": "carga no encontrada"})),
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)}));
        }
    };
    if !carga_visible(&claims, &carga) {
        return HttpResponse::Forbidden().json(json!({"error": "carga de otro ministerio"}));
    }
    if carga.publicado {
        return HttpResponse::Conflict().json(json!({"error": "una carga publicada es inmutable"}));
    }
    if !workflow::puede_editar(carga.estado) {
        return HttpResponse::Conflict().json(json!({
            "error": format!("la carga no es editable en estado {}", carga.estado.as_str()),
        }));
    }

    match db::cargas::actualizar_valor(&conn, id, body.valor) {
        Ok(true) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                "actualizar",
                "carga",
                Some(id),
                Some(&json!({"valor": body.valor})),
            );
            HttpResponse::Ok().json(json!({"status": "ok"}))
        }
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "carga no encontrada"})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)})),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct TransicionRequest {
    pub observacion: Option<String>,
}

fn respuesta_error_flujo(e: &SipioError) -> HttpResponse {
    match e {
        SipioError::NoAutorizado(_) => HttpResponse::Forbidden().json(json!({"error": format!("{}", e)})),
        SipioError::TransicionInvalida { .. } => {
            HttpResponse::Conflict().json(json!({"error": format!("{}", e)}))
        }
        _ => HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
    }
}

async fn transicionar(
    claims: Claims,
    id: i64,
    destino: Estado,
    observacion: Option<String>,
) -> HttpResponse {
    let conn = match abrir_o_error() {
        Ok(c) => c,
        Err(r) => return r,
    };
    let carga = match db::cargas::por_id(&conn, id) {
        Ok(Some(c)) => c,
        Ok(None) => return HttpResponse::NotFound().json(json!({"error": "carga no encontrada"})),
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)}));
        }
    };
    if !carga_visible(&claims, &carga) {
        return HttpResponse::Forbidden().json(json!({"error": "carga de otro ministerio"}));
    }
    if carga.publicado {
        return HttpResponse::Conflict().json(json!({"error": "una carga publicada es inmutable"}));
    }

    let es_propietaria = claims.ministerio_id == Some(carga.ministerio_id);
    let transicion = match workflow::aplicar_transicion(
        carga.estado,
        destino,
        claims.rol,
        es_propietaria,
        observacion,
    ) {
        Ok(t) => t,
        Err(e) => return respuesta_error_flujo(&e),
    };

    match db::cargas::actualizar_estado(
        &conn,
        id,
        transicion.estado,
        transicion.observacion.as_deref(),
    ) {
        Ok(true) => {
            let _ = db::auditoria::registrar(
                &conn,
                Some(claims.sub),
                Some(&claims.email),
                destino.as_str(),
                "carga",
                Some(id),
                Some(&json!({"desde": carga.estado.as_str(), "hacia": destino.as_str()})),
            );
            HttpResponse::Ok().json(json!({"status": "ok", "estado": transicion.estado}))
        }
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "carga no encontrada"})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)})),
    }
}

/// POST /cargas/{id}/enviar
pub async fn cargas_enviar_handler(claims: Claims, path: web::Path<i64>) -> impl Responder {
    transicionar(claims, path.into_inner(), Estado::Pendiente, None).await
}

/// POST /cargas/{id}/validar
pub async fn cargas_validar_handler(claims: Claims, path: web::Path<i64>) -> impl Responder {
    transicionar(claims, path.into_inner(), Estado::Validado, None).await
}

/// POST /cargas/{id}/observar  (body: {"observacion": "..."})
pub async fn cargas_observar_handler(
    claims: Claims,
    path: web::Path<i64>,
    body: web::Json<TransicionRequest>,
) -> impl Responder {
    transicionar(
        claims,
        path.into_inner(),
        Estado::Observado,
        body.into_inner().observacion,
    )
    .await
}

/// POST /cargas/{id}/rechazar
pub async fn cargas_rechazar_handler(claims: Claims, path: web::Path<i64>) -> impl Responder {
    transicionar(claims, path.into_inner(), Estado::Rechazado, None).await
}

fn indicadores_del_alcance(
    conn: &Connection,
    claims: &Claims,
) -> Result<Vec<crate::models::Indicador>, Box<dyn std::error::Error>> {
    match (claims.rol, claims.ministerio_id) {
        (Rol::Operador, Some(mid)) => db::indicadores::activos_de_ministerio(conn, mid),
        _ => Ok(db::indicadores::listar(conn, None)?
            .into_iter()
            .filter(|i| i.activo)
            .collect()),
    }
}

/// POST /cargas/importar — multipart con una planilla .xlsx; cada fila
/// válida se da de alta como borrador, las malas vuelven en `rechazos`.
pub async fn cargas_importar_handler(claims: Claims, mut payload: Multipart) -> impl Responder {
    if claims.rol == Rol::Revisor {
        return HttpResponse::Forbidden().json(json!({"error": "un revisor no importa cargas"}));
    }

    let destino = std::env::temp_dir().join(format!(
        "sipio-import-{}-{}.xlsx",
        claims.sub,
        chrono::Utc::now().timestamp_millis()
    ));

    let mut recibido = false;
    while let Some(field_res) = payload.next().await {
        let mut field = match field_res {
            Ok(f) => f,
            Err(e) => {
                return HttpResponse::BadRequest()
                    .json(json!({"error": format!("multipart inválido: {}", e)}));
            }
        };
        let mut archivo = match tokio::fs::File::create(&destino).await {
            Ok(f) => f,
            Err(e) => {
                return HttpResponse::InternalServerError()
                    .json(json!({"error": format!("no se pudo crear archivo temporal: {}", e)}));
            }
        };
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(bytes) => {
                    if let Err(e) = archivo.write_all(&bytes).await {
                        return HttpResponse::InternalServerError()
                            .json(json!({"error": format!("fallo al escribir la planilla: {}", e)}));
                    }
                }
                Err(e) => {
                    return HttpResponse::BadRequest()
                        .json(json!({"error": format!("fallo al leer la planilla: {}", e)}));
                }
            }
        }
        recibido = true;
        break; // una sola planilla por pedido
    }

    if !recibido {
        return HttpResponse::BadRequest().json(json!({"error": "falta la planilla en el pedido"}));
    }

    let conn = match abrir_o_error() {
        Ok(c) => c,
        Err(r) => return r,
    };
    let indicadores = match indicadores_del_alcance(&conn, &claims) {
        Ok(is) => is,
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)}));
        }
    };

    let resultado = match excel::leer_cargas_xlsx(&destino, &indicadores) {
        Ok(r) => r,
        Err(e) => {
            let _ = std::fs::remove_file(&destino);
            return HttpResponse::BadRequest()
                .json(json!({"error": format!("no se pudo leer la planilla: {}", e)}));
        }
    };
    let _ = std::fs::remove_file(&destino);

    let mut importadas: Vec<Carga> = Vec::new();
    let mut rechazos = resultado.rechazos;
    for fila in resultado.filas {
        let indicador = match db::indicadores::por_id(&conn, fila.indicador_id) {
            Ok(Some(i)) => i,
            _ => {
                rechazos.push(excel::importar::RechazoFila {
                    fila: fila.fila,
                    error: format!("indicador {} no disponible", fila.codigo),
                });
                continue;
            }
        };
        let ministerio_id = match db::indicadores::ministerio_de(&conn, indicador.id) {
            Ok(Some(m)) => m,
            _ => {
                rechazos.push(excel::importar::RechazoFila {
                    fila: fila.fila,
                    error: format!("indicador {} sin ministerio", fila.codigo),
                });
                continue;
            }
        };
        match db::cargas::crear(
            &conn,
            &indicador,
            ministerio_id,
            claims.sub,
            fila.anio,
            fila.mes,
            fila.valor,
        ) {
            Ok(c) => importadas.push(c),
            Err(e) => rechazos.push(excel::importar::RechazoFila {
                fila: fila.fila,
                error: format!("{}", e),
            }),
        }
    }

    let _ = db::auditoria::registrar(
        &conn,
        Some(claims.sub),
        Some(&claims.email),
        "importar",
        "carga",
        None,
        Some(&json!({"importadas": importadas.len(), "rechazadas": rechazos.len()})),
    );

    HttpResponse::Ok().json(json!({
        "importadas": importadas.len(),
        "cargas": importadas,
        "rechazos": rechazos,
    }))
}

fn servir_xlsx(path: &std::path::Path, nombre: &str) -> HttpResponse {
    match std::fs::read(path) {
        Ok(bytes) => {
            let _ = std::fs::remove_file(path);
            HttpResponse::Ok()
                .content_type(XLSX_MIME)
                .append_header((
                    actix_web::http::header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", nombre),
                ))
                .body(bytes)
        }
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"error": format!("no se pudo leer el archivo generado: {}", e)})),
    }
}

/// GET /cargas/plantilla — planilla de importación con el catálogo del alcance.
pub async fn cargas_plantilla_handler(claims: Claims) -> impl Responder {
    let conn = match abrir_o_error() {
        Ok(c) => c,
        Err(r) => return r,
    };
    let indicadores = match indicadores_del_alcance(&conn, &claims) {
        Ok(is) => is,
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)}));
        }
    };

    let destino = std::env::temp_dir().join(format!(
        "sipio-plantilla-{}-{}.xlsx",
        claims.sub,
        chrono::Utc::now().timestamp_millis()
    ));
    if let Err(e) = excel::generar_plantilla(&destino, &indicadores) {
        return HttpResponse::InternalServerError()
            .json(json!({"error": format!("no se pudo generar la plantilla: {}", e)}));
    }
    servir_xlsx(&destino, "plantilla_cargas.xlsx")
}

/// GET /cargas/exportar — mismas condiciones de filtrado que el listado.
pub async fn cargas_exportar_handler(
    claims: Claims,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let conn = match abrir_o_error() {
        Ok(c) => c,
        Err(r) => return r,
    };
    let filtros = filtros_desde_query(&claims, &query.into_inner());
    let cargas = match db::cargas::listar(&conn, &filtros) {
        Ok(cs) => cs,
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)}));
        }
    };

    let indicadores: HashMap<i64, (String, String)> = match db::indicadores::listar(&conn, None) {
        Ok(is) => is
            .into_iter()
            .map(|i| (i.id, (i.codigo, i.nombre)))
            .collect(),
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)}));
        }
    };
    let ministerios: HashMap<i64, String> = match db::ministerios::listar(&conn, false) {
        Ok(ms) => ms.into_iter().map(|m| (m.id, m.nombre)).collect(),
        Err(e) => {
            return HttpResponse::InternalServerError().json(json!({"error": format!("{}", e)}));
        }
    };

    let filas: Vec<FilaExport> = cargas
        .iter()
        .map(|c| {
            let (codigo, nombre) = indicadores
                .get(&c.indicador_id)
                .cloned()
                .unwrap_or_else(|| (format!("#{}", c.indicador_id), String::new()));
            FilaExport {
                codigo,
                indicador: nombre,
                ministerio: ministerios
                    .get(&c.ministerio_id)
                    .cloned()
                    .unwrap_or_default(),
                anio: c.anio,
                mes: c.mes,
                valor: c.valor,
                estado: c.estado.as_str().to_string(),
                publicado: c.publicado,
            }
        })
        .collect();

    let destino = std::env::temp_dir().join(format!(
        "sipio-export-{}-{}.xlsx",
        claims.sub,
        chrono::Utc::now().timestamp_millis()
    ));
    if let Err(e) = excel::exportar_cargas(&destino, &filas) {
        return HttpResponse::InternalServerError()
            .json(json!({"error": format!("no se pudo generar el export: {}", e)}));
    }
    servir_xlsx(&destino, "cargas.xlsx")
}
