use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use tracing::info;

use crate::api::handlers::*;
use crate::config::Config;
use crate::db;

/// Tabla de rutas completa; compartida entre el servidor y los tests HTTP.
pub fn configurar_rutas(cfg: &mut web::ServiceConfig) {
    cfg.route("/salud", web::get().to(salud_handler))
        .route("/ayuda", web::get().to(ayuda_handler))
        .route("/auth/login", web::post().to(login_handler))
        .route("/auth/cambiar_clave", web::post().to(cambiar_clave_handler))
        .route("/ministerios", web::get().to(ministerios_listar_handler))
        .route("/ministerios", web::post().to(ministerios_crear_handler))
        .route("/ministerios/{id}", web::get().to(ministerios_detalle_handler))
        .route("/ministerios/{id}", web::put().to(ministerios_actualizar_handler))
        .route("/ministerios/{id}", web::delete().to(ministerios_eliminar_handler))
        .route("/lineas", web::get().to(lineas_listar_handler))
        .route("/lineas", web::post().to(lineas_crear_handler))
        .route("/lineas/{id}", web::get().to(lineas_detalle_handler))
        .route("/lineas/{id}", web::put().to(lineas_actualizar_handler))
        .route("/lineas/{id}", web::delete().to(lineas_eliminar_handler))
        .route("/indicadores", web::get().to(indicadores_listar_handler))
        .route("/indicadores", web::post().to(indicadores_crear_handler))
        .route("/indicadores/{id}", web::get().to(indicadores_detalle_handler))
        .route("/indicadores/{id}", web::put().to(indicadores_actualizar_handler))
        .route("/indicadores/{id}", web::delete().to(indicadores_eliminar_handler))
        .route("/indicadores/{id}/metas", web::get().to(metas_listar_handler))
        .route("/indicadores/{id}/metas", web::put().to(metas_upsert_handler))
        .route("/cargas", web::get().to(cargas_listar_handler))
        .route("/cargas", web::post().to(cargas_crear_handler))
        .route("/cargas/importar", web::post().to(cargas_importar_handler))
        .route("/cargas/exportar", web::get().to(cargas_exportar_handler))
        .route("/cargas/plantilla", web::get().to(cargas_plantilla_handler))
        .route("/cargas/{id}", web::get().to(cargas_detalle_handler))
        .route("/cargas/{id}", web::put().to(cargas_actualizar_handler))
        .route("/cargas/{id}/enviar", web::post().to(cargas_enviar_handler))
        .route("/cargas/{id}/validar", web::post().to(cargas_validar_handler))
        .route("/cargas/{id}/observar", web::post().to(cargas_observar_handler))
        .route("/cargas/{id}/rechazar", web::post().to(cargas_rechazar_handler))
        .route("/usuarios", web::get().to(usuarios_listar_handler))
        .route("/usuarios", web::post().to(usuarios_crear_handler))
        .route("/usuarios/{id}", web::get().to(usuarios_detalle_handler))
        .route("/usuarios/{id}", web::put().to(usuarios_actualizar_handler))
        .route("/usuarios/{id}", web::delete().to(usuarios_eliminar_handler))
        .route("/auditoria", web::get().to(auditoria_listar_handler))
        .route("/sync/ejecutar", web::post().to(sync_ejecutar_handler))
        .route("/sync/estado", web::get().to(sync_estado_handler));
}

pub async fn run_server(bind_addr: &str) -> std::io::Result<()> {
    let config = Config::desde_env();
    if let Err(e) = db::init_db(&config.admin_clave_inicial) {
        return Err(std::io::Error::other(format!(
            "no se pudo inicializar el almacén: {}",
            e
        )));
    }
    info!(bind = bind_addr, db = %db::db_path().display(), "iniciando servidor");

    HttpServer::new(|| {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();
        App::new().wrap(cors).configure(configurar_rutas)
    })
    .bind(bind_addr)?
    .run()
    .await
}
