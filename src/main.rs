// --- SIPIO: seguimiento de indicadores - Archivo principal ---

use sipio::config::Config;
use sipio::run_server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::desde_env();
    println!("=== SIPIO - Seguimiento de Indicadores (API) ===");
    println!("Iniciando servidor en http://{}", config.bind);
    run_server(&config.bind).await
}
