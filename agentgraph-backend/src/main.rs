use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;

use agentgraph_backend::config::{load_graph, Config};
use agentgraph_backend::{controllers, handlers, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing handler registry");
    let registry = Arc::new(handlers::create_default_registry());
    log::info!("Registered {} handlers", registry.len());

    log::info!("Loading graph from {}", config.config_dir.display());
    let graph = load_graph(&config, registry).expect("Failed to load graph configuration");
    let graph = Arc::new(graph);

    let state = web::Data::new(AppState {
        config: config.clone(),
        graph,
        run_counter: AtomicU64::new(0),
    });

    log::info!("Starting server on port {}", port);
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(controllers::health::config)
            .configure(controllers::chat::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
