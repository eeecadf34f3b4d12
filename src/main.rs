use actix_web::{web, App, HttpServer};
use env_logger::Builder;
use log::{info, warn};
use std::sync::Arc;

use reaction_sim::config::Settings;
use reaction_sim::db::{self, ScyllaStore};
use reaction_sim::generator::{CompletionOptions, ReactionGenerator};
use reaction_sim::handlers::{self, AppState, StubIdentity};
use reaction_sim::llm::OpenAiClient;
use reaction_sim::store::SimulationStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let settings = Settings::from_env();

    Builder::new()
        .filter_level(settings.log_filter())
        .format_timestamp_secs()
        .init();

    info!("Starting reaction simulator...");
    match &settings.openai_api_key {
        Some(key) => info!("OpenAI key present ({} chars)", key.len()),
        None => warn!("OPENAI_API_KEY is not set; generations will fail"),
    }

    // Connect to ScyllaDB
    let session = db::create_session(&settings.scylla_nodes, &settings.scylla_keyspace)
        .await
        .expect("Failed to create database session");
    let store: Arc<dyn SimulationStore> = Arc::new(ScyllaStore::new(Arc::new(session)));

    info!("Connected to ScyllaDB keyspace {}", settings.scylla_keyspace);

    let llm = OpenAiClient::new(
        settings.openai_api_key.clone(),
        settings.openai_base_url.clone(),
        settings.openai_model.clone(),
        settings.llm_timeout(),
    )
    .expect("Failed to build completion client");

    let generator = ReactionGenerator::new(
        store.clone(),
        Arc::new(llm),
        CompletionOptions {
            temperature: settings.llm_temperature,
            max_tokens: settings.llm_max_tokens,
        },
    );

    let state = web::Data::new(AppState {
        store,
        generator,
        identity: StubIdentity {
            external_identity: settings.stub_user_identity.clone(),
            email: settings.stub_user_email.clone(),
        },
        mask_generation_failures: settings.mask_generation_failures,
    });

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(web::scope("/api").configure(handlers::configure))
    })
    .workers(settings.http_workers.max(1))
    .bind(settings.bind_addr.as_str())?
    .run()
    .await
}
