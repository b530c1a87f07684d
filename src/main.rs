use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use face_compare::config::{LoggingSettings, Settings};
use face_compare::core::Comparator;
use face_compare::routes::{self, AppState};
use face_compare::services::build_verifier;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => {
            init_logging(&settings.logging);
            settings
        }
        Err(e) => {
            init_logging(&LoggingSettings::default());
            error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::other(e));
        }
    };

    info!("Starting face comparison service...");

    let verifier = build_verifier(&settings.verifier).map_err(|e| {
        error!("Failed to initialize verifier: {}", e);
        std::io::Error::other(e)
    })?;

    info!("Verifier backend: {}", verifier.backend());

    let comparator = Comparator::from_settings(&settings, verifier).map_err(|e| {
        error!("Failed to initialize image acquirer: {}", e);
        std::io::Error::other(e)
    })?;

    comparator.acquirer().ensure_uploads_dir().map_err(|e| {
        error!(
            "Failed to create uploads directory {}: {}",
            comparator.acquirer().uploads_dir().display(),
            e
        );
        e
    })?;

    let app_state = AppState::new(comparator, settings.limits.max_upload_bytes);

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
