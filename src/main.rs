use actix_cors::Cors;
use actix_web::{middleware::{Compress, Logger}, web, App, HttpServer};
use dotenv::dotenv;
use library_catalog::{
    api,
    config::Settings,
    database::{Connection, MongoBookStore, MongoUserStore},
    seeds,
    services::RolePolicy,
    state::AppState,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Log the panic and exit: there is no state worth keeping after one
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log::error!("💥 Uncaught panic: {}", info);
        log::error!("Shutting down due to uncaught panic.");
        default_hook(info);
        std::process::exit(1);
    }));
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    install_panic_hook();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    log::info!("🚀 Starting Library Catalog...");
    log::info!("📊 Database: {}", settings.database.name);

    // Initialize MongoDB connection
    let connection = Connection::new(settings.database.clone());
    let db = match connection.init().await {
        Ok(db) => db.clone(),
        Err(e) => {
            log::error!("❌ Failed to connect to MongoDB: {}", e);
            std::process::exit(1);
        }
    };

    let state = web::Data::new(
        AppState::new(
            Arc::new(MongoBookStore::new(&db)),
            Arc::new(MongoUserStore::new(&db)),
            Arc::new(RolePolicy),
            settings.auth.clone(),
        )
        .with_database(db),
    );

    // 🌱 Bootstrap admin account
    seeds::admin_seed::seed_bootstrap_admin(
        state.users.as_ref(),
        settings.bootstrap_admin.as_ref(),
        &settings.auth,
    )
    .await;

    if settings.environment.is_test() {
        log::info!("🧪 APP_ENV=test - not binding a listener");
        return Ok(());
    }

    let bind_address = settings.bind_address();
    log::info!("🌐 Server starting on {}", bind_address);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", bind_address);
    log::info!("📄 OpenAPI spec at: http://{}/api-docs/openapi.json", bind_address);

    let cors_origins = settings.cors_origins.clone();

    // Start HTTP server
    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Compress::default())
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .configure(api::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
