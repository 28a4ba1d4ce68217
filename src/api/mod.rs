pub mod auth;
pub mod books;
pub mod health;
pub mod swagger;

use crate::middleware::AuthMiddleware;
use crate::utils::AppError;
use actix_web::{guard, web};

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::validation(format!("Invalid JSON body: {}", err)).into()
    })
}

/// Registers every route. Expects `web::Data<AppState>` on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Auth endpoints
        .service(
            web::scope("/api/auth")
                .route("/register", web::post().to(auth::register))
                .route("/login", web::post().to(auth::login)),
        )
        // Catalog: reads and reservations are public, mutations require JWT
        .service(
            web::scope("/api/books")
                .route("", web::get().to(books::list_books))
                .route("/categories", web::get().to(books::list_categories))
                .service(
                    web::resource("")
                        .guard(guard::Post())
                        .wrap(AuthMiddleware)
                        .route(web::post().to(books::create_book)),
                )
                .route("/{id}/reserve", web::post().to(books::reserve_book))
                .service(
                    web::resource("/{id}")
                        .wrap(AuthMiddleware)
                        .route(web::put().to(books::update_book))
                        .route(web::delete().to(books::delete_book)),
                ),
        );
}
