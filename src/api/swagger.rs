use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Catalog API",
        version = "1.0.0",
        description = "Book catalog, categories, reservations and user accounts.\n\n**Authentication:** creating, updating and deleting books requires a JWT Bearer token from `/api/auth/login` belonging to an admin or staff user."
    ),
    paths(
        // Books
        crate::api::books::list_books,
        crate::api::books::list_categories,
        crate::api::books::create_book,
        crate::api::books::update_book,
        crate::api::books::delete_book,
        crate::api::books::reserve_book,

        // Auth
        crate::api::auth::register,
        crate::api::auth::login,

        // Health
        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::models::BookResponse,
            crate::models::CreateBookRequest,
            crate::models::UpdateBookRequest,
            crate::models::ReserveRequest,
            crate::models::RegisterRequest,
            crate::models::LoginRequest,
            crate::models::AuthResponse,
            crate::models::UserView,
            crate::models::Role,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Books", description = "Catalog listing, category listing, book management and reservations."),
        (name = "Auth", description = "User registration and login."),
        (name = "Health", description = "Service and database health."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build()
                ),
            );
        }
    }
}
