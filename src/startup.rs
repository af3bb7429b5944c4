use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::TokenVerifier;
use crate::logger::RequestLogger;
use crate::middleware::JwtMiddleware;
use crate::routes::{admin_only, authenticated_only, health_check, login, refresh_token, register};
use crate::service::AuthService;
use crate::store::UserStore;

/// Build the HTTP server around an auth service.
///
/// Generic over the user store so the same routing runs on Postgres in
/// production and on the in-memory store in tests.
pub fn run<S: UserStore + 'static>(
    listener: TcpListener,
    service: AuthService<S>,
    verifier: TokenVerifier,
) -> Result<Server, std::io::Error> {
    let service = web::Data::new(service);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .app_data(service.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/auth")
                    // Public routes
                    .route("/register", web::post().to(register::<S>))
                    .route("/login", web::post().to(login::<S>))
                    .route("/refresh-token", web::post().to(refresh_token::<S>))
                    // Protected routes (require a valid access token)
                    .service(
                        web::resource("")
                            .wrap(JwtMiddleware::new(verifier.clone()))
                            .route(web::get().to(authenticated_only)),
                    )
                    .service(
                        web::resource("/admin-only")
                            .wrap(JwtMiddleware::new(verifier.clone()))
                            .route(web::get().to(admin_only)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
