pub mod auth;
pub mod health;
pub mod todos;
pub mod users;

use actix_web::web;

use crate::auth::AuthMiddleware;

/// Mounts every `/api` route. `/auth` is public; `/users` and `/todos` need a bearer token.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::refresh),
    )
    .service(
        web::scope("/users")
            .wrap(AuthMiddleware)
            .service(users::me)
            .service(users::change_password),
    )
    .service(
        web::scope("/todos")
            .wrap(AuthMiddleware)
            .service(todos::get_todos)
            .service(todos::create_todo)
            .service(todos::get_todo)
            .service(todos::update_todo)
            .service(todos::delete_todo),
    );
}
