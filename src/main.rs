use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use log::{error, info};
use sqlx::postgres::PgPoolOptions;
use std::fmt::Display;
use std::io;
use std::sync::Arc;
use todoforge::{
    auth::TokenCodec,
    config::Config,
    error::{json_error_handler, path_error_handler, query_error_handler},
    routes,
    store::{postgres, PgStore, TodoRepository, UserRepository},
};

fn fatal(context: &str, err: impl Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| fatal("Invalid configuration", e))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| fatal("Failed to connect to database", e))?;
    postgres::migrate(&pool)
        .await
        .map_err(|e| fatal("Failed to run database migrations", e))?;

    let pg_store = Arc::new(PgStore::new(pool));
    let users: Arc<dyn UserRepository> = pg_store.clone();
    let todos: Arc<dyn TodoRepository> = pg_store;
    let users = web::Data::from(users);
    let todos = web::Data::from(todos);
    let codec = web::Data::new(TokenCodec::new(&config.auth));
    let cors_origins = config.cors_origins.clone();

    info!(
        "Starting todoforge server at {} (token algorithm {:?})",
        config.server_url(),
        codec.algorithm()
    );
    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(users.clone())
            .app_data(todos.clone())
            .app_data(codec.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .wrap(cors)
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(web::scope("/api").configure(routes::config))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
