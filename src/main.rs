mod bus_data;
mod error;
mod eta;
mod kmb;
mod routes;

#[cfg(test)]
mod test_utils;

use std::env;

use actix_web::{
    get, http::header, middleware::Logger, web, App, HttpResponse, HttpServer, Responder,
};

use bus_data::BusDataQuery;
use error::{EtabusError, EtabusResult};
use kmb::client::KmbClient;

#[derive(Clone)]
pub struct ContextData {
    kmb: KmbClient,
}

#[get("/ok")]
async fn ok() -> EtabusResult<impl Responder> {
    Ok(HttpResponse::Ok().finish())
}

#[get("/bus-data")]
async fn get_bus_data(
    query: web::Query<BusDataQuery>,
    ctx: web::Data<ContextData>,
) -> EtabusResult<impl Responder> {
    let reply = bus_data::get_bus_data(&ctx, &query).await?;

    let response = HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, reply.cache.header_value()))
        .json(reply.body);

    Ok(response)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::try_init().ok();

    log::debug!("Debug logging enabled");

    dotenvy::from_filename(".env").ok();

    let kmb = KmbClient::new().map_err(EtabusError::Kmb).unwrap();

    let ctx = ContextData { kmb };

    let listen_address = env::var("LISTEN_ADDRESS").unwrap_or("127.0.0.1:8080".to_string());

    log::info!("Starting server at {}", listen_address);

    HttpServer::new(move || {
        let logger = Logger::default();

        let mut cors = actix_cors::Cors::default()
            .allowed_methods(vec!["GET"])
            .allowed_headers(vec!["accept"]);

        if let Ok(allowed_origin) = env::var("ALLOW_ORIGIN") {
            if allowed_origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(&allowed_origin);
            }
        }

        App::new()
            .wrap(logger)
            .wrap(cors)
            .app_data(web::Data::new(ctx.clone()))
            .service(ok)
            .service(get_bus_data)
    })
    .bind(listen_address)?
    .run()
    .await?;

    Ok(())
}
