use actix_identity::IdentityMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};

use actix_files::{Files, NamedFile};
use actix_web::{
    http::{Method, StatusCode},
    middleware,
    web::{self, Data},
    App, Either, HttpResponse, HttpServer, Responder,
};
use log::info;

use cooper::api::CooperApi;
use cooper::config::Config;
use cooper::routes;
use cooper::service::CooperService;
use cooper::store::Store;
use cooper::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();

    let store = Store::connect(&config.database_url).await?;
    info!("Database migrated successfully");

    let api = CooperApi::new(config.api_base_url.clone());
    let state = AppState {
        service: CooperService::new(store, api),
    };
    let session_key = config.session_key();

    info!("Starting HTTP server on http://{}/", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            .wrap(IdentityMiddleware::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                session_key.clone(),
            ))
            // register the Logger middleware last
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static"))
            .configure(routes::configure)
            .app_data(Data::new(state.clone()))
            .default_service(web::to(default_handler))
    })
    .bind(config.bind_addr)?
    .run()
    .await
}

async fn default_handler(req_method: Method) -> Result<impl Responder, std::io::Error> {
    match req_method {
        Method::GET => {
            let file = NamedFile::open("static/404.html")?
                .customize()
                .with_status(StatusCode::NOT_FOUND);
            Ok(Either::Left(file))
        }
        _ => Ok(Either::Right(HttpResponse::MethodNotAllowed().finish())),
    }
}
