#[macro_use]
extern crate lazy_static;

use tera::Tera;

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod mirror;
pub mod models;
pub mod routes;
pub mod service;
pub mod settlement;
pub mod store;

use service::CooperService;

#[derive(Clone)]
pub struct AppState {
    pub service: CooperService,
}

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = match Tera::new("templates/**/*") {
            Ok(t) => t,
            Err(e) => {
                log::error!("Parsing error(s): {}", e);
                ::std::process::exit(1);
            }
        };
        tera.autoescape_on(vec![".html"]);
        tera
    };
}
