#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod voting;

use config::{ConfigFairing, DatabaseFairing};
use logging::LoggerFairing;

/// The ballot box server, backed by MongoDB.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// The server over a given store, with a fixed session secret.
#[cfg(test)]
pub(crate) fn rocket_for_store(store: voting::store::memory::MemoryStore) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("jwt_secret", "test-only-jwt-secret"))
        .merge(("auth_ttl", 600));
    let store: voting::store::Store = std::sync::Arc::new(store);
    rocket::custom(figment)
        .attach(ConfigFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
        .manage(store)
}
