use std::sync::Arc;

use chrono::Duration;
use log::{error, info};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::mongodb::ensure_indexes_exist;
use crate::voting::store::{MongoStore, Store};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: i64,
    // secrets
    jwt_secret: String,
}

impl Config {
    #[cfg(test)]
    pub fn new(auth_ttl: i64, jwt_secret: &str) -> Self {
        Self {
            auth_ttl,
            jwt_secret: jwt_secret.to_string(),
        }
    }

    /// Valid lifetime of voter session cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl)
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        if config.auth_ttl <= 0 {
            error!("`auth_ttl` must be positive, got {}", config.auth_ttl);
            return Err(rocket);
        }

        Ok(rocket.manage(config))
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
pub struct DbConfig {
    // non-secrets
    pub db_name: String,
    // secrets
    pub db_uri: String,
}

/// Connect to MongoDB without writing anything.
pub async fn open(config: &DbConfig) -> mongodb::error::Result<MongoStore> {
    let client = MongoClient::with_uri_str(&config.db_uri).await?;
    let db = client.database(&config.db_name);
    Ok(MongoStore::new(client, &db))
}

/// Connect to MongoDB and make sure the vote indexes exist.
pub async fn connect(config: &DbConfig) -> mongodb::error::Result<MongoStore> {
    let store = open(config).await?;
    ensure_indexes_exist(store.database()).await?;
    Ok(store)
}

/// A fairing that loads the MongoDB config, connects to the database,
/// ensures the indexes exist, and places the ballot [`Store`] into managed
/// state.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting to `{}`...", config.db_name);

        let store = match connect(&config).await {
            Ok(store) => store,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        info!("...database connection online!");

        let store: Store = Arc::new(store);
        Ok(rocket.manage(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rocket::async_test]
    async fn open_does_not_need_a_reachable_server() {
        // Nothing listens on port 1; only index creation would notice.
        let config = DbConfig {
            db_name: "results".to_string(),
            db_uri: "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=100".to_string(),
        };
        let store = open(&config).await.unwrap();
        assert_eq!(store.database().name(), "results");
    }
}
