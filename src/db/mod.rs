use std::time::Duration;

use mongodb::{
    bson::doc,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};

use crate::{config::Config, errors::AppResult};

const MAX_POOL_SIZE: u32 = 10;
const MIN_POOL_SIZE: u32 = 2;
const TIMEOUT: Duration = Duration::from_secs(5);
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Handle to the quizdesk database. Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct Database {
    client: Client,
    inner: mongodb::Database,
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut options = ClientOptions::parse(&config.mongo_conn_string).await?;
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
        options.max_pool_size = Some(MAX_POOL_SIZE);
        options.min_pool_size = Some(MIN_POOL_SIZE);
        options.connect_timeout = Some(TIMEOUT);
        options.server_selection_timeout = Some(TIMEOUT);
        options.app_name = Some("quizdesk-server".to_string());

        let client = Client::with_options(options)?;
        let database = Self {
            inner: client.database(&config.mongo_db_name),
            client,
        };
        database.ping().await?;

        log::info!("Connected to MongoDB database '{}'", config.mongo_db_name);
        Ok(database)
    }

    pub fn get_collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.inner.collection(name)
    }

    /// Used by the readiness probe.
    pub async fn health_check(&self) -> AppResult<()> {
        self.ping().await
    }

    async fn ping(&self) -> AppResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}

/// True when a write was rejected by a unique index.
pub fn is_duplicate_key_error(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
