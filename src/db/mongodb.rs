use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::env;
use std::time::Duration;

/// Connect to MongoDB and return a handle to the configured database.
///
/// Store calls must not hang indefinitely, so the client is built with
/// bounded connect and server-selection timeouts.
pub async fn get_database() -> mongodb::error::Result<Database> {
    let uri =
        env::var("MONGODB_URI").unwrap_or_else(|_| String::from("mongodb://localhost:27017"));

    let mut options = ClientOptions::parse(&uri).await?;
    options.app_name = Some(String::from("smartqr"));
    options.connect_timeout = Some(Duration::from_secs(5));
    options.server_selection_timeout = Some(Duration::from_secs(5));

    let client = Client::with_options(options)?;
    let db_name = env::var("DATABASE_NAME").unwrap_or_else(|_| String::from("smartqr"));

    Ok(client.database(&db_name))
}
