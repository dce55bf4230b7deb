//! Metadata Gateway: a typed façade over the submission, round, and
//! leaderboard tables.
//!
//! ## Connectivity
//!
//! - [`connect`] — establishes a connection from a `postgres://` URL
//!
//! ## Core Types
//!
//! - [`Gateway`] — the façade itself: `get_submission`, `get_round_number`,
//!   `mark_leaderboard_pending`, `write_verdict`, `list_cohort`,
//!   `get_created_at`
//! - [`Schema`] — table metadata and DDL generation
//!
//! ## Table Names
//!
//! Constants for the three persistent tables: rounds, submissions,
//! leaderboard.
mod error;
mod gateway;
mod schema;
mod traits;

pub use error::GatewayError;
pub use gateway::Gateway;
pub use schema::Leaderboard;
pub use schema::Rounds;
pub use schema::Submissions;
pub use schema::LEADERBOARD;
pub use schema::ROUNDS;
pub use schema::SUBMISSIONS;
pub use traits::Schema;

use std::sync::Arc;
use tokio_postgres::Client;

/// Establishes a database connection and spawns its connection driver.
///
/// # Panics
///
/// Panics if the connection cannot be established; the service refuses to
/// start in a half-configured state (see the config crate's fail-fast
/// policy).
pub async fn connect(postgres_url: &str) -> Arc<Client> {
    log::info!("connecting to postgres");
    let tls = tokio_postgres::NoTls;
    let (client, connection) = tokio_postgres::connect(postgres_url, tls)
        .await
        .expect("postgres connection failed");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("postgres connection closed: {}", e);
        }
    });
    Arc::new(client)
}
