/// Public library interface for the Habit Ledger MCP server
///
/// This module exports the server, the ownership-checked habit registry and
/// completion store, the pure streak engine and the storage layer so they can
/// be used by other applications or tests.

use std::path::PathBuf;
use thiserror::Error;

// Internal modules
mod domain;
mod storage;
mod tracker;
mod tools;
mod mcp;

// Re-export public modules and types
pub use domain::*;
pub use storage::{EntryWrite, HabitStorage, SqliteStorage, StorageError};
pub use tracker::{CompletionStore, EntryDetails, HabitRegistry, TrackerError};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Habit ledger server that speaks the MCP protocol
///
/// The server owns a single SQLite store; every tool call borrows it for the
/// duration of one unit of work.
pub struct HabitTrackerServer {
    storage: SqliteStorage,
}

impl HabitTrackerServer {
    /// Create a server backed by the database at `db_path`
    ///
    /// The schema is created or migrated on first open.
    pub async fn new(db_path: PathBuf) -> Result<Self, ServerError> {
        tracing::info!("Initializing Habit Ledger server with database: {:?}", db_path);

        let storage = SqliteStorage::new(db_path)?;

        Ok(Self { storage })
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// Returns when stdin is closed.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting MCP server...");

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}
