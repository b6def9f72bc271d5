use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{info, warn};

use crate::config::ConnectionConfig;
use crate::drivers::{MySqlDriver, TokioPostgresDriver};
use crate::error::{Result, SqlForgeError};
use crate::querier::Querier;
use crate::traits::DatabaseDriver;
use crate::types::Dialect;

/// The open connection of a [`Client`], shared with its queriers.
pub(crate) struct ConnectionSlot {
    driver: Mutex<Option<Arc<dyn DatabaseDriver>>>,
}

impl ConnectionSlot {
    fn new(driver: Arc<dyn DatabaseDriver>) -> Self {
        Self {
            driver: Mutex::new(Some(driver)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<dyn DatabaseDriver>>> {
        // Poisoning is ignored: the guarded value is a plain Option.
        self.driver.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The driver to run the next statement on.
    pub(crate) fn current(&self) -> Result<Arc<dyn DatabaseDriver>> {
        self.lock()
            .clone()
            .ok_or_else(|| SqlForgeError::execution("database connection is not available"))
    }

    fn take(&self) -> Option<Arc<dyn DatabaseDriver>> {
        self.lock().take()
    }

    fn restore(&self, driver: Arc<dyn DatabaseDriver>) {
        self.lock().get_or_insert(driver);
    }

    fn is_open(&self) -> bool {
        self.lock().is_some()
    }
}

/// Main entry point for sqlforge.
/// Owns one database connection (or pool) and hands out queriers that use it.
pub struct Client {
    slot: Arc<ConnectionSlot>,
    query_timeout: Option<Duration>,
}

impl Client {
    /// Connect to the database described by `config`.
    ///
    /// # Example
    /// ```ignore
    /// let client = Client::connect(&ConnectionConfig::mysql("localhost", "app", "shop")).await?;
    /// ```
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let driver: Arc<dyn DatabaseDriver> = match config.dialect {
            Dialect::MySql => Arc::new(MySqlDriver::connect(config).await?),
            Dialect::Postgres => Arc::new(TokioPostgresDriver::connect(config).await?),
        };

        info!(
            dialect = ?config.dialect,
            host = %config.host,
            database = config.database.as_deref().unwrap_or("-"),
            "connected to database"
        );

        Ok(Self {
            slot: Arc::new(ConnectionSlot::new(driver)),
            query_timeout: config.query_timeout(),
        })
    }

    /// Create a new client with a custom driver.
    /// Useful for testing or using alternative database drivers.
    pub fn with_driver(driver: Arc<dyn DatabaseDriver>) -> Self {
        Self {
            slot: Arc::new(ConnectionSlot::new(driver)),
            query_timeout: None,
        }
    }

    /// Default per-call timeout for queriers created after this call.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn is_connected(&self) -> bool {
        self.slot.is_open()
    }

    /// Close the connection.
    ///
    /// Closing a client that is already disconnected only logs a warning.
    /// Queriers created from this client fail with an execution error afterwards.
    pub async fn disconnect(&self) -> Result<()> {
        let Some(driver) = self.slot.take() else {
            warn!("no active connection to disconnect");
            return Ok(());
        };

        if let Err(e) = driver.close().await {
            self.slot.restore(driver);
            return Err(SqlForgeError::Connection(e.to_string()));
        }

        info!("disconnected from database");
        Ok(())
    }

    /// Create a Querier for building and executing statements.
    pub fn querier(&self) -> Querier {
        Querier::new(Arc::clone(&self.slot), self.query_timeout)
    }
}
