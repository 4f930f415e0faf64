//! Main application state and service coordination
//!
//! This module contains the AppState that owns the box office, the metrics
//! collector, the HTTP server task and the background maintenance tasks.

use crate::config::AppConfig;
use crate::message::{MessageGenerator, ResilientMessageProvider};
use crate::metrics::MetricsCollector;
use crate::service::box_office::BoxOffice;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::service::http::{HttpServer, HttpState};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// The shared cinema line
    box_office: Arc<BoxOffice>,

    /// Metrics collector for monitoring and health checks
    metrics: Arc<MetricsCollector>,

    /// HTTP server and maintenance task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Signals the HTTP server to stop accepting connections
    shutdown_tx: broadcast::Sender<()>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application with all dependencies
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing cinema-queue service");
        info!(
            "Configuration: service={}, ticket_base={}, messages={}",
            config.service.name, config.queue.ticket_id_base, config.messages.enabled
        );

        let metrics = Self::initialize_metrics()?;
        let box_office = Arc::new(BoxOffice::from_config(&config, metrics.clone()));

        Ok(Self::with_components(config, box_office, metrics))
    }

    /// Initialize with a primary message generator in front of the fallback
    pub fn with_message_generator(
        config: AppConfig,
        generator: Arc<dyn MessageGenerator>,
    ) -> Result<Self, ServiceError> {
        let metrics = Self::initialize_metrics()?;
        let provider = ResilientMessageProvider::new(generator, config.message_timeout());
        let mut box_office = BoxOffice::from_config(&config, metrics.clone());
        if config.messages.enabled {
            box_office = box_office.with_messages(Arc::new(provider));
        } else {
            warn!("Messages are disabled; the supplied message generator will not be used");
        }

        Ok(Self::with_components(config, Arc::new(box_office), metrics))
    }

    /// Assemble from already-built components
    pub fn with_components(
        config: AppConfig,
        box_office: Arc<BoxOffice>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            box_office,
            metrics,
            background_tasks: Mutex::new(Vec::new()),
            shutdown_tx,
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        }
    }

    fn initialize_metrics() -> Result<Arc<MetricsCollector>, ServiceError> {
        MetricsCollector::new()
            .map(Arc::new)
            .map_err(|e| ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            })
    }

    /// Bind the HTTP server and start background tasks.
    ///
    /// Returns the address the server is listening on.
    pub async fn start(self: &Arc<Self>) -> Result<SocketAddr, ServiceError> {
        info!("Starting cinema-queue service");

        let addr: SocketAddr = format!(
            "{}:{}",
            self.config.service.host, self.config.service.http_port
        )
        .parse()
        .map_err(|e| ServiceError::Configuration {
            message: format!("Invalid HTTP address: {}", e),
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::Initialization {
                message: format!("Failed to bind {}: {}", addr, e),
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServiceError::Initialization {
                message: format!("Failed to read bound address: {}", e),
            })?;

        *self.is_running.write().await = true;

        let router = HttpServer::router(HttpState::new(
            self.box_office.clone(),
            self.metrics.clone(),
            Some(self.clone()),
        ));
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let server_task = tokio::spawn(async move {
            info!("HTTP server listening on http://{}", local_addr);
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                    info!("HTTP server shutdown signal received");
                })
                .await;

            match result {
                Ok(()) => info!("HTTP server stopped"),
                Err(e) => warn!("HTTP server exited with error: {}", e),
            }
        });

        let health_task = self.spawn_health_metrics_task();

        let mut tasks = self.background_tasks.lock().await;
        tasks.push(server_task);
        tasks.push(health_task);

        info!("✅ Cinema-queue service started on {}", local_addr);
        Ok(local_addr)
    }

    /// Periodically refresh uptime and health gauges
    fn spawn_health_metrics_task(self: &Arc<Self>) -> JoinHandle<()> {
        let app_state = self.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            info!("Health metrics task started");

            while app_state.is_running().await {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown_rx.recv() => break,
                }

                app_state.metrics.update_uptime(app_state.uptime());

                match HealthCheck::check(app_state.clone()).await {
                    Ok(health) => {
                        let status = match health.status {
                            HealthStatus::Healthy => 2,
                            HealthStatus::Degraded => 1,
                            HealthStatus::Unhealthy => 0,
                        };
                        app_state.metrics.update_health_status(status);
                        for check in &health.checks {
                            app_state.metrics.update_component_health(
                                &check.name,
                                check.status != HealthStatus::Unhealthy,
                            );
                        }
                        debug!(
                            "Health: {} - {} waiting, {} served",
                            health.status, health.stats.waiting, health.stats.tickets_served
                        );
                    }
                    Err(e) => warn!("Health check failed: {}", e),
                }
            }

            info!("Health metrics task stopped");
        })
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of cinema-queue service");

        *self.is_running.write().await = false;

        if let Err(e) = self.shutdown_tx.send(()) {
            debug!("No HTTP server listening for shutdown: {}", e);
        }

        let tasks: Vec<_> = self.background_tasks.lock().await.drain(..).collect();
        let task_count = tasks.len();
        let timeout = self.config.shutdown_timeout();

        let mut panicked = Vec::new();
        for task in tasks {
            let abort = task.abort_handle();
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_panic() => panicked.push(e.to_string()),
                Ok(Err(_)) => {}
                Err(_) => {
                    warn!("Background task did not stop within {:?}, aborting", timeout);
                    abort.abort();
                }
            }
        }

        let final_stats = self.box_office.stats().await;
        info!(
            "Final session {}: {} issued, {} served, {} still waiting",
            final_stats.session_id,
            final_stats.queue.tickets_issued,
            final_stats.queue.tickets_served,
            final_stats.queue.waiting
        );
        info!(
            "✅ Cinema-queue service shutdown completed ({} tasks stopped)",
            task_count
        );

        if !panicked.is_empty() {
            return Err(ServiceError::BackgroundTask {
                message: panicked.join("; "),
            });
        }

        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn box_office(&self) -> Arc<BoxOffice> {
        self.box_office.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.service.host = "127.0.0.1".to_string();
        config.service.shutdown_timeout_seconds = 1;
        config
    }

    #[tokio::test]
    async fn test_new_state_is_not_running() {
        let state = AppState::new(test_config()).unwrap();
        assert!(!state.is_running().await);
        assert_eq!(state.config().queue.ticket_id_base, 101);
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let mut config = test_config();
        // Pick a free port up front
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        config.service.http_port = probe.local_addr().unwrap().port();
        drop(probe);

        let state = Arc::new(AppState::new(config).unwrap());
        let addr = state.start().await.unwrap();
        assert!(state.is_running().await);
        assert_eq!(addr.ip().to_string(), "127.0.0.1");

        state.box_office().join(true).await;
        state.shutdown().await.unwrap();
        assert!(!state.is_running().await);
    }
}
