//! Health check endpoints and monitoring
//!
//! This module provides health check functionality for the cinema-queue
//! service, including readiness and liveness probes.

use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional error message if unhealthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Current session, if the box office could be read
    pub session_id: Option<Uuid>,
    /// Customers currently waiting
    pub waiting: usize,
    /// VIPs currently waiting
    pub vip_waiting: usize,
    /// Customers served this session
    pub tickets_served: u64,
    /// Service uptime information
    pub uptime_info: String,
}

impl HealthCheck {
    /// Perform a comprehensive health check of the service
    pub async fn check(app_state: Arc<AppState>) -> Result<Self> {
        let mut checks = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        let service_check = Self::check_service_running(&app_state).await;
        if service_check.status != HealthStatus::Healthy {
            overall_status = HealthStatus::Unhealthy;
        }
        checks.push(service_check);

        for check in [
            Self::check_queue_manager(&app_state),
            Self::check_history_snapshot(&app_state),
        ] {
            if check.status == HealthStatus::Unhealthy {
                overall_status = HealthStatus::Unhealthy;
            } else if check.status == HealthStatus::Degraded
                && overall_status == HealthStatus::Healthy
            {
                overall_status = HealthStatus::Degraded;
            }
            checks.push(check);
        }

        let stats = Self::gather_service_stats(&app_state);

        Ok(HealthCheck {
            status: overall_status,
            service: app_state.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - verify service can handle requests
    pub async fn readiness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if !app_state.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }

        Ok(Self::check_queue_manager(&app_state).status)
    }

    async fn check_service_running(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if app_state.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// A busy lock only means an operation is in flight
    fn check_queue_manager(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match app_state.box_office().try_stats() {
            Some(_) => (HealthStatus::Healthy, None),
            None => (
                HealthStatus::Degraded,
                Some("Queue manager busy".to_string()),
            ),
        };

        ComponentCheck {
            name: "queue_manager".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Snapshot writes fail if the target directory is gone
    fn check_history_snapshot(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();
        let box_office = app_state.box_office();

        let (status, message) = match box_office.snapshot_path() {
            None => (HealthStatus::Healthy, Some("Snapshots disabled".to_string())),
            Some(path) => {
                let dir_ok = path
                    .parent()
                    .map(|dir| dir.as_os_str().is_empty() || dir.is_dir())
                    .unwrap_or(true);
                if dir_ok {
                    (HealthStatus::Healthy, None)
                } else {
                    (
                        HealthStatus::Degraded,
                        Some(format!("Snapshot directory missing for {}", path.display())),
                    )
                }
            }
        };

        ComponentCheck {
            name: "history_snapshot".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn gather_service_stats(app_state: &AppState) -> ServiceStats {
        let uptime_info = format!("Up {}s", app_state.uptime().as_secs());

        match app_state.box_office().try_stats() {
            Some(stats) => ServiceStats {
                session_id: Some(stats.session_id),
                waiting: stats.queue.waiting,
                vip_waiting: stats.queue.vip_waiting,
                tickets_served: stats.queue.tickets_served,
                uptime_info,
            },
            None => {
                debug!("Box office busy, reporting empty stats");
                ServiceStats {
                    session_id: None,
                    waiting: 0,
                    vip_waiting: 0,
                    tickets_served: 0,
                    uptime_info,
                }
            }
        }
    }
}

/// Convert health check to JSON string
impl HealthCheck {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn test_stopped_service_is_unhealthy() {
        let state = Arc::new(AppState::new(AppConfig::default()).unwrap());

        let health = HealthCheck::check(state.clone()).await.unwrap();
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.service, "cinema-queue");
        assert_eq!(health.stats.waiting, 0);

        assert_eq!(
            HealthCheck::liveness_check(state.clone()).await.unwrap(),
            HealthStatus::Unhealthy
        );
        assert_eq!(
            HealthCheck::readiness_check(state).await.unwrap(),
            HealthStatus::Unhealthy
        );
    }

    #[tokio::test]
    async fn test_missing_snapshot_dir_degrades() {
        let mut config = AppConfig::default();
        config.persistence.history_snapshot_path =
            Some("/nonexistent-cinema-queue-dir/history.json".into());
        let state = Arc::new(AppState::new(config).unwrap());

        let health = HealthCheck::check(state).await.unwrap();
        let snapshot = health
            .checks
            .iter()
            .find(|c| c.name == "history_snapshot")
            .unwrap();
        assert_eq!(snapshot.status, HealthStatus::Degraded);
        assert!(health.to_json().unwrap().contains("history_snapshot"));
    }

    #[test]
    fn test_status_display() {
        assert!(HealthStatus::Healthy.to_string().contains("healthy"));
        assert!(HealthStatus::Unhealthy.to_string().contains("unhealthy"));
    }
}
