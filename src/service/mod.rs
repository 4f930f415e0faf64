//! Service layer for the cinema-queue box office
//!
//! This module contains the shared box office, the HTTP surface, health
//! checks, and the application state that ties them together.

pub mod app;
pub mod box_office;
pub mod health;
pub mod http;

pub use app::{AppState, ServiceError};
pub use box_office::{BoxOffice, BoxOfficeStats, QueueView, ServeOutcome};
pub use health::{HealthCheck, HealthStatus};
pub use http::{HttpServer, HttpState};
