//! Service registry for dependency injection and lifecycle management.
//!
//! The registry owns the shared infrastructure (config, database pool, event
//! bus), brings every service up in order and tears them down in reverse.
//! Callers obtain service handles through the typed accessors; handles share
//! the same pool and bus as the registered instances.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};
use sh_models::Database;

use crate::admin::AdminService;
use crate::appointment::AppointmentService;
use crate::assessment::AssessmentService;
use crate::auth::AuthService;
use crate::directory::DirectoryService;
use crate::event_bus::EventBus;
use crate::message::MessageService;
use crate::notification::NotificationService;
use crate::scheduling::SchedulingService;
use crate::service::{Service, ServiceState};

const EVENT_BUS_CAPACITY: usize = 256;

/// Central service registry that manages all application services.
pub struct ServiceRegistry {
    /// Application configuration.
    pub config: ConfigHandle,
    /// Database connection pool.
    pub database: Database,
    /// Application-level event bus.
    pub event_bus: EventBus,
    /// Registered services in initialization order.
    services: Vec<(String, Arc<RwLock<Box<dyn Service>>>)>,
}

impl ServiceRegistry {
    pub fn new(config: ConfigHandle, database: Database) -> Self {
        Self {
            config,
            database,
            event_bus: EventBus::new(EVENT_BUS_CAPACITY),
            services: Vec::new(),
        }
    }

    /// Register a service. Services are initialized in registration order.
    pub fn register<S: Service + 'static>(&mut self, service: S) {
        let name = service.name().to_string();
        info!("registered service: {name}");
        self.services
            .push((name, Arc::new(RwLock::new(Box::new(service)))));
    }

    /// Register all default services in dependency order:
    /// notifications first since the others write notifications, auth
    /// before anything that acts on a user, admin last.
    pub fn register_all(&mut self) {
        self.register(self.notifications());
        self.register(self.auth());
        self.register(self.directory());
        self.register(self.scheduling());
        self.register(self.messages());
        self.register(self.appointments());
        self.register(self.assessments());
        self.register(self.admin());

        info!("registered {} default services", self.services.len());
    }

    /// Initialize all registered services in order.
    pub async fn init_all(&self) -> ShResult<()> {
        info!("initializing {} services", self.services.len());

        for (name, service) in &self.services {
            let mut svc = service.write().await;
            if let Err(e) = svc.init() {
                error!("failed to initialize service {name}: {e}");
                return Err(ShError::ServiceInit(format!("{name}: {e}")));
            }
        }

        info!("all services initialized");
        Ok(())
    }

    /// Shut down all services in reverse order.
    pub async fn shutdown_all(&self) -> ShResult<()> {
        for (name, service) in self.services.iter().rev() {
            let mut svc = service.write().await;
            if let Err(e) = svc.shutdown() {
                // Keep going so the remaining services still stop.
                error!("error shutting down service {name}: {e}");
            }
        }

        info!("all services shut down");
        Ok(())
    }

    /// Name, state and health of every registered service.
    pub async fn health_check(&self) -> Vec<(String, ServiceState, bool)> {
        let mut results = Vec::new();
        for (name, service) in &self.services {
            let svc = service.read().await;
            results.push((name.clone(), svc.state(), svc.is_healthy()));
        }
        results
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // ─── Service handles ────────────────────────────────────────────────────

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.database.clone(), self.event_bus.clone(), self.config.clone())
    }

    pub fn directory(&self) -> DirectoryService {
        DirectoryService::new(self.database.clone(), self.event_bus.clone())
    }

    pub fn scheduling(&self) -> SchedulingService {
        SchedulingService::new(self.database.clone(), self.config.clone())
    }

    pub fn appointments(&self) -> AppointmentService {
        AppointmentService::new(self.database.clone(), self.event_bus.clone(), self.config.clone())
    }

    pub fn messages(&self) -> MessageService {
        MessageService::new(self.database.clone(), self.event_bus.clone(), self.config.clone())
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.database.clone(), self.event_bus.clone())
    }

    pub fn assessments(&self) -> AssessmentService {
        AssessmentService::new(self.database.clone(), self.event_bus.clone())
    }

    pub fn admin(&self) -> AdminService {
        AdminService::new(self.database.clone(), self.event_bus.clone(), self.config.clone())
    }
}
