//! SynergiHub Services - Business logic and service layer.
//!
//! This crate provides the service trait, the service registry, and the
//! concrete services covering:
//! - Accounts, login and the persisted session
//! - The specialist directory and doctor account linking
//! - Time slots and unavailable dates
//! - Appointment booking and the doctor-side lifecycle
//! - Direct messaging and conversation threads
//! - In-app notifications
//! - The ten-question self-assessment, its scoring and delivery to doctors
//! - Concern-to-specialist matching
//! - Super-admin moderation and statistics
//! - Event bus (typed intra-service communication)

pub mod service;
pub mod registry;
pub mod event_bus;
pub mod auth;
pub mod directory;
pub mod matching;
pub mod scheduling;
pub mod appointment;
pub mod message;
pub mod notification;
pub mod assessment;
pub mod admin;

// Re-export key types
pub use service::{Service, ServiceState};
pub use registry::ServiceRegistry;
pub use event_bus::{AppEvent, EventBus};
pub use auth::AuthService;
pub use directory::{DirectoryService, DoctorFilter, DoctorSort};
pub use scheduling::{SchedulingService, TimeSlot};
pub use appointment::{AppointmentService, AppointmentTab};
pub use message::MessageService;
pub use notification::NotificationService;
pub use assessment::{AssessmentService, AssessmentSession};
pub use admin::{AdminService, AdminStats};
