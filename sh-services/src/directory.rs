//! Specialist directory: browse, search, filter and account linking.

use std::str::FromStr;

use tracing::info;

use sh_core::error::{ShError, ShResult};
use sh_models::{Condition, Database, Doctor, Role, User};

use crate::event_bus::{AppEvent, EventBus};
use crate::matching;
use crate::service::{Service, ServiceState};

/// Result ordering for directory searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DoctorSort {
    /// Highest rated first.
    #[default]
    Rating,
    /// Most years of practice first.
    Experience,
    /// Alphabetical by name.
    Name,
}

impl FromStr for DoctorSort {
    type Err = ShError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rating" => Ok(DoctorSort::Rating),
            "experience" => Ok(DoctorSort::Experience),
            "name" => Ok(DoctorSort::Name),
            other => Err(ShError::Validation(format!("unknown sort order: {other}"))),
        }
    }
}

/// Directory search criteria. Empty lists mean "no restriction".
#[derive(Debug, Clone, Default)]
pub struct DoctorFilter {
    /// Case-insensitive substring of name, specialty or any specialization.
    pub query: Option<String>,
    pub min_experience: u32,
    /// Exact specialty labels to keep.
    pub specialties: Vec<String>,
    /// Exact availability labels to keep.
    pub availability: Vec<String>,
    pub sort: DoctorSort,
}

impl DoctorFilter {
    pub fn matches(&self, doctor: &Doctor) -> bool {
        let query_ok = match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => {
                let q = q.to_lowercase();
                doctor.name.to_lowercase().contains(&q)
                    || doctor.specialty.to_lowercase().contains(&q)
                    || doctor.specializations.iter().any(|s| s.to_lowercase().contains(&q))
            }
        };

        query_ok
            && doctor.experience >= self.min_experience
            && (self.specialties.is_empty() || self.specialties.contains(&doctor.specialty))
            && (self.availability.is_empty() || self.availability.contains(&doctor.availability))
    }
}

/// Filter and sort a catalog. Ties keep catalog order.
pub fn apply_filter(doctors: Vec<Doctor>, filter: &DoctorFilter) -> Vec<Doctor> {
    let mut list: Vec<Doctor> = doctors.into_iter().filter(|d| filter.matches(d)).collect();
    match filter.sort {
        DoctorSort::Rating => list.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        DoctorSort::Experience => list.sort_by(|a, b| b.experience.cmp(&a.experience)),
        DoctorSort::Name => list.sort_by(|a, b| a.name.cmp(&b.name)),
    }
    list
}

/// Read access to the specialist catalog and condition list.
#[derive(Clone)]
pub struct DirectoryService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl DirectoryService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    /// Every doctor in catalog order.
    pub fn list(&self) -> ShResult<Vec<Doctor>> {
        let conn = self.database.conn()?;
        Doctor::list_all(&conn)
    }

    pub fn find(&self, doctor_id: &str) -> ShResult<Doctor> {
        let conn = self.database.conn()?;
        Doctor::find_by_id(&conn, doctor_id)?
            .ok_or_else(|| ShError::DoctorNotFound(doctor_id.to_string()))
    }

    pub fn search(&self, filter: &DoctorFilter) -> ShResult<Vec<Doctor>> {
        Ok(apply_filter(self.list()?, filter))
    }

    /// Doctors matching assessment concerns, in catalog order.
    pub fn recommended(&self, concerns: &[String]) -> ShResult<Vec<Doctor>> {
        let doctors = self.list()?;
        Ok(matching::doctors_for_concerns(concerns, &doctors)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Distinct specialty labels in catalog order.
    pub fn specialties(&self) -> ShResult<Vec<String>> {
        let mut labels: Vec<String> = Vec::new();
        for doctor in self.list()? {
            if !labels.contains(&doctor.specialty) {
                labels.push(doctor.specialty);
            }
        }
        Ok(labels)
    }

    pub fn conditions(&self) -> ShResult<Vec<Condition>> {
        let conn = self.database.conn()?;
        Condition::list_all(&conn)
    }

    /// Let a doctor account act for a catalog entry.
    ///
    /// An entry can be linked once and an account can back one entry.
    pub fn link_account(&self, doctor_id: &str, user: &User) -> ShResult<Doctor> {
        if user.role != Role::Doctor {
            return Err(ShError::Forbidden("only doctor accounts can be linked".into()));
        }

        let doctor = self.database.transaction(|conn| {
            let mut doctor = Doctor::find_by_id(conn, doctor_id)?
                .ok_or_else(|| ShError::DoctorNotFound(doctor_id.to_string()))?;
            match doctor.user_id.as_deref() {
                Some(existing) if existing == user.id => return Ok(doctor),
                Some(_) => {
                    return Err(ShError::Validation(format!(
                        "{} is already linked to another account",
                        doctor.name
                    )))
                }
                None => {}
            }
            Doctor::link_user(conn, doctor_id, &user.id)?;
            doctor.user_id = Some(user.id.clone());
            Ok(doctor)
        })?;

        info!("linked account {} to doctor {}", user.id, doctor.id);
        self.event_bus.emit(AppEvent::DoctorLinked {
            doctor_id: doctor.id.clone(),
            user_id: user.id.clone(),
        });
        Ok(doctor)
    }

    /// The catalog entry a doctor account is linked to, if any.
    pub fn entry_for_account(&self, user: &User) -> ShResult<Option<Doctor>> {
        let conn = self.database.conn()?;
        Doctor::find_by_user_id(&conn, &user.id)
    }
}

/// The catalog entry a doctor account acts for.
pub(crate) fn linked_entry(conn: &rusqlite::Connection, doctor: &User) -> ShResult<Doctor> {
    if doctor.role != Role::Doctor {
        return Err(ShError::Forbidden("requires a doctor account".into()));
    }
    Doctor::find_by_user_id(conn, &doctor.id)?.ok_or_else(|| {
        ShError::Forbidden("doctor account is not linked to a directory entry".into())
    })
}

impl Service for DirectoryService {
    fn name(&self) -> &str {
        "directory"
    }
    fn state(&self) -> ServiceState {
        self.state
    }
    fn init(&mut self) -> ShResult<()> {
        self.state = ServiceState::Running;
        info!("directory service initialized");
        Ok(())
    }
    fn shutdown(&mut self) -> ShResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}
