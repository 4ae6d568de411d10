//! Bookable time slots and unavailable dates per doctor.
//!
//! Availability is derived from existing appointments: a slot is taken while
//! any non-cancelled appointment holds it, and Sundays are closed.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use tracing::{debug, info};

use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};
use sh_models::{Appointment, Database, Doctor};

use crate::service::{Service, ServiceState};

/// One slot on a doctor's day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub time: String,
    pub available: bool,
}

/// Clinics are closed on Sundays.
pub fn is_closed_day(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

#[derive(Clone)]
pub struct SchedulingService {
    state: ServiceState,
    database: Database,
    config: ConfigHandle,
}

impl SchedulingService {
    pub fn new(database: Database, config: ConfigHandle) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            config,
        }
    }

    /// The configured slots for `date`, each marked free or taken.
    /// Sundays have no slots.
    pub fn time_slots(&self, doctor_id: &str, date: NaiveDate) -> ShResult<Vec<TimeSlot>> {
        let conn = self.database.conn()?;
        if Doctor::find_by_id(&conn, doctor_id)?.is_none() {
            return Err(ShError::DoctorNotFound(doctor_id.to_string()));
        }
        if is_closed_day(date) {
            return Ok(Vec::new());
        }

        let base = self.config.snapshot().booking.time_slots;
        let taken = Appointment::booked_times(&conn, doctor_id, date)?;

        Ok(base
            .into_iter()
            .map(|time| {
                let available = !taken.contains(&time);
                TimeSlot { time, available }
            })
            .collect())
    }

    /// Whether `time` is one of the slots offered on `date` and still free.
    pub fn is_slot_free(&self, doctor_id: &str, date: NaiveDate, time: &str) -> ShResult<bool> {
        Ok(self
            .time_slots(doctor_id, date)?
            .iter()
            .any(|slot| slot.time == time && slot.available))
    }

    /// Dates in the booking window after `today` that cannot be booked:
    /// Sundays and days with every slot taken.
    pub fn unavailable_dates(&self, doctor_id: &str, today: NaiveDate) -> ShResult<Vec<NaiveDate>> {
        let window = self.config.snapshot().booking.booking_window_days;
        let mut dates = Vec::new();

        for offset in 1..=i64::from(window) {
            let date = today + Duration::days(offset);
            if is_closed_day(date) {
                dates.push(date);
                continue;
            }
            if self.time_slots(doctor_id, date)?.iter().all(|slot| !slot.available) {
                dates.push(date);
            }
        }

        debug!("{} unavailable date(s) for doctor {doctor_id}", dates.len());
        Ok(dates)
    }
}

impl Service for SchedulingService {
    fn name(&self) -> &str {
        "scheduling"
    }
    fn state(&self) -> ServiceState {
        self.state
    }
    fn init(&mut self) -> ShResult<()> {
        self.state = ServiceState::Running;
        info!("scheduling service initialized");
        Ok(())
    }
    fn shutdown(&mut self) -> ShResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sh_core::config::AppConfig;
    use sh_models::{AppointmentStatus, ConsultType};

    fn service(config: AppConfig) -> SchedulingService {
        SchedulingService::new(Database::in_memory().unwrap(), ConfigHandle::new(config))
    }

    fn book(svc: &SchedulingService, id: &str, date: NaiveDate, time: &str, status: AppointmentStatus) {
        let appt = Appointment {
            id: id.into(),
            doctor_id: "1".into(),
            patient_id: "p".into(),
            patient_name: "P".into(),
            doctor_name: "Dr. Ananya Sharma".into(),
            date,
            time: time.into(),
            consult_type: ConsultType::Online,
            status,
            meeting_link: None,
            created_at: "t".into(),
            updated_at: "t".into(),
        };
        appt.insert(&svc.database.conn().unwrap()).unwrap();
    }

    // 2026-10-18 is a Sunday.
    fn sunday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_sunday_has_no_slots() {
        let svc = service(AppConfig::default());
        assert!(svc.time_slots("1", sunday()).unwrap().is_empty());
    }

    #[test]
    fn test_weekday_slots_and_taken_slot() {
        let svc = service(AppConfig::default());
        let monday = sunday() + Duration::days(1);
        book(&svc, "a1", monday, "10:00 AM", AppointmentStatus::Confirmed);
        book(&svc, "a2", monday, "02:00 PM", AppointmentStatus::Cancelled);

        let slots = svc.time_slots("1", monday).unwrap();
        assert_eq!(slots.len(), 7);
        assert_eq!(slots[0], TimeSlot { time: "09:00 AM".into(), available: true });
        assert!(!slots[1].available);
        assert!(slots[3].available, "cancelled appointments free their slot");

        assert!(!svc.is_slot_free("1", monday, "10:00 AM").unwrap());
        assert!(!svc.is_slot_free("1", monday, "07:00 AM").unwrap());
        assert!(svc.is_slot_free("1", monday, "09:00 AM").unwrap());
        assert!(svc.time_slots("2", monday).unwrap()[1].available, "other doctors unaffected");
    }

    #[test]
    fn test_unknown_doctor() {
        let svc = service(AppConfig::default());
        let monday = sunday() + Duration::days(1);
        assert!(matches!(svc.time_slots("99", monday), Err(ShError::DoctorNotFound(_))));
        assert!(matches!(svc.time_slots("99", sunday()), Err(ShError::DoctorNotFound(_))));
    }

    #[test]
    fn test_unavailable_dates_sundays_and_full_days() {
        let mut config = AppConfig::default();
        config.booking.time_slots = vec!["09:00 AM".into()];
        config.booking.booking_window_days = 14;
        let svc = service(config);

        let today = sunday();
        let tuesday = today + Duration::days(2);
        book(&svc, "a1", tuesday, "09:00 AM", AppointmentStatus::Pending);

        let dates = svc.unavailable_dates("1", today).unwrap();
        assert_eq!(
            dates,
            vec![tuesday, today + Duration::days(7), today + Duration::days(14)]
        );
    }
}
