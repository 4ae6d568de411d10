//! Appointment booking and the doctor-side lifecycle.
//!
//! Every status change is written together with its side effects (the
//! patient notification and the doctor's follow-up message) in a single
//! transaction, then announced on the event bus.

use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use rand::Rng;
use tracing::{debug, info};

use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};
use sh_models::{
    now_timestamp, Appointment, AppointmentStatus, ConsultType, Database, Doctor, Message,
    Notification, NotificationType, Role, User,
};

use crate::directory::linked_entry;
use crate::event_bus::{AppEvent, EventBus};
use crate::message::new_message;
use crate::notification::new_notification;
use crate::scheduling::is_closed_day;
use crate::service::{Service, ServiceState};

/// Which slice of an appointment list to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppointmentTab {
    /// Pending and confirmed.
    #[default]
    Upcoming,
    /// Completed.
    Past,
    Cancelled,
}

impl AppointmentTab {
    pub fn includes(&self, status: AppointmentStatus) -> bool {
        match self {
            AppointmentTab::Upcoming => status.is_upcoming(),
            AppointmentTab::Past => status == AppointmentStatus::Completed,
            AppointmentTab::Cancelled => status == AppointmentStatus::Cancelled,
        }
    }
}

impl FromStr for AppointmentTab {
    type Err = ShError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Ok(AppointmentTab::Upcoming),
            "past" | "completed" => Ok(AppointmentTab::Past),
            "cancelled" | "canceled" => Ok(AppointmentTab::Cancelled),
            other => Err(ShError::Validation(format!("unknown appointment tab: {other}"))),
        }
    }
}

/// "October 18th, 2026".
pub fn long_date(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {day}{suffix}, {}", date.format("%B"), date.year())
}

/// Prefix a doctor's name with "Dr." unless it already carries it.
pub fn doctor_title(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("Dr.") || name.starts_with("Dr ") {
        name.to_string()
    } else {
        format!("Dr. {name}")
    }
}

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `{base}/{doctor_user_id}/{8 random base36 chars}`.
pub fn meeting_link(base_url: &str, doctor_user_id: &str) -> String {
    let mut rng = rand::thread_rng();
    let token: String = (0..8)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}/{doctor_user_id}/{token}", base_url.trim_end_matches('/'))
}

/// Notification title and body sent to the patient for a new status.
fn patient_notice(status: AppointmentStatus, doctor: &str, when: &str) -> Option<(String, String)> {
    match status {
        AppointmentStatus::Confirmed => Some((
            "Appointment Confirmed".into(),
            format!("{doctor} has confirmed your appointment on {when}"),
        )),
        AppointmentStatus::Cancelled => Some((
            "Appointment Cancelled".into(),
            format!("{doctor} has cancelled your appointment on {when}"),
        )),
        AppointmentStatus::Completed => Some((
            "Appointment Completed".into(),
            format!("Your appointment with {doctor} has been marked as completed"),
        )),
        AppointmentStatus::Pending => None,
    }
}

/// Follow-up message the doctor sends for a new status, if any.
fn doctor_followup(status: AppointmentStatus, when: &str, link: Option<&str>) -> Option<String> {
    match status {
        AppointmentStatus::Confirmed => {
            let mut text = format!("I've confirmed our appointment on {when}.");
            if let Some(link) = link {
                text.push_str(&format!(" Here's the meeting link: {link}"));
            }
            Some(text)
        }
        AppointmentStatus::Cancelled => Some(format!(
            "I need to cancel our appointment scheduled for {when}. Please book another time that works for you."
        )),
        _ => None,
    }
}

/// Records written alongside a status change.
struct StatusEffects {
    appointment: Appointment,
    from: AppointmentStatus,
    notification: Option<Notification>,
    message: Option<Message>,
}

#[derive(Clone)]
pub struct AppointmentService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
    config: ConfigHandle,
}

impl AppointmentService {
    pub fn new(database: Database, event_bus: EventBus, config: ConfigHandle) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
            config,
        }
    }

    /// Book a pending appointment with a catalog doctor.
    pub fn book(
        &self,
        patient: &User,
        doctor_id: &str,
        date: NaiveDate,
        time: &str,
        consult_type: ConsultType,
    ) -> ShResult<Appointment> {
        if patient.role != Role::Patient {
            return Err(ShError::Forbidden("only patients can book appointments".into()));
        }
        if !patient.active {
            return Err(ShError::AccountInactive(patient.email.clone()));
        }
        if date < Local::now().date_naive() {
            return Err(ShError::Validation(format!("{date} is in the past")));
        }

        let config = self.config.snapshot();
        let time = time.trim();
        if !config.booking.time_slots.iter().any(|slot| slot == time) {
            return Err(ShError::Validation(format!("{time} is not a bookable time")));
        }
        if is_closed_day(date) {
            return Err(ShError::SlotUnavailable(format!("{date} is a Sunday")));
        }

        let now = now_timestamp();
        let (appointment, notification) = self.database.transaction(|conn| {
            let doctor = Doctor::find_by_id(conn, doctor_id)?
                .ok_or_else(|| ShError::DoctorNotFound(doctor_id.to_string()))?;
            let compatible = match consult_type {
                ConsultType::Online => doctor.offers_online(),
                ConsultType::InPerson => doctor.offers_in_person(),
            };
            if !compatible {
                return Err(ShError::Validation(format!(
                    "{} does not offer {consult_type} consultations",
                    doctor.name
                )));
            }
            if Appointment::booked_times(conn, doctor_id, date)?.iter().any(|t| t == time) {
                return Err(ShError::SlotUnavailable(format!("{date} {time}")));
            }

            let appointment = Appointment {
                id: uuid::Uuid::new_v4().to_string(),
                doctor_id: doctor.id.clone(),
                patient_id: patient.id.clone(),
                patient_name: patient.name.clone(),
                doctor_name: doctor.name.clone(),
                date,
                time: time.to_string(),
                consult_type,
                status: AppointmentStatus::Pending,
                meeting_link: None,
                created_at: now.clone(),
                updated_at: now.clone(),
            };
            appointment.insert(conn)?;

            let notification = match doctor.user_id.as_deref() {
                Some(account) if config.notifications.notify_on_booking => {
                    let note = new_notification(
                        account,
                        "New Appointment Request",
                        &format!(
                            "{} has requested a {consult_type} appointment on {} at {time}",
                            patient.name,
                            long_date(date)
                        ),
                        NotificationType::Appointment,
                        Some(&appointment.id),
                    );
                    note.insert(conn)?;
                    Some(note)
                }
                _ => None,
            };
            Ok((appointment, notification))
        })?;

        info!(
            "appointment {} booked with doctor {doctor_id} on {date} at {time}",
            appointment.id
        );
        self.event_bus.emit(AppEvent::AppointmentBooked {
            appointment_id: appointment.id.clone(),
            doctor_id: doctor_id.to_string(),
            patient_id: patient.id.clone(),
        });
        if let Some(note) = notification {
            self.event_bus.emit(AppEvent::NotificationCreated {
                notification_id: note.id,
                user_id: note.user_id,
            });
        }
        Ok(appointment)
    }

    pub fn list_for_patient(&self, patient: &User, tab: AppointmentTab) -> ShResult<Vec<Appointment>> {
        let conn = self.database.conn()?;
        let list = Appointment::list_for_patient(&conn, &patient.id)?;
        Ok(list.into_iter().filter(|a| tab.includes(a.status)).collect())
    }

    /// Appointments for the catalog entry linked to `doctor`.
    pub fn list_for_doctor(&self, doctor: &User, tab: AppointmentTab) -> ShResult<Vec<Appointment>> {
        let conn = self.database.conn()?;
        let entry = linked_entry(&conn, doctor)?;
        let list = Appointment::list_for_doctor(&conn, &entry.id)?;
        Ok(list.into_iter().filter(|a| tab.includes(a.status)).collect())
    }

    /// Move an appointment the doctor owns to `status`.
    ///
    /// The patient is notified, and for confirmations and cancellations the
    /// doctor also sends them a message.
    pub fn update_status(
        &self,
        doctor: &User,
        appointment_id: &str,
        status: AppointmentStatus,
        meeting_link: Option<&str>,
    ) -> ShResult<Appointment> {
        let meeting_link = meeting_link.map(str::trim).filter(|l| !l.is_empty());
        let now = now_timestamp();

        let effects = self.database.transaction(|conn| {
            let entry = linked_entry(conn, doctor)?;
            let mut appointment = Appointment::find_by_id(conn, appointment_id)?
                .ok_or_else(|| ShError::AppointmentNotFound(appointment_id.to_string()))?;
            if appointment.doctor_id != entry.id {
                return Err(ShError::Forbidden("appointment belongs to another doctor".into()));
            }

            let from = appointment.status;
            if !from.can_transition_to(status) {
                return Err(ShError::InvalidTransition {
                    from: from.to_string(),
                    to: status.to_string(),
                });
            }

            Appointment::update_status(conn, appointment_id, status, meeting_link, &now)?;
            appointment.status = status;
            appointment.updated_at = now.clone();
            if let Some(link) = meeting_link {
                appointment.meeting_link = Some(link.to_string());
            }

            let when = format!("{} at {}", long_date(appointment.date), appointment.time);
            let title = doctor_title(&doctor.name);

            let notification = match patient_notice(status, &title, &when) {
                Some((heading, body)) => {
                    let note = new_notification(
                        &appointment.patient_id,
                        &heading,
                        &body,
                        NotificationType::Appointment,
                        Some(&appointment.id),
                    );
                    note.insert(conn)?;
                    Some(note)
                }
                None => None,
            };

            let link = appointment.meeting_link.as_deref();
            let message = match doctor_followup(status, &when, link) {
                Some(text) => {
                    let message = new_message(&doctor.id, &appointment.patient_id, &text);
                    message.insert(conn)?;
                    Some(message)
                }
                None => None,
            };

            Ok(StatusEffects { appointment, from, notification, message })
        })?;

        let appointment = effects.appointment;
        info!("appointment {} {} -> {}", appointment.id, effects.from, status);
        self.event_bus.emit(AppEvent::AppointmentStatusChanged {
            appointment_id: appointment.id.clone(),
            from: effects.from.to_string(),
            to: status.to_string(),
        });
        if let Some(note) = effects.notification {
            self.event_bus.emit(AppEvent::NotificationCreated {
                notification_id: note.id,
                user_id: note.user_id,
            });
        }
        if let Some(message) = effects.message {
            self.event_bus.emit(AppEvent::MessageSent {
                message_id: message.id,
                sender_id: message.sender_id,
                recipient_id: message.recipient_id,
            });
        }
        Ok(appointment)
    }

    /// Confirm with a freshly generated meeting link.
    pub fn confirm_with_meeting_link(&self, doctor: &User, appointment_id: &str) -> ShResult<Appointment> {
        let base = self.config.snapshot().booking.meeting_base_url;
        let link = meeting_link(&base, &doctor.id);
        debug!("generated meeting link for appointment {appointment_id}");
        self.update_status(doctor, appointment_id, AppointmentStatus::Confirmed, Some(&link))
    }

    /// Patient-side cancellation of their own upcoming appointment.
    pub fn cancel_by_patient(&self, patient: &User, appointment_id: &str) -> ShResult<Appointment> {
        let now = now_timestamp();
        let notify = self.config.snapshot().notifications.notify_on_booking;

        let (appointment, from, notification) = self.database.transaction(|conn| {
            let mut appointment = Appointment::find_by_id(conn, appointment_id)?
                .ok_or_else(|| ShError::AppointmentNotFound(appointment_id.to_string()))?;
            if appointment.patient_id != patient.id {
                return Err(ShError::Forbidden("appointment belongs to another patient".into()));
            }

            let from = appointment.status;
            if !from.can_transition_to(AppointmentStatus::Cancelled) {
                return Err(ShError::InvalidTransition {
                    from: from.to_string(),
                    to: AppointmentStatus::Cancelled.to_string(),
                });
            }
            Appointment::update_status(conn, appointment_id, AppointmentStatus::Cancelled, None, &now)?;
            appointment.status = AppointmentStatus::Cancelled;
            appointment.updated_at = now.clone();

            let account = Doctor::find_by_id(conn, &appointment.doctor_id)?.and_then(|d| d.user_id);
            let notification = match account {
                Some(account) if notify => {
                    let note = new_notification(
                        &account,
                        "Appointment Cancelled",
                        &format!(
                            "{} has cancelled their appointment on {} at {}",
                            patient.name,
                            long_date(appointment.date),
                            appointment.time
                        ),
                        NotificationType::Appointment,
                        Some(&appointment.id),
                    );
                    note.insert(conn)?;
                    Some(note)
                }
                _ => None,
            };
            Ok((appointment, from, notification))
        })?;

        info!("appointment {} cancelled by patient {}", appointment.id, patient.id);
        self.event_bus.emit(AppEvent::AppointmentStatusChanged {
            appointment_id: appointment.id.clone(),
            from: from.to_string(),
            to: AppointmentStatus::Cancelled.to_string(),
        });
        if let Some(note) = notification {
            self.event_bus.emit(AppEvent::NotificationCreated {
                notification_id: note.id,
                user_id: note.user_id,
            });
        }
        Ok(appointment)
    }
}

impl Service for AppointmentService {
    fn name(&self) -> &str {
        "appointment"
    }
    fn state(&self) -> ServiceState {
        self.state
    }
    fn init(&mut self) -> ShResult<()> {
        self.state = ServiceState::Running;
        info!("appointment service initialized");
        Ok(())
    }
    fn shutdown(&mut self) -> ShResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}
