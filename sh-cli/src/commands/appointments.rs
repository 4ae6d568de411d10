//! Appointment commands for patients and doctors.

use clap::Subcommand;
use console::style;

use sh_core::error::{ShError, ShResult};
use sh_models::{Appointment, AppointmentStatus, ConsultType, Role, User};
use sh_services::appointment::long_date;
use sh_services::{AppointmentTab, ServiceRegistry};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum AppointmentsAction {
    /// Request a consultation (patients).
    Book {
        /// Catalog doctor id.
        doctor_id: String,
        /// Date as YYYY-MM-DD.
        date: String,
        /// Slot label, e.g. "10:00 AM".
        time: String,
        /// online or in-person.
        #[arg(short = 't', long = "type", default_value = "online")]
        consult_type: String,
    },
    /// List your appointments.
    List {
        /// upcoming, past or cancelled.
        #[arg(default_value = "upcoming")]
        tab: String,
    },
    /// Confirm a pending request (doctors).
    Confirm {
        id: String,
        /// Meeting link to share; one is generated when omitted.
        #[arg(short, long)]
        link: Option<String>,
    },
    /// Mark a confirmed appointment as completed (doctors).
    Complete {
        id: String,
    },
    /// Cancel an appointment.
    Cancel {
        id: String,
    },
}

fn status_cell(status: AppointmentStatus) -> String {
    let styled = match status {
        AppointmentStatus::Pending => style(status.as_str()).yellow(),
        AppointmentStatus::Confirmed => style(status.as_str()).green(),
        AppointmentStatus::Completed => style(status.as_str()).blue(),
        AppointmentStatus::Cancelled => style(status.as_str()).red(),
    };
    styled.to_string()
}

fn print_list(viewer: &User, appointments: &[Appointment], format: OutputFormat) -> ShResult<()> {
    if let OutputFormat::Json = format {
        return super::print_json(appointments);
    }
    if appointments.is_empty() {
        println!("No appointments.");
        return Ok(());
    }

    let with = if viewer.role == Role::Doctor { "Patient" } else { "Doctor" };
    let mut table = super::new_table(vec!["Id", with, "Date", "Time", "Type", "Status", "Link"]);
    for a in appointments {
        let counterpart = if viewer.role == Role::Doctor {
            a.patient_name.clone()
        } else {
            a.doctor_name.clone()
        };
        table.add_row(vec![
            a.id.chars().take(8).collect(),
            counterpart,
            a.date.format("%a %Y-%m-%d").to_string(),
            a.time.clone(),
            a.consult_type.to_string(),
            status_cell(a.status),
            a.meeting_link.clone().unwrap_or_default(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Resolve a full id from an unambiguous prefix of one of the viewer's appointments.
fn resolve_id(registry: &ServiceRegistry, viewer: &User, raw: &str) -> ShResult<String> {
    let appointments = registry.appointments();
    let mut all = Vec::new();
    for tab in [AppointmentTab::Upcoming, AppointmentTab::Past, AppointmentTab::Cancelled] {
        let page = if viewer.role == Role::Doctor {
            appointments.list_for_doctor(viewer, tab)?
        } else {
            appointments.list_for_patient(viewer, tab)?
        };
        all.extend(page);
    }

    let matches: Vec<&Appointment> = all.iter().filter(|a| a.id.starts_with(raw)).collect();
    match matches.as_slice() {
        [one] => Ok(one.id.clone()),
        [] => Err(ShError::AppointmentNotFound(raw.to_string())),
        _ => Err(ShError::Validation(format!("{raw} matches more than one appointment"))),
    }
}

fn report(appointment: &Appointment, format: OutputFormat) -> ShResult<()> {
    match format {
        OutputFormat::Json => super::print_json(appointment),
        OutputFormat::Text => {
            println!(
                "  {} {} with {} on {} at {} is {}.",
                style("OK").green().bold(),
                appointment.consult_type,
                appointment.doctor_name,
                long_date(appointment.date),
                appointment.time,
                status_cell(appointment.status)
            );
            if let Some(link) = &appointment.meeting_link {
                println!("  Meeting link: {}", style(link).cyan());
            }
            Ok(())
        }
    }
}

pub async fn run(
    registry: &ServiceRegistry,
    action: AppointmentsAction,
    format: OutputFormat,
) -> ShResult<()> {
    let auth = registry.auth();
    let appointments = registry.appointments();

    match action {
        AppointmentsAction::Book { doctor_id, date, time, consult_type } => {
            let patient = auth.require_role(Role::Patient)?;
            let date = super::parse_date(&date)?;
            let consult_type: ConsultType = consult_type.parse()?;
            let booked = appointments.book(&patient, &doctor_id, date, &time, consult_type)?;
            report(&booked, format)?;
            if let OutputFormat::Text = format {
                println!("  The doctor will confirm your request shortly.");
            }
            Ok(())
        }
        AppointmentsAction::List { tab } => {
            let user = auth.require_user()?;
            let tab: AppointmentTab = tab.parse()?;
            let list = match user.role {
                Role::Doctor => appointments.list_for_doctor(&user, tab)?,
                _ => appointments.list_for_patient(&user, tab)?,
            };
            print_list(&user, &list, format)
        }
        AppointmentsAction::Confirm { id, link } => {
            let doctor = auth.require_role(Role::Doctor)?;
            let id = resolve_id(registry, &doctor, &id)?;
            let updated = match link {
                Some(link) => {
                    appointments.update_status(&doctor, &id, AppointmentStatus::Confirmed, Some(&link))?
                }
                None => appointments.confirm_with_meeting_link(&doctor, &id)?,
            };
            report(&updated, format)
        }
        AppointmentsAction::Complete { id } => {
            let doctor = auth.require_role(Role::Doctor)?;
            let id = resolve_id(registry, &doctor, &id)?;
            let updated = appointments.update_status(&doctor, &id, AppointmentStatus::Completed, None)?;
            report(&updated, format)
        }
        AppointmentsAction::Cancel { id } => {
            let user = auth.require_user()?;
            let id = resolve_id(registry, &user, &id)?;
            let updated = match user.role {
                Role::Doctor => appointments.update_status(&user, &id, AppointmentStatus::Cancelled, None)?,
                _ => appointments.cancel_by_patient(&user, &id)?,
            };
            report(&updated, format)
        }
    }
}
