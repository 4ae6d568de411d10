//! Appointment entity model.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, Row};
use sh_core::error::{ShError, ShResult};

use super::text_enum;

/// Storage format for `Appointment::date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and confirmed appointments are still ahead of both parties.
    pub fn is_upcoming(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    /// Allowed lifecycle moves: pending -> confirmed|cancelled,
    /// confirmed -> completed|cancelled. Terminal states never move.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = ShError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            other => Err(ShError::Validation(format!("unknown appointment status: {other}"))),
        }
    }
}

/// Consultation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsultType {
    #[serde(rename = "online")]
    Online,
    #[serde(rename = "in-person")]
    InPerson,
}

impl ConsultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultType::Online => "online",
            ConsultType::InPerson => "in-person",
        }
    }
}

impl fmt::Display for ConsultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsultType {
    type Err = ShError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" | "video" => Ok(ConsultType::Online),
            "in-person" | "inperson" | "clinic" => Ok(ConsultType::InPerson),
            other => Err(ShError::Validation(format!("unknown consultation type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    /// Catalog doctor id.
    pub doctor_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    /// Slot label such as "09:00 AM".
    pub time: String,
    #[serde(rename = "type")]
    pub consult_type: ConsultType,
    pub status: AppointmentStatus,
    pub meeting_link: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Appointment {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let raw_date: String = row.get("date")?;
        let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

        Ok(Self {
            id: row.get("id")?,
            doctor_id: row.get("doctor_id")?,
            patient_id: row.get("patient_id")?,
            patient_name: row.get("patient_name")?,
            doctor_name: row.get("doctor_name")?,
            date,
            time: row.get("time")?,
            consult_type: text_enum(row, "type")?,
            status: text_enum(row, "status")?,
            meeting_link: row.get("meeting_link")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new appointment.
    ///
    /// Another non-cancelled appointment on the same doctor, date and time trips the
    /// partial unique index and surfaces as `SlotUnavailable`.
    pub fn insert(&self, conn: &Connection) -> ShResult<()> {
        let result = conn.execute(
            "INSERT INTO appointments (
                id, doctor_id, patient_id, patient_name, doctor_name, date, time,
                type, status, meeting_link, created_at, updated_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)",
            params![
                self.id,
                self.doctor_id,
                self.patient_id,
                self.patient_name,
                self.doctor_name,
                self.date.format(DATE_FORMAT).to_string(),
                self.time,
                self.consult_type.as_str(),
                self.status.as_str(),
                self.meeting_link,
                self.created_at,
                self.updated_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(ShError::SlotUnavailable(format!("{} {}", self.date, self.time)))
            }
            Err(e) => Err(ShError::Database(e.to_string())),
        }
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> ShResult<Option<Self>> {
        match conn.query_row("SELECT * FROM appointments WHERE id = ?1", [id], Self::from_row) {
            Ok(a) => Ok(Some(a)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ShError::Database(e.to_string())),
        }
    }

    /// Persist a status change. `meeting_link` is only overwritten when given.
    pub fn update_status(
        conn: &Connection,
        id: &str,
        status: AppointmentStatus,
        meeting_link: Option<&str>,
        updated_at: &str,
    ) -> ShResult<bool> {
        let changed = conn
            .execute(
                "UPDATE appointments
                 SET status = ?1, meeting_link = COALESCE(?2, meeting_link), updated_at = ?3
                 WHERE id = ?4",
                params![status.as_str(), meeting_link, updated_at, id],
            )
            .map_err(|e| ShError::Database(e.to_string()))?;
        Ok(changed > 0)
    }

    /// Times already taken on a doctor's date. Only cancellation frees a slot.
    pub fn booked_times(conn: &Connection, doctor_id: &str, date: NaiveDate) -> ShResult<Vec<String>> {
        let mut stmt = conn
            .prepare(
                "SELECT time FROM appointments
                 WHERE doctor_id = ?1 AND date = ?2 AND status != 'cancelled'",
            )
            .map_err(|e| ShError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(
                params![doctor_id, date.format(DATE_FORMAT).to_string()],
                |row| row.get::<_, String>(0),
            )
            .map_err(|e| ShError::Database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ShError::Database(e.to_string()))
    }

    /// Appointments booked by a patient, in date then time order.
    pub fn list_for_patient(conn: &Connection, patient_id: &str) -> ShResult<Vec<Self>> {
        Self::list_where(conn, "patient_id = ?1", Some(patient_id))
    }

    /// Appointments addressed to a catalog doctor, in date then time order.
    pub fn list_for_doctor(conn: &Connection, doctor_id: &str) -> ShResult<Vec<Self>> {
        Self::list_where(conn, "doctor_id = ?1", Some(doctor_id))
    }

    pub fn list_all(conn: &Connection) -> ShResult<Vec<Self>> {
        Self::list_where(conn, "1 = 1", None)
    }

    fn list_where(conn: &Connection, filter: &str, arg: Option<&str>) -> ShResult<Vec<Self>> {
        let sql = format!("SELECT * FROM appointments WHERE {filter} ORDER BY date ASC, rowid ASC");
        let mut stmt = conn.prepare(&sql).map_err(|e| ShError::Database(e.to_string()))?;
        let rows = match arg {
            Some(a) => stmt.query_map([a], Self::from_row),
            None => stmt.query_map([], Self::from_row),
        }
        .map_err(|e| ShError::Database(e.to_string()))?;

        let mut list = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ShError::Database(e.to_string()))?;
        // "02:00 PM" sorts before "09:00 AM" as text, so order times by clock value.
        list.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| slot_minutes(&a.time).cmp(&slot_minutes(&b.time)))
        });
        Ok(list)
    }
}

/// Minutes after midnight for a "hh:mm AM" label. Unparseable labels sort last.
pub fn slot_minutes(label: &str) -> u32 {
    chrono::NaiveTime::parse_from_str(label.trim(), "%I:%M %p")
        .map(|t| chrono::Timelike::num_seconds_from_midnight(&t) / 60)
        .unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn sample(id: &str, date: &str, time: &str, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: id.into(),
            doctor_id: "1".into(),
            patient_id: "p1".into(),
            patient_name: "Asha".into(),
            doctor_name: "Dr. Ananya Sharma".into(),
            date: NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap(),
            time: time.into(),
            consult_type: ConsultType::Online,
            status,
            meeting_link: None,
            created_at: "2026-10-18T09:00:00.000Z".into(),
            updated_at: "2026-10-18T09:00:00.000Z".into(),
        }
    }

    #[test]
    fn test_transitions() {
        use AppointmentStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Cancelled));
    }

    #[test]
    fn test_consult_type_serde_names() {
        assert_eq!(serde_json::to_string(&ConsultType::InPerson).unwrap(), "\"in-person\"");
        assert_eq!("in-person".parse::<ConsultType>().unwrap(), ConsultType::InPerson);
    }

    #[test]
    fn test_slot_minutes() {
        assert_eq!(slot_minutes("09:00 AM"), 540);
        assert_eq!(slot_minutes("02:00 PM"), 840);
        assert_eq!(slot_minutes("garbage"), u32::MAX);
    }

    #[test]
    fn test_double_booking_maps_to_slot_unavailable() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        sample("a1", "2026-10-20", "09:00 AM", AppointmentStatus::Pending).insert(&conn).unwrap();
        let err = sample("a2", "2026-10-20", "09:00 AM", AppointmentStatus::Pending)
            .insert(&conn)
            .unwrap_err();
        assert!(matches!(err, ShError::SlotUnavailable(_)));
    }

    #[test]
    fn test_list_orders_by_date_then_clock_time() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        sample("a1", "2026-10-21", "09:00 AM", AppointmentStatus::Pending).insert(&conn).unwrap();
        sample("a2", "2026-10-20", "02:00 PM", AppointmentStatus::Pending).insert(&conn).unwrap();
        sample("a3", "2026-10-20", "10:00 AM", AppointmentStatus::Pending).insert(&conn).unwrap();

        let ids: Vec<String> = Appointment::list_for_patient(&conn, "p1")
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["a3", "a2", "a1"]);
    }

    #[test]
    fn test_cancelled_frees_booked_times() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        sample("a1", "2026-10-20", "09:00 AM", AppointmentStatus::Pending).insert(&conn).unwrap();
        assert_eq!(Appointment::booked_times(&conn, "1", date).unwrap(), vec!["09:00 AM"]);

        Appointment::update_status(&conn, "a1", AppointmentStatus::Cancelled, None, "t").unwrap();
        assert!(Appointment::booked_times(&conn, "1", date).unwrap().is_empty());
    }
}
