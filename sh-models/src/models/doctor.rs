//! Specialist catalog entry.

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, ErrorCode, Row};
use sh_core::constants::availability;
use sh_core::error::{ShError, ShResult};

use super::json_column;

/// A doctor listed in the specialist directory.
///
/// Catalog entries are seeded at migration time. A doctor account can be
/// linked to one entry through `user_id`, which is how a signed-in doctor
/// sees the appointments and assessments addressed to that entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: String,
    /// Years of practice.
    pub experience: u32,
    pub rating: f64,
    pub reviews: u32,
    #[serde(default)]
    pub image: Option<String>,
    /// One of the `availability` constants.
    pub availability: String,
    pub specializations: Vec<String>,
    #[serde(default)]
    pub next_available: Option<String>,
    pub bio: String,
    pub education: Vec<String>,
    pub languages: Vec<String>,
    pub consultation_fee: u32,
    pub first_consult_free: bool,
    #[serde(default)]
    pub user_id: Option<String>,
}

const DOCTOR_COLUMNS: &str = "id, name, specialty, experience, rating, reviews, image, \
     availability, specializations, next_available, bio, education, languages, \
     consultation_fee, first_consult_free, user_id";

impl Doctor {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            specialty: row.get("specialty")?,
            experience: row.get("experience")?,
            rating: row.get("rating")?,
            reviews: row.get("reviews")?,
            image: row.get("image")?,
            availability: row.get("availability")?,
            specializations: json_column(row, "specializations")?,
            next_available: row.get("next_available")?,
            bio: row.get("bio")?,
            education: json_column(row, "education")?,
            languages: json_column(row, "languages")?,
            consultation_fee: row.get("consultation_fee")?,
            first_consult_free: row.get::<_, i32>("first_consult_free")? != 0,
            user_id: row.get("user_id")?,
        })
    }

    /// Whether video consultations can be booked with this doctor.
    pub fn offers_online(&self) -> bool {
        self.availability != availability::IN_PERSON_ONLY
    }

    /// Whether clinic visits can be booked with this doctor.
    pub fn offers_in_person(&self) -> bool {
        self.availability != availability::ONLINE_ONLY
    }

    /// Exact, case-sensitive membership test on the specialization list.
    pub fn has_specialization(&self, name: &str) -> bool {
        self.specializations.iter().any(|s| s == name)
    }

    /// Insert this entry at the given catalog position.
    pub fn insert(&self, conn: &Connection, sort_order: i64) -> ShResult<()> {
        let to_json = |list: &Vec<String>| {
            serde_json::to_string(list).map_err(|e| ShError::Serialization(e.to_string()))
        };

        conn.execute(
            "INSERT INTO doctors (
                id, name, specialty, experience, rating, reviews, image, availability,
                specializations, next_available, bio, education, languages,
                consultation_fee, first_consult_free, user_id, sort_order
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17)",
            params![
                self.id,
                self.name,
                self.specialty,
                self.experience,
                self.rating,
                self.reviews,
                self.image,
                self.availability,
                to_json(&self.specializations)?,
                self.next_available,
                self.bio,
                to_json(&self.education)?,
                to_json(&self.languages)?,
                self.consultation_fee,
                self.first_consult_free as i32,
                self.user_id,
                sort_order,
            ],
        )
        .map_err(|e| ShError::Database(e.to_string()))?;
        Ok(())
    }

    /// All catalog entries in catalog order.
    pub fn list_all(conn: &Connection) -> ShResult<Vec<Self>> {
        let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY sort_order ASC, id ASC");
        let mut stmt = conn.prepare(&sql).map_err(|e| ShError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], Self::from_row)
            .map_err(|e| ShError::Database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ShError::Database(e.to_string()))
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> ShResult<Option<Self>> {
        let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1");
        match conn.query_row(&sql, [id], Self::from_row) {
            Ok(d) => Ok(Some(d)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ShError::Database(e.to_string())),
        }
    }

    /// Find the entry linked to a doctor account.
    pub fn find_by_user_id(conn: &Connection, user_id: &str) -> ShResult<Option<Self>> {
        let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE user_id = ?1");
        match conn.query_row(&sql, [user_id], Self::from_row) {
            Ok(d) => Ok(Some(d)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ShError::Database(e.to_string())),
        }
    }

    /// Attach an account to this entry. An account can back one entry only.
    pub fn link_user(conn: &Connection, doctor_id: &str, user_id: &str) -> ShResult<bool> {
        let result = conn.execute(
            "UPDATE doctors SET user_id = ?1 WHERE id = ?2",
            params![user_id, doctor_id],
        );
        match result {
            Ok(changed) => Ok(changed > 0),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(ShError::Validation(format!(
                    "account {user_id} is already linked to another doctor"
                )))
            }
            Err(e) => Err(ShError::Database(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_seeded_catalog_order() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        let doctors = Doctor::list_all(&conn).unwrap();
        let ids: Vec<&str> = doctors.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(doctors[0].name, "Dr. Ananya Sharma");
        assert_eq!(doctors[0].specializations, vec!["Depression", "Anxiety", "PTSD", "OCD"]);
    }

    #[test]
    fn test_availability_modes() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        let patel = Doctor::find_by_id(&conn, "2").unwrap().unwrap();
        assert!(patel.offers_online());
        assert!(!patel.offers_in_person());

        let singh = Doctor::find_by_id(&conn, "4").unwrap().unwrap();
        assert!(!singh.offers_online());
        assert!(singh.offers_in_person());
    }

    #[test]
    fn test_link_user_once() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        assert!(Doctor::link_user(&conn, "1", "acct").unwrap());
        assert_eq!(Doctor::find_by_user_id(&conn, "acct").unwrap().unwrap().id, "1");
        assert!(Doctor::link_user(&conn, "2", "acct").is_err());
        assert!(!Doctor::link_user(&conn, "99", "other").unwrap());
    }

    #[test]
    fn test_specialization_match_is_exact() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        let kapoor = Doctor::find_by_id(&conn, "5").unwrap().unwrap();
        assert!(kapoor.has_specialization("Self-esteem"));
        assert!(!kapoor.has_specialization("self-esteem"));
    }
}
