//! Assessments a patient has sent to a doctor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use sh_core::error::{ShError, ShResult};

use super::assessment::{Answers, AssessmentResult};
use super::{json_column, text_enum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResultStatus {
    Pending,
    Reviewed,
}

impl TestResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestResultStatus::Pending => "pending",
            TestResultStatus::Reviewed => "reviewed",
        }
    }
}

impl fmt::Display for TestResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestResultStatus {
    type Err = ShError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TestResultStatus::Pending),
            "reviewed" => Ok(TestResultStatus::Reviewed),
            other => Err(ShError::Validation(format!("unknown test result status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    /// Catalog doctor id the result was sent to.
    pub doctor_id: String,
    pub answers: Answers,
    pub result: AssessmentResult,
    pub completed_at: String,
    pub sent_at: String,
    pub status: TestResultStatus,
}

impl TestResult {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            patient_id: row.get("patient_id")?,
            patient_name: row.get("patient_name")?,
            doctor_id: row.get("doctor_id")?,
            answers: json_column(row, "answers")?,
            result: json_column(row, "result")?,
            completed_at: row.get("completed_at")?,
            sent_at: row.get("sent_at")?,
            status: text_enum(row, "status")?,
        })
    }

    pub fn insert(&self, conn: &Connection) -> ShResult<()> {
        let answers = serde_json::to_string(&self.answers)?;
        let result = serde_json::to_string(&self.result)?;
        conn.execute(
            "INSERT INTO test_results (
                id, patient_id, patient_name, doctor_id, answers, result,
                completed_at, sent_at, status
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            params![
                self.id,
                self.patient_id,
                self.patient_name,
                self.doctor_id,
                answers,
                result,
                self.completed_at,
                self.sent_at,
                self.status.as_str(),
            ],
        )
        .map_err(|e| ShError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> ShResult<Option<Self>> {
        match conn.query_row("SELECT * FROM test_results WHERE id = ?1", [id], Self::from_row) {
            Ok(t) => Ok(Some(t)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ShError::Database(e.to_string())),
        }
    }

    /// Results sent to a catalog doctor, newest first.
    pub fn list_for_doctor(conn: &Connection, doctor_id: &str) -> ShResult<Vec<Self>> {
        Self::list_by(conn, "doctor_id", doctor_id)
    }

    /// Results a patient has sent, newest first.
    pub fn list_for_patient(conn: &Connection, patient_id: &str) -> ShResult<Vec<Self>> {
        Self::list_by(conn, "patient_id", patient_id)
    }

    fn list_by(conn: &Connection, column: &str, value: &str) -> ShResult<Vec<Self>> {
        let sql = format!(
            "SELECT * FROM test_results WHERE {column} = ?1 ORDER BY sent_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql).map_err(|e| ShError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([value], Self::from_row)
            .map_err(|e| ShError::Database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ShError::Database(e.to_string()))
    }

    pub fn set_status(conn: &Connection, id: &str, status: TestResultStatus) -> ShResult<bool> {
        let changed = conn
            .execute(
                "UPDATE test_results SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )
            .map_err(|e| ShError::Database(e.to_string()))?;
        Ok(changed > 0)
    }
}
