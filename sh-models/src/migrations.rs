//! Versioned database migrations.
//!
//! Migrations run sequentially from the current stored version to the latest.
//! Version 1 seeds the specialist catalog and the condition list.

use rusqlite::Connection;
use tracing::{info, warn};
use sh_core::error::{ShError, ShResult};
use sh_core::constants::DB_SCHEMA_VERSION;

use crate::models::condition::Condition;
use crate::models::doctor::Doctor;

/// Run all pending migrations on the database.
pub fn run_migrations(conn: &Connection) -> ShResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version >= DB_SCHEMA_VERSION {
        info!("database schema is up to date (version {current_version})");
        return Ok(());
    }

    info!("running migrations from version {current_version} to {DB_SCHEMA_VERSION}");

    for version in (current_version + 1)..=DB_SCHEMA_VERSION {
        run_migration(conn, version)?;
    }

    set_schema_version(conn, DB_SCHEMA_VERSION)?;
    info!("migrations complete, schema at version {DB_SCHEMA_VERSION}");
    Ok(())
}

/// Get the current schema version from the database.
fn get_schema_version(conn: &Connection) -> ShResult<i32> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .map_err(|e| ShError::Database(e.to_string()))?;

    if count == 0 {
        conn.execute("INSERT INTO schema_version (version) VALUES (0)", [])
            .map_err(|e| ShError::Database(e.to_string()))?;
        return Ok(0);
    }

    conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
        row.get(0)
    })
    .map_err(|e| ShError::Database(e.to_string()))
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> ShResult<()> {
    conn.execute("UPDATE schema_version SET version = ?1", [version])
        .map_err(|e| ShError::Database(e.to_string()))?;
    Ok(())
}

/// Run a specific migration version.
fn run_migration(conn: &Connection, version: i32) -> ShResult<()> {
    info!("applying migration version {version}");

    match version {
        1 => migration_v1(conn),
        _ => {
            warn!("unknown migration version {version}, skipping");
            Ok(())
        }
    }
}

/// Migration v1: seed the doctor catalog and the condition list.
fn migration_v1(conn: &Connection) -> ShResult<()> {
    let doctors: Vec<Doctor> = serde_json::from_str(SEED_DOCTORS)
        .map_err(|e| ShError::Migration(format!("bad doctor seed: {e}")))?;
    for (index, doctor) in doctors.iter().enumerate() {
        doctor.insert(conn, index as i64)?;
    }

    let conditions: Vec<Condition> = serde_json::from_str(SEED_CONDITIONS)
        .map_err(|e| ShError::Migration(format!("bad condition seed: {e}")))?;
    for (index, condition) in conditions.iter().enumerate() {
        condition.insert(conn, index as i64)?;
    }

    info!("seeded {} doctors and {} conditions", doctors.len(), conditions.len());
    Ok(())
}

const SEED_DOCTORS: &str = r#"[
  {
    "id": "1",
    "name": "Dr. Ananya Sharma",
    "specialty": "Psychiatrist",
    "experience": 12,
    "rating": 4.9,
    "reviews": 124,
    "image": "https://images.unsplash.com/photo-1559839734-2b71ea197ec2",
    "availability": "Online & In-person",
    "specializations": ["Depression", "Anxiety", "PTSD", "OCD"],
    "next_available": "Today, 4:00 PM",
    "bio": "Dr. Sharma is a board-certified psychiatrist with over 12 years of experience treating a wide range of mental health conditions. She specializes in medication management and psychotherapy for depression, anxiety, and trauma-related disorders.",
    "education": [
      "MBBS, All India Institute of Medical Sciences (AIIMS), Delhi",
      "MD in Psychiatry, NIMHANS, Bangalore",
      "Fellowship in Cognitive Behavioral Therapy, King's College London"
    ],
    "languages": ["English", "Hindi", "Bengali"],
    "consultation_fee": 1500,
    "first_consult_free": true
  },
  {
    "id": "2",
    "name": "Dr. Vikram Patel",
    "specialty": "Clinical Psychologist",
    "experience": 8,
    "rating": 4.7,
    "reviews": 98,
    "image": "https://images.unsplash.com/photo-1537368910025-700350fe46c7",
    "availability": "Online Only",
    "specializations": ["Stress Management", "Trauma", "Couples Therapy"],
    "next_available": "Tomorrow, 10:00 AM",
    "bio": "Dr. Patel is a clinical psychologist specializing in stress management, trauma recovery, and relationship counseling. He uses an evidence-based approach combining cognitive-behavioral techniques with mindfulness practices.",
    "education": [
      "MA in Clinical Psychology, University of Delhi",
      "PhD in Psychology, Tata Institute of Social Sciences, Mumbai",
      "Certification in Trauma-Focused Therapy"
    ],
    "languages": ["English", "Hindi", "Gujarati"],
    "consultation_fee": 1200,
    "first_consult_free": true
  },
  {
    "id": "3",
    "name": "Dr. Priya Nair",
    "specialty": "Child Psychiatrist",
    "experience": 15,
    "rating": 4.8,
    "reviews": 156,
    "image": "https://images.unsplash.com/photo-1594824476967-48c8b964273f",
    "availability": "Online & In-person",
    "specializations": ["ADHD", "Autism Spectrum", "Learning Disorders", "Behavioral Issues"],
    "next_available": "Today, 6:30 PM",
    "bio": "Dr. Nair is a child psychiatrist with 15 years of experience in diagnosing and treating mental health conditions in children and adolescents. She specializes in ADHD, autism spectrum disorders, and behavioral problems.",
    "education": [
      "MBBS, Christian Medical College, Vellore",
      "MD in Psychiatry, PGIMER, Chandigarh",
      "Fellowship in Child & Adolescent Psychiatry, Massachusetts General Hospital, USA"
    ],
    "languages": ["English", "Hindi", "Malayalam", "Tamil"],
    "consultation_fee": 1800,
    "first_consult_free": true
  },
  {
    "id": "4",
    "name": "Dr. Arjun Singh",
    "specialty": "Addiction Specialist",
    "experience": 10,
    "rating": 4.6,
    "reviews": 87,
    "image": "https://images.unsplash.com/photo-1622253692010-333f2da6031d",
    "availability": "In-person Only",
    "specializations": ["Substance Abuse", "Addiction Recovery", "Dual Diagnosis"],
    "next_available": "Tomorrow, 2:00 PM",
    "bio": "Dr. Singh specializes in addiction medicine and recovery. With a decade of experience, he has helped hundreds of patients overcome substance abuse disorders through a combination of medical treatment and psychosocial support.",
    "education": [
      "MBBS, Maulana Azad Medical College, Delhi",
      "MD in Psychiatry, KEM Hospital, Mumbai",
      "Certified in Addiction Medicine by ISAM"
    ],
    "languages": ["English", "Hindi", "Punjabi"],
    "consultation_fee": 1600,
    "first_consult_free": true
  },
  {
    "id": "5",
    "name": "Dr. Meena Kapoor",
    "specialty": "Psychotherapist",
    "experience": 7,
    "rating": 4.8,
    "reviews": 72,
    "image": "https://images.unsplash.com/photo-1614608682850-e0d6ed316d28",
    "availability": "Online Only",
    "specializations": ["Depression", "Anxiety", "Work-Life Balance", "Self-esteem"],
    "next_available": "Today, 8:00 PM",
    "bio": "Dr. Kapoor is a psychotherapist focusing on depression, anxiety, and work-related stress. She employs a holistic approach that addresses the mind-body connection and helps patients develop practical coping strategies.",
    "education": [
      "Master's in Clinical Psychology, Bangalore University",
      "PhD in Counseling Psychology, NIMHANS",
      "Certified in Cognitive Behavioral Therapy and Mindfulness-Based Stress Reduction"
    ],
    "languages": ["English", "Hindi", "Kannada"],
    "consultation_fee": 1100,
    "first_consult_free": true
  },
  {
    "id": "6",
    "name": "Dr. Rajesh Kumar",
    "specialty": "Geriatric Psychiatrist",
    "experience": 20,
    "rating": 4.9,
    "reviews": 214,
    "image": "https://images.unsplash.com/photo-1612349317150-e413f6a5b16d",
    "availability": "Online & In-person",
    "specializations": ["Dementia", "Alzheimer's", "Late-life Depression", "Elder Care"],
    "next_available": "Tomorrow, 11:30 AM",
    "bio": "Dr. Kumar is one of India's leading geriatric psychiatrists with two decades of experience. He specializes in late-life mental health concerns including dementia, depression, and anxiety disorders in the elderly population.",
    "education": [
      "MBBS, Armed Forces Medical College, Pune",
      "MD in Psychiatry, AIIMS, Delhi",
      "Fellowship in Geriatric Psychiatry, Johns Hopkins University, USA"
    ],
    "languages": ["English", "Hindi", "Marathi"],
    "consultation_fee": 2000,
    "first_consult_free": true
  }
]"#;

const SEED_CONDITIONS: &str = r#"[
  {"id": "depression", "name": "Depression", "icon": "🌧️", "description": "Persistent feelings of sadness and loss of interest"},
  {"id": "anxiety", "name": "Anxiety Disorders", "icon": "😰", "description": "Excessive worry, nervousness, or fear"},
  {"id": "bipolar", "name": "Bipolar Disorder", "icon": "🔄", "description": "Unusual shifts in mood, energy, and activity levels"},
  {"id": "ptsd", "name": "PTSD", "icon": "⚡", "description": "Difficulty recovering after experiencing or witnessing a terrifying event"},
  {"id": "ocd", "name": "OCD", "icon": "🔁", "description": "Unreasonable thoughts and fears that lead to repetitive behaviors"},
  {"id": "schizophrenia", "name": "Schizophrenia", "icon": "🧠", "description": "Distorted thinking, hallucinations, and altered perceptions"},
  {"id": "eating-disorders", "name": "Eating Disorders", "icon": "🍽️", "description": "Extreme emotions and behaviors surrounding food and weight"},
  {"id": "addiction", "name": "Addiction", "icon": "⛓️", "description": "Inability to stop using substances or engaging in behaviors"},
  {"id": "adhd", "name": "ADHD", "icon": "🔍", "description": "Difficulty paying attention, controlling impulsive behaviors"},
  {"id": "stress", "name": "Stress Management", "icon": "😫", "description": "Difficulty coping with pressure or challenging situations"},
  {"id": "sleep-disorders", "name": "Sleep Disorders", "icon": "😴", "description": "Problems with sleep quality, timing, or duration"},
  {"id": "trauma", "name": "Trauma", "icon": "💔", "description": "Emotional response to terrible events"}
]"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn test_migrations_on_fresh_db() {
        let conn = fresh();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), DB_SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = fresh();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 6);
    }

    #[test]
    fn test_conditions_seeded() {
        let conn = fresh();
        run_migrations(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM conditions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 12);
    }
}
