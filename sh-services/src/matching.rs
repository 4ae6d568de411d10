//! Map assessment concerns to doctors whose specializations fit.

use sh_models::{AssessmentResult, Doctor};

use crate::assessment::{CONCERN_ANXIETY, CONCERN_DEPRESSION, CONCERN_PHYSICAL, CONCERN_SUICIDAL};

/// Specializations that address a concern. Unknown concerns map to nothing.
pub fn related_specializations(concern: &str) -> &'static [&'static str] {
    match concern {
        CONCERN_DEPRESSION => &["Depression", "Trauma", "Self-esteem"],
        CONCERN_ANXIETY => &["Anxiety", "Stress Management", "Work-Life Balance"],
        CONCERN_PHYSICAL => &["Sleep Disorders", "Stress Management"],
        CONCERN_SUICIDAL => &["Depression", "Trauma", "Self-esteem"],
        _ => &[],
    }
}

/// Doctors relevant to a set of concern labels, in catalog order.
///
/// With no concerns every doctor is relevant. Specialization matching is
/// exact and case-sensitive.
pub fn doctors_for_concerns<'a>(concerns: &[String], doctors: &'a [Doctor]) -> Vec<&'a Doctor> {
    if concerns.is_empty() {
        return doctors.iter().collect();
    }
    doctors
        .iter()
        .filter(|doctor| {
            concerns.iter().any(|concern| {
                related_specializations(concern)
                    .iter()
                    .any(|spec| doctor.has_specialization(spec))
            })
        })
        .collect()
}

/// Doctors relevant to an assessment result.
pub fn relevant_doctors<'a>(result: &AssessmentResult, doctors: &'a [Doctor]) -> Vec<&'a Doctor> {
    doctors_for_concerns(&result.primary_concerns, doctors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sh_models::Database;

    fn catalog() -> Vec<Doctor> {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        Doctor::list_all(&conn).unwrap()
    }

    fn ids(doctors: &[&Doctor]) -> Vec<String> {
        doctors.iter().map(|d| d.id.clone()).collect()
    }

    #[test]
    fn test_no_concerns_returns_everyone() {
        let doctors = catalog();
        assert_eq!(doctors_for_concerns(&[], &doctors).len(), 6);
    }

    #[test]
    fn test_depression_matches_sharma_patel_kapoor() {
        let doctors = catalog();
        let found = doctors_for_concerns(&["Depression".to_string()], &doctors);
        // Sharma (Depression), Patel (Trauma), Kapoor (Depression, Self-esteem).
        assert_eq!(ids(&found), vec!["1", "2", "5"]);
    }

    #[test]
    fn test_anxiety_matches() {
        let doctors = catalog();
        let found = doctors_for_concerns(&["Anxiety".to_string()], &doctors);
        assert_eq!(ids(&found), vec!["1", "2", "5"]);
    }

    #[test]
    fn test_physical_symptoms_only_stress_management() {
        let doctors = catalog();
        let found = doctors_for_concerns(&["Physical Symptoms".to_string()], &doctors);
        assert_eq!(ids(&found), vec!["2"]);
    }

    #[test]
    fn test_unknown_concern_matches_nothing() {
        let doctors = catalog();
        assert!(doctors_for_concerns(&["Insomnia".to_string()], &doctors).is_empty());
        assert!(related_specializations("depression").is_empty());
    }

    #[test]
    fn test_relevant_doctors_from_result() {
        let doctors = catalog();
        let mut answers = sh_models::Answers::new();
        answers.insert(10, 2);
        let result = crate::assessment::evaluate(&answers);
        assert_eq!(ids(&relevant_doctors(&result, &doctors)), vec!["1", "2", "5"]);
    }
}
