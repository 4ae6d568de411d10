//! Ten-question symptom self-assessment.
//!
//! `evaluate` is a pure scorer over the answers. `AssessmentSession` walks a
//! user through the questions one step at a time, and `AssessmentService`
//! delivers a finished assessment to a doctor.

use chrono::{DateTime, Utc};
use tracing::info;

use sh_core::error::{ShError, ShResult};
use sh_models::{
    now_timestamp, Answers, AssessmentResult, CategoryScores, Database, Doctor,
    NotificationType, Severity, TestResult, TestResultStatus, User,
};

use crate::directory::linked_entry;
use crate::event_bus::{AppEvent, EventBus};
use crate::notification::new_notification;
use crate::service::{Service, ServiceState};

/// One questionnaire item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub id: u8,
    pub category: &'static str,
    pub text: &'static str,
}

/// Highest answer value.
pub const MAX_ANSWER: u8 = 3;

/// Answer labels, indexed by value.
pub const ANSWER_OPTIONS: [&str; 4] = [
    "Not at all",
    "Several days",
    "More than half the days",
    "Nearly every day",
];

pub const QUESTIONS: [Question; 10] = [
    Question {
        id: 1,
        category: "Depression",
        text: "Over the past two weeks, how often have you felt little interest or pleasure in doing things?",
    },
    Question {
        id: 2,
        category: "Depression",
        text: "Over the past two weeks, how often have you felt down, depressed, or hopeless?",
    },
    Question {
        id: 3,
        category: "Anxiety",
        text: "Over the past two weeks, how often have you been feeling nervous, anxious, or on edge?",
    },
    Question {
        id: 4,
        category: "Anxiety",
        text: "Over the past two weeks, how often have you been unable to stop or control worrying?",
    },
    Question {
        id: 5,
        category: "Sleep",
        text: "Over the past two weeks, how often have you had trouble falling or staying asleep, or sleeping too much?",
    },
    Question {
        id: 6,
        category: "Energy",
        text: "Over the past two weeks, how often have you been feeling tired or having little energy?",
    },
    Question {
        id: 7,
        category: "Self-image",
        text: "Over the past two weeks, how often have you been feeling bad about yourself, or that you are a failure or have let yourself or your family down?",
    },
    Question {
        id: 8,
        category: "Concentration",
        text: "Over the past two weeks, how often have you had trouble concentrating on things, such as reading or watching television?",
    },
    Question {
        id: 9,
        category: "Physical Symptoms",
        text: "Over the past two weeks, how often have you been moving or speaking so slowly that other people could have noticed, or being so fidgety or restless that you have been moving around more than usual?",
    },
    Question {
        id: 10,
        category: "Suicidal Thoughts",
        text: "Over the past two weeks, how often have you had thoughts that you would be better off dead or of hurting yourself in some way?",
    },
];

const DEPRESSION_ITEMS: [u8; 3] = [1, 2, 7];
const ANXIETY_ITEMS: [u8; 2] = [3, 4];
const PHYSICAL_ITEMS: [u8; 4] = [5, 6, 8, 9];
const SUICIDAL_ITEM: u8 = 10;

pub const CONCERN_DEPRESSION: &str = "Depression";
pub const CONCERN_ANXIETY: &str = "Anxiety";
pub const CONCERN_PHYSICAL: &str = "Physical Symptoms";
pub const CONCERN_SUICIDAL: &str = "Suicidal Thoughts";

/// The fixed questionnaire, in order.
pub fn questions() -> &'static [Question] {
    &QUESTIONS
}

/// Reject answers to unknown questions and values above `MAX_ANSWER`.
pub fn validate_answers(answers: &Answers) -> ShResult<()> {
    for (&id, &value) in answers {
        if !QUESTIONS.iter().any(|q| q.id == id) {
            return Err(ShError::Validation(format!("unknown question id: {id}")));
        }
        if value > MAX_ANSWER {
            return Err(ShError::Validation(format!(
                "answer to question {id} must be between 0 and {MAX_ANSWER}, got {value}"
            )));
        }
    }
    Ok(())
}

fn mean(answers: &Answers, items: &[u8]) -> f64 {
    let sum: u32 = items.iter().map(|id| answers.get(id).copied().unwrap_or(0) as u32).sum();
    sum as f64 / items.len() as f64
}

fn severity_for(total: u32) -> Severity {
    if total >= 20 {
        Severity::Severe
    } else if total >= 15 {
        Severity::ModeratelySevere
    } else if total >= 10 {
        Severity::Moderate
    } else if total >= 5 {
        Severity::Mild
    } else {
        Severity::Minimal
    }
}

/// Score a set of answers. Missing answers count as 0.
pub fn evaluate(answers: &Answers) -> AssessmentResult {
    let total_score: u32 = answers.values().map(|&v| v as u32).sum();

    let category_scores = CategoryScores {
        depression: mean(answers, &DEPRESSION_ITEMS),
        anxiety: mean(answers, &ANXIETY_ITEMS),
        physical_symptoms: mean(answers, &PHYSICAL_ITEMS),
        suicidal_thoughts: answers.get(&SUICIDAL_ITEM).copied().unwrap_or(0) as f64,
    };

    let mut severity = severity_for(total_score);
    let mut primary_concerns = Vec::new();
    if category_scores.depression >= 2.0 {
        primary_concerns.push(CONCERN_DEPRESSION.to_string());
    }
    if category_scores.anxiety >= 2.0 {
        primary_concerns.push(CONCERN_ANXIETY.to_string());
    }
    if category_scores.physical_symptoms >= 2.0 {
        primary_concerns.push(CONCERN_PHYSICAL.to_string());
    }
    if category_scores.suicidal_thoughts >= 1.0 {
        primary_concerns.push(CONCERN_SUICIDAL.to_string());
        // Any suicidal ideation is treated as severe regardless of total.
        severity = Severity::Severe;
    }

    AssessmentResult {
        answers: answers.clone(),
        total_score,
        severity,
        primary_concerns,
        category_scores,
    }
}

// ─── Stepwise session ───────────────────────────────────────────────────────

/// Step-by-step walk through the questionnaire.
///
/// Step 0 is the intro, steps 1..=10 are the questions, and step 11 is the
/// result screen.
#[derive(Debug, Clone, Default)]
pub struct AssessmentSession {
    step: usize,
    answers: Answers,
    started_at: Option<DateTime<Utc>>,
    result: Option<AssessmentResult>,
}

impl AssessmentSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the first question and start the clock.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.step = 1;
        self.started_at = Some(now);
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    /// The question shown at the current step, if any.
    pub fn current_question(&self) -> Option<&'static Question> {
        self.step.checked_sub(1).and_then(|i| QUESTIONS.get(i))
    }

    /// Answer the current question.
    pub fn answer(&mut self, value: u8) -> ShResult<()> {
        let question = self
            .current_question()
            .ok_or_else(|| ShError::Validation("no question at the current step".into()))?;
        if value > MAX_ANSWER {
            return Err(ShError::Validation(format!(
                "answer must be between 0 and {MAX_ANSWER}"
            )));
        }
        self.answers.insert(question.id, value);
        Ok(())
    }

    /// Advance one step. Leaving the last question evaluates the answers
    /// and returns the result.
    pub fn next(&mut self) -> ShResult<Option<AssessmentResult>> {
        let question = self.current_question().ok_or_else(|| {
            ShError::Validation("assessment is not on a question step".into())
        })?;
        if !self.answers.contains_key(&question.id) {
            return Err(ShError::Validation(format!(
                "question {} must be answered before continuing",
                question.id
            )));
        }

        if self.step < QUESTIONS.len() {
            self.step += 1;
            return Ok(None);
        }

        let result = evaluate(&self.answers);
        self.result = Some(result.clone());
        self.step = QUESTIONS.len() + 1;
        Ok(Some(result))
    }

    /// Go back one question. Returns false when already on the first one.
    pub fn previous(&mut self) -> bool {
        if self.step > 1 && self.step <= QUESTIONS.len() {
            self.step -= 1;
            true
        } else {
            false
        }
    }

    /// Completion percentage: step / (questions + 1) * 100.
    pub fn progress(&self) -> f64 {
        self.step as f64 / (QUESTIONS.len() + 1) as f64 * 100.0
    }

    /// Time since `start` as "{m}m {s}s", or empty when not started.
    pub fn elapsed(&self, now: DateTime<Utc>) -> String {
        let Some(started) = self.started_at else {
            return String::new();
        };
        let secs = (now - started).num_seconds().max(0);
        format!("{}m {}s", secs / 60, secs % 60)
    }

    /// Whether every question has an answer.
    pub fn is_complete(&self) -> bool {
        QUESTIONS.iter().all(|q| self.answers.contains_key(&q.id))
    }

    /// Evaluate once all questions are answered.
    pub fn finish(&mut self) -> ShResult<AssessmentResult> {
        if !self.is_complete() {
            let missing: Vec<String> = QUESTIONS
                .iter()
                .filter(|q| !self.answers.contains_key(&q.id))
                .map(|q| q.id.to_string())
                .collect();
            return Err(ShError::Validation(format!(
                "unanswered questions: {}",
                missing.join(", ")
            )));
        }
        let result = evaluate(&self.answers);
        self.result = Some(result.clone());
        self.step = QUESTIONS.len() + 1;
        Ok(result)
    }

    /// Back to the intro with no answers.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ─── Delivery to doctors ────────────────────────────────────────────────────

/// Stores submitted assessments and routes them to doctors.
#[derive(Clone)]
pub struct AssessmentService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl AssessmentService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    /// Send a scored assessment to a catalog doctor.
    ///
    /// The doctor's linked account, if any, receives an assessment
    /// notification. `completed_at` defaults to now.
    pub fn send_to_doctor(
        &self,
        patient: &User,
        doctor_id: &str,
        answers: &Answers,
        completed_at: Option<&str>,
    ) -> ShResult<TestResult> {
        validate_answers(answers)?;
        let result = evaluate(answers);
        let sent_at = now_timestamp();

        let test_result = TestResult {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient.id.clone(),
            patient_name: patient.name.clone(),
            doctor_id: doctor_id.to_string(),
            answers: answers.clone(),
            result,
            completed_at: completed_at.map(str::to_string).unwrap_or_else(|| sent_at.clone()),
            sent_at,
            status: TestResultStatus::Pending,
        };

        let notification = self.database.transaction(|conn| {
            let doctor = Doctor::find_by_id(conn, doctor_id)?
                .ok_or_else(|| ShError::DoctorNotFound(doctor_id.to_string()))?;
            test_result.insert(conn)?;

            let Some(account) = doctor.user_id else {
                return Ok(None);
            };
            let note = new_notification(
                &account,
                "New Assessment Received",
                &format!(
                    "{} has sent you an assessment (severity: {})",
                    patient.name, test_result.result.severity
                ),
                NotificationType::Assessment,
                Some(&test_result.id),
            );
            note.insert(conn)?;
            Ok(Some(note))
        })?;

        info!("assessment {} sent to doctor {doctor_id}", test_result.id);
        self.event_bus.emit(AppEvent::AssessmentSubmitted {
            result_id: test_result.id.clone(),
            patient_id: patient.id.clone(),
            doctor_id: doctor_id.to_string(),
        });
        if let Some(note) = notification {
            self.event_bus.emit(AppEvent::NotificationCreated {
                notification_id: note.id,
                user_id: note.user_id,
            });
        }
        Ok(test_result)
    }

    /// Assessments addressed to the catalog entry linked to `doctor`.
    pub fn list_for_doctor(&self, doctor: &User) -> ShResult<Vec<TestResult>> {
        let conn = self.database.conn()?;
        let entry = linked_entry(&conn, doctor)?;
        TestResult::list_for_doctor(&conn, &entry.id)
    }

    /// Assessments the patient has sent.
    pub fn list_for_patient(&self, patient: &User) -> ShResult<Vec<TestResult>> {
        let conn = self.database.conn()?;
        TestResult::list_for_patient(&conn, &patient.id)
    }

    /// Mark an assessment sent to this doctor as reviewed.
    pub fn mark_reviewed(&self, doctor: &User, result_id: &str) -> ShResult<TestResult> {
        let conn = self.database.conn()?;
        let entry = linked_entry(&conn, doctor)?;
        let mut result = TestResult::find_by_id(&conn, result_id)?
            .ok_or_else(|| ShError::TestResultNotFound(result_id.to_string()))?;
        if result.doctor_id != entry.id {
            return Err(ShError::Forbidden("assessment was sent to another doctor".into()));
        }

        if result.status != TestResultStatus::Reviewed {
            TestResult::set_status(&conn, result_id, TestResultStatus::Reviewed)?;
            result.status = TestResultStatus::Reviewed;
            info!("assessment {result_id} reviewed by {}", doctor.id);
            self.event_bus.emit(AppEvent::AssessmentReviewed {
                result_id: result_id.to_string(),
            });
        }
        Ok(result)
    }
}

impl Service for AssessmentService {
    fn name(&self) -> &str {
        "assessment"
    }
    fn state(&self) -> ServiceState {
        self.state
    }
    fn init(&mut self) -> ShResult<()> {
        self.state = ServiceState::Running;
        info!("assessment service initialized");
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
    use chrono::Duration;

    fn answers(values: &[(u8, u8)]) -> Answers {
        values.iter().copied().collect()
    }

    fn all(value: u8) -> Answers {
        (1..=10).map(|id| (id, value)).collect()
    }

    #[test]
    fn test_questionnaire_shape() {
        assert_eq!(questions().len(), 10);
        assert_eq!(questions()[9].category, "Suicidal Thoughts");
        assert_eq!(ANSWER_OPTIONS[2], "More than half the days");
    }

    #[test]
    fn test_all_zero_is_minimal() {
        let result = evaluate(&all(0));
        assert_eq!(result.total_score, 0);
        assert_eq!(result.severity, Severity::Minimal);
        assert!(result.primary_concerns.is_empty());
    }

    #[test]
    fn test_severity_thresholds() {
        // Question 10 stays at 0 so the suicidal override does not apply.
        let spread = |total: u8| {
            let mut a = Answers::new();
            let mut left = total;
            for id in 1..=9u8 {
                let v = left.min(3);
                a.insert(id, v);
                left -= v;
            }
            a
        };
        assert_eq!(evaluate(&spread(4)).severity, Severity::Minimal);
        assert_eq!(evaluate(&spread(5)).severity, Severity::Mild);
        assert_eq!(evaluate(&spread(10)).severity, Severity::Moderate);
        assert_eq!(evaluate(&spread(15)).severity, Severity::ModeratelySevere);
        assert_eq!(evaluate(&spread(20)).severity, Severity::Severe);
    }

    #[test]
    fn test_depression_and_anxiety_concerns() {
        let result = evaluate(&answers(&[(1, 3), (2, 3), (7, 0), (3, 2), (4, 2)]));
        assert_eq!(result.category_scores.depression, 2.0);
        assert_eq!(result.category_scores.anxiety, 2.0);
        assert_eq!(result.primary_concerns, vec!["Depression", "Anxiety"]);
        assert_eq!(result.total_score, 10);
        assert_eq!(result.severity, Severity::Moderate);
    }

    #[test]
    fn test_suicidal_answer_forces_severe() {
        let result = evaluate(&answers(&[(10, 1)]));
        assert_eq!(result.total_score, 1);
        assert_eq!(result.severity, Severity::Severe);
        assert_eq!(result.primary_concerns, vec!["Suicidal Thoughts"]);
        assert_eq!(result.category_scores.suicidal_thoughts, 1.0);
    }

    #[test]
    fn test_physical_mean_uses_all_four_items() {
        let result = evaluate(&answers(&[(5, 3), (6, 3), (8, 2), (9, 0)]));
        assert_eq!(result.category_scores.physical_symptoms, 2.0);
        assert_eq!(result.primary_concerns, vec!["Physical Symptoms"]);
    }

    #[test]
    fn test_validate_answers() {
        assert!(validate_answers(&all(3)).is_ok());
        assert!(validate_answers(&answers(&[(11, 1)])).is_err());
        assert!(validate_answers(&answers(&[(0, 1)])).is_err());
        assert!(validate_answers(&answers(&[(2, 4)])).is_err());
    }

    #[test]
    fn test_session_walkthrough() {
        let t0 = Utc::now();
        let mut session = AssessmentSession::new();
        assert_eq!(session.progress(), 0.0);
        assert_eq!(session.elapsed(t0), "");
        assert!(session.next().is_err());

        session.start(t0);
        assert_eq!(session.current_question().unwrap().id, 1);
        assert!(session.next().is_err(), "cannot skip an unanswered question");

        for _ in 0..9 {
            session.answer(1).unwrap();
            assert!(session.next().unwrap().is_none());
        }
        assert_eq!(session.current_question().unwrap().id, 10);
        assert!(session.previous());
        assert_eq!(session.current_question().unwrap().id, 9);
        session.next().unwrap();

        session.answer(0).unwrap();
        let result = session.next().unwrap().unwrap();
        assert_eq!(result.total_score, 9);
        assert_eq!(result.severity, Severity::Mild);
        assert_eq!(session.step(), 11);
        assert_eq!(session.progress(), 100.0);
        assert!(!session.previous());

        assert_eq!(session.elapsed(t0 + Duration::seconds(125)), "2m 5s");

        session.reset();
        assert_eq!(session.step(), 0);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn test_session_finish_requires_all_answers() {
        let mut session = AssessmentSession::new();
        session.start(Utc::now());
        session.answer(2).unwrap();
        assert!(session.finish().is_err());
        assert!(session.answer(4).is_err());
    }

    #[test]
    fn test_progress_midway() {
        let mut session = AssessmentSession::new();
        session.start(Utc::now());
        let expected = 1.0 / 11.0 * 100.0;
        assert!((session.progress() - expected).abs() < 1e-9);
    }
}
