//! Symptom self-assessment: the interactive questionnaire and delivery to a doctor.

use chrono::Utc;
use clap::Subcommand;
use console::style;
use dialoguer::{Confirm, Select};

use sh_core::error::{ShError, ShResult};
use sh_models::{Answers, AssessmentResult, Role, Severity};
use sh_services::assessment::{self, AssessmentSession, ANSWER_OPTIONS, QUESTIONS};
use sh_services::{matching, ServiceRegistry};

use super::prompt_error;
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum AssessAction {
    /// Walk through the ten questions, then optionally send the result to a doctor.
    Take,
    /// Score answers given on the command line, e.g. "3,2,1,0,0,1,2,3,0,0".
    Score {
        answers: String,
    },
    /// Send scored answers to a doctor.
    Send {
        /// Catalog doctor id.
        doctor_id: String,
        /// Ten comma-separated values between 0 and 3.
        answers: String,
    },
    /// Print the questionnaire.
    Questions,
}

/// Parse "v1,v2,...,v10" into answers keyed by question id.
pub fn parse_answers(raw: &str) -> ShResult<Answers> {
    let values: Vec<&str> = raw.split(',').map(str::trim).filter(|v| !v.is_empty()).collect();
    if values.len() != QUESTIONS.len() {
        return Err(ShError::Validation(format!(
            "expected {} answers, got {}",
            QUESTIONS.len(),
            values.len()
        )));
    }

    let mut answers = Answers::new();
    for (question, value) in QUESTIONS.iter().zip(values) {
        let value: u8 = value
            .parse()
            .map_err(|_| ShError::Validation(format!("not an answer value: {value}")))?;
        answers.insert(question.id, value);
    }
    assessment::validate_answers(&answers)?;
    Ok(answers)
}

fn severity_style(severity: Severity) -> console::StyledObject<&'static str> {
    let label = severity.as_str();
    match severity {
        Severity::Minimal | Severity::Mild => style(label).green(),
        Severity::Moderate => style(label).yellow(),
        Severity::ModeratelySevere | Severity::Severe => style(label).red().bold(),
    }
}

fn print_result(registry: &ServiceRegistry, result: &AssessmentResult, format: OutputFormat) -> ShResult<()> {
    let doctors = registry.directory().list()?;
    let relevant = matching::relevant_doctors(result, &doctors);

    match format {
        OutputFormat::Json => super::print_json(&serde_json::json!({
            "result": result,
            "recommended_doctors": relevant.iter().map(|d| &d.id).collect::<Vec<_>>(),
        })),
        OutputFormat::Text => {
            println!();
            println!("{}", style("Assessment Result").bold().underlined());
            println!("  Total score:  {} / {}", result.total_score, QUESTIONS.len() * 3);
            println!("  Severity:     {}", severity_style(result.severity));
            let scores = &result.category_scores;
            println!("  Depression:   {:.1}", scores.depression);
            println!("  Anxiety:      {:.1}", scores.anxiety);
            println!("  Physical:     {:.1}", scores.physical_symptoms);
            if result.primary_concerns.is_empty() {
                println!("  No primary concerns stood out.");
            } else {
                println!("  Concerns:     {}", result.primary_concerns.join(", "));
            }
            if result.primary_concerns.iter().any(|c| c == assessment::CONCERN_SUICIDAL) {
                println!();
                println!(
                    "  {} If you are thinking about harming yourself, please reach out to a crisis line or emergency services now.",
                    style("!").red().bold()
                );
            }

            println!();
            println!("{}", style("Recommended specialists").bold());
            for d in &relevant {
                println!("  [{}] {} ({})", d.id, d.name, d.specialty);
            }
            Ok(())
        }
    }
}

fn run_questionnaire() -> ShResult<AssessmentResult> {
    let mut session = AssessmentSession::new();
    session.start(Utc::now());

    loop {
        let Some(question) = session.current_question() else {
            return session.finish();
        };
        println!();
        println!(
            "{} {}",
            style(format!("[{}/{} · {:.0}%]", question.id, QUESTIONS.len(), session.progress())).dim(),
            style(question.category).cyan()
        );

        let mut items: Vec<&str> = ANSWER_OPTIONS.to_vec();
        if session.step() > 1 {
            items.push("← Previous question");
        }
        let default = session
            .answers()
            .get(&question.id)
            .map(|v| *v as usize)
            .unwrap_or(0);
        let choice = Select::new()
            .with_prompt(question.text)
            .items(&items)
            .default(default)
            .interact()
            .map_err(prompt_error)?;

        if choice >= ANSWER_OPTIONS.len() {
            session.previous();
            continue;
        }
        session.answer(choice as u8)?;
        if let Some(result) = session.next()? {
            println!("  Completed in {}", session.elapsed(Utc::now()));
            return Ok(result);
        }
    }
}

fn choose_doctor(registry: &ServiceRegistry, result: &AssessmentResult) -> ShResult<Option<String>> {
    let doctors = registry.directory().list()?;
    let relevant = matching::relevant_doctors(result, &doctors);
    let pool = if relevant.is_empty() { doctors.iter().collect() } else { relevant };

    let mut items: Vec<String> = pool.iter().map(|d| format!("{} ({})", d.name, d.specialty)).collect();
    items.push("Don't send".into());
    let choice = Select::new()
        .with_prompt("Send this assessment to")
        .items(&items)
        .default(0)
        .interact()
        .map_err(prompt_error)?;
    Ok(pool.get(choice).map(|d| d.id.clone()))
}

fn send(registry: &ServiceRegistry, doctor_id: &str, answers: &Answers, completed_at: &str) -> ShResult<()> {
    let patient = registry.auth().require_role(Role::Patient)?;
    let sent = registry
        .assessments()
        .send_to_doctor(&patient, doctor_id, answers, Some(completed_at))?;
    println!(
        "  {} Assessment sent (reference {}).",
        style("OK").green().bold(),
        style(&sent.id).dim()
    );
    Ok(())
}

pub async fn run(registry: &ServiceRegistry, action: AssessAction, format: OutputFormat) -> ShResult<()> {
    match action {
        AssessAction::Questions => {
            for q in QUESTIONS.iter() {
                println!("{:>2}. [{}] {}", q.id, q.category, q.text);
            }
            println!();
            for (value, label) in ANSWER_OPTIONS.iter().enumerate() {
                println!("  {value} = {label}");
            }
            Ok(())
        }
        AssessAction::Score { answers } => {
            let answers = parse_answers(&answers)?;
            print_result(registry, &assessment::evaluate(&answers), format)
        }
        AssessAction::Send { doctor_id, answers } => {
            let answers = parse_answers(&answers)?;
            send(registry, &doctor_id, &answers, &sh_models::now_timestamp())
        }
        AssessAction::Take => {
            println!("{}", style("Symptom Assessment").bold().underlined());
            println!("  Ten questions about the past two weeks. This is not a diagnosis.");
            let result = run_questionnaire()?;
            let completed_at = sh_models::now_timestamp();
            print_result(registry, &result, format)?;

            if registry.auth().current_user()?.is_none() {
                println!();
                println!("  Sign in as a patient to send this to a doctor.");
                return Ok(());
            }
            let wants_to_send = Confirm::new()
                .with_prompt("Share this result with a doctor?")
                .default(true)
                .interact()
                .map_err(prompt_error)?;
            if !wants_to_send {
                return Ok(());
            }
            match choose_doctor(registry, &result)? {
                Some(doctor_id) => send(registry, &doctor_id, &result.answers, &completed_at),
                None => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answers() {
        let answers = parse_answers("3, 2,1,0,0,1,2,3,0,0").unwrap();
        assert_eq!(answers.len(), 10);
        assert_eq!(answers[&1], 3);
        assert_eq!(answers[&8], 3);

        assert!(matches!(parse_answers("1,2,3"), Err(ShError::Validation(_))));
        assert!(matches!(parse_answers("4,0,0,0,0,0,0,0,0,0"), Err(ShError::Validation(_))));
        assert!(matches!(parse_answers("a,0,0,0,0,0,0,0,0,0"), Err(ShError::Validation(_))));
    }
}
