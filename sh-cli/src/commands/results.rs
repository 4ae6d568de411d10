//! Assessment results: the doctor's inbox and the patient's sent list.

use clap::Subcommand;
use console::style;

use sh_core::error::{ShError, ShResult};
use sh_models::{Role, TestResult, TestResultStatus};
use sh_services::ServiceRegistry;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ResultsAction {
    /// Doctors see received assessments, patients see what they sent.
    List,
    /// Show one assessment in full.
    Show {
        id: String,
    },
    /// Mark a received assessment as reviewed (doctors).
    Review {
        id: String,
    },
}

fn visible_results(registry: &ServiceRegistry) -> ShResult<(Role, Vec<TestResult>)> {
    let user = registry.auth().require_user()?;
    let assessments = registry.assessments();
    let results = match user.role {
        Role::Doctor => assessments.list_for_doctor(&user)?,
        _ => assessments.list_for_patient(&user)?,
    };
    Ok((user.role, results))
}

pub async fn run(registry: &ServiceRegistry, action: ResultsAction, format: OutputFormat) -> ShResult<()> {
    match action {
        ResultsAction::List => {
            let (role, results) = visible_results(registry)?;
            if let OutputFormat::Json = format {
                return super::print_json(&results);
            }
            if results.is_empty() {
                println!("No assessments.");
                return Ok(());
            }
            let mut table = super::new_table(vec![
                "Id", "Patient", "Doctor", "Score", "Severity", "Sent", "Status",
            ]);
            for r in &results {
                let status = match r.status {
                    TestResultStatus::Pending if role == Role::Doctor => {
                        style("new").yellow().bold().to_string()
                    }
                    TestResultStatus::Pending => style("pending").yellow().to_string(),
                    TestResultStatus::Reviewed => style("reviewed").green().to_string(),
                };
                table.add_row(vec![
                    r.id.chars().take(8).collect(),
                    r.patient_name.clone(),
                    r.doctor_id.clone(),
                    r.result.total_score.to_string(),
                    r.result.severity.to_string(),
                    r.sent_at.chars().take(10).collect(),
                    status,
                ]);
            }
            println!("{table}");
            Ok(())
        }
        ResultsAction::Show { id } => {
            let (_, results) = visible_results(registry)?;
            let result = results
                .into_iter()
                .find(|r| r.id.starts_with(&id))
                .ok_or_else(|| ShError::TestResultNotFound(id.clone()))?;
            match format {
                OutputFormat::Json => super::print_json(&result),
                OutputFormat::Text => {
                    println!("{}", style(format!("Assessment from {}", result.patient_name)).bold());
                    println!("  Completed: {}", result.completed_at);
                    println!("  Score:     {}  ({})", result.result.total_score, result.result.severity);
                    println!("  Concerns:  {}", result.result.primary_concerns.join(", "));
                    println!("  Status:    {}", result.status);
                    for (question, value) in &result.answers {
                        println!("    Q{question:<2} {value}");
                    }
                    Ok(())
                }
            }
        }
        ResultsAction::Review { id } => {
            let doctor = registry.auth().require_role(Role::Doctor)?;
            let assessments = registry.assessments();
            let full_id = assessments
                .list_for_doctor(&doctor)?
                .into_iter()
                .find(|r| r.id.starts_with(&id))
                .map(|r| r.id)
                .ok_or_else(|| ShError::TestResultNotFound(id.clone()))?;
            let reviewed = assessments.mark_reviewed(&doctor, &full_id)?;
            println!(
                "  {} Assessment from {} marked reviewed.",
                style("OK").green().bold(),
                reviewed.patient_name
            );
            Ok(())
        }
    }
}
