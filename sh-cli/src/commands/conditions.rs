//! Condition list.

use sh_core::error::ShResult;
use sh_services::ServiceRegistry;

use crate::OutputFormat;

pub async fn run(registry: &ServiceRegistry, format: OutputFormat) -> ShResult<()> {
    let conditions = registry.directory().conditions()?;
    match format {
        OutputFormat::Json => super::print_json(&conditions),
        OutputFormat::Text => {
            let mut table = super::new_table(vec!["Condition", "About"]);
            for c in &conditions {
                table.add_row(vec![c.name.clone(), super::truncate(&c.description, 70)]);
            }
            println!("{table}");
            Ok(())
        }
    }
}
