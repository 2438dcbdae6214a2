//! `countersign definition`

use anyhow::{Context, Result};

use countersign_step::ApprovalWorkflowStep;

/// Print the function definition as pretty JSON.
pub(crate) fn print_definition() -> Result<()> {
    let definition = ApprovalWorkflowStep::definition();
    let json =
        serde_json::to_string_pretty(&definition).context("failed to serialize definition")?;
    println!("{json}");
    Ok(())
}
