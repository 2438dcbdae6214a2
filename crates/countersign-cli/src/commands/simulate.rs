//! `countersign simulate`: run one execution end to end in-process.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::info;

use countersign_config::validate::MAX_SETTLING_DELAY_MS;
use countersign_core::{Choice, ExecutionId, UserId, WorkflowExecution};
use countersign_host::{HostHandle, HostRuntime, InMemoryHost, RuntimeError};
use countersign_step::StepSettings;

use crate::transport::LogTransport;

/// Reviewer choice on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ChoiceArg {
    /// Click "Approve".
    Approve,
    /// Click "Deny".
    Deny,
}

impl From<ChoiceArg> for Choice {
    fn from(arg: ChoiceArg) -> Self {
        match arg {
            ChoiceArg::Approve => Self::Approve,
            ChoiceArg::Deny => Self::Deny,
        }
    }
}

/// Arguments of `countersign simulate`.
#[derive(Debug, Clone, Args)]
pub(crate) struct SimulateArgs {
    /// User requesting approval
    #[arg(long)]
    pub(crate) requester: String,

    /// Channel the approval message is posted to
    #[arg(long)]
    pub(crate) channel: String,

    /// What is being approved
    #[arg(long)]
    pub(crate) subject: String,

    /// Free-form details
    #[arg(long)]
    pub(crate) details: String,

    /// Optional target date (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) target_date: Option<NaiveDate>,

    /// Button the reviewer clicks
    #[arg(long, value_enum)]
    pub(crate) choice: ChoiceArg,

    /// User who clicks (defaults to the requester)
    #[arg(long)]
    pub(crate) actor: Option<String>,

    /// Make the transport reject the approval message
    #[arg(long)]
    pub(crate) fail_delivery: bool,

    /// Override the settling delay, in milliseconds
    #[arg(long)]
    pub(crate) delay_ms: Option<u64>,
}

impl SimulateArgs {
    fn inputs(&self) -> Value {
        let mut inputs = json!({
            "requester_id": self.requester,
            "approval_channel_id": self.channel,
            "subject": self.subject,
            "details": self.details,
        });
        if let Some(date) = self.target_date {
            inputs["target_date"] = json!(date.format("%Y-%m-%d").to_string());
        }
        inputs
    }

    fn actor(&self) -> UserId {
        UserId::new(self.actor.as_deref().unwrap_or(&self.requester))
    }

    fn apply_delay(&self, settings: StepSettings) -> Result<StepSettings> {
        let Some(ms) = self.delay_ms else {
            return Ok(settings);
        };
        if ms > MAX_SETTLING_DELAY_MS {
            bail!("--delay-ms {ms} exceeds the {MAX_SETTLING_DELAY_MS} ms limit");
        }
        Ok(settings.with_settling_delay(Duration::from_millis(ms)))
    }
}

/// Run the simulation and print the final execution record.
pub(crate) async fn run_simulation(
    args: &SimulateArgs,
    settings: StepSettings,
    event_buffer: usize,
) -> Result<()> {
    let settings = args.apply_delay(settings)?;
    let record = simulate(args, settings, event_buffer).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&record).context("failed to serialize execution")?
    );
    if !record.status.is_terminal() {
        bail!(
            "execution {} is still pending: {}",
            record.id,
            record.last_step_error.as_deref().unwrap_or("no decision")
        );
    }
    Ok(())
}

async fn simulate(
    args: &SimulateArgs,
    settings: StepSettings,
    event_buffer: usize,
) -> Result<WorkflowExecution> {
    let transport = if args.fail_delivery {
        LogTransport::rejecting()
    } else {
        LogTransport::new()
    };
    let host = InMemoryHost::new();
    let (runtime, handle) =
        HostRuntime::new(host.clone(), Arc::new(transport), settings, event_buffer);
    let runtime = tokio::spawn(runtime.run());

    let execution_id = match handle.invoke(args.inputs()).await {
        Ok(id) => id,
        Err(RuntimeError::Step { execution_id, .. }) => {
            info!(%execution_id, "start failed; execution left pending");
            return finish(&host, handle, runtime, execution_id).await;
        },
        Err(e) => return Err(e).context("invocation rejected"),
    };

    let choice = Choice::from(args.choice);
    info!(
        %execution_id,
        %choice,
        delay = ?settings.settling_delay,
        "clicking"
    );
    handle
        .click(execution_id, choice.action_id(), args.actor())
        .await
        .context("decision failed")?;
    finish(&host, handle, runtime, execution_id).await
}

async fn finish(
    host: &InMemoryHost,
    handle: HostHandle,
    runtime: JoinHandle<()>,
    execution_id: ExecutionId,
) -> Result<WorkflowExecution> {
    drop(handle);
    runtime.await.context("host runtime panicked")?;
    host.get(&execution_id)
        .await
        .with_context(|| format!("execution {execution_id} disappeared"))
}
