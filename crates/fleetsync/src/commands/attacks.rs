//! Attack job command handlers.

use std::sync::Arc;

use tabled::Tabled;

use fleetsync_core::{
    AttackFilter, AttackJob, AttackStatus, Command as CoreCommand, EntityId, Session,
};

use crate::cli::{AttacksArgs, AttacksCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct AttackRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Servers")]
    servers: usize,
    #[tabled(rename = "Sent")]
    sent: u64,
    #[tabled(rename = "Rate")]
    rate: String,
}

impl AttackRow {
    fn new(j: &Arc<AttackJob>, color: bool) -> Self {
        Self {
            id: j.id.to_string(),
            name: j.name.clone(),
            target: j.target(),
            status: output::paint_status(j.status.as_str(), color),
            servers: j.servers.len(),
            sent: j.total_packets_sent,
            rate: format!("{:.0}/s", j.current_rate),
        }
    }
}

fn limit(value: u64, unit: &str) -> String {
    if value == 0 {
        "unlimited".into()
    } else {
        format!("{value}{unit}")
    }
}

fn detail(j: &Arc<AttackJob>) -> String {
    let servers: Vec<String> = j.servers.iter().map(ToString::to_string).collect();
    [
        format!("ID:       {}", j.id),
        format!("Name:     {}", j.name),
        format!("Target:   {}", j.target()),
        format!("Status:   {}", j.status),
        format!("Duration: {}", limit(j.duration_secs, "s")),
        format!("Limit:    {}", limit(j.packets_per_second, " pps")),
        format!(
            "Started:  {}",
            j.start_time.map_or_else(|| "-".into(), |t| t.to_rfc3339())
        ),
        format!(
            "Ended:    {}",
            j.end_time.map_or_else(|| "-".into(), |t| t.to_rfc3339())
        ),
        format!("Servers:  {}", servers.join(", ")),
        format!("Sent:     {}", j.total_packets_sent),
        format!("Rate:     {:.1}/s", j.current_rate),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: AttacksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    session.execute(CoreCommand::LoadAttacks).await?;
    let snap = session.store().snapshot();
    let color = output::should_color(&global.color);

    match args.command {
        AttacksCommand::List { active, status } => {
            let filter = match (active, status) {
                (true, _) => AttackFilter::Active,
                (false, Some(s)) => AttackFilter::ByStatus(AttackStatus::from(s)),
                (false, None) => AttackFilter::All,
            };
            let attacks = snap.attacks_matching(&filter);
            let out = output::render_list(
                &global.output,
                &attacks,
                |j| AttackRow::new(j, color),
                |j| j.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AttacksCommand::Get { id } => {
            let job = snap
                .attack(&EntityId::from(id.as_str()))
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "attack".into(),
                    identifier: id,
                    list_command: "attacks list".into(),
                })?;
            let out = output::render_single(&global.output, &job, detail, |j| j.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
