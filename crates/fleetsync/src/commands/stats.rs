//! Fleet statistics handler.

use serde::Serialize;

use fleetsync_core::{Aggregates, AttackStats, Command as CoreCommand, ServerStats, Session};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct FleetStats {
    servers: ServerStats,
    attacks: AttackStats,
    aggregates: Aggregates,
}

fn detail(s: &FleetStats) -> String {
    [
        format!("Servers:        {}", s.servers.total),
        format!("  online:       {}", s.servers.active),
        format!("  offline:      {}", s.servers.offline),
        format!("Attacks:        {}", s.attacks.total),
        format!("  running:      {}", s.attacks.active),
        format!("Packets sent:   {}", s.aggregates.total_packets),
        format!("Avg rate:       {}/s", s.aggregates.avg_packet_rate),
    ]
    .join("\n")
}

pub async fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    session.execute(CoreCommand::LoadServers).await?;
    session.execute(CoreCommand::LoadAttacks).await?;

    let snap = session.store().snapshot();
    let stats = FleetStats {
        servers: snap.server_stats(),
        attacks: snap.attack_stats(),
        aggregates: snap.aggregates(),
    };

    let out = output::render_single(&global.output, &stats, detail, |s| {
        format!(
            "{} {} {} {}",
            s.servers.total, s.servers.active, s.attacks.active, s.aggregates.total_packets
        )
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
