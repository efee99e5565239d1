//! Server command handlers.

use std::sync::Arc;

use tabled::Tabled;

use fleetsync_core::{Command as CoreCommand, EntityId, Server, ServerFilter, Session};

use crate::cli::{GlobalOpts, ServersArgs, ServersCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ServerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Packets")]
    packets: u64,
    #[tabled(rename = "Rate")]
    rate: u64,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

impl ServerRow {
    fn new(s: &Arc<Server>, color: bool) -> Self {
        Self {
            id: s.id.to_string(),
            name: s.name.clone(),
            address: s.address(),
            status: output::paint_status(s.status.as_str(), color),
            packets: s.packets_sent,
            rate: s.packets_rate,
            last_seen: s
                .last_seen
                .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

fn detail(s: &Arc<Server>) -> String {
    [
        format!("ID:        {}", s.id),
        format!("Name:      {}", s.name),
        format!("Address:   {}", s.address()),
        format!("Status:    {}", s.status),
        format!("Packets:   {}", s.packets_sent),
        format!("Rate:      {}/s", s.packets_rate),
        format!(
            "Last seen: {}",
            s.last_seen.map_or_else(|| "-".into(), |t| t.to_rfc3339())
        ),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: ServersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    session.execute(CoreCommand::LoadServers).await?;
    let snap = session.store().snapshot();
    let color = output::should_color(&global.color);

    match args.command {
        ServersCommand::List { online, offline } => {
            let filter = if online {
                ServerFilter::Online
            } else if offline {
                ServerFilter::Offline
            } else {
                ServerFilter::All
            };
            let servers = snap.servers_matching(&filter);
            let out = output::render_list(
                &global.output,
                &servers,
                |s| ServerRow::new(s, color),
                |s| s.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ServersCommand::Get { id } => {
            let server = snap
                .server(&EntityId::from(id.as_str()))
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "server".into(),
                    identifier: id,
                    list_command: "servers list".into(),
                })?;
            let out = output::render_single(&global.output, &server, detail, |s| {
                s.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
