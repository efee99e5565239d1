//! Live watch: follow the event channel and print one line per store change.

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::info;

use fleetsync_core::{Aggregates, Command as CoreCommand, Session, StoreSnapshot};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct WatchLine {
    at: DateTime<Utc>,
    #[serde(flatten)]
    aggregates: Aggregates,
}

fn table_line(line: &WatchLine, color: bool) -> String {
    let a = &line.aggregates;
    let link = match (a.connection_status, color) {
        (true, true) => "live".green().to_string(),
        (false, true) => "down".red().to_string(),
        (true, false) => "live".into(),
        (false, false) => "down".into(),
    };
    format!(
        "[{}] {link}  servers {}/{} online  attacks {} running  packets {}  avg {}/s",
        line.at.format("%H:%M:%S"),
        a.active_servers,
        a.total_servers,
        a.active_attacks,
        a.total_packets,
        a.avg_packet_rate,
    )
}

fn render_line(
    snap: &StoreSnapshot,
    global: &GlobalOpts,
    color: bool,
) -> Result<String, CliError> {
    let line = WatchLine {
        at: Utc::now(),
        aggregates: snap.aggregates(),
    };
    match global.output {
        OutputFormat::Table => Ok(table_line(&line, color)),
        // One document per line so the stream stays parseable.
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json_compact(&line),
        OutputFormat::Yaml => Ok(format!("---\n{}", output::render_yaml(&line)?)),
        OutputFormat::Plain => {
            let a = &line.aggregates;
            Ok(format!(
                "{} {} {} {} {} {}",
                u8::from(a.connection_status),
                a.total_servers,
                a.active_servers,
                a.active_attacks,
                a.total_packets,
                a.avg_packet_rate
            ))
        }
    }
}

pub async fn handle(
    session: &Session,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    if args.preload {
        session.execute(CoreCommand::LoadServers).await?;
        session.execute(CoreCommand::LoadAttacks).await?;
        let out = render_line(&session.store().snapshot(), global, color)?;
        output::print_output(&out, global.quiet);
    }

    let mut updates = session.subscribe();
    let mut link = session.connection_state();
    session.start().await?;
    info!(url = %session.config().base_url, "watching panel");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut printed: u64 = 0;
    loop {
        tokio::select! {
            biased;

            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }

            Ok(()) = link.changed() => {
                let state = *link.borrow_and_update();
                info!(?state, "event channel");
            }

            snap = updates.changed() => {
                let Some(snap) = snap else { break };
                let out = render_line(&snap, global, color)?;
                output::print_output(&out, global.quiet);

                printed += 1;
                if args.count.is_some_and(|n| printed >= n) {
                    break;
                }
            }
        }
    }

    Ok(())
}
