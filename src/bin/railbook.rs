//! The driver binary: reads framed commands off stdin, dispatches them
//! against a [`railbook::system::System`], and writes `<timestamp>
//! <payload>` per spec §6. Framing and formatting are the "external
//! collaborator" spec §1 excludes from the graded core; this binary is
//! what makes the crate a runnable program rather than just a library.

use std::io::{self, BufRead, Write};

use clap::Parser;
use log::{error, info};

use railbook::command::{BuyOutcome, Response, SeatCell};
use railbook::config::StorageConfig;
use railbook::framing::parse_line;
use railbook::system::System;

#[derive(Parser, Debug)]
#[command(name = "railbook", about = "Transactional ticket-reservation engine")]
struct Args {
    /// Directory holding the persistent map files. Overrides
    /// `RAILBOOK_DATA_DIR` when given.
    #[arg(long)]
    data_dir: Option<String>,
}

fn main() {
    pretty_env_logger::init();

    let args = Args::parse();
    let config = match args.data_dir {
        Some(dir) => StorageConfig::new(dir),
        None => StorageConfig::from_env(),
    };

    let mut system = match System::open(&config) {
        Ok(system) => system,
        Err(err) => {
            error!("failed to open storage at {}: {err}", config.data_dir().display());
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!("failed to read stdin: {err}");
                break;
            }
        };

        let Some(framed) = parse_line(&line) else {
            continue;
        };

        let response = match framed.command {
            Ok(command) => system.dispatch(command),
            Err(_) => Response::Failure,
        };

        let bye = matches!(response, Response::Bye);
        if let Err(err) = writeln!(out, "{} {}", framed.timestamp, render(&response)) {
            error!("failed to write reply: {err}");
            break;
        }
        if bye {
            info!("exit requested; shutting down");
            break;
        }
    }
}

/// Render a [`Response`] into the exact wire-level text shape of spec
/// §6. The core never produces this text itself; rendering is this
/// binary's job alone.
fn render(response: &Response) -> String {
    match response {
        Response::Ack => "0".to_string(),
        Response::Failure => "-1".to_string(),
        Response::Bye => "bye".to_string(),
        Response::Profile(profile) => {
            format!("{} {} {} {}", profile.uid, profile.name, profile.mail, profile.privilege)
        }
        Response::TrainDetails { train_id, train_type, rows } => {
            let mut lines = vec![format!("{train_id} {train_type}")];
            for row in rows {
                let arr = row.arriving.map(|t| t.format()).unwrap_or_else(|| "xx-xx xx:xx".to_string());
                let lea = row.leaving.map(|t| t.format()).unwrap_or_else(|| "xx-xx xx:xx".to_string());
                let seat = match row.seats {
                    SeatCell::Seats(n) => n.to_string(),
                    SeatCell::NotApplicable => "x".to_string(),
                };
                lines.push(format!("{} {} -> {} {} {}", row.station, arr, lea, row.price_sum, seat));
            }
            lines.join("\n")
        }
        Response::Tickets(legs) => {
            let mut lines = vec![legs.len().to_string()];
            lines.extend(legs.iter().map(render_leg));
            lines.join("\n")
        }
        Response::Transfer(None) => "0".to_string(),
        Response::Transfer(Some((leg1, leg2))) => {
            format!("{}\n{}", render_leg(leg1), render_leg(leg2))
        }
        Response::Bought(BuyOutcome::Purchased { total_cost }) => total_cost.to_string(),
        Response::Bought(BuyOutcome::Queued) => "queue".to_string(),
        Response::Orders(orders) => {
            let mut lines = vec![orders.len().to_string()];
            lines.extend(orders.iter().map(|o| {
                format!(
                    "[{}] {} {} {} -> {} {} {} {}",
                    o.status_label,
                    o.train_id,
                    o.from,
                    o.leaving.format(),
                    o.to,
                    o.arriving.format(),
                    o.price,
                    o.num
                )
            }));
            lines.join("\n")
        }
    }
}

fn render_leg(leg: &railbook::command::TicketLeg) -> String {
    format!(
        "{} {} {} -> {} {} {} {}",
        leg.train_id,
        leg.from,
        leg.leaving.format(),
        leg.to,
        leg.arriving.format(),
        leg.cost,
        leg.seats
    )
}
