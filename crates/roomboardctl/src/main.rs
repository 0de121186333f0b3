use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roomboard_core::config;
use roomboard_core::ipc::{self, ClientMsg, RenderMsg};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;

#[derive(Parser)]
#[command(name = "roomboardctl", about = "Control the roomboard daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show daemon status
    Status,
    /// Display the schedule for a date (YYYY-MM-DD)
    Show {
        date: String,
    },
    /// Open the calendar overlay
    OpenCalendar,
    /// Close the calendar overlay
    CloseCalendar,
    /// Move the calendar by a number of months (e.g. -1, 1)
    Navigate {
        delta: i32,
    },
    /// Toggle the light/dark theme pass-through
    Theme,
    /// Register as a renderer and print the instruction stream
    Watch,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let socket_path = config::socket_path();
    let stream = UnixStream::connect(&socket_path).with_context(|| {
        format!(
            "connecting to roomboard at {}\nIs the daemon running?",
            socket_path.display()
        )
    })?;

    let mut writer = stream.try_clone().context("cloning stream")?;
    let reader = BufReader::new(stream);

    let msg: ClientMsg = match &cli.command {
        Command::Status => ClientMsg::GetStatus,
        Command::Show { date } => {
            let mut parts = date.splitn(3, '-');
            let year = parse_part(parts.next(), date)?;
            let month = parse_part(parts.next(), date)?;
            let day = parse_part(parts.next(), date)?;
            ClientMsg::SelectDate { year, month: month as u32, day: day as u32 }
        }
        Command::OpenCalendar => ClientMsg::OpenCalendar,
        Command::CloseCalendar => ClientMsg::CloseCalendar,
        Command::Navigate { delta } => ClientMsg::NavigateMonth { delta: *delta },
        Command::Theme => ClientMsg::ToggleTheme,
        Command::Watch => ClientMsg::RegisterRenderer,
    };

    let line = ipc::encode(&msg);
    writer.write_all(line.as_bytes()).context("sending command")?;

    if matches!(cli.command, Command::Watch) {
        // Stream instructions until the daemon goes away.
        for line in reader.lines() {
            let line = line.context("reading instruction")?;
            if !line.trim().is_empty() {
                println!("{}", line.trim());
            }
        }
        return Ok(());
    }

    // Read responses until the command's ack/status arrives. Render
    // instructions triggered by the command are printed as they pass.
    for line in reader.lines() {
        let line = line.context("reading response")?;
        let Some(resp) = ipc::decode_render(&line) else {
            continue;
        };
        match resp {
            RenderMsg::Status {
                room_id,
                displayed_date,
                lesson_count,
                mode,
                dark_theme,
                version,
            } => {
                println!("roomboard v{}", version);
                println!("  room:      {}", room_id);
                println!(
                    "  displayed: {}",
                    displayed_date.as_deref().unwrap_or("(none)")
                );
                println!("  lessons:   {}", lesson_count);
                println!("  mode:      {}", mode);
                println!("  theme:     {}", if dark_theme { "dark" } else { "light" });
                break;
            }
            RenderMsg::Ack { ok, message } => {
                if ok {
                    println!("{}", message);
                } else {
                    eprintln!("error: {}", message);
                    std::process::exit(1);
                }
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

fn parse_part(part: Option<&str>, whole: &str) -> Result<i32> {
    part.and_then(|p| p.parse().ok())
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", whole))
}
