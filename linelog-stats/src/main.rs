use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use linelog_stats::{Report, StatsConfig, StatsServer};

fn usage(program: &str) {
    println!("Usage: {program} <port> <N> <T>\n");
    println!("Arguments:");
    println!("  port  port to listen on for log connections");
    println!("  N     print statistics after every N-th message");
    println!("  T     print statistics after T seconds if they changed\n");
    println!("Example: {program} 12345 10 30");
}

fn parse_positive(name: &str, value: &str) -> Option<u64> {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Some(parsed),
        _ => {
            eprintln!("Error: {name} must be a positive integer, got `{value}`");
            None
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("linelog-stats", String::as_str);
    if args.len() != 4 {
        usage(program);
        return ExitCode::FAILURE;
    }
    let Some(port) = parse_positive("port", &args[1]).and_then(|port| u16::try_from(port).ok())
    else {
        eprintln!("Error: invalid port `{}`", args[1]);
        return ExitCode::FAILURE;
    };
    let (Some(every), Some(timeout)) = (parse_positive("N", &args[2]), parse_positive("T", &args[3]))
    else {
        return ExitCode::FAILURE;
    };

    let _guard = linelog::spawn_logger_from_env(true);
    let config = StatsConfig {
        report_every: every,
        report_timeout: Duration::from_secs(timeout),
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let mut server = match StatsServer::bind(addr, config) {
        Ok(server) => server,
        Err(err) => {
            linelog::warning!("failed to listen on {addr}: {err}");
            return ExitCode::FAILURE;
        }
    };
    linelog::info!("listening on {addr}, reporting every {every} messages or {timeout}s");

    match server.run(&mut |report: &Report| println!("\n{report}\n")) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            linelog::warning!("stats server failed: {err}");
            ExitCode::FAILURE
        }
    }
}
