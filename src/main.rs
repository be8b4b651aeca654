use clap::{Arg, ArgAction, Command};
use std::process;

use ciphersweep::{
    config::AuditConfig,
    error::ErrorKind,
    net::AddressFamily,
    output::{OutputConfig, OutputFormat, OutputManager},
    scanner::AuditEngine,
};
use colored::*;
use tokio_util::sync::CancellationToken;

// Ulimit adjustment for Unix systems
#[cfg(unix)]
fn adjust_ulimit_size(ulimit: Option<u64>) -> u64 {
    use rlimit::Resource;

    if let Some(limit) = ulimit {
        if Resource::NOFILE.set(limit, limit).is_ok() {
            println!(
                "{} {}",
                "[~] Automatically increasing ulimit value to".bright_blue(),
                limit.to_string().bright_cyan().bold()
            );
        } else {
            eprintln!("{}", "[!] ERROR: Failed to set ulimit value.".bright_red());
        }
    }

    match Resource::NOFILE.get() {
        Ok((soft, _)) => soft,
        Err(_) => {
            eprintln!(
                "{}",
                "[!] WARNING: Could not get file descriptor limit".bright_yellow()
            );
            65535 // Safe default for modern systems
        }
    }
}

#[cfg(not(unix))]
fn adjust_ulimit_size(_ulimit: Option<u64>) -> u64 {
    65535 // Default for non-Unix systems
}

fn print_banner() {
    println!("{}", "  ____ _       _           ____".truecolor(46, 204, 113).bold());
    println!("{}", " / ___(_)_ __ | |__   ___ _/ ___|_      _____  ___ _ __".truecolor(46, 204, 113).bold());
    println!("{}", "| |   | | '_ \\| '_ \\ / _ \\ \\___ \\ \\ /\\ / / _ \\/ _ \\ '_ \\".truecolor(46, 204, 113).bold());
    println!("{}", "| |___| | |_) | | | |  __/  ___) \\ V  V /  __/  __/ |_) |".truecolor(46, 204, 113).bold());
    println!("{}", " \\____|_| .__/|_| |_|\\___| |____/ \\_/\\_/ \\___|\\___| .__/".truecolor(46, 204, 113).bold());
    println!("{}", "        |_|                                       |_|".truecolor(46, 204, 113).bold());
    println!();
    println!("{}", "CipherSweep – sweeps every cipher your servers still speak ⚡".truecolor(255, 215, 0).bold());
    println!();
    println!(
        "{} {}{}",
        "Build:".bright_blue(),
        env!("CIPHERSWEEP_TARGET").bright_cyan(),
        if option_env!("CIPHERSWEEP_OPTIMIZED").is_some() {
            " (optimized)".bright_green()
        } else {
            "".normal()
        }
    );
    println!();
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("ciphersweep")
        .version(env!("CARGO_PKG_VERSION"))
        .author("ciphersweep developers")
        .about("CipherSweep: Concurrent TLS cipher and protocol capability auditor")
        .arg(
            Arg::new("hosts")
                .value_name("HOSTS")
                .help("Hosts to audit (hostname or IP address)")
                .num_args(1..)
                .required_unless_present("config"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Service port or name to audit (default: 443)"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("COUNT")
                .help("Number of hosts audited concurrently (default: 5)")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("ipv4")
                .short('4')
                .long("ipv4")
                .help("Only use IPv4 addresses")
                .action(ArgAction::SetTrue)
                .conflicts_with("ipv6"),
        )
        .arg(
            Arg::new("ipv6")
                .short('6')
                .long("ipv6")
                .help("Only use IPv6 addresses")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("MS")
                .help("TCP connect timeout in milliseconds (default: 3000)")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("dns-timeout")
                .long("dns-timeout")
                .value_name("MS")
                .help("Name resolution timeout in milliseconds (default: 5000)")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("handshake-timeout")
                .long("handshake-timeout")
                .value_name("MS")
                .help("TLS handshake timeout in milliseconds (default: 5000)")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .value_parser(["text", "json", "csv"])
                .default_value("text"),
        )
        .arg(
            Arg::new("output-file")
                .short('o')
                .long("output-file")
                .value_name("FILE")
                .help("Write the report to a file instead of stdout"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose output (repeat for more detail)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-banner")
                .long("no-banner")
                .help("Hide the banner")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ulimit")
                .short('u')
                .long("ulimit")
                .value_name("LIMIT")
                .help("Automatically increase ulimit to this value")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .get_matches();

    let verbosity = matches.get_count("verbose");
    init_logging(verbosity);

    let no_banner = matches.get_flag("no-banner");
    let no_color = matches.get_flag("no-color");

    let format = match matches
        .get_one::<String>("format")
        .unwrap()
        .parse::<OutputFormat>()
    {
        Ok(format) => format,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    let output_file = matches.get_one::<String>("output-file").cloned();
    let text_to_stdout = format == OutputFormat::Text && output_file.is_none();

    if !no_banner && text_to_stdout {
        print_banner();
    }

    if let Some(ulimit) = matches.get_one::<u64>("ulimit") {
        adjust_ulimit_size(Some(*ulimit));
    }

    // Load configuration from file or use default
    let mut config = if let Some(config_file) = matches.get_one::<String>("config") {
        match AuditConfig::from_toml_file(config_file) {
            Ok(config) => {
                if text_to_stdout {
                    println!("[~] Loaded config from {}", config_file);
                }
                config
            }
            Err(e) => {
                eprintln!("Failed to load config file: {}", e);
                process::exit(1);
            }
        }
    } else {
        AuditConfig::load_default_config()
    };

    // Command line arguments override the config file
    if let Some(hosts) = matches.get_many::<String>("hosts") {
        config.hosts = hosts.cloned().collect();
    }
    if let Some(port) = matches.get_one::<String>("port") {
        config.service = port.clone();
    }
    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.concurrency = *threads;
    }
    if matches.get_flag("ipv4") {
        config.family = AddressFamily::V4;
    } else if matches.get_flag("ipv6") {
        config.family = AddressFamily::V6;
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config.connect_timeout = *timeout;
    }
    if let Some(timeout) = matches.get_one::<u64>("dns-timeout") {
        config.dns_timeout = *timeout;
    }
    if let Some(timeout) = matches.get_one::<u64>("handshake-timeout") {
        config.handshake_timeout = *timeout;
    }
    config.verbosity = verbosity;

    if let Err(e) = config.validate() {
        eprintln!("{} {}", "Configuration error:".bright_red().bold(), e);
        process::exit(1);
    }

    let host_count = config.hosts.len();
    let service = config.service.clone();
    let workers = config.concurrency;

    let engine = match AuditEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{} {}", "Failed to start audit:".bright_red().bold(), e);
            if e.kind() == ErrorKind::Config {
                process::exit(2);
            }
            process::exit(1);
        }
    };

    // Finish hosts already started, skip the rest on Ctrl-C
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, finishing started hosts");
            signal_cancel.cancel();
        }
    });
    let engine = engine.with_cancellation(cancel);

    if text_to_stdout {
        println!(
            "{} {}",
            "Starting CipherSweep".bright_green().bold(),
            format!("v{}", env!("CARGO_PKG_VERSION")).bright_green().bold()
        );
        println!(
            "{} {}",
            "Hosts:".bright_yellow().bold(),
            host_count.to_string().bright_white().bold()
        );
        println!(
            "{} {}",
            "Service:".bright_yellow().bold(),
            service.bright_cyan().bold()
        );
        println!(
            "{} {}",
            "Workers:".bright_yellow().bold(),
            workers.to_string().bright_white().bold()
        );
        println!(
            "{} {}",
            "Probes per host:".bright_yellow().bold(),
            engine.table().probe_count().to_string().bright_white().bold()
        );
        println!();
    }

    let report = match engine.run().await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {}", "Audit failed:".bright_red().bold(), e);
            process::exit(1);
        }
    };

    let output_manager = OutputManager::new(OutputConfig {
        format,
        file: output_file.clone(),
        colored: !no_color,
        verbose: verbosity >= 1,
    });
    output_manager.write_report(&report)?;

    if let Some(filename) = output_file {
        println!(
            "{} {}",
            "[✓] Report written to".bright_green(),
            filename.bright_cyan()
        );
    }

    Ok(())
}
