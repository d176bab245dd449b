mod cli;
mod commands;
mod desk;
mod effects;
mod render;
mod settings;

use std::io;
use std::sync::Arc;

use clap::Parser;
use log::LevelFilter;
use mtr_core::{Access, Msg};
use mtr_engine::SessionStore;
use mtr_logging::mtr_info;

use crate::cli::{Cli, Command};
use crate::desk::{run_desk, Backend, DeskOptions};
use crate::render::render_table;
use crate::settings::AppSettings;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = AppSettings::load(cli.settings.as_deref())?;
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(session_file) = cli.session_file {
        settings.session_file = session_file;
    }
    if let Some(log_file) = cli.log_file {
        settings.log_file = Some(log_file);
    }
    let level = match cli.verbose {
        0 => settings.log_level(),
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    mtr_logging::initialize(&settings.log_destination(), level);
    mtr_info!("mtr_desk {} using {}", env!("CARGO_PKG_VERSION"), settings.api_url);

    let store = SessionStore::new(&settings.session_file);

    match cli.command {
        Command::Login { login, senha } => commands::login(&settings, &store, &login, senha),
        Command::Logout => commands::logout(&store),
        Command::Whoami => commands::whoami(&store),
        Command::Scan { report_dir } => {
            if let Some(dir) = report_dir {
                settings.report_dir = dir;
            }
            let (user, operator) = commands::require(&store, Access::Operator)?;
            let client = Arc::new(commands::client_for(&settings, Some(&user))?);
            let options = DeskOptions {
                queue: settings.queue_settings(),
                report: settings.report_options(),
                interactive: true,
                finish: Vec::new(),
            };
            let backend = Backend {
                lookup: client.clone(),
                check_ins: client,
            };
            let input = io::BufReader::new(io::stdin());
            run_desk(operator, backend, options, input, &mut io::stdout())?;
            Ok(())
        }
        Command::Lookup {
            codes,
            report,
            baixa,
        } => {
            let (user, operator) = commands::require(&store, Access::Operator)?;
            let client = Arc::new(commands::client_for(&settings, Some(&user))?);
            let mut finish = Vec::new();
            if report {
                finish.push(Msg::ExportClicked);
            }
            if baixa {
                finish.push(Msg::CheckInClicked);
            }
            let options = DeskOptions {
                queue: settings.queue_settings(),
                report: settings.report_options(),
                interactive: false,
                finish,
            };
            let backend = Backend {
                lookup: client.clone(),
                check_ins: client,
            };
            let input = io::Cursor::new(codes.join("\n").into_bytes());
            let state = run_desk(operator, backend, options, input, &mut io::stdout())?;
            for line in render_table(&state.view()) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Config { action } => {
            let (user, _) = commands::require(&store, Access::Operator)?;
            let client = commands::client_for(&settings, Some(&user))?;
            commands::config(&client, action)
        }
        Command::Users { action } => {
            let (user, operator) = commands::require(&store, Access::Admin)?;
            let client = commands::client_for(&settings, Some(&user))?;
            commands::users(&client, &operator, action)
        }
        Command::History { page, per_page } => {
            let (user, _) = commands::require(&store, Access::Admin)?;
            let client = commands::client_for(&settings, Some(&user))?;
            commands::history(&client, page, per_page)
        }
    }
}
