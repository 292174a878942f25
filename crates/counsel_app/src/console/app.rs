use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::Context;
use chrono::Utc;
use counsel_backend::ConsoleHandle;
use counsel_core::{update, AppState, Effect, Msg};
use counsel_logging::{console_info, console_warn};

use super::commands::{self, Command, HELP};
use super::config::{AppConfig, ConfigIssue, CONFIG_FILENAME};
use super::persistence::{load_backend, save_backend};
use super::render::render;

pub fn run() -> anyhow::Result<()> {
    let (config, issue) = AppConfig::load(Path::new(CONFIG_FILENAME));
    counsel_logging::initialize(
        config.log_destination(),
        config.log_level(),
        &config.log_file,
    );
    match issue {
        Some(ConfigIssue::Unreadable(err)) => {
            console_warn!("Could not read {}: {}; using defaults", CONFIG_FILENAME, err)
        }
        Some(ConfigIssue::Malformed(err)) => {
            console_warn!("Could not parse {}: {}; using defaults", CONFIG_FILENAME, err)
        }
        None => {}
    }

    let backend =
        Arc::new(load_backend(&config.state_file).with_identity(config.identity.clone()));
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let handle = ConsoleHandle::new(backend.clone(), msg_tx.clone())
        .context("starting the backend worker")?;

    spawn_input_reader(msg_tx);
    console_info!("Console started");

    let mut stdout = io::stdout();
    let mut state = AppState::with_settings(config.settings.clone());
    handle.dispatch(vec![Effect::ResolveIdentity]);
    write!(stdout, "{}", render(&state.view()))?;
    stdout.flush()?;

    while let Ok(msg) = msg_rx.recv() {
        let quitting = matches!(msg, Msg::Shutdown);
        let (next, effects) = update(state, msg);
        state = next;
        handle.dispatch(effects);

        if state.consume_dirty() && !quitting {
            write!(stdout, "\n{}> ", render(&state.view()))?;
            stdout.flush()?;
        }
        if quitting {
            break;
        }
    }

    handle.shutdown();
    save_backend(&config.state_file, &backend);
    Ok(())
}

/// Reads operator lines on their own thread and feeds them in as messages.
/// End of input behaves like `quit`.
fn spawn_input_reader(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match commands::parse(&line, Utc::now()) {
                Command::Send(msgs) => {
                    for msg in msgs {
                        if msg_tx.send(msg).is_err() {
                            return;
                        }
                    }
                }
                Command::Help => println!("{HELP}"),
                Command::Invalid(hint) => println!("{hint}"),
                Command::Quit => break,
            }
        }
        let _ = msg_tx.send(Msg::Shutdown);
    });
}

