//! neuralpose - interactive activity-recognition client
//!
//! This client:
//! 1. Loads configuration and checks the backend health endpoint once
//! 2. Reads commands from stdin (one per line, `help` lists them)
//! 3. Runs the capture-and-submit cycle for the selected input
//! 4. Draws the pose label, gauges and activity feed to stderr

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use neuralpose_client::command::help_text;
use neuralpose_client::ui::{TerminalView, Ui};
use neuralpose_client::{
    ClientConfig, Command, InferenceClient, InputKind, Metric, QueuedFilePicker, Session,
    SourceManager, WebcamProvider,
};

/// Upper bound on a wait for input while no cycle is armed.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

#[derive(Parser, Debug)]
#[command(
    name = "neuralpose",
    version,
    about = "Stream frames to an activity-recognition backend and show its predictions"
)]
struct Args {
    /// Select the webcam at startup.
    #[arg(long, conflicts_with_all = ["video", "image"])]
    webcam: bool,

    /// Load an MJPEG clip at startup.
    #[arg(long, value_name = "PATH", conflicts_with = "image")]
    video: Option<PathBuf>,

    /// Load a JPEG/PNG image at startup.
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Start processing right after the startup selection.
    #[arg(long)]
    start: bool,

    /// UI mode for stderr output (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = ClientConfig::load()?;

    let is_tty = io::stderr().is_terminal();
    let stdout_is_tty = io::stdout().is_terminal();
    let ui = Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let picker = QueuedFilePicker::new();
    let sources = SourceManager::new(
        Box::new(WebcamProvider::new(config.webcam.clone())),
        Box::new(picker.clone()),
    );
    let client = InferenceClient::from_config(&config);
    log::info!("inference backend: {}", client.predict_url());
    let mut session = Session::new(&config, sources, client, Box::new(TerminalView::new(&ui)));

    session.check_health();

    let startup = if args.webcam {
        Some(InputKind::Webcam)
    } else if let Some(path) = args.video {
        picker.queue(path);
        Some(InputKind::Video)
    } else if let Some(path) = args.image {
        picker.queue(path);
        Some(InputKind::Image)
    } else {
        None
    };
    if let Some(kind) = startup {
        session.select_source(kind);
        if args.start {
            let _ = session.start(Instant::now());
        }
    }

    let (tx, rx) = mpsc::channel();
    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Command::Quit);
    })
    .context("error setting Ctrl-C handler")?;
    spawn_stdin_reader(tx);

    eprintln!("type 'help' for commands");
    loop {
        let wait = session
            .time_until_next_tick(Instant::now())
            .unwrap_or(IDLE_WAIT);
        match rx.recv_timeout(wait) {
            Ok(command) => {
                if !dispatch(&mut session, &picker, command) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        session.poll(Instant::now());
    }

    log::info!("shutdown requested");
    session.shutdown();
    Ok(())
}

fn spawn_stdin_reader(tx: Sender<Command>) {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    log::warn!("stdin read failed: {}", err);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
                Err(err) => eprintln!("{}", err),
            }
        }
        let _ = tx.send(Command::Quit);
    });
}

/// Apply one command. Returns false when the client should exit.
fn dispatch(session: &mut Session, picker: &QueuedFilePicker, command: Command) -> bool {
    match command {
        Command::Select { kind, path } => {
            picker.clear();
            if let Some(path) = path {
                picker.queue(path);
            }
            session.select_source(kind);
        }
        Command::Start => {
            if let Err(err) = session.start(Instant::now()) {
                log::debug!("start refused: {}", err);
            }
        }
        Command::Stop => session.stop(),
        Command::Toggle => {
            if let Err(err) = session.toggle(Instant::now()) {
                log::debug!("start refused: {}", err);
            }
        }
        Command::Reset => session.reset(),
        Command::Health => {
            session.check_health();
        }
        Command::History(limit) => {
            if let Ok(records) = session.fetch_history(limit) {
                for record in records {
                    println!(
                        "{}  {:<14} {:>5.1}%  {}",
                        record.created_at,
                        record.prediction,
                        record.confidence * 100.0,
                        record.input_data
                    );
                }
            }
        }
        Command::Export(path) => match session.snapshot().write_json(&path) {
            Ok(()) => log::info!("session exported to {}", path.display()),
            Err(err) => log::error!("export failed: {:#}", err),
        },
        Command::Status => print_status(session),
        Command::Help => println!("{}", help_text()),
        Command::Quit => return false,
    }
    true
}

fn print_status(session: &Session) {
    println!("state:    {:?}", session.state());
    println!("input:    {}", session.active_input());
    println!(
        "backend:  {}",
        if session.backend_online() {
            "online"
        } else {
            "offline"
        }
    );
    println!("pose:     {}", session.pose_label());
    for metric in Metric::ALL {
        println!("{:<9} {}", format!("{}:", metric), session.metrics().display(metric));
    }
    println!("activity: {} recorded", session.activity().len());
    println!("status:   {}", session.status());
}
