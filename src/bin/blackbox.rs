use blackbox::error::{BlackboxError, Result};
use blackbox::event::{Event, EventHandler};
use blackbox::wizard::{
    self, BlackboxConfig, ExecutableStamp, HostContext, ResumeToken, Wizard, WizardAction,
};
use clap::Parser;
use crossterm::{
    execute,
    style::Print,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::panic;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "snigdhaos-blackbox")]
#[command(author, version, about = "First-boot setup wizard for Snigdha OS")]
struct Args {
    /// Where to resume after a relaunch (POST_UPDATE or UPDATE_RETRY)
    resume: Option<String>,

    /// Path to config file (default: /etc/snigdhaos/blackbox.toml)
    #[arg(long)]
    config: Option<String>,

    /// Simulate the network and privileged commands
    #[arg(long)]
    dryrun: bool,

    /// Log file path (logging disabled if not specified)
    #[arg(long)]
    log_file: Option<String>,
}

impl Args {
    /// Flags a relaunched process must receive again
    fn forwarded(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if let Some(ref config) = self.config {
            flags.extend(["--config".to_string(), config.clone()]);
        }
        if self.dryrun {
            flags.push("--dryrun".to_string());
        }
        if let Some(ref log_file) = self.log_file {
            flags.extend(["--log-file".to_string(), log_file.clone()]);
        }
        flags
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Stamp the binary before anything can replace it
    let stamp = ExecutableStamp::current(args.forwarded())?;

    if let Some(ref log_path) = args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .ok();

        if let Some(file) = file {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();

            info!("Starting snigdhaos-blackbox");
        }
    }

    let mut config = match args.config.as_deref() {
        Some(path) => BlackboxConfig::load_from(path),
        None => BlackboxConfig::load(),
    }
    .unwrap_or_else(|e| {
        warn!("Ignoring unusable config: {}", e);
        BlackboxConfig::default()
    });

    if args.dryrun {
        config.general.dryrun = true;
    }

    let host = HostContext::detect(&config);
    let service = wizard::create_service(&config)?;
    let token = ResumeToken::parse(args.resume.as_deref());

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;

    let (app, messages) = Wizard::new(config, host, stamp, service);
    let result = run_wizard(&mut terminal, app, messages, token).await;

    restore_terminal()?;

    match result {
        Ok(Some(request)) => wizard::exec(&request),
        Ok(None) => Ok(()),
        Err(e) => {
            error!("Blackbox error: {}", e);
            Err(e)
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode().map_err(|e| BlackboxError::Terminal(e.to_string()))?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).map_err(|e| BlackboxError::Terminal(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).map_err(|e| BlackboxError::Terminal(e.to_string()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().map_err(|e| BlackboxError::Terminal(e.to_string()))?;
    execute!(stdout(), LeaveAlternateScreen).map_err(|e| BlackboxError::Terminal(e.to_string()))?;
    Ok(())
}

/// Ring the bell and retitle the terminal so a new screen is noticed
fn raise(title: &str) -> Result<()> {
    execute!(stdout(), SetTitle(title), Print('\x07'))
        .map_err(|e| BlackboxError::Terminal(e.to_string()))
}

/// Run until the user quits. Returns the relaunch request if the process
/// has to be replaced.
async fn run_wizard(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut app: Wizard,
    mut messages: tokio::sync::mpsc::UnboundedReceiver<wizard::WizardMessage>,
    token: ResumeToken,
) -> Result<Option<wizard::RelaunchRequest>> {
    let tick_rate = Duration::from_millis(250);
    let mut events = EventHandler::new(tick_rate);

    app.resume(token);

    loop {
        if app.take_attention() {
            let title = format!("{} - {}", app.config.general.title, app.state().short_name());
            raise(&title)?;
        }

        terminal
            .draw(|frame| wizard::ui::draw(frame, &app))
            .map_err(|e| BlackboxError::Terminal(e.to_string()))?;

        let action = tokio::select! {
            event = events.next() => match event {
                Some(Event::Key(key)) => app.handle_key(key),
                Some(Event::Resize) => None,
                Some(Event::Tick) => {
                    app.tick();
                    None
                }
                None => Some(WizardAction::Quit),
            },
            Some(msg) = messages.recv() => app.handle_message(msg),
        };

        match action {
            Some(WizardAction::Quit) => {
                info!("Quitting");
                return Ok(None);
            }
            Some(WizardAction::Relaunch(request)) => return Ok(Some(request)),
            None => {}
        }
    }
}
