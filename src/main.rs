use crossterm::{
    cursor::{Hide, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::env;
use std::io::{stdout, BufWriter, Stdout};
use std::process;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use termfest::config::{self, Command, Config};
use termfest::error::Result;
use termfest::Scene;
use tracing::info;

const FIXED_DT: f32 = 1.0 / 60.0;

/// Restores the terminal however the session ends.
struct TerminalGuard;

impl TerminalGuard {
    fn enter(out: &mut BufWriter<Stdout>) -> Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All), EnableMouseCapture)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), Show, LeaveAlternateScreen, DisableMouseCapture);
        let _ = terminal::disable_raw_mode();
    }
}

fn init_logging(config: &Config) -> Result<()> {
    let Some(file) = config.open_log()? else {
        return Ok(());
    };
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn is_quit(event: &Event) -> bool {
    let Event::Key(key) = event else {
        return false;
    };
    key.code == KeyCode::Char('q')
        || key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn run(config: &Config) -> Result<()> {
    let mut out = BufWriter::with_capacity(1024 * 64, stdout());
    let _guard = TerminalGuard::enter(&mut out)?;

    let (cols, rows) = terminal::size()?;
    let mut scene = Scene::new(cols as usize, rows as usize, config);
    info!(cols, rows, "session started");

    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;

    loop {
        if event::poll(Duration::from_millis(1))? {
            let event = event::read()?;
            if is_quit(&event) {
                break;
            }
            match event {
                Event::Resize(cols, rows) => {
                    scene.resize(cols as usize, rows as usize);
                    execute!(out, Clear(ClearType::All))?;
                }
                other => scene.handle_event(&other),
            }
        }

        let now = Instant::now();
        accumulator += now.duration_since(last_frame).as_secs_f32();
        last_frame = now;
        accumulator = accumulator.min(FIXED_DT * 3.0);

        while accumulator >= FIXED_DT {
            scene.update(FIXED_DT);
            accumulator -= FIXED_DT;
        }

        scene.render(&mut out)?;
    }

    info!("session stopped");
    Ok(())
}

fn main() -> Result<()> {
    let config = match Config::from_args(env::args().skip(1)) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            config::print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            eprintln!();
            config::print_usage();
            process::exit(1);
        }
    };

    if let Err(err) = init_logging(&config) {
        eprintln!("{err}");
        process::exit(1);
    }
    run(&config)
}
