use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;

use flickmap::app::App;
use flickmap::config::Config;
use flickmap::logging;
use flickmap::ui::text_input::TextInput;

#[derive(Default)]
struct Args {
    config_path: Option<PathBuf>,
    csv_path: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("flickmap {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--csv" => {
                if i + 1 < args.len() {
                    parsed.csv_path = Some(args[i + 1].clone());
                    i += 1;
                } else {
                    eprintln!("Error: --csv requires a path argument");
                    std::process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!(
        r#"flickmap - terminal map of geotagged Flickr photos

USAGE:
    flickmap [OPTIONS]

OPTIONS:
    --csv PATH          CSV to load at startup (overrides config csv_path)
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    FLICKMAP_CONFIG     Path to config file (overrides default location)
    FLICKMAP_LOG        Log filter (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/flickmap/config.toml

See also: flickmap-render --help"#
    );
}

fn main() -> Result<()> {
    let args = parse_args();

    // Initialize logging (uses journald on Linux, file fallback otherwise)
    let _ = logging::init(Some(Config::config_dir().join("logs")));

    let config = match args.config_path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };

    let mut app = App::new(config);
    if let Some(csv) = args.csv_path {
        app.path_input = TextInput::new(&csv);
    }

    // A dataset that cannot be loaded at startup is fatal
    app.load_path()?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
