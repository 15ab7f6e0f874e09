use bakehouse::config::{self, Config, Overrides};
use bakehouse::monitor::{self, Monitor};
use bakehouse::site::{self, BuildContext, BuildReport, SiteError};
use bakehouse::{bootstrap, output, serve};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bakehouse")]
#[command(about = "Static site builder for markdown pages, layouts and media")]
#[command(long_about = "\
Static site builder for markdown pages, layouts and media

Site structure:

  config.yaml              # Optional; see `bakehouse gen-config`
  assets/                  # Copied to <build>/assets, optionally minified
  layouts/                 # Handlebars layouts and partials (default.html)
  media/                   # Images; one thumbnail per configured size
  pages/                   # .md and .html pages with optional front matter
    index.md               # → index.html
    blog/hello.md          # → blog/hello.html

Files and directories starting with `.` or `_` are ignored.

Run 'bakehouse bootstrap' to create the directories and
'bakehouse gen-config' to print a documented config.yaml.")]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration
    #[arg(short, long, default_value = "config.yaml", global = true)]
    config: PathBuf,

    /// Port for the webserver
    #[arg(short, long, default_value = "8000", global = true)]
    port: String,

    /// Do not minify css and js
    #[arg(long, global = true)]
    no_compress: bool,

    /// Log debug output
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site into the build directory
    Build,
    /// Build, then serve the build directory and rebuild on changes
    Serve,
    /// Create the assets, layouts, media and pages directories
    Bootstrap,
    /// Print a stock config.yaml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // --debug forces debug level; otherwise RUST_LOG, defaulting to warn.
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let Some(command) = &cli.command else {
        Cli::command().print_help().ok();
        eprintln!("\nError: No command specified.");
        return ExitCode::FAILURE;
    };

    match run(&cli, command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, command: &Command) -> Result<(), Box<dyn std::error::Error>> {
    if let Command::GenConfig = command {
        print!("{}", config::stock_config_yaml());
        return Ok(());
    }

    let cwd = std::env::current_dir()?;
    let overrides = Overrides {
        no_compress: cli.no_compress,
    };
    let config = config::load_config(&cli.config, &overrides, &cwd)?;

    match command {
        Command::Build => {
            build_site(&config)?;
        }
        Command::Serve => {
            let port: u16 = cli
                .port
                .parse()
                .map_err(|e| format!("Invalid value for port: {e}"))?;
            serve_site(config, port)?;
        }
        Command::Bootstrap => {
            let dirs = bootstrap::bootstrap(&config)?;
            output::print_bootstrap(&dirs);
        }
        Command::GenConfig => {}
    }
    Ok(())
}

/// One full build with progress printed on a separate thread.
fn build_site(config: &Config) -> Result<BuildReport, SiteError> {
    output::print_building(&config.build_dir);
    let (tx, rx) = mpsc::channel();
    let printer = thread::spawn(move || {
        for event in rx {
            for line in output::format_build_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = site::build(&BuildContext::with_events(config.clone(), tx));
    if printer.join().is_err() {
        tracing::warn!("output thread panicked");
    }
    result
}

fn serve_site(config: Config, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    build_site(&config)?;

    let server = serve::bind(port, &config.build_dir)?;

    let rebuild_config = config.clone();
    let watcher = Monitor::spawn(
        config.watch_roots(),
        monitor::DEFAULT_INTERVAL,
        move |changes| {
            output::print_rebuild(changes);
            if let Err(e) = build_site(&rebuild_config) {
                eprintln!("Error: {e}");
            }
        },
    );

    output::print_serving(server.addr(), server.root());
    server.run();
    watcher.stop();
    Ok(())
}
