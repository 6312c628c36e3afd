use std::io::{IsTerminal as _, Write as _};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context as _;
use dir_serve::ServerBuilder;

fn main() {
    init_logging();

    match run() {
        Ok(()) => log::info!("Server stopped"),
        Err(e) => {
            log::error!("{e:?}");
            pause_before_exit();
            process::exit(1);
        }
    }
}

fn run() -> anyhow::Result<()> {
    let root = entry_dir()?;
    let server = Arc::new(ServerBuilder::new(&root).build());
    let url = format!("http://{}", server.addr());

    log::info!("Serving {}", root.display());
    log::info!("Server Listening on {url}");
    log::info!("Ctrl-c to stop the server");

    open_browser(&url);

    let handle = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log::info!("Shutting down");
        handle.close();
    })
    .context("Failed to install the interrupt handler")?;

    server.serve()?;

    Ok(())
}

/// The directory holding the server's own executable
///
/// Files are served relative to it no matter where the process was launched
/// from.
fn entry_dir() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the server executable")?;
    let dir = exe
        .parent()
        .context("The server executable has no parent directory")?;
    let dir = dunce::canonicalize(dir)
        .with_context(|| anyhow::format_err!("Failed in processing root `{}`", dir.display()))?;
    Ok(dir)
}

fn open_browser(url: &str) {
    match open::that(url) {
        Ok(()) => log::info!("Please check your browser!"),
        Err(why) => log::warn!("Failure to open a browser: {why}"),
    }
}

fn init_logging() {
    let mut builder = env_logger::Builder::new();
    builder.format(|buf, record| {
        let ts = buf.timestamp();
        let level = format!("[{}]", record.level()).to_lowercase();
        writeln!(buf, "{ts} {level:8} {}", record.args())
    });
    builder.filter_level(log::LevelFilter::Info);
    builder.parse_default_env();
    builder.init();
}

/// Keep the failure text on screen when there is someone to read it
fn pause_before_exit() {
    if !std::io::stdin().is_terminal() {
        return;
    }

    eprintln!("Press Enter to exit...");
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}
