// src/main.rs

use anyhow::Result;
use clap::Parser;
use foldcat::cli::Cli;
use foldcat::config::ConfigBuilder;
use foldcat::errors::Error;
use foldcat::output::{deliver, render_tree, write_summary};
#[cfg(feature = "progress")]
use foldcat::progress::IndicatifProgress;
use foldcat::progress::ProgressReporter;
use foldcat::selection::FsSelection;
use foldcat::signal::setup_signal_handler;
use foldcat::{OutputDestination, Session};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    // Initialize logging. Default to 'info' if RUST_LOG is not set.
    let directive = if cfg!(debug_assertions) {
        "foldcat=debug"
    } else {
        "foldcat=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    log::info!("Starting foldcat v{}...", env!("CARGO_PKG_VERSION"));
    log::debug!("Raw arguments: {:?}", std::env::args().collect::<Vec<_>>());

    std::panic::set_hook(Box::new(|info| {
        let msg = match info.payload().downcast_ref::<&str>() {
            Some(s) => *s,
            None => "Box<Any>",
        };
        eprintln!(
            "Application Error: {}",
            msg.replace(env!("CARGO_MANIFEST_DIR"), "<redacted>")
        );
    }));

    // --- Setup ---
    let cli = Cli::parse();

    // Show a progress bar only if stderr is a TTY.
    let progress_reporter: Option<Arc<dyn ProgressReporter>> = {
        #[cfg(feature = "progress")]
        {
            if atty::is(atty::Stream::Stderr) {
                Some(Arc::new(IndicatifProgress::new()))
            } else {
                None
            }
        }
        #[cfg(not(feature = "progress"))]
        {
            None
        }
    };

    // --- Configuration ---
    let config = ConfigBuilder::from_cli(&cli).build()?;
    log::debug!("Configuration built successfully.");
    let selection = FsSelection::new(&config.input_path, config.discovery.clone());

    let session = Arc::new(match progress_reporter {
        Some(reporter) => Session::with_reporter(config, reporter),
        None => Session::new(config),
    });
    setup_signal_handler(session.clone())?;

    if cli.clear_cache {
        session.clear_cache()?;
        eprintln!("Cache cleared.");
    }

    // --- Execution ---
    let snapshot = match session.ingest(&selection) {
        Ok(snapshot) => snapshot,
        Err(Error::Interrupted) => {
            eprintln!("\nOperation cancelled.");
            std::process::exit(130);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if snapshot.tree.is_empty() {
        eprintln!("foldcat: No files found in the selection.");
        return Ok(());
    }

    // --- Output ---
    let destination = &session.config().output_destination;
    deliver(snapshot.assembly.document.as_str(), destination)?;
    #[cfg(feature = "clipboard")]
    if *destination == OutputDestination::Clipboard {
        eprintln!("Output copied to clipboard.");
    }
    if let OutputDestination::File(path) = destination {
        log::info!("Document written to {}", path.display());
    }

    if cli.tree {
        eprint!("{}", render_tree(&snapshot.tree, &root_label(selection.root())));
    }
    if cli.summary {
        write_summary(&mut std::io::stderr(), &snapshot)?;
    }
    Ok(())
}

/// The name shown at the top of the tree view.
fn root_label(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}
