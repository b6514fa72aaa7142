// src/bin/kryon-renderer.rs

use std::panic;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use kryon_core::decoder::load_krb_file;
use kryon_ratatui::RatatuiBackend;
use kryon_runtime::KryonApp;

#[derive(Parser)]
#[command(name = "kryon-renderer")]
#[command(about = "Standalone terminal renderer for Kryon .krb files")]
struct Args {
    /// Path to the .krb file to render
    krb_file: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Inspect KRB file contents without rendering
    #[arg(long)]
    inspect: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.debug)?;
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = cleanup_terminal();
        original_hook(panic_info);
    }));

    if !Path::new(&args.krb_file).exists() {
        anyhow::bail!("KRB file not found: {}", args.krb_file);
    }

    if args.inspect {
        return inspect_krb_file(&args.krb_file);
    }

    let result = run(&args);
    cleanup_terminal();
    result
}

fn run(args: &Args) -> Result<()> {
    let backend = RatatuiBackend::new().context("failed to initialize terminal backend")?;
    let mut app = KryonApp::new(&args.krb_file, backend).context("failed to load and resolve KRB file")?;

    info!("starting terminal render loop (Esc to quit)");

    loop {
        if app.should_close() {
            break;
        }
        for event in app.poll_events() {
            if let Err(e) = app.handle_input(event) {
                error!("failed to handle input: {}", e);
            }
        }
        if let Err(e) = app.render_frame() {
            error!("failed to render frame: {}", e);
            break;
        }
        std::thread::sleep(Duration::from_millis(16));
    }

    app.cleanup();
    Ok(())
}

fn init_logging(debug: bool) -> Result<()> {
    let level = if debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")
}

fn cleanup_terminal() {
    // Best-effort: the backend's own `cleanup()` already restores the
    // terminal on a clean exit; this covers the panic-hook path where we
    // never get a live `KryonApp` to call it on.
    use crossterm::{execute, terminal};
    let _ = terminal::disable_raw_mode();
    let _ = execute!(std::io::stdout(), terminal::LeaveAlternateScreen, crossterm::event::DisableMouseCapture);
}

fn inspect_krb_file(krb_path: &str) -> Result<()> {
    println!("Inspecting KRB file: {}", krb_path);

    let doc = load_krb_file(krb_path).context("could not load KRB file for inspection")?;

    println!("version: {}.{}", doc.header.version.major, doc.header.version.minor);
    println!("elements: {}", doc.elements.len());
    println!("styles: {}", doc.styles.len());
    println!("component definitions: {}", doc.component_defs.len());
    println!("resources: {}", doc.resources.len());

    for (index, element) in doc.elements.iter().enumerate() {
        println!(
            "  [{}] {:?} pos=({}, {}) size=({}, {}) style_id={} children={}",
            index,
            element.kind,
            element.pos_x,
            element.pos_y,
            element.width,
            element.height,
            element.style_id,
            element.child_offsets.len(),
        );
    }

    Ok(())
}
