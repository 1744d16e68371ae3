//! Stagehand Runtime
//!
//! Reads a command script (JSON lines, from a file or stdin), feeds it
//! through the command stream and lets the scene processor apply it against
//! the headless runtime. Prints the final anchor table when the script ends.
//!
//! Run with: cargo run -p stage_runtime -- demos/demo.jsonl
//!       or: cat demos/demo.jsonl | stagehand --config demos/stagehand.toml

mod boot_config;
mod script;

use boot_config::{Args, BootConfig, USAGE};
use script::{ScriptError, ScriptReader};
use stage_command::{CommandPublisher, CommandStream, StreamError};
use stage_kernel::{CommandApplier, ConfigError, KernelError, SceneProcessor};
use stage_scene::{HeadlessRuntime, SceneRuntime};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process::ExitCode;
use thiserror::Error;

/// Anything that stops the runtime before the script is fully applied
#[derive(Debug, Error)]
enum RunError {
    #[error("Registry: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot open script {path}: {source}")]
    Script {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Stream: {0}")]
    Stream(#[from] StreamError),

    #[error("Processor: {0}")]
    Kernel(#[from] KernelError),
}

fn main() -> ExitCode {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) if args.help => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    // Config decides the log level, so it is loaded first
    let config = match BootConfig::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = if config.kernel.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    config.print_summary();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Headless runtime for the configured scenes
fn build_runtime(config: &BootConfig) -> HeadlessRuntime {
    let runtime = HeadlessRuntime::new().with_tracking(config.tracking);
    match &config.asset_dir {
        Some(dir) => runtime.with_asset_dir(dir.clone()),
        None => config
            .kernel
            .scenes
            .iter()
            .fold(runtime, |runtime, scene| runtime.with_asset(scene.asset.clone())),
    }
}

fn open_script(config: &BootConfig) -> Result<Box<dyn BufRead + Send>, RunError> {
    match &config.script {
        Some(path) => {
            let file = File::open(path).map_err(|source| RunError::Script {
                path: path.display().to_string(),
                source,
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Publish every parseable line; bad lines are skipped with a warning
fn publish_script(reader: impl BufRead, publisher: &CommandPublisher) -> Result<usize, RunError> {
    let mut published = 0;
    for item in ScriptReader::new(reader) {
        match item {
            Ok((line, command)) => {
                log::debug!("line {}: {}", line, command);
                publisher.publish(command)?;
                published += 1;
            }
            Err(e @ ScriptError::Parse { .. }) => log::warn!("Skipping {}", e),
            Err(ScriptError::Io(e)) => {
                log::error!("Script read failed: {}", e);
                break;
            }
        }
    }
    Ok(published)
}

fn run(config: &BootConfig) -> Result<(), RunError> {
    let registry = config.kernel.build_registry()?;
    let runtime = build_runtime(config);
    log::info!("Runtime: {}", runtime.name());

    let reader = open_script(config)?;

    let stream = CommandStream::new(config.kernel.stream);
    let publisher = stream.publisher("script");
    let applier = CommandApplier::new(runtime, registry)
        .with_placement(config.kernel.placement.clone());
    let handle = SceneProcessor::new(applier, stream.into_consumer()).spawn()?;

    let published = publish_script(reader, &publisher);
    // Closing the last publisher lets the processor drain and stop
    drop(publisher);
    let processor = handle.join()?;
    let published = published?;

    let summary = processor.summary();
    let anchors = processor.applier().anchors();

    println!();
    println!("Commands: {} published, {} applied", published, summary.apply.applied);
    println!(
        "Outcomes: {} placed, {} clears ({} anchors removed), {} rejected",
        summary.apply.placed,
        summary.apply.clears,
        summary.apply.anchors_cleared,
        summary.apply.rejected
    );
    println!("Anchors:  {}", summary.anchors);
    for entry in anchors.entries() {
        println!(
            "  {}  #{:<4} {}  @ {}",
            entry.handle, entry.sequence, entry.content, entry.policy
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage_kernel::KernelConfig;
    use std::io::Cursor;

    #[test]
    fn test_publish_script_skips_bad_lines() {
        let stream = CommandStream::default();
        let publisher = stream.publisher("script");
        let consumer = stream.into_consumer();

        let script = concat!(
            "{\"type\":\"load_scene\",\"scene_id\":\"rover\"}\n",
            "not json\n",
            "{\"type\":\"clear_all\"}\n",
        );
        let published = publish_script(Cursor::new(script), &publisher).unwrap();

        assert_eq!(published, 2);
        assert_eq!(consumer.drain().len(), 2);
    }

    #[test]
    fn test_run_script_file() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("demo.jsonl");
        std::fs::write(
            &script,
            concat!(
                "{\"type\":\"place_object\",\"color\":\"red\"}\n",
                "{\"type\":\"load_scene\",\"scene_id\":\"rover\"}\n",
            ),
        )
        .unwrap();

        let config = BootConfig {
            kernel: KernelConfig::default(),
            source: boot_config::ConfigSource::Defaults,
            asset_dir: None,
            tracking: false,
            script: Some(script),
        };
        assert!(run(&config).is_ok());

        let missing = BootConfig {
            script: Some(dir.path().join("missing.jsonl")),
            ..config
        };
        assert!(matches!(run(&missing), Err(RunError::Script { .. })));
    }

    #[test]
    fn test_in_memory_runtime_has_configured_assets() {
        let config = BootConfig {
            kernel: KernelConfig::default(),
            source: boot_config::ConfigSource::Defaults,
            asset_dir: None,
            tracking: false,
            script: None,
        };
        let mut runtime = build_runtime(&config);
        assert!(runtime.load_asset("Experience/Teapot").is_ok());
        assert!(runtime.load_asset("Experience/Unknown").is_err());
    }
}
