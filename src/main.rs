mod automation;
mod cli;
mod config;
mod error;
mod job;
mod process;
mod supervisor;
mod ui;
mod walker;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use automation::PowerShellBridge;
use cli::{Cli, Command};
use config::PubHtmlConfig;
use process::SystemProcesses;
use supervisor::ConversionSupervisor;
use ui::ConvertProgress;
use walker::TreeWalker;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = PubHtmlConfig::load()?;

    match cli.command {
        Command::Convert {
            pub_file,
            output_dir,
            format_code,
            max_retries,
        } => {
            if let Some(code) = format_code {
                config.format_code = code;
            }
            if let Some(retries) = max_retries {
                config.max_retries = retries;
            }
            let supervisor = build_supervisor(config, cli.verbose);

            let progress = ConvertProgress::start(&pub_file);
            match supervisor.convert(Path::new(&pub_file), Path::new(&output_dir)) {
                Ok(record) => {
                    progress.complete(&record);
                    if cli.verbose {
                        progress.print_record(&record);
                    }
                    println!(
                        "Successfully converted to: {}",
                        record.output_html.display()
                    );
                    Ok(())
                }
                Err(err) => {
                    progress.fail(&err);
                    Err(err.into())
                }
            }
        }

        Command::Tree {
            input_root,
            output_root,
        } => {
            println!("Starting conversion from {input_root} to {output_root}");
            let supervisor = build_supervisor(config, cli.verbose);
            let walker = TreeWalker::new(&supervisor);
            let summary =
                walker.convert_tree(Path::new(&input_root), Path::new(&output_root))?;
            println!(
                "Conversion complete. Converted {} file(s), skipped {} file(s).",
                summary.converted, summary.skipped
            );
            Ok(())
        }
    }
}

/// Wire the real collaborators: the PowerShell COM bridge and the system
/// process table.
fn build_supervisor(config: PubHtmlConfig, verbose: bool) -> ConversionSupervisor {
    ConversionSupervisor::new(
        Box::new(PowerShellBridge::new()),
        Box::new(SystemProcesses),
        config,
        verbose,
    )
}
