use std::fs;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use chrono::Utc;

use crate::automation::{AutomationBridge, PublisherApp};
use crate::config::PubHtmlConfig;
use crate::error::ConvertError;
use crate::job::{ConversionJob, ConversionRecord, ConversionStatus, PUB_EXTENSION};
use crate::process::ProcessControl;

/// Drives one document through the full convert-validate lifecycle.
///
/// Each attempt acquires a fresh application handle from the bridge; between
/// attempts any lingering Publisher processes are killed by name. Only the
/// COM codes listed in `retryable_error_codes` are worth a retry — everything
/// else is deterministic and fails on the first occurrence.
pub struct ConversionSupervisor {
    bridge: Box<dyn AutomationBridge>,
    processes: Box<dyn ProcessControl>,
    config: PubHtmlConfig,
    verbose: bool,
}

impl ConversionSupervisor {
    pub fn new(
        bridge: Box<dyn AutomationBridge>,
        processes: Box<dyn ProcessControl>,
        config: PubHtmlConfig,
        verbose: bool,
    ) -> Self {
        Self {
            bridge,
            processes,
            config,
            verbose,
        }
    }

    /// Convert one `.pub` document into `output_dir`, returning the record of
    /// what happened. Idempotent: valid existing output short-circuits before
    /// any automation work.
    pub fn convert(
        &self,
        source: &Path,
        output_dir: &Path,
    ) -> Result<ConversionRecord, ConvertError> {
        let started_at = Utc::now();

        if !source.exists() {
            return Err(ConvertError::MissingInput(source.to_path_buf()));
        }
        let has_pub_extension = source
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(PUB_EXTENSION));
        if !has_pub_extension {
            return Err(ConvertError::WrongExtension(source.to_path_buf()));
        }

        fs::create_dir_all(output_dir)?;
        // Publisher resolves SaveAs targets against its own working
        // directory, so both sides of the job must be absolute.
        let source = fs::canonicalize(source)?;
        let output_dir = fs::canonicalize(output_dir)?;
        let job = ConversionJob::new(&source, &output_dir);

        if job.already_converted() {
            if self.verbose {
                println!(
                    "File already converted, skipping: {}",
                    job.primary_output().display()
                );
            }
            return Ok(ConversionRecord::new(
                &job,
                ConversionStatus::SkippedExisting,
                0,
                started_at,
            ));
        }

        let mut last_error: Option<ConvertError> = None;
        let mut attempts = 0;

        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                self.recover_lingering_processes(attempt);
            }
            attempts = attempt + 1;

            match self.run_attempt(&job) {
                Ok(()) => {
                    return Ok(ConversionRecord::new(
                        &job,
                        ConversionStatus::Converted,
                        attempts,
                        started_at,
                    ));
                }
                Err(err) => {
                    let retryable = err
                        .com_code()
                        .is_some_and(|code| self.config.retryable_error_codes.contains(&code));
                    eprintln!("Error on attempt {attempts}: {err}");
                    last_error = Some(err);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(ConvertError::RetriesExhausted {
            attempts,
            source: Box::new(last_error.unwrap_or_else(|| {
                ConvertError::Validation("no conversion attempts were made".into())
            })),
        })
    }

    /// One acquire-open-save-validate cycle. The application handle is
    /// released on every exit path; release failures are logged, not raised.
    fn run_attempt(&self, job: &ConversionJob) -> Result<(), ConvertError> {
        if self.verbose {
            println!("Initializing Publisher...");
        }
        let mut app = self.bridge.launch()?;
        let result = self.drive(app.as_mut(), job);
        release(app.as_mut());
        result
    }

    fn drive(&self, app: &mut dyn PublisherApp, job: &ConversionJob) -> Result<(), ConvertError> {
        if self.verbose {
            println!("Opening document: {}", job.source.display());
        }
        app.open(&job.source, false, false)?;

        // The automation interface races internally right after Open; give
        // it a moment before asking for the save.
        sleep(Duration::from_millis(self.config.settle_delay_ms));

        if self.verbose {
            println!("Saving as format {}...", self.config.format_code);
        }
        app.save_as(job.output_base(), self.config.format_code)?;

        if self.verbose {
            let created = job.sibling_artifacts();
            if created.is_empty() {
                println!("No files were created");
            } else {
                println!("Created files:");
                for path in created {
                    println!("- {}", path.display());
                }
            }
        }

        validate_output(job)
    }

    /// Best-effort kill of hung Publisher instances before a retry. Never
    /// fatal: if instances survive, wait longer and proceed anyway.
    fn recover_lingering_processes(&self, attempt: u32) {
        eprintln!(
            "  ↻ Retry attempt {} of {}...",
            attempt + 1,
            self.config.max_retries
        );
        if self.processes.terminate_all(&self.config.process_name) {
            sleep(Duration::from_millis(self.config.kill_wait_ms));
        }
        if self.processes.is_any_running(&self.config.process_name) {
            eprintln!("Warning: Publisher process still running");
            sleep(Duration::from_millis(self.config.kill_extra_wait_ms));
        }
    }
}

/// Validate the artifacts Publisher claims to have written: the primary
/// `.htm` file plus a non-empty `_files` resource directory. Publisher
/// reports success even when the resource directory never materializes.
fn validate_output(job: &ConversionJob) -> Result<(), ConvertError> {
    let primary = job.primary_output();
    if !primary.is_file() {
        return Err(ConvertError::Validation(format!(
            "HTML file was not created at {}",
            primary.display()
        )));
    }

    let resources = job.resource_dir();
    if !resources.is_dir() {
        return Err(ConvertError::Validation(format!(
            "supporting files directory not found at {}",
            resources.display()
        )));
    }

    let is_empty = fs::read_dir(&resources)?.next().is_none();
    if is_empty {
        return Err(ConvertError::Validation(format!(
            "supporting files directory is empty: {}",
            resources.display()
        )));
    }

    Ok(())
}

/// Close the document and quit the application, swallowing release errors.
/// Failures here are expected when an attempt already went wrong.
fn release(app: &mut dyn PublisherApp) {
    if let Err(err) = app.close_document() {
        eprintln!("Warning: cleanup failed: {err}");
    }
    if let Err(err) = app.quit() {
        eprintln!("Warning: cleanup failed: {err}");
    }
}
