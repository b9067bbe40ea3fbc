use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use walkdir::WalkDir;

use crate::error::ConvertError;
use crate::job::{ConversionJob, PUB_EXTENSION, WalkSummary};
use crate::supervisor::ConversionSupervisor;
use crate::ui::WalkProgress;

/// Two-pass tree conversion: count first, then convert with progress/ETA.
///
/// The relative directory structure under the input root is mirrored into
/// the output root, but only for directories that actually hold `.pub`
/// files. Per-file conversion errors are logged and the walk continues.
pub struct TreeWalker<'a> {
    supervisor: &'a ConversionSupervisor,
}

impl<'a> TreeWalker<'a> {
    pub fn new(supervisor: &'a ConversionSupervisor) -> Self {
        Self { supervisor }
    }

    /// Convert every `.pub` file under `input_root` into the mirrored
    /// location under `output_root`. Returns the converted/skipped tally.
    pub fn convert_tree(
        &self,
        input_root: &Path,
        output_root: &Path,
    ) -> Result<WalkSummary, ConvertError> {
        if !input_root.is_dir() {
            return Err(ConvertError::MissingInputRoot(input_root.to_path_buf()));
        }

        println!("Scanning directory structure...");
        let total = count_pub_files(input_root);
        println!("Found {total} Publisher files to convert");

        if total == 0 {
            println!("No files to convert");
            return Ok(WalkSummary::default());
        }

        let progress = WalkProgress::start(total);
        let start = Instant::now();
        let mut summary = WalkSummary::default();

        for entry in WalkDir::new(input_root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_dir() {
                continue;
            }
            let dir = entry.path();
            let pub_files = pub_files_in(dir)?;
            if pub_files.is_empty() {
                continue;
            }

            let relative = dir.strip_prefix(input_root).unwrap_or(Path::new(""));
            let out_dir = output_root.join(relative);
            fs::create_dir_all(&out_dir)?;

            for source in pub_files {
                let job = ConversionJob::new(&source, &out_dir);
                if job.already_converted() {
                    summary.skipped += 1;
                    progress.skipped(summary.skipped, &source);
                    continue;
                }

                // Counted as converted up front: a failed attempt still
                // consumed a conversion slot in the progress estimate.
                summary.converted += 1;
                let processed = u64::from(summary.total());
                let elapsed = start.elapsed().as_secs_f64();
                let average = elapsed / f64::from(summary.converted);
                let eta = average * (total - processed) as f64;
                progress.converting(processed, total, &source, elapsed as u64, eta as u64);

                if let Err(err) = self.supervisor.convert(&source, &out_dir) {
                    progress.file_error(&source, &err);
                }
            }
        }

        progress.finish(total, &summary, start.elapsed().as_secs());
        Ok(summary)
    }
}

/// Pass 1: count `.pub` files in the whole subtree.
fn count_pub_files(root: &Path) -> u64 {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_pub_file(e.path()))
        .count() as u64
}

/// Direct `.pub` children of one directory, sorted for a stable walk order.
fn pub_files_in(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_pub_file(p))
        .collect();
    files.sort();
    Ok(files)
}

fn is_pub_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(PUB_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::{AutomationBridge, AutomationError, PublisherApp};
    use crate::config::PubHtmlConfig;
    use crate::process::ProcessControl;
    use std::ffi::OsString;
    use std::fs::File;
    use tempfile::TempDir;

    /// Bridge whose sessions succeed unless the opened document's file name
    /// contains the configured marker.
    struct SelectiveBridge {
        fail_marker: Option<String>,
    }

    impl AutomationBridge for SelectiveBridge {
        fn launch(&self) -> Result<Box<dyn PublisherApp>, AutomationError> {
            Ok(Box::new(SelectiveApp {
                fail_marker: self.fail_marker.clone(),
                fail: false,
            }))
        }
    }

    struct SelectiveApp {
        fail_marker: Option<String>,
        fail: bool,
    }

    impl PublisherApp for SelectiveApp {
        fn open(&mut self, document: &Path, _: bool, _: bool) -> Result<(), AutomationError> {
            self.fail = self.fail_marker.as_ref().is_some_and(|marker| {
                document
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.contains(marker.as_str()))
            });
            Ok(())
        }

        fn save_as(&mut self, output_base: &Path, _: i32) -> Result<(), AutomationError> {
            if self.fail {
                // Deterministic fault, not in the retryable list.
                return Err(AutomationError::Com {
                    code: -2147023170,
                    message: "scripted failure".into(),
                });
            }
            let mut primary = OsString::from(output_base.as_os_str());
            primary.push(".htm");
            File::create(PathBuf::from(primary)).unwrap();
            let mut resources = OsString::from(output_base.as_os_str());
            resources.push("_files");
            let resources = PathBuf::from(resources);
            fs::create_dir(&resources).unwrap();
            File::create(resources.join("image001.png")).unwrap();
            Ok(())
        }

        fn close_document(&mut self) -> Result<(), AutomationError> {
            Ok(())
        }

        fn quit(&mut self) -> Result<(), AutomationError> {
            Ok(())
        }
    }

    struct NoProcesses;

    impl ProcessControl for NoProcesses {
        fn is_any_running(&self, _: &str) -> bool {
            false
        }

        fn terminate_all(&self, _: &str) -> bool {
            false
        }
    }

    fn test_supervisor(fail_marker: Option<&str>) -> ConversionSupervisor {
        let config = PubHtmlConfig {
            settle_delay_ms: 0,
            kill_wait_ms: 0,
            kill_extra_wait_ms: 0,
            ..Default::default()
        };
        ConversionSupervisor::new(
            Box::new(SelectiveBridge {
                fail_marker: fail_marker.map(str::to_string),
            }),
            Box::new(NoProcesses),
            config,
            false,
        )
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    /// Writes a valid pre-existing output pair for `stem` inside `out_dir`.
    fn fake_existing_output(out_dir: &Path, stem: &str) {
        fs::create_dir_all(out_dir).unwrap();
        File::create(out_dir.join(format!("{stem}.htm"))).unwrap();
        let resources = out_dir.join(format!("{stem}_files"));
        fs::create_dir(&resources).unwrap();
        File::create(resources.join("style.css")).unwrap();
    }

    #[test]
    fn missing_input_root_is_a_setup_error() {
        let tmp = TempDir::new().unwrap();
        let supervisor = test_supervisor(None);
        let walker = TreeWalker::new(&supervisor);

        let result = walker.convert_tree(&tmp.path().join("nope"), &tmp.path().join("out"));
        assert!(matches!(result, Err(ConvertError::MissingInputRoot(_))));
    }

    #[test]
    fn empty_tree_returns_zero_and_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        touch(&input.join("a").join("readme.txt"));
        touch(&input.join("b").join("photo.jpg"));

        let supervisor = test_supervisor(None);
        let summary = TreeWalker::new(&supervisor)
            .convert_tree(&input, &output)
            .unwrap();

        assert_eq!(summary, WalkSummary::default());
        assert!(!output.exists());
    }

    #[test]
    fn converts_and_mirrors_directory_structure() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        touch(&input.join("top.pub"));
        touch(&input.join("a").join("x.pub"));
        touch(&input.join("a").join("deep").join("y.pub"));
        touch(&input.join("a").join("notes.txt"));

        let supervisor = test_supervisor(None);
        let summary = TreeWalker::new(&supervisor)
            .convert_tree(&input, &output)
            .unwrap();

        assert_eq!(summary.converted, 3);
        assert_eq!(summary.skipped, 0);
        assert!(output.join("top.htm").is_file());
        assert!(output.join("a").join("x.htm").is_file());
        assert!(output.join("a").join("deep").join("y.htm").is_file());
        assert!(output.join("a").join("deep").join("y_files").is_dir());
    }

    #[test]
    fn uppercase_extension_is_discovered() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        touch(&input.join("LOUD.PUB"));

        let supervisor = test_supervisor(None);
        let summary = TreeWalker::new(&supervisor)
            .convert_tree(&input, &output)
            .unwrap();

        assert_eq!(summary.converted, 1);
    }

    #[test]
    fn already_converted_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        touch(&input.join("done.pub"));
        touch(&input.join("todo.pub"));
        fake_existing_output(&output, "done");

        let supervisor = test_supervisor(None);
        let summary = TreeWalker::new(&supervisor)
            .convert_tree(&input, &output)
            .unwrap();

        assert_eq!(summary.converted, 1);
        assert_eq!(summary.skipped, 1);
        assert!(output.join("todo.htm").is_file());
    }

    #[test]
    fn per_file_errors_do_not_abort_the_walk() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        touch(&input.join("alpha.pub"));
        touch(&input.join("bad_apple.pub"));
        touch(&input.join("zulu.pub"));

        let supervisor = test_supervisor(Some("bad"));
        let summary = TreeWalker::new(&supervisor)
            .convert_tree(&input, &output)
            .unwrap();

        // The failed file still counts as a conversion attempt.
        assert_eq!(summary.converted, 3);
        assert_eq!(summary.skipped, 0);
        assert!(output.join("alpha.htm").is_file());
        assert!(output.join("zulu.htm").is_file());
        assert!(!output.join("bad_apple.htm").exists());
    }

    #[test]
    fn counts_sum_to_total_despite_errors() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        touch(&input.join("one.pub"));
        touch(&input.join("bad_two.pub"));
        touch(&input.join("three.pub"));
        touch(&input.join("four.pub"));
        fake_existing_output(&output, "four");

        let supervisor = test_supervisor(Some("bad"));
        let summary = TreeWalker::new(&supervisor)
            .convert_tree(&input, &output)
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.converted, 3);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn count_pass_sees_nested_files() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.pub"));
        touch(&tmp.path().join("x").join("b.pub"));
        touch(&tmp.path().join("x").join("y").join("c.PUB"));
        touch(&tmp.path().join("x").join("ignore.txt"));

        assert_eq!(count_pub_files(tmp.path()), 3);
    }
}
