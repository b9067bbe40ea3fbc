//! PowerShell-backed implementation of the automation bridge.
//!
//! COM automation is only reachable from a Windows scripting host, so the
//! bridge materializes a small PowerShell REPL to a temp file and keeps it
//! running as a child process for the lifetime of one application handle.
//! Commands go over stdin as tab-separated lines; every command is answered
//! with exactly one reply line, `OK` or `ERR <hresult> <message>`.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tempfile::NamedTempFile;

use super::bridge::{AutomationBridge, PublisherApp, SECURITY_FORCE_DISABLE};
use super::error::AutomationError;

/// REPL executed inside the bridge child. One Publisher instance and at most
/// one open document per session; HRESULTs surface through the `ERR` reply.
const BRIDGE_SCRIPT: &str = r#"
$ErrorActionPreference = 'Stop'
$app = $null
$doc = $null
while ($null -ne ($line = [Console]::In.ReadLine())) {
    $parts = $line -split "`t"
    try {
        switch ($parts[0]) {
            'LAUNCH' {
                $app = New-Object -ComObject Publisher.Application
                $app.AutomationSecurity = [int]$parts[1]
            }
            'OPEN' {
                $doc = $app.Open($parts[1], [bool]([int]$parts[2]), [bool]([int]$parts[3]))
            }
            'SAVEAS' {
                $doc.SaveAs($parts[1], [int]$parts[2])
            }
            'CLOSE' {
                if ($null -ne $doc) { $doc.Close(); $doc = $null }
            }
            'QUIT' {
                if ($null -ne $app) { $app.Quit(); $app = $null }
            }
        }
        [Console]::Out.WriteLine('OK')
        [Console]::Out.Flush()
        if ($parts[0] -eq 'QUIT') { break }
    } catch {
        $msg = $_.Exception.Message -replace "[`r`n`t]", ' '
        [Console]::Out.WriteLine("ERR $($_.Exception.HResult) $msg")
        [Console]::Out.Flush()
    }
}
"#;

/// Bridge factory spawning one PowerShell child per application handle.
pub struct PowerShellBridge {
    shell: String,
}

impl PowerShellBridge {
    pub fn new() -> Self {
        Self::with_shell("powershell".to_string())
    }

    /// Use a custom interpreter binary (useful for `pwsh` on newer hosts).
    pub fn with_shell(shell: String) -> Self {
        Self { shell }
    }
}

impl Default for PowerShellBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomationBridge for PowerShellBridge {
    fn launch(&self) -> Result<Box<dyn PublisherApp>, AutomationError> {
        let script = NamedTempFile::with_suffix(".ps1").map_err(AutomationError::Spawn)?;
        std::fs::write(script.path(), BRIDGE_SCRIPT).map_err(AutomationError::Spawn)?;

        let mut child = Command::new(&self.shell)
            .arg("-NoProfile")
            .arg("-NonInteractive")
            .arg("-ExecutionPolicy")
            .arg("Bypass")
            .arg("-File")
            .arg(script.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(AutomationError::Spawn)?;

        let stdin = child.stdin.take().ok_or(AutomationError::ChannelClosed)?;
        let stdout = child.stdout.take().ok_or(AutomationError::ChannelClosed)?;

        let mut session = PowerShellSession {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            _script: script,
        };
        session.exec(&encode(&["LAUNCH", &SECURITY_FORCE_DISABLE.to_string()]))?;
        Ok(Box::new(session))
    }
}

/// A live bridge child holding one Publisher instance.
struct PowerShellSession {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    // Keeps the REPL script on disk while the child runs.
    _script: NamedTempFile,
}

impl PowerShellSession {
    /// Send one command line and block until its reply line arrives.
    fn exec(&mut self, command: &str) -> Result<(), AutomationError> {
        writeln!(self.stdin, "{command}").map_err(|_| AutomationError::ChannelClosed)?;
        self.stdin
            .flush()
            .map_err(|_| AutomationError::ChannelClosed)?;

        let mut reply = String::new();
        let n = self
            .stdout
            .read_line(&mut reply)
            .map_err(|_| AutomationError::ChannelClosed)?;
        if n == 0 {
            return Err(AutomationError::ChannelClosed);
        }
        parse_reply(&reply)
    }
}

impl PublisherApp for PowerShellSession {
    fn open(
        &mut self,
        document: &Path,
        read_only: bool,
        repair: bool,
    ) -> Result<(), AutomationError> {
        self.exec(&encode(&[
            "OPEN",
            &document.to_string_lossy(),
            if read_only { "1" } else { "0" },
            if repair { "1" } else { "0" },
        ]))
    }

    fn save_as(&mut self, output_base: &Path, format_code: i32) -> Result<(), AutomationError> {
        self.exec(&encode(&[
            "SAVEAS",
            &output_base.to_string_lossy(),
            &format_code.to_string(),
        ]))
    }

    fn close_document(&mut self) -> Result<(), AutomationError> {
        self.exec("CLOSE")
    }

    fn quit(&mut self) -> Result<(), AutomationError> {
        self.exec("QUIT")
    }
}

impl Drop for PowerShellSession {
    fn drop(&mut self) {
        // Last-resort release. The supervisor quits explicitly; this only
        // fires when an attempt aborted mid-flight.
        let _ = writeln!(self.stdin, "QUIT");
        let _ = self.stdin.flush();
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Join command parts with tabs, the field separator the REPL splits on.
fn encode(parts: &[&str]) -> String {
    parts.join("\t")
}

/// Decode one reply line from the bridge.
fn parse_reply(line: &str) -> Result<(), AutomationError> {
    let line = line.trim_end();
    if line == "OK" {
        return Ok(());
    }
    if let Some(rest) = line.strip_prefix("ERR ") {
        let (code, message) = rest.split_once(' ').unwrap_or((rest, ""));
        let code = code
            .parse::<i32>()
            .map_err(|_| AutomationError::Protocol(line.to_string()))?;
        return Err(AutomationError::Com {
            code,
            message: message.to_string(),
        });
    }
    Err(AutomationError::Protocol(line.to_string()))
}
