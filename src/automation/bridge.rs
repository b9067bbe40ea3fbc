use std::path::Path;

use super::error::AutomationError;

/// `msoAutomationSecurityForceDisable` — macros and active content are
/// disabled in every document the automation session opens.
pub const SECURITY_FORCE_DISABLE: i32 = 3;

/// Factory for automation sessions against the Publisher application.
///
/// The supervisor acquires one fresh application handle per conversion
/// attempt, so a hung or crashed instance never leaks into the next one.
pub trait AutomationBridge {
    /// Start a new Publisher instance with automation security forced to
    /// [`SECURITY_FORCE_DISABLE`].
    fn launch(&self) -> Result<Box<dyn PublisherApp>, AutomationError>;
}

/// A live Publisher application handle.
///
/// Mirrors the subset of the COM surface the converter drives:
/// `Open`, `SaveAs`, `Close` and `Quit`. At most one document is open per
/// handle. Implementations must release the underlying instance on drop as
/// a last resort, but callers release explicitly so failures are observable.
pub trait PublisherApp {
    /// `Application.Open(path, ReadOnly, OpenAndRepair)`.
    fn open(&mut self, document: &Path, read_only: bool, repair: bool)
    -> Result<(), AutomationError>;

    /// `Document.SaveAs(output_base, format_code)`. The format code is an
    /// opaque integer owned by Publisher (7 = filtered HTML).
    fn save_as(&mut self, output_base: &Path, format_code: i32) -> Result<(), AutomationError>;

    /// `Document.Close()` on the currently open document, if any.
    fn close_document(&mut self) -> Result<(), AutomationError>;

    /// `Application.Quit()`.
    fn quit(&mut self) -> Result<(), AutomationError>;
}
