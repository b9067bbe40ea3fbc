pub mod bridge;
pub mod error;
pub mod powershell;

pub use bridge::{AutomationBridge, PublisherApp, SECURITY_FORCE_DISABLE};
pub use error::AutomationError;
pub use powershell::PowerShellBridge;
