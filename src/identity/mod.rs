//! Foreground application lookup.
//!
//! The recorder asks an [`AppIdentity`] for the name of the focused
//! application each time it records an event in app-specific mode. Every
//! implementation resolves failures to [`UNKNOWN_APP`] instead of returning
//! an error, so the recorder never has to branch on why a lookup failed.

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Returned when the focused application cannot be determined.
pub const UNKNOWN_APP: &str = "Unknown";

/// Recorded instead of an application name in global mode.
pub const GLOBAL_APP: &str = "Global";

/// Source of the currently focused application's name.
pub trait AppIdentity: Send + Sync {
    /// Best-effort name of the focused application, or [`UNKNOWN_APP`].
    fn active_app_name(&self) -> String;
}

impl<F> AppIdentity for F
where
    F: Fn() -> String + Send + Sync,
{
    fn active_app_name(&self) -> String {
        normalize(Some(self()))
    }
}

/// Looks up the foreground application through the platform API.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAppIdentity;

impl SystemAppIdentity {
    pub fn new() -> Self {
        Self
    }
}

impl AppIdentity for SystemAppIdentity {
    fn active_app_name(&self) -> String {
        normalize(frontmost_app())
    }
}

/// Always reports the same name.
#[derive(Debug, Clone)]
pub struct StaticAppIdentity(pub String);

impl AppIdentity for StaticAppIdentity {
    fn active_app_name(&self) -> String {
        normalize(Some(self.0.clone()))
    }
}

/// Collapse missing or blank names to the sentinel.
pub fn normalize(name: Option<String>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name,
        _ => UNKNOWN_APP.to_string(),
    }
}

#[cfg(target_os = "macos")]
fn frontmost_app() -> Option<String> {
    macos::frontmost_app()
}

#[cfg(target_os = "windows")]
fn frontmost_app() -> Option<String> {
    windows::frontmost_app()
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn frontmost_app() -> Option<String> {
    None
}
