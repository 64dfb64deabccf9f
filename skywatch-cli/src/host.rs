//! Terminal implementations of the host collaborators the core expects.

use async_trait::async_trait;
use skywatch_core::{AmbientResource, Notifier, PermissionGate, model::WeatherTheme};
use tracing::info;

/// Prints alerts as a boxed banner on stdout.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn show_notification(&self, title: &str, body: &str, subtitle: Option<&str>) {
        println!("{}", banner(title, body, subtitle));
    }
}

pub fn banner(title: &str, body: &str, subtitle: Option<&str>) -> String {
    let mut lines = vec![format!("! {title}"), format!("  {body}")];
    if let Some(sub) = subtitle {
        lines.push(format!("  Temperature: {sub}"));
    }
    lines.join("\n")
}

/// Ambience for a terminal: there is nothing to play, so it only logs.
#[derive(Debug, Default)]
pub struct LoggedAmbience {
    pub playing: Option<WeatherTheme>,
}

impl AmbientResource for LoggedAmbience {
    fn acquire(&mut self, theme: WeatherTheme) {
        info!(theme = theme.as_str(), "ambience started");
        self.playing = Some(theme);
    }

    fn release(&mut self) {
        if let Some(theme) = self.playing.take() {
            info!(theme = theme.as_str(), "ambience stopped");
        }
    }
}

/// Grants decided up front from configuration and flags.
#[derive(Debug, Clone, Copy)]
pub struct PresetPermissions {
    pub location: bool,
    pub notifications: bool,
}

#[async_trait]
impl PermissionGate for PresetPermissions {
    async fn request_location(&self) -> bool {
        self.location
    }

    async fn request_notifications(&self) -> bool {
        self.notifications
    }
}
