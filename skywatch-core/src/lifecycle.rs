//! Foreground/background lifecycle and the resources bound to it.
//!
//! The ambient resource (background sound on a phone, anything equivalent on
//! another host) is held only while the lifecycle is in
//! [`LifecycleState::Foreground`] and released on every transition out of it.

use async_trait::async_trait;
use std::fmt::Debug;
use tracing::{debug, info};

use crate::{
    error::LifecycleError,
    location::LocationResolver,
    model::{Coordinates, WeatherTheme},
    state::WeatherSync,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Foreground,
    Background,
    Stopped,
}

/// Something acquired while visible, e.g. a looping ambience track.
pub trait AmbientResource: Send + Debug {
    fn acquire(&mut self, theme: WeatherTheme);
    fn release(&mut self);
}

#[derive(Debug)]
pub struct Lifecycle<R: AmbientResource> {
    state: LifecycleState,
    theme: WeatherTheme,
    resource: R,
    held: bool,
}

impl<R: AmbientResource> Lifecycle<R> {
    /// Starts in the background with nothing held.
    pub fn new(resource: R) -> Self {
        Self {
            state: LifecycleState::Background,
            theme: WeatherTheme::None,
            resource,
            held: false,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn theme(&self) -> WeatherTheme {
        self.theme
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn enter_foreground(&mut self) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Foreground)?;
        self.acquire();
        Ok(())
    }

    pub fn enter_background(&mut self) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Background)
    }

    /// Terminal. Later transitions fail with [`LifecycleError::Stopped`].
    pub fn stop(&mut self) {
        self.release();
        if self.state != LifecycleState::Stopped {
            info!(from = ?self.state, "lifecycle stopped");
        }
        self.state = LifecycleState::Stopped;
    }

    /// Switch ambience to `theme`; only swaps the held resource when visible.
    pub fn set_theme(&mut self, theme: WeatherTheme) {
        if theme == self.theme {
            return;
        }
        self.theme = theme;
        if self.state == LifecycleState::Foreground {
            self.release();
            self.acquire();
        }
    }

    fn transition(&mut self, to: LifecycleState) -> Result<(), LifecycleError> {
        if self.state == LifecycleState::Stopped {
            return Err(LifecycleError::Stopped);
        }
        if self.state == to {
            return Ok(());
        }

        if self.state == LifecycleState::Foreground {
            self.release();
        }
        debug!(from = ?self.state, to = ?to, "lifecycle transition");
        self.state = to;
        Ok(())
    }

    fn acquire(&mut self) {
        if self.held || !self.theme.has_ambience() {
            return;
        }
        self.resource.acquire(self.theme);
        self.held = true;
    }

    fn release(&mut self) {
        if self.held {
            self.resource.release();
            self.held = false;
        }
    }
}

impl<R: AmbientResource> Drop for Lifecycle<R> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Host authorization prompts, asked once at startup.
#[async_trait]
pub trait PermissionGate: Send + Sync + Debug {
    async fn request_location(&self) -> bool;
    async fn request_notifications(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    pub location: bool,
    pub notifications: bool,
}

impl Permissions {
    pub async fn resolve(gate: &dyn PermissionGate) -> Self {
        let permissions = Self {
            location: gate.request_location().await,
            notifications: gate.request_notifications().await,
        };
        info!(
            location = permissions.location,
            notifications = permissions.notifications,
            "permissions resolved"
        );
        permissions
    }
}

/// Startup sequence once permissions are known: without notification
/// access alerts are switched off; with location access the device
/// location is resolved and loaded. Returns the coordinates used, if any.
pub async fn startup(
    permissions: Permissions,
    sync: &WeatherSync,
    resolver: &LocationResolver,
    api_key: &str,
) -> Option<Coordinates> {
    if !permissions.notifications {
        sync.set_notifications_enabled(false);
    }
    if !permissions.location {
        return None;
    }

    let coords = resolver.resolve_current_device_location().await?;
    sync.refresh_for_coordinates(coords, api_key).await;
    Some(coords)
}
