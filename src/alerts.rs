//! Completion alerts - sound, banner and desktop notification
//!
//! Every channel is best-effort: a failure is logged and dropped, the timer
//! never sees it.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Result;
use notify_rust::{Notification, Urgency};
use tracing::{debug, info};

/// How long the banner stays fully visible
pub const BANNER_VISIBLE: Duration = Duration::from_secs(3);
/// Fade-out after the visible period
pub const BANNER_FADE: Duration = Duration::from_millis(500);

const SOUND_COMMANDS: &[(&str, &str)] = &[
    ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
    ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
    ("aplay", "/usr/share/sounds/generic.wav"),
];

pub trait Sound {
    fn play(&self) -> Result<()>;
}

/// Plays a system sound through the first available player, else the bell
pub struct SystemSound;

impl Sound for SystemSound {
    fn play(&self) -> Result<()> {
        for (cmd, file) in SOUND_COMMANDS {
            if Path::new(file).exists() {
                let mut player = Command::new(cmd);
                player.arg(file).stdout(Stdio::null()).stderr(Stdio::null());
                spawn_reaped(player)?;
                return Ok(());
            }
        }

        let mut out = std::io::stdout();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}

/// Spawn a player and wait on it from a background thread so the exited
/// process does not linger as a zombie
fn spawn_reaped(mut command: Command) -> Result<JoinHandle<()>> {
    let mut child = command.spawn()?;
    let handle = thread::spawn(move || {
        if let Err(e) = child.wait() {
            debug!("Sound player wait failed: {}", e);
        }
    });
    Ok(handle)
}

/// Sound switched off in settings
pub struct Silent;

impl Sound for Silent {
    fn play(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Not asked yet
    Default,
    Granted,
    Denied,
    Unsupported,
}

pub trait Notifier {
    fn permission(&self) -> Permission;

    fn request_permission(&mut self) -> Permission;

    fn notify(&self, title: &str, body: &str) -> Result<()>;
}

/// Desktop notifications via the platform notification service
pub struct DesktopNotifier {
    permission: Permission,
    enabled: bool,
}

impl DesktopNotifier {
    pub fn new(enabled: bool) -> Self {
        Self {
            permission: Permission::Default,
            enabled,
        }
    }
}

impl Notifier for DesktopNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        if self.permission == Permission::Default {
            self.permission = if self.enabled {
                Permission::Granted
            } else {
                Permission::Denied
            };
        }
        self.permission
    }

    fn notify(&self, title: &str, body: &str) -> Result<()> {
        Notification::new()
            .summary(title)
            .body(body)
            .appname("hybrid-master")
            .icon("alarm-clock")
            .urgency(Urgency::Critical)
            .show()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BannerPhase {
    Visible,
    /// Opacity from 1.0 down to 0.0
    Fading(f32),
    Dismissed,
}

/// Transient "timer finished" banner
#[derive(Debug, Clone)]
pub struct Banner {
    pub text: String,
    shown_at: Instant,
}

impl Banner {
    pub fn new(text: impl Into<String>, shown_at: Instant) -> Self {
        Self {
            text: text.into(),
            shown_at,
        }
    }

    pub fn phase(&self, now: Instant) -> BannerPhase {
        let age = now.saturating_duration_since(self.shown_at);
        if age < BANNER_VISIBLE {
            BannerPhase::Visible
        } else if age < BANNER_VISIBLE + BANNER_FADE {
            let into_fade = (age - BANNER_VISIBLE).as_secs_f32();
            BannerPhase::Fading(1.0 - into_fade / BANNER_FADE.as_secs_f32())
        } else {
            BannerPhase::Dismissed
        }
    }
}

/// The three completion channels
pub struct Alerts {
    sound: Box<dyn Sound>,
    notifier: Box<dyn Notifier>,
    banner: Option<Banner>,
}

impl Alerts {
    pub fn new(sound: Box<dyn Sound>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            sound,
            notifier,
            banner: None,
        }
    }

    /// Ask for notification permission once, if it was never decided
    pub fn request_permission(&mut self) {
        if self.notifier.permission() != Permission::Default {
            return;
        }
        match self.notifier.request_permission() {
            Permission::Granted => info!("Notification permission granted"),
            other => info!("Notification permission not granted: {:?}", other),
        }
    }

    /// Fire all channels; nothing here can fail the caller
    pub fn fire(&mut self, title: &str, body: &str, now: Instant) {
        if let Err(e) = self.sound.play() {
            debug!("Sound failed: {}", e);
        }

        self.banner = Some(Banner::new(title, now));

        if self.notifier.permission() == Permission::Granted
            && let Err(e) = self.notifier.notify(title, body)
        {
            debug!("Notification failed: {}", e);
        }
    }

    /// Current banner while it is still on screen
    pub fn banner(&self, now: Instant) -> Option<(&str, BannerPhase)> {
        let banner = self.banner.as_ref()?;
        match banner.phase(now) {
            BannerPhase::Dismissed => None,
            phase => Some((banner.text.as_str(), phase)),
        }
    }

    /// Drop the banner once it has faded out
    pub fn sweep(&mut self, now: Instant) {
        if self
            .banner
            .as_ref()
            .is_some_and(|b| b.phase(now) == BannerPhase::Dismissed)
        {
            self.banner = None;
        }
    }

    pub fn clear_banner(&mut self) {
        self.banner = None;
    }
}
