//! Adapters to the real desktop: input injection through `rdev` and
//! screen grabbing through `xcap`.

use crate::keycodes::{button_for_code, key_for_code};
use crate::playback::InputSynthesizer;
use crate::snapshot::ScreenSource;
use crate::{MacroRecorderError, Rect, Result, SynthesizedAction};
use image::{imageops, RgbaImage};
use rdev::EventType;
use tracing::debug;

/// Injects synthesized input into the running session
#[derive(Debug, Default)]
pub struct RdevSynthesizer;

impl RdevSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

impl InputSynthesizer for RdevSynthesizer {
    fn apply(&mut self, action: SynthesizedAction) -> Result<()> {
        let event = match action {
            SynthesizedAction::MouseMove { x, y } => Some(EventType::MouseMove {
                x: f64::from(x),
                y: f64::from(y),
            }),
            SynthesizedAction::KeyDown(code) => key_for_code(code).map(EventType::KeyPress),
            SynthesizedAction::KeyUp(code) => key_for_code(code).map(EventType::KeyRelease),
            SynthesizedAction::ButtonDown(code) => button_for_code(code).map(EventType::ButtonPress),
            SynthesizedAction::ButtonUp(code) => button_for_code(code).map(EventType::ButtonRelease),
        };

        let Some(event) = event else {
            debug!(?action, "No platform key for code, skipping");
            return Ok(());
        };

        rdev::simulate(&event).map_err(|e| {
            MacroRecorderError::SynthesisError(format!("{:?}: {:?}", action, e))
        })
    }
}

/// Grabs the primary monitor
#[derive(Debug, Default)]
pub struct XcapScreen;

impl XcapScreen {
    pub fn new() -> Self {
        Self
    }

    fn primary_monitor() -> Result<xcap::Monitor> {
        let monitors = xcap::Monitor::all().map_err(|e| {
            MacroRecorderError::SnapshotError(format!("Failed to get monitors: {}", e))
        })?;
        for monitor in monitors {
            match monitor.is_primary() {
                Ok(true) => return Ok(monitor),
                Ok(false) => continue,
                Err(e) => {
                    return Err(MacroRecorderError::SnapshotError(format!(
                        "Error checking monitor primary status: {}",
                        e
                    )));
                }
            }
        }
        Err(MacroRecorderError::SnapshotError(
            "Could not find primary monitor".to_string(),
        ))
    }
}

fn monitor_rect(monitor: &xcap::Monitor) -> Result<Rect> {
    let err = |what: &str, e: xcap::XCapError| {
        MacroRecorderError::SnapshotError(format!("Failed to get monitor {}: {}", what, e))
    };
    Ok(Rect {
        x: monitor.x().map_err(|e| err("x", e))?,
        y: monitor.y().map_err(|e| err("y", e))?,
        width: monitor.width().map_err(|e| err("width", e))?,
        height: monitor.height().map_err(|e| err("height", e))?,
    })
}

impl ScreenSource for XcapScreen {
    fn screen_rect(&mut self) -> Result<Rect> {
        monitor_rect(&Self::primary_monitor()?)
    }

    fn capture(&mut self, rect: Rect) -> Result<RgbaImage> {
        let monitor = Self::primary_monitor()?;
        let bounds = monitor_rect(&monitor)?;
        let frame = monitor.capture_image().map_err(|e| {
            MacroRecorderError::SnapshotError(format!("Failed to capture screen: {}", e))
        })?;
        if rect == bounds {
            return Ok(frame);
        }

        // The frame is in physical pixels; the rect is in monitor coordinates.
        let scale_x = f64::from(frame.width()) / f64::from(bounds.width.max(1));
        let scale_y = f64::from(frame.height()) / f64::from(bounds.height.max(1));
        let left = ((f64::from(rect.x - bounds.x) * scale_x).max(0.0) as u32).min(frame.width());
        let top = ((f64::from(rect.y - bounds.y) * scale_y).max(0.0) as u32).min(frame.height());
        let width = ((f64::from(rect.width) * scale_x) as u32).min(frame.width() - left);
        let height = ((f64::from(rect.height) * scale_y) as u32).min(frame.height() - top);
        Ok(imageops::crop_imm(&frame, left, top, width, height).to_image())
    }
}
