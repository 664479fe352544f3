//! evdev keyboard access for the `--device` input source

use std::path::Path;

use anyhow::{Context, Result};
use evdev::Device;

/// Open an input device, warning when it does not look like a keyboard.
pub fn open_keyboard(path: &Path) -> Result<Device> {
    let device = Device::open(path)
        .with_context(|| format!("Failed to open device at {}", path.display()))?;

    let name = device.name().unwrap_or("Unknown").to_string();
    if is_keyboard(&device) {
        tracing::info!("Reading keys from '{}' at {}", name, path.display());
    } else {
        tracing::warn!(
            "'{}' at {} has no letter keys, the sequence may be impossible to enter",
            name,
            path.display()
        );
    }

    Ok(device)
}

/// Check if a device is a keyboard
pub fn is_keyboard(device: &Device) -> bool {
    device
        .supported_events()
        .contains(evdev::EventType::KEY)
        && device
            .supported_keys()
            .map(|keys| keys.contains(evdev::Key::KEY_A))
            .unwrap_or(false)
}

/// Grab a device for exclusive access, so keys entered into the interface do
/// not also reach other applications
pub fn grab_device(device: &mut Device) -> Result<()> {
    device.grab()?;
    Ok(())
}
