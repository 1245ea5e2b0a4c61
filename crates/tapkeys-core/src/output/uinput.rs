// Tapkeys uinput Output Layer
// Virtual keyboard device driven by output actions

use evdev::uinput::VirtualDeviceBuilder;
use evdev::{AttributeSet, EventType, InputEvent};

use super::dispatcher::{DispatchError, Dispatcher};
use crate::action::OutputAction;
use crate::key::{ascii_key_and_shift, hex_digit_key, keysym_to_key, Key};
use crate::symbols::name_to_symbol;

const KEY_RELEASE: i32 = 0;
const KEY_PRESS: i32 = 1;

/// Virtual uinput keyboard
pub struct VirtualDevice {
    device: evdev::uinput::VirtualDevice,
    /// Modifier keys currently held down, in press order
    held: Vec<Key>,
}

impl VirtualDevice {
    /// Create a new virtual uinput device
    pub fn new() -> Result<Self, DispatchError> {
        let mut keys = AttributeSet::<evdev::Key>::new();
        for code in 0..256u16 {
            keys.insert(evdev::Key::new(code));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(|e: std::io::Error| DispatchError::Device(e.to_string()))?
            .name("Tapkeys (virtual) Keyboard")
            .with_keys(&keys)
            .map_err(|e: std::io::Error| DispatchError::Device(e.to_string()))?
            .build()
            .map_err(|e: std::io::Error| DispatchError::Device(e.to_string()))?;

        Ok(Self {
            device,
            held: Vec::new(),
        })
    }

    fn write_key_event(&mut self, key: Key, value: i32) -> Result<(), DispatchError> {
        let key_event = InputEvent::new(EventType::KEY, key.code(), value);
        // SYN event is required for the kernel to process the key event
        let syn_event = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        self.device
            .emit(&[key_event, syn_event])
            .map_err(|e: std::io::Error| DispatchError::Device(e.to_string()))
    }

    fn tap_key(&mut self, key: Key) -> Result<(), DispatchError> {
        self.write_key_event(key, KEY_PRESS)?;
        self.write_key_event(key, KEY_RELEASE)
    }

    fn hold(&mut self, key: Key) -> Result<(), DispatchError> {
        self.write_key_event(key, KEY_PRESS)?;
        if !self.held.contains(&key) {
            self.held.push(key);
        }
        Ok(())
    }

    fn release(&mut self, key: Key) -> Result<(), DispatchError> {
        self.held.retain(|k| *k != key);
        self.write_key_event(key, KEY_RELEASE)
    }

    fn send_ascii_char(&mut self, ch: char) -> Result<bool, DispatchError> {
        let Some((key, needs_shift)) = ascii_key_and_shift(ch) else {
            return Ok(false);
        };

        if needs_shift && !self.held.contains(&Key::LEFT_SHIFT) {
            self.write_key_event(Key::LEFT_SHIFT, KEY_PRESS)?;
            self.tap_key(key)?;
            self.write_key_event(Key::LEFT_SHIFT, KEY_RELEASE)?;
        } else {
            self.tap_key(key)?;
        }
        Ok(true)
    }

    /// Send a Unicode character via the Ctrl+Shift+U hex entry sequence.
    pub fn send_unicode(&mut self, codepoint: u32) -> Result<(), DispatchError> {
        if char::from_u32(codepoint).is_none() {
            return Err(DispatchError::InvalidCodepoint(codepoint));
        }

        // Held modifiers would alter the entry sequence
        let held = self.held.clone();
        for key in held.iter().rev() {
            self.write_key_event(*key, KEY_RELEASE)?;
        }

        self.write_key_event(Key::LEFT_CTRL, KEY_PRESS)?;
        self.write_key_event(Key::LEFT_SHIFT, KEY_PRESS)?;
        self.tap_key(Key::U)?;
        self.write_key_event(Key::LEFT_SHIFT, KEY_RELEASE)?;
        self.write_key_event(Key::LEFT_CTRL, KEY_RELEASE)?;

        for digit in format!("{codepoint:x}").chars() {
            let key = hex_digit_key(digit).ok_or(DispatchError::InvalidCodepoint(codepoint))?;
            self.tap_key(key)?;
        }
        self.tap_key(Key::ENTER)?;

        for key in &held {
            self.write_key_event(*key, KEY_PRESS)?;
        }
        Ok(())
    }

    /// Type text: ASCII through key events (held modifiers apply), anything
    /// else through Unicode entry.
    pub fn send_text(&mut self, text: &str) -> Result<(), DispatchError> {
        for ch in text.chars() {
            if !self.send_ascii_char(ch)? {
                self.send_unicode(ch as u32)?;
            }
        }
        Ok(())
    }

    /// Press and release a key named by its X keysym
    pub fn press_named(&mut self, name: &str) -> Result<(), DispatchError> {
        if name.chars().count() == 1 {
            return self.send_text(name);
        }
        if let Some(key) = keysym_to_key(name) {
            return self.tap_key(key);
        }
        if let Some(symbol) = name_to_symbol(name) {
            return self.send_text(symbol);
        }
        Err(DispatchError::UnknownKey(name.to_string()))
    }

    /// Release every held modifier
    pub fn release_all(&mut self) -> Result<(), DispatchError> {
        let held = std::mem::take(&mut self.held);
        for key in held.into_iter().rev() {
            self.write_key_event(key, KEY_RELEASE)?;
        }
        Ok(())
    }

    /// Number of modifiers currently held down
    pub fn held_count(&self) -> usize {
        self.held.len()
    }
}

impl Dispatcher for VirtualDevice {
    fn dispatch(&mut self, action: &OutputAction) -> Result<(), DispatchError> {
        match action {
            OutputAction::Hold(kind) => self.hold(Key::for_modifier(*kind)),
            OutputAction::Release(kind) => self.release(Key::for_modifier(*kind)),
            OutputAction::Type(text) => self.send_text(text),
            OutputAction::Press(name) => self.press_named(name),
        }
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        let _ = self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ModifierKind;

    #[test]
    fn test_virtual_device_creation() {
        // Requires uinput access; may fail in containers
        match VirtualDevice::new() {
            Ok(mut device) => {
                device
                    .dispatch(&OutputAction::Hold(ModifierKind::Shift))
                    .unwrap();
                assert_eq!(device.held_count(), 1);
                device
                    .dispatch(&OutputAction::Release(ModifierKind::Shift))
                    .unwrap();
                assert_eq!(device.held_count(), 0);
            }
            Err(_) => {}
        }
    }
}
