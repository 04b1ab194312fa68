//! Event types exchanged between the platform shim and the monitor
//!
//! Flag values mirror the Win32 bit layouts (`RI_MOUSE_*` for button
//! transitions, `LLMHF_*` for low-level hook flags) so the Windows shim can
//! pass the raw bits straight through. Other backends build them by hand.

use std::time::Instant;

/// A single left-button press kept in the event window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    /// Monotonic instant the click was observed
    pub timestamp: Instant,
    /// Screen-relative X (informational only)
    pub x: i32,
    /// Screen-relative Y (informational only)
    pub y: i32,
}

impl ClickEvent {
    pub fn new(timestamp: Instant, x: i32, y: i32) -> Self {
        Self { timestamp, x, y }
    }
}

/// Device class reported by the raw input source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Mouse,
    Keyboard,
    Other,
}

/// Button transition bits of a raw mouse event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonFlags(u16);

impl ButtonFlags {
    pub const LEFT_DOWN: u16 = 0x0001;
    pub const LEFT_UP: u16 = 0x0002;
    pub const RIGHT_DOWN: u16 = 0x0004;
    pub const RIGHT_UP: u16 = 0x0008;

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn is_left_down(self) -> bool {
        self.0 & Self::LEFT_DOWN != 0
    }
}

/// Injection bits attached to a low-level mouse event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectionFlags(u32);

impl InjectionFlags {
    /// Event was injected by a call to `SendInput` or similar
    pub const INJECTED: u32 = 0x0000_0001;
    /// Event was injected from a process running at lower integrity level
    pub const LOWER_IL_INJECTED: u32 = 0x0000_0002;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn contains(self, bit: u32) -> bool {
        self.0 & bit != 0
    }
}

/// One raw mouse packet as delivered by the platform shim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMouseEvent {
    pub device: DeviceKind,
    pub buttons: ButtonFlags,
    /// Relative or absolute X, depending on the source
    pub x: i32,
    /// Relative or absolute Y, depending on the source
    pub y: i32,
    pub injection: InjectionFlags,
}

impl RawMouseEvent {
    /// A physical left-button press at the given coordinates
    pub fn left_down(x: i32, y: i32) -> Self {
        Self {
            device: DeviceKind::Mouse,
            buttons: ButtonFlags::from_bits(ButtonFlags::LEFT_DOWN),
            x,
            y,
            injection: InjectionFlags::empty(),
        }
    }

    pub fn with_injection(mut self, injection: InjectionFlags) -> Self {
        self.injection = injection;
        self
    }

    /// Whether this packet should be tracked as a click
    pub fn is_left_click(&self) -> bool {
        self.device == DeviceKind::Mouse && self.buttons.is_left_down()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_click_requires_mouse_and_left_down() {
        assert!(RawMouseEvent::left_down(3, 4).is_left_click());

        let release = RawMouseEvent {
            buttons: ButtonFlags::from_bits(ButtonFlags::LEFT_UP),
            ..RawMouseEvent::left_down(0, 0)
        };
        assert!(!release.is_left_click());

        let right = RawMouseEvent {
            buttons: ButtonFlags::from_bits(ButtonFlags::RIGHT_DOWN),
            ..RawMouseEvent::left_down(0, 0)
        };
        assert!(!right.is_left_click());

        let keyboard = RawMouseEvent {
            device: DeviceKind::Keyboard,
            ..RawMouseEvent::left_down(0, 0)
        };
        assert!(!keyboard.is_left_click());
    }

    #[test]
    fn left_down_combined_with_other_bits_still_counts() {
        let event = RawMouseEvent {
            buttons: ButtonFlags::from_bits(ButtonFlags::LEFT_DOWN | ButtonFlags::RIGHT_UP),
            ..RawMouseEvent::left_down(0, 0)
        };
        assert!(event.is_left_click());
    }
}
