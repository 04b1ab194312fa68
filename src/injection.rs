//! Injected input classification

use crate::event::InjectionFlags;

/// Flags events the OS marked as synthesized rather than produced by hardware
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectionClassifier;

impl InjectionClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn is_injected(&self, flags: InjectionFlags) -> bool {
        flags.contains(InjectionFlags::INJECTED) || flags.contains(InjectionFlags::LOWER_IL_INJECTED)
    }
}
