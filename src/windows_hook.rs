//! Windows Raw Input sink and `WH_MOUSE_LL` interceptor.
//!
//! A hidden window receives `WM_INPUT` for the generic-desktop mouse usage
//! (with `RIDEV_INPUTSINK`, so clicks are seen while the window is in the
//! background) and feeds left presses to the timing detector. The low-level
//! hook hands every mouse event's `LLMHF_*` flags to the injection detector
//! and swallows the event when the monitor says so.
//!
//! Both callbacks run on the thread that pumps messages in [`run`]. The
//! monitor is parked in a thread-local for the duration of the loop and
//! taken back out before teardown.
//!
//! # Safety
//!
//! `unsafe` is confined to Win32 FFI calls and to reading `RAWINPUT`
//! payloads out of byte buffers whose length has been checked.

use std::cell::RefCell;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use windows_sys::Win32::Foundation::{GetLastError, HWND, LPARAM, LRESULT, WPARAM};
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::System::Threading::GetCurrentThreadId;
use windows_sys::Win32::UI::Input::{
    GetRawInputData, RegisterRawInputDevices, RAWINPUTDEVICE, RAWINPUTHEADER, RAWMOUSE,
    RIDEV_INPUTSINK, RID_INPUT, RIM_TYPEMOUSE,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW,
    GetMessageW, PostQuitMessage, PostThreadMessageW, RegisterClassW, SetWindowsHookExW,
    TranslateMessage, UnhookWindowsHookEx, CW_USEDEFAULT, HC_ACTION, HHOOK, MSG,
    MSLLHOOKSTRUCT, WH_MOUSE_LL, WM_DESTROY, WM_INPUT, WM_QUIT, WNDCLASSW,
    WS_OVERLAPPEDWINDOW,
};

use crate::event::{ButtonFlags, DeviceKind, InjectionFlags, RawMouseEvent};
use crate::monitor::{Monitor, MonitorStats, Registration, Verdict};
use crate::MonitorError;

const HID_USAGE_PAGE_GENERIC: u16 = 0x01;
const HID_USAGE_GENERIC_MOUSE: u16 = 0x02;

const WINDOW_CLASS: &str = "ClickSentinelMonitor";
const WINDOW_TITLE: &str = "Mouse Input Monitor";

thread_local! {
    static ACTIVE: RefCell<Option<Monitor>> = const { RefCell::new(None) };
}

/// Run `f` against the monitor parked on this thread, if any.
fn with_monitor<R>(f: impl FnOnce(&mut Monitor) -> R) -> Option<R> {
    ACTIVE.with(|slot| {
        // A callback re-entered while the monitor is borrowed is passed through.
        let mut guard = slot.try_borrow_mut().ok()?;
        guard.as_mut().map(f)
    })
}

fn last_error() -> String {
    format!("Win32 error {}", unsafe { GetLastError() })
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Lets another thread stop the message loop
#[derive(Debug, Clone, Copy)]
pub struct ShutdownHandle {
    thread_id: u32,
}

impl ShutdownHandle {
    /// Handle for the calling thread, which must be the one that calls [`run`]
    pub fn for_current_thread() -> Self {
        Self {
            thread_id: unsafe { GetCurrentThreadId() },
        }
    }

    /// Post `WM_QUIT` to the loop thread. Returns false if it has no queue yet.
    pub fn request(&self) -> bool {
        unsafe { PostThreadMessageW(self.thread_id, WM_QUIT, 0, 0) != 0 }
    }
}

/// Installed `WH_MOUSE_LL` hook, removed on drop
struct HookGuard(HHOOK);

impl HookGuard {
    fn install() -> Result<Self, MonitorError> {
        // SAFETY: low-level hooks need no module handle; the procedure is a
        // plain `extern "system"` fn that lives for the whole program.
        let hook = unsafe { SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), ptr::null_mut(), 0) };
        if hook.is_null() {
            return Err(MonitorError::HookRegistration(last_error()));
        }
        debug!("Mouse hook installed");
        Ok(Self(hook))
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        // SAFETY: the handle came from a successful SetWindowsHookExW.
        if unsafe { UnhookWindowsHookEx(self.0) } == 0 {
            error!("Failed to remove mouse hook: {}", last_error());
        } else {
            debug!("Mouse hook removed");
        }
    }
}

/// Hidden window that owns the raw input registration
struct MessageWindow {
    hwnd: HWND,
}

impl MessageWindow {
    fn create() -> Result<Self, MonitorError> {
        let class_name = wide(WINDOW_CLASS);
        let title = wide(WINDOW_TITLE);

        unsafe {
            let instance = GetModuleHandleW(ptr::null());

            let mut wc: WNDCLASSW = mem::zeroed();
            wc.lpfnWndProc = Some(window_proc);
            wc.hInstance = instance;
            wc.lpszClassName = class_name.as_ptr();

            if RegisterClassW(&wc) == 0 {
                return Err(MonitorError::WindowCreation(format!(
                    "RegisterClassW: {}",
                    last_error()
                )));
            }

            // Never shown: the window exists only as a WM_INPUT target.
            let hwnd = CreateWindowExW(
                0,
                class_name.as_ptr(),
                title.as_ptr(),
                WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                ptr::null_mut(),
                ptr::null_mut(),
                instance,
                ptr::null(),
            );
            if hwnd.is_null() {
                return Err(MonitorError::WindowCreation(format!(
                    "CreateWindowExW: {}",
                    last_error()
                )));
            }

            Ok(Self { hwnd })
        }
    }

    fn register_raw_input(&self) -> Result<(), MonitorError> {
        let device = RAWINPUTDEVICE {
            usUsagePage: HID_USAGE_PAGE_GENERIC,
            usUsage: HID_USAGE_GENERIC_MOUSE,
            dwFlags: RIDEV_INPUTSINK,
            hwndTarget: self.hwnd,
        };

        let ok = unsafe {
            RegisterRawInputDevices(&device, 1, mem::size_of::<RAWINPUTDEVICE>() as u32)
        };
        if ok == 0 {
            return Err(MonitorError::RawInputRegistration(last_error()));
        }
        debug!("Raw input registered for mouse");
        Ok(())
    }
}

impl Drop for MessageWindow {
    fn drop(&mut self) {
        unsafe {
            DestroyWindow(self.hwnd);
        }
    }
}

/// Attach both sources, pump messages until `WM_QUIT`, then tear down.
///
/// Registration failures degrade the run instead of aborting it. The hook
/// is released before the monitor shuts down on every path.
pub fn run(mut monitor: Monitor, running: Arc<AtomicBool>) -> Result<MonitorStats, MonitorError> {
    let window = MessageWindow::create()
        .map_err(|e| error!("{}", e))
        .ok();
    let raw_input = match &window {
        Some(window) => window
            .register_raw_input()
            .map_err(|e| error!("{}", e))
            .is_ok(),
        None => false,
    };
    let hook = HookGuard::install().map_err(|e| error!("{}", e)).ok();

    let registration = Registration {
        raw_input,
        interceptor: hook.is_some(),
    };
    let started = monitor
        .attach(registration)
        .and_then(|()| monitor.start());
    if let Err(e) = started {
        drop(hook);
        let _ = monitor.shutdown();
        return Err(e);
    }

    ACTIVE.with(|slot| *slot.borrow_mut() = Some(monitor));

    // Ctrl+C may have arrived before this thread had a message queue.
    if running.load(Ordering::SeqCst) {
        info!("Message loop started");
        pump_messages();
    }

    drop(hook);
    drop(window);

    let mut monitor = ACTIVE
        .with(|slot| slot.borrow_mut().take())
        .ok_or_else(|| MonitorError::Channel("monitor missing after message loop".to_string()))?;
    monitor.shutdown()
}

fn pump_messages() {
    let mut msg: MSG = unsafe { mem::zeroed() };
    loop {
        let r = unsafe { GetMessageW(&mut msg, ptr::null_mut(), 0, 0) };
        match r {
            0 => break,
            -1 => {
                error!("GetMessageW failed: {}", last_error());
                break;
            }
            _ => unsafe {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            },
        }
    }
}

unsafe extern "system" fn window_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_INPUT => {
            match read_wm_input(lparam) {
                Ok(Some(event)) => {
                    with_monitor(|m| m.on_mouse_event(event));
                }
                Ok(None) => {}
                Err(e) => {
                    with_monitor(|m| m.on_event_dropped(&e));
                }
            }
            // Lets the system release the raw input buffer.
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        WM_DESTROY => {
            PostQuitMessage(0);
            0
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Low-level mouse hook callback.
///
/// # Safety
///
/// Called by Windows on the loop thread; must return quickly or the OS
/// silently removes the hook.
unsafe extern "system" fn mouse_hook_proc(n_code: i32, w_param: WPARAM, l_param: LPARAM) -> LRESULT {
    if n_code == HC_ACTION as i32 && l_param != 0 {
        // SAFETY: l_param points to an MSLLHOOKSTRUCT when n_code == HC_ACTION.
        let info = &*(l_param as *const MSLLHOOKSTRUCT);
        let flags = InjectionFlags::from_bits(info.flags);

        if with_monitor(|m| m.on_low_level_event(flags)) == Some(Verdict::Block) {
            return 1;
        }
    }

    CallNextHookEx(ptr::null_mut(), n_code, w_param, l_param)
}

/// Read a `WM_INPUT` payload with the two-call `GetRawInputData` protocol.
///
/// Returns `Ok(None)` for packets that are not mouse input.
pub(crate) fn read_wm_input(lparam: LPARAM) -> Result<Option<RawMouseEvent>, MonitorError> {
    let header_size = mem::size_of::<RAWINPUTHEADER>() as u32;

    let mut size: u32 = 0;
    let r0 = unsafe {
        GetRawInputData(lparam as _, RID_INPUT, ptr::null_mut(), &mut size, header_size)
    };
    if r0 == u32::MAX {
        return Err(MonitorError::EventData(format!("size query: {}", last_error())));
    }
    if size == 0 {
        return Ok(None);
    }

    let expected = size;
    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(expected as usize)
        .map_err(|_| MonitorError::Allocation(expected as usize))?;
    buf.resize(expected as usize, 0);

    let r1 = unsafe {
        GetRawInputData(
            lparam as _,
            RID_INPUT,
            buf.as_mut_ptr().cast(),
            &mut size,
            header_size,
        )
    };
    if r1 == u32::MAX {
        return Err(MonitorError::EventData(format!("read: {}", last_error())));
    }
    if r1 != expected {
        return Err(MonitorError::EventData(format!(
            "expected {} bytes, got {}",
            expected, r1
        )));
    }

    parse_raw_input(&buf)
}

/// Decode a `RID_INPUT` byte payload into a mouse event.
fn parse_raw_input(buf: &[u8]) -> Result<Option<RawMouseEvent>, MonitorError> {
    let hdr_sz = mem::size_of::<RAWINPUTHEADER>();
    if buf.len() < hdr_sz {
        return Err(MonitorError::EventData(format!(
            "{} byte payload is shorter than the header",
            buf.len()
        )));
    }

    // SAFETY: length checked above; read_unaligned tolerates the byte buffer's alignment.
    let hdr: RAWINPUTHEADER = unsafe { ptr::read_unaligned(buf.as_ptr().cast()) };
    if hdr.dwType != RIM_TYPEMOUSE {
        return Ok(None);
    }

    let need = hdr_sz + mem::size_of::<RAWMOUSE>();
    if buf.len() < need {
        return Err(MonitorError::EventData(format!(
            "mouse payload of {} bytes, need {}",
            buf.len(),
            need
        )));
    }

    // SAFETY: length checked above.
    let mouse: RAWMOUSE = unsafe { ptr::read_unaligned(buf.as_ptr().add(hdr_sz).cast()) };
    let buttons = unsafe { mouse.Anonymous.Anonymous.usButtonFlags };

    Ok(Some(RawMouseEvent {
        device: DeviceKind::Mouse,
        buttons: ButtonFlags::from_bits(buttons),
        x: mouse.lLastX,
        y: mouse.lLastY,
        // Raw input packets carry no injection bits; those arrive through the hook.
        injection: InjectionFlags::empty(),
    }))
}
