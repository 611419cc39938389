//! Win32 window-list introspection.

use std::mem::zeroed;
use windows::core::BOOL;
use windows::Win32::Foundation::{HWND, LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO, MONITORINFOF_PRIMARY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetClassNameW, GetTopWindow, GetWindow, GetWindowLongW, GetWindowRect, IsWindowVisible,
    GWL_EXSTYLE, GW_HWNDNEXT,
};

use super::geometry::{Display, ScreenRect};
use super::source::{IntrospectionError, WindowInfo, WindowSource};

pub struct Win32WindowSource;

impl WindowSource for Win32WindowSource {
    fn displays(&self) -> Result<Vec<Display>, IntrospectionError> {
        let displays = get_displays();
        if displays.is_empty() {
            return Err(IntrospectionError::Failed("no monitors reported".into()));
        }
        Ok(displays)
    }

    fn windows(&self) -> Result<Box<dyn Iterator<Item = WindowInfo> + '_>, IntrospectionError> {
        Ok(Box::new(ZOrderWindows::new()))
    }
}

/// Lazy top-to-bottom walk over top-level windows. Each step asks the OS for
/// the next sibling, so the walk ends early if a window disappears mid-scan;
/// the next poll starts over.
pub struct ZOrderWindows {
    next: Option<HWND>,
}

impl ZOrderWindows {
    pub fn new() -> Self {
        let first = unsafe { GetTopWindow(None) }.ok().filter(|h| !h.is_invalid());
        Self { next: first }
    }
}

impl Iterator for ZOrderWindows {
    type Item = WindowInfo;

    fn next(&mut self) -> Option<WindowInfo> {
        let hwnd = self.next.take()?;
        self.next = unsafe { GetWindow(hwnd, GW_HWNDNEXT) }
            .ok()
            .filter(|h| !h.is_invalid());
        Some(describe_window(hwnd))
    }
}

fn describe_window(hwnd: HWND) -> WindowInfo {
    unsafe {
        let visible = IsWindowVisible(hwnd).as_bool();

        let mut class_buf = [0u16; 256];
        let len = GetClassNameW(hwnd, &mut class_buf);
        let class_name = if len > 0 {
            String::from_utf16_lossy(&class_buf[..(len as usize).min(class_buf.len())])
        } else {
            String::new()
        };

        let ex_style = GetWindowLongW(hwnd, GWL_EXSTYLE) as u32;

        let mut rect = RECT::default();
        let rect = GetWindowRect(hwnd, &mut rect).ok().map(|_| ScreenRect {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        });

        WindowInfo {
            id: hwnd.0 as isize,
            visible,
            class_name,
            ex_style,
            rect,
        }
    }
}

pub fn get_displays() -> Vec<Display> {
    let mut monitors: Vec<HMONITOR> = Vec::new();
    unsafe {
        let _ = EnumDisplayMonitors(
            None,
            None,
            Some(monitor_enum_proc),
            LPARAM(&mut monitors as *mut _ as isize),
        );

        monitors
            .into_iter()
            .filter_map(|hmonitor| {
                let mut info: MONITORINFO = zeroed();
                info.cbSize = std::mem::size_of::<MONITORINFO>() as u32;
                if !GetMonitorInfoW(hmonitor, &mut info).as_bool() {
                    return None;
                }
                let r = info.rcMonitor;
                Some(Display {
                    id: hmonitor.0 as isize,
                    bounds: ScreenRect::new(r.left, r.top, r.right, r.bottom),
                    is_primary: info.dwFlags & MONITORINFOF_PRIMARY != 0,
                })
            })
            .collect()
    }
}

unsafe extern "system" fn monitor_enum_proc(
    hmonitor: HMONITOR,
    _: HDC,
    _: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let monitors = &mut *(lparam.0 as *mut Vec<HMONITOR>);
    monitors.push(hmonitor);
    true.into()
}
