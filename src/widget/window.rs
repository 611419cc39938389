//! The Win32 host window: a borderless, always-on-top, non-activating popup
//! with a transparent WebView filling its client area.
//!
//! Everything below runs on one UI thread. Network calls go to short-lived
//! worker threads whose results come back through a channel, followed by a
//! `WM_APP_WORKER_DONE` post so the UI thread drains it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, Once};

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};
use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Dwm::DwmExtendFrameIntoClientArea;
use windows::Win32::Graphics::Gdi::HBRUSH;
use windows::Win32::System::Com::{CoInitialize, CoUninitialize};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Controls::MARGINS;
use windows::Win32::UI::Input::KeyboardAndMouse::ReleaseCapture;
use windows::Win32::UI::WindowsAndMessaging::*;
use wry::{Rect, WebContext, WebView, WebViewBuilder};

use crate::api::{FullState, SonarClient, SonarResult};
use crate::config::{WidgetSettings, APP_DIR_NAME};
use crate::occlusion::{platform_source, primary_display, ScreenRect, WindowSource};
use crate::occlusion::win32::get_displays;
use crate::visibility::{Transition, SAMPLE_INTERVAL, STARTUP_GRACE};

use super::commands::{execute, parse_request, Command, CommandResponse, Request};
use super::controller::{WidgetController, WidgetPosition, SYNC_INTERVAL, WIDGET_HEIGHT, WIDGET_WIDTH};
use super::html::get_widget_html;

static REGISTER_WIDGET_CLASS: Once = Once::new();

// Messages
const WM_APP_IPC: u32 = WM_USER + 301;
const WM_APP_WORKER_DONE: u32 = WM_USER + 302;

// Timers
const TIMER_GRACE: usize = 1;
const TIMER_OCCLUSION: usize = 2;
const TIMER_SYNC: usize = 3;

lazy_static::lazy_static! {
    /// Raw IPC bodies from the page, drained on `WM_APP_IPC`.
    static ref IPC_INBOX: Mutex<VecDeque<String>> = Mutex::new(VecDeque::new());
}

thread_local! {
    static WIDGET_WEBVIEW: RefCell<Option<WebView>> = RefCell::new(None);
    static WIDGET_WEB_CONTEXT: RefCell<Option<WebContext>> = RefCell::new(None);
    static HOST: RefCell<Option<Host>> = RefCell::new(None);
}

/// Wrapper for HWND to implement HasWindowHandle
struct HwndWrapper(HWND);
unsafe impl Send for HwndWrapper {}
unsafe impl Sync for HwndWrapper {}

impl raw_window_handle::HasWindowHandle for HwndWrapper {
    fn window_handle(
        &self,
    ) -> std::result::Result<raw_window_handle::WindowHandle<'_>, raw_window_handle::HandleError>
    {
        let hwnd = std::num::NonZeroIsize::new(self.0 .0 as isize)
            .ok_or(raw_window_handle::HandleError::Unavailable)?;
        let raw = raw_window_handle::Win32WindowHandle::new(hwnd);
        let handle = raw_window_handle::RawWindowHandle::Win32(raw);
        unsafe { Ok(raw_window_handle::WindowHandle::borrow_raw(handle)) }
    }
}

enum WorkerResult {
    Command(Request, CommandResponse),
    Sync(SonarResult<FullState>),
    Availability(bool),
}

/// Side effects that re-enter the window procedure and therefore run after
/// the `HOST` borrow is released.
enum Effect {
    Show,
    Hide,
    MoveTo(WidgetPosition),
    StartMove,
}

struct Host {
    hwnd: HWND,
    controller: WidgetController,
    client: Arc<SonarClient>,
    source: Box<dyn WindowSource>,
    results_tx: Sender<WorkerResult>,
    results_rx: Receiver<WorkerResult>,
    sync_in_flight: bool,
    sonar_available: Option<bool>,
}

impl Host {
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce(&SonarClient) -> WorkerResult + Send + 'static,
    {
        let client = self.client.clone();
        let tx = self.results_tx.clone();
        let hwnd_val = self.hwnd.0 as isize;
        std::thread::spawn(move || {
            let result = job(&client);
            if tx.send(result).is_ok() {
                unsafe {
                    let _ = PostMessageW(
                        Some(HWND(hwnd_val as *mut _)),
                        WM_APP_WORKER_DONE,
                        WPARAM(0),
                        LPARAM(0),
                    );
                }
            }
        });
    }

    fn live_rect(&self) -> Option<ScreenRect> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(self.hwnd, &mut rect) }
            .ok()
            .map(|_| ScreenRect::new(rect.left, rect.top, rect.right, rect.bottom))
    }

    fn tick_occlusion(&mut self) -> Option<Effect> {
        let live = self.live_rect();
        let own = self.hwnd.0 as isize;
        match self.controller.sample_occlusion(self.source.as_ref(), own, live)? {
            Transition::Show => Some(Effect::Show),
            Transition::Hide => Some(Effect::Hide),
        }
    }

    fn start_sync(&mut self) {
        if self.sync_in_flight || self.controller.view().is_dragging() {
            return;
        }
        self.sync_in_flight = true;
        self.spawn(|client| WorkerResult::Sync(client.get_full_state()));
    }

    fn note_availability(&mut self, available: bool) {
        if self.sonar_available == Some(available) {
            return;
        }
        self.sonar_available = Some(available);
        if available {
            info!("Sonar is available");
        } else {
            warn!("SteelSeries Sonar not found, make sure GG is running");
        }
    }

    fn handle_ipc(&mut self, raw: &str) -> Option<Effect> {
        let request = match parse_request(raw) {
            Ok(request) => request,
            Err(response) => {
                debug!(body = raw, "rejected IPC message");
                run_script(&response.to_script());
                return None;
            }
        };

        let view = self.controller.view_mut();
        let effect = match &request.command {
            Command::DragStart => {
                view.begin_drag();
                None
            }
            Command::DragEnd => {
                view.end_drag();
                None
            }
            Command::StartMove => Some(Effect::StartMove),
            Command::SetVolume { channel, volume } => {
                view.set_local_volume(*channel, *volume);
                None
            }
            Command::SetMute { channel, muted } => {
                view.set_local_mute(*channel, *muted);
                None
            }
            _ => None,
        };

        if request.command.is_local() {
            run_script(&CommandResponse::ok(request.id).to_script());
        } else {
            self.spawn(move |client| {
                let response = execute(client, &request);
                WorkerResult::Command(request, response)
            });
        }
        effect
    }

    fn drain_results(&mut self) {
        while let Ok(result) = self.results_rx.try_recv() {
            match result {
                WorkerResult::Command(request, response) => {
                    if let Command::SetMute { channel, muted } = request.command {
                        if !response.success {
                            if let Some(patch) =
                                self.controller.view_mut().mute_rejected(channel, muted)
                            {
                                run_script(&patch.to_script());
                            }
                        }
                    }
                    run_script(&response.to_script());
                }
                WorkerResult::Sync(result) => {
                    self.sync_in_flight = false;
                    match result {
                        Ok(state) => {
                            self.note_availability(true);
                            for patch in self.controller.view_mut().reconcile(&state) {
                                run_script(&patch.to_script());
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, kind = ?e.kind(), "sync failed");
                            self.note_availability(false);
                        }
                    }
                }
                WorkerResult::Availability(available) => self.note_availability(available),
            }
        }
    }
}

fn run_script(script: &str) {
    WIDGET_WEBVIEW.with(|wv| {
        if let Some(webview) = wv.borrow().as_ref() {
            let _ = webview.evaluate_script(script);
        }
    });
}

fn with_host<R>(f: impl FnOnce(&mut Host) -> R) -> Option<R> {
    HOST.with(|cell| {
        let mut guard = cell.try_borrow_mut().ok()?;
        guard.as_mut().map(f)
    })
}

fn apply_effect(hwnd: HWND, effect: Effect) {
    unsafe {
        match effect {
            Effect::Show => {
                let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);
            }
            Effect::Hide => {
                let _ = ShowWindow(hwnd, SW_HIDE);
            }
            Effect::MoveTo(pos) => {
                let _ = SetWindowPos(
                    hwnd,
                    Some(HWND_TOPMOST),
                    pos.x,
                    pos.y,
                    WIDGET_WIDTH,
                    WIDGET_HEIGHT,
                    SWP_NOACTIVATE,
                );
            }
            Effect::StartMove => {
                let _ = ReleaseCapture();
                SendMessageW(
                    hwnd,
                    WM_NCLBUTTONDOWN,
                    Some(WPARAM(HTCAPTION as usize)),
                    Some(LPARAM(0)),
                );
            }
        }
    }
}

fn get_webview_data_dir() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR_NAME);
    path.push("webview_data");
    let _ = std::fs::create_dir_all(&path);
    path
}

/// Create the widget, then pump messages until the window is destroyed.
pub fn run(settings: WidgetSettings, settings_path: PathBuf) -> Result<()> {
    unsafe {
        // Initialize COM for the thread (Critical for WebView2/Wry)
        let _ = CoInitialize(None);
        let result = create_and_pump(settings, settings_path);
        let _ = CoUninitialize();
        result
    }
}

unsafe fn create_and_pump(settings: WidgetSettings, settings_path: PathBuf) -> Result<()> {
    let displays = get_displays();
    let primary = primary_display(&displays).copied();
    let mut controller = WidgetController::new(settings, settings_path);
    let start = controller.initial_position(primary.as_ref());

    let instance = GetModuleHandleW(None)?;
    let class_name = w!("SonarGlassWidget");

    REGISTER_WIDGET_CLASS.call_once(|| {
        let mut wc = WNDCLASSW::default();
        wc.lpfnWndProc = Some(widget_wnd_proc);
        wc.hInstance = instance.into();
        wc.hCursor = LoadCursorW(None, IDC_ARROW).unwrap_or_default();
        wc.lpszClassName = class_name;
        wc.style = CS_HREDRAW | CS_VREDRAW;
        wc.hbrBackground = HBRUSH(std::ptr::null_mut());
        let _ = RegisterClassW(&wc);
    });

    let hwnd = CreateWindowExW(
        WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE,
        class_name,
        w!("Sonar Glass Widget"),
        WS_POPUP,
        start.x,
        start.y,
        WIDGET_WIDTH,
        WIDGET_HEIGHT,
        None,
        None,
        Some(instance.into()),
        None,
    )?;

    let margins = MARGINS {
        cxLeftWidth: -1,
        cxRightWidth: -1,
        cyTopHeight: -1,
        cyBottomHeight: -1,
    };
    let _ = DwmExtendFrameIntoClientArea(hwnd, &margins);

    let wrapper = HwndWrapper(hwnd);
    let hwnd_val = hwnd.0 as isize;

    WIDGET_WEB_CONTEXT.with(|ctx| {
        if ctx.borrow().is_none() {
            *ctx.borrow_mut() = Some(WebContext::new(Some(get_webview_data_dir())));
        }
    });

    let webview = WIDGET_WEB_CONTEXT.with(|ctx| {
        let mut ctx_ref = ctx.borrow_mut();
        let builder = match ctx_ref.as_mut() {
            Some(web_ctx) => WebViewBuilder::new_with_web_context(web_ctx),
            None => WebViewBuilder::new(),
        };
        builder
            .with_transparent(true)
            .with_bounds(Rect {
                position: wry::dpi::Position::Physical(wry::dpi::PhysicalPosition::new(0, 0)),
                size: wry::dpi::Size::Physical(wry::dpi::PhysicalSize::new(
                    WIDGET_WIDTH as u32,
                    WIDGET_HEIGHT as u32,
                )),
            })
            .with_html(&get_widget_html())
            .with_ipc_handler(move |msg: wry::http::Request<String>| {
                if let Ok(mut inbox) = IPC_INBOX.lock() {
                    inbox.push_back(msg.body().clone());
                }
                let _ = PostMessageW(
                    Some(HWND(hwnd_val as *mut _)),
                    WM_APP_IPC,
                    WPARAM(0),
                    LPARAM(0),
                );
            })
            .build_as_child(&wrapper)
    });

    let webview = match webview {
        Ok(wv) => wv,
        Err(e) => {
            let _ = DestroyWindow(hwnd);
            return Err(anyhow!("failed to create webview: {}", e));
        }
    };
    WIDGET_WEBVIEW.with(|cell| *cell.borrow_mut() = Some(webview));

    // Validate where the window actually ended up.
    let mut rect = RECT::default();
    let actual = match GetWindowRect(hwnd, &mut rect) {
        Ok(()) => WidgetPosition {
            x: rect.left,
            y: rect.top,
        },
        Err(_) => start,
    };
    let reset = controller.startup(actual, primary.as_ref());

    let (results_tx, results_rx) = channel();
    let host = Host {
        hwnd,
        controller,
        client: Arc::new(SonarClient::new()),
        source: platform_source(),
        results_tx,
        results_rx,
        sync_in_flight: false,
        sonar_available: None,
    };
    host.spawn(|client| WorkerResult::Availability(client.check_availability()));
    HOST.with(|cell| *cell.borrow_mut() = Some(host));

    if let Some(pos) = reset {
        apply_effect(hwnd, Effect::MoveTo(pos));
    }
    apply_effect(hwnd, Effect::Show);

    // Occlusion polling starts after the grace period; syncing starts now.
    let _ = SetTimer(Some(hwnd), TIMER_GRACE, STARTUP_GRACE.as_millis() as u32, None);
    let _ = SetTimer(Some(hwnd), TIMER_SYNC, SYNC_INTERVAL.as_millis() as u32, None);
    with_host(|host| host.start_sync());

    info!(x = actual.x, y = actual.y, "Widget window created");

    let mut msg = MSG::default();
    while GetMessageW(&mut msg, None, 0, 0).into() {
        let _ = TranslateMessage(&msg);
        DispatchMessageW(&msg);
    }

    // Cleanup
    WIDGET_WEBVIEW.with(|cell| *cell.borrow_mut() = None);
    HOST.with(|cell| *cell.borrow_mut() = None);
    Ok(())
}

unsafe extern "system" fn widget_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_APP_IPC => {
            loop {
                let next = IPC_INBOX.lock().ok().and_then(|mut inbox| inbox.pop_front());
                let Some(raw) = next else { break };
                if let Some(Some(effect)) = with_host(|host| host.handle_ipc(&raw)) {
                    apply_effect(hwnd, effect);
                }
            }
            LRESULT(0)
        }
        WM_APP_WORKER_DONE => {
            with_host(|host| host.drain_results());
            LRESULT(0)
        }
        WM_TIMER => {
            match wparam.0 {
                TIMER_GRACE => {
                    let _ = KillTimer(Some(hwnd), TIMER_GRACE);
                    let _ = SetTimer(
                        Some(hwnd),
                        TIMER_OCCLUSION,
                        SAMPLE_INTERVAL.as_millis() as u32,
                        None,
                    );
                }
                TIMER_OCCLUSION => {
                    if let Some(Some(effect)) = with_host(|host| host.tick_occlusion()) {
                        apply_effect(hwnd, effect);
                    }
                }
                TIMER_SYNC => {
                    with_host(|host| host.start_sync());
                }
                _ => {}
            }
            LRESULT(0)
        }
        WM_EXITSIZEMOVE => {
            let mut rect = RECT::default();
            if GetWindowRect(hwnd, &mut rect).is_ok() {
                with_host(|host| host.controller.on_moved(rect.left, rect.top));
            }
            LRESULT(0)
        }
        WM_SHOWWINDOW => {
            if wparam.0 != 0 {
                with_host(|host| host.controller.on_shown_by_system());
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        WM_SYSCOMMAND => {
            if (wparam.0 & 0xFFF0) as u32 == SC_RESTORE {
                with_host(|host| host.controller.on_shown_by_system());
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        WM_MOUSEACTIVATE => LRESULT(MA_NOACTIVATE as isize),
        WM_DESTROY => {
            let _ = KillTimer(Some(hwnd), TIMER_GRACE);
            let _ = KillTimer(Some(hwnd), TIMER_OCCLUSION);
            let _ = KillTimer(Some(hwnd), TIMER_SYNC);
            PostQuitMessage(0);
            LRESULT(0)
        }
        WM_ERASEBKGND => LRESULT(1),
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
