//! Platform heuristics for deciding which top-level windows can hide the widget.

/// `GWL_EXSTYLE` bits, duplicated here so the table stays platform-neutral.
pub const WS_EX_TOOLWINDOW: u32 = 0x0000_0080;
pub const WS_EX_APPWINDOW: u32 = 0x0004_0000;

/// Shell, tray and overlay classes that never count as covering windows.
pub const WINDOWS_IGNORED_CLASSES: &[&str] = &[
    "Progman",
    "WorkerW",
    "Shell_TrayWnd",
    "Shell_SecondaryTrayWnd",
    "NotifyIconOverflowWindow",
    "Windows.UI.Core.CoreWindow",
    "Xaml_WindowedPopupClass",
    "PopupHost",
    "TaskListThumbnailWnd",
    "MSTaskSwWClass",
    "MSTaskListWClass",
    "ToolbarWindow32",
    "TrayNotifyWnd",
    "SysPager",
    "ReBarWindow32",
    "Button",
    "tooltips_class32",
    "SysShadow",
    "#32768",
    "TaskManagerWindow",
    // WSL / Android subsystem helpers
    "CROSVM_1",
    "CROSVM_0",
];

#[derive(Debug, Clone)]
pub struct OcclusionRules {
    pub ignored_classes: Vec<String>,
    /// Class-name prefixes of framework helper windows (WPF `HwndWrapper[...]`).
    pub ignored_class_prefixes: Vec<String>,
    pub tool_window_style: u32,
    pub app_window_style: u32,
    /// Windows narrower or shorter than this are popups, not applications.
    pub min_size: (i32, i32),
    /// Chromium/Electron host classes also use the same class for tooltips
    /// and dropdowns; only their large windows count.
    pub large_app_classes: Vec<String>,
    pub large_app_min_size: (i32, i32),
}

impl OcclusionRules {
    pub fn windows() -> Self {
        Self {
            ignored_classes: WINDOWS_IGNORED_CLASSES.iter().map(|s| s.to_string()).collect(),
            ignored_class_prefixes: vec!["HwndWrapper[".to_string()],
            tool_window_style: WS_EX_TOOLWINDOW,
            app_window_style: WS_EX_APPWINDOW,
            min_size: (100, 100),
            large_app_classes: vec![
                "Chrome_WidgetWin_1".to_string(),
                "Chrome_WidgetWin_0".to_string(),
            ],
            large_app_min_size: (500, 400),
        }
    }

    pub fn is_ignored_class(&self, class_name: &str) -> bool {
        self.ignored_classes.iter().any(|c| c == class_name)
    }

    pub fn is_wrapper_class(&self, class_name: &str) -> bool {
        self.ignored_class_prefixes
            .iter()
            .any(|p| class_name.starts_with(p.as_str()))
    }

    /// Tool windows have no taskbar presence unless they also opt into it.
    pub fn is_tool_window(&self, ex_style: u32) -> bool {
        ex_style & self.tool_window_style != 0 && ex_style & self.app_window_style == 0
    }

    pub fn is_too_small(&self, width: i32, height: i32) -> bool {
        width < self.min_size.0 || height < self.min_size.1
    }

    pub fn is_small_large_app_popup(&self, class_name: &str, width: i32, height: i32) -> bool {
        self.large_app_classes.iter().any(|c| c == class_name)
            && (width < self.large_app_min_size.0 || height < self.large_app_min_size.1)
    }
}

impl Default for OcclusionRules {
    fn default() -> Self {
        Self::windows()
    }
}
