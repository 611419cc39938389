//! The mixer widget: controller state, the page it renders, the IPC
//! protocol between the two, and the native host window.

pub mod commands;
pub mod controller;
pub mod html;
pub mod mixer_view;
#[cfg(windows)]
pub mod window;

pub use commands::{Command, CommandResponse, Request};
pub use controller::{WidgetController, WidgetPosition};
pub use mixer_view::{MixerView, ViewPatch};
