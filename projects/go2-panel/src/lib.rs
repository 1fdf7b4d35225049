//! Headless control panel client for a Go2 teleoperation backend.
//!
//! The two long-running pieces are the [`stream::connector::StreamConnector`],
//! which keeps the log/gamepad feed attached across disconnects, and the
//! [`camera::selector::CameraFeedSelector`], which settles once per session on
//! continuous MJPEG or single-frame polling. [`api::client::PanelApi`] covers
//! the one-shot HTTP actions.

pub mod api;
pub mod camera;
pub mod config;
pub mod core;
pub mod panel;
pub mod stream;

#[cfg(test)]
mod test_support;
