//! livecap - live caption translation
//!
//! Resolves a YouTube URL to a video id, fetches the manual (or automatic)
//! caption track, cleans and translates it line by line through
//! LibreTranslate with an in-memory cache, and keeps the active caption in
//! step with a playback clock. The same pipeline is exposed over HTTP for
//! the browser overlay and on the command line.

pub mod caption;
pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod subtitle;
pub mod sync;
pub mod translate;
pub mod video_id;
pub mod workflow;
