//! Browser session management and the session driver interface
//!
//! - [`SessionDriver`]: what the harvester needs from a browser
//! - [`BrowserSession`]: a Chrome/Chromium implementation over CDP
//! - [`LaunchOptions`] / [`ConnectionOptions`]: how to start or attach to Chrome

pub mod config;
pub mod driver;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use driver::{ActionResult, ExtractionResult, SessionDriver};
pub use session::BrowserSession;
