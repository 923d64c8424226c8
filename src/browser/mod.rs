//! Browser platform backed by a WebDriver session.
//!
//! `BrowserTabs` turns polled window state into tab updates and runs content
//! scripts in those windows.

mod injector;
pub mod session;
pub mod tabs;

pub use session::connect;
pub use tabs::{BrowserTabs, TabRegistry};
