//! Browser-session backends.

pub mod webdriver;

pub use webdriver::WebDriverBrowser;
