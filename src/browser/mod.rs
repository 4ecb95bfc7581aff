pub mod chrome;
pub mod discover_page;
pub mod locator;

pub use chrome::{ChromeDriver, LaunchOptions};
pub use discover_page::DiscoverPage;
pub use locator::{LocatorChain, LocatorStrategy};
