pub mod api;
pub mod browser;
pub mod checks;
pub mod compare;
pub mod config;
pub mod error;
pub mod normalize;
pub mod record;
pub mod report;
pub mod validate;

//  Re-export commonly used items
pub use api::{GenreApi, MovieApi, TmdbClient};
pub use browser::{ChromeDriver, DiscoverPage, LaunchOptions, LocatorChain, LocatorStrategy};
pub use compare::{compare, partial_matches, ComparisonReport, ParityVerdict, SideCheck};
pub use config::Config;
pub use error::{ParityError, Result};
pub use normalize::{normalize, Normalizer, RawRecord};
pub use record::{FilterParams, NormalizedKey, Record, ResultSet, SortKey, Source};
pub use report::{RunReport, SurveyRow};
pub use validate::{validate_ascending, validate_range, ReasonCode, Violation};
