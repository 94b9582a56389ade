pub mod data_fetcher;
pub mod fetch_cache;
pub mod recorder;
pub mod scoreboard;
pub mod sync;

pub use data_fetcher::*;
pub use fetch_cache::*;
pub use recorder::*;
pub use scoreboard::*;
pub use sync::*;
