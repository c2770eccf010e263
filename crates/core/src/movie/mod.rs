mod error;
mod mock_data;
mod types;

pub use error::YearRangeError;
pub use mock_data::demo_movies;
pub use types::{Movie, MovieInfo, MovieKey, MovieSummary, UpdatedInfo, YearRange};
