//! Demo records used for seeding a fresh table.

use rust_decimal::Decimal;

use super::types::Movie;

/// The two movies written by the demo scenario.
///
/// # Example
///
/// ```
/// use movies_core::movie::demo_movies;
///
/// let movies = demo_movies();
/// assert_eq!(movies.len(), 2);
/// assert_eq!(movies[0].title, "The Matrix");
/// ```
pub fn demo_movies() -> Vec<Movie> {
    vec![
        Movie::new(
            1999,
            "The Matrix",
            "A computer hacker learns about the true nature of reality and his role in the war \
             against its controllers.",
            Decimal::new(87, 1),
        ),
        Movie::new(
            1994,
            "The Shawshank Redemption",
            "Two imprisoned",
            Decimal::new(87, 1),
        ),
    ]
}
