//! Review ratings and star rendering.

use serde::{Deserialize, Serialize};

/// Number of stars shown for any rating.
pub const MAX_STARS: u8 = 5;

/// Errors that can occur when constructing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingError {
    /// No stars were selected.
    #[error("rating is required")]
    Missing,
    /// The value is outside 1..=5.
    #[error("rating must be between 1 and {MAX_STARS}, got {0}")]
    OutOfRange(i64),
}

/// A review rating: a whole number of stars from 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    /// Validate a star count.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::Missing`] for 0 (the form's "nothing selected"
    /// value) and [`RatingError::OutOfRange`] for anything else outside 1..=5.
    pub fn new(stars: i64) -> Result<Self, RatingError> {
        match stars {
            0 => Err(RatingError::Missing),
            1..=5 => Ok(Self(u8::try_from(stars).map_err(|_| RatingError::OutOfRange(stars))?)),
            _ => Err(RatingError::OutOfRange(stars)),
        }
    }

    /// Number of stars.
    #[must_use]
    pub const fn stars(&self) -> u8 {
        self.0
    }

    /// Star fills for rendering this rating.
    #[must_use]
    pub fn fills(&self) -> Vec<StarFill> {
        star_fills(f64::from(self.0))
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        Self::from(rating.0)
    }
}

/// How a single star is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarFill {
    Full,
    Half,
    Empty,
}

impl StarFill {
    /// CSS class used by the templates.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Full => "star star-full",
            Self::Half => "star star-half",
            Self::Empty => "star star-empty",
        }
    }
}

/// Star fills for a (possibly fractional) average rating.
///
/// Position `i` is full when `i < floor(rating)`, half when `i < rating`,
/// and empty otherwise.
#[must_use]
pub fn star_fills(rating: f64) -> Vec<StarFill> {
    let whole = rating.floor();
    (0..MAX_STARS)
        .map(|i| {
            let i = f64::from(i);
            if i < whole {
                StarFill::Full
            } else if i < rating {
                StarFill::Half
            } else {
                StarFill::Empty
            }
        })
        .collect()
}

/// Format an average rating with one decimal, e.g. `4.5`.
#[must_use]
pub fn format_rating(rating: f64) -> String {
    format!("{rating:.1}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert_eq!(Rating::new(0), Err(RatingError::Missing));
        assert_eq!(Rating::new(6), Err(RatingError::OutOfRange(6)));
        assert_eq!(Rating::new(-1), Err(RatingError::OutOfRange(-1)));
        assert_eq!(Rating::new(5).unwrap().stars(), 5);
    }

    #[test]
    fn test_rating_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Rating>("3").is_ok());
        assert!(serde_json::from_str::<Rating>("9").is_err());
        assert_eq!(serde_json::to_string(&Rating::new(4).unwrap()).unwrap(), "4");
    }

    #[test]
    fn test_star_fills_fractional() {
        use StarFill::{Empty, Full, Half};
        assert_eq!(star_fills(4.5), vec![Full, Full, Full, Full, Half]);
        assert_eq!(star_fills(3.0), vec![Full, Full, Full, Empty, Empty]);
        assert_eq!(star_fills(0.0), vec![Empty; 5]);
        assert_eq!(star_fills(4.7), vec![Full, Full, Full, Full, Half]);
    }

    #[test]
    fn test_format_rating() {
        assert_eq!(format_rating(4.0), "4.0");
        assert_eq!(format_rating(4.75), "4.8");
    }
}
