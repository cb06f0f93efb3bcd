//! Ghost values at the edges of the global domain.

use std::fmt;
use std::str::FromStr;

use crate::error::DecompError;

/// What [`share`](crate::DecompGrid::share) writes into ghost cells
/// that face the edge of the global domain.
///
/// # Examples
///
/// ```
/// use strand_decomp::BoundaryPolicy;
///
/// assert_eq!("periodic".parse::<BoundaryPolicy>().unwrap(), BoundaryPolicy::Periodic);
/// assert_eq!("fixed:0.5".parse::<BoundaryPolicy>().unwrap(), BoundaryPolicy::Fixed(0.5));
/// assert_eq!(BoundaryPolicy::default(), BoundaryPolicy::Periodic);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum BoundaryPolicy {
    /// The domain wraps: edge ghosts hold the opposite end's interior.
    #[default]
    Periodic,
    /// Edge ghosts hold a constant.
    Fixed(f64),
    /// Edge ghosts mirror the interior layers next to the edge.
    Reflect,
}

impl BoundaryPolicy {
    /// Whether edge neighbors wrap around.
    pub fn is_periodic(&self) -> bool {
        matches!(self, Self::Periodic)
    }
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Periodic => write!(f, "periodic"),
            Self::Fixed(v) => write!(f, "fixed:{v}"),
            Self::Reflect => write!(f, "reflect"),
        }
    }
}

impl FromStr for BoundaryPolicy {
    type Err = DecompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DecompError::InvalidBoundary {
            value: s.to_string(),
        };
        match s.to_ascii_lowercase().as_str() {
            "periodic" => Ok(Self::Periodic),
            "reflect" => Ok(Self::Reflect),
            other => {
                let value = other.strip_prefix("fixed:").ok_or_else(invalid)?;
                value.parse().map(Self::Fixed).map_err(|_| invalid())
            }
        }
    }
}
