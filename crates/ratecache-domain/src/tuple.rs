//! The bounded `(period, hotel, room)` tuple domain.
//!
//! Each axis is a small, closed enumeration. The default domain is
//! 4 periods x 3 hotels x 3 rooms = 36 combinations, matching the default
//! size named in the specification this cache implements.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::FieldError;

/// Season a rate is quoted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// Summer season.
    Summer,
    /// Autumn season.
    Autumn,
    /// Winter season.
    Winter,
    /// Spring season.
    Spring,
}

impl Period {
    /// All enumerated values, in declaration order.
    pub const ALL: [Period; 4] = [Period::Summer, Period::Autumn, Period::Winter, Period::Spring];

    fn as_str(&self) -> &'static str {
        match self {
            Period::Summer => "Summer",
            Period::Autumn => "Autumn",
            Period::Winter => "Winter",
            Period::Spring => "Spring",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| enumeration_error("period", &Period::ALL.map(|p| p.as_str())))
    }
}

/// Hotel property a rate is quoted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hotel {
    /// The `FloatingPointResort` property.
    FloatingPointResort,
    /// The `NullPointerInn` property.
    NullPointerInn,
    /// The `RecursionRetreat` property.
    RecursionRetreat,
}

impl Hotel {
    /// All enumerated values, in declaration order.
    pub const ALL: [Hotel; 3] = [
        Hotel::FloatingPointResort,
        Hotel::NullPointerInn,
        Hotel::RecursionRetreat,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Hotel::FloatingPointResort => "FloatingPointResort",
            Hotel::NullPointerInn => "NullPointerInn",
            Hotel::RecursionRetreat => "RecursionRetreat",
        }
    }
}

impl fmt::Display for Hotel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hotel {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hotel::ALL
            .iter()
            .copied()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| enumeration_error("hotel", &Hotel::ALL.map(|h| h.as_str())))
    }
}

/// Room category a rate is quoted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Room {
    /// The `SingletonRoom` category (one bed, booked by exactly one occupant at a time).
    SingletonRoom,
    /// The `FactoryRoom` category.
    FactoryRoom,
    /// The `ObserverSuite` category.
    ObserverSuite,
}

impl Room {
    /// All enumerated values, in declaration order.
    pub const ALL: [Room; 3] = [Room::SingletonRoom, Room::FactoryRoom, Room::ObserverSuite];

    fn as_str(&self) -> &'static str {
        match self {
            Room::SingletonRoom => "SingletonRoom",
            Room::FactoryRoom => "FactoryRoom",
            Room::ObserverSuite => "ObserverSuite",
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Room {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Room::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| enumeration_error("room", &Room::ALL.map(|r| r.as_str())))
    }
}

fn enumeration_error(field: &str, allowed: &[&str]) -> FieldError {
    FieldError::new(
        field,
        format!("The {field} field must be one of: {}.", allowed.join(", ")),
    )
}

/// A single rate lookup: the pre-condition of [`crate::RateKey::new`] is that
/// all three fields already come from validated enumerations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateRequest {
    /// Season.
    pub period: Period,
    /// Hotel.
    pub hotel: Hotel,
    /// Room category.
    pub room: Room,
}

impl RateRequest {
    /// Build a request from three already-typed enum values.
    pub fn new(period: Period, hotel: Hotel, room: Room) -> Self {
        Self { period, hotel, room }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_round_trips_through_display_and_from_str() {
        for p in Period::ALL {
            assert_eq!(p.to_string().parse::<Period>().unwrap(), p);
        }
    }

    #[test]
    fn unknown_period_lists_allowed_values() {
        let err = "summer-2024".parse::<Period>().unwrap_err();
        assert_eq!(err.field, "period");
        assert_eq!(
            err.messages,
            vec!["The period field must be one of: Summer, Autumn, Winter, Spring.".to_string()]
        );
    }

    #[test]
    fn domain_size_matches_default_budget() {
        assert_eq!(Period::ALL.len() * Hotel::ALL.len() * Room::ALL.len(), 36);
    }
}
