//! Turns raw, untyped request input into a validated [`RateRequest`].
//!
//! Each of the three fields is checked independently so a caller sees every
//! offending field in one response rather than one at a time, matching the
//! partial-failure shape of `ValidationErrors`.

use std::str::FromStr;

use ratecache_domain::{FieldError, Hotel, Period, RateRequest, Room, ValidationErrors};

/// Validate the three raw query parameters of a pricing request.
pub fn validate_request(
    period: &str,
    hotel: &str,
    room: &str,
) -> Result<RateRequest, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let period = parse_field::<Period>(period, &mut errors);
    let hotel = parse_field::<Hotel>(hotel, &mut errors);
    let room = parse_field::<Room>(room, &mut errors);

    match (period, hotel, room) {
        (Some(period), Some(hotel), Some(room)) => Ok(RateRequest::new(period, hotel, room)),
        _ => Err(errors),
    }
}

fn parse_field<T>(raw: &str, errors: &mut ValidationErrors) -> Option<T>
where
    T: FromStr<Err = FieldError>,
{
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}
