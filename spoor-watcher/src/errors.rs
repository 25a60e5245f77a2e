//! Basic error handling.

pub use failure::Error;
use failure_derive::Fail;
use reqwest::Error as ReqwestError;
use spoor_util::http::StatusCode;
use spoor_util::impl_from_for_error;

/// Error that could occur while polling the feed or processing a request.
///
/// The first three variants are data-integrity conditions: a live estimate
/// that cannot be mapped onto the static schedule. Their scope is a single
/// estimate; the cycle carries on without it. `Upstream` and `BadStatus`
/// abort the whole cycle instead, leaving previous state untouched.
#[derive(Fail, Debug)]
pub enum WatchError {
    /// No scheduled train visits the origin strictly before the destination.
    #[fail(display = "no scheduled route visits {} before {}", origin, dest)]
    NoCandidateRoute {
        origin: String,
        dest: String
    },
    /// The origin has no following stop on the candidate route.
    #[fail(display = "no stop after {} on route {}", origin, route)]
    NoNextStop {
        origin: String,
        route: u32
    },
    /// The travel-time model has no average for a segment it should cover.
    #[fail(display = "no average travel time for {} on route {}", segment, route)]
    NoSegmentAverage {
        segment: String,
        route: u32
    },
    /// The given entity was not found.
    #[fail(display = "not found")]
    NotFound,
    /// The API path doesn't exist.
    #[fail(display = "invalid path")]
    InvalidPath,
    /// The BART API answered with a non-2xx status.
    #[fail(display = "BART API returned status {}", _0)]
    BadStatus(u16),
    /// reqwest error.
    #[fail(display = "reqwest: {}", _0)]
    Upstream(ReqwestError)
}

impl StatusCode for WatchError {
    fn status_code(&self) -> u16 {
        use self::WatchError::*;

        match *self {
            NotFound => 404,
            InvalidPath => 400,
            BadStatus(_) => 502,
            Upstream(_) => 502,
            _ => 500
        }
    }
}

impl_from_for_error!(WatchError,
                     ReqwestError => Upstream);

pub type WatchResult<T> = ::std::result::Result<T, WatchError>;
pub type Result<T, E = Error> = ::std::result::Result<T, E>;
