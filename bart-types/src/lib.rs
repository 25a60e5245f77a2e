//! Types for the BART legacy API (`api.bart.gov`), JSON rendering.
//!
//! The legacy API is an XML service with a JSON bridge (`&json=y`): every
//! scalar arrives as a string, XML attributes get an `@` prefix, and
//! repeated elements become arrays. These types absorb all of that, so
//! consumers see ordinary integers, floats, booleans and `chrono` times.

mod fns;
pub mod stations;
pub mod routes;
pub mod sched;
pub mod etd;
