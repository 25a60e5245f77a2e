//! Deserializer helpers for the API's stringly-typed scalars.

use chrono::NaiveTime;
use serde::*;
use std::fmt::Display;
use std::str::FromStr;

use crate::etd::LEAVING;

pub fn parse_str_num<'de, D, T>(d: D) -> Result<T, D::Error>
where D: Deserializer<'de>, T: FromStr, T::Err: Display {
    let x: String = Deserialize::deserialize(d)?;
    x.trim().parse()
        .map_err(|e| de::Error::custom(format!("failed to parse a number {:?}: {}", x, e)))
}
pub fn parse_opt_num<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where D: Deserializer<'de>, T: FromStr {
    Deserialize::deserialize(d)
        .map(|x: Option<String>| x.and_then(|x| x.trim().parse().ok()))
}
pub fn parse_flag<'de, D>(d: D) -> Result<bool, D::Error> where D: Deserializer<'de> {
    let x: String = Deserialize::deserialize(d)?;
    Ok(x.trim() == "1")
}
/// Parses the ETD `minutes` field, which is either a numeral string or the
/// word `Leaving`; the latter maps to the [`LEAVING`] sentinel.
pub fn parse_minutes<'de, D>(d: D) -> Result<i32, D::Error> where D: Deserializer<'de> {
    let x: String = Deserialize::deserialize(d)?;
    let x = x.trim();
    if x.eq_ignore_ascii_case("leaving") {
        return Ok(LEAVING);
    }
    x.parse()
        .map_err(|e| de::Error::custom(format!("failed to parse minutes {:?}: {}", x, e)))
}
pub fn str_to_sched_time(x: &str) -> Option<NaiveTime> {
    let x = x.trim();
    if x.is_empty() {
        return None;
    }
    NaiveTime::parse_from_str(x, "%I:%M %p").ok()
}
/// Parses a schedule `origTime` ("5:13 AM"). The attribute is omitted, or
/// empty, at stations the train runs through without calling.
pub fn parse_sched_time<'de, D>(d: D) -> Result<Option<NaiveTime>, D::Error> where D: Deserializer<'de> {
    Deserialize::deserialize(d)
        .map(|x: Option<String>| {
            x.as_ref().and_then(|x| str_to_sched_time(x))
        })
}
