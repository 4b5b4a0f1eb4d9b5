#![forbid(unsafe_code)]

use path_absolutize::Absolutize;
use std::ops::Deref;
use std::path::Path;
use chrono::{Utc, DateTime, SecondsFormat, FixedOffset, ParseError};

use poem::Request;

use log::{debug, LevelFilter};

// ***************************************************************************
// GENERAL PUBLIC FUNCTIONS
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_absolute_path:
// ---------------------------------------------------------------------------
/** Replace tilde (~) and environment variable values in a path name and
 * then construct the absolute path name.  Unlike canonicalize, absolutize
 * does not care whether the file exists.  On any failure the original
 * path is returned unchanged.
 */
pub fn get_absolute_path(path: &str) -> String {
    // Replace ~ and environment variable values if possible.
    let s = match shellexpand::full(path) {
        Ok(x) => x,
        Err(_) => return path.to_owned(),
    };

    // Convert to absolute path if necessary.
    let p = Path::new(s.deref());
    let p1 = match p.absolutize() {
        Ok(x) => x,
        Err(_) => return path.to_owned(),
    };
    let p2 = match p1.to_str() {
        Some(x) => x,
        None => return path.to_owned(),
    };

    p2.to_owned()
}

// ---------------------------------------------------------------------------
// timestamp_utc:
// ---------------------------------------------------------------------------
/** Get the current UTC timestamp */
pub fn timestamp_utc() -> DateTime<Utc> {
    Utc::now()
}

// ---------------------------------------------------------------------------
// timestamp_str:
// ---------------------------------------------------------------------------
/** Get the current UTC timestamp as a string in rfc3339 format with
 * millisecond precision, which looks like this:  2026-10-19T08:15:30.123Z
 */
pub fn timestamp_str() -> String {
    timestamp_utc_to_str(timestamp_utc())
}

// ---------------------------------------------------------------------------
// timestamp_utc_to_str:
// ---------------------------------------------------------------------------
pub fn timestamp_utc_to_str(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---------------------------------------------------------------------------
// timestamp_str_to_datetime:
// ---------------------------------------------------------------------------
/** Convert a timestamp string in rfc3339 format to a DateTime object.  The
 * result will contain a parse error if the string does not conform to rfc3339.
 */
#[allow(dead_code)]
pub fn timestamp_str_to_datetime(ts: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    DateTime::parse_from_rfc3339(ts)
}

// ---------------------------------------------------------------------------
// coerce_user_id:
// ---------------------------------------------------------------------------
/** Lenient conversion of a path segment into a user id.
 *
 * Leading whitespace and a single sign are accepted, then the leading run of
 * decimal digits is used and anything after it is ignored, so "12abc" is 12.
 * A "0x" or "0X" prefix switches to hexadecimal, so "0x1f" is 31.  A segment
 * without leading digits, or one whose digits overflow, yields None.  Handlers answer None with 404 (not 400): clients depend on an
 * unparseable id looking exactly like an unknown one.
 */
pub fn coerce_user_id(segment: &str) -> Option<i64> {
    let s = segment.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, rest) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        _ => (10, rest),
    };

    let digits_len = rest.bytes().take_while(|b| (*b as char).is_digit(radix)).count();
    if digits_len == 0 {
        return None;
    }

    let value = i64::from_str_radix(&rest[..digits_len], radix).ok()?;
    Some(if negative {-value} else {value})
}

// ***************************************************************************
//                                  Traits
// ***************************************************************************
pub trait RequestDebug {
    type Req;
    fn get_request_info(&self) -> String;
}

// ---------------------------------------------------------------------------
// debug_request:
// ---------------------------------------------------------------------------
// Dump http request information to the log.
pub fn debug_request(http_req: &Request, req: &impl RequestDebug) {
    // Check that debug or higher logging is in effect.
    let level = log::max_level();
    if level < LevelFilter::Debug {
        return;
    }

    // Accumulate the output.
    let mut s = "\n".to_string();

    // Restate the URI.
    let uri = http_req.uri();
    s += format!("  {} URI: {:?}\n", http_req.method(), uri).as_str();

    // Accumulate the headers
    for (name, value) in http_req.headers().iter() {
         s += format!("  Header: {} = {:?} \n", name, value).as_str();
    };

    // List query parameters.
    if let Some(q) = uri.query() {
        s += format!("  Query Parameters: {:?}\n", q).as_str();
    } else {
        s += "  * No Query Parameters\n";
    }

    // Add the request's information.
    s += req.get_request_info().as_str();

    // Write the single log record.
    debug!("{}", s);
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_accepts_plain_and_prefixed_digits() {
        assert_eq!(coerce_user_id("42"), Some(42));
        assert_eq!(coerce_user_id("12abc"), Some(12));
        assert_eq!(coerce_user_id("  7"), Some(7));
        assert_eq!(coerce_user_id("+3"), Some(3));
        assert_eq!(coerce_user_id("-5"), Some(-5));
        assert_eq!(coerce_user_id("3.9"), Some(3));
    }

    #[test]
    fn coerce_reads_hex_prefix() {
        assert_eq!(coerce_user_id("0x2"), Some(2));
        assert_eq!(coerce_user_id("0X1f"), Some(31));
        assert_eq!(coerce_user_id("-0x2"), Some(-2));
        assert_eq!(coerce_user_id("0x1g"), Some(1));
        assert_eq!(coerce_user_id("0x"), None);
        assert_eq!(coerce_user_id("0xg"), None);
        assert_eq!(coerce_user_id("0x8000000000000000"), None);
    }

    #[test]
    fn coerce_rejects_segments_without_leading_digits() {
        assert_eq!(coerce_user_id("abc"), None);
        assert_eq!(coerce_user_id(""), None);
        assert_eq!(coerce_user_id("-"), None);
        assert_eq!(coerce_user_id("x12"), None);
        assert_eq!(coerce_user_id("99999999999999999999"), None);
    }

    #[test]
    fn timestamps_round_trip_through_rfc3339() {
        let s = timestamp_str();
        assert!(s.ends_with('Z'));
        assert!(timestamp_str_to_datetime(&s).is_ok());
    }

    #[test]
    fn absolute_path_expands_relative_input() {
        let p = get_absolute_path("some/dir");
        assert!(Path::new(&p).is_absolute());
        assert!(p.ends_with("some/dir"));
    }
}
