//! Plane states encoded in image file names:
//! `set_<unix-seconds>_<center>_<zoom>_<color-mode>_.png`, with the centre
//! written as `(re+imi)`.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use tilebrot_core::{Complex, CoreError, PlaneState};

const PREFIX: &str = "set";
const MIN_FIELDS: usize = 5;

#[derive(Debug, Error)]
pub enum PlaneNameError {
    #[error("file name does not start with \"set_\"")]
    MissingPrefix,

    #[error("file name has {0} fields, expected at least 5")]
    TooFewFields(usize),

    #[error("unreadable center {0:?}")]
    Center(String),

    #[error("unreadable zoom {0:?}")]
    Zoom(String),

    #[error("unreadable color mode {0:?}")]
    ColorMode(String),

    #[error(transparent)]
    Invalid(#[from] CoreError),
}

/// File name for `state`, stamped with `timestamp` (seconds since the Unix
/// epoch).
pub fn encode(state: &PlaneState, timestamp: u64) -> String {
    format!(
        "{PREFIX}_{timestamp}_{}_{}_{}_.png",
        format_center(state.center()),
        state.zoom(),
        state.color_mode().index()
    )
}

/// [`encode`] stamped with the current time.
pub fn file_name_now(state: &PlaneState) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    encode(state, now)
}

/// Read a plane state back out of a file name or path. All three fields
/// are parsed and validated before anything is returned.
pub fn decode(name: &str) -> Result<PlaneState, PlaneNameError> {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);

    let parts: Vec<&str> = base.split('_').collect();
    if parts.len() < MIN_FIELDS {
        return Err(PlaneNameError::TooFewFields(parts.len()));
    }
    if parts[0] != PREFIX {
        return Err(PlaneNameError::MissingPrefix);
    }

    let center = parse_complex(parts[2]).ok_or_else(|| PlaneNameError::Center(parts[2].into()))?;
    let zoom: f64 = parts[3]
        .parse()
        .map_err(|_| PlaneNameError::Zoom(parts[3].into()))?;
    let color: i64 = parts[4]
        .parse()
        .map_err(|_| PlaneNameError::ColorMode(parts[4].into()))?;

    Ok(PlaneState::from_parts(center, zoom, color)?)
}

fn format_center(c: Complex) -> String {
    let sign = if c.im.is_sign_negative() { '-' } else { '+' };
    format!("({}{sign}{}i)", c.re, c.im.abs())
}

/// Parse `re`, `imi`, or `re±imi`, optionally wrapped in parentheses.
fn parse_complex(s: &str) -> Option<Complex> {
    let s = s
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(s);

    let Some(body) = s.strip_suffix('i') else {
        return s.parse().ok().map(|re| Complex::new(re, 0.0));
    };

    // The sign that starts the imaginary part; an exponent sign doesn't count.
    let bytes = body.as_bytes();
    let split = (1..bytes.len())
        .rev()
        .find(|&i| matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E'));

    match split {
        Some(i) => Some(Complex::new(
            body[..i].parse().ok()?,
            body[i..].parse().ok()?,
        )),
        None => body.parse().ok().map(|im| Complex::new(0.0, im)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilebrot_core::ColorMode;

    #[test]
    fn encodes_all_fields() {
        let state = PlaneState::new(Complex::new(-0.5, 0.0), 1.0, ColorMode::Logarithmic).unwrap();
        assert_eq!(encode(&state, 1700000000), "set_1700000000_(-0.5+0i)_1_0_.png");

        let state = PlaneState::new(Complex::new(0.25, -0.125), 2.5, ColorMode::Mirrored).unwrap();
        assert_eq!(encode(&state, 7), "set_7_(0.25-0.125i)_2.5_3_.png");
    }

    #[test]
    fn decodes_what_it_encodes() {
        let state =
            PlaneState::new(Complex::new(-0.743643887, 0.131825904), 1448.154, ColorMode::Cyclic)
                .unwrap();
        let name = encode(&state, 1);
        assert_eq!(decode(&name).unwrap(), state);
    }

    #[test]
    fn accepts_paths_and_exponents() {
        let state = decode("/tmp/images/set_1_(-1.5e-05+2E+01i)_4_2_.png").unwrap();
        assert_eq!(state.center(), Complex::new(-1.5e-5, 20.0));
        assert_eq!(state.zoom(), 4.0);
        assert_eq!(state.color_mode(), ColorMode::Linear);
    }

    #[test]
    fn accepts_purely_real_or_imaginary_centres() {
        assert_eq!(parse_complex("(2)"), Some(Complex::new(2.0, 0.0)));
        assert_eq!(parse_complex("-3i"), Some(Complex::new(0.0, -3.0)));
        assert_eq!(parse_complex("(1-2i)"), Some(Complex::new(1.0, -2.0)));
        assert_eq!(parse_complex("(x+2i)"), None);
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(matches!(
            decode("set_1_(0+0i)_1.png"),
            Err(PlaneNameError::TooFewFields(4))
        ));
        assert!(matches!(
            decode("img_1_(0+0i)_1_0_.png"),
            Err(PlaneNameError::MissingPrefix)
        ));
        assert!(matches!(
            decode("set_1_(0+0i)_wide_0_.png"),
            Err(PlaneNameError::Zoom(_))
        ));
        assert!(matches!(
            decode("set_1_(0+0i)_1_x_.png"),
            Err(PlaneNameError::ColorMode(_))
        ));
    }

    #[test]
    fn out_of_range_values_reject_the_whole_name() {
        assert!(matches!(
            decode("set_1_(0+0i)_0_0_.png"),
            Err(PlaneNameError::Invalid(_))
        ));
        assert!(matches!(
            decode("set_1_(0+0i)_1_7_.png"),
            Err(PlaneNameError::Invalid(_))
        ));
        assert!(matches!(
            decode("set_1_(NaN+0i)_1_0_.png"),
            Err(PlaneNameError::Invalid(_))
        ));
    }
}
