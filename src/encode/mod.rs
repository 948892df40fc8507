//! Value codecs between raw parameter space and the unit interval.
//!
//! Bounded parameters map linearly over their declared interval. Ordinal
//! parameters map by option index. Unbounded parameters have no declared
//! range: their envelope is derived from the pair's own history plus
//! padding and is recomputed on every call, never stored. Ratings map
//! 1..=10 onto [0, 1].

use crate::schema::{ParamSpec, ParamValue};

/// Encode a bounded-continuous value: (v - min) / (max - min).
///
/// Values outside [min, max] are accepted arithmetically; no clamping on
/// encode.
#[must_use]
pub fn encode_bounded(v: f64, min: f64, max: f64) -> f64 {
    (v - min) / (max - min)
}

/// Decode a bounded-continuous sample: linear map, snapped to the nearest
/// step multiple, clamped into [min, max].
#[must_use]
pub fn decode_bounded(u: f64, min: f64, max: f64, step: f64) -> f64 {
    let raw = min + u * (max - min);
    let snapped = (raw / step).round() * step;
    snapped.clamp(min, max)
}

/// Encode an ordinal option by index. Unknown options and single-option
/// lists both encode to 0.
#[must_use]
pub fn encode_ordinal(value: &str, options: &[String]) -> f64 {
    if options.len() <= 1 {
        return 0.0;
    }
    options.iter().position(|o| o.as_str() == value).map_or(0.0, |i| {
        i as f64 / (options.len() - 1) as f64
    })
}

/// Decode an ordinal sample to the nearest option.
#[must_use]
pub fn decode_ordinal(u: f64, options: &[String]) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let last = options.len() - 1;
    let idx = ((u * last as f64).round() as usize).min(last);
    Some(options[idx].clone())
}

/// Canonical normalized position of ordinal option `index`.
#[must_use]
pub fn ordinal_position(index: usize, option_count: usize) -> f64 {
    if option_count <= 1 {
        0.0
    } else {
        index as f64 / (option_count - 1) as f64
    }
}

/// Padded envelope over a non-empty set of raw values.
///
/// Degenerate sets (all values equal) widen to ±1 around the value so the
/// linear map stays well-defined.
fn padded_envelope(values: &[f64], padding: f64) -> (f64, f64) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi > lo {
        let pad = (hi - lo) * padding;
        (lo - pad, hi + pad)
    } else {
        (lo - 1.0, lo + 1.0)
    }
}

/// Encode an unbounded-continuous value against the pair's history.
///
/// The envelope covers the historical values *and* the new value, so the
/// result always lies in [0, 1].
#[must_use]
pub fn encode_unbounded(v: f64, history: &[f64], padding: f64) -> f64 {
    let mut values = Vec::with_capacity(history.len() + 1);
    values.extend_from_slice(history);
    values.push(v);
    let (lo, hi) = padded_envelope(&values, padding);
    (v - lo) / (hi - lo)
}

/// Decode an unbounded-continuous sample against the pair's history.
///
/// The envelope covers historical values only. With no history the declared
/// default (or 0) is returned. Results are rounded to two decimal places.
#[must_use]
pub fn decode_unbounded(u: f64, history: &[f64], padding: f64, default: Option<f64>) -> f64 {
    if history.is_empty() {
        return default.unwrap_or(0.0);
    }
    let (lo, hi) = padded_envelope(history, padding);
    round2(lo + u * (hi - lo))
}

/// Encode one raw value for the given parameter kind.
///
/// Returns `None` for free-text parameters and for values whose variant
/// does not carry the payload the kind needs.
#[must_use]
pub fn encode_value(
    spec: &ParamSpec,
    value: &ParamValue,
    history: &[f64],
    padding: f64,
) -> Option<f64> {
    match spec {
        ParamSpec::Bounded { min, max, .. } => {
            value.as_number().map(|v| encode_bounded(v, *min, *max))
        }
        ParamSpec::Unbounded { .. } => value
            .as_number()
            .map(|v| encode_unbounded(v, history, padding)),
        ParamSpec::Ordinal { options, .. } => {
            value.as_text().map(|v| encode_ordinal(v, options))
        }
        ParamSpec::FreeText { .. } => None,
    }
}

/// Decode one normalized component for the given parameter kind.
///
/// Returns `None` for free-text parameters.
#[must_use]
pub fn decode_component(
    spec: &ParamSpec,
    u: f64,
    history: &[f64],
    padding: f64,
) -> Option<ParamValue> {
    match spec {
        ParamSpec::Bounded {
            min, max, step, ..
        } => Some(ParamValue::Bounded(decode_bounded(u, *min, *max, *step))),
        ParamSpec::Unbounded { default } => Some(ParamValue::Unbounded(decode_unbounded(
            u, history, padding, *default,
        ))),
        ParamSpec::Ordinal { options, .. } => decode_ordinal(u, options).map(ParamValue::Ordinal),
        ParamSpec::FreeText { .. } => None,
    }
}

/// Normalize a rating from 1..=10 onto [0, 1].
#[must_use]
pub fn normalize_rating(rating: u8) -> f64 {
    f64::from(rating.saturating_sub(1)) / 9.0
}

/// Denormalize a predicted mean back onto the 1..=10 rating scale.
///
/// Clamped into [1, 10]: the GP mean can overshoot the data slightly and
/// the reported rating has to stay on the scale.
#[must_use]
pub fn denormalize_rating(normalized: f64) -> f64 {
    (9.0 * normalized + 1.0).clamp(1.0, 10.0)
}

/// Denormalize a standard deviation into rating units.
#[must_use]
pub fn denormalize_std_dev(normalized: f64) -> f64 {
    9.0 * normalized
}

/// Round to two decimal places.
#[must_use]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Falsification: bounded round-trip lands within one step.
        #[test]
        fn prop_bounded_roundtrip_within_step(
            v in 0.0f64..10.0,
            step in 0.1f64..2.0,
        ) {
            let u = encode_bounded(v, 0.0, 10.0);
            let back = decode_bounded(u, 0.0, 10.0, step);
            prop_assert!((back - v).abs() <= step / 2.0 + 1e-9);
        }

        /// Falsification: ordinal round-trip is exact.
        #[test]
        fn prop_ordinal_roundtrip_exact(n in 1usize..8, pick in 0usize..8) {
            let options: Vec<String> = (0..n).map(|i| format!("opt{i}")).collect();
            let pick = pick % n;
            let u = encode_ordinal(&options[pick], &options);
            let back = decode_ordinal(u, &options).unwrap();
            prop_assert_eq!(back, options[pick].clone());
        }

        /// Falsification: unbounded encode always lands in [0, 1].
        #[test]
        fn prop_unbounded_encode_unit_interval(
            v in -1000.0f64..1000.0,
            history in prop::collection::vec(-1000.0f64..1000.0, 0..16),
            padding in 0.0f64..1.0,
        ) {
            let u = encode_unbounded(v, &history, padding);
            prop_assert!((0.0..=1.0).contains(&u), "u = {}", u);
        }

        /// Falsification: with two or more distinct historical values the
        /// unbounded round-trip holds to two decimal places.
        #[test]
        fn prop_unbounded_roundtrip_two_places(
            v in -100.0f64..100.0,
            lo in -100.0f64..-1.0,
            hi in 1.0f64..100.0,
        ) {
            // History spans [lo, hi]; a value inside the *decode* envelope
            // does not move the encode envelope, so the maps agree.
            let history = [lo, hi];
            let v = v.clamp(lo, hi);
            let u = encode_unbounded(v, &history, 0.2);
            let back = decode_unbounded(u, &history, 0.2, None);
            prop_assert!((back - v).abs() <= 0.005 + 1e-9, "v = {}, back = {}", v, back);
        }

        /// Falsification: rating round-trip is exact on the scale.
        #[test]
        fn prop_rating_roundtrip(r in 1u8..=10) {
            let back = denormalize_rating(normalize_rating(r));
            prop_assert!((back - f64::from(r)).abs() < 1e-9);
        }
    }
}
