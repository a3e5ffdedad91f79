//! Numeric aggregation over feature properties
//!
//! An [`AggregationSpec`] maps a property name to the operators requested for it. Operators are
//! parsed from their names (`count`, `sum`, `avg`, `min`, `max`, `percentile_K`), evaluated over
//! the finite numeric values of that property, and returned keyed by the requested name.
//!
//! Bad requests degrade instead of failing the batch:
//! - an unrecognised operator name is logged and omitted from the result;
//! - a `percentile_K` whose K is not an integer in `0..=100` is logged and evaluates to 0.
//!   K is parsed as an unsigned integer, so `percentile_+50` and `percentile_050` both mean 50.
//!
//! # Empty value sets
//!
//! When no feature carries a finite value for the property, `count` is 0 and `sum` is 0,
//! `avg` is NaN (callers must check `count` before trusting it), and `min`, `max` and valid
//! percentiles are `None`.

use crate::Feature;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Requested operators per property name
pub type AggregationSpec = BTreeMap<String, Vec<String>>;

/// Operator name to value, for one property; `None` means the value is undefined
pub type PropertyAggregates = BTreeMap<String, Option<f64>>;

/// Property name to its aggregates
pub type AggregationResult = BTreeMap<String, PropertyAggregates>;

/// Prefix of percentile operator names
const PERCENTILE_PREFIX: &str = "percentile_";

/// Value reported for a percentile whose rank could not be parsed
const MALFORMED_PERCENTILE_VALUE: f64 = 0.0;

/// A parsed aggregation operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationOp {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    /// Nearest-rank percentile; `None` when the rank suffix is malformed or out of range
    Percentile(Option<u8>),
}

impl AggregationOp {
    /// Parse an operator name, or `None` if the name is not an operator at all
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "count" => Some(Self::Count),
            "sum" => Some(Self::Sum),
            "avg" => Some(Self::Avg),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => name
                .strip_prefix(PERCENTILE_PREFIX)
                .map(|rank| Self::Percentile(parse_percentile_rank(rank))),
        }
    }

    /// Evaluate over `values`, which must be sorted ascending when this is a percentile
    fn evaluate(self, values: &[f64], sum: f64) -> Option<f64> {
        match self {
            Self::Count => Some(values.len() as f64),
            Self::Sum => Some(sum),
            Self::Avg => Some(sum / values.len() as f64),
            Self::Min => values.iter().copied().reduce(f64::min),
            Self::Max => values.iter().copied().reduce(f64::max),
            Self::Percentile(Some(rank)) => nearest_rank(values, rank),
            Self::Percentile(None) => Some(MALFORMED_PERCENTILE_VALUE),
        }
    }
}

fn parse_percentile_rank(rank: &str) -> Option<u8> {
    rank.parse::<u8>().ok().filter(|k| *k <= 100)
}

/// Element at `floor(rank / 100 * len)`, clamped to the last element
///
/// The index is computed in `f64`, so ranks without an exact binary fraction can land one below
/// the exact product: `percentile_29` of 100 values picks index 28, not 29.
fn nearest_rank(sorted: &[f64], rank: u8) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let index = (f64::from(rank) / 100.0 * sorted.len() as f64).floor() as usize;
    sorted.get(index.min(last)).copied()
}

/// Coerce a property value to a finite number
///
/// Numbers are taken as-is and strings are parsed after trimming; everything else, and any
/// non-finite result, is not a number.
pub fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Finite numeric values of `property` across `features`, in feature order
pub fn property_values<'f>(
    features: impl IntoIterator<Item = &'f Feature>,
    property: &str,
) -> Vec<f64> {
    features
        .into_iter()
        .filter_map(|feature| feature.property(property).and_then(numeric_value))
        .collect()
}

/// Aggregate one property for the given operator names
///
/// The value set is extracted once and sorted at most once, whatever the number of operators.
pub fn aggregate_property<'f, S: AsRef<str>>(
    features: impl IntoIterator<Item = &'f Feature>,
    property: &str,
    operators: &[S],
) -> PropertyAggregates {
    let ops: SmallVec<[(&str, AggregationOp); 8]> = operators
        .iter()
        .filter_map(|name| {
            let name = name.as_ref();
            match AggregationOp::parse(name) {
                Some(op) => {
                    if op == AggregationOp::Percentile(None) {
                        tracing::warn!(
                            "Invalid percentile '{}' for property '{}', expected {}K with K in 0..=100; using {}",
                            name,
                            property,
                            PERCENTILE_PREFIX,
                            MALFORMED_PERCENTILE_VALUE
                        );
                    }
                    Some((name, op))
                }
                None => {
                    tracing::warn!(
                        "Unknown aggregation operator '{}' for property '{}', skipping",
                        name,
                        property
                    );
                    None
                }
            }
        })
        .collect();

    let mut values = property_values(features, property);
    if ops
        .iter()
        .any(|(_, op)| matches!(op, AggregationOp::Percentile(Some(_))))
    {
        values.sort_unstable_by(f64::total_cmp);
    }
    let sum = values.iter().fold(0.0, |acc: f64, v| acc + v);

    ops.into_iter()
        .map(|(name, op)| (name.to_string(), op.evaluate(&values, sum)))
        .collect()
}

/// Aggregate every property of `spec` over `features`
///
/// Each property is computed independently; a bad operator for one property never affects
/// another.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn aggregate(features: &[&Feature], spec: &AggregationSpec) -> AggregationResult {
    spec.iter()
        .map(|(property, operators)| {
            (
                property.clone(),
                aggregate_property(features.iter().copied(), property, operators),
            )
        })
        .collect()
}
