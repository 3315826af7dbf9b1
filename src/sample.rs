//! Bounded, bucketed enumeration of iterables.
use serde::{Deserialize, Serialize};

use crate::classify::{classify, is_iterable};
use crate::error::{DescribeError, Result};
use crate::realm::{Realm, Value};

pub const DEFAULT_BUCKET_SIZE: usize = 10;
pub const DEFAULT_MAX_TOTAL: usize = 50;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// A contiguous run of enumerated items, `lower_bound..=upper_bound`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket<T> {
    pub lower_bound: usize,
    pub upper_bound: usize,
    pub items: Vec<T>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketedSample<T> {
    pub buckets: Vec<Bucket<T>>,
    /// More elements existed beyond the sampled ones.
    pub truncated: bool,
}

impl<T> Default for BucketedSample<T> {
    fn default() -> Self {
        Self { buckets: Vec::new(), truncated: false }
    }
}

impl<T> BucketedSample<T> {
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.items.len()).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.buckets.iter().flat_map(|b| b.items.iter())
    }
    /// Same bucket layout, each item transformed. Stops at the first error.
    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<BucketedSample<U>, E> {
        let mut buckets = Vec::with_capacity(self.buckets.len());
        for bucket in self.buckets {
            let items = bucket.items.into_iter().map(&mut f).collect::<Result<Vec<_>, E>>()?;
            buckets.push(Bucket { lower_bound: bucket.lower_bound, upper_bound: bucket.upper_bound, items });
        }
        Ok(BucketedSample { buckets, truncated: self.truncated })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SAMPLING
// ————————————————————————————————————————————————————————————————————————————

/// Pull at most `max_total` items (plus one peek to detect truncation) and
/// group them into buckets of `bucket_size`. Never consumes more than
/// `max_total + 1` items, so infinite sources are fine.
pub fn group_by_buckets<T>(
    items: impl IntoIterator<Item = Result<T>>,
    bucket_size: usize,
    max_total: usize,
) -> Result<BucketedSample<T>> {
    if bucket_size == 0 {
        return Err(DescribeError::InvalidBucketSize);
    }
    let mut items = items.into_iter();
    let mut buckets: Vec<Bucket<T>> = Vec::new();
    for index in 0..max_total {
        let Some(item) = items.next() else {
            return Ok(BucketedSample { buckets, truncated: false });
        };
        let item = item?;
        match buckets.last_mut() {
            Some(bucket) if index % bucket_size != 0 => {
                bucket.upper_bound = index;
                bucket.items.push(item);
            }
            _ => buckets.push(Bucket { lower_bound: index, upper_bound: index, items: vec![item] }),
        }
    }
    let truncated = match items.next() {
        Some(peeked) => peeked.map(|_| true)?,
        None => false,
    };
    Ok(BucketedSample { buckets, truncated })
}

/// Enumerate an iterable value through its iteration protocol.
///
/// Failures raised while enumerating come back as
/// [`DescribeError::Sampling`], which callers may treat as recoverable.
pub fn sample(
    realm: &mut Realm,
    value: &Value,
    bucket_size: usize,
    max_total: usize,
) -> Result<BucketedSample<Value>> {
    if bucket_size == 0 {
        return Err(DescribeError::InvalidBucketSize);
    }
    if !is_iterable(realm, value) {
        return Err(DescribeError::NotIterable { kind: classify(realm, value) });
    }
    let values = realm.values(value).map_err(DescribeError::Sampling)?;
    group_by_buckets(values.map(|item| item.map_err(DescribeError::Sampling)), bucket_size, max_total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Thrown;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn bounds<T>(sample: &BucketedSample<T>) -> Vec<(usize, usize)> {
        sample.buckets.iter().map(|b| (b.lower_bound, b.upper_bound)).collect()
    }

    #[test]
    fn partial_last_bucket_uses_actual_index() {
        let sample = group_by_buckets((0..23).map(Ok), 10, 50).unwrap();
        assert_eq!(bounds(&sample), [(0, 9), (10, 19), (20, 22)]);
        assert!(!sample.truncated);
        assert_eq!(sample.len(), 23);
    }

    #[test]
    fn exact_limit_is_not_truncated() {
        let exact = group_by_buckets((0..50).map(Ok), 10, 50).unwrap();
        assert!(!exact.truncated);
        let over = group_by_buckets((0..51).map(Ok), 10, 50).unwrap();
        assert!(over.truncated);
        assert_eq!(over.len(), 50);
    }

    #[test]
    fn zero_bucket_size_is_rejected() {
        let err = group_by_buckets((0..3).map(Ok), 0, 50).unwrap_err();
        assert!(matches!(err, DescribeError::InvalidBucketSize));
    }

    #[test]
    fn infinite_generator_is_bounded() {
        let mut realm = Realm::new();
        let mut n = 0;
        let generator = realm.new_generator(move |_| {
            n += 1;
            Ok(Some(Value::from(n)))
        });
        let sample = sample(&mut realm, &Value::Object(generator), 10, 50).unwrap();
        assert_eq!(bounds(&sample), [(0, 9), (10, 19), (20, 29), (30, 39), (40, 49)]);
        assert!(sample.truncated);
        let first: Vec<f64> = sample.items().take(3).filter_map(Value::as_number).collect();
        assert_eq!(first, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn arrays_sample_their_elements() {
        let mut realm = Realm::new();
        let array = realm.new_array([Value::from("a"), Value::from("b")]);
        let sample = sample(&mut realm, &Value::Object(array), 10, 50).unwrap();
        let items: Vec<&str> = sample.items().filter_map(Value::as_str).collect();
        assert_eq!(items, ["a", "b"]);
    }

    #[test]
    fn non_iterables_are_rejected() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let err = sample(&mut realm, &Value::Object(obj), 10, 50).unwrap_err();
        assert!(matches!(err, DescribeError::NotIterable { ref kind } if kind == "Object"));
    }

    #[test]
    fn enumeration_failures_are_sampling_errors() {
        let mut realm = Realm::new();
        let mut n = 0;
        let generator = realm.new_generator(move |_| {
            n += 1;
            if n > 3 { Err(Thrown::error("exhausted")) } else { Ok(Some(Value::from(n))) }
        });
        let err = sample(&mut realm, &Value::Object(generator), 10, 50).unwrap_err();
        assert!(matches!(err, DescribeError::Sampling(_)));
    }

    proptest! {
        #[test]
        fn bucket_layout_invariants(n in 0usize..200, size in 1usize..20, max in 0usize..100) {
            let sample = group_by_buckets((0..n).map(Ok), size, max).unwrap();
            prop_assert_eq!(sample.len(), n.min(max));
            prop_assert_eq!(sample.truncated, n > max);
            let mut expected = 0;
            for bucket in &sample.buckets {
                prop_assert!(!bucket.items.is_empty() && bucket.items.len() <= size);
                prop_assert_eq!(bucket.lower_bound, expected);
                prop_assert_eq!(bucket.upper_bound, bucket.lower_bound + bucket.items.len() - 1);
                prop_assert_eq!(bucket.items[0], bucket.lower_bound);
                expected = bucket.upper_bound + 1;
            }
        }
    }
}
