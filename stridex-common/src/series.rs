//! Dense numeric views of JSON arrays
//!
//! A JSON array is a numeric array when it is rectangular and every leaf is
//! either numeric-coercible or `null` (stored as NaN). Rank is the nesting
//! depth; discovery accepts ranks 1 to 3.

use serde::Serialize;
use serde_json::Value;

use crate::coerce::coerce_number;

/// Default point budget for 1-D downsampling
pub const DEFAULT_MAX_POINTS: usize = 5000;

/// Rectangular numeric array in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    shape: Vec<usize>,
    data: Vec<f64>,
}

/// nan-ignoring summary statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    /// Total element count (NaN included)
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

impl NumericArray {
    /// Interpret a JSON value as a numeric array
    ///
    /// Returns `None` for scalars, ragged or mixed nesting, non-numeric leaves,
    /// and arrays containing no elements at all.
    pub fn from_value(value: &Value) -> Option<Self> {
        let Value::Array(_) = value else {
            return None;
        };
        let shape = probe_shape(value);
        let mut data = Vec::new();
        collect(value, 0, &shape, &mut data)?;
        if data.is_empty() {
            return None;
        }
        Some(Self { shape, data })
    }

    /// Single-element array for a scalar candidate
    pub fn scalar(value: f64) -> Self {
        Self {
            shape: vec![1],
            data: vec![value],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flattened row-major values
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Summary statistics over all non-NaN values
    ///
    /// `None` when every value is NaN.
    pub fn stats(&self) -> Option<SeriesStats> {
        let mut finite: Vec<f64> = self.data.iter().copied().filter(|v| !v.is_nan()).collect();
        if finite.is_empty() {
            return None;
        }
        finite.sort_by(|a, b| a.total_cmp(b));

        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let mid = finite.len() / 2;
        let median = if finite.len() % 2 == 0 {
            (finite[mid - 1] + finite[mid]) / 2.0
        } else {
            finite[mid]
        };

        Some(SeriesStats {
            count: self.data.len(),
            mean,
            std: variance.sqrt(),
            min: finite[0],
            median,
            max: finite[finite.len() - 1],
        })
    }

    /// Evenly spaced 1-D downsampling to at most `max_points` values
    ///
    /// First and last samples are always kept. Arrays of other ranks, and
    /// arrays already within budget, are returned unchanged.
    pub fn downsample(&self, max_points: usize) -> NumericArray {
        let n = self.data.len();
        if self.rank() != 1 || n <= max_points || max_points < 2 {
            return self.clone();
        }
        let data: Vec<f64> = (0..max_points)
            .map(|i| self.data[i * (n - 1) / (max_points - 1)])
            .collect();
        NumericArray {
            shape: vec![data.len()],
            data,
        }
    }

    /// One frame of a rank-3 stack as a rank-2 array
    ///
    /// `None` for other ranks or an out-of-range index.
    pub fn frame(&self, index: usize) -> Option<NumericArray> {
        if self.rank() != 3 || index >= self.shape[0] {
            return None;
        }
        let frame_len = self.shape[1] * self.shape[2];
        let start = index * frame_len;
        Some(NumericArray {
            shape: vec![self.shape[1], self.shape[2]],
            data: self.data[start..start + frame_len].to_vec(),
        })
    }
}

/// Shape implied by following the first element at every level
fn probe_shape(value: &Value) -> Vec<usize> {
    let mut shape = Vec::new();
    let mut current = value;
    while let Value::Array(items) = current {
        shape.push(items.len());
        match items.first() {
            Some(first) => current = first,
            None => break,
        }
    }
    shape
}

/// Check every level against `shape` and push leaves in row-major order
fn collect(value: &Value, depth: usize, shape: &[usize], data: &mut Vec<f64>) -> Option<()> {
    match value {
        Value::Array(items) => {
            if depth >= shape.len() || items.len() != shape[depth] {
                return None;
            }
            for item in items {
                collect(item, depth + 1, shape, data)?;
            }
            Some(())
        }
        Value::Null if depth == shape.len() => {
            data.push(f64::NAN);
            Some(())
        }
        leaf if depth == shape.len() => {
            data.push(coerce_number(leaf)?);
            Some(())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rank_one() {
        let arr = NumericArray::from_value(&json!([1, "2.5", 3])).unwrap();
        assert_eq!(arr.shape(), &[3]);
        assert_eq!(arr.values(), &[1.0, 2.5, 3.0]);
    }

    #[test]
    fn test_rank_two_and_three() {
        let two = NumericArray::from_value(&json!([[1, 2], [3, 4], [5, 6]])).unwrap();
        assert_eq!(two.shape(), &[3, 2]);
        let three = NumericArray::from_value(&json!([[[1, 2]], [[3, 4]]])).unwrap();
        assert_eq!(three.shape(), &[2, 1, 2]);
        assert_eq!(three.values(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_null_becomes_nan() {
        let arr = NumericArray::from_value(&json!([1, null, 3])).unwrap();
        assert!(arr.values()[1].is_nan());
    }

    #[test]
    fn test_rejects_ragged_mixed_and_text() {
        assert!(NumericArray::from_value(&json!([[1, 2], [3]])).is_none());
        assert!(NumericArray::from_value(&json!([1, [2]])).is_none());
        assert!(NumericArray::from_value(&json!([[1], 2])).is_none());
        assert!(NumericArray::from_value(&json!(["left", "right"])).is_none());
        assert!(NumericArray::from_value(&json!([true, false])).is_none());
        assert!(NumericArray::from_value(&json!([{"a": 1}])).is_none());
    }

    #[test]
    fn test_rejects_empty_and_scalars() {
        assert!(NumericArray::from_value(&json!([])).is_none());
        assert!(NumericArray::from_value(&json!([[], []])).is_none());
        assert!(NumericArray::from_value(&json!(5)).is_none());
    }

    #[test]
    fn test_stats_ignore_nan() {
        let arr = NumericArray::from_value(&json!([4, null, 1, 3, 2])).unwrap();
        let stats = arr.stats().unwrap();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
        assert!((stats.std - 1.118_033_988_749_895).abs() < 1e-12);
    }

    #[test]
    fn test_stats_all_nan() {
        let arr = NumericArray::from_value(&json!([null, null])).unwrap();
        assert!(arr.stats().is_none());
    }

    #[test]
    fn test_downsample_keeps_endpoints() {
        let values: Vec<i64> = (0..10_001).collect();
        let arr = NumericArray::from_value(&json!(values)).unwrap();
        let small = arr.downsample(DEFAULT_MAX_POINTS);
        assert_eq!(small.len(), DEFAULT_MAX_POINTS);
        assert_eq!(small.values()[0], 0.0);
        assert_eq!(small.values()[DEFAULT_MAX_POINTS - 1], 10_000.0);

        let short = NumericArray::from_value(&json!([1, 2, 3])).unwrap();
        assert_eq!(short.downsample(DEFAULT_MAX_POINTS), short);
    }

    #[test]
    fn test_frame_extraction() {
        let stack = NumericArray::from_value(&json!([[[1, 2], [3, 4]], [[5, 6], [7, 8]]])).unwrap();
        let frame = stack.frame(1).unwrap();
        assert_eq!(frame.shape(), &[2, 2]);
        assert_eq!(frame.values(), &[5.0, 6.0, 7.0, 8.0]);
        assert!(stack.frame(2).is_none());
        assert!(NumericArray::scalar(1.0).frame(0).is_none());
    }
}
