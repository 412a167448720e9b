// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Score cleaning and averaging
//!
//! Non-finite scores are "indeterminate": they become `None` and are left out
//! of every mean instead of being counted as zero.

use std::collections::BTreeMap;

/// Metric name to cleaned score
pub type ScoreMap = BTreeMap<String, Option<f64>>;

/// Replace NaN/Infinity with `None`
pub fn clean_score(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Arithmetic mean of the present values, `None` when there are none
pub fn mean_of_valid<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Column mean that skips non-finite cells; NaN when every cell is skipped
pub fn nan_mean(values: &[f64]) -> f64 {
    mean_of_valid(values.iter().copied().map(clean_score)).unwrap_or(f64::NAN)
}
