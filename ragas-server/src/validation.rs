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

//! Input validation for API requests
//!
//! Request shapes are enforced by the JSON extractor; what remains here are
//! the limits that depend on configuration.

use crate::api::ApiError;

/// Validate batch size against the configured ceiling
pub fn validate_batch_size(count: usize, max_batch_size: usize) -> Result<(), ApiError> {
    if count > max_batch_size {
        return Err(ApiError::BadRequest(format!(
            "Maximum {} samples per batch",
            max_batch_size
        )));
    }

    if count == 0 {
        return Err(ApiError::BadRequest(
            "At least one sample required".to_string(),
        ));
    }

    Ok(())
}
