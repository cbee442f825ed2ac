// SPDX-License-Identifier: Apache-2.0

pub const MIN_WINDOW_LENGTH: usize = 2;
pub const MAX_WINDOW_LENGTH: usize = 120;
pub const MAX_K: usize = 256;
pub const MAX_HORIZON_COUNT: u32 = 24;
pub const MAX_DTW_BAND: usize = MAX_WINDOW_LENGTH;
