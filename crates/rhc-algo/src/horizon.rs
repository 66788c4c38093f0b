//! # Horizon Partitioning
//!
//! Splits a horizon of `H` timesteps into overlapping optimization windows.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  H = 7, window length L = 4, look-ahead K = 2  →  period P = L - K = 2  │
//! │                                                                         │
//! │  t:        0   1   2   3   4   5   6                                    │
//! │  window 0 [A   A   l   l]                                               │
//! │  window 1         [A   A   l   l]                                       │
//! │  window 2                 [A   A   l]      (truncated at H)             │
//! │  window 3                         [A]      (truncated at H)             │
//! │                                                                         │
//! │  A = authoritative (kept), l = look-ahead (discarded)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Authoritative portions are contiguous, never overlap, and cover `[0, H)`
//! exactly once. The final window is truncated rather than padded.

use std::ops::Range;

use rhc_core::{ConfigError, DataAlignmentError, DrivingData, WindowData};

/// Timestep ranges of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpan {
    /// 0-based window counter
    pub index: usize,
    /// First timestep of the window
    pub start: usize,
    /// End of the authoritative portion (exclusive)
    pub authoritative_end: usize,
    /// End of the window including look-ahead (exclusive)
    pub end: usize,
}

impl WindowSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn full(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn authoritative(&self) -> Range<usize> {
        self.start..self.authoritative_end
    }

    pub fn authoritative_len(&self) -> usize {
        self.authoritative_end - self.start
    }

    pub fn look_ahead(&self) -> Range<usize> {
        self.authoritative_end..self.end
    }

    /// Pair the span with its slice of the driving data.
    pub fn with_data<'a>(&self, data: &'a DrivingData) -> Result<Window<'a>, DataAlignmentError> {
        Ok(Window {
            span: *self,
            data: data.window(self.full())?,
        })
    }
}

/// A window together with its immutable data slice.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    pub span: WindowSpan,
    pub data: WindowData<'a>,
}

/// Lazily yields the windows of a horizon.
#[derive(Debug, Clone)]
pub struct HorizonPartitioner {
    horizon: usize,
    window_length: usize,
    look_ahead: usize,
    next_start: usize,
    next_index: usize,
}

impl HorizonPartitioner {
    /// Partition `[0, horizon)` into windows of `window_length` steps whose
    /// last `look_ahead` steps are not authoritative.
    pub fn new(horizon: usize, window_length: usize, look_ahead: usize) -> Result<Self, ConfigError> {
        if window_length == 0 {
            return Err(ConfigError::ZeroWindowLength);
        }
        if look_ahead >= window_length {
            return Err(ConfigError::LookAheadTooLong {
                look_ahead,
                window_length,
            });
        }
        if horizon == 0 {
            return Err(ConfigError::EmptyHorizon);
        }
        Ok(Self {
            horizon,
            window_length,
            look_ahead,
            next_start: 0,
            next_index: 0,
        })
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Authoritative length of every window but possibly the last.
    pub fn period(&self) -> usize {
        self.window_length - self.look_ahead
    }

    /// Total number of windows, including those already yielded.
    pub fn window_count(&self) -> usize {
        self.horizon.div_ceil(self.period())
    }
}

impl Iterator for HorizonPartitioner {
    type Item = WindowSpan;

    fn next(&mut self) -> Option<WindowSpan> {
        if self.next_start >= self.horizon {
            return None;
        }
        let start = self.next_start;
        let span = WindowSpan {
            index: self.next_index,
            start,
            authoritative_end: (start + self.period()).min(self.horizon),
            end: (start + self.window_length).min(self.horizon),
        };
        self.next_start = span.authoritative_end;
        self.next_index += 1;
        Some(span)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.window_count() - self.next_index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HorizonPartitioner {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_with_look_ahead() {
        let spans: Vec<_> = HorizonPartitioner::new(7, 4, 2).unwrap().collect();
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].full(), 0..4);
        assert_eq!(spans[0].authoritative(), 0..2);
        assert_eq!(spans[1].full(), 2..6);
        assert_eq!(spans[2].full(), 4..7);
        assert_eq!(spans[2].authoritative(), 4..6);
        assert_eq!(spans[2].look_ahead(), 6..7);
        assert_eq!(spans[3].full(), 6..7);
        assert_eq!(spans[3].authoritative_len(), 1);
        assert!(spans[3].look_ahead().is_empty());
    }

    #[test]
    fn test_partition_without_look_ahead() {
        let spans: Vec<_> = HorizonPartitioner::new(6, 3, 0).unwrap().collect();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].index, 1);
        assert_eq!(spans[1].authoritative(), 3..6);
        assert_eq!(spans[1].full(), 3..6);
    }

    #[test]
    fn test_window_longer_than_horizon() {
        let spans: Vec<_> = HorizonPartitioner::new(3, 10, 4).unwrap().collect();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].authoritative(), 0..3);
        assert_eq!(spans[0].full(), 0..3);
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(
            HorizonPartitioner::new(5, 0, 0).unwrap_err(),
            ConfigError::ZeroWindowLength
        );
        assert_eq!(
            HorizonPartitioner::new(5, 3, 3).unwrap_err(),
            ConfigError::LookAheadTooLong {
                look_ahead: 3,
                window_length: 3
            }
        );
        assert_eq!(
            HorizonPartitioner::new(0, 3, 1).unwrap_err(),
            ConfigError::EmptyHorizon
        );
    }

    #[test]
    fn test_exact_size() {
        let mut partitioner = HorizonPartitioner::new(10, 4, 1).unwrap();
        assert_eq!(partitioner.len(), 4);
        partitioner.next();
        assert_eq!(partitioner.len(), 3);
    }

    #[test]
    fn test_window_data_slice() {
        let data = DrivingData::new(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let span = HorizonPartitioner::new(5, 3, 1).unwrap().nth(1).unwrap();
        let window = span.with_data(&data).unwrap();
        assert_eq!(window.data.start, 2);
        assert_eq!(window.data.demand, &[3.0, 4.0, 5.0]);

        let short = DrivingData::new(vec![1.0, 2.0, 3.0]);
        assert!(span.with_data(&short).is_err());
    }
}
