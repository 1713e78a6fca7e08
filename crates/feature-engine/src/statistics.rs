//! Windowed Statistics
//!
//! Stateful scanners run over one machine's time-ordered values. Each
//! returns `None` while it lacks the history it needs.

use crate::FeatureError;
use ring_buffer::RingBuffer;

/// Trailing window of the last `size` observations
#[derive(Debug, Clone)]
pub struct RollingWindow {
    buffer: RingBuffer<f64>,
}

impl RollingWindow {
    /// Create an empty window of `size` observations
    pub fn new(size: usize) -> Result<Self, FeatureError> {
        Ok(Self {
            buffer: RingBuffer::new(size)?,
        })
    }

    pub fn push(&mut self, value: f64) {
        self.buffer.push(value);
    }

    /// Arithmetic mean of the window, once it is full
    pub fn mean(&self) -> Option<f64> {
        if !self.buffer.is_full() {
            return None;
        }
        Some(self.buffer.iter().sum::<f64>() / self.buffer.len() as f64)
    }

    /// Sample standard deviation (divides by `n - 1`), once the window is
    /// full. A window of one observation never has a sample deviation.
    pub fn sample_std_dev(&self) -> Option<f64> {
        let n = self.buffer.len();
        if !self.buffer.is_full() || n < 2 {
            return None;
        }
        let mean = self.buffer.iter().sum::<f64>() / n as f64;
        let m2: f64 = self.buffer.iter().map(|v| (v - mean) * (v - mean)).sum();
        Some((m2 / (n - 1) as f64).sqrt())
    }
}

/// Exponential moving average seeded with the first observation
#[derive(Debug, Clone)]
pub struct ExponentialMovingAverage {
    alpha: f64,
    current: Option<f64>,
}

impl ExponentialMovingAverage {
    /// EMA with smoothing factor `2 / (span + 1)`
    pub fn with_span(span: usize) -> Self {
        Self {
            alpha: 2.0 / (span as f64 + 1.0),
            current: None,
        }
    }

    /// Fold in the next observation and return the updated average
    pub fn update(&mut self, value: f64) -> f64 {
        let next = match self.current {
            None => value,
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
        };
        self.current = Some(next);
        next
    }
}

/// Value observed `lag` positions before the newest one
#[derive(Debug, Clone)]
pub struct LagBuffer {
    buffer: RingBuffer<f64>,
    lag: usize,
}

impl LagBuffer {
    /// Create a buffer for lag depth `lag`
    pub fn new(lag: usize) -> Result<Self, FeatureError> {
        Ok(Self {
            buffer: RingBuffer::new(lag + 1)?,
            lag,
        })
    }

    pub fn push(&mut self, value: f64) {
        self.buffer.push(value);
    }

    /// Lagged value, once `lag + 1` observations have been seen
    pub fn value(&self) -> Option<f64> {
        self.buffer.back(self.lag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_warm_up() {
        let mut window = RollingWindow::new(3).unwrap();
        window.push(1.0);
        assert_eq!(window.mean(), None);
        window.push(2.0);
        assert_eq!(window.mean(), None);
        window.push(3.0);
        assert!((window.mean().unwrap() - 2.0).abs() < 1e-12);
        window.push(10.0);
        assert!((window.mean().unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_std_dev() {
        let mut window = RollingWindow::new(8).unwrap();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            window.push(v);
        }
        // population std is 2.0, sample std is sqrt(32 / 7)
        let expected = (32.0f64 / 7.0).sqrt();
        assert!((window.sample_std_dev().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_single_observation_window_has_no_std() {
        let mut window = RollingWindow::new(1).unwrap();
        window.push(4.0);
        assert_eq!(window.mean(), Some(4.0));
        assert_eq!(window.sample_std_dev(), None);
    }

    #[test]
    fn test_ema_recurrence() {
        let mut ema = ExponentialMovingAverage::with_span(6);
        let alpha = 2.0 / 7.0;
        assert_eq!(ema.update(60.0), 60.0);
        let second = ema.update(67.0);
        assert!((second - (alpha * 67.0 + (1.0 - alpha) * 60.0)).abs() < 1e-12);
    }

    #[test]
    fn test_lag() {
        let mut lag = LagBuffer::new(2).unwrap();
        lag.push(1.0);
        assert_eq!(lag.value(), None);
        lag.push(2.0);
        assert_eq!(lag.value(), None);
        lag.push(3.0);
        assert_eq!(lag.value(), Some(1.0));
        lag.push(4.0);
        assert_eq!(lag.value(), Some(2.0));
    }
}
