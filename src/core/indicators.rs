//! Stateless technical indicators over ordered price and candle sequences.
//!
//! Series functions return the full computed series; the `*_last` helpers and
//! the composite indicators return only the latest value, which is all the
//! snapshot builder needs.

use crate::core::types::{BollingerBands, Candle, MacdValue, StochasticValue};

/// Floor applied to the RSI average loss so an all-gain window stays finite.
pub const MIN_AVERAGE_LOSS: f64 = 1e-6;

/// Simple moving average. Element `j` is the mean of `data[j..j + period]`.
///
/// Empty when `data` is shorter than `period`.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(data.len() - period + 1);
    let mut window_sum: f64 = data[..period].iter().sum();
    out.push(window_sum / period as f64);

    for i in period..data.len() {
        window_sum += data[i] - data[i - period];
        out.push(window_sum / period as f64);
    }

    out
}

/// Exponential moving average seeded with the first raw observation.
///
/// `ema[0] = data[0]`, then `ema[i] = data[i] * k + ema[i - 1] * (1 - k)` with
/// `k = 2 / (period + 1)`. There is no SMA warm-up, so early values are biased
/// toward the first price.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.is_empty() {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(data.len());
    let mut prev = data[0];
    out.push(prev);

    for &value in &data[1..] {
        prev = value * k + prev * (1.0 - k);
        out.push(prev);
    }

    out
}

pub fn sma_last(data: &[f64], period: usize) -> Option<f64> {
    sma(data, period).last().copied()
}

pub fn ema_last(data: &[f64], period: usize) -> Option<f64> {
    ema(data, period).last().copied()
}

/// Relative strength index with Wilder smoothing.
///
/// The first `period` deltas seed the average gain and loss; later deltas use
/// `avg = (avg * (period - 1) + new) / period`. A window with no movement at
/// all reads 50.
pub fn rsi(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() <= period {
        return None;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for w in data[..=period].windows(2) {
        let change = w[1] - w[0];
        if change >= 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    let p = period as f64;
    for w in data[period..].windows(2) {
        let change = w[1] - w[0];
        let (gain, loss) = if change >= 0.0 { (change, 0.0) } else { (0.0, -change) };
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
    }

    if avg_gain == 0.0 && avg_loss == 0.0 {
        return Some(50.0);
    }

    let rs = avg_gain / avg_loss.max(MIN_AVERAGE_LOSS);
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// MACD line, signal line and histogram at the latest bar.
///
/// The fast and slow EMA series are aligned on their tails before
/// subtracting, so a longer slow series is trimmed by
/// `slow.len() - fast.len()` from the front (and vice versa).
pub fn macd(data: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdValue> {
    if fast == 0 || slow == 0 || signal == 0 || data.len() < slow {
        return None;
    }

    let fast_series = ema(data, fast);
    let slow_series = ema(data, slow);
    let len = fast_series.len().min(slow_series.len());
    let fast_offset = fast_series.len() - len;
    let slow_offset = slow_series.len() - len;

    let macd_line: Vec<f64> = (0..len)
        .map(|i| fast_series[i + fast_offset] - slow_series[i + slow_offset])
        .collect();
    let signal_line = ema(&macd_line, signal);

    let macd = *macd_line.last()?;
    let signal = *signal_line.last()?;
    Some(MacdValue {
        macd,
        signal,
        histogram: macd - signal,
    })
}

/// Bollinger bands over the trailing `period` values, using the population
/// standard deviation.
pub fn bollinger(data: &[f64], period: usize, std_dev_multiplier: f64) -> Option<BollingerBands> {
    if period == 0 || data.len() < period {
        return None;
    }

    let window = &data[data.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let variance = window.iter().map(|&p| (p - middle).powi(2)).sum::<f64>() / period as f64;
    let band = std_dev_multiplier * variance.sqrt();

    Some(BollingerBands {
        upper: middle + band,
        middle,
        lower: middle - band,
    })
}

/// True range of each candle against the previous close, starting from the
/// second candle.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| {
            let prev_close = w[0].close;
            let c = &w[1];
            (c.high - c.low)
                .max((c.high - prev_close).abs())
                .max((c.low - prev_close).abs())
        })
        .collect()
}

/// Average true range. Seeded with the mean of the first `period` true
/// ranges, then Wilder-smoothed: `(atr * (period - 1) + tr) / period`.
pub fn atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 {
        return None;
    }

    let ranges = true_ranges(candles);
    if ranges.len() < period {
        return None;
    }

    let p = period as f64;
    let seed = ranges[..period].iter().sum::<f64>() / p;
    Some(ranges[period..].iter().fold(seed, |atr, &tr| (atr * (p - 1.0) + tr) / p))
}

/// Stochastic oscillator.
///
/// Raw %K over the trailing `period` candles is smoothed by an SMA of
/// `k_period` (1 leaves it raw); %D is the SMA of %K over `d_period`. A flat
/// window (highest high equal to lowest low) reads 50.
pub fn stochastic(
    candles: &[Candle],
    period: usize,
    k_period: usize,
    d_period: usize,
) -> Option<StochasticValue> {
    if period == 0 || k_period == 0 || d_period == 0 || candles.len() < period {
        return None;
    }

    let raw_k: Vec<f64> = candles
        .windows(period)
        .map(|window| {
            let highest = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
            let lowest = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            let close = window[window.len() - 1].close;
            let range = highest - lowest;
            if range <= 0.0 {
                50.0
            } else {
                (close - lowest) / range * 100.0
            }
        })
        .collect();

    let k_series = sma(&raw_k, k_period);
    let d_series = sma(&k_series, d_period);

    Some(StochasticValue {
        k: *k_series.last()?,
        d: *d_series.last()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    const EPS: f64 = 1e-9;

    /// Ten hand-checked candles: (high, low, close).
    fn fixture_candles() -> Vec<Candle> {
        let rows = [
            (10.0, 8.0, 9.0),
            (11.0, 9.0, 10.0),
            (12.0, 10.0, 11.0),
            (11.0, 9.0, 10.0),
            (13.0, 10.0, 12.0),
            (12.0, 11.0, 11.0),
            (14.0, 11.0, 13.0),
            (13.0, 12.0, 12.0),
            (15.0, 12.0, 14.0),
            (14.0, 13.0, 13.0),
        ];
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| Candle {
                timestamp: start + Duration::minutes(5 * i as i64),
                open: close,
                high,
                low,
                close,
                volume: 1.0,
            })
            .collect()
    }

    fn fixture_closes() -> Vec<f64> {
        fixture_candles().iter().map(|c| c.close).collect()
    }

    #[test]
    fn test_sma_window_means() {
        let values = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_sma_short_input_is_empty() {
        assert!(sma(&[1.0, 2.0], 3).is_empty());
        assert!(sma(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_ema_fixture_regression() {
        // k = 0.5 for period 3
        let expected = [
            9.0, 9.5, 10.25, 10.125, 11.0625, 11.03125, 12.015625, 12.0078125, 13.00390625,
            13.001953125,
        ];
        let series = ema(&fixture_closes(), 3);
        assert_eq!(series.len(), expected.len());
        for (got, want) in series.iter().zip(expected.iter()) {
            assert!((got - want).abs() < EPS, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_ema_seeds_from_first_value() {
        let series = ema(&[42.0], 10);
        assert_eq!(series, vec![42.0]);
    }

    #[test]
    fn test_atr_fixture_regression() {
        // TR from candle 1: 2,2,2,3,1,3,1,3,1; seed 2, then Wilder with period 3
        let ranges = true_ranges(&fixture_candles());
        assert_eq!(ranges, vec![2.0, 2.0, 2.0, 3.0, 1.0, 3.0, 1.0, 3.0, 1.0]);

        let value = atr(&fixture_candles(), 3).unwrap();
        assert!((value - 1325.0 / 729.0).abs() < EPS);
    }

    #[test]
    fn test_atr_needs_period_true_ranges() {
        let candles = fixture_candles();
        assert!(atr(&candles[..3], 3).is_none());
        assert!(atr(&candles[..4], 3).is_some());
    }

    #[test]
    fn test_rsi_fixture_regression() {
        let value = rsi(&fixture_closes(), 3).unwrap();
        assert!((value - 172400.0 / 2985.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_constant_series_is_neutral() {
        let flat = vec![100.0; 60];
        assert_eq!(rsi(&flat, 14), Some(50.0));
    }

    #[test]
    fn test_rsi_rising_series_tends_to_100() {
        let rising: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
        let value = rsi(&rising, 14).unwrap();
        assert!(value > 99.99);
        assert!(value <= 100.0);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert!(rsi(&[1.0, 2.0, 3.0], 3).is_none());
    }

    #[test]
    fn test_macd_constant_series_has_zero_histogram() {
        let flat = vec![50.0; 100];
        let value = macd(&flat, 12, 26, 9).unwrap();
        assert!(value.macd.abs() < EPS);
        assert!(value.histogram.abs() < EPS);
    }

    #[test]
    fn test_macd_rising_series_fast_above_slow() {
        let rising: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
        let fast = ema_last(&rising, 12).unwrap();
        let slow = ema_last(&rising, 26).unwrap();
        assert!(fast > slow);

        let value = macd(&rising, 12, 26, 9).unwrap();
        assert!(value.macd > 0.0);
        assert!(value.histogram > 0.0);
    }

    #[test]
    fn test_macd_insufficient_data() {
        assert!(macd(&[1.0; 10], 12, 26, 9).is_none());
    }

    #[test]
    fn test_bollinger_population_std_dev() {
        // mean 5, population std dev 2
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let bands = bollinger(&data, 8, 2.0).unwrap();
        assert!((bands.middle - 5.0).abs() < EPS);
        assert!((bands.upper - 9.0).abs() < EPS);
        assert!((bands.lower - 1.0).abs() < EPS);
    }

    #[test]
    fn test_bollinger_flat_prices_collapse() {
        let bands = bollinger(&[3.0; 20], 20, 2.0).unwrap();
        assert_eq!(bands.upper, bands.lower);
        assert_eq!(bands.middle, 3.0);
    }

    #[test]
    fn test_stochastic_fixture() {
        let value = stochastic(&fixture_candles(), 5, 1, 3).unwrap();
        assert!((value.k - 50.0).abs() < EPS);
        assert!((value.d - 190.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_stochastic_flat_window_reads_50() {
        let mut candles = fixture_candles();
        for candle in candles.iter_mut() {
            candle.high = 10.0;
            candle.low = 10.0;
            candle.close = 10.0;
        }
        let value = stochastic(&candles, 5, 3, 3).unwrap();
        assert_eq!(value.k, 50.0);
        assert_eq!(value.d, 50.0);
    }

    #[test]
    fn test_indicators_are_deterministic() {
        let closes = fixture_closes();
        assert_eq!(rsi(&closes, 3), rsi(&closes, 3));
        assert_eq!(macd(&closes, 2, 4, 3), macd(&closes, 2, 4, 3));
        assert_eq!(atr(&fixture_candles(), 3), atr(&fixture_candles(), 3));
    }
}
