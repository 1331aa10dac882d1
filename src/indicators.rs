/// MACD decomposition: `dif` is the fast/slow EMA spread, `dea` the signal
/// EMA of `dif`, `histogram` their difference.
#[derive(Debug, Clone)]
pub struct MacdOutput {
    pub dif: Vec<f64>,
    pub dea: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn calculate_ema(prices: &[f64], period: usize) -> Vec<f64> {
    if prices.is_empty() {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut ema_values = Vec::with_capacity(prices.len());
    ema_values.push(prices[0]);

    for i in 1..prices.len() {
        let ema = (prices[i] * multiplier) + (ema_values[i - 1] * (1.0 - multiplier));
        ema_values.push(ema);
    }

    ema_values
}

pub fn calculate_macd(
    prices: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdOutput {
    let fast_ema = calculate_ema(prices, fast_period);
    let slow_ema = calculate_ema(prices, slow_period);

    let dif: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(fast, slow)| fast - slow)
        .collect();
    let dea = calculate_ema(&dif, signal_period);
    let histogram: Vec<f64> = dif
        .iter()
        .zip(dea.iter())
        .map(|(dif, dea)| dif - dea)
        .collect();

    MacdOutput {
        dif,
        dea,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_of_constant_series_is_constant() {
        let ema = calculate_ema(&[5.0; 10], 3);
        assert_eq!(ema.len(), 10);
        for value in ema {
            assert!((value - 5.0).abs() < 1e-12);
        }
    }

    #[test]
    fn ema_seeds_at_first_price() {
        let ema = calculate_ema(&[10.0, 20.0], 9);
        assert!((ema[0] - 10.0).abs() < 1e-12);
        assert!(ema[1] > 10.0 && ema[1] < 20.0);
    }

    #[test]
    fn ema_of_empty_series_is_empty() {
        assert!(calculate_ema(&[], 12).is_empty());
    }

    #[test]
    fn macd_lengths_match_input() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64) * 0.5).collect();
        let macd = calculate_macd(&prices, 12, 26, 9);
        assert_eq!(macd.dif.len(), prices.len());
        assert_eq!(macd.dea.len(), prices.len());
        assert_eq!(macd.histogram.len(), prices.len());
    }

    #[test]
    fn macd_dif_turns_positive_in_an_uptrend() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64) * 2.0).collect();
        let macd = calculate_macd(&prices, 12, 26, 9);
        // Fast EMA tracks a rising series more closely than the slow EMA.
        assert!(macd.dif.last().unwrap() > &0.0);
    }
}
