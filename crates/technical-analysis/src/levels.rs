use analysis_core::{Candle, Level};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Swing high or low that seeds a support/resistance level
#[derive(Debug, Clone, PartialEq)]
pub struct SwingPoint {
    pub price: f64,
    pub time: DateTime<Utc>,
}

/// Swing points split by side, each in chronological order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwingPoints {
    pub highs: Vec<SwingPoint>,
    pub lows: Vec<SwingPoint>,
}

/// Clustered levels, strongest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportResistance {
    pub support: Vec<Level>,
    pub resistance: Vec<Level>,
}

/// Find candles whose high (low) is the extreme of the symmetric window
/// `[i - lookback, i + lookback]`. Ties with neighbours still count.
pub fn find_swing_points(candles: &[Candle], lookback: usize) -> SwingPoints {
    let mut points = SwingPoints::default();
    if lookback == 0 || candles.len() < 2 * lookback + 1 {
        return points;
    }

    for i in lookback..candles.len() - lookback {
        let window = &candles[i - lookback..=i + lookback];
        let current = &candles[i];

        if window.iter().all(|c| c.high <= current.high) {
            points.highs.push(SwingPoint {
                price: current.high,
                time: current.time,
            });
        }

        if window.iter().all(|c| c.low >= current.low) {
            points.lows.push(SwingPoint {
                price: current.low,
                time: current.time,
            });
        }
    }

    points
}

/// Greedy single-pass clustering.
///
/// Each point joins the open cluster when it lies within `threshold` of the
/// cluster's most recent member; otherwise the cluster is closed and a new one
/// starts. The result depends on input order.
pub fn cluster_levels(points: &[SwingPoint], threshold: f64) -> Vec<Level> {
    let Some((first, rest)) = points.split_first() else {
        return vec![];
    };

    let mut levels = Vec::new();
    let mut cluster: Vec<&SwingPoint> = vec![first];

    for point in rest {
        let last_price = cluster[cluster.len() - 1].price;
        if (point.price - last_price).abs() < threshold {
            cluster.push(point);
        } else {
            levels.push(close_cluster(&cluster));
            cluster = vec![point];
        }
    }
    levels.push(close_cluster(&cluster));

    levels
}

fn close_cluster(cluster: &[&SwingPoint]) -> Level {
    let avg_price = cluster.iter().map(|p| p.price).sum::<f64>() / cluster.len() as f64;
    Level {
        price: avg_price,
        strength: cluster.len(),
        time: cluster[0].time,
    }
}

/// Keep the `max_levels` strongest levels. The sort is stable, so equal
/// strengths stay in discovery order.
pub fn strongest_levels(mut levels: Vec<Level>, max_levels: usize) -> Vec<Level> {
    levels.sort_by(|a, b| b.strength.cmp(&a.strength));
    levels.truncate(max_levels);
    levels
}

/// Support and resistance levels from clustered swing points.
///
/// `threshold_pct` is relative to `current_price`.
pub fn support_resistance(
    candles: &[Candle],
    lookback: usize,
    current_price: f64,
    threshold_pct: f64,
    max_levels: usize,
) -> SupportResistance {
    let swings = find_swing_points(candles, lookback);
    let threshold = current_price * threshold_pct;

    let support = strongest_levels(cluster_levels(&swings.lows, threshold), max_levels);
    let resistance = strongest_levels(cluster_levels(&swings.highs, threshold), max_levels);

    debug!(
        swing_highs = swings.highs.len(),
        swing_lows = swings.lows.len(),
        support = support.len(),
        resistance = resistance.len(),
        "Clustered support/resistance levels"
    );

    SupportResistance { support, resistance }
}
