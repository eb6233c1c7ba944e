use analysis_core::{Bias, Candle, FairValueGap, OrderBlock};
use tracing::debug;

/// First candle index inspected for order blocks
pub const ORDER_BLOCK_START: usize = 5;

/// Order blocks and fair value gaps found in one series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IctPatterns {
    pub order_blocks: Vec<OrderBlock>,
    pub fair_value_gaps: Vec<FairValueGap>,
}

/// Detect order blocks on each adjacent pair (i, i + 1).
///
/// A bearish candle followed by a bullish candle closing above its high anchors a
/// bullish block at i; the mirror case anchors a bearish block. Only the
/// `keep` most recent detections survive.
pub fn detect_order_blocks(candles: &[Candle], keep: usize) -> Vec<OrderBlock> {
    let mut blocks = Vec::new();
    if candles.len() < ORDER_BLOCK_START + 2 {
        return blocks;
    }

    for i in ORDER_BLOCK_START..candles.len() - 1 {
        let current = &candles[i];
        let next = &candles[i + 1];

        let kind = if current.is_bearish() && next.is_bullish() && next.close > current.high {
            Bias::Bullish
        } else if current.is_bullish() && next.is_bearish() && next.close < current.low {
            Bias::Bearish
        } else {
            continue;
        };

        blocks.push(OrderBlock {
            kind,
            open: current.open,
            high: current.high,
            low: current.low,
            close: current.close,
            index: i,
            time: current.time,
        });
    }

    keep_most_recent(blocks, keep)
}

/// Detect fair value gaps between candle i - 2 and candle i; the middle candle is
/// not examined.
pub fn detect_fair_value_gaps(candles: &[Candle], keep: usize) -> Vec<FairValueGap> {
    let mut gaps = Vec::new();

    for i in 2..candles.len() {
        let first = &candles[i - 2];
        let third = &candles[i];

        if third.low > first.high {
            gaps.push(FairValueGap {
                kind: Bias::Bullish,
                high: third.low,
                low: first.high,
                index: i,
                time: third.time,
            });
        } else if third.high < first.low {
            gaps.push(FairValueGap {
                kind: Bias::Bearish,
                high: first.low,
                low: third.high,
                index: i,
                time: third.time,
            });
        }
    }

    keep_most_recent(gaps, keep)
}

fn keep_most_recent<T>(mut items: Vec<T>, keep: usize) -> Vec<T> {
    let excess = items.len().saturating_sub(keep);
    items.drain(..excess);
    items
}

pub fn detect_ict_patterns(candles: &[Candle], max_order_blocks: usize, max_gaps: usize) -> IctPatterns {
    let order_blocks = detect_order_blocks(candles, max_order_blocks);
    let fair_value_gaps = detect_fair_value_gaps(candles, max_gaps);

    debug!(
        order_blocks = order_blocks.len(),
        fair_value_gaps = fair_value_gaps.len(),
        "Detected ICT patterns"
    );

    IctPatterns {
        order_blocks,
        fair_value_gaps,
    }
}
