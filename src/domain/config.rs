//! Named thresholds for every evaluator.
//!
//! Evaluators never hardcode numbers; each reads its own section of
//! [`SepaConfig`]. Defaults reproduce the documented methodology.

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SepaConfig {
    pub scan: ScanSettings,
    pub trend: TrendConfig,
    pub base: BaseConfig,
    pub base_quality: BaseQualityConfig,
    pub relative_strength: RelativeStrengthConfig,
    pub volume: VolumeConfig,
    pub breakout: BreakoutConfig,
    pub grade: GradeThresholds,
}

/// Where the CLI finds its inputs. The engine itself only reads `benchmark`
/// indirectly, through the series the caller passes in.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanSettings {
    pub benchmark: String,
    pub data_dir: Option<String>,
    pub tickers: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            benchmark: "^GDAXI".to_string(),
            data_dir: None,
            tickers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrendConfig {
    /// Bars required before an instrument is evaluated at all.
    pub min_history: usize,
    pub sma_fast: usize,
    pub sma_mid: usize,
    pub sma_slow: usize,
    pub slope_lookback: usize,
    pub slope_lookback_fallback: usize,
    /// Bars making up the 52-week window.
    pub year_bars: usize,
    pub min_above_52w_low_pct: f64,
    pub max_below_52w_high_pct: f64,
    /// Closer than this to the 52-week high flags late-stage risk.
    pub late_stage_warning_pct: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            min_history: 200,
            sma_fast: 50,
            sma_mid: 150,
            sma_slow: 200,
            slope_lookback: 20,
            slope_lookback_fallback: 10,
            year_bars: 252,
            min_above_52w_low_pct: 30.0,
            max_below_52w_high_pct: 15.0,
            late_stage_warning_pct: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseConfig {
    pub lookback_bars: usize,
    pub min_bars: usize,
    pub volatility_window: usize,
    pub volatility_ratio: f64,
    pub min_consecutive_days: usize,
    pub recent_window: usize,
    pub recent_window_short: usize,
    pub min_percentage: f64,
    pub min_percentage_days: usize,
    pub range_short_bars: usize,
    pub range_long_bars: usize,
    pub range_short_max_pct: f64,
    pub range_long_max_pct: f64,
    /// The long price-range window is only tried with at least this many bars.
    pub range_long_min_bars: usize,
    pub min_weeks: f64,
    pub max_weeks: f64,
    pub max_depth_pct: f64,
    pub bars_per_week: f64,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            lookback_bars: 60,
            min_bars: 20,
            volatility_window: 10,
            volatility_ratio: 0.85,
            min_consecutive_days: 10,
            recent_window: 30,
            recent_window_short: 20,
            min_percentage: 0.55,
            min_percentage_days: 15,
            range_short_bars: 30,
            range_long_bars: 60,
            range_short_max_pct: 15.0,
            range_long_max_pct: 25.0,
            range_long_min_bars: 40,
            min_weeks: 2.0,
            max_weeks: 12.0,
            max_depth_pct: 35.0,
            bars_per_week: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseQualityConfig {
    pub min_weeks: f64,
    pub max_weeks: f64,
    pub max_depth_pct: f64,
    pub depth_warning_pct: f64,
    pub max_volatility_ratio: f64,
    pub volatility_reference_bars: usize,
    pub min_avg_close_position_pct: f64,
}

impl Default for BaseQualityConfig {
    fn default() -> Self {
        Self {
            min_weeks: 3.0,
            max_weeks: 8.0,
            max_depth_pct: 25.0,
            depth_warning_pct: 20.0,
            max_volatility_ratio: 1.5,
            volatility_reference_bars: 252,
            min_avg_close_position_pct: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelativeStrengthConfig {
    pub rsi_period: usize,
    pub rsi_min: f64,
    pub line_lookback: usize,
    pub high_lookback: usize,
    pub decline_warning_pct: f64,
    pub decline_failure_pct: f64,
    pub require_outperformance: bool,
}

impl Default for RelativeStrengthConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_min: 60.0,
            line_lookback: 60,
            high_lookback: 20,
            decline_warning_pct: 5.0,
            decline_failure_pct: 10.0,
            require_outperformance: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolumeConfig {
    pub pre_base_bars: usize,
    pub contraction_warning: f64,
    pub recent_bars: usize,
    pub average_bars: usize,
    pub expansion_min: f64,
    pub heavy_sell_multiplier: f64,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            pre_base_bars: 20,
            contraction_warning: 0.9,
            recent_bars: 5,
            average_bars: 20,
            expansion_min: 1.2,
            heavy_sell_multiplier: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BreakoutConfig {
    pub window_bars: usize,
    pub pivot_clearance_pct: f64,
    pub min_close_position_pct: f64,
    pub average_bars: usize,
    pub min_volume_ratio: f64,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            window_bars: 5,
            pivot_clearance_pct: 2.0,
            min_close_position_pct: 70.0,
            average_bars: 20,
            min_volume_ratio: 1.2,
        }
    }
}

/// Highest failure count still earning each grade; above `c_max` is F.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradeThresholds {
    pub a_plus_max: usize,
    pub a_max: usize,
    pub b_max: usize,
    pub c_max: usize,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            a_plus_max: 0,
            a_max: 2,
            b_max: 3,
            c_max: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_methodology() {
        let cfg = SepaConfig::default();
        assert_eq!(cfg.scan.benchmark, "^GDAXI");
        assert_eq!(cfg.trend.min_history, 200);
        assert_eq!(
            (cfg.trend.sma_fast, cfg.trend.sma_mid, cfg.trend.sma_slow),
            (50, 150, 200)
        );
        assert_eq!(cfg.base.volatility_ratio, 0.85);
        assert_eq!(cfg.relative_strength.rsi_period, 14);
        assert_eq!(cfg.volume.expansion_min, 1.2);
        assert_eq!(cfg.breakout.pivot_clearance_pct, 2.0);
        assert_eq!(cfg.grade.c_max, 4);
    }
}
