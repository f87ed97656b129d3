//! Loading and validating [`SepaConfig`] from a [`ConfigPort`].
//!
//! Every key is optional and falls back to its default. Values that are
//! present must parse, and the assembled config must pass
//! [`validate_sepa_config`] before any scan runs.

use crate::domain::config::{
    BaseConfig, BaseQualityConfig, BreakoutConfig, GradeThresholds, RelativeStrengthConfig,
    ScanSettings, SepaConfig, TrendConfig, VolumeConfig,
};
use crate::domain::error::SepaError;
use crate::domain::universe::{parse_tickers, sanitize_ticker};
use crate::ports::config_port::ConfigPort;
use log::warn;

const KNOWN_SECTIONS: [&str; 8] = [
    "scan",
    "trend",
    "base",
    "base_quality",
    "relative_strength",
    "volume",
    "breakout",
    "grade",
];

pub fn load_sepa_config(config: &dyn ConfigPort) -> Result<SepaConfig, SepaError> {
    for section in config.sections() {
        if !KNOWN_SECTIONS.contains(&section.as_str()) {
            warn!("ignoring unknown config section [{}]", section);
        }
    }

    let cfg = SepaConfig {
        scan: load_scan(config)?,
        trend: load_trend(config)?,
        base: load_base(config)?,
        base_quality: load_base_quality(config)?,
        relative_strength: load_relative_strength(config)?,
        volume: load_volume(config)?,
        breakout: load_breakout(config)?,
        grade: load_grade(config)?,
    };
    validate_sepa_config(&cfg)?;
    Ok(cfg)
}

fn get_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, SepaError> {
    let value = config.get_int(section, key, default as i64)?;
    usize::try_from(value).map_err(|_| {
        SepaError::config_invalid(section, key, format!("must be non-negative, got {}", value))
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn load_scan(config: &dyn ConfigPort) -> Result<ScanSettings, SepaError> {
    let d = ScanSettings::default();
    let benchmark = match non_empty(config.get_string("scan", "benchmark")) {
        Some(raw) => sanitize_ticker(&raw)?,
        None => d.benchmark,
    };
    let tickers = match non_empty(config.get_string("scan", "tickers")) {
        Some(raw) => parse_tickers(&raw)?,
        None => d.tickers,
    };
    Ok(ScanSettings {
        benchmark,
        data_dir: non_empty(config.get_string("scan", "data_dir")),
        tickers,
    })
}

fn load_trend(config: &dyn ConfigPort) -> Result<TrendConfig, SepaError> {
    let d = TrendConfig::default();
    let s = "trend";
    Ok(TrendConfig {
        min_history: get_usize(config, s, "min_history", d.min_history)?,
        sma_fast: get_usize(config, s, "sma_fast", d.sma_fast)?,
        sma_mid: get_usize(config, s, "sma_mid", d.sma_mid)?,
        sma_slow: get_usize(config, s, "sma_slow", d.sma_slow)?,
        slope_lookback: get_usize(config, s, "slope_lookback", d.slope_lookback)?,
        slope_lookback_fallback: get_usize(
            config,
            s,
            "slope_lookback_fallback",
            d.slope_lookback_fallback,
        )?,
        year_bars: get_usize(config, s, "year_bars", d.year_bars)?,
        min_above_52w_low_pct: config.get_double(
            s,
            "min_above_52w_low_pct",
            d.min_above_52w_low_pct,
        )?,
        max_below_52w_high_pct: config.get_double(
            s,
            "max_below_52w_high_pct",
            d.max_below_52w_high_pct,
        )?,
        late_stage_warning_pct: config.get_double(
            s,
            "late_stage_warning_pct",
            d.late_stage_warning_pct,
        )?,
    })
}

fn load_base(config: &dyn ConfigPort) -> Result<BaseConfig, SepaError> {
    let d = BaseConfig::default();
    let s = "base";
    Ok(BaseConfig {
        lookback_bars: get_usize(config, s, "lookback_bars", d.lookback_bars)?,
        min_bars: get_usize(config, s, "min_bars", d.min_bars)?,
        volatility_window: get_usize(config, s, "volatility_window", d.volatility_window)?,
        volatility_ratio: config.get_double(s, "volatility_ratio", d.volatility_ratio)?,
        min_consecutive_days: get_usize(config, s, "min_consecutive_days", d.min_consecutive_days)?,
        recent_window: get_usize(config, s, "recent_window", d.recent_window)?,
        recent_window_short: get_usize(config, s, "recent_window_short", d.recent_window_short)?,
        min_percentage: config.get_double(s, "min_percentage", d.min_percentage)?,
        min_percentage_days: get_usize(config, s, "min_percentage_days", d.min_percentage_days)?,
        range_short_bars: get_usize(config, s, "range_short_bars", d.range_short_bars)?,
        range_long_bars: get_usize(config, s, "range_long_bars", d.range_long_bars)?,
        range_short_max_pct: config.get_double(s, "range_short_max_pct", d.range_short_max_pct)?,
        range_long_max_pct: config.get_double(s, "range_long_max_pct", d.range_long_max_pct)?,
        range_long_min_bars: get_usize(config, s, "range_long_min_bars", d.range_long_min_bars)?,
        min_weeks: config.get_double(s, "min_weeks", d.min_weeks)?,
        max_weeks: config.get_double(s, "max_weeks", d.max_weeks)?,
        max_depth_pct: config.get_double(s, "max_depth_pct", d.max_depth_pct)?,
        bars_per_week: config.get_double(s, "bars_per_week", d.bars_per_week)?,
    })
}

fn load_base_quality(config: &dyn ConfigPort) -> Result<BaseQualityConfig, SepaError> {
    let d = BaseQualityConfig::default();
    let s = "base_quality";
    Ok(BaseQualityConfig {
        min_weeks: config.get_double(s, "min_weeks", d.min_weeks)?,
        max_weeks: config.get_double(s, "max_weeks", d.max_weeks)?,
        max_depth_pct: config.get_double(s, "max_depth_pct", d.max_depth_pct)?,
        depth_warning_pct: config.get_double(s, "depth_warning_pct", d.depth_warning_pct)?,
        max_volatility_ratio: config.get_double(s, "max_volatility_ratio", d.max_volatility_ratio)?,
        volatility_reference_bars: get_usize(
            config,
            s,
            "volatility_reference_bars",
            d.volatility_reference_bars,
        )?,
        min_avg_close_position_pct: config.get_double(
            s,
            "min_avg_close_position_pct",
            d.min_avg_close_position_pct,
        )?,
    })
}

fn load_relative_strength(config: &dyn ConfigPort) -> Result<RelativeStrengthConfig, SepaError> {
    let d = RelativeStrengthConfig::default();
    let s = "relative_strength";
    Ok(RelativeStrengthConfig {
        rsi_period: get_usize(config, s, "rsi_period", d.rsi_period)?,
        rsi_min: config.get_double(s, "rsi_min", d.rsi_min)?,
        line_lookback: get_usize(config, s, "line_lookback", d.line_lookback)?,
        high_lookback: get_usize(config, s, "high_lookback", d.high_lookback)?,
        decline_warning_pct: config.get_double(s, "decline_warning_pct", d.decline_warning_pct)?,
        decline_failure_pct: config.get_double(s, "decline_failure_pct", d.decline_failure_pct)?,
        require_outperformance: config.get_bool(
            s,
            "require_outperformance",
            d.require_outperformance,
        )?,
    })
}

fn load_volume(config: &dyn ConfigPort) -> Result<VolumeConfig, SepaError> {
    let d = VolumeConfig::default();
    let s = "volume";
    Ok(VolumeConfig {
        pre_base_bars: get_usize(config, s, "pre_base_bars", d.pre_base_bars)?,
        contraction_warning: config.get_double(s, "contraction_warning", d.contraction_warning)?,
        recent_bars: get_usize(config, s, "recent_bars", d.recent_bars)?,
        average_bars: get_usize(config, s, "average_bars", d.average_bars)?,
        expansion_min: config.get_double(s, "expansion_min", d.expansion_min)?,
        heavy_sell_multiplier: config.get_double(
            s,
            "heavy_sell_multiplier",
            d.heavy_sell_multiplier,
        )?,
    })
}

fn load_breakout(config: &dyn ConfigPort) -> Result<BreakoutConfig, SepaError> {
    let d = BreakoutConfig::default();
    let s = "breakout";
    Ok(BreakoutConfig {
        window_bars: get_usize(config, s, "window_bars", d.window_bars)?,
        pivot_clearance_pct: config.get_double(s, "pivot_clearance_pct", d.pivot_clearance_pct)?,
        min_close_position_pct: config.get_double(
            s,
            "min_close_position_pct",
            d.min_close_position_pct,
        )?,
        average_bars: get_usize(config, s, "average_bars", d.average_bars)?,
        min_volume_ratio: config.get_double(s, "min_volume_ratio", d.min_volume_ratio)?,
    })
}

fn load_grade(config: &dyn ConfigPort) -> Result<GradeThresholds, SepaError> {
    let d = GradeThresholds::default();
    let s = "grade";
    Ok(GradeThresholds {
        a_plus_max: get_usize(config, s, "a_plus_max", d.a_plus_max)?,
        a_max: get_usize(config, s, "a_max", d.a_max)?,
        b_max: get_usize(config, s, "b_max", d.b_max)?,
        c_max: get_usize(config, s, "c_max", d.c_max)?,
    })
}

fn require(ok: bool, section: &str, key: &str, reason: &str) -> Result<(), SepaError> {
    if ok {
        Ok(())
    } else {
        Err(SepaError::config_invalid(section, key, reason))
    }
}

fn percent(value: f64, section: &str, key: &str) -> Result<(), SepaError> {
    require(
        (0.0..=100.0).contains(&value),
        section,
        key,
        "must be between 0 and 100",
    )
}

pub fn validate_sepa_config(cfg: &SepaConfig) -> Result<(), SepaError> {
    validate_trend(&cfg.trend)?;
    validate_base(&cfg.base)?;
    validate_base_quality(&cfg.base_quality)?;
    validate_relative_strength(&cfg.relative_strength)?;
    validate_volume(&cfg.volume)?;
    validate_breakout(&cfg.breakout)?;
    validate_grade(&cfg.grade)?;
    Ok(())
}

fn validate_trend(t: &TrendConfig) -> Result<(), SepaError> {
    let s = "trend";
    require(t.min_history > 0, s, "min_history", "must be positive")?;
    require(t.sma_fast > 0, s, "sma_fast", "must be positive")?;
    require(
        t.sma_fast < t.sma_mid && t.sma_mid < t.sma_slow,
        s,
        "sma_mid",
        "SMA windows must be strictly increasing (fast < mid < slow)",
    )?;
    require(t.slope_lookback_fallback > 0, s, "slope_lookback_fallback", "must be positive")?;
    require(
        t.slope_lookback >= t.slope_lookback_fallback,
        s,
        "slope_lookback",
        "must be at least slope_lookback_fallback",
    )?;
    require(t.year_bars > 0, s, "year_bars", "must be positive")?;
    require(t.min_above_52w_low_pct >= 0.0, s, "min_above_52w_low_pct", "must be non-negative")?;
    percent(t.max_below_52w_high_pct, s, "max_below_52w_high_pct")?;
    require(
        (0.0..=t.max_below_52w_high_pct).contains(&t.late_stage_warning_pct),
        s,
        "late_stage_warning_pct",
        "must be between 0 and max_below_52w_high_pct",
    )
}

fn validate_base(b: &BaseConfig) -> Result<(), SepaError> {
    let s = "base";
    require(b.min_bars >= 2, s, "min_bars", "must be at least 2")?;
    require(b.lookback_bars >= b.min_bars, s, "lookback_bars", "must be at least min_bars")?;
    require(b.volatility_window >= 2, s, "volatility_window", "must be at least 2")?;
    require(b.volatility_ratio > 0.0, s, "volatility_ratio", "must be positive")?;
    require(
        b.min_percentage > 0.0 && b.min_percentage <= 1.0,
        s,
        "min_percentage",
        "must be in (0, 1]",
    )?;
    require(b.recent_window > 0, s, "recent_window", "must be positive")?;
    require(b.range_short_bars > 0, s, "range_short_bars", "must be positive")?;
    require(
        b.range_long_bars >= b.range_short_bars,
        s,
        "range_long_bars",
        "must be at least range_short_bars",
    )?;
    require(b.range_short_max_pct > 0.0, s, "range_short_max_pct", "must be positive")?;
    require(b.range_long_max_pct > 0.0, s, "range_long_max_pct", "must be positive")?;
    require(b.min_weeks > 0.0, s, "min_weeks", "must be positive")?;
    require(b.max_weeks >= b.min_weeks, s, "max_weeks", "must be at least min_weeks")?;
    percent(b.max_depth_pct, s, "max_depth_pct")?;
    require(b.bars_per_week > 0.0, s, "bars_per_week", "must be positive")
}

fn validate_base_quality(q: &BaseQualityConfig) -> Result<(), SepaError> {
    let s = "base_quality";
    require(q.max_weeks >= q.min_weeks, s, "max_weeks", "must be at least min_weeks")?;
    percent(q.max_depth_pct, s, "max_depth_pct")?;
    require(
        (0.0..=q.max_depth_pct).contains(&q.depth_warning_pct),
        s,
        "depth_warning_pct",
        "must be between 0 and max_depth_pct",
    )?;
    require(q.max_volatility_ratio > 0.0, s, "max_volatility_ratio", "must be positive")?;
    require(
        q.volatility_reference_bars >= 2,
        s,
        "volatility_reference_bars",
        "must be at least 2",
    )?;
    percent(q.min_avg_close_position_pct, s, "min_avg_close_position_pct")
}

fn validate_relative_strength(r: &RelativeStrengthConfig) -> Result<(), SepaError> {
    let s = "relative_strength";
    require(r.rsi_period > 0, s, "rsi_period", "must be positive")?;
    percent(r.rsi_min, s, "rsi_min")?;
    require(r.line_lookback >= 2, s, "line_lookback", "must be at least 2")?;
    require(
        r.high_lookback > 0 && r.high_lookback <= r.line_lookback,
        s,
        "high_lookback",
        "must be between 1 and line_lookback",
    )?;
    require(r.decline_warning_pct >= 0.0, s, "decline_warning_pct", "must be non-negative")?;
    require(
        r.decline_failure_pct >= r.decline_warning_pct,
        s,
        "decline_failure_pct",
        "must be at least decline_warning_pct",
    )
}

fn validate_volume(v: &VolumeConfig) -> Result<(), SepaError> {
    let s = "volume";
    require(v.pre_base_bars > 0, s, "pre_base_bars", "must be positive")?;
    require(v.recent_bars > 0, s, "recent_bars", "must be positive")?;
    require(v.average_bars >= v.recent_bars, s, "average_bars", "must be at least recent_bars")?;
    require(v.contraction_warning > 0.0, s, "contraction_warning", "must be positive")?;
    require(v.expansion_min > 0.0, s, "expansion_min", "must be positive")?;
    require(v.heavy_sell_multiplier > 0.0, s, "heavy_sell_multiplier", "must be positive")
}

fn validate_breakout(b: &BreakoutConfig) -> Result<(), SepaError> {
    let s = "breakout";
    require(b.window_bars > 0, s, "window_bars", "must be positive")?;
    require(b.pivot_clearance_pct >= 0.0, s, "pivot_clearance_pct", "must be non-negative")?;
    percent(b.min_close_position_pct, s, "min_close_position_pct")?;
    require(b.average_bars > 0, s, "average_bars", "must be positive")?;
    require(b.min_volume_ratio > 0.0, s, "min_volume_ratio", "must be positive")
}

fn validate_grade(g: &GradeThresholds) -> Result<(), SepaError> {
    require(
        g.a_plus_max <= g.a_max && g.a_max <= g.b_max && g.b_max <= g.c_max,
        "grade",
        "a_max",
        "thresholds must be non-decreasing (a_plus_max <= a_max <= b_max <= c_max)",
    )
}
