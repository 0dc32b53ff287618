//! Chart generation models

use chrono::{DateTime, Days, Duration, Months, Utc};
use crate::utils::errors::ChartError;

/// Granularity of a price chart request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartUnit {
    Hours,
    Days,
    Months,
}

impl ChartUnit {
    /// Parse the unit exactly as it appears in chart URLs
    pub fn parse(unit: &str) -> Result<Self, ChartError> {
        match unit {
            "hours" => Ok(ChartUnit::Hours),
            "days" => Ok(ChartUnit::Days),
            "months" => Ok(ChartUnit::Months),
            _ => Err(ChartError::InvalidUnit(unit.to_string())),
        }
    }

    /// Chat commands also accept singular and short forms, in any case
    pub fn parse_alias(unit: &str) -> Result<Self, ChartError> {
        match unit.to_lowercase().as_str() {
            "hours" | "hour" | "h" => Ok(ChartUnit::Hours),
            "days" | "day" | "d" => Ok(ChartUnit::Days),
            "months" | "month" | "mnt" => Ok(ChartUnit::Months),
            _ => Err(ChartError::InvalidUnit(unit.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartUnit::Hours => "hours",
            ChartUnit::Days => "days",
            ChartUnit::Months => "months",
        }
    }

    /// Accepted inclusive period range for this unit
    pub fn period_bounds(&self) -> (u32, u32) {
        match self {
            ChartUnit::Hours => (1, 96),
            ChartUnit::Days => (1, 90),
            ChartUnit::Months => (1, 12),
        }
    }

    /// Axis label format for the x axis
    pub fn date_format(&self) -> &'static str {
        match self {
            ChartUnit::Hours => "%b %-d - %I:%M%p",
            ChartUnit::Days => "%b %-d",
            ChartUnit::Months => "%b %-d, %Y",
        }
    }

    /// Moving average window applied before drawing
    pub fn smoothing_window(&self, period: u32) -> usize {
        match self {
            ChartUnit::Hours => 1,
            ChartUnit::Days if period > 10 => 64,
            ChartUnit::Days => 32,
            ChartUnit::Months if period > 3 => 128,
            ChartUnit::Months => 64,
        }
    }
}

/// A validated chart request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRequest {
    pub unit: ChartUnit,
    pub period: u32,
}

impl ChartRequest {
    pub fn new(unit: ChartUnit, period: i64) -> Result<Self, ChartError> {
        let (min, max) = unit.period_bounds();
        if period < min as i64 || period > max as i64 {
            return Err(ChartError::PeriodOutOfRange {
                unit: unit.as_str(),
                period,
                min,
                max,
            });
        }

        Ok(Self { unit, period: period as u32 })
    }

    /// Parse both halves of a URL request, e.g. ("hours", "48")
    pub fn parse(unit: &str, period: &str) -> Result<Self, ChartError> {
        Self::parse_with(unit, period, ChartUnit::parse)
    }

    /// Like `parse`, with the unit aliases chat commands allow
    pub fn parse_alias(unit: &str, period: &str) -> Result<Self, ChartError> {
        Self::parse_with(unit, period, ChartUnit::parse_alias)
    }

    // The period is checked first, so a bad period is reported even when
    // the unit is unknown too
    fn parse_with(
        unit: &str,
        period: &str,
        parse_unit: fn(&str) -> Result<ChartUnit, ChartError>,
    ) -> Result<Self, ChartError> {
        let period: i64 = period
            .trim()
            .parse()
            .map_err(|_| ChartError::InvalidPeriod(period.to_string()))?;
        Self::new(parse_unit(unit)?, period)
    }

    /// Oldest timestamp included in the chart, using calendar arithmetic
    /// for days and months
    pub fn lower_bound(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let period = self.period;
        let bound = match self.unit {
            ChartUnit::Hours => now.checked_sub_signed(Duration::hours(period as i64)),
            ChartUnit::Days => now.checked_sub_days(Days::new(period as u64)),
            ChartUnit::Months => now.checked_sub_months(Months::new(period)),
        };
        bound.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Rendered PNG plus the timestamp its freshness is derived from
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub image: Vec<u8>,
    pub last_updated: DateTime<Utc>,
}
