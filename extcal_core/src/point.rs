//! Calibration points and the bounded table they are collected into.

use thiserror::Error;

/// Most points a single session accepts.
pub const MAX_POINTS: usize = 100;

/// Fewest points that define a counts-to-volts mapping.
pub const MIN_POINTS: usize = 2;

/// One operator-supplied pair: the injected reference voltage and the A/D reading for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    pub volts: f64,
    pub counts: u16,
}

impl CalibrationPoint {
    #[inline]
    pub fn new(volts: f64, counts: u16) -> Self {
        Self { volts, counts }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("calibration table is full ({limit} points)")]
pub struct TableFull {
    pub limit: usize,
}

/// Points in entry order, never more than `limit`.
///
/// Ordering and uniqueness are not checked here; the external calibration
/// routine rejects tables that are not strictly ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    points: Vec<CalibrationPoint>,
    limit: usize,
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self::with_capacity_limit(MAX_POINTS)
    }
}

impl CalibrationTable {
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            points: Vec::new(),
            limit,
        }
    }

    pub fn push(&mut self, point: CalibrationPoint) -> Result<(), TableFull> {
        if self.is_full() {
            return Err(TableFull { limit: self.limit });
        }
        self.points.push(point);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.points.len() >= self.limit
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    /// `(volts, counts)` pairs in the shape the external calibrator takes.
    pub fn as_pairs(&self) -> Vec<(f64, u16)> {
        self.points.iter().map(|p| (p.volts, p.counts)).collect()
    }

    pub fn into_points(self) -> Vec<CalibrationPoint> {
        self.points
    }
}
