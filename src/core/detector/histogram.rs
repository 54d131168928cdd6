use std::io::{self, Write};

pub const DEFAULT_BINS: usize = 3000;
pub const DEFAULT_MAX_ENERGY: f64 = 3000.0;

/// Fixed-binning energy spectrum of one detector.
///
/// Diagnostic only, not part of the listmode records. Each worker fills its
/// own copy; copies are summed at the end of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyHistogram {
    min: f64,
    max: f64,
    counts: Vec<u64>,
    underflow: u64,
    overflow: u64,
}

impl EnergyHistogram {
    pub fn new(bins: usize, min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            counts: vec![0; bins],
            underflow: 0,
            overflow: 0,
        }
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn underflow(&self) -> u64 {
        self.underflow
    }

    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    /// Total entries including under- and overflow
    pub fn entries(&self) -> u64 {
        self.counts.iter().sum::<u64>() + self.underflow + self.overflow
    }

    fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.counts.len() as f64
    }

    /// Lower edge of bin `bin`
    pub fn bin_low(&self, bin: usize) -> f64 {
        self.min + bin as f64 * self.bin_width()
    }

    pub fn fill(&mut self, energy: f64) {
        if self.counts.is_empty() {
            return;
        }
        if energy < self.min {
            self.underflow += 1;
            return;
        }
        if !(energy < self.max) {
            self.overflow += 1;
            return;
        }
        let bin = ((energy - self.min) / self.bin_width()) as usize;
        let bin = bin.min(self.counts.len() - 1);
        self.counts[bin] += 1;
    }

    /// Add another histogram's counts bin by bin. Mismatched binnings only
    /// combine over the common bins.
    pub fn merge(&mut self, other: &EnergyHistogram) {
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
        self.underflow += other.underflow;
        self.overflow += other.overflow;
    }

    /// Write non-empty bins as `detector bin_low count` lines
    pub fn write_text<W: Write>(&self, detector: usize, out: &mut W) -> io::Result<()> {
        for (bin, &count) in self.counts.iter().enumerate() {
            if count > 0 {
                writeln!(out, "{} {} {}", detector, self.bin_low(bin), count)?;
            }
        }
        Ok(())
    }
}

impl Default for EnergyHistogram {
    fn default() -> Self {
        Self::new(DEFAULT_BINS, 0.0, DEFAULT_MAX_ENERGY)
    }
}
