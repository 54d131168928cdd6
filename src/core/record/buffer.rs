use crate::core::types::{DetectorId, Field};

/// Dense `detectors x fields` array of listmode values for one event.
///
/// Each worker owns exactly one buffer for the whole run; the coordinating
/// thread owns one more as its output slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBuffer {
    values: Vec<f64>,
    detectors: usize,
    fields: usize,
    has_data: bool,
    ignored_writes: u64,
}

impl RecordBuffer {
    pub fn new(detectors: usize, fields: usize) -> Self {
        let mut buffer = Self::default();
        buffer.set_dimensions(detectors, fields);
        buffer
    }

    /// (Re)allocate storage. Prior contents are discarded and the buffer
    /// is zeroed with the data flag cleared.
    pub fn set_dimensions(&mut self, detectors: usize, fields: usize) {
        self.detectors = detectors;
        self.fields = fields;
        self.values = vec![0.0; detectors * fields];
        self.has_data = false;
    }

    pub fn detectors(&self) -> usize {
        self.detectors
    }

    pub fn fields(&self) -> usize {
        self.fields
    }

    /// Total number of values (`detectors * fields`)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn has_data(&self) -> bool {
        self.has_data
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Writes dropped because an index was out of range
    pub fn ignored_writes(&self) -> u64 {
        self.ignored_writes
    }

    /// Store a value. Out-of-range indices are ignored (and counted).
    pub fn set_value(&mut self, detector: DetectorId, field: usize, value: f64) {
        if detector >= self.detectors || field >= self.fields {
            self.ignored_writes += 1;
            return;
        }
        self.values[detector * self.fields + field] = value;
        self.has_data = true;
    }

    pub fn set_field(&mut self, detector: DetectorId, field: Field, value: f64) {
        self.set_value(detector, field.index(), value);
    }

    /// Read a value; out-of-range indices read as zero
    pub fn get_value(&self, detector: DetectorId, field: usize) -> f64 {
        if detector >= self.detectors || field >= self.fields {
            return 0.0;
        }
        self.values[detector * self.fields + field]
    }

    pub fn get_field(&self, detector: DetectorId, field: Field) -> f64 {
        self.get_value(detector, field.index())
    }

    /// Zero all values and clear the data flag
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
        self.has_data = false;
    }

    /// Copy values from `source`, truncated to the smaller of the two
    /// buffers. Only the flat values are copied; dimensions, the data flag
    /// and any values past the copied prefix keep their current state.
    pub fn copy_from(&mut self, source: &[f64]) {
        let n = self.values.len().min(source.len());
        self.values[..n].copy_from_slice(&source[..n]);
    }
}
