//! Fixed-capacity circular delay line used by the oversampling filters

/// Circular buffer holding the most recent `capacity` input samples.
///
/// Writes advance a cursor with wrap-around; reads address samples by age,
/// where age 0 is the sample written last. Slots that have never been written
/// read as zero, so a fresh line behaves like a filter primed with silence.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayLine {
    buffer: Vec<f64>,
    cursor: usize,
}

impl DelayLine {
    /// Create a zeroed delay line. Capacity is clamped to at least one slot.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Index of the slot the next sample will be written to
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Store a sample and advance the write cursor
    pub fn push(&mut self, sample: f64) {
        self.buffer[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % self.buffer.len();
    }

    /// Sample written `age` pushes ago, i.e. `buffer[(cursor - 1 - age) mod len]`
    pub fn get(&self, age: usize) -> f64 {
        let len = self.buffer.len();
        let age = age % len;
        self.buffer[(self.cursor + len - 1 - age) % len]
    }

    /// Newest-first iteration over the stored samples
    pub fn iter_recent(&self) -> impl Iterator<Item = f64> + '_ {
        let (recent, older) = self.buffer.split_at(self.cursor);
        recent.iter().rev().chain(older.iter().rev()).copied()
    }

    /// Convolve the stored history with `coeffs`: `sum(get(i) * coeffs[i])`.
    ///
    /// Extra coefficients beyond the capacity are ignored.
    pub fn dot(&self, coeffs: &[f64]) -> f64 {
        self.iter_recent()
            .zip(coeffs)
            .map(|(sample, coeff)| sample * coeff)
            .sum()
    }

    /// Zero the history and rewind the cursor
    pub fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|s| *s = 0.0);
        self.cursor = 0;
    }
}
