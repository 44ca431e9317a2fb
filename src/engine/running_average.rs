// =============================================================================
// RUNNING_AVERAGE.RS — fixed-size circular sample buffer
// =============================================================================

/// Keeps the last `size` samples and their mean.
#[derive(Clone, Debug)]
pub struct RunningAverage<T> {
    data: Vec<T>,
    size: usize,
    index: usize,
    average: f64,
    full: bool,
}

impl<T: Copy + Into<f64>> RunningAverage<T> {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self { data: Vec::with_capacity(size), size, index: 0, average: 0.0, full: false }
    }

    pub fn add(&mut self, value: T) {
        let n = self.size as f64;
        if self.full {
            let removed = self.data[self.index];
            self.data[self.index] = value;
            self.average += (value.into() - removed.into()) / n;
        } else {
            self.data.push(value);
            let len = self.data.len() as f64;
            self.average = self.data.iter().map(|v| (*v).into()).sum::<f64>() / len;
        }
        self.index = (self.index + 1) % self.size;
        self.full = self.full || self.data.len() == self.size;
    }

    /// Fill every slot with `value`.
    pub fn add_all(&mut self, value: T) {
        self.reset();
        for _ in 0..self.size {
            self.add(value);
        }
    }

    pub fn reset(&mut self) {
        self.data.clear();
        self.index = 0;
        self.average = 0.0;
        self.full = false;
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    /// Sample `i`, oldest first.
    pub fn get(&self, i: usize) -> Option<T> {
        if i >= self.count() {
            return None;
        }
        let actual = if self.full { (self.index + i) % self.size } else { i };
        self.data.get(actual).copied()
    }

    /// Samples currently held.
    pub fn count(&self) -> usize {
        if self.full { self.size } else { self.index }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Raw storage in slot order.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Slot the next sample will be written to.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.count()).filter_map(move |i| self.get(i))
    }
}
