//! Delay Line - fixed-capacity circular history of both reservoirs
//!
//! The buffers and the step counter form one unit: they are created together,
//! advanced together and thrown away together on reset. The line is always
//! longer than the delay by a margin of 10 slots (minimum 8), so the write at
//! `i + 1` never lands on the slot read as "delayed" within the same step.

/// Reservoir values stored in one slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reservoirs {
    /// Positive affect
    pub p: f64,
    /// Negative affect
    pub n: f64,
}

impl Reservoirs {
    pub fn new(p: f64, n: f64) -> Self {
        Self { p, n }
    }
}

/// Circular buffer pair with a monotonically increasing step counter.
#[derive(Debug, Clone)]
pub struct DelayLine {
    p: Vec<f64>,
    n: Vec<f64>,
    delay_steps: usize,
    step: u64,
}

impl DelayLine {
    /// Fresh line of length `max(8, delay_steps + 10)`, slot 0 seeded with
    /// `initial`, everything else zero.
    pub fn new(delay_steps: usize, initial: Reservoirs) -> Self {
        let len = (delay_steps + 10).max(8);
        let mut p = vec![0.0; len];
        let mut n = vec![0.0; len];
        p[0] = initial.p;
        n[0] = initial.n;
        Self {
            p,
            n,
            delay_steps,
            step: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.p.len()
    }

    pub fn is_empty(&self) -> bool {
        self.p.is_empty()
    }

    pub fn delay_steps(&self) -> usize {
        self.delay_steps
    }

    /// Number of completed pushes since the last reset.
    pub fn step_count(&self) -> u64 {
        self.step
    }

    /// Map a possibly negative logical step to a buffer slot.
    fn slot(&self, logical: i128) -> usize {
        logical.rem_euclid(self.len() as i128) as usize
    }

    /// Slot holding the current value.
    pub fn current_index(&self) -> usize {
        self.slot(self.step as i128)
    }

    /// Slot holding the value from `delay_steps` pushes ago.
    pub fn delayed_index(&self) -> usize {
        self.slot(self.step as i128 - self.delay_steps as i128)
    }

    pub fn current(&self) -> Reservoirs {
        self.at(self.current_index())
    }

    pub fn delayed(&self) -> Reservoirs {
        self.at(self.delayed_index())
    }

    /// Raw slot access.
    pub fn at(&self, slot: usize) -> Reservoirs {
        Reservoirs::new(self.p[slot], self.n[slot])
    }

    /// Write the next value into slot `(i + 1) mod len` and advance `i`.
    pub fn push(&mut self, next: Reservoirs) {
        let idx = self.slot(self.step as i128 + 1);
        self.p[idx] = next.p;
        self.n[idx] = next.n;
        self.step += 1;
    }

    #[cfg(test)]
    pub(crate) fn poke(&mut self, slot: usize, value: Reservoirs) {
        self.p[slot] = value.p;
        self.n[slot] = value.n;
    }
}
