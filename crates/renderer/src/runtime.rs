use std::time::Instant;

/// Abstraction over where animation tick readings originate from.
///
/// Readings are milliseconds on a monotonic counter. The counter is 32 bits
/// wide and allowed to wrap; consumers take differences with wrapping
/// arithmetic.
pub trait TickSource {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Produces the reading for the current tick.
    fn ticks(&mut self) -> u32;
}

/// Tick source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTickSource {
    origin: Instant,
}

impl SystemTickSource {
    /// Creates a system tick source counting from `Instant::now()`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTickSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TickSource for SystemTickSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
    }

    fn ticks(&mut self) -> u32 {
        // Truncation is the wrap-around.
        self.origin.elapsed().as_millis() as u32
    }
}

/// Tick source that advances by a fixed step on every reading.
///
/// Used for headless simulation and tests where wall-clock time would make
/// results irreproducible.
#[derive(Debug, Clone, Copy)]
pub struct SteppedTickSource {
    start: u32,
    step: u32,
    next: u32,
}

impl SteppedTickSource {
    /// First reading is `start`; each following reading adds `step`.
    pub fn new(start: u32, step: u32) -> Self {
        Self {
            start,
            step,
            next: start,
        }
    }

    pub fn step(&self) -> u32 {
        self.step
    }
}

impl TickSource for SteppedTickSource {
    fn reset(&mut self) {
        self.next = self.start;
    }

    fn ticks(&mut self) -> u32 {
        let reading = self.next;
        self.next = self.next.wrapping_add(self.step);
        reading
    }
}

/// Convenient alias for owning tick sources behind trait objects.
pub type BoxedTickSource = Box<dyn TickSource + Send>;
