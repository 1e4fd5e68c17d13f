use std::io::Write;

/// Reports stepping progress. Observational only: implementations must not
/// touch simulation state.
pub trait ProgressReporter: Send {
    fn report(&self, current_step: u64, total_steps: u64);
}

/// Draws an in-place text bar on stdout.
pub struct TextProgress {
    n_bars: usize,
}

impl TextProgress {
    pub fn new(n_bars: usize) -> Self {
        TextProgress { n_bars }
    }
}

impl Default for TextProgress {
    fn default() -> Self {
        TextProgress::new(60)
    }
}

impl ProgressReporter for TextProgress {
    fn report(&self, current_step: u64, total_steps: u64) {
        if total_steps == 0 {
            return;
        }
        let filled = ((current_step + 1) as usize * self.n_bars) / total_steps as usize;
        let filled = filled.min(self.n_bars);
        let mut out = std::io::stdout();
        let _ = write!(
            out,
            "\r[{}{}] {}/{}",
            "-".repeat(filled),
            " ".repeat(self.n_bars - filled),
            current_step,
            total_steps
        );
        let _ = out.flush();
    }
}

/// Swallows progress reports; used in tests.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn report(&self, _current_step: u64, _total_steps: u64) {}
}
