use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const DEFAULT_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] {msg} [{bar:30}] {pos}/{len} ({eta})";

/// Creates and configures a new `ProgressBar`, or a spinner when `total_items` is 0.
pub fn create_progress_bar(total_items: u64, message: &str, template: &str) -> ProgressBar {
    let pb = if total_items == 0 {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::new(total_items)
    };
    pb.set_message(message.to_string());
    pb.set_style(
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}

/// Completion counter shared by every worker. It only reports progress and
/// never decides what runs.
pub struct ProgressTracker {
    total: usize,
    completed: AtomicUsize,
    bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(total: usize, message: &str) -> Self {
        ProgressTracker {
            total,
            completed: AtomicUsize::new(0),
            bar: create_progress_bar(total as u64, message, DEFAULT_BAR_TEMPLATE),
        }
    }

    /// A tracker that draws nothing; status lines still go to stdout.
    pub fn hidden(total: usize) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden());
        ProgressTracker {
            total,
            completed: AtomicUsize::new(0),
            bar,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Adds one completion and returns the new count, never exceeding `total`.
    pub fn increment(&self) -> usize {
        let previous = self
            .completed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| {
                (c < self.total).then_some(c + 1)
            })
            .unwrap_or(self.total);
        let now = (previous + 1).min(self.total);
        self.bar.set_position(now as u64);
        now
    }

    /// Counts a finished document and prints `[k/total] id: status`.
    pub fn record(&self, document_id: &str, status: &str) -> usize {
        let done = self.increment();
        self.print_line(done, document_id, status);
        done
    }

    /// Prints a status line without counting, e.g. before a retry.
    pub fn note(&self, document_id: &str, status: &str) {
        self.print_line(self.completed(), document_id, status);
    }

    fn print_line(&self, done: usize, document_id: &str, status: &str) {
        let line = format!("   [{}/{}] {}: {}", done, self.total, document_id, status);
        if self.bar.is_hidden() {
            println!("{}", line);
        } else {
            self.bar.suspend(|| println!("{}", line));
        }
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
