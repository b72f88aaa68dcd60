use crate::weights::Progress;
use indicatif::{ProgressBar, ProgressStyle};

const FRACTION_STEPS: u64 = 1000;

/// Terminal progress for weight downloads.
///
/// The bar is created lazily on the first update, as a percentage bar when the
/// length is known and a byte-counting spinner otherwise.
#[derive(Default)]
pub struct DownloadBar {
    bar: Option<ProgressBar>,
}

impl DownloadBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, progress: Progress) {
        match progress {
            Progress::Fraction(fraction) => {
                let bar = self.bar.get_or_insert_with(|| {
                    let bar = ProgressBar::new(FRACTION_STEPS);
                    bar.set_style(fraction_style());
                    bar.set_message("Downloading weights");
                    bar
                });
                bar.set_position((fraction * FRACTION_STEPS as f64).round() as u64);
            }
            Progress::Indeterminate { received } => {
                let bar = self.bar.get_or_insert_with(|| {
                    let bar = ProgressBar::new_spinner();
                    bar.set_style(spinner_style());
                    bar.set_message("Downloading weights");
                    bar
                });
                bar.set_position(received);
                bar.tick();
            }
        }
    }

    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

fn fraction_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg} {wide_bar:.cyan/blue} {percent:>3}% [{elapsed_precise}]")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg} {spinner:.cyan.bold} {bytes} [{elapsed_precise}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}
