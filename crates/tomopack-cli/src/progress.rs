use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tomopack::engine::progress::{Progress, ProgressCallback};
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Bridges the core's progress callbacks onto a single terminal progress bar:
/// phases render as a spinner, tasks as a bounded bar.
#[derive(Clone)]
pub struct ProgressBridge {
    bar: Arc<Mutex<ProgressBar>>,
}

impl ProgressBridge {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        bar.finish_and_clear();

        Self {
            bar: Arc::new(Mutex::new(bar)),
        }
    }

    pub fn callback(&self) -> ProgressCallback<'static> {
        let bar = self.bar.clone();

        Box::new(move |event: Progress| {
            let Ok(bar) = bar.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match event {
                Progress::PhaseStart { name } => {
                    bar.reset();
                    bar.set_length(0);
                    bar.set_style(Self::spinner_style());
                    bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    bar.set_message(name.to_string());
                }
                Progress::PhaseFinish => {
                    bar.disable_steady_tick();
                    bar.finish_with_message("✓ Done");
                }
                Progress::TaskStart { total_steps } => {
                    bar.disable_steady_tick();
                    bar.reset();
                    bar.set_length(total_steps);
                    bar.set_position(0);
                    bar.set_style(Self::bar_style());
                }
                Progress::TaskIncrement => {
                    bar.inc(1);
                }
                Progress::TaskFinish => {
                    if bar.position() < bar.length().unwrap_or(0) {
                        bar.set_position(bar.length().unwrap_or(0));
                    }
                    bar.finish();
                }
                Progress::Message(message) => {
                    bar.set_message(message);
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("Failed to create spinner style template")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<18} [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("Failed to create bar style template")
            .progress_chars("##-")
    }
}

impl Default for ProgressBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_initializes_in_a_clean_state() {
        let bridge = ProgressBridge::new();
        let bar = bridge.bar.lock().unwrap();
        assert_eq!(bar.length(), Some(0));
        assert!(bar.is_finished());
    }

    #[test]
    fn callback_drives_the_bar_through_a_task() {
        let bridge = ProgressBridge::new();
        let callback = bridge.callback();

        callback(Progress::PhaseStart { name: "Relaxation" });
        {
            let bar = bridge.bar.lock().unwrap();
            assert_eq!(bar.message(), "Relaxation");
            assert!(!bar.is_finished());
        }

        callback(Progress::TaskStart { total_steps: 10 });
        callback(Progress::TaskIncrement);
        {
            let bar = bridge.bar.lock().unwrap();
            assert_eq!(bar.length(), Some(10));
            assert_eq!(bar.position(), 1);
        }

        callback(Progress::TaskFinish);
        callback(Progress::PhaseFinish);
        {
            let bar = bridge.bar.lock().unwrap();
            assert!(bar.is_finished());
            assert_eq!(bar.message(), "✓ Done");
        }
    }
}
