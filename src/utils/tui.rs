use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Show `message` with a spinner while `work` runs, then clear the line so
/// notices and tables print cleanly after it.
pub async fn while_spinning<F: Future>(
    message: impl Into<Cow<'static, str>>,
    work: F,
) -> F::Output {
    let spinner = ProgressBar::new_spinner().with_message(message);
    if let Ok(style) = ProgressStyle::with_template("{msg} {spinner:.dim}") {
        spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
    }
    spinner.enable_steady_tick(Duration::from_millis(80));

    let output = work.await;
    spinner.finish_and_clear();
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hands_back_the_output() {
        let owned = format!("Loading {}", "e1");
        assert_eq!(while_spinning(owned, async { 7 }).await, 7);
        assert_eq!(while_spinning("Saving", async { "done" }).await, "done");
    }
}
