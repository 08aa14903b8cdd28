use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";

/// A ticking spinner for steps with no useful length.
pub(crate) fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    match ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
        Ok(style) => pb.set_style(style),
        Err(e) => log::debug!("Falling back to the default spinner style: {}", e),
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
