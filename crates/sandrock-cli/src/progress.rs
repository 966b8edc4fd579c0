//! Translation progress display

use std::sync::Arc;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use sandrock_core::ProgressFn;

/// Progress bar plus a callback that advances it from worker threads
pub fn translation_bar(total: usize) -> Result<(ProgressBar, ProgressFn)> {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("=> "),
    );
    bar.set_message("Translating");

    let handle = bar.clone();
    let callback: ProgressFn = Arc::new(move |_done, _total| handle.inc(1));
    Ok((bar, callback))
}
