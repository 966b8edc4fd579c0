use anyhow::Result;
use sandrock_core::CancelToken;
use tracing::warn;

/// Cancel `token` on Ctrl-C.
///
/// Translation workers stop picking up new segments and no output file is
/// written; a second Ctrl-C terminates immediately.
pub fn install_handler(token: &CancelToken) -> Result<()> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        if token.is_cancelled() {
            std::process::exit(130);
        }
        warn!("Cancelling, finishing in-flight requests...");
        token.cancel();
    })?;
    Ok(())
}
