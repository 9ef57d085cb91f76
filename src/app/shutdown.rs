use tokio::select;
use tokio_util::sync::CancellationToken;

/// Cancels the token on ctrl-c. Returns early when the token is cancelled by someone else, so it
/// can be joined with the rest of the application.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => {},
    };
}
