use anyhow::Result;

/// Everything in the application runs on one thread; the store and the session are awaited in
/// sequence.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
