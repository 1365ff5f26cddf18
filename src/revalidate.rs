/// Path-level cache invalidation signal to the rendering layer.
///
/// After a successful mutation the entity's list view path is reported
/// here so subsequent reads reflect the change. This is a notification,
/// not a data-structure operation - reads are never cached in-process.
pub trait Revalidator: Send + Sync {
    fn revalidate_path(&self, path: &str);
}

/// Production revalidator: emits the signal on the log stream the
/// rendering layer tails.
pub struct LogRevalidator;

impl Revalidator for LogRevalidator {
    fn revalidate_path(&self, path: &str) {
        tracing::info!(path, "view path revalidated");
    }
}
