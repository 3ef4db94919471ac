//! Progress callback contract.

use std::io;

use crate::resource::Resource;

/// Callback invoked by the engine on every progress event.
///
/// The engine may call it from several worker threads at once. The resource
/// reference is the live object, read-locked for the duration of the call;
/// implementations must return promptly and must not retain it.
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, resource: &Resource) -> io::Result<()>;
}

impl<F> ProgressListener for F
where
    F: Fn(&Resource) -> io::Result<()> + Send + Sync,
{
    fn on_progress(&self, resource: &Resource) -> io::Result<()> {
        self(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::PlainSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_listener() {
        let calls = AtomicUsize::new(0);
        let listener = |_: &Resource| -> io::Result<()> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };

        let resource = Resource::new("x", Box::new(PlainSource));
        listener.on_progress(&resource).unwrap();
        listener.on_progress(&resource).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
