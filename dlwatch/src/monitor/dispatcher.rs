//! Lifecycle dispatcher: turns progress callbacks into status lines.

use std::io;
use std::sync::Arc;
use std::time::Instant;

use super::clock::{Clock, SystemClock};
use super::context::{SessionContext, SessionState};
use super::output::Output;
use super::render;
use crate::engine::ProgressListener;
use crate::resource::{LifecycleState, Resource};

/// Progress callback that renders per-file status lines.
///
/// The monitor has no transition logic of its own: every call inspects the
/// resource state it is handed and reacts.
///
/// | State                     | Output                                        |
/// |---------------------------|-----------------------------------------------|
/// | EXTRACTING                | start estimators, then the summary            |
/// | EXTRACTING_DONE, DONE     | summary with average speed per file           |
/// | ERROR                     | state, delay, error per file                  |
/// | RETRYING                  | as ERROR, plus each file's state              |
/// | DOWNLOADING               | throttled progress line per file              |
/// | anything else             | nothing                                       |
///
/// # Thread Safety
///
/// A whole invocation runs under the session lock. Concurrent callbacks from
/// parallel transfers are serialized, so the throttle check-and-update is
/// atomic and lines from different calls never interleave.
pub struct ProgressMonitor {
    context: Arc<SessionContext>,
    output: Arc<dyn Output>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ProgressMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressMonitor")
            .field("context", &self.context)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl ProgressMonitor {
    /// Create a monitor on the system clock.
    pub fn new(context: Arc<SessionContext>, output: Arc<dyn Output>) -> Self {
        Self::with_clock(context, output, Arc::new(SystemClock))
    }

    /// Create a monitor with an explicit time source.
    pub fn with_clock(
        context: Arc<SessionContext>,
        output: Arc<dyn Output>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            context,
            output,
            clock,
        }
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    fn emit(&self, line: &str) -> io::Result<()> {
        self.output.write_line(line)
    }

    fn dispatch(
        &self,
        session: &mut SessionState,
        resource: &Resource,
        now: Instant,
    ) -> io::Result<()> {
        match resource.state {
            LifecycleState::Extracting => self.on_extracting(session, resource, now),
            LifecycleState::ExtractingDone | LifecycleState::Done => {
                self.render_summary(session, resource, now)
            }
            LifecycleState::Error => self.on_error(resource),
            LifecycleState::Retrying => self.on_retrying(resource),
            LifecycleState::Downloading => self.on_downloading(session, resource, now),
            LifecycleState::Queued | LifecycleState::Stop => Ok(()),
        }
    }

    /// Start a speed session for every new file, then show the summary.
    fn on_extracting(
        &self,
        session: &mut SessionState,
        resource: &Resource,
        now: Instant,
    ) -> io::Result<()> {
        for file in &resource.files {
            session.estimator(file, now);
        }
        self.render_summary(session, resource, now)
    }

    /// Quality header plus one average-speed line per file.
    fn render_summary(
        &self,
        session: &mut SessionState,
        resource: &Resource,
        now: Instant,
    ) -> io::Result<()> {
        self.emit(&render::summary_header(resource))?;

        for (index, file) in resource.files.iter().enumerate() {
            let speed = session.estimator(file, now);
            speed.end_at(file.count, now);
            let average = speed.average_speed();
            self.emit(&render::summary_line(index, file, average))?;
        }
        Ok(())
    }

    fn on_error(&self, resource: &Resource) -> io::Result<()> {
        self.emit(&render::failure_header(resource))?;
        for (index, file) in resource.files.iter().enumerate() {
            self.emit(&render::error_line(index, file))?;
        }
        Ok(())
    }

    fn on_retrying(&self, resource: &Resource) -> io::Result<()> {
        self.emit(&render::failure_header(resource))?;
        for (index, file) in resource.files.iter().enumerate() {
            self.emit(&render::retrying_line(index, file))?;
        }
        Ok(())
    }

    fn on_downloading(
        &self,
        session: &mut SessionState,
        resource: &Resource,
        now: Instant,
    ) -> io::Result<()> {
        if !session.throttle.try_acquire(now) {
            tracing::trace!("Skipping throttled progress render");
            return Ok(());
        }

        for (index, file) in resource.files.iter().enumerate() {
            let speed = session.estimator(file, now);
            speed.step_at(file.count, now);
            let (current, average) = (speed.current_speed(), speed.average_speed());
            self.emit(&render::downloading_line(
                index,
                resource.state,
                file,
                current,
                average,
            ))?;
        }
        Ok(())
    }
}

impl ProgressListener for ProgressMonitor {
    fn on_progress(&self, resource: &Resource) -> io::Result<()> {
        let mut session = self.context.lock();
        let now = self.clock.now();
        self.dispatch(&mut session, resource, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{ManualClock, MemoryOutput};
    use crate::resource::{MediaSource, PartDescriptor, PartState, PlainSource, VideoQuality};
    use std::path::PathBuf;
    use std::thread;
    use std::time::Duration;

    struct Harness {
        monitor: ProgressMonitor,
        output: Arc<MemoryOutput>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let output = Arc::new(MemoryOutput::new());
        let clock = Arc::new(ManualClock::new());
        let monitor = ProgressMonitor::with_clock(
            Arc::new(SessionContext::new()),
            output.clone(),
            clock.clone(),
        );
        Harness {
            monitor,
            output,
            clock,
        }
    }

    fn resource(files: usize) -> Resource {
        let mut resource = Resource::new("file:///in", Box::new(PlainSource));
        for i in 0..files {
            let id = resource.add_file(format!("in/{}", i), PathBuf::from(format!("/out/{}", i)));
            resource.file_mut(id).unwrap().length = Some(1000);
        }
        resource
    }

    #[test]
    fn test_throttle_100ms_apart_renders_once() {
        let h = harness();
        let mut res = resource(1);
        res.state = LifecycleState::Downloading;

        h.monitor.on_progress(&res).unwrap();
        h.clock.advance(Duration::from_millis(100));
        h.monitor.on_progress(&res).unwrap();

        assert_eq!(h.output.len(), 1);
    }

    #[test]
    fn test_throttle_1100ms_apart_renders_twice() {
        let h = harness();
        let mut res = resource(1);
        res.state = LifecycleState::Downloading;

        h.monitor.on_progress(&res).unwrap();
        h.clock.advance(Duration::from_millis(1100));
        h.monitor.on_progress(&res).unwrap();

        assert_eq!(h.output.len(), 2);
    }

    #[test]
    fn test_downloading_steps_estimators() {
        let h = harness();
        let mut res = resource(2);
        let id = res.files[0].id;

        res.state = LifecycleState::Extracting;
        h.monitor.on_progress(&res).unwrap();
        h.output.take();

        res.state = LifecycleState::Downloading;
        res.files[0].count = 500;
        h.clock.advance(Duration::from_secs(1));
        h.monitor.on_progress(&res).unwrap();

        let lines = h.output.take();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "file:0 - DOWNLOADING 0.50 (0.5 kb/s / 0.5 kb/s)");
        assert_eq!(lines[1], "file:1 - DOWNLOADING 0.00 (0.0 kb/s / 0.0 kb/s)");
        assert_eq!(h.monitor.context().speeds_of(id), Some((500.0, 500.0)));
    }

    #[test]
    fn test_downloading_part_fragment_is_per_file() {
        let h = harness();
        let mut res = resource(2);
        res.state = LifecycleState::Downloading;

        let mut parts = vec![
            PartDescriptor::new(1, 0, 199),
            PartDescriptor::new(2, 200, 399),
            PartDescriptor::new(3, 400, 599),
        ];
        parts[0].state = PartState::Done;
        parts[1].state = PartState::Downloading;
        parts[1].count = 50;
        res.files[0].parts = Some(parts);

        h.monitor.on_progress(&res).unwrap();
        let lines = h.output.take();

        assert!(lines[0].contains("part#2(0.25)"));
        assert!(!lines[0].contains("part#1"));
        assert!(!lines[0].contains("part#3"));
        assert!(!lines[1].contains("part#"));
    }

    #[test]
    fn test_extracting_starts_sessions_and_renders_summary() {
        let h = harness();
        let mut res = resource(2);
        res.files[1].count = 300;
        res.state = LifecycleState::Extracting;

        h.monitor.on_progress(&res).unwrap();

        assert_eq!(h.monitor.context().tracked_files(), 2);
        assert_eq!(
            h.output.take(),
            vec![
                "downloading unknown quality",
                "file:0 - /out/0 (0.0 kb/s)",
                "file:1 - /out/1 (0.0 kb/s)",
            ]
        );
    }

    #[test]
    fn test_done_reports_session_average() {
        let h = harness();
        let mut res = Resource::new(
            "file:///in",
            Box::new(MediaSource::new(VideoQuality::P720)),
        );
        res.add_file("in/a", PathBuf::from("/out/a"));

        res.state = LifecycleState::Extracting;
        h.monitor.on_progress(&res).unwrap();
        h.output.take();

        h.clock.advance(Duration::from_secs(4));
        res.files[0].count = 4 * 1024 * 1024;
        res.state = LifecycleState::Done;
        h.monitor.on_progress(&res).unwrap();

        assert_eq!(
            h.output.take(),
            vec!["DONE 720p", "file:0 - /out/a (1.0 MB/s)"]
        );
    }

    #[test]
    fn test_done_without_prior_session_does_not_panic() {
        let h = harness();
        let mut res = resource(1);
        res.files[0].count = 1000;
        res.state = LifecycleState::Done;

        h.monitor.on_progress(&res).unwrap();

        assert_eq!(h.output.lines()[1], "file:0 - /out/0 (0.0 kb/s)");
    }

    #[test]
    fn test_error_renders_one_line_per_file_in_order() {
        let h = harness();
        let mut res = resource(2);
        res.state = LifecycleState::Error;
        res.delay = Duration::from_secs(10);
        res.files[0].error = Some("timeout".to_string());
        res.files[0].delay = Duration::from_secs(2);
        res.files[1].error = Some("403 forbidden".to_string());
        res.files[1].delay = Duration::from_secs(7);

        h.monitor.on_progress(&res).unwrap();

        assert_eq!(
            h.output.take(),
            vec![
                "ERROR 10",
                "file:0 - timeout delay:2",
                "file:1 - 403 forbidden delay:7",
            ]
        );
    }

    #[test]
    fn test_retrying_includes_file_state() {
        let h = harness();
        let mut res = resource(1);
        res.state = LifecycleState::Retrying;
        res.delay = Duration::from_secs(3);
        res.files[0].state = LifecycleState::Retrying;
        res.files[0].error = Some("reset".to_string());
        res.files[0].delay = Duration::from_secs(3);

        h.monitor.on_progress(&res).unwrap();

        assert_eq!(
            h.output.take(),
            vec!["RETRYING 3", "file:0 - RETRYING reset delay:3"]
        );
    }

    #[test]
    fn test_other_states_render_nothing() {
        let h = harness();
        let mut res = resource(1);

        for state in [LifecycleState::Queued, LifecycleState::Stop] {
            res.state = state;
            h.monitor.on_progress(&res).unwrap();
        }

        assert!(h.output.is_empty());
        assert_eq!(h.monitor.context().tracked_files(), 0);
    }

    #[test]
    fn test_error_and_summary_are_not_throttled() {
        let h = harness();
        let mut res = resource(1);

        res.state = LifecycleState::Downloading;
        h.monitor.on_progress(&res).unwrap();
        res.state = LifecycleState::Error;
        h.monitor.on_progress(&res).unwrap();
        res.state = LifecycleState::Done;
        h.monitor.on_progress(&res).unwrap();

        // 1 downloading + 2 error + 2 summary
        assert_eq!(h.output.len(), 5);
    }

    #[test]
    fn test_concurrent_callbacks_do_not_interleave() {
        let output = Arc::new(MemoryOutput::new());
        let monitor = Arc::new(ProgressMonitor::new(
            Arc::new(SessionContext::new()),
            output.clone(),
        ));
        let mut res = resource(3);
        res.state = LifecycleState::Error;
        let res = Arc::new(res);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let monitor = Arc::clone(&monitor);
                let res = Arc::clone(&res);
                thread::spawn(move || {
                    for _ in 0..25 {
                        monitor.on_progress(&res).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = output.lines();
        assert_eq!(lines.len(), 8 * 25 * 4);
        for block in lines.chunks(4) {
            assert_eq!(block[0], "ERROR 0");
            assert!(block[1].starts_with("file:0"));
            assert!(block[2].starts_with("file:1"));
            assert!(block[3].starts_with("file:2"));
        }
    }

    #[test]
    fn test_concurrent_downloading_creates_one_session_per_file() {
        let output = Arc::new(MemoryOutput::new());
        let context = Arc::new(SessionContext::with_render_interval(Duration::ZERO));
        let monitor = Arc::new(ProgressMonitor::new(context.clone(), output));
        let mut res = resource(4);
        res.state = LifecycleState::Downloading;
        let res = Arc::new(res);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let monitor = Arc::clone(&monitor);
                let res = Arc::clone(&res);
                thread::spawn(move || monitor.on_progress(&res).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(context.tracked_files(), 4);
    }
}
