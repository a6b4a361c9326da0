//! A single-line terminal spinner that settles into a success or failure
//! glyph.
//!
//! [`Spinner::run`] moves the drawing state into a background Tokio task.
//! [`Spinner::success`] and [`Spinner::fail`] hand the outcome to that task
//! and wait for it to exit, so anything printed afterwards lands below the
//! final line.

use std::io::{self, Write};

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use unicode_width::UnicodeWidthStr;

use crate::config::{Config, Messages, Style};
use crate::consts::{HIDE_CURSOR, SHOW_CURSOR, TICK_INTERVAL};
use crate::error::{SpinnerError, SpinnerResult};
use crate::renderer::{Outcome, Renderer};
use crate::sink::{self, Sink};

/// How the monitored operation ended, as handed to the render task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Success,
    Failure,
}

impl From<Verdict> for Outcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Success => Outcome::Success,
            Verdict::Failure => Outcome::Failure,
        }
    }
}

enum Phase {
    Ready(Painter),
    Running {
        stop: oneshot::Sender<Verdict>,
        handle: JoinHandle<()>,
    },
    Finished,
}

/// A terminal spinner drawn by a background task.
///
/// Dropping a running spinner without calling [`success`](Spinner::success)
/// or [`fail`](Spinner::fail) makes the task erase its line, restore the
/// cursor and exit.
pub struct Spinner {
    outcome: Outcome,
    phase: Phase,
}

impl Spinner {
    /// Build a spinner without starting it. Fails if there are no progress
    /// glyphs to draw.
    pub fn new(config: Config) -> SpinnerResult<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    /// Default style on standard output.
    pub fn with_messages(messages: Messages) -> Self {
        Self::from_config(Config::new(Style::default(), messages))
    }

    fn from_config(config: Config) -> Self {
        let Config {
            style,
            messages,
            sink: output,
        } = config;
        let output = output.unwrap_or_else(sink::stdout);
        Self {
            outcome: Outcome::Pending,
            phase: Phase::Ready(Painter::new(style, messages, output)),
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    async fn finish(&mut self, verdict: Verdict) -> SpinnerResult<()> {
        match std::mem::replace(&mut self.phase, Phase::Finished) {
            Phase::Running { stop, handle } => {
                self.outcome = verdict.into();
                tracing::debug!(?verdict, "stopping spinner");
                // The receiver only goes away when the task has already exited.
                let _ = stop.send(verdict);
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "spinner render task ended abnormally");
                }
                Ok(())
            }
            Phase::Ready(painter) => {
                self.phase = Phase::Ready(painter);
                Err(SpinnerError::NotStarted)
            }
            Phase::Finished => Err(SpinnerError::AlreadyFinished),
        }
    }
}

#[async_trait]
impl Renderer for Spinner {
    /// Spawn the render task on the current Tokio runtime. Outside a
    /// runtime this returns [`SpinnerError::NoRuntime`] and the spinner
    /// stays ready to run.
    fn run(&mut self) -> SpinnerResult<()> {
        let runtime = match &self.phase {
            Phase::Ready(_) => Handle::try_current().map_err(|_| SpinnerError::NoRuntime)?,
            Phase::Running { .. } => return Err(SpinnerError::AlreadyRunning),
            Phase::Finished => return Err(SpinnerError::AlreadyFinished),
        };
        if let Phase::Ready(painter) = std::mem::replace(&mut self.phase, Phase::Finished) {
            let (stop, stopped) = oneshot::channel();
            let handle = runtime.spawn(painter.render(stopped));
            tracing::debug!("spinner started");
            self.phase = Phase::Running { stop, handle };
        }
        Ok(())
    }

    async fn success(&mut self) -> SpinnerResult<()> {
        self.finish(Verdict::Success).await
    }

    async fn fail(&mut self) -> SpinnerResult<()> {
        self.finish(Verdict::Failure).await
    }
}

/// What woke the render loop.
#[derive(Debug, PartialEq, Eq)]
enum Wake {
    Tick,
    /// `None` when the spinner was dropped without a verdict.
    Stop(Option<Verdict>),
}

/// Wait for the next tick or the stop signal. Stop wins when both are ready.
async fn next_wake(stop: &mut oneshot::Receiver<Verdict>, ticker: &mut Interval) -> Wake {
    tokio::select! {
        biased;
        received = stop => Wake::Stop(received.ok()),
        _ = ticker.tick() => Wake::Tick,
    }
}

/// Drawing state owned by the render task. Nothing else touches
/// `last_width`.
struct Painter {
    style: Style,
    messages: Messages,
    sink: Sink,
    /// Terminal columns covered by the frame currently on screen.
    last_width: usize,
    next_glyph: usize,
}

impl Painter {
    fn new(style: Style, messages: Messages, sink: Sink) -> Self {
        Self {
            style,
            messages,
            sink,
            last_width: 0,
            next_glyph: 0,
        }
    }

    async fn render(mut self, mut stop: oneshot::Receiver<Verdict>) {
        self.hide_cursor();
        self.draw_progress();

        let mut ticker = time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let verdict = loop {
            match next_wake(&mut stop, &mut ticker).await {
                Wake::Tick => self.draw_progress(),
                Wake::Stop(verdict) => break verdict,
            }
        };

        match verdict {
            Some(verdict) => self.draw_status(verdict),
            None => {
                tracing::debug!("spinner dropped while running, clearing line");
                if self.erase_line().is_ok() {
                    self.last_width = 0;
                }
            }
        }
        self.show_cursor();
        let _ = self.sink.flush();
    }

    fn frame(&self, glyph: &str, message: &str) -> String {
        format!("{}{}{}{}", self.style.prefix, glyph, self.style.suffix, message)
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        self.sink.write_all(text.as_bytes())
    }

    fn erase_line(&mut self) -> io::Result<()> {
        let blank = format!("\r{}\r", " ".repeat(self.last_width));
        self.write(&blank)
    }

    /// Returns the display width of what was drawn.
    fn draw_line(&mut self, glyph: &str, message: &str) -> io::Result<usize> {
        let line = self.frame(glyph, message);
        self.write(&line)?;
        Ok(line.width())
    }

    fn draw_progress(&mut self) {
        let glyphs = &self.style.progress_glyphs;
        let glyph = glyphs[self.next_glyph % glyphs.len()].clone();
        self.next_glyph = self.next_glyph.wrapping_add(1);

        if let Err(e) = self.erase_line() {
            tracing::trace!(error = %e, "skipping progress frame");
            return;
        }
        let message = self.messages.progress.clone();
        match self.draw_line(&glyph, &message) {
            Ok(width) => self.last_width = width,
            Err(e) => tracing::trace!(error = %e, "progress frame not drawn"),
        }
        let _ = self.sink.flush();
    }

    fn draw_status(&mut self, verdict: Verdict) {
        let (glyph, message) = match verdict {
            Verdict::Success => (self.style.success_glyph.clone(), self.messages.success.clone()),
            Verdict::Failure => (self.style.fail_glyph.clone(), self.messages.fail.clone()),
        };

        if let Err(e) = self.erase_line() {
            tracing::debug!(error = %e, "skipping status line");
            return;
        }
        if let Err(e) = self.draw_line(&glyph, &message) {
            tracing::debug!(error = %e, "status line not drawn");
            return;
        }
        if let Err(e) = self.write("\n") {
            tracing::debug!(error = %e, "status line not terminated");
            return;
        }
        self.last_width = 0;
    }

    fn hide_cursor(&mut self) {
        if self.style.hide_cursor {
            let _ = self.write(HIDE_CURSOR);
        }
    }

    fn show_cursor(&mut self) {
        if self.style.hide_cursor {
            let _ = self.write(SHOW_CURSOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    /// Rejects every write.
    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken"))
        }
    }

    fn style(glyphs: &[&str], hide_cursor: bool) -> Style {
        Style {
            prefix: "[".to_string(),
            suffix: "] ".to_string(),
            progress_glyphs: glyphs.iter().map(|g| g.to_string()).collect(),
            success_glyph: "✓".to_string(),
            fail_glyph: "×".to_string(),
            hide_cursor,
        }
    }

    fn painter(glyphs: &[&str]) -> (Painter, MemorySink) {
        let sink = MemorySink::new();
        let painter = Painter::new(
            style(glyphs, false),
            Messages::from_args(&["work", "done", "broke"]),
            Box::new(sink.clone()),
        );
        (painter, sink)
    }

    #[test]
    fn first_frame_erases_nothing() {
        let (mut painter, sink) = painter(&["|"]);
        painter.draw_progress();
        assert_eq!(sink.contents(), "\r\r[|] work");
        assert_eq!(painter.last_width, 8);
    }

    #[test]
    fn erase_covers_previous_frame() {
        let (mut painter, sink) = painter(&["|"]);
        painter.draw_progress();
        painter.draw_progress();
        assert_eq!(sink.contents(), "\r\r[|] work\r        \r[|] work");
    }

    #[test]
    fn glyphs_rotate_and_wrap() {
        let (mut painter, sink) = painter(&["a", "b"]);
        for _ in 0..3 {
            painter.draw_progress();
        }
        let frames: Vec<String> = sink
            .contents()
            .split('\r')
            .filter(|s| s.starts_with('['))
            .map(String::from)
            .collect();
        assert_eq!(frames, vec!["[a] work", "[b] work", "[a] work"]);
    }

    #[test]
    fn width_counts_columns_not_bytes() {
        let (mut painter, _sink) = painter(&["⠋"]);
        painter.draw_progress();
        assert_eq!(painter.last_width, 8);
    }

    #[test]
    fn wide_progress_frame_is_fully_erased_by_shorter_status() {
        let sink = MemorySink::new();
        let mut painter = Painter::new(
            style(&["|"], false),
            Messages::from_args(&["下载文件中", "ok"]),
            Box::new(sink.clone()),
        );
        painter.draw_progress();
        // Five CJK characters take two columns each.
        assert_eq!(painter.last_width, 14);

        painter.draw_status(Verdict::Success);
        let blank = " ".repeat(14);
        assert!(sink.contents().ends_with(&format!("\r{blank}\r[✓] ok\n")));
    }

    #[test]
    fn emoji_frames_count_two_columns() {
        let (mut painter, _sink) = painter(&["🚀"]);
        painter.draw_progress();
        assert_eq!(painter.last_width, 9);
    }

    #[test]
    fn success_status_line_resets_width() {
        let (mut painter, sink) = painter(&["|"]);
        painter.draw_progress();
        painter.draw_status(Verdict::Success);
        assert!(sink.contents().ends_with("\r        \r[✓] done\n"));
        assert_eq!(painter.last_width, 0);
    }

    #[test]
    fn failure_status_line_uses_fail_glyph() {
        let (mut painter, sink) = painter(&["|"]);
        painter.draw_status(Verdict::Failure);
        assert_eq!(sink.contents(), "\r\r[×] broke\n");
    }

    #[test]
    fn broken_sink_keeps_previous_width() {
        let mut painter = Painter::new(
            style(&["|"], true),
            Messages::new("work"),
            Box::new(BrokenSink),
        );
        painter.last_width = 5;
        painter.draw_progress();
        assert_eq!(painter.last_width, 5);
        painter.draw_status(Verdict::Success);
        assert_eq!(painter.last_width, 5);
        // Cursor writes fail silently too.
        painter.hide_cursor();
        painter.show_cursor();
    }

    #[test]
    fn cursor_sequences_only_when_enabled() {
        let sink = MemorySink::new();
        let mut painter =
            Painter::new(style(&["|"], false), Messages::new("x"), Box::new(sink.clone()));
        painter.hide_cursor();
        painter.show_cursor();
        assert!(sink.is_empty());

        let mut painter =
            Painter::new(style(&["|"], true), Messages::new("x"), Box::new(sink.clone()));
        painter.hide_cursor();
        painter.show_cursor();
        assert_eq!(sink.contents(), format!("{HIDE_CURSOR}{SHOW_CURSOR}"));
    }

    #[test]
    fn new_rejects_empty_glyphs() {
        let config = Config::new(style(&[], false), Messages::new("x"));
        assert!(matches!(Spinner::new(config), Err(SpinnerError::EmptyGlyphs)));
    }

    #[test]
    fn new_spinner_is_pending_and_idle() {
        let spinner = Spinner::with_messages(Messages::new("idle"));
        assert_eq!(spinner.outcome(), Outcome::Pending);
        assert!(!spinner.is_running());
    }

    #[test]
    fn run_outside_a_runtime_is_an_error() {
        let sink = MemorySink::new();
        let config = Config::new(style(&["|"], false), Messages::new("no runtime"))
            .with_sink(sink.clone());
        let mut spinner = Spinner::new(config).unwrap();

        assert_eq!(spinner.run(), Err(SpinnerError::NoRuntime));
        assert!(!spinner.is_running());
        assert!(sink.is_empty());

        // The spinner kept its painter and can still run once a runtime exists.
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            spinner.run().unwrap();
            spinner.success().await.unwrap();
        });
        assert!(sink.contents().ends_with("[✓] no runtime\n"));
    }

    #[tokio::test]
    async fn stop_wins_over_a_ready_tick() {
        for _ in 0..64 {
            let (stop, mut stopped) = oneshot::channel();
            // The first tick of a fresh interval is ready immediately.
            let mut ticker = time::interval(std::time::Duration::from_millis(1));
            stop.send(Verdict::Success).unwrap();
            assert_eq!(
                next_wake(&mut stopped, &mut ticker).await,
                Wake::Stop(Some(Verdict::Success))
            );
        }
    }

    #[tokio::test]
    async fn dropped_sender_wakes_with_no_verdict() {
        let (stop, mut stopped) = oneshot::channel::<Verdict>();
        let mut ticker = time::interval(std::time::Duration::from_millis(1));
        drop(stop);
        assert_eq!(next_wake(&mut stopped, &mut ticker).await, Wake::Stop(None));
    }

    #[tokio::test]
    async fn tick_wakes_while_no_stop_is_pending() {
        let (_stop, mut stopped) = oneshot::channel::<Verdict>();
        let mut ticker = time::interval(std::time::Duration::from_millis(1));
        assert_eq!(next_wake(&mut stopped, &mut ticker).await, Wake::Tick);
    }

    #[tokio::test]
    async fn spinner_starts_and_stops_without_panic() {
        let sink = MemorySink::new();
        let config = Config::new(style(&["|", "/"], true), Messages::new("testing"))
            .with_sink(sink.clone());
        let mut spinner = Spinner::new(config).unwrap();
        spinner.run().unwrap();
        assert!(spinner.is_running());
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        spinner.success().await.unwrap();
        assert!(!spinner.is_running());
        assert_eq!(spinner.outcome(), Outcome::Success);
    }

    #[tokio::test]
    async fn spinner_immediate_stop() {
        let config = Config::new(style(&["|"], false), Messages::new("quick"))
            .with_sink(MemorySink::new());
        let mut spinner = Spinner::new(config).unwrap();
        spinner.run().unwrap();
        spinner.fail().await.unwrap();
        assert_eq!(spinner.outcome(), Outcome::Failure);
    }
}
