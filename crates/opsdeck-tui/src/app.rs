//! Application core: The main-loop state machine.
//!
//! ```text
//! Rendering ──▶ AwaitingInput ──key──▶ Dispatching ──▶ Rendering
//!     ▲              │ timeout/resize        │ quit
//!     └──────────────┘                       ▼
//!                                         Exiting
//! ```
//!
//! The loop is the only writer to the terminal. Every await point also
//! selects on the shutdown token, so a termination signal moves any
//! state straight to `Exiting`.

use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use opsdeck_core::{
    CoreError, CycleReport, DashboardConfig, Depth, FetchScheduler, PacketScanSettings, Snapshot,
    SnapshotLogger, SourceId, ToolSettings, launch_tool, run_packet_scan,
};
use ratatui::{Terminal, backend::Backend};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::event::{Event, EventReader};
use crate::render::{self, HeaderInfo, StyledLine};

/// How long a forced snapshot holds the loop before the next cycle.
const SNAPSHOT_PAUSE: Duration = Duration::from_millis(600);

/// States of the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Fetch every source, draw the frame, queue a snapshot.
    Rendering,
    /// Wait for a key, bounded by the refresh interval.
    AwaitingInput,
    /// Act on the key that ended the wait.
    Dispatching(KeyEvent),
    /// Terminal state.
    Exiting(ExitReason),
}

/// Why the loop stopped. All of them are clean exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `q` or Ctrl-C.
    Quit,
    /// SIGINT, SIGTERM or SIGHUP.
    Signal,
    /// The terminal event stream ended.
    InputClosed,
}

/// Top-level application state.
pub struct App {
    refresh_interval: Duration,
    tools: ToolSettings,
    packet_scan: PacketScanSettings,
    scheduler: FetchScheduler,
    snapshots: SnapshotLogger,
    /// The previous cycle's background append.
    pending_snapshot: Option<JoinHandle<Result<PathBuf, CoreError>>>,
    /// Latest cycle; what panels and forced snapshots show.
    last_report: Option<CycleReport>,
    /// Replaces the key hints until the next key press.
    status: Option<String>,
    /// A frame failed to reach the terminal; clear before the next one.
    redraw_pending: bool,
    shutdown: CancellationToken,
}

impl App {
    pub fn new(cfg: &DashboardConfig, shutdown: CancellationToken) -> Self {
        Self::with_scheduler(cfg, FetchScheduler::from_config(cfg), shutdown)
    }

    pub fn with_scheduler(
        cfg: &DashboardConfig,
        scheduler: FetchScheduler,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            refresh_interval: cfg.refresh_interval,
            tools: cfg.tools.clone(),
            packet_scan: cfg.packet_scan.clone(),
            scheduler,
            snapshots: SnapshotLogger::new(&cfg.snapshot_dir),
            pending_snapshot: None,
            last_report: None,
            status: None,
            redraw_pending: false,
            shutdown,
        }
    }

    /// Drive the state machine until it reaches `Exiting`.
    pub async fn run<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &mut EventReader,
    ) -> ExitReason {
        info!(
            refresh_secs = self.refresh_interval.as_secs(),
            sources = self.scheduler.source_ids().len(),
            "main loop started"
        );

        let mut state = LoopState::Rendering;
        loop {
            state = match state {
                LoopState::Rendering => self.render_cycle(terminal).await,
                LoopState::AwaitingInput => self.await_input(events).await,
                LoopState::Dispatching(key) => self.dispatch(key, terminal, events).await,
                LoopState::Exiting(reason) => {
                    info!(?reason, "main loop finished");
                    return reason;
                }
            };
        }
    }

    // ── States ───────────────────────────────────────────────────────

    async fn render_cycle<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> LoopState {
        if self.last_report.is_none() {
            // First frame: show the layout while the first cycle runs.
            self.draw(terminal);
        }

        let report = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return LoopState::Exiting(ExitReason::Signal),
            report = self.scheduler.run_cycle() => report,
        };

        self.check_pending_snapshot().await;
        self.pending_snapshot = Some(self.snapshots.spawn_append(Snapshot::from_report(&report)));
        self.last_report = Some(report);
        self.draw(terminal);
        LoopState::AwaitingInput
    }

    /// Surface a failed background append on the status line. An append
    /// still running is left detached.
    async fn check_pending_snapshot(&mut self) {
        let Some(handle) = self.pending_snapshot.take() else {
            return;
        };
        if !handle.is_finished() {
            return;
        }
        match handle.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => self.status = Some(format!("snapshot failed: {e}")),
            Err(e) => warn!(error = %e, "snapshot task failed"),
        }
    }

    async fn await_input(&mut self, events: &mut EventReader) -> LoopState {
        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => LoopState::Exiting(ExitReason::Signal),
            event = events.next() => match event {
                Some(Event::Key(key)) => LoopState::Dispatching(key),
                Some(Event::Resize(width, height)) => {
                    debug!(width, height, "terminal resized");
                    LoopState::Rendering
                }
                None => LoopState::Exiting(ExitReason::InputClosed),
            },
            () = tokio::time::sleep(self.refresh_interval) => LoopState::Rendering,
        }
    }

    async fn dispatch<B: Backend>(
        &mut self,
        key: KeyEvent,
        terminal: &mut Terminal<B>,
        events: &mut EventReader,
    ) -> LoopState {
        self.status = None;
        let Some(command) = Command::from_key(key) else {
            debug!(code = ?key.code, "unbound key");
            return LoopState::Rendering;
        };
        debug!(?command, "dispatching");

        match command {
            Command::Quit => LoopState::Exiting(ExitReason::Quit),
            Command::Detail(id) => self.detail_view(id, terminal, events).await,
            Command::PacketScan => self.packet_scan_view(terminal, events).await,
            Command::RunTool(tool) => {
                let status = match launch_tool(tool, &self.tools) {
                    Ok(launched) => launched.to_string(),
                    Err(e) => {
                        warn!(%tool, error = %e, "tool launch refused");
                        e.to_string()
                    }
                };
                self.status = Some(status);
                self.draw(terminal);
                LoopState::Rendering
            }
            Command::Snapshot => self.force_snapshot(terminal).await,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    async fn detail_view<B: Backend>(
        &mut self,
        id: SourceId,
        terminal: &mut Terminal<B>,
        events: &mut EventReader,
    ) -> LoopState {
        let title = id.to_string();
        self.draw_sub_view(terminal, &title, &render::plain_lines(&["fetching…".to_owned()]));

        let result = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return LoopState::Exiting(ExitReason::Signal),
            result = self.scheduler.fetch_one(id, Depth::Full) => result,
        };
        let lines = result.map_or_else(
            || render::plain_lines(&[format!("{id} is not monitored")]),
            |r| render::outcome_lines(&r.outcome),
        );

        self.sub_view(terminal, events, &title, &lines).await
    }

    async fn packet_scan_view<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &mut EventReader,
    ) -> LoopState {
        let title = "Packet scan";
        let waiting = format!(
            "capturing with `{}` (up to {})…",
            self.packet_scan.command.join(" "),
            humantime::format_duration(self.packet_scan.timeout)
        );
        self.draw_sub_view(terminal, title, &render::plain_lines(&[waiting]));

        let lines = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return LoopState::Exiting(ExitReason::Signal),
            lines = run_packet_scan(&self.packet_scan) => lines,
        };

        self.sub_view(terminal, events, title, &render::plain_lines(&lines)).await
    }

    async fn force_snapshot<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> LoopState {
        let status = match &self.last_report {
            None => "nothing to snapshot yet".to_owned(),
            Some(report) => {
                let snapshot = Snapshot {
                    taken_at: Utc::now(),
                    ..Snapshot::from_report(report)
                };
                match self.snapshots.append(&snapshot).await {
                    Ok(path) => format!("snapshot written to {}", path.display()),
                    Err(e) => {
                        warn!(error = %e, "forced snapshot failed");
                        format!("snapshot failed: {e}")
                    }
                }
            }
        };
        self.status = Some(status);
        self.draw(terminal);

        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => LoopState::Exiting(ExitReason::Signal),
            () = tokio::time::sleep(SNAPSHOT_PAUSE) => LoopState::Rendering,
        }
    }

    /// Show `lines` full-screen until a key press. Resizes redraw in place.
    async fn sub_view<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &mut EventReader,
        title: &str,
        lines: &[StyledLine],
    ) -> LoopState {
        loop {
            self.draw_sub_view(terminal, title, lines);

            let event = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return LoopState::Exiting(ExitReason::Signal),
                event = events.next() => event,
            };
            match event {
                Some(Event::Resize(..)) => {}
                Some(Event::Key(key)) if is_ctrl_c(key) => {
                    return LoopState::Exiting(ExitReason::Quit);
                }
                Some(Event::Key(_)) => return LoopState::Rendering,
                None => return LoopState::Exiting(ExitReason::InputClosed),
            }
        }
    }

    // ── Drawing ──────────────────────────────────────────────────────

    fn header_info(&self) -> HeaderInfo {
        HeaderInfo {
            clock: Local::now().format("%H:%M:%S").to_string(),
            refresh_interval: self.refresh_interval,
            last_cycle: self.last_report.as_ref().map(|r| r.elapsed),
            status: self.status.clone(),
        }
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) {
        if !self.begin_frame(terminal) {
            return;
        }
        let header = self.header_info();
        let report = self.last_report.as_ref();
        let failed = terminal
            .draw(|frame| render::draw_dashboard(frame, &header, report))
            .err();
        if let Some(e) = failed {
            self.frame_failed("dashboard", &e);
        }
    }

    fn draw_sub_view<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        title: &str,
        lines: &[StyledLine],
    ) {
        if !self.begin_frame(terminal) {
            return;
        }
        let failed = terminal
            .draw(|frame| render::draw_detail(frame, title, lines))
            .err();
        if let Some(e) = failed {
            self.frame_failed(title, &e);
        }
    }

    /// False skips the frame. A failed size query or a clear still owed
    /// by an earlier failed frame leaves the loop running.
    fn begin_frame<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> bool {
        if let Err(e) = terminal.size() {
            warn!(error = %e, "terminal size unavailable, skipping frame");
            return false;
        }
        if self.redraw_pending {
            if let Err(e) = terminal.clear() {
                warn!(error = %e, "terminal clear failed, skipping frame");
                return false;
            }
            self.redraw_pending = false;
        }
        true
    }

    fn frame_failed(&mut self, what: &str, error: &impl Display) {
        warn!(what, error = %error, "draw failed, skipping frame");
        self.redraw_pending = true;
    }
}

fn is_ctrl_c(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c' | 'C'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use futures::FutureExt;
    use futures::future::BoxFuture;
    use opsdeck_core::{Outcome, Source};
    use pretty_assertions::assert_eq;
    use ratatui::backend::{ClearType, TestBackend, WindowSize};
    use ratatui::buffer::Cell;
    use ratatui::layout::{Position, Size};
    use tokio::sync::mpsc::UnboundedSender;

    use super::*;

    /// Records requested depths and answers with one line.
    struct Recording {
        id: SourceId,
        depths: Mutex<Vec<Depth>>,
    }

    impl Source for Recording {
        fn id(&self) -> SourceId {
            self.id
        }

        fn fetch(&self, depth: Depth) -> BoxFuture<'_, Outcome> {
            self.depths.lock().unwrap().push(depth);
            async move { Outcome::Lines(vec![format!("{} {depth:?} line", self.id)]) }.boxed()
        }
    }

    /// Draws into a `TestBackend` but fails the first `failing_flushes`
    /// flushes, like a terminal whose output pipe briefly errors.
    struct FlakyBackend {
        inner: TestBackend,
        failing_flushes: usize,
        clears: usize,
    }

    fn io_err<T, E: core::error::Error>(r: Result<T, E>) -> io::Result<T> {
        r.map_err(|e| io::Error::other(e.to_string()))
    }

    impl Backend for FlakyBackend {
        type Error = io::Error;

        fn draw<'a, I>(&mut self, content: I) -> io::Result<()>
        where
            I: Iterator<Item = (u16, u16, &'a Cell)>,
        {
            io_err(self.inner.draw(content))
        }

        fn append_lines(&mut self, n: u16) -> io::Result<()> {
            io_err(self.inner.append_lines(n))
        }

        fn hide_cursor(&mut self) -> io::Result<()> {
            io_err(self.inner.hide_cursor())
        }

        fn show_cursor(&mut self) -> io::Result<()> {
            io_err(self.inner.show_cursor())
        }

        fn get_cursor_position(&mut self) -> io::Result<Position> {
            io_err(self.inner.get_cursor_position())
        }

        fn set_cursor_position<P: Into<Position>>(&mut self, position: P) -> io::Result<()> {
            io_err(self.inner.set_cursor_position(position))
        }

        fn clear(&mut self) -> io::Result<()> {
            self.clears += 1;
            io_err(self.inner.clear())
        }

        fn clear_region(&mut self, clear_type: ClearType) -> io::Result<()> {
            self.clears += 1;
            io_err(self.inner.clear_region(clear_type))
        }

        fn size(&self) -> io::Result<Size> {
            io_err(self.inner.size())
        }

        fn window_size(&mut self) -> io::Result<WindowSize> {
            io_err(self.inner.window_size())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.failing_flushes > 0 {
                self.failing_flushes -= 1;
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"));
            }
            io_err(self.inner.flush())
        }
    }

    fn flaky(failing_flushes: usize) -> FlakyBackend {
        FlakyBackend {
            inner: TestBackend::new(80, 24),
            failing_flushes,
            clears: 0,
        }
    }

    struct Harness<B: Backend = TestBackend> {
        app: App,
        terminal: Terminal<B>,
        events: EventReader,
        tx: UnboundedSender<Event>,
        shutdown: CancellationToken,
        github: Arc<Recording>,
        dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        harness_with(TestBackend::new(80, 24))
    }

    fn harness_with<B: Backend>(backend: B) -> Harness<B> {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DashboardConfig {
            refresh_interval: Duration::from_secs(30),
            snapshot_dir: dir.path().join("snapshots"),
            ..DashboardConfig::default()
        };
        let github = Arc::new(Recording {
            id: SourceId::Github,
            depths: Mutex::new(Vec::new()),
        });
        let scheduler = FetchScheduler::new(vec![github.clone()], Duration::from_secs(5));
        let shutdown = CancellationToken::new();
        let (tx, events) = EventReader::channel();
        Harness {
            app: App::with_scheduler(&cfg, scheduler, shutdown.clone()),
            terminal: Terminal::new(backend).unwrap(),
            events,
            tx,
            shutdown,
            github,
            dir,
        }
    }

    fn press(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        rows(terminal.backend())
    }

    fn rows(backend: &TestBackend) -> String {
        let buf = backend.buffer();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn quit_while_awaiting_input() {
        let mut h = harness();
        h.tx.send(press('q')).unwrap();

        let reason = h.app.run(&mut h.terminal, &mut h.events).await;

        assert_eq!(reason, ExitReason::Quit);
        assert!(screen(&h.terminal).contains("GitHub Summary line"));
    }

    #[tokio::test]
    async fn failing_terminal_writes_do_not_end_the_loop() {
        let mut h = harness_with(flaky(usize::MAX));
        h.tx.send(press('q')).unwrap();

        let reason = h.app.run(&mut h.terminal, &mut h.events).await;

        assert_eq!(reason, ExitReason::Quit);
        assert!(h.app.redraw_pending);
    }

    #[tokio::test]
    async fn frame_after_a_failed_write_starts_from_a_clear() {
        let mut h = harness_with(flaky(1));

        // The layout frame before the first cycle fails; the frame after
        // the cycle clears first and then lands.
        assert_eq!(
            h.app.render_cycle(&mut h.terminal).await,
            LoopState::AwaitingInput
        );

        assert!(!h.app.redraw_pending);
        assert!(h.terminal.backend().clears >= 1);
        assert!(rows(&h.terminal.backend().inner).contains("GitHub Summary line"));
    }

    #[tokio::test]
    async fn uppercase_quit_and_ctrl_c() {
        let mut h = harness();
        h.tx.send(press('Q')).unwrap();
        assert_eq!(
            h.app.run(&mut h.terminal, &mut h.events).await,
            ExitReason::Quit
        );

        let mut h = harness();
        h.tx.send(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)))
            .unwrap();
        assert_eq!(
            h.app.run(&mut h.terminal, &mut h.events).await,
            ExitReason::Quit
        );
    }

    #[tokio::test]
    async fn signal_exits_from_any_state() {
        let mut h = harness();
        h.shutdown.cancel();
        let reason = h.app.run(&mut h.terminal, &mut h.events).await;
        assert_eq!(reason, ExitReason::Signal);
    }

    #[tokio::test]
    async fn closed_input_exits() {
        let mut h = harness();
        drop(h.tx);
        let reason = h.app.run(&mut h.terminal, &mut h.events).await;
        assert_eq!(reason, ExitReason::InputClosed);
    }

    #[tokio::test]
    async fn unbound_key_goes_back_to_rendering() {
        let mut h = harness();
        let key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        let next = h.app.dispatch(key, &mut h.terminal, &mut h.events).await;

        assert_eq!(next, LoopState::Rendering);
        assert!(h.app.status.is_none());
        assert!(h.github.depths.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn input_wait_times_out_into_rendering() {
        let mut h = harness();
        let start = tokio::time::Instant::now();
        assert_eq!(h.app.await_input(&mut h.events).await, LoopState::Rendering);
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn resize_is_treated_as_unbound() {
        let mut h = harness();
        h.tx.send(Event::Resize(100, 30)).unwrap();
        assert_eq!(h.app.await_input(&mut h.events).await, LoopState::Rendering);

        h.tx.send(press('g')).unwrap();
        assert!(matches!(
            h.app.await_input(&mut h.events).await,
            LoopState::Dispatching(_)
        ));
    }

    #[tokio::test]
    async fn detail_view_fetches_full_depth_and_waits_for_a_key() {
        let mut h = harness();
        h.tx.send(Event::Resize(80, 24)).unwrap();
        h.tx.send(press('z')).unwrap();

        let key = KeyEvent::new(KeyCode::Char('g'), KeyModifiers::NONE);
        let next = h.app.dispatch(key, &mut h.terminal, &mut h.events).await;

        assert_eq!(next, LoopState::Rendering);
        assert_eq!(*h.github.depths.lock().unwrap(), vec![Depth::Full]);
        let shown = screen(&h.terminal);
        assert!(shown.contains(" GitHub "), "{shown}");
        assert!(shown.contains("GitHub Full line"), "{shown}");
    }

    #[tokio::test]
    async fn unmonitored_source_detail() {
        let mut h = harness();
        h.tx.send(press('z')).unwrap();

        let key = KeyEvent::new(KeyCode::Char('v'), KeyModifiers::NONE);
        h.app.dispatch(key, &mut h.terminal, &mut h.events).await;
        assert!(screen(&h.terminal).contains("Vercel is not monitored"));
    }

    #[tokio::test]
    async fn unconfigured_tool_sets_status() {
        let mut h = harness();
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        let next = h.app.dispatch(key, &mut h.terminal, &mut h.events).await;

        assert_eq!(next, LoopState::Rendering);
        assert_eq!(h.app.status.as_deref(), Some("tool A not configured"));
        assert!(screen(&h.terminal).contains("tool A not configured"));

        // The next key press clears it.
        let key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        h.app.dispatch(key, &mut h.terminal, &mut h.events).await;
        assert!(h.app.status.is_none());
    }

    #[tokio::test]
    async fn forced_snapshot_writes_latest_lines() {
        let mut h = harness();
        assert_eq!(
            h.app.render_cycle(&mut h.terminal).await,
            LoopState::AwaitingInput
        );

        let key = KeyEvent::new(KeyCode::Char('l'), KeyModifiers::NONE);
        let next = h.app.dispatch(key, &mut h.terminal, &mut h.events).await;

        assert_eq!(next, LoopState::Rendering);
        let status = h.app.status.clone().unwrap();
        let path = status.strip_prefix("snapshot written to ").unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("[GitHub]\nGitHub Summary line\n"));
    }

    #[tokio::test]
    async fn background_snapshot_failure_reaches_status_line() {
        let mut h = harness();
        let blocker = h.dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        h.app.snapshots = SnapshotLogger::new(&blocker);

        h.app.render_cycle(&mut h.terminal).await;
        while !h.app.pending_snapshot.as_ref().unwrap().is_finished() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        h.app.render_cycle(&mut h.terminal).await;

        let status = h.app.status.clone().unwrap();
        assert!(status.starts_with("snapshot failed: "), "{status}");
        assert!(screen(&h.terminal).contains("snapshot failed"));
    }

    #[tokio::test]
    async fn snapshot_before_first_cycle() {
        let mut h = harness();
        h.app.force_snapshot(&mut h.terminal).await;
        assert_eq!(h.app.status.as_deref(), Some("nothing to snapshot yet"));
    }

    #[tokio::test]
    async fn ctrl_c_inside_sub_view_quits() {
        let mut h = harness();
        h.tx.send(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)))
            .unwrap();
        let key = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE);
        let next = h.app.dispatch(key, &mut h.terminal, &mut h.events).await;
        assert_eq!(next, LoopState::Exiting(ExitReason::Quit));
    }
}
