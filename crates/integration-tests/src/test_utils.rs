// SDB - Script Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Test utilities for integration tests

use std::time::Duration;

/// How long a test waits for an observer event before declaring a hang.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialization utilities for tests
pub mod init {
    /// Initialize logging for a test
    pub fn init_test_environment() {
        sdb_common::logging::ensure_test_logging(None);
    }
}

/// Logging capture utilities for tests
pub mod logging {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    /// A custom tracing layer that captures messages at or above a level
    #[derive(Clone)]
    pub struct LogCapture {
        level: Level,
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl LogCapture {
        /// Capture events at `level` or more severe
        pub fn new(level: Level) -> Self {
            Self { level, messages: Arc::new(Mutex::new(Vec::new())) }
        }

        /// Retrieve captured messages
        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().clone()
        }

        /// Check if anything was captured
        pub fn is_empty(&self) -> bool {
            self.messages.lock().is_empty()
        }
    }

    impl<S> tracing_subscriber::Layer<S> for LogCapture
    where
        S: tracing::Subscriber,
    {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            // Levels compare by verbosity: ERROR is the smallest
            if *event.metadata().level() > self.level {
                return;
            }

            struct MessageVisitor {
                message: String,
            }

            impl tracing::field::Visit for MessageVisitor {
                fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                    if field.name() == "message" {
                        self.message = format!("{value:?}");
                    }
                }

                fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                    if field.name() == "message" {
                        self.message = value.to_string();
                    }
                }
            }

            let mut visitor = MessageVisitor { message: String::new() };
            event.record(&mut visitor);

            if !visitor.message.is_empty() {
                self.messages.lock().push(visitor.message);
            }
        }
    }

    /// Runs `f` with a thread-local subscriber capturing warnings and errors
    /// emitted on the calling thread.
    pub fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, LogCapture) {
        let capture = LogCapture::new(Level::WARN);
        let subscriber = tracing_subscriber::registry()
            .with(capture.clone())
            .with(tracing_subscriber::fmt::layer().with_test_writer());

        let result = tracing::subscriber::with_default(subscriber, f);
        (result, capture)
    }
}

/// Mock script engine utilities
pub mod engine {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread::{self, JoinHandle},
    };

    use parking_lot::Mutex;
    use sdb_common::{
        BreakType, Breakpoint, DebugInformation, EngineId, Program, ScopeId, SourceRange,
    };
    use sdb_engine::{Coordinator, ScriptEngine};

    /// One statement the mock engine executes: where it is and which frames are active.
    #[derive(Debug, Clone)]
    pub struct MockStatement {
        /// 1-based line
        pub line: usize,
        /// 0-based start column
        pub column: usize,
        /// Active frames, innermost first
        pub scopes: Vec<ScopeId>,
    }

    /// A program together with the statement trace a run of it produces.
    #[derive(Debug, Clone)]
    pub struct MockScript {
        program: Program,
        statements: Vec<MockStatement>,
    }

    impl MockScript {
        /// A script over `source` that executes nothing yet
        pub fn new(source: &str) -> Self {
            Self { program: Program::from(source), statements: Vec::new() }
        }

        /// Appends a statement starting at the first non-blank column of `line`
        pub fn statement(mut self, line: usize, scopes: &[ScopeId]) -> Self {
            let column = self
                .program
                .line(line)
                .and_then(|text| text.chars().position(|c| !c.is_whitespace()))
                .unwrap_or(0);
            self.statements.push(MockStatement { line, column, scopes: scopes.to_vec() });
            self
        }

        /// The program text
        pub fn program(&self) -> &Program {
            &self.program
        }

        /// Statements in execution order
        pub fn statements(&self) -> &[MockStatement] {
            &self.statements
        }

        /// Lines in execution order
        pub fn lines(&self) -> Vec<usize> {
            self.statements.iter().map(|statement| statement.line).collect()
        }

        /// The snapshot the engine reports before executing `statement`
        pub fn info(&self, statement: &MockStatement) -> DebugInformation {
            let end = self.program.line(statement.line).map_or(statement.column, str::len);
            DebugInformation::new(
                self.program.clone(),
                SourceRange::on_line(statement.line, statement.column, end),
                statement.scopes.clone(),
            )
        }

        /// A script with a function called twice, with a fresh call frame each time.
        ///
        /// Executes lines 5, 6, 2, 3, 7, 8, 2, 3, 9, 10.
        pub fn two_calls() -> Self {
            let source = "function f() {\n    var x = 1;\n    return x + 1;\n}\nvar a = 0;\na = f();\nvar b = a * 2;\na = f();\nb = b + a;\nlog(b);";
            let global = ScopeId::next();
            let (first, second) = (ScopeId::next(), ScopeId::next());
            Self::new(source)
                .statement(5, &[global])
                .statement(6, &[global])
                .statement(2, &[first, global])
                .statement(3, &[first, global])
                .statement(7, &[global])
                .statement(8, &[global])
                .statement(2, &[second, global])
                .statement(3, &[second, global])
                .statement(9, &[global])
                .statement(10, &[global])
        }

        /// A flat script of `lines` statements in one global frame
        pub fn flat(lines: usize) -> Self {
            let source = (1..=lines).map(|i| format!("s{i}();")).collect::<Vec<_>>().join("\n");
            let global = ScopeId::next();
            let mut script = Self { program: Program::from(source), statements: Vec::new() };
            for line in 1..=lines {
                script = script.statement(line, &[global]);
            }
            script
        }
    }

    /// A script engine that reports every statement of a [`MockScript`] to a coordinator.
    pub struct MockEngine {
        id: EngineId,
        debug_mode: AtomicBool,
        breakpoints: Mutex<Vec<Breakpoint>>,
        executed: Mutex<Vec<usize>>,
    }

    impl MockEngine {
        /// A fresh engine with instrumentation off
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                id: EngineId::next(),
                debug_mode: AtomicBool::new(false),
                breakpoints: Mutex::new(Vec::new()),
                executed: Mutex::new(Vec::new()),
            })
        }

        /// This engine as the coordinator sees it
        pub fn handle(self: &Arc<Self>) -> Arc<dyn ScriptEngine> {
            self.clone()
        }

        /// Lines executed so far
        pub fn executed(&self) -> Vec<usize> {
            self.executed.lock().clone()
        }

        /// Breakpoints the coordinator last loaded
        pub fn loaded_breakpoints(&self) -> Vec<Breakpoint> {
            self.breakpoints.lock().clone()
        }

        /// Whether instrumentation is on
        pub fn is_debugging(&self) -> bool {
            self.debug_mode.load(Ordering::SeqCst)
        }

        /// Executes the script on the calling thread, suspending wherever the coordinator says.
        pub fn run(self: &Arc<Self>, coordinator: &Coordinator, script: &MockScript) {
            let handle = self.handle();
            for statement in script.statements() {
                if self.is_debugging() {
                    let info = script.info(statement);
                    let break_type = if self.breakpoints.lock().iter().any(|bp| bp.is_at(info.location())) {
                        BreakType::Break
                    } else {
                        BreakType::Step
                    };
                    coordinator.process(&handle, info, break_type);
                }
                self.executed.lock().push(statement.line);
            }
        }

        /// Executes the script on a new thread
        pub fn spawn(self: &Arc<Self>, coordinator: Arc<Coordinator>, script: MockScript) -> JoinHandle<()> {
            let engine = self.clone();
            thread::spawn(move || engine.run(&coordinator, &script))
        }
    }

    impl ScriptEngine for MockEngine {
        fn id(&self) -> EngineId {
            self.id
        }

        fn set_debug_mode(&self, enabled: bool) {
            self.debug_mode.store(enabled, Ordering::SeqCst);
        }

        fn load_breakpoints(&self, breakpoints: &[Breakpoint]) {
            *self.breakpoints.lock() = breakpoints.to_vec();
        }
    }
}

/// Mock observer utilities
pub mod observer {
    use std::{
        collections::VecDeque,
        sync::{
            mpsc::{self, Receiver, Sender},
            Arc, Weak,
        },
    };

    use once_cell::sync::OnceCell;
    use parking_lot::Mutex;
    use sdb_common::{BreakType, DebugInformation, Program, ResumeAction, SessionId};
    use sdb_engine::{Coordinator, Observer};
    use tracing::info;

    use super::EVENT_TIMEOUT;

    /// Everything an observer is told, flattened for assertions.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ObserverEvent {
        /// The surface was asked to come to the front
        Activated,
        /// A session was opened
        Opened(SessionId),
        /// A script paused
        Paused {
            /// Session paused in
            session: SessionId,
            /// Line of the statement about to run
            line: usize,
            /// Scope depth at the pause
            depth: usize,
            /// Why it paused
            reason: BreakType,
        },
        /// A paused script was resumed
        Resumed(SessionId),
        /// A session was closed
        Closed(SessionId),
    }

    /// An observer forwarding every callback over a channel, so the test
    /// thread can play the debugger surface.
    pub struct ChannelObserver {
        sender: Sender<ObserverEvent>,
    }

    impl ChannelObserver {
        /// The observer and the receiving end of its events
        pub fn channel() -> (Arc<Self>, ObserverEvents) {
            let (sender, receiver) = mpsc::channel();
            (Arc::new(Self { sender }), ObserverEvents { receiver })
        }

        fn send(&self, event: ObserverEvent) {
            // The test may have stopped listening
            let _ = self.sender.send(event);
        }
    }

    impl Observer for ChannelObserver {
        fn activate(&self) {
            self.send(ObserverEvent::Activated);
        }

        fn session_opened(&self, session: SessionId, _program: &Program) {
            self.send(ObserverEvent::Opened(session));
        }

        fn paused(&self, session: SessionId, info: &DebugInformation, reason: BreakType) {
            self.send(ObserverEvent::Paused {
                session,
                line: info.location().line,
                depth: info.depth(),
                reason,
            });
        }

        fn resumed(&self, session: SessionId) {
            self.send(ObserverEvent::Resumed(session));
        }

        fn session_closed(&self, session: SessionId) {
            self.send(ObserverEvent::Closed(session));
        }
    }

    /// Receiving end of a [`ChannelObserver`].
    pub struct ObserverEvents {
        receiver: Receiver<ObserverEvent>,
    }

    impl ObserverEvents {
        /// Waits for the next pause, skipping other events. Panics on timeout.
        pub fn expect_pause(&self) -> (SessionId, usize, BreakType) {
            loop {
                match self.receiver.recv_timeout(EVENT_TIMEOUT) {
                    Ok(ObserverEvent::Paused { session, line, reason, .. }) => {
                        return (session, line, reason)
                    }
                    Ok(_) => continue,
                    Err(err) => panic!("no pause reported: {err}"),
                }
            }
        }

        /// Events received so far without blocking
        pub fn drain(&self) -> Vec<ObserverEvent> {
            self.receiver.try_iter().collect()
        }
    }

    /// An observer that answers every pause itself, from inside the callback,
    /// with the next scripted action. Once the script runs out it continues.
    pub struct AutoObserver {
        coordinator: OnceCell<Weak<Coordinator>>,
        actions: Mutex<VecDeque<ResumeAction>>,
        pauses: Mutex<Vec<(usize, BreakType)>>,
    }

    impl AutoObserver {
        /// An observer replaying `actions` in order
        pub fn new(actions: impl IntoIterator<Item = ResumeAction>) -> Arc<Self> {
            Arc::new(Self {
                coordinator: OnceCell::new(),
                actions: Mutex::new(actions.into_iter().collect()),
                pauses: Mutex::new(Vec::new()),
            })
        }

        /// Points the observer at the coordinator it should drive
        pub fn bind(&self, coordinator: &Arc<Coordinator>) {
            let _ = self.coordinator.set(Arc::downgrade(coordinator));
        }

        /// Lines paused at, with the reason, in order
        pub fn pauses(&self) -> Vec<(usize, BreakType)> {
            self.pauses.lock().clone()
        }
    }

    impl Observer for AutoObserver {
        fn paused(&self, _session: SessionId, info: &DebugInformation, reason: BreakType) {
            self.pauses.lock().push((info.location().line, reason));

            let action = self.actions.lock().pop_front().unwrap_or(ResumeAction::Continue);
            let Some(coordinator) = self.coordinator.get().and_then(Weak::upgrade) else {
                return;
            };
            info!(line = info.location().line, %action, "Auto-resuming");
            if let Err(err) = coordinator.resume(action) {
                panic!("auto-resume failed: {err}");
            }
        }
    }
}
