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

//! The execution coordinator.
//!
//! [`Coordinator`] receives every notification from the script engines it is
//! attached to and decides, under one lock, whether the notifying thread may
//! run on or must suspend until the observer resumes it.
//!
//! # Dispatch
//!
//! The coordinator is either [`DispatchState::Idle`] or dispatching exactly one
//! notification. A thread that notifies while another notification is being
//! dispatched blocks until that one has been resumed, so an observer only
//! ever deals with one paused script at a time.
//!
//! ```text
//!            notify (suppressed / fast path)
//!          +-------------------------------+
//!          v                               |
//!       [Idle] ------ notify (stop) -----> [Dispatching(session)]
//!          ^                               |
//!          +--- continue / step_* / close -+
//! ```
//!
//! # Observer delivery
//!
//! Observer callbacks are queued while the lock is held and delivered after it
//! is released, one caller at a time and in the order they were queued. A
//! `resumed` queued from inside `paused` is therefore delivered after `paused`
//! returns, by the thread that is already delivering.

use std::{collections::VecDeque, fmt, mem, sync::Arc};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use sdb_common::{
    sdb_assert, sdb_assert_eq, BreakType, Breakpoint, DebugInformation, Program, ResumeAction, SessionId,
    StepMode,
};

use crate::{
    BreakFlag, Continuation, CoordinatorConfig, DebuggerError, DebuggerResult, Observer,
    ProgramMap, ScriptEngine, Session, SessionSnapshot, StepDecision, SubscriptionId,
};

/// Whether a notification is currently awaiting an observer decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DispatchState {
    /// No script thread is suspended.
    #[default]
    Idle,
    /// A script thread is suspended in the given session.
    Dispatching(SessionId),
}

#[derive(Default)]
struct CoordinatorState {
    break_flag: BreakFlag,
    sessions: ProgramMap,
    dispatching: Option<SessionId>,
    observer: Option<Arc<dyn Observer>>,
    outbox: VecDeque<Callback>,
}

impl fmt::Debug for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinatorState")
            .field("break_flag", &self.break_flag)
            .field("sessions", &self.sessions)
            .field("dispatching", &self.dispatching)
            .field("observer", &self.observer.is_some())
            .field("outbox", &self.outbox.len())
            .finish()
    }
}

impl CoordinatorState {
    /// Signals every outstanding continuation and returns to idle.
    fn release_all(&mut self, reason: &str) -> usize {
        let mut released = 0;
        for session in self.sessions.iter_mut() {
            if let Some(continuation) = session.release() {
                warn!(session = %session.id(), "Releasing paused script: {reason}");
                continuation.signal();
                released += 1;
            }
        }
        self.dispatching = None;
        self.break_flag.set(false);
        released
    }

    /// Queues an observer callback. Dropped when no observer is registered.
    fn post(&mut self, callback: Callback) {
        if self.observer.is_some() {
            self.outbox.push_back(callback);
        }
    }

    fn session_mut(&mut self, id: SessionId) -> DebuggerResult<&mut Session> {
        self.sessions.get_mut(id).ok_or(DebuggerError::UnknownSession(id))
    }
}

/// An observer callback queued under the lock.
#[derive(Debug)]
enum Callback {
    Activate,
    Opened(SessionId, Program),
    Paused(SessionId, DebugInformation, BreakType),
    Resumed(SessionId),
    Closed(SessionId),
}

impl Callback {
    fn deliver(&self, observer: &dyn Observer) {
        match self {
            Self::Activate => observer.activate(),
            Self::Opened(session, program) => observer.session_opened(*session, program),
            Self::Paused(session, info, reason) => observer.paused(*session, info, *reason),
            Self::Resumed(session) => observer.resumed(*session),
            Self::Closed(session) => observer.session_closed(*session),
        }
    }
}

/// Coordinates script threads with the observer.
///
/// Usually shared as `Arc<Coordinator>` between the engine threads and the
/// observer. Dropping the coordinator signals every outstanding continuation.
#[derive(Debug)]
pub struct Coordinator {
    config: CoordinatorConfig,
    state: Mutex<CoordinatorState>,
    idle: Condvar,
    delivery: Mutex<()>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

impl Coordinator {
    /// A coordinator with no observer and no sessions.
    pub fn new(config: CoordinatorConfig) -> Self {
        let state = CoordinatorState {
            break_flag: BreakFlag::new(config.break_on_start),
            ..Default::default()
        };
        Self { config, state: Mutex::new(state), idle: Condvar::new(), delivery: Mutex::new(()) }
    }

    /// Builder-style observer registration.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.state.get_mut().observer = Some(observer);
        self
    }

    /// The configuration this coordinator was built with.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Replaces the observer. Pauses already reported stay pending.
    pub fn set_observer(&self, observer: Arc<dyn Observer>) {
        self.state.lock().observer = Some(observer);
    }

    /// Removes the observer and releases every paused script.
    ///
    /// Pending steps are cancelled along with the pauses, so released scripts
    /// run on to their next breakpoint. Undelivered callbacks are discarded.
    pub fn detach_observer(&self) -> Option<Arc<dyn Observer>> {
        let mut state = self.state.lock();
        let observer = state.observer.take();
        state.outbox.clear();
        let released = state.release_all("observer detached");
        if released > 0 {
            self.idle.notify_all();
        }
        observer
    }

    /// Turns on the engine's statement instrumentation so it starts notifying.
    pub fn attach(&self, engine: &Arc<dyn ScriptEngine>) {
        info!(engine = %engine.id(), "Attaching script engine");
        engine.set_debug_mode(true);
    }

    /// Turns the engine's instrumentation off again.
    pub fn detach(&self, engine: &Arc<dyn ScriptEngine>) {
        info!(engine = %engine.id(), "Detaching script engine");
        engine.set_debug_mode(false);
    }

    /// Reports a notification and returns the continuation the calling thread
    /// must wait on before executing the statement.
    ///
    /// Blocks while another notification is being dispatched. The returned
    /// continuation is already signaled when the statement may run right away.
    pub fn notify(
        &self,
        engine: &Arc<dyn ScriptEngine>,
        info: DebugInformation,
        break_type: BreakType,
    ) -> Continuation {
        let mut guard = self.state.lock();
        while guard.dispatching.is_some() {
            self.idle.wait(&mut guard);
        }

        let state = &mut *guard;
        let hit = state.sessions.hits_breakpoint(&info);
        if break_type == BreakType::Step && !hit && !state.break_flag.is_requested() {
            return Continuation::signaled();
        }

        let (session, created) = state.sessions.get_or_create(&info.program);
        let id = session.id();
        if created {
            info!(session = %id, lines = session.line_count(), "Opened session");
        }
        session.attach_engine(engine);

        // A suppressed step leaves the flag raised for the next statement
        let continuation = if break_type == BreakType::Step
            && !hit
            && session.decide_step(&info) == StepDecision::Suppress
        {
            debug!(session = %id, location = %info.location(), depth = info.depth(), "Step suppressed");
            None
        } else {
            let reason = if hit { BreakType::Break } else { break_type };
            let continuation = Continuation::new();
            session.pause(info.clone(), reason, continuation.clone());
            Some((continuation, reason))
        };

        if self.config.activate_observer {
            state.post(Callback::Activate);
        }
        if created {
            state.post(Callback::Opened(id, info.program.clone()));
        }
        let continuation = match continuation {
            Some((continuation, reason)) => {
                state.break_flag.set(false);
                sdb_assert_eq!(state.dispatching, None, "paused while already dispatching");
                state.dispatching = Some(id);
                info!(session = %id, location = %info.location(), %reason, "Paused");
                state.post(Callback::Paused(id, info, reason));
                continuation
            }
            None => Continuation::signaled(),
        };
        drop(guard);

        self.deliver();
        continuation
    }

    /// Delivers queued callbacks unless another caller is already delivering.
    fn deliver(&self) {
        loop {
            let Some(delivering) = self.delivery.try_lock() else {
                return;
            };
            loop {
                let (observer, callbacks) = {
                    let mut state = self.state.lock();
                    (state.observer.clone(), mem::take(&mut state.outbox))
                };
                let Some(observer) = observer else {
                    break;
                };
                if callbacks.is_empty() {
                    break;
                }
                for callback in &callbacks {
                    callback.deliver(observer.as_ref());
                }
            }
            drop(delivering);

            // A callback queued after the last drain but before the unlock would
            // have found the delivery lock held.
            if self.state.lock().outbox.is_empty() {
                return;
            }
        }
    }

    /// Engine-side hook: [`Self::notify`] followed by waiting on the continuation.
    pub fn process(
        &self,
        engine: &Arc<dyn ScriptEngine>,
        info: DebugInformation,
        break_type: BreakType,
    ) {
        self.notify(engine, info, break_type).wait();
    }

    /// Resumes the paused script, returning the session it was paused in.
    ///
    /// For a step, the step filter is armed from the scope stack the script
    /// was paused at and the break-requested flag is raised, so the script
    /// pauses again at the first statement the filter lets through.
    pub fn resume(&self, action: ResumeAction) -> DebuggerResult<SessionId> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let id = state.dispatching.ok_or(DebuggerError::NotPaused)?;

        let continuation = state.sessions.get_mut(id).and_then(|session| session.resume(action));
        sdb_assert!(continuation.is_some(), "dispatching session {id} has no pending continuation");

        if matches!(action, ResumeAction::Step(_)) {
            state.break_flag.set(true);
        }
        if let Some(continuation) = continuation {
            continuation.signal();
        }
        state.dispatching = None;
        state.post(Callback::Resumed(id));
        drop(guard);
        self.idle.notify_all();

        info!(session = %id, %action, "Resumed");
        self.deliver();
        Ok(id)
    }

    /// Runs until the next breakpoint or break request.
    pub fn continue_execution(&self) -> DebuggerResult<SessionId> {
        self.resume(ResumeAction::Continue)
    }

    /// Pauses at the very next statement.
    pub fn step_into(&self) -> DebuggerResult<SessionId> {
        self.resume(ResumeAction::Step(StepMode::Into))
    }

    /// Pauses at the next statement not inside a deeper call.
    pub fn step_over(&self) -> DebuggerResult<SessionId> {
        self.resume(ResumeAction::Step(StepMode::Over))
    }

    /// Pauses once the current frame has returned.
    pub fn step_out(&self) -> DebuggerResult<SessionId> {
        self.resume(ResumeAction::Step(StepMode::Out))
    }

    /// Pause at the next statement any attached engine executes.
    pub fn request_break(&self) {
        if self.state.lock().break_flag.set(true) {
            info!("Break requested");
        }
    }

    /// Whether the next statement will pause regardless of breakpoints.
    pub fn is_break_requested(&self) -> bool {
        self.state.lock().break_flag.is_requested()
    }

    /// Registers a listener for break-requested changes.
    ///
    /// The listener runs while the coordinator's lock is held and must not
    /// call back into the coordinator.
    pub fn subscribe_break_requested<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.state.lock().break_flag.subscribe(Arc::new(listener))
    }

    /// Removes a break-requested listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.lock().break_flag.unsubscribe(id)
    }

    /// Opens (or finds) the session for `program` ahead of its first run, e.g. to set breakpoints.
    pub fn open_session(&self, program: &Program) -> SessionId {
        let (id, created) = {
            let mut state = self.state.lock();
            let (session, created) = state.sessions.get_or_create(program);
            let id = session.id();
            if created {
                state.post(Callback::Opened(id, program.clone()));
            }
            (id, created)
        };
        if created {
            info!(session = %id, "Opened session");
            self.deliver();
        }
        id
    }

    /// The session bound to `program`, if it has been opened.
    pub fn session_for(&self, program: &Program) -> Option<SessionId> {
        self.state.lock().sessions.find(program)
    }

    /// All open sessions, oldest first.
    pub fn sessions(&self) -> Vec<SessionId> {
        self.state.lock().sessions.ids()
    }

    /// A display copy of a session.
    pub fn snapshot(&self, session: SessionId) -> DebuggerResult<SessionSnapshot> {
        self.state
            .lock()
            .sessions
            .get(session)
            .map(Session::snapshot)
            .ok_or(DebuggerError::UnknownSession(session))
    }

    /// Current dispatch state.
    pub fn dispatch_state(&self) -> DispatchState {
        match self.state.lock().dispatching {
            Some(id) => DispatchState::Dispatching(id),
            None => DispatchState::Idle,
        }
    }

    /// The session a script is paused in.
    pub fn active_session(&self) -> Option<SessionId> {
        self.state.lock().dispatching
    }

    /// Breakpoints of a session, ordered by line.
    pub fn breakpoints(&self, session: SessionId) -> DebuggerResult<Vec<Breakpoint>> {
        self.state
            .lock()
            .sessions
            .get(session)
            .map(|session| session.breakpoints().all())
            .ok_or(DebuggerError::UnknownSession(session))
    }

    /// Adds a breakpoint. Returns false when it already existed.
    ///
    /// Breakpoints past the end of the program are kept but never match.
    pub fn add_breakpoint(&self, session: SessionId, breakpoint: Breakpoint) -> DebuggerResult<bool> {
        self.update_breakpoints(session, |session| Ok(session.breakpoints_mut().add(breakpoint)))
    }

    /// Adds a breakpoint at the first breakable column of `line`.
    pub fn add_breakpoint_at_line(&self, session: SessionId, line: usize) -> DebuggerResult<Breakpoint> {
        self.update_breakpoints(session, |session| {
            let line_count = session.line_count();
            let text = session
                .program()
                .line(line)
                .map(str::to_owned)
                .ok_or(DebuggerError::LineOutOfRange { line, line_count })?;
            session.breakpoints_mut().add_at_line(line, &text)
        })
    }

    /// Removes a breakpoint. Returns false when it did not exist.
    pub fn remove_breakpoint(&self, session: SessionId, breakpoint: &Breakpoint) -> DebuggerResult<bool> {
        self.update_breakpoints(session, |session| Ok(session.breakpoints_mut().remove(breakpoint)))
    }

    /// Removes every breakpoint of a session.
    pub fn clear_breakpoints(&self, session: SessionId) -> DebuggerResult<()> {
        self.update_breakpoints(session, |session| {
            session.breakpoints_mut().clear();
            Ok(())
        })
    }

    fn update_breakpoints<T>(
        &self,
        session: SessionId,
        update: impl FnOnce(&mut Session) -> DebuggerResult<T>,
    ) -> DebuggerResult<T> {
        let mut state = self.state.lock();
        let session = state.session_mut(session)?;
        let result = update(session)?;
        debug!(session = %session.id(), breakpoints = session.breakpoints().len(), "Breakpoints changed");
        session.sync_breakpoints();
        Ok(result)
    }

    /// Closes a session, releasing a script paused in it.
    pub fn close_session(&self, session: SessionId) -> DebuggerResult<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut closed = state.sessions.remove(session).ok_or(DebuggerError::UnknownSession(session))?;

        if let Some(continuation) = closed.release() {
            warn!(session = %session, "Releasing paused script: session closed");
            continuation.signal();
        }
        if state.dispatching == Some(session) {
            state.dispatching = None;
            self.idle.notify_all();
        }
        state.post(Callback::Closed(session));
        drop(guard);

        info!(session = %session, "Closed session");
        self.deliver();
        Ok(())
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.state.get_mut().release_all("coordinator dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdb_common::{EngineId, ScopeId, SourceRange};

    struct NullEngine(EngineId);

    impl ScriptEngine for NullEngine {
        fn id(&self) -> EngineId {
            self.0
        }

        fn set_debug_mode(&self, _enabled: bool) {}

        fn load_breakpoints(&self, _breakpoints: &[Breakpoint]) {}
    }

    fn engine() -> Arc<dyn ScriptEngine> {
        Arc::new(NullEngine(EngineId::next()))
    }

    fn at(program: &Program, line: usize, scopes: &[ScopeId]) -> DebugInformation {
        DebugInformation::new(program.clone(), SourceRange::on_line(line, 0, 1), scopes.to_vec())
    }

    #[test]
    fn test_fast_path_does_not_open_a_session() {
        let coordinator = Coordinator::default();
        let program = Program::from("a;\nb;");

        let continuation = coordinator.notify(&engine(), at(&program, 1, &[]), BreakType::Step);
        assert!(continuation.is_signaled());
        assert_eq!(coordinator.dispatch_state(), DispatchState::Idle);
        assert!(coordinator.sessions().is_empty());
    }

    #[test]
    fn test_break_on_start_pauses_first_statement() {
        let coordinator = Coordinator::new(CoordinatorConfig::default().with_break_on_start(true));
        let program = Program::from("a;");

        let continuation = coordinator.notify(&engine(), at(&program, 1, &[]), BreakType::Step);
        assert!(!continuation.is_signaled());
        assert!(!coordinator.is_break_requested());

        let id = coordinator.continue_execution().unwrap();
        assert_eq!(Some(id), coordinator.session_for(&program));
        assert!(continuation.is_signaled());
    }

    #[test]
    fn test_commands_require_a_pause() {
        let coordinator = Coordinator::default();
        assert_eq!(coordinator.continue_execution(), Err(DebuggerError::NotPaused));
        assert_eq!(coordinator.step_over(), Err(DebuggerError::NotPaused));
        assert!(!coordinator.is_break_requested());
    }

    #[test]
    fn test_unknown_session() {
        let coordinator = Coordinator::default();
        let missing = SessionId::next();
        assert_eq!(coordinator.breakpoints(missing), Err(DebuggerError::UnknownSession(missing)));
        assert_eq!(coordinator.close_session(missing), Err(DebuggerError::UnknownSession(missing)));
    }

    #[test]
    fn test_add_breakpoint_at_line_bounds() {
        let coordinator = Coordinator::default();
        let program = Program::from("a;\n  // comment\n");
        let id = coordinator.open_session(&program);

        assert_eq!(
            coordinator.add_breakpoint_at_line(id, 1).unwrap(),
            Breakpoint::new(1, 0)
        );
        assert_eq!(
            coordinator.add_breakpoint_at_line(id, 1),
            Err(DebuggerError::BreakpointExists { line: 1 })
        );
        assert_eq!(
            coordinator.add_breakpoint_at_line(id, 2),
            Err(DebuggerError::NoBreakableColumn { line: 2 })
        );
        assert_eq!(
            coordinator.add_breakpoint_at_line(id, 9),
            Err(DebuggerError::LineOutOfRange { line: 9, line_count: 3 })
        );
        assert_eq!(coordinator.breakpoints(id).unwrap(), vec![Breakpoint::new(1, 0)]);
    }

    #[test]
    fn test_drop_releases_pending_continuation() {
        let coordinator = Coordinator::default();
        let program = Program::from("a;");
        let continuation =
            coordinator.notify(&engine(), at(&program, 1, &[ScopeId::next()]), BreakType::Break);
        assert!(!continuation.is_signaled());

        drop(coordinator);
        assert!(continuation.is_signaled());
    }
}
