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

//! Debugging sessions and the map from program source to session.
//!
//! Every distinct program text gets exactly one [`Session`], reused across runs
//! of the same text (and across engines running it), so breakpoints and the
//! last known position survive a re-run.

use std::{collections::HashMap, fmt, sync::Arc};

use serde::Serialize;
use tracing::debug;

use sdb_common::{
    sdb_assert, BreakType, Breakpoint, DebugInformation, EngineId, Program, ResumeAction,
    SessionId, SessionState, StepMode,
};

use crate::{BreakpointRegistry, Continuation, ScriptEngine, StepDecision, StepFilter};

/// Per-program debugging state.
pub struct Session {
    id: SessionId,
    program: Program,
    line_count: usize,
    breakpoints: BreakpointRegistry,
    filter: StepFilter,
    last_info: Option<DebugInformation>,
    pending: Option<Continuation>,
    state: SessionState,
    engine: Option<Arc<dyn ScriptEngine>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("line_count", &self.line_count)
            .field("breakpoints", &self.breakpoints)
            .field("filter", &self.filter)
            .field("state", &self.state)
            .field("engine", &self.engine_id())
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

impl Session {
    /// A fresh session for `program`: no breakpoints, no filter, not paused.
    pub fn new(id: SessionId, program: Program) -> Self {
        Self {
            id,
            line_count: program.line_count(),
            program,
            breakpoints: BreakpointRegistry::new(),
            filter: StepFilter::new(),
            last_info: None,
            pending: None,
            state: SessionState::Running,
            engine: None,
        }
    }

    /// Session identity.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The program this session is bound to.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Lines in the program, as used to discard stale breakpoints.
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Session breakpoints.
    pub fn breakpoints(&self) -> &BreakpointRegistry {
        &self.breakpoints
    }

    /// Mutable access to the breakpoints. Call [`Self::sync_breakpoints`] afterwards.
    pub fn breakpoints_mut(&mut self) -> &mut BreakpointRegistry {
        &mut self.breakpoints
    }

    /// Step filter state.
    pub fn filter(&self) -> &StepFilter {
        &self.filter
    }

    /// Paused or running.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The snapshot of the current pause, if paused.
    pub fn last_debug_information(&self) -> Option<&DebugInformation> {
        self.last_info.as_ref()
    }

    /// The engine that most recently notified through this session.
    pub fn engine_id(&self) -> Option<EngineId> {
        self.engine.as_ref().map(|engine| engine.id())
    }

    /// Whether a script thread is waiting on this session.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether `info` stands on one of this session's breakpoints.
    pub fn hits_breakpoint(&self, info: &DebugInformation) -> bool {
        self.breakpoints.matches(info.location(), self.line_count)
    }

    /// Runs the step filter against a step notification.
    pub fn decide_step(&self, info: &DebugInformation) -> StepDecision {
        self.filter.decide(&info.scopes)
    }

    /// Records `engine` as the session's engine. When it differs from the
    /// previous one, the session's breakpoints are loaded into it.
    pub fn attach_engine(&mut self, engine: &Arc<dyn ScriptEngine>) -> bool {
        if self.engine_id() == Some(engine.id()) {
            return false;
        }
        debug!(session = %self.id, engine = %engine.id(), "Engine changed, loading breakpoints");
        self.engine = Some(engine.clone());
        self.sync_breakpoints();
        true
    }

    /// Pushes the current breakpoint list to the session's engine, if any.
    pub fn sync_breakpoints(&self) {
        if let Some(engine) = &self.engine {
            engine.load_breakpoints(&self.breakpoints.all());
        }
    }

    /// Suspends the session on `continuation` at `info`.
    ///
    /// An explicit break disarms any step in progress, so the next resume
    /// starts from a clean filter.
    pub fn pause(&mut self, info: DebugInformation, reason: BreakType, continuation: Continuation) {
        sdb_assert!(self.pending.is_none(), "session {} already has a pending continuation", self.id);

        if reason == BreakType::Break {
            self.filter.reset();
        }
        self.pending = Some(continuation);
        self.last_info = Some(info);
        self.state = SessionState::Paused;
    }

    /// Applies a resume decision and hands back the continuation to signal.
    ///
    /// Returns `None` when the session is not paused. For a step, the filter is
    /// armed from the scope stack of the statement the session is paused at.
    pub fn resume(&mut self, action: ResumeAction) -> Option<Continuation> {
        let continuation = self.pending.take()?;

        self.filter.reset();
        let info = self.last_info.take();
        if let (ResumeAction::Step(mode), Some(info)) = (action, &info) {
            self.filter.arm(mode, &info.scopes);
        }
        self.state = SessionState::Running;

        Some(continuation)
    }

    /// Tears down a pause without a user decision, handing back the continuation to signal.
    pub fn release(&mut self) -> Option<Continuation> {
        self.filter.reset();
        let continuation = self.pending.take()?;
        self.last_info = None;
        self.state = SessionState::Running;
        Some(continuation)
    }

    /// A display copy of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            program: self.program.clone(),
            breakpoints: self.breakpoints.all(),
            last_debug_information: self.last_info.clone(),
            state: self.state,
            engine: self.engine_id(),
        }
    }
}

/// Owned copy of a session's observable state, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Session identity
    pub id: SessionId,
    /// Program the session is bound to
    pub program: Program,
    /// Breakpoints, ordered by line
    pub breakpoints: Vec<Breakpoint>,
    /// Where the session is paused, if it is
    pub last_debug_information: Option<DebugInformation>,
    /// Paused or running
    pub state: SessionState,
    /// Engine that last notified through the session
    pub engine: Option<EngineId>,
}

impl SessionSnapshot {
    /// Whether the step commands would be accepted.
    pub fn can_step(&self) -> bool {
        self.state.can_step()
    }

    /// Step modes an observer can offer right now.
    pub fn available_steps(&self) -> &'static [StepMode] {
        if self.can_step() {
            &[StepMode::Into, StepMode::Over, StepMode::Out]
        } else {
            &[]
        }
    }
}

/// One session per distinct program text.
#[derive(Debug, Default)]
pub struct ProgramMap {
    keys: HashMap<Program, SessionId>,
    sessions: HashMap<SessionId, Session>,
    /// Last resolved program, so repeated notifications skip hashing the text.
    recent: Option<(Program, SessionId)>,
}

impl ProgramMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The session for `program`, creating it on first sight. The flag tells whether it was created.
    pub fn get_or_create(&mut self, program: &Program) -> (&mut Session, bool) {
        let mut created = false;
        let id = *self.keys.entry(program.clone()).or_insert_with(|| {
            created = true;
            SessionId::next()
        });
        self.recent = Some((program.clone(), id));
        let session = self.sessions.entry(id).or_insert_with(|| Session::new(id, program.clone()));
        (session, created)
    }

    /// Like [`Self::find`], but answers from the last resolved program when
    /// `program` shares its source buffer.
    pub fn resolve(&mut self, program: &Program) -> Option<SessionId> {
        if let Some((recent, id)) = &self.recent {
            if recent.shares_source(program) {
                return Some(*id);
            }
        }
        let id = self.find(program)?;
        self.recent = Some((program.clone(), id));
        Some(id)
    }

    /// Whether `info` stands on a breakpoint of the session bound to its program.
    pub fn hits_breakpoint(&mut self, info: &DebugInformation) -> bool {
        if self.sessions.is_empty() {
            return false;
        }
        self.resolve(&info.program)
            .and_then(|id| self.sessions.get(&id))
            .is_some_and(|session| !session.breakpoints().is_empty() && session.hits_breakpoint(info))
    }

    /// The session bound to `program`, if any.
    pub fn find(&self, program: &Program) -> Option<SessionId> {
        self.keys.get(program).copied()
    }

    /// Session by id.
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Mutable session by id.
    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// Removes a session and releases its program key.
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        let session = self.sessions.remove(&id)?;
        self.keys.remove(session.program());
        if self.recent.as_ref().is_some_and(|(_, recent)| *recent == id) {
            self.recent = None;
        }
        Some(session)
    }

    /// Session ids in creation order.
    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Iterate sessions mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> + '_ {
        self.sessions.values_mut()
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session exists.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
