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

use crate::universal_id;

universal_id! {
    /// Identity of one lexical or call frame at a notification instant.
    ///
    /// Engines mint a fresh handle whenever they enter a block or a call and
    /// report the same handle for as long as that frame is alive. The debugger
    /// never inspects frames, it only compares handles.
    ScopeId => 1
}

universal_id! {
    /// Identity of one instrumented script engine.
    EngineId => 1
}

universal_id! {
    /// Identity of one debugging session (one distinct program source).
    SessionId => 1
}
