//! Block Region Stack
//!
//! Tracks the lexical regions the driver opens and closes while it walks the
//! original function body: protected (`try`/`catch`/`finally`) regions,
//! `with` scopes, and the break/continue targets of loops, switches and
//! labeled statements.
//!
//! Regions live in an arena and are referred to by [`RegionId`]. Besides the
//! live stack, every open and close is appended to an event log stamped with
//! the operation index it happened at; the builder replays that log while it
//! walks the operation list so it knows which protected region and which
//! `with` scopes enclose each case.

use crate::error::LoweringError;
use crate::labels::Label;
use std::fmt;

/// Index of a region in the [`BlockStack`] arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegionId(pub u32);

/// Progress of a protected region. Only ever moves forward.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExceptionPhase {
    Try,
    Catch,
    Finally,
    Done,
}

impl fmt::Display for ExceptionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Try => "try",
            Self::Catch => "catch",
            Self::Finally => "finally",
            Self::Done => "done",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRegion {
    pub phase: ExceptionPhase,
    pub start_label: Label,
    pub catch_variable: Option<String>,
    /// `Label::NONE` until the catch block begins
    pub catch_label: Label,
    /// `Label::NONE` until the finally block begins
    pub finally_label: Label,
    pub end_label: Label,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithRegion {
    /// Identifier holding the evaluated `with` object
    pub expression: String,
    pub start_label: Label,
    pub end_label: Label,
}

/// Target of an unlabeled or labeled `break`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakRegion {
    /// Allocated on first use; `Label::NONE` until then and for native regions
    pub break_label: Label,
    /// Source labels (`outer: while (...)`) this region answers to
    pub label_names: Vec<String>,
    /// Only a labeled `break` may target this region (labeled blocks)
    pub require_label: bool,
    /// The construct stays a native JavaScript loop or switch
    pub native: bool,
}

impl BreakRegion {
    /// Whether a `break`/`continue` with the given source label lands here.
    pub fn answers(&self, label_name: Option<&str>) -> bool {
        match label_name {
            None => !self.require_label,
            Some(name) => self.label_names.iter().any(|l| l == name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinueRegion {
    pub target: BreakRegion,
    /// Supplied by the driver; `Label::NONE` for native regions
    pub continue_label: Label,
}

/// A lexical region. Callers switch on the variant to decide which
/// transitions are legal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    Exception(ExceptionRegion),
    With(WithRegion),
    Break(BreakRegion),
    Continue(ContinueRegion),
}

/// Region discriminant, with native break/continue regions distinguished so
/// that `end_script_*` cannot close a label-based region and vice versa.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegionKind {
    Exception,
    With,
    Break,
    ScriptBreak,
    Continue,
    ScriptContinue,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exception => "an exception region",
            Self::With => "a with region",
            Self::Break => "a break region",
            Self::ScriptBreak => "a native break region",
            Self::Continue => "a continue region",
            Self::ScriptContinue => "a native continue region",
        })
    }
}

impl Region {
    pub const fn kind(&self) -> RegionKind {
        match self {
            Self::Exception(_) => RegionKind::Exception,
            Self::With(_) => RegionKind::With,
            Self::Break(region) if region.native => RegionKind::ScriptBreak,
            Self::Break(_) => RegionKind::Break,
            Self::Continue(region) if region.target.native => RegionKind::ScriptContinue,
            Self::Continue(_) => RegionKind::Continue,
        }
    }

    /// The break part of a break or continue region.
    pub const fn break_target(&self) -> Option<&BreakRegion> {
        match self {
            Self::Break(region) => Some(region),
            Self::Continue(region) => Some(&region.target),
            _ => None,
        }
    }

    pub fn break_target_mut(&mut self) -> Option<&mut BreakRegion> {
        match self {
            Self::Break(region) => Some(region),
            Self::Continue(region) => Some(&mut region.target),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockAction {
    Open,
    Close,
}

/// One entry of the open/close log.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockEvent {
    pub action: BlockAction,
    pub region: RegionId,
    /// Operation index at which the event happened
    pub offset: u32,
}

/// Region arena, live stack and open/close log for one function.
#[derive(Debug, Default)]
pub struct BlockStack {
    regions: Vec<Region>,
    stack: Vec<RegionId>,
    events: Vec<BlockEvent>,
    has_protected_regions: bool,
}

impl BlockStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `region` at operation index `offset`.
    pub fn begin(&mut self, region: Region, offset: u32) -> RegionId {
        if matches!(region, Region::Exception(_)) {
            self.has_protected_regions = true;
        }
        let id = RegionId(self.regions.len() as u32);
        self.regions.push(region);
        self.stack.push(id);
        self.events.push(BlockEvent {
            action: BlockAction::Open,
            region: id,
            offset,
        });
        id
    }

    /// Pop the innermost region, which must be of kind `expected`.
    pub fn end(&mut self, expected: RegionKind, offset: u32) -> Result<RegionId, LoweringError> {
        let id = self.peek(expected)?;
        self.stack.pop();
        self.events.push(BlockEvent {
            action: BlockAction::Close,
            region: id,
            offset,
        });
        Ok(id)
    }

    /// The innermost region, which must be of kind `expected`.
    pub fn peek(&self, expected: RegionKind) -> Result<RegionId, LoweringError> {
        let found = self.stack.last().map(|id| self.get(*id).kind());
        match self.stack.last() {
            Some(id) if found == Some(expected) => Ok(*id),
            _ => Err(LoweringError::RegionMismatch { expected, found }),
        }
    }

    pub fn get(&self, id: RegionId) -> &Region {
        &self.regions[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: RegionId) -> &mut Region {
        &mut self.regions[id.0 as usize]
    }

    /// Innermost region a `break` (optionally labeled) would leave.
    pub fn find_break_target(&self, label_name: Option<&str>) -> Option<RegionId> {
        self.stack.iter().rev().copied().find(|id| {
            self.get(*id)
                .break_target()
                .is_some_and(|target| target.answers(label_name))
        })
    }

    /// Innermost region a `continue` (optionally labeled) would restart.
    pub fn find_continue_target(&self, label_name: Option<&str>) -> Option<RegionId> {
        self.stack
            .iter()
            .rev()
            .copied()
            .find(|id| match self.get(*id) {
                Region::Continue(region) => region.target.answers(label_name),
                _ => false,
            })
    }

    /// Number of regions still open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn events(&self) -> &[BlockEvent] {
        &self.events
    }

    /// Whether any exception region was ever opened.
    pub const fn has_protected_regions(&self) -> bool {
        self.has_protected_regions
    }
}

#[cfg(test)]
#[path = "../tests/blocks.rs"]
mod tests;
