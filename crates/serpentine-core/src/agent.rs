//! Agent dynamics: body, heading, growth and termination
//!
//! An agent is an ordered head-first body of cells. Each step inserts a new
//! head along the (possibly turned) heading and either drops the tail or, when
//! the head lands on the resource, keeps it and grows by one.

use std::collections::VecDeque;
use std::fmt;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::world::{Cell, World};

/// Absolute heading, stored as a clockwise rotation index 0-3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Heading {
    Up = 0,
    #[default]
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Heading {
    /// All headings in rotation order
    pub const ALL: [Heading; 4] = [Heading::Up, Heading::Right, Heading::Down, Heading::Left];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Heading for a rotation index (taken modulo 4)
    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(4) as usize]
    }

    /// Rotate clockwise by `quarter_turns` (negative turns counter-clockwise)
    pub fn rotated(self, quarter_turns: i32) -> Self {
        Self::from_index(self as i32 + quarter_turns)
    }

    /// Heading after applying a steering action
    pub fn turned(self, action: Action) -> Self {
        self.rotated(action.rotation())
    }

    /// Unit step for this heading (y grows downward)
    pub fn delta(self) -> Cell {
        match self {
            Heading::Up => Cell::new(0, -1),
            Heading::Right => Cell::new(1, 0),
            Heading::Down => Cell::new(0, 1),
            Heading::Left => Cell::new(-1, 0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Heading::Up => "up",
            Heading::Right => "right",
            Heading::Down => "down",
            Heading::Left => "left",
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Steering action relative to the current heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    TurnLeft = 0,
    Straight = 1,
    TurnRight = 2,
}

impl Action {
    /// Number of policy outputs
    pub const COUNT: usize = 3;

    /// Actions in output-index order
    pub const ALL: [Action; 3] = [Action::TurnLeft, Action::Straight, Action::TurnRight];

    /// Quarter turns applied to the heading
    pub fn rotation(self) -> i32 {
        match self {
            Action::TurnLeft => -1,
            Action::Straight => 0,
            Action::TurnRight => 1,
        }
    }

    /// Decode policy scores into an action.
    ///
    /// The strictly greatest score wins; exact ties go to the lowest index.
    /// NaN never compares greater, so a NaN entry can only win at index 0.
    pub fn decode(scores: &[f32], slot: usize) -> SimResult<Action> {
        if scores.len() != Self::COUNT {
            return Err(SimError::OutputArityMismatch {
                slot,
                expected: Self::COUNT,
                actual: scores.len(),
            });
        }

        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = i;
            }
        }
        Ok(Self::ALL[best])
    }
}

/// Lifecycle status reported after a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentStatus {
    Alive,
    DiedWall,
    DiedSelf,
    DiedTimeout,
    /// Body covers every cell, so no resource can be placed
    FilledGrid,
}

impl AgentStatus {
    pub fn is_alive(self) -> bool {
        self == AgentStatus::Alive
    }

    pub fn name(self) -> &'static str {
        match self {
            AgentStatus::Alive => "alive",
            AgentStatus::DiedWall => "wall",
            AgentStatus::DiedSelf => "self",
            AgentStatus::DiedTimeout => "timeout",
            AgentStatus::FilledGrid => "filled",
        }
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickResult {
    pub new_head: Cell,
    pub heading: Heading,
    pub consumed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    body: VecDeque<Cell>,
    heading: Heading,
    idle_timer: u32,
    score: u32,
    ticks_alive: u32,
}

impl Agent {
    /// Create an agent from an explicit head-first body
    pub fn new(body: impl IntoIterator<Item = Cell>, heading: Heading) -> SimResult<Self> {
        let body: VecDeque<Cell> = body.into_iter().collect();
        if body.is_empty() {
            return Err(SimError::InitialBodyTooShort { length: 0, min: 1 });
        }
        Ok(Self {
            body,
            heading,
            idle_timer: 0,
            score: 0,
            ticks_alive: 0,
        })
    }

    /// Straight body of `length` cells with the head at `head`, trailing
    /// opposite to `heading`
    pub fn straight(head: Cell, heading: Heading, length: usize) -> SimResult<Self> {
        let back = -heading.delta();
        Self::new((0..length as i32).map(|i| head + back * i), heading)
    }

    pub fn head(&self) -> Cell {
        // Body is never empty: construction rejects it and steps only grow or keep length
        self.body[0]
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn idle_timer(&self) -> u32 {
        self.idle_timer
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Steps taken since spawn
    pub fn ticks_alive(&self) -> u32 {
        self.ticks_alive
    }

    /// Apply one move against the world's current resource.
    ///
    /// The caller relocates the resource when `consumed` is set.
    pub fn step(&mut self, action: Action, world: &World) -> TickResult {
        self.heading = self.heading.turned(action);
        let new_head = self.head() + self.heading.delta();
        self.body.push_front(new_head);
        self.ticks_alive += 1;

        let consumed = new_head == world.resource();
        if consumed {
            self.score += 1;
            self.idle_timer = 0;
        } else {
            self.body.pop_back();
            self.idle_timer += 1;
        }

        TickResult {
            new_head,
            heading: self.heading,
            consumed,
        }
    }

    /// Termination check, run after a move.
    ///
    /// Bounds are checked before self-intersection; an out-of-bounds head is
    /// never compared against the body.
    pub fn status(&self, world: &World, max_idle: u32) -> AgentStatus {
        if world.is_out_of_bounds(self.head()) {
            return AgentStatus::DiedWall;
        }
        if self.self_intersects() {
            return AgentStatus::DiedSelf;
        }
        if self.idle_timer > max_idle {
            return AgentStatus::DiedTimeout;
        }
        AgentStatus::Alive
    }

    /// True if any two body cells coincide
    pub fn self_intersects(&self) -> bool {
        let mut seen = AHashSet::with_capacity(self.body.len());
        !self.body.iter().all(|cell| seen.insert(*cell))
    }
}
