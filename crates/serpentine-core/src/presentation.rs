//! Read-only views of a running cohort for display
//!
//! The cohort hands out [`CohortFrame`]s that borrow its state immutably; a
//! [`PresentationAdapter`] turns a frame into colored sprites. Nothing here
//! can change the simulation.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::agent::Heading;
use crate::world::Cell;

/// Snapshot of one active member
#[derive(Debug, Clone)]
pub struct MemberView<'a> {
    /// Current index in the cohort
    pub index: usize,
    /// Original slot
    pub slot: usize,
    pub body: &'a VecDeque<Cell>,
    pub heading: Heading,
    pub resource: Cell,
    pub score: u32,
}

/// Snapshot of the cohort after a tick
#[derive(Debug, Clone)]
pub struct CohortFrame<'a> {
    pub tick: u64,
    pub width: i32,
    pub height: i32,
    pub members: Vec<MemberView<'a>>,
    /// Index of the best-so-far member
    pub best: Option<usize>,
}

impl CohortFrame<'_> {
    pub fn best_member(&self) -> Option<&MemberView<'_>> {
        self.best.and_then(|i| self.members.get(i))
    }
}

/// Which members get surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DisplayMode {
    /// Only the best-so-far member
    #[default]
    BestOnly,
    /// Every active member, best drawn on top
    All,
}

/// Drawable agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSprite {
    pub slot: usize,
    pub cells: Vec<Cell>,
    pub heading: Heading,
    pub resource: Cell,
    pub body_color: [u8; 4],
    pub resource_color: [u8; 4],
    /// Higher layers draw later
    pub layer: u8,
    pub highlighted: bool,
}

/// Chooses what to draw and how
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationAdapter {
    pub mode: DisplayMode,
    pub body_color: [u8; 4],
    pub highlight_color: [u8; 4],
    pub resource_color: [u8; 4],
}

impl Default for PresentationAdapter {
    fn default() -> Self {
        Self {
            mode: DisplayMode::BestOnly,
            body_color: [70, 215, 40, 96],
            highlight_color: [70, 215, 40, 255],
            resource_color: [220, 0, 27, 255],
        }
    }
}

impl PresentationAdapter {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Sprites for a frame, sorted by draw layer
    pub fn sprites(&self, frame: &CohortFrame<'_>) -> Vec<AgentSprite> {
        let mut sprites: Vec<AgentSprite> = frame
            .members
            .iter()
            .filter(|m| match self.mode {
                DisplayMode::BestOnly => frame.best == Some(m.index),
                DisplayMode::All => true,
            })
            .map(|m| {
                let highlighted = frame.best == Some(m.index);
                AgentSprite {
                    slot: m.slot,
                    cells: m.body.iter().copied().collect(),
                    heading: m.heading,
                    resource: m.resource,
                    body_color: if highlighted {
                        self.highlight_color
                    } else {
                        self.body_color
                    },
                    resource_color: self.resource_color,
                    layer: u8::from(highlighted),
                    highlighted,
                }
            })
            .collect();

        sprites.sort_by_key(|s| s.layer);
        sprites
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame<'a>(bodies: &'a [VecDeque<Cell>], best: Option<usize>) -> CohortFrame<'a> {
        CohortFrame {
            tick: 3,
            width: 10,
            height: 10,
            members: bodies
                .iter()
                .enumerate()
                .map(|(index, body)| MemberView {
                    index,
                    slot: index + 10,
                    body,
                    heading: Heading::Right,
                    resource: Cell::new(9, 9),
                    score: index as u32,
                })
                .collect(),
            best,
        }
    }

    fn bodies() -> Vec<VecDeque<Cell>> {
        vec![
            VecDeque::from(vec![Cell::new(1, 1), Cell::new(0, 1)]),
            VecDeque::from(vec![Cell::new(5, 5), Cell::new(4, 5)]),
        ]
    }

    #[test]
    fn test_best_only_mode() {
        let bodies = bodies();
        let frame = frame(&bodies, Some(1));
        let sprites = PresentationAdapter::new(DisplayMode::BestOnly).sprites(&frame);

        assert_eq!(sprites.len(), 1);
        assert_eq!(sprites[0].slot, 11);
        assert!(sprites[0].highlighted);
        assert_eq!(frame.best_member().map(|m| m.score), Some(1));
    }

    #[test]
    fn test_all_mode_draws_best_last() {
        let bodies = bodies();
        let frame = frame(&bodies, Some(0));
        let adapter = PresentationAdapter::new(DisplayMode::All);
        let sprites = adapter.sprites(&frame);

        assert_eq!(sprites.len(), 2);
        assert_eq!(sprites[1].slot, 10);
        assert_eq!(sprites[1].body_color, adapter.highlight_color);
        assert_eq!(sprites[0].body_color, adapter.body_color);
    }

    #[test]
    fn test_empty_frame() {
        let frame = frame(&[], None);
        assert!(PresentationAdapter::default().sprites(&frame).is_empty());
    }
}
