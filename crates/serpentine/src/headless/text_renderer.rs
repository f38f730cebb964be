//! Character-grid renderer for headless previews
//!
//! Draws [`AgentSprite`]s into a text buffer, one character per cell.

use serpentine_core::{AgentSprite, Heading};

const EMPTY: char = '.';
const RESOURCE: char = '*';
const BODY: char = 'o';
const BODY_HIGHLIGHT: char = 'O';

/// Renderer that outputs to a character buffer
pub struct TextRenderer {
    pub width: usize,
    pub height: usize,
    /// Row-major cells
    pub buffer: Vec<char>,
}

impl TextRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            buffer: vec![EMPTY; width * height],
        }
    }

    /// Render sprites in order; later sprites draw over earlier ones
    pub fn render(&mut self, sprites: &[AgentSprite]) {
        self.buffer.fill(EMPTY);

        for sprite in sprites {
            self.put(sprite.resource.x, sprite.resource.y, RESOURCE);

            let body = if sprite.highlighted {
                BODY_HIGHLIGHT
            } else {
                BODY
            };
            // Tail first so the head wins on overlap
            for cell in sprite.cells.iter().skip(1).rev() {
                self.put(cell.x, cell.y, body);
            }
            if let Some(head) = sprite.cells.first() {
                self.put(head.x, head.y, head_glyph(sprite.heading));
            }
        }
    }

    /// Buffer as lines joined with newlines
    pub fn to_text(&self) -> String {
        self.buffer
            .chunks(self.width.max(1))
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn put(&mut self, x: i32, y: i32, glyph: char) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        self.buffer[y as usize * self.width + x as usize] = glyph;
    }
}

fn head_glyph(heading: Heading) -> char {
    match heading {
        Heading::Up => '^',
        Heading::Right => '>',
        Heading::Down => 'v',
        Heading::Left => '<',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serpentine_core::Cell;

    fn sprite(cells: Vec<Cell>, heading: Heading, highlighted: bool) -> AgentSprite {
        AgentSprite {
            slot: 0,
            cells,
            heading,
            resource: Cell::new(3, 0),
            body_color: [0; 4],
            resource_color: [0; 4],
            layer: u8::from(highlighted),
            highlighted,
        }
    }

    #[test]
    fn test_render_single_agent() {
        let mut renderer = TextRenderer::new(4, 2);
        let cells = vec![Cell::new(2, 1), Cell::new(1, 1), Cell::new(0, 1)];
        renderer.render(&[sprite(cells, Heading::Right, true)]);

        assert_eq!(renderer.to_text(), "...*\nOO>.");
    }

    #[test]
    fn test_out_of_bounds_cells_are_skipped() {
        let mut renderer = TextRenderer::new(3, 3);
        let cells = vec![Cell::new(0, -1), Cell::new(0, 0), Cell::new(0, 1)];
        renderer.render(&[sprite(cells, Heading::Up, false)]);

        assert_eq!(renderer.to_text(), "o..\no..\n...");
    }

    #[test]
    fn test_render_clears_previous_frame() {
        let mut renderer = TextRenderer::new(4, 1);
        renderer.render(&[sprite(vec![Cell::new(0, 0)], Heading::Left, false)]);
        renderer.render(&[]);

        assert_eq!(renderer.to_text(), "....");
    }
}
