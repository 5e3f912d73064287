/// BufferView: a read-only text buffer with a caret and cell overlays.
///
/// This is the terminal stand-in for an editor tab. The caret lives in
/// virtual space: any cell with line >= 0 and column >= 0 is reachable,
/// including past the end of a line or of the file.
///
/// ## Viewport
///
/// Buffer coordinates and screen coordinates are separate:
///   - `viewport`: top-left visible cell plus the visible size
///   - Renderer maps: `screen(row, col) = buffer(top + row, left + col)`
///   - The viewport follows the caret with a scroll margin

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::decorator::{DecorationSurface, OverlayId, OverlayStyle};
use crate::domain::geometry::{Direction, Position};
use crate::error::Error;
use crate::sim::host::TextEditor;

const SAMPLE: &str = include_str!("sample.txt");

/// Lines kept visible between the caret and the viewport edge.
const SCROLL_MARGIN: usize = 3;

#[derive(Clone, Debug)]
pub struct Overlay {
    pub position: Position,
    pub style: OverlayStyle,
}

#[derive(Clone, Debug, Default)]
pub struct Viewport {
    /// First visible buffer line
    pub top: usize,
    /// First visible buffer column
    pub left: usize,
    /// Number of visible lines
    pub height: usize,
    /// Number of visible columns
    pub width: usize,
}

impl Viewport {
    /// Scroll so that `caret` is visible, keeping `SCROLL_MARGIN` cells of
    /// context where the viewport is big enough.
    pub fn follow(&mut self, caret: Position) {
        if self.height == 0 || self.width == 0 {
            return;
        }
        let line = caret.line.max(0) as usize;
        let col = caret.column.max(0) as usize;

        let vmargin = SCROLL_MARGIN.min(self.height.saturating_sub(1) / 2);
        if line < self.top + vmargin {
            self.top = line.saturating_sub(vmargin);
        } else if line + vmargin >= self.top + self.height {
            self.top = line + vmargin + 1 - self.height;
        }

        let hmargin = SCROLL_MARGIN.min(self.width.saturating_sub(1) / 2);
        if col < self.left + hmargin {
            self.left = col.saturating_sub(hmargin);
        } else if col + hmargin >= self.left + self.width {
            self.left = col + hmargin + 1 - self.width;
        }
    }

    pub fn contains(&self, at: Position) -> bool {
        if !at.in_buffer_space() {
            return false;
        }
        let (l, c) = (at.line as usize, at.column as usize);
        l >= self.top && l < self.top + self.height && c >= self.left && c < self.left + self.width
    }
}

pub struct BufferView {
    name: String,
    lines: Vec<Vec<char>>,
    caret: Position,
    overlays: BTreeMap<OverlayId, Overlay>,
    next_overlay: OverlayId,
    pub viewport: Viewport,
}

impl BufferView {
    pub fn from_text(name: &str, text: &str) -> Self {
        let mut lines: Vec<Vec<char>> = text
            .lines()
            .map(|l| l.chars().map(|c| if c == '\t' { ' ' } else { c }).collect())
            .collect();
        if lines.is_empty() {
            lines.push(Vec::new());
        }
        BufferView {
            name: name.to_string(),
            lines,
            caret: Position::default(),
            overlays: BTreeMap::new(),
            next_overlay: 0,
            viewport: Viewport::default(),
        }
    }

    pub fn open(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_text(&name, &text))
    }

    /// Built-in scratch buffer used when no file is given.
    pub fn sample() -> Self {
        Self::from_text("[sample]", SAMPLE)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&[char]> {
        self.lines.get(index).map(Vec::as_slice)
    }

    #[cfg(test)]
    pub fn set_caret(&mut self, at: Position) {
        self.caret = Position::new(at.line.max(0), at.column.max(0));
    }

    /// Live overlays, oldest first.
    pub fn overlays(&self) -> impl Iterator<Item = (&OverlayId, &Overlay)> {
        self.overlays.iter()
    }

    #[cfg(test)]
    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }
}

impl DecorationSurface for BufferView {
    fn install(&mut self, at: Position, style: OverlayStyle) -> OverlayId {
        self.next_overlay += 1;
        self.overlays.insert(self.next_overlay, Overlay { position: at, style });
        self.next_overlay
    }

    fn remove(&mut self, id: OverlayId) {
        self.overlays.remove(&id);
    }
}

impl TextEditor for BufferView {
    fn caret(&self) -> Position {
        self.caret
    }

    fn glyph_at(&self, at: Position) -> char {
        if !at.in_buffer_space() {
            return ' ';
        }
        self.lines
            .get(at.line as usize)
            .and_then(|l| l.get(at.column as usize))
            .copied()
            .unwrap_or(' ')
    }

    fn move_caret(&mut self, d: Direction) {
        let next = self.caret.translate(d);
        if next.in_buffer_space() {
            self.caret = next;
        }
    }
}
