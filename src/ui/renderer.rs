/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Screen layout:
///   row 0            status bar
///   rows 1..h-2      editor (gutter + buffer text + overlays + caret)
///   row h-2          information message
///   row h-1          help

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::decorator::{OverlayStyle, Phase, Rgb};
use crate::domain::geometry::Position;
use crate::sim::commands::{Session, IDENTIFIER};
use crate::sim::game::STEP_COUNT;
use crate::sim::host::TextEditor;
use crate::ui::editor::{BufferView, Viewport};
use crate::ui::workbench::Workbench;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

/// Explicit dark background for all "empty" terminal cells.
///
/// Using the SAME explicit RGB for `Clear(ClearType::All)` and every cell's
/// background keeps VTE inter-row gap pixels from showing as lines.
const BASE: Rgb = Rgb::new(22, 22, 35);

impl Cell {
    const BASE_BG: Color = rgb(BASE);

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
    }

    fn ch(&self) -> char {
        self.as_str().chars().next().unwrap_or(' ')
    }
}

const fn rgb(c: Rgb) -> Color {
    Color::Rgb { r: c.r, g: c.g, b: c.b }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }

    /// Paint a whole row with `bg`, then write `s` from the left edge.
    fn put_bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }
}

// ── Overlay and caret styling ──

const STATUS_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const ACTIVE_BG: Color = Color::Rgb { r: 120, g: 40, b: 90 };
const MESSAGE_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const GUTTER_FG: Color = Color::Rgb { r: 90, g: 90, b: 120 };
const TEXT: Rgb = Rgb::new(210, 210, 220);
const CARET: Rgb = Rgb::new(235, 235, 235);

/// Terminal cell for an overlay over a buffer cell.
///
/// Entry: the cell fills with the gradient's midpoint as it fades in, and
/// the glyph stays readable on top.
/// Exit: a frame glyph in the gradient's colors that widens with the scale
/// and fades back into the background.
fn overlay_cell(style: &OverlayStyle) -> Cell {
    match style.phase {
        Phase::Entry => {
            let bg = BASE.lerp(style.gradient.midpoint(), style.opacity);
            let fg = BASE.lerp(TEXT, 0.5 + style.opacity * 0.5);
            Cell::from_char(style.glyph, rgb(fg), rgb(bg))
        }
        Phase::Exit => {
            let glyph = if style.scale < 1.33 {
                '▣'
            } else if style.scale < 1.66 {
                '□'
            } else {
                '·'
            };
            let ring = style.gradient.top.lerp(style.gradient.bottom, style.scale - 1.0);
            let fg = BASE.lerp(ring, style.opacity);
            Cell::from_char(glyph, rgb(fg), Cell::BASE_BG)
        }
    }
}

/// Inverse video over whatever is already in the cell.
fn caret_cell(under: Cell) -> Cell {
    Cell::from_char(under.ch(), under.bg, rgb(CARET))
}

fn digits(mut n: usize) -> usize {
    let mut d = 1;
    while n >= 10 {
        n /= 10;
        d += 1;
    }
    d
}

// ── Renderer ──

/// Rows not available to the editor: status + message + help.
const RESERVED_ROWS: usize = 3;
const STATUS_ROW: usize = 0;
const EDITOR_ROW: usize = 1;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    help: String,
}

impl Renderer {
    pub fn new(help: String) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            help,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(
        &mut self,
        editor: &mut BufferView,
        wb: &Workbench,
        session: &Session,
        pad_connected: bool,
    ) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.compose(editor, wb, session, pad_connected);

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // Do NOT use ResetColor here: it resets to the terminal's native
        // default, which may differ from BASE_BG and cause line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, editor: &mut BufferView, wb: &Workbench, session: &Session, pad_connected: bool) {
        self.front.clear();
        let (w, h) = (self.front.width, self.front.height);
        if w == 0 || h == 0 {
            return;
        }

        // Size the viewport from the terminal and scroll it to the caret.
        let gutter = digits(editor.line_count()) + 2;
        editor.viewport.height = h.saturating_sub(RESERVED_ROWS);
        editor.viewport.width = w.saturating_sub(gutter);
        let caret = editor.caret();
        editor.viewport.follow(caret);

        self.compose_status(editor, session, pad_connected);
        self.compose_editor(editor, gutter);

        // ── Message bar ──
        let msg_row = EDITOR_ROW + editor.viewport.height;
        if msg_row < h {
            if let Some(msg) = wb.message() {
                self.front.put_bar(msg_row, &format!(" ◈ {} ", msg), Color::Black, MESSAGE_BG);
            }
        }

        // ── Help bar ──
        let help_row = msg_row + 1;
        if help_row < h {
            self.front.put_str(0, help_row, &self.help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_status(&mut self, editor: &BufferView, session: &Session, pad_connected: bool) {
        let caret = editor.caret();
        let (state, bg) = if session.is_activated() {
            ("ACTIVE", ACTIVE_BG)
        } else {
            ("idle", STATUS_BG)
        };
        // Most useful first: a narrow terminal clips from the right.
        let mut status = format!(
            " {}  {:<6} {:>2}/{}  {}:{}",
            editor.name(),
            state,
            session.game().remaining(),
            STEP_COUNT,
            caret.line + 1,
            caret.column + 1,
        );
        if pad_connected {
            status.push_str("  [pad]");
        }
        status.push_str("  ");
        status.push_str(IDENTIFIER);
        self.front.put_bar(STATUS_ROW, &status, Color::White, bg);
    }

    fn compose_editor(&mut self, editor: &BufferView, gutter: usize) {
        let vp = editor.viewport.clone();

        for vy in 0..vp.height {
            let line = vp.top + vy;
            let row = EDITOR_ROW + vy;

            let number = if line < editor.line_count() {
                format!("{:>width$} ", line + 1, width = gutter - 1)
            } else {
                format!("{:>width$} ", "~", width = gutter - 1)
            };
            self.front.put_str(0, row, &number, GUTTER_FG, Color::Reset);

            if let Some(text) = editor.line(line) {
                for (vx, &ch) in text.iter().skip(vp.left).take(vp.width).enumerate() {
                    self.front.set(gutter + vx, row, Cell::from_char(ch, rgb(TEXT), Color::Reset));
                }
            }
        }

        // Overlays: oldest first, so the newest write wins a shared cell.
        for (_, overlay) in editor.overlays() {
            if let Some((x, y)) = screen_cell(&vp, gutter, overlay.position) {
                self.front.set(x, y, overlay_cell(&overlay.style));
            }
        }

        if let Some((x, y)) = screen_cell(&vp, gutter, editor.caret()) {
            let under = self.front.get(x, y);
            self.front.set(x, y, caret_cell(under));
        }
    }
}

/// Buffer position → terminal (x, y), if it is inside the viewport.
fn screen_cell(vp: &Viewport, gutter: usize, at: Position) -> Option<(usize, usize)> {
    if !vp.contains(at) {
        return None;
    }
    Some((
        gutter + at.column as usize - vp.left,
        EDITOR_ROW + at.line as usize - vp.top,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decorator::{DecorationSurface, Gradient};
    use crate::domain::ease::Ease;
    use crate::sim::game::{Game, DEFAULT_READY_EPSILON};

    const RED_BLUE: Gradient = Gradient {
        top: Rgb::new(255, 0, 0),
        bottom: Rgb::new(0, 0, 255),
    };

    fn renderer(w: usize, h: usize) -> Renderer {
        let mut r = Renderer::new(" help".to_string());
        r.front.resize(w, h);
        r
    }

    fn row_text(fb: &FrameBuffer, y: usize) -> String {
        (0..fb.width).map(|x| fb.get(x, y).ch()).collect()
    }

    #[test]
    fn entry_overlay_fills_background_by_opacity() {
        let hidden = overlay_cell(&OverlayStyle::at_progress('a', RED_BLUE, 0.0));
        assert_eq!(hidden.bg, Cell::BASE_BG);
        assert_eq!(hidden.ch(), 'a');

        let full = overlay_cell(&OverlayStyle::at_progress('a', RED_BLUE, 1.0));
        assert_eq!(full.bg, rgb(RED_BLUE.midpoint()));
    }

    #[test]
    fn exit_overlay_widens_and_fades() {
        let start = overlay_cell(&OverlayStyle::at_progress('a', RED_BLUE, 1.1));
        assert_eq!(start.ch(), '▣');
        let mid = overlay_cell(&OverlayStyle::at_progress('a', RED_BLUE, 1.5));
        assert_eq!(mid.ch(), '□');
        let gone = overlay_cell(&OverlayStyle::at_progress('a', RED_BLUE, 2.0));
        assert_eq!(gone.fg, Cell::BASE_BG);
        assert_eq!(gone.bg, Cell::BASE_BG);
    }

    #[test]
    fn compose_lays_out_gutter_text_and_bars() {
        let mut r = renderer(30, 8);
        let mut ed = BufferView::from_text("demo.rs", "fn main() {}\n");
        let mut wb = Workbench::new();
        crate::sim::host::Window::show_information_message(&mut wb, "hi");
        let session = Session::new(Game::new(DEFAULT_READY_EPSILON, Ease::Linear));

        r.compose(&mut ed, &wb, &session, false);

        assert_eq!(ed.viewport.height, 5);
        assert!(row_text(&r.front, 0).starts_with(" demo.rs  idle    0/10  1:1"));
        assert!(row_text(&r.front, 1).starts_with(" 1 fn main"));
        assert!(row_text(&r.front, 2).starts_with(" ~ "));
        assert!(row_text(&r.front, 6).contains("hi"));
        assert!(row_text(&r.front, 7).starts_with(" help"));
    }

    #[test]
    fn status_bar_keeps_file_and_caret_on_a_narrow_terminal() {
        let mut r = renderer(28, 6);
        let mut ed = BufferView::from_text("demo.rs", "abc\n");
        ed.set_caret(Position::new(0, 2));
        let session = Session::new(Game::new(DEFAULT_READY_EPSILON, Ease::Linear));

        r.compose(&mut ed, &Workbench::new(), &session, true);
        let status = row_text(&r.front, 0);
        assert!(status.contains("demo.rs"));
        assert!(status.contains("1:3"));

        let mut wide = renderer(60, 6);
        wide.compose(&mut ed, &Workbench::new(), &session, true);
        let status = row_text(&wide.front, 0);
        assert!(status.contains("1:3  [pad]  beat-code"));
    }

    #[test]
    fn caret_and_overlay_land_on_their_cells() {
        let mut r = renderer(30, 8);
        let mut ed = BufferView::from_text("t", "abc\n");
        ed.set_caret(Position::new(0, 2));
        ed.install(Position::new(0, 0), OverlayStyle::at_progress('a', RED_BLUE, 1.0));
        let session = Session::new(Game::new(DEFAULT_READY_EPSILON, Ease::Linear));

        r.compose(&mut ed, &Workbench::new(), &session, false);

        // gutter is "1 " plus one pad column
        let gutter = digits(1) + 2;
        assert_eq!(r.front.get(gutter, 1).bg, rgb(RED_BLUE.midpoint()));
        let caret = r.front.get(gutter + 2, 1);
        assert_eq!(caret.ch(), 'c');
        assert_eq!(caret.bg, rgb(CARET));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let mut r = renderer(2, 1);
        let mut ed = BufferView::from_text("t", "abc\n");
        let session = Session::new(Game::new(DEFAULT_READY_EPSILON, Ease::Linear));
        r.compose(&mut ed, &Workbench::new(), &session, true);
        assert_eq!(ed.viewport.height, 0);
    }

    #[test]
    fn digits_counts_decimal_places() {
        assert_eq!(digits(0), 1);
        assert_eq!(digits(9), 1);
        assert_eq!(digits(10), 2);
        assert_eq!(digits(1234), 4);
    }
}
