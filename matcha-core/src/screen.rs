//! Terminal screen - the state machine the escape parser drives
//!
//! Ties together the two grids, cursor, modes, charsets, tab stops,
//! scrolling region, and selection. All coordinates are 0-indexed here;
//! 1-indexed CSI arguments are converted by the caller.

use log::debug;

use crate::cell::char_width;
use crate::charset::CharsetTable;
use crate::cursor::{Cursor, SavedCursor};
use crate::grid::Grid;
use crate::line::Line;
use crate::modes::Modes;
use crate::palette::Palette;
use crate::selection::{Point, Selection, SelectionMode, SelectionSnap, SelectionType};
use crate::Dimensions;

/// Default tab stop interval, matching `it#8` in terminfo
const TAB_INTERVAL: usize = 8;

/// The complete terminal screen state
#[derive(Debug, Clone)]
pub struct Screen {
    /// Primary screen grid
    primary: Grid,
    /// Alternate screen grid (full-screen applications)
    alt: Grid,
    /// Cursor (one active, shared by both screens)
    cursor: Cursor,
    /// Saved cursor for the primary screen
    saved_primary: SavedCursor,
    /// Saved cursor for the alternate screen
    saved_alt: SavedCursor,
    /// Mode register
    modes: Modes,
    /// G0-G3 charset designations
    charsets: CharsetTable,
    /// Runtime palette overrides (OSC 4/104)
    palette: Palette,
    /// Scrolling region, inclusive; `top <= bot < rows`
    top: usize,
    bot: usize,
    /// Tab stop per column, shared between screens
    tabs: Vec<bool>,
    /// Selection state
    selection: Selection,
    /// Characters that delimit words for snap-to-word
    word_delimiters: String,
    /// Whether the alternate screen may be entered
    allow_alt_screen: bool,
}

impl Screen {
    pub fn new(dims: Dimensions) -> Self {
        let mut screen = Self {
            primary: Grid::new(dims),
            alt: Grid::new(dims),
            cursor: Cursor::new(),
            saved_primary: SavedCursor::default(),
            saved_alt: SavedCursor::default(),
            modes: Modes::new(),
            charsets: CharsetTable::new(),
            palette: Palette::new(),
            top: 0,
            bot: dims.rows.saturating_sub(1),
            tabs: Vec::new(),
            selection: Selection::new(),
            word_delimiters: " ".to_string(),
            allow_alt_screen: true,
        };
        screen.reset_tabs();
        screen
    }

    // --- accessors ---------------------------------------------------------

    pub fn cols(&self) -> usize {
        self.primary.cols()
    }

    pub fn rows(&self) -> usize {
        self.primary.rows()
    }

    pub fn grid(&self) -> &Grid {
        if self.modes.alt_screen {
            &self.alt
        } else {
            &self.primary
        }
    }

    fn grid_mut(&mut self) -> &mut Grid {
        if self.modes.alt_screen {
            &mut self.alt
        } else {
            &mut self.primary
        }
    }

    pub fn line(&self, row: usize) -> &Line {
        self.grid().line(row)
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    pub fn modes(&self) -> &Modes {
        &self.modes
    }

    pub fn modes_mut(&mut self) -> &mut Modes {
        &mut self.modes
    }

    pub fn charsets_mut(&mut self) -> &mut CharsetTable {
        &mut self.charsets
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Scrolling region bounds, inclusive
    pub fn scroll_region(&self) -> (usize, usize) {
        (self.top, self.bot)
    }

    pub fn set_word_delimiters(&mut self, delimiters: &str) {
        self.word_delimiters = delimiters.to_string();
    }

    pub fn set_allow_alt_screen(&mut self, allow: bool) {
        self.allow_alt_screen = allow;
    }

    /// Visible length of a row (full width when the row wraps)
    pub fn line_len(&self, y: usize) -> usize {
        self.grid().line(y).len()
    }

    // --- dirty tracking ----------------------------------------------------

    /// Rows of the active grid mutated since the last call
    pub fn take_dirty(&mut self) -> Vec<usize> {
        self.grid_mut().take_dirty()
    }

    pub fn is_dirty(&self, row: usize) -> bool {
        self.grid().is_dirty(row)
    }

    /// Mark every row of the active grid for repaint
    pub fn full_dirt(&mut self) {
        self.grid_mut().mark_all_dirty();
    }

    // --- cursor motion -----------------------------------------------------

    /// Move to (x, y), clamped to the screen; with origin mode set, y is
    /// further confined to the scrolling region. Clears the pending wrap.
    pub fn move_to(&mut self, x: usize, y: usize) {
        let (min_y, max_y) = if self.cursor.origin_mode {
            (self.top, self.bot)
        } else {
            (0, self.rows() - 1)
        };
        self.cursor.col = x.min(self.cols() - 1);
        self.cursor.row = y.clamp(min_y, max_y);
        self.cursor.pending_wrap = false;
    }

    /// Absolute move for user addressing: origin mode offsets y by the
    /// region top.
    pub fn move_to_origin(&mut self, x: usize, y: usize) {
        let offset = if self.cursor.origin_mode { self.top } else { 0 };
        self.move_to(x, y + offset);
    }

    /// Line feed: scroll when on the region bottom, else move down.
    pub fn newline(&mut self, first_col: bool) {
        let y = if self.cursor.row == self.bot {
            self.scroll_up(self.top, 1);
            self.cursor.row
        } else {
            self.cursor.row + 1
        };
        let x = if first_col { 0 } else { self.cursor.col };
        self.move_to(x, y);
    }

    /// IND: move down, scrolling at the region bottom
    pub fn index(&mut self) {
        if self.cursor.row == self.bot {
            self.scroll_up(self.top, 1);
        } else {
            self.move_to(self.cursor.col, self.cursor.row + 1);
        }
    }

    /// RI: move up, scrolling at the region top
    pub fn reverse_index(&mut self) {
        if self.cursor.row == self.top {
            self.scroll_down(self.top, 1);
        } else {
            self.move_to(self.cursor.col, self.cursor.row - 1);
        }
    }

    // --- tab stops ---------------------------------------------------------

    /// Advance to the n-th next tab stop (or previous when negative)
    pub fn put_tab(&mut self, n: i32) {
        let cols = self.cols();
        let mut x = self.cursor.col;
        if n > 0 {
            let mut n = n;
            while x < cols && n > 0 {
                x += 1;
                while x < cols && !self.tabs[x] {
                    x += 1;
                }
                n -= 1;
            }
        } else if n < 0 {
            let mut n = n;
            while x > 0 && n < 0 {
                x -= 1;
                while x > 0 && !self.tabs[x] {
                    x -= 1;
                }
                n += 1;
            }
        }
        self.cursor.col = x.min(cols - 1);
    }

    pub fn set_tab_stop(&mut self) {
        let col = self.cursor.col;
        if col < self.tabs.len() {
            self.tabs[col] = true;
        }
    }

    pub fn clear_tab_stop(&mut self) {
        let col = self.cursor.col;
        if col < self.tabs.len() {
            self.tabs[col] = false;
        }
    }

    pub fn clear_all_tab_stops(&mut self) {
        for tab in &mut self.tabs {
            *tab = false;
        }
    }

    fn reset_tabs(&mut self) {
        self.tabs = vec![false; self.cols()];
        let mut i = TAB_INTERVAL;
        while i < self.cols() {
            self.tabs[i] = true;
            i += TAB_INTERVAL;
        }
    }

    // --- writing -----------------------------------------------------------

    /// Write one printable character at the cursor, honoring wrap, insert
    /// mode, and double-width handling.
    pub fn print(&mut self, c: char) {
        // Writing over a row the raw selection spans drops the selection.
        if self.selection.is_active() {
            let (lo, hi) = (
                self.selection.ob.y.min(self.selection.oe.y),
                self.selection.ob.y.max(self.selection.oe.y),
            );
            if (lo..=hi).contains(&self.cursor.row) {
                self.selection_clear();
            }
        }

        if self.modes.wrap && self.cursor.pending_wrap {
            let row = self.cursor.row;
            self.grid_mut().line_mut(row).wrapped = true;
            self.grid_mut().mark_dirty(row);
            self.newline(true);
        }

        let width = char_width(c) as usize;
        let cols = self.cols();

        if self.modes.insert && self.cursor.col + width < cols {
            let (x, y, attrs) = (self.cursor.col, self.cursor.row, self.cursor.attrs);
            self.grid_mut().line_mut(y).insert_blanks(x, width, attrs);
            self.grid_mut().mark_dirty(y);
        }

        // A wide character that no longer fits starts a fresh row.
        if self.cursor.col + width > cols {
            self.newline(true);
        }

        self.set_char(c, self.cursor.col, self.cursor.row);

        if width == 2 {
            let (x, y) = (self.cursor.col, self.cursor.row);
            if x + 1 < cols {
                let attrs = self.cursor.attrs;
                let cont = self.grid_mut().line_mut(y).cell_mut(x + 1);
                cont.attrs = attrs;
                cont.set_continuation();
            }
        }

        if self.cursor.col + width < cols {
            self.move_to(self.cursor.col + width, self.cursor.row);
        } else {
            self.cursor.pending_wrap = true;
        }
    }

    /// Place a character at (x, y) with the cursor's attribute template,
    /// translating through the active charset and splitting any wide pair
    /// the write lands on.
    pub fn set_char(&mut self, c: char, x: usize, y: usize) {
        let c = self.charsets.translate(c);
        let attrs = self.cursor.attrs;
        let cols = self.cols();
        let grid = self.grid_mut();

        if grid.line(y).cell(x).is_wide() {
            if x + 1 < cols {
                grid.line_mut(y).cell_mut(x + 1).set_char(' ');
            }
        } else if grid.line(y).cell(x).is_continuation() && x > 0 {
            grid.line_mut(y).cell_mut(x - 1).set_char(' ');
        }

        let cell = grid.line_mut(y).cell_mut(x);
        cell.set_char(c);
        cell.attrs = attrs;
        grid.mark_dirty(y);
    }

    /// DECALN: fill the screen with 'E'
    pub fn alignment_test(&mut self) {
        for y in 0..self.rows() {
            for x in 0..self.cols() {
                self.set_char('E', x, y);
            }
        }
    }

    // --- region operations -------------------------------------------------

    /// Clear a rectangular region with the cursor's colors; a cleared
    /// selected cell drops the whole selection.
    pub fn clear_region(&mut self, x1: usize, y1: usize, x2: usize, y2: usize) {
        let (x1, x2) = (x1.min(x2), x1.max(x2));
        let (y1, y2) = (y1.min(y2), y1.max(y2));
        let x2 = x2.min(self.cols() - 1);
        let y2 = y2.min(self.rows() - 1);

        if self.selection.mode == SelectionMode::Ready {
            'scan: for y in y1..=y2 {
                for x in x1..=x2 {
                    if self.selection.contains(x, y) {
                        self.selection_clear();
                        break 'scan;
                    }
                }
            }
        }

        let attrs = self.cursor.attrs;
        self.grid_mut().clear_region(x1, y1, x2, y2, attrs);
    }

    /// ICH: insert n blanks at the cursor, shifting the tail right
    pub fn insert_blanks(&mut self, n: usize) {
        let (x, y, attrs) = (self.cursor.col, self.cursor.row, self.cursor.attrs);
        let n = n.min(self.cols() - x);
        self.grid_mut().line_mut(y).insert_blanks(x, n, attrs);
        self.grid_mut().mark_dirty(y);
    }

    /// DCH: delete n characters at the cursor, shifting the tail left
    pub fn delete_chars(&mut self, n: usize) {
        let (x, y, attrs) = (self.cursor.col, self.cursor.row, self.cursor.attrs);
        let n = n.min(self.cols() - x);
        self.grid_mut().line_mut(y).delete_cells(x, n, attrs);
        self.grid_mut().mark_dirty(y);
    }

    /// IL: insert n blank lines at the cursor when inside the region
    pub fn insert_lines(&mut self, n: usize) {
        if (self.top..=self.bot).contains(&self.cursor.row) {
            self.scroll_down(self.cursor.row, n);
        }
    }

    /// DL: delete n lines at the cursor when inside the region
    pub fn delete_lines(&mut self, n: usize) {
        if (self.top..=self.bot).contains(&self.cursor.row) {
            self.scroll_up(self.cursor.row, n);
        }
    }

    /// Scroll `[orig, bot]` up by n, revealing blank rows at the bottom
    pub fn scroll_up(&mut self, orig: usize, n: usize) {
        let (bot, attrs) = (self.bot, self.cursor.attrs);
        self.grid_mut().scroll_up(orig, bot, n, attrs);
        self.selection_scroll(orig, -(n as isize));
    }

    /// Scroll `[orig, bot]` down by n, revealing blank rows at the top
    pub fn scroll_down(&mut self, orig: usize, n: usize) {
        let (bot, attrs) = (self.bot, self.cursor.attrs);
        self.grid_mut().scroll_down(orig, bot, n, attrs);
        self.selection_scroll(orig, n as isize);
    }

    /// DECSTBM: set the scrolling region from 0-indexed bounds
    pub fn set_scroll_region(&mut self, top: usize, bot: usize) {
        let last = self.rows() - 1;
        let top = top.min(last);
        let bot = bot.min(last);
        self.top = top.min(bot);
        self.bot = top.max(bot);
    }

    // --- saved cursor ------------------------------------------------------

    pub fn save_cursor(&mut self) {
        let saved = SavedCursor::save(&self.cursor);
        if self.modes.alt_screen {
            self.saved_alt = saved;
        } else {
            self.saved_primary = saved;
        }
    }

    pub fn restore_cursor(&mut self) {
        let saved = if self.modes.alt_screen {
            self.saved_alt
        } else {
            self.saved_primary
        };
        saved.restore(&mut self.cursor);
        self.move_to(saved.col, saved.row);
    }

    // --- mode dispatch -----------------------------------------------------

    /// Set or reset a DEC private mode (`CSI ? n h/l`).
    /// Returns false for modes this terminal does not track.
    pub fn set_private_mode(&mut self, mode: i32, set: bool) -> bool {
        match mode {
            1 => self.modes.app_cursor = set,
            5 => {
                if self.modes.reverse != set {
                    self.modes.reverse = set;
                    self.full_dirt();
                }
            }
            6 => {
                self.cursor.origin_mode = set;
                self.move_to_origin(0, 0);
            }
            7 => self.modes.wrap = set,
            25 => self.modes.hide = !set,
            9 => {
                self.modes.clear_mouse();
                self.modes.mouse_x10 = set;
            }
            1000 => {
                self.modes.clear_mouse();
                self.modes.mouse_button = set;
            }
            1002 => {
                self.modes.clear_mouse();
                self.modes.mouse_motion = set;
            }
            1003 => {
                self.modes.clear_mouse();
                self.modes.mouse_many = set;
            }
            1004 => self.modes.focus = set,
            1006 => self.modes.mouse_sgr = set,
            1034 => self.modes.eight_bit = set,
            2004 => self.modes.bracketed_paste = set,
            47 => self.switch_screen(set, set),
            1047 => self.switch_screen(set, false),
            1048 => {
                if set {
                    self.save_cursor();
                } else {
                    self.restore_cursor();
                }
            }
            1049 => {
                if set {
                    self.save_cursor();
                    self.switch_screen(true, true);
                } else {
                    self.switch_screen(false, false);
                    self.restore_cursor();
                }
            }
            // Ignored: VT52, 132-column, smooth scroll, auto repeat,
            // printer feed/extent, national charsets, blink.
            0 | 2 | 3 | 4 | 8 | 12 | 18 | 19 | 42 => {}
            // Not implemented by design: highlight/utf8/urxvt mouse.
            1001 | 1005 | 1015 => {}
            _ => return false,
        }
        true
    }

    /// Set or reset an ANSI mode (`CSI n h/l`).
    /// Returns false for unknown modes.
    pub fn set_ansi_mode(&mut self, mode: i32, set: bool) -> bool {
        match mode {
            0 => {}
            2 => self.modes.kbd_lock = set,
            4 => self.modes.insert = set,
            12 => self.modes.echo = !set,
            20 => self.modes.crlf = set,
            _ => return false,
        }
        true
    }

    /// Swap between primary and alternate screen. `clear` wipes the
    /// alternate grid after entering it (modes 47 and 1049).
    fn switch_screen(&mut self, to_alt: bool, clear: bool) {
        if !self.allow_alt_screen {
            return;
        }
        if self.modes.alt_screen != to_alt {
            self.modes.alt_screen = to_alt;
            self.selection_clear();
            self.primary.mark_all_dirty();
            self.alt.mark_all_dirty();
        }
        if to_alt && clear {
            let attrs = self.cursor.attrs;
            self.alt
                .clear_region(0, 0, self.cols() - 1, self.rows() - 1, attrs);
        }
    }

    // --- lifecycle ---------------------------------------------------------

    /// RIS: reset the terminal to its initial state
    pub fn reset(&mut self) {
        self.cursor = Cursor::new();
        self.modes.reset();
        self.charsets.reset();
        self.palette.reset_all();
        self.top = 0;
        self.bot = self.rows() - 1;
        self.reset_tabs();
        self.saved_primary = SavedCursor::default();
        self.saved_alt = SavedCursor::default();
        self.selection_clear();

        let attrs = self.cursor.attrs;
        let (cols, rows) = (self.cols(), self.rows());
        self.primary.clear_region(0, 0, cols - 1, rows - 1, attrs);
        self.alt.clear_region(0, 0, cols - 1, rows - 1, attrs);
        self.modes.alt_screen = false;
    }

    /// Resize both screens, keeping the cursor on screen and extending tab
    /// stops at the interval the first existing stop suggests.
    pub fn resize(&mut self, dims: Dimensions) {
        if dims.cols == 0 || dims.rows == 0 {
            debug!("ignoring resize to {}x{}", dims.cols, dims.rows);
            return;
        }

        // Slide rows up so the cursor stays visible when shrinking.
        let slide = (self.cursor.row + 1).saturating_sub(dims.rows);
        if slide > 0 {
            self.grid_mut().rotate_up(slide);
            self.cursor.row -= slide;
        }

        let old_cols = self.cols();
        self.primary.resize(dims);
        self.alt.resize(dims);

        self.tabs.resize(dims.cols, false);
        if dims.cols > old_cols {
            // Estimate the interval from the first stop (the application
            // may have moved them), then continue past the last one.
            let interval = self
                .tabs
                .iter()
                .skip(1)
                .position(|&t| t)
                .map(|i| i + 1)
                .unwrap_or(TAB_INTERVAL);
            let last = self.tabs.iter().rposition(|&t| t).unwrap_or(0);
            let mut i = last + interval;
            while i < dims.cols {
                self.tabs[i] = true;
                i += interval;
            }
        }

        self.top = 0;
        self.bot = dims.rows - 1;
        self.move_to(self.cursor.col, self.cursor.row);

        self.saved_primary.col = self.saved_primary.col.min(dims.cols - 1);
        self.saved_primary.row = self.saved_primary.row.min(dims.rows - 1);
        self.saved_alt.col = self.saved_alt.col.min(dims.cols - 1);
        self.saved_alt.row = self.saved_alt.row.min(dims.rows - 1);

        self.selection_clear();
    }

    // --- selection ---------------------------------------------------------

    /// Anchor a selection at (x, y)
    pub fn selection_start(&mut self, x: usize, y: usize, snap: SelectionSnap, ty: SelectionType) {
        let x = x.min(self.cols() - 1);
        let y = y.min(self.rows() - 1);
        self.selection.mode = SelectionMode::Empty;
        self.selection.ty = ty;
        self.selection.snap = snap;
        self.selection.ob = Point::new(x, y);
        self.selection.oe = Point::new(x, y);
        self.selection_normalize();
        if snap != SelectionSnap::None {
            self.selection.mode = SelectionMode::Ready;
        }
        self.mark_selection_dirty();
    }

    /// Extend the selection to (x, y)
    pub fn selection_extend(&mut self, x: usize, y: usize) {
        if !self.selection.is_active() {
            return;
        }
        let x = x.min(self.cols() - 1);
        let y = y.min(self.rows() - 1);
        self.selection.oe = Point::new(x, y);
        self.selection_normalize();
        self.selection.mode = SelectionMode::Ready;
        self.mark_selection_dirty();
    }

    pub fn selection_clear(&mut self) {
        if !self.selection.is_active() {
            return;
        }
        self.mark_selection_dirty();
        self.selection.clear();
    }

    pub fn selected(&self, x: usize, y: usize) -> bool {
        self.selection.contains(x, y)
    }

    fn mark_selection_dirty(&mut self) {
        let (nb, ne) = (self.selection.nb.y, self.selection.ne.y);
        self.grid_mut().mark_dirty_range(nb, ne);
    }

    /// Sort the raw anchors into the normalized span, apply snapping, and
    /// clamp stream selections to line content.
    pub fn selection_normalize(&mut self) {
        let sel = &mut self.selection;
        if sel.ty == SelectionType::Regular && sel.ob.y != sel.oe.y {
            if sel.ob.y < sel.oe.y {
                sel.nb.x = sel.ob.x;
                sel.ne.x = sel.oe.x;
            } else {
                sel.nb.x = sel.oe.x;
                sel.ne.x = sel.ob.x;
            }
        } else {
            sel.nb.x = sel.ob.x.min(sel.oe.x);
            sel.ne.x = sel.ob.x.max(sel.oe.x);
        }
        sel.nb.y = sel.ob.y.min(sel.oe.y);
        sel.ne.y = sel.ob.y.max(sel.oe.y);

        let (mut nbx, mut nby) = (self.selection.nb.x, self.selection.nb.y);
        self.selection_snap(&mut nbx, &mut nby, -1);
        let (mut nex, mut ney) = (self.selection.ne.x, self.selection.ne.y);
        self.selection_snap(&mut nex, &mut ney, 1);
        self.selection.nb = Point::new(nbx, nby);
        self.selection.ne = Point::new(nex, ney);

        if self.selection.ty == SelectionType::Rectangular {
            return;
        }

        // Clamp to content and extend over soft line breaks.
        let len = self.line_len(self.selection.nb.y);
        if len < self.selection.nb.x {
            self.selection.nb.x = len;
        }
        if self.line_len(self.selection.ne.y) <= self.selection.ne.x {
            self.selection.ne.x = self.cols() - 1;
        }
    }

    fn is_delimiter(&self, c: char) -> bool {
        self.word_delimiters.contains(c)
    }

    /// Expand one end of the span per the snap mode. `direction` is -1 for
    /// the start anchor and +1 for the end anchor.
    fn selection_snap(&mut self, x: &mut usize, y: &mut usize, direction: isize) {
        match self.selection.snap {
            SelectionSnap::Word => {
                let cols = self.cols();
                let rows = self.rows();
                // A scrolled anchor may sit one past the last column.
                *x = (*x).min(cols - 1);
                *y = (*y).min(rows - 1);
                let mut prev = *self.grid().line(*y).cell(*x);
                let mut prev_delim = self.is_delimiter(prev.content());
                loop {
                    let mut newx = *x as isize + direction;
                    let mut newy = *y as isize;
                    if !(0..cols as isize).contains(&newx) {
                        // Crossing a row edge: only follow a soft wrap.
                        newy += direction;
                        newx = (newx + cols as isize) % cols as isize;
                        if !(0..rows as isize).contains(&newy) {
                            break;
                        }
                        let boundary_row = if direction > 0 { *y } else { newy as usize };
                        if !self.grid().line(boundary_row).wrapped {
                            break;
                        }
                    }

                    let (newx, newy) = (newx as usize, newy as usize);
                    if newx >= self.line_len(newy) {
                        break;
                    }

                    let cell = *self.grid().line(newy).cell(newx);
                    let delim = self.is_delimiter(cell.content());
                    if !cell.is_continuation()
                        && (delim != prev_delim || (delim && cell.content() != prev.content()))
                    {
                        break;
                    }

                    *x = newx;
                    *y = newy;
                    prev = cell;
                    prev_delim = delim;
                }
            }
            SelectionSnap::Line => {
                *x = if direction < 0 { 0 } else { self.cols() - 1 };
                if direction < 0 {
                    while *y > 0 && self.grid().line(*y - 1).wrapped {
                        *y -= 1;
                    }
                } else {
                    while *y < self.rows() - 1 && self.grid().line(*y).wrapped {
                        *y += 1;
                    }
                }
            }
            SelectionSnap::None => {}
        }
    }

    /// Translate the selection with scrolled content; drop it when it
    /// leaves the scrolling region.
    pub fn selection_scroll(&mut self, orig: usize, n: isize) {
        if !self.selection.is_active() {
            return;
        }

        let in_region = |y: usize| (orig..=self.bot).contains(&y);
        if !in_region(self.selection.ob.y) && !in_region(self.selection.oe.y) {
            return;
        }

        let ob_y = self.selection.ob.y as isize + n;
        let oe_y = self.selection.oe.y as isize + n;
        if ob_y > self.bot as isize || oe_y < self.top as isize {
            self.selection_clear();
            return;
        }

        let (top, bot, cols) = (self.top as isize, self.bot as isize, self.cols());
        let sel = &mut self.selection;
        match sel.ty {
            SelectionType::Rectangular => {
                sel.ob.y = ob_y.clamp(top, bot) as usize;
                sel.oe.y = oe_y.clamp(top, bot) as usize;
            }
            SelectionType::Regular => {
                if ob_y < top {
                    sel.ob.y = top as usize;
                    sel.ob.x = 0;
                } else {
                    sel.ob.y = ob_y as usize;
                }
                if oe_y > bot {
                    sel.oe.y = bot as usize;
                    sel.oe.x = cols;
                } else {
                    sel.oe.y = oe_y as usize;
                }
            }
        }
        self.selection_normalize();
    }

    /// Extract the selected text, one `\n` per hard line break
    pub fn selection_text(&self) -> Option<String> {
        if self.selection.mode != SelectionMode::Ready {
            return None;
        }

        let sel = &self.selection;
        let cols = self.cols();
        let mut out = String::new();

        for y in sel.nb.y..=sel.ne.y {
            let line = self.grid().line(y);
            let linelen = line.len();
            if linelen == 0 {
                out.push('\n');
                continue;
            }

            let (start, lastx) = if sel.ty == SelectionType::Rectangular {
                (sel.nb.x, sel.ne.x)
            } else {
                (
                    if sel.nb.y == y { sel.nb.x } else { 0 },
                    if sel.ne.y == y { sel.ne.x } else { cols - 1 },
                )
            };

            // Trim trailing blanks inside the span.
            let mut last = lastx.min(linelen - 1) as isize;
            while last >= start as isize && line.cell(last as usize).is_blank() {
                last -= 1;
            }

            if last >= start as isize {
                for x in start..=last as usize {
                    let cell = line.cell(x);
                    if cell.is_continuation() {
                        continue;
                    }
                    out.push(cell.content());
                }
            }

            // A row that ends before the span continues, without a soft
            // wrap, contributes a hard newline.
            let wrapped_here = line.wrapped && last == cols as isize - 1;
            if (y < sel.ne.y || lastx >= linelen) && !wrapped_here {
                out.push('\n');
            }
        }

        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(cols: usize, rows: usize) -> Screen {
        Screen::new(Dimensions::new(cols, rows))
    }

    fn type_str(s: &mut Screen, text: &str) {
        for c in text.chars() {
            s.print(c);
        }
    }

    #[test]
    fn test_print_advances_cursor() {
        let mut s = screen(80, 24);
        type_str(&mut s, "Hi");
        assert_eq!(s.cursor().col, 2);
        assert_eq!(s.line(0).cell(0).content(), 'H');
        assert_eq!(s.line(0).cell(1).content(), 'i');
    }

    #[test]
    fn test_wrap_sets_line_flag() {
        let mut s = screen(5, 3);
        type_str(&mut s, "abcdef");
        assert!(s.line(0).wrapped);
        assert_eq!(s.line(1).cell(0).content(), 'f');
        assert_eq!(s.cursor().row, 1);
        assert_eq!(s.cursor().col, 1);
    }

    #[test]
    fn test_no_wrap_when_mode_off() {
        let mut s = screen(5, 3);
        s.modes_mut().wrap = false;
        type_str(&mut s, "abcdefg");
        // Everything past the margin overwrites the last column.
        assert_eq!(s.cursor().row, 0);
        assert_eq!(s.line(0).cell(4).content(), 'g');
    }

    #[test]
    fn test_wide_char_pairs() {
        let mut s = screen(10, 3);
        type_str(&mut s, "中");
        assert!(s.line(0).cell(0).is_wide());
        assert!(s.line(0).cell(1).is_continuation());
        assert_eq!(s.cursor().col, 2);
    }

    #[test]
    fn test_overwrite_wide_left_half_clears_pair() {
        let mut s = screen(10, 3);
        type_str(&mut s, "中");
        s.move_to(0, 0);
        s.print('x');
        assert_eq!(s.line(0).cell(0).content(), 'x');
        assert!(!s.line(0).cell(1).is_continuation());
    }

    #[test]
    fn test_overwrite_continuation_clears_wide() {
        let mut s = screen(10, 3);
        type_str(&mut s, "中");
        s.move_to(1, 0);
        s.print('x');
        assert!(!s.line(0).cell(0).is_wide());
        assert_eq!(s.line(0).cell(0).content(), ' ');
        assert_eq!(s.line(0).cell(1).content(), 'x');
    }

    #[test]
    fn test_wide_char_at_margin_wraps_whole_glyph() {
        let mut s = screen(5, 3);
        type_str(&mut s, "abcd中");
        assert_eq!(s.line(1).cell(0).content(), '中');
        assert!(s.line(1).cell(1).is_continuation());
    }

    #[test]
    fn test_insert_mode_shifts_tail() {
        let mut s = screen(10, 3);
        type_str(&mut s, "abc");
        s.move_to(0, 0);
        s.modes_mut().insert = true;
        s.print('X');
        assert_eq!(s.line(0).text(), "Xabc");
    }

    #[test]
    fn test_newline_scrolls_at_region_bottom() {
        let mut s = screen(10, 5);
        type_str(&mut s, "A");
        s.move_to(0, 4);
        s.newline(true);
        assert!(s.line(0).is_empty());
        assert_eq!(s.cursor().row, 4);
    }

    #[test]
    fn test_scroll_region_confines_newline() {
        let mut s = screen(10, 5);
        for (row, c) in "ABCDE".chars().enumerate() {
            s.move_to(0, row);
            s.print(c);
        }
        s.set_scroll_region(1, 3);
        s.move_to(0, 3);
        s.newline(true);
        assert_eq!(s.line(0).cell(0).content(), 'A');
        assert_eq!(s.line(1).cell(0).content(), 'C');
        assert_eq!(s.line(2).cell(0).content(), 'D');
        assert!(s.line(3).cell(0).is_blank());
        assert_eq!(s.line(4).cell(0).content(), 'E');
    }

    #[test]
    fn test_origin_mode_confines_cursor() {
        let mut s = screen(10, 10);
        s.set_scroll_region(2, 6);
        s.set_private_mode(6, true);
        assert_eq!(s.cursor().row, 2);
        s.move_to_origin(0, 0);
        assert_eq!(s.cursor().row, 2);
        s.move_to_origin(0, 99);
        assert_eq!(s.cursor().row, 6);
    }

    #[test]
    fn test_tab_stops() {
        let mut s = screen(40, 3);
        s.put_tab(1);
        assert_eq!(s.cursor().col, 8);
        s.put_tab(2);
        assert_eq!(s.cursor().col, 24);
        s.put_tab(-1);
        assert_eq!(s.cursor().col, 16);

        s.clear_all_tab_stops();
        s.move_to(0, 0);
        s.put_tab(1);
        assert_eq!(s.cursor().col, 39);
    }

    #[test]
    fn test_custom_tab_stop() {
        let mut s = screen(40, 3);
        s.clear_all_tab_stops();
        s.move_to(5, 0);
        s.set_tab_stop();
        s.move_to(0, 0);
        s.put_tab(1);
        assert_eq!(s.cursor().col, 5);
    }

    #[test]
    fn test_alt_screen_round_trip() {
        let mut s = screen(10, 3);
        type_str(&mut s, "A");
        s.set_private_mode(1049, true);
        assert!(s.modes().alt_screen);
        assert!(s.line(0).cell(0).is_blank());
        type_str(&mut s, "B");
        s.set_private_mode(1049, false);
        assert!(!s.modes().alt_screen);
        assert_eq!(s.line(0).cell(0).content(), 'A');
        assert_eq!(s.cursor().col, 1);
    }

    #[test]
    fn test_alt_screen_disallowed() {
        let mut s = screen(10, 3);
        s.set_allow_alt_screen(false);
        s.set_private_mode(1049, true);
        assert!(!s.modes().alt_screen);
    }

    #[test]
    fn test_save_restore_per_screen() {
        let mut s = screen(10, 3);
        s.move_to(4, 2);
        s.save_cursor();
        s.move_to(0, 0);
        s.restore_cursor();
        assert_eq!((s.cursor().col, s.cursor().row), (4, 2));
    }

    #[test]
    fn test_insert_delete_lines() {
        let mut s = screen(10, 5);
        for (row, c) in "ABCDE".chars().enumerate() {
            s.move_to(0, row);
            s.print(c);
        }
        s.move_to(0, 1);
        s.insert_lines(2);
        assert_eq!(s.line(0).cell(0).content(), 'A');
        assert!(s.line(1).cell(0).is_blank());
        assert!(s.line(2).cell(0).is_blank());
        assert_eq!(s.line(3).cell(0).content(), 'B');
        assert_eq!(s.line(4).cell(0).content(), 'C');

        s.move_to(0, 1);
        s.delete_lines(2);
        assert_eq!(s.line(1).cell(0).content(), 'B');
        assert_eq!(s.line(2).cell(0).content(), 'C');
    }

    #[test]
    fn test_reverse_mode_marks_all_dirty() {
        let mut s = screen(10, 3);
        s.take_dirty();
        s.set_private_mode(5, true);
        assert_eq!(s.take_dirty().len(), 3);
        // No change, no redraw.
        s.set_private_mode(5, true);
        assert!(s.take_dirty().is_empty());
    }

    #[test]
    fn test_resize_keeps_cursor_on_screen() {
        let mut s = screen(10, 10);
        for row in 0..10 {
            s.move_to(0, row);
            s.print((b'0' + row as u8) as char);
        }
        s.move_to(0, 9);
        s.resize(Dimensions::new(10, 5));
        assert_eq!(s.cursor().row, 4);
        // Content slid up with the cursor.
        assert_eq!(s.line(4).cell(0).content(), '9');
        assert_eq!(s.line(0).cell(0).content(), '5');
    }

    #[test]
    fn test_resize_extends_tabs() {
        let mut s = screen(16, 3);
        s.resize(Dimensions::new(40, 3));
        s.move_to(0, 0);
        s.put_tab(3);
        assert_eq!(s.cursor().col, 24);
    }

    #[test]
    fn test_reset() {
        let mut s = screen(10, 3);
        type_str(&mut s, "junk");
        s.set_scroll_region(1, 2);
        s.modes_mut().insert = true;
        s.reset();
        assert_eq!(s.scroll_region(), (0, 2));
        assert!(!s.modes().insert);
        assert!(s.line(0).is_empty());
        assert_eq!(s.cursor().col, 0);
    }

    #[test]
    fn test_alignment_test_fills() {
        let mut s = screen(4, 2);
        s.alignment_test();
        for y in 0..2 {
            for x in 0..4 {
                assert_eq!(s.line(y).cell(x).content(), 'E');
            }
        }
    }

    #[test]
    fn test_selection_word_snap() {
        let mut s = screen(20, 5);
        type_str(&mut s, "foo bar baz");
        s.selection_start(5, 0, SelectionSnap::Word, SelectionType::Regular);
        s.selection_extend(5, 0);
        assert_eq!(s.selection_text().as_deref(), Some("bar"));
    }

    #[test]
    fn test_selection_line_snap_follows_wrap() {
        let mut s = screen(5, 5);
        type_str(&mut s, "abcdefg");
        s.selection_start(0, 0, SelectionSnap::Line, SelectionType::Regular);
        assert_eq!(s.selection_text().as_deref(), Some("abcdefg\n"));
    }

    #[test]
    fn test_selection_multi_row_text() {
        let mut s = screen(10, 5);
        type_str(&mut s, "one");
        s.move_to(0, 1);
        type_str(&mut s, "two");
        s.selection_start(0, 0, SelectionSnap::None, SelectionType::Regular);
        s.selection_extend(2, 1);
        assert_eq!(s.selection_text().as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn test_selection_rectangular_text() {
        let mut s = screen(10, 5);
        type_str(&mut s, "abcdef");
        s.move_to(0, 1);
        type_str(&mut s, "ghijkl");
        s.selection_start(1, 0, SelectionSnap::None, SelectionType::Rectangular);
        s.selection_extend(3, 1);
        assert_eq!(s.selection_text().as_deref(), Some("bcd\nhij"));
    }

    #[test]
    fn test_selection_cleared_by_overwrite() {
        let mut s = screen(10, 5);
        type_str(&mut s, "hello");
        s.selection_start(0, 0, SelectionSnap::None, SelectionType::Regular);
        s.selection_extend(4, 0);
        assert!(s.selection().is_active());
        s.move_to(0, 0);
        s.print('x');
        assert!(!s.selection().is_active());
    }

    #[test]
    fn test_selection_cleared_by_clear_region() {
        let mut s = screen(10, 5);
        type_str(&mut s, "hello");
        s.selection_start(0, 0, SelectionSnap::None, SelectionType::Regular);
        s.selection_extend(4, 0);
        s.clear_region(0, 0, 9, 0);
        assert_eq!(s.selection().mode, SelectionMode::Idle);
    }

    #[test]
    fn test_selection_scrolls_with_content() {
        let mut s = screen(10, 5);
        s.move_to(0, 2);
        type_str(&mut s, "mark");
        s.selection_start(0, 2, SelectionSnap::None, SelectionType::Regular);
        s.selection_extend(3, 2);
        s.scroll_up(0, 1);
        assert_eq!(s.selection_text().as_deref(), Some("mark"));
        assert_eq!(s.selection().nb.y, 1);
    }

    #[test]
    fn test_selection_dropped_when_scrolled_out() {
        let mut s = screen(10, 5);
        type_str(&mut s, "top");
        s.selection_start(0, 0, SelectionSnap::None, SelectionType::Regular);
        s.selection_extend(2, 0);
        s.scroll_up(0, 2);
        assert!(!s.selection().is_active());
    }

    #[test]
    fn test_selection_empty_mode_selects_nothing() {
        let mut s = screen(10, 5);
        type_str(&mut s, "abc");
        s.selection_start(0, 0, SelectionSnap::None, SelectionType::Regular);
        assert!(!s.selected(0, 0));
        s.selection_extend(2, 0);
        assert!(s.selected(0, 0));
    }

    #[test]
    fn test_wdummy_invariant_after_writes() {
        let mut s = screen(6, 3);
        type_str(&mut s, "a中b中");
        for y in 0..3 {
            for x in 0..6 {
                if s.line(y).cell(x).is_continuation() {
                    assert!(x > 0 && s.line(y).cell(x - 1).is_wide());
                }
                if s.line(y).cell(x).is_wide() {
                    assert!(x < 5);
                }
            }
        }
    }
}
