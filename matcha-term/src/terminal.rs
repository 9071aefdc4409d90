//! Terminal state management
//!
//! Applies parsed actions to the screen model, queues device replies,
//! and surfaces side effects (title, bell, clipboard) to the display
//! layer through take-style accessors.

use std::io::Write;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::{debug, trace, warn};

use matcha_core::{Color, CursorStyle, Dimensions, Screen, SelectionSnap, SelectionType};
use matcha_parser::{Action, CsiAction, EscAction, OscAction, Params, Parser};

use crate::config::Config;
use crate::input::{self, Modifiers, MouseButton};

/// DA and DECID identification reply: "I am a VT102"
const VT_IDENTITY: &[u8] = b"\x1b[?6c";

/// Terminal emulator state
pub struct Terminal {
    screen: Screen,
    parser: Parser,
    /// Replies queued for the PTY (DA, DSR)
    pending_responses: Vec<u8>,
    /// Reusable action buffer for the per-byte parse loop
    action_queue: Vec<Action>,
    /// Window title and its change flag
    title: String,
    title_changed: bool,
    /// Bell pending
    bell: bool,
    /// Clipboard payload set by OSC 52
    clipboard: Option<String>,
    /// Continuous pointer-motion reporting engaged (mode 1003)
    pointer_motion: bool,
    /// Printer sink for MODE_PRINT and media-copy dumps
    printer: Option<Box<dyn Write + Send>>,
}

impl Terminal {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            screen: Screen::new(Dimensions::new(cols, rows)),
            parser: Parser::new(),
            pending_responses: Vec::new(),
            action_queue: Vec::new(),
            title: String::new(),
            title_changed: false,
            bell: false,
            clipboard: None,
            pointer_motion: false,
            printer: None,
        }
    }

    pub fn with_config(config: &Config) -> Self {
        let mut term = Self::new(config.cols, config.rows);
        term.screen.set_allow_alt_screen(config.allow_alt_screen);
        term.screen.set_word_delimiters(&config.word_delimiters);
        term
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn take_title_changed(&mut self) -> bool {
        std::mem::take(&mut self.title_changed)
    }

    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }

    /// Clipboard text set by the application (OSC 52), if any
    pub fn take_clipboard(&mut self) -> Option<String> {
        self.clipboard.take()
    }

    pub fn pointer_motion(&self) -> bool {
        self.pointer_motion
    }

    /// Attach a printer sink; MODE_PRINT and media copy write into it
    pub fn set_printer(&mut self, printer: Box<dyn Write + Send>) {
        self.printer = Some(printer);
    }

    // --- byte pipeline -----------------------------------------------------

    /// Feed bytes from the PTY through the parser into the screen
    pub fn process(&mut self, data: &[u8]) {
        let mut queue = std::mem::take(&mut self.action_queue);
        for &byte in data {
            if self.screen.modes().print {
                self.print_bytes(&[byte]);
            }
            queue.clear();
            self.parser
                .parse(std::slice::from_ref(&byte), |action| queue.push(action));
            for action in queue.drain(..) {
                self.handle_action(action);
            }
        }
        self.action_queue = queue;
    }

    /// Queued reply bytes to write back to the PTY
    pub fn take_responses(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pending_responses)
    }

    pub fn has_responses(&self) -> bool {
        !self.pending_responses.is_empty()
    }

    fn respond(&mut self, bytes: &[u8]) {
        self.pending_responses.extend_from_slice(bytes);
    }

    /// Resize the screen; the caller separately pushes the new size to the
    /// PTY so the child sees SIGWINCH.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.screen.resize(Dimensions::new(cols, rows));
    }

    // --- action dispatch ---------------------------------------------------

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Print(c) => self.screen.print(c),
            Action::Control(byte) => self.handle_control(byte),
            Action::Esc(esc) => self.handle_esc(esc),
            Action::Csi(csi) => self.handle_csi(csi),
            Action::Osc(osc) => self.handle_osc(osc),
            Action::Title(title) => self.set_title(title),
            Action::DcsHook { params, final_byte } => {
                if final_byte == b'q' && params.is_empty() {
                    self.screen.modes_mut().sixel = true;
                } else {
                    trace!("dcs {} ignored", final_byte as char);
                }
            }
            Action::DcsUnhook => self.screen.modes_mut().sixel = false,
            Action::Apc(_) | Action::Pm(_) => {}
        }
    }

    fn handle_control(&mut self, byte: u8) {
        let cursor = *self.screen.cursor();
        match byte {
            0x07 => self.bell = true,
            0x08 => self.screen.move_to(cursor.col.saturating_sub(1), cursor.row),
            0x09 => self.screen.put_tab(1),
            0x0A..=0x0C => {
                let crlf = self.screen.modes().crlf;
                self.screen.newline(crlf);
            }
            0x0D => self.screen.move_to(0, cursor.row),
            0x0E => self.screen.charsets_mut().set_active(1),
            0x0F => self.screen.charsets_mut().set_active(0),
            0x1A => self.screen.set_char('?', cursor.col, cursor.row),
            0x85 => self.screen.newline(true),
            0x88 => self.screen.set_tab_stop(),
            0x9A => self.respond(VT_IDENTITY),
            _ => trace!("unhandled control 0x{:02x}", byte),
        }
    }

    fn handle_esc(&mut self, esc: EscAction) {
        match esc {
            EscAction::SaveCursor => self.screen.save_cursor(),
            EscAction::RestoreCursor => self.screen.restore_cursor(),
            EscAction::Index => self.screen.index(),
            EscAction::NextLine => self.screen.newline(true),
            EscAction::ReverseIndex => self.screen.reverse_index(),
            EscAction::TabSet => self.screen.set_tab_stop(),
            EscAction::IdentifyTerminal => self.respond(VT_IDENTITY),
            EscAction::FullReset => {
                self.screen.reset();
                self.parser.reset();
                self.title.clear();
                self.title_changed = true;
            }
            EscAction::AppKeypad(on) => self.screen.modes_mut().app_keypad = on,
            EscAction::DesignateCharset { slot, designator } => {
                if !self.screen.charsets_mut().designate(slot, designator) {
                    debug!("unhandled charset designator: ESC ( {}", designator);
                }
            }
            EscAction::LockingShift(slot) => self.screen.charsets_mut().set_active(slot),
            EscAction::Utf8Charset(on) => self.screen.modes_mut().utf8 = on,
            EscAction::AlignmentTest => self.screen.alignment_test(),
            EscAction::Unknown(data) => {
                debug!("unknown sequence ESC {}", String::from_utf8_lossy(&data));
            }
        }
    }

    fn handle_csi(&mut self, csi: CsiAction) {
        if csi.marker != 0 && !csi.private {
            debug!("unknown csi {:?}", String::from_utf8_lossy(&csi.to_bytes()));
            return;
        }
        if !csi.intermediates.is_empty() {
            self.handle_csi_intermediate(&csi);
            return;
        }

        let cursor = *self.screen.cursor();
        let (cols, rows) = (self.screen.cols(), self.screen.rows());
        let p = &csi.params;

        match csi.final_byte {
            // ICH: insert blanks
            b'@' => self.screen.insert_blanks(p.count(0)),
            // CUU
            b'A' => self
                .screen
                .move_to(cursor.col, cursor.row.saturating_sub(p.count(0))),
            // CUD / VPR
            b'B' | b'e' => self.screen.move_to(cursor.col, cursor.row + p.count(0)),
            // CUF / HPR
            b'C' | b'a' => self.screen.move_to(cursor.col + p.count(0), cursor.row),
            // CUB
            b'D' => self
                .screen
                .move_to(cursor.col.saturating_sub(p.count(0)), cursor.row),
            // CNL
            b'E' => self.screen.move_to(0, cursor.row + p.count(0)),
            // CPL
            b'F' => self
                .screen
                .move_to(0, cursor.row.saturating_sub(p.count(0))),
            // CHA / HPA
            b'G' | b'`' => self.screen.move_to(p.count(0) - 1, cursor.row),
            // CUP / HVP
            b'H' | b'f' => self.screen.move_to_origin(p.count(1) - 1, p.count(0) - 1),
            // CHT
            b'I' => self.screen.put_tab(p.count(0) as i32),
            // ED
            b'J' => {
                self.screen.selection_clear();
                match p.raw(0) {
                    0 => {
                        self.screen
                            .clear_region(cursor.col, cursor.row, cols - 1, cursor.row);
                        if cursor.row < rows - 1 {
                            self.screen
                                .clear_region(0, cursor.row + 1, cols - 1, rows - 1);
                        }
                    }
                    1 => {
                        if cursor.row > 0 {
                            self.screen.clear_region(0, 0, cols - 1, cursor.row - 1);
                        }
                        self.screen.clear_region(0, cursor.row, cursor.col, cursor.row);
                    }
                    2 => self.screen.clear_region(0, 0, cols - 1, rows - 1),
                    _ => self.unknown_csi(&csi),
                }
            }
            // EL
            b'K' => match p.raw(0) {
                0 => self
                    .screen
                    .clear_region(cursor.col, cursor.row, cols - 1, cursor.row),
                1 => self.screen.clear_region(0, cursor.row, cursor.col, cursor.row),
                2 => self.screen.clear_region(0, cursor.row, cols - 1, cursor.row),
                _ => self.unknown_csi(&csi),
            },
            // IL
            b'L' => self.screen.insert_lines(p.count(0)),
            // DL
            b'M' => self.screen.delete_lines(p.count(0)),
            // DCH
            b'P' => self.screen.delete_chars(p.count(0)),
            // SU
            b'S' => {
                let top = self.screen.scroll_region().0;
                self.screen.scroll_up(top, p.count(0));
            }
            // SD
            b'T' => {
                let top = self.screen.scroll_region().0;
                self.screen.scroll_down(top, p.count(0));
            }
            // ECH: clear without shifting
            b'X' => self.screen.clear_region(
                cursor.col,
                cursor.row,
                cursor.col + p.count(0) - 1,
                cursor.row,
            ),
            // CBT
            b'Z' => self.screen.put_tab(-(p.count(0) as i32)),
            // DA
            b'c' => {
                if p.raw(0) == 0 {
                    self.respond(VT_IDENTITY);
                }
            }
            // VPA
            b'd' => self.screen.move_to_origin(cursor.col, p.count(0) - 1),
            // TBC
            b'g' => match p.raw(0) {
                0 => self.screen.clear_tab_stop(),
                3 => self.screen.clear_all_tab_stops(),
                _ => self.unknown_csi(&csi),
            },
            // SM / RM
            b'h' => self.set_modes(&csi, true),
            b'l' => self.set_modes(&csi, false),
            // MC
            b'i' => match p.raw(0) {
                0 => self.dump_screen(),
                1 => self.dump_line(cursor.row),
                2 => {
                    if let Some(text) = self.screen.selection_text() {
                        self.print_bytes(text.as_bytes());
                    }
                }
                4 => self.screen.modes_mut().print = false,
                5 => self.screen.modes_mut().print = true,
                _ => self.unknown_csi(&csi),
            },
            // SGR
            b'm' => self.handle_sgr(p.clone()),
            // DSR
            b'n' => {
                if p.raw(0) == 6 {
                    let reply = format!("\x1b[{};{}R", cursor.row + 1, cursor.col + 1);
                    self.respond(reply.as_bytes());
                }
            }
            // DECSTBM
            b'r' => {
                if csi.private {
                    self.unknown_csi(&csi);
                } else {
                    let top = p.count(0) - 1;
                    let bot = p.arg(1, rows as i32).max(1) as usize - 1;
                    self.screen.set_scroll_region(top, bot);
                    self.screen.move_to_origin(0, 0);
                }
            }
            // DECSC / DECRC
            b's' => self.screen.save_cursor(),
            b'u' => self.screen.restore_cursor(),
            _ => self.unknown_csi(&csi),
        }
    }

    fn handle_csi_intermediate(&mut self, csi: &CsiAction) {
        match (csi.intermediates.as_slice(), csi.final_byte) {
            ([b' '], b'q') => {
                // DECSCUSR
                match CursorStyle::from_decscusr(csi.params.arg(0, 1).max(0) as u16) {
                    Some(style) => self.screen.cursor_mut().style = style,
                    None => self.unknown_csi(csi),
                }
            }
            _ => self.unknown_csi(csi),
        }
    }

    fn unknown_csi(&mut self, csi: &CsiAction) {
        debug!("unknown csi {:?}", String::from_utf8_lossy(&csi.to_bytes()));
    }

    fn set_modes(&mut self, csi: &CsiAction, set: bool) {
        for arg in csi.params.iter() {
            let known = if csi.private {
                match arg {
                    // Pointer motion engagement follows the mouse modes.
                    9 | 1000 | 1002 => self.pointer_motion = false,
                    1003 => self.pointer_motion = set,
                    _ => {}
                }
                self.screen.set_private_mode(arg, set)
            } else {
                self.screen.set_ansi_mode(arg, set)
            };
            if !known {
                debug!(
                    "unknown {}set/reset mode {}",
                    if csi.private { "private " } else { "" },
                    arg
                );
            }
        }
    }

    // --- SGR ---------------------------------------------------------------

    fn handle_sgr(&mut self, params: Params) {
        let p = p_or_reset(&params);
        let attrs = &mut self.screen.cursor_mut().attrs;

        let mut i = 0;
        while i < p.len() {
            match p[i] {
                0 => attrs.reset(),
                1 => attrs.bold = true,
                2 => attrs.faint = true,
                3 => attrs.italic = true,
                4 => attrs.underline = true,
                5 | 6 => attrs.blink = true,
                7 => attrs.inverse = true,
                8 => attrs.hidden = true,
                9 => attrs.strikethrough = true,
                22 => {
                    attrs.bold = false;
                    attrs.faint = false;
                }
                23 => attrs.italic = false,
                24 => attrs.underline = false,
                25 => attrs.blink = false,
                27 => attrs.inverse = false,
                28 => attrs.hidden = false,
                29 => attrs.strikethrough = false,
                38 => {
                    if let Some(color) = sgr_color(&p, &mut i) {
                        attrs.fg = color;
                    }
                }
                39 => attrs.fg = Color::Default,
                48 => {
                    if let Some(color) = sgr_color(&p, &mut i) {
                        attrs.bg = color;
                    }
                }
                49 => attrs.bg = Color::Default,
                v @ 30..=37 => attrs.fg = Color::Indexed((v - 30) as u8),
                v @ 40..=47 => attrs.bg = Color::Indexed((v - 40) as u8),
                v @ 90..=97 => attrs.fg = Color::Indexed((v - 90 + 8) as u8),
                v @ 100..=107 => attrs.bg = Color::Indexed((v - 100 + 8) as u8),
                v => warn!("unknown sgr attribute {}", v),
            }
            i += 1;
        }
    }

    // --- OSC ---------------------------------------------------------------

    fn handle_osc(&mut self, osc: OscAction) {
        match osc {
            OscAction::SetTitle(title) => self.set_title(title),
            OscAction::SetColor { index, spec } => {
                if !(0..=255).contains(&index)
                    || !self.screen.palette_mut().set(index as usize, &spec)
                {
                    warn!("invalid color {} for palette index {}", spec, index);
                } else {
                    self.screen.full_dirt();
                }
            }
            OscAction::ResetColor(index) => match index {
                None => {
                    self.screen.palette_mut().reset_all();
                    self.screen.full_dirt();
                }
                Some(i) if (0..=255).contains(&i) => {
                    self.screen.palette_mut().reset(i as usize);
                    self.screen.full_dirt();
                }
                Some(i) => warn!("invalid palette index {}", i),
            },
            OscAction::Clipboard(payload) => match BASE64.decode(payload.as_bytes()) {
                Ok(bytes) => {
                    self.clipboard = Some(String::from_utf8_lossy(&bytes).into_owned());
                }
                Err(e) => debug!("invalid osc 52 payload: {}", e),
            },
            OscAction::Unknown { command, raw } => {
                debug!("unknown osc {} {:?}", command, raw);
            }
        }
    }

    fn set_title(&mut self, title: String) {
        self.title = title;
        self.title_changed = true;
    }

    // --- printer -----------------------------------------------------------

    fn print_bytes(&mut self, bytes: &[u8]) {
        if let Some(printer) = &mut self.printer {
            if let Err(e) = printer.write_all(bytes) {
                warn!("printer write failed: {}", e);
                self.printer = None;
            }
        }
    }

    /// Write a row's visible run plus a newline to the printer
    pub fn dump_line(&mut self, y: usize) {
        let line = self.screen.line(y);
        let len = line.len();
        let mut text = String::new();
        if len > 1 || (len == 1 && line.cell(0).content() != ' ') {
            for cell in line.iter().take(len) {
                if !cell.is_continuation() {
                    text.push(cell.content());
                }
            }
        }
        text.push('\n');
        self.print_bytes(text.as_bytes());
    }

    /// Dump every row to the printer
    pub fn dump_screen(&mut self) {
        for y in 0..self.screen.rows() {
            self.dump_line(y);
        }
    }

    // --- local input -------------------------------------------------------

    /// Locally echo one sent character, substituting visible forms for
    /// controls (`^C`, `^[`); newline, carriage return and tab render as
    /// themselves.
    pub fn echo(&mut self, c: char) {
        let mut u = c as u32;
        if is_control(u) {
            if u & 0x80 != 0 {
                u &= 0x7F;
                self.screen.print('^');
                self.screen.print('[');
            } else if c != '\n' && c != '\r' && c != '\t' {
                u ^= 0x40;
                self.screen.print('^');
            }
        }
        if is_control(u) {
            self.handle_control(u as u8);
        } else if let Some(c) = char::from_u32(u) {
            self.screen.print(c);
        }
    }

    /// Encode a mouse event per the current modes
    pub fn mouse_report(
        &self,
        button: MouseButton,
        col: usize,
        row: usize,
        press: bool,
        modifiers: Modifiers,
        motion: bool,
    ) -> Option<Vec<u8>> {
        input::encode_mouse(
            button,
            col,
            row,
            press,
            modifiers,
            motion,
            self.screen.modes(),
        )
    }

    /// Focus report bytes, when focus reporting is on
    pub fn focus_report(&self, focused: bool) -> Option<&'static [u8]> {
        if self.screen.modes().focus {
            Some(input::encode_focus(focused))
        } else {
            None
        }
    }

    /// Paste text prepared for the PTY (bracketed when requested)
    pub fn paste_bytes(&self, text: &str) -> Vec<u8> {
        input::encode_paste(text, self.screen.modes().bracketed_paste)
    }

    // --- selection ---------------------------------------------------------

    pub fn start_selection(&mut self, x: usize, y: usize, snap: SelectionSnap, ty: SelectionType) {
        self.screen.selection_start(x, y, snap, ty);
    }

    pub fn extend_selection(&mut self, x: usize, y: usize) {
        self.screen.selection_extend(x, y);
    }

    /// Selected text, None without an active selection
    pub fn selection_text(&self) -> Option<String> {
        self.screen.selection_text()
    }
}

/// SGR with no parameters means reset
fn p_or_reset(params: &Params) -> Vec<i32> {
    if params.is_empty() {
        vec![0]
    } else {
        params.as_slice().to_vec()
    }
}

/// Decode an extended color (38/48): `;2;r;g;b` or `;5;index`.
/// Advances `i` past the consumed parameters; malformed specs are logged
/// and leave the index unchanged.
fn sgr_color(p: &[i32], i: &mut usize) -> Option<Color> {
    match p.get(*i + 1) {
        Some(2) => {
            if *i + 4 >= p.len() {
                warn!("incorrect number of parameters for rgb color");
                return None;
            }
            let (r, g, b) = (p[*i + 2], p[*i + 3], p[*i + 4]);
            *i += 4;
            if !(0..=255).contains(&r) || !(0..=255).contains(&g) || !(0..=255).contains(&b) {
                warn!("bad rgb color ({},{},{})", r, g, b);
                return None;
            }
            Some(Color::Rgb {
                r: r as u8,
                g: g as u8,
                b: b as u8,
            })
        }
        Some(5) => {
            if *i + 2 >= p.len() {
                warn!("incorrect number of parameters for indexed color");
                return None;
            }
            let index = p[*i + 2];
            *i += 2;
            if !(0..=255).contains(&index) {
                warn!("bad color index {}", index);
                return None;
            }
            Some(Color::Indexed(index as u8))
        }
        Some(v) => {
            warn!("unknown color kind {}", v);
            None
        }
        None => {
            warn!("missing color kind after sgr 38/48");
            None
        }
    }
}

fn is_control(u: u32) -> bool {
    u < 0x20 || u == 0x7F || (0x80..=0x9F).contains(&u)
}
