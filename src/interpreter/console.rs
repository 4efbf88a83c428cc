// ©2024 Otmar Klenk
use std::io::{self, Read};

use crossterm::event::{read, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

// restores the terminal on every exit path
struct RawGuard;

impl RawGuard {
    fn new() -> Result<Self, String> {
        enable_raw_mode().map_err(|e| e.to_string())?;
        Ok(RawGuard)
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// One key in raw (non-canonical, no-echo) mode, as a character code.
pub(crate) fn getch() -> Result<i64, String> {
    let _guard = RawGuard::new()?;
    loop {
        match read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press  => {
                match key.code {
                    KeyCode::Char(c)    => return Ok(c as i64),
                    KeyCode::Enter      => return Ok('\n' as i64),
                    KeyCode::Tab        => return Ok('\t' as i64),
                    KeyCode::Backspace  => return Ok(127),
                    KeyCode::Esc        => return Ok(27),
                    _                   => {}
                }
            }
            Ok(_)                                                   => {}
            Err(e)                                                  => return Err(e.to_string()),
        }
    }
}

/// Single byte from standard input; None at end of input.
pub(crate) fn read_char() -> Option<char> {
    let mut buf = [0u8; 1];
    match io::stdin().lock().read(&mut buf) {
        Ok(1)   => Some(buf[0] as char),
        _       => None,
    }
}
