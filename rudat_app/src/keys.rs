use std::io::{self, Read};

use crossterm::{
	event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
	terminal,
};
use tracing::warn;

/// Blocking single keystroke input
pub trait KeySource {
	fn read_key(&mut self) -> io::Result<char>;
}

/// Holds a terminal mode, `disable` runs on drop
struct ModeGuard<D: FnMut() -> io::Result<()>> {
	disable: D,
}

impl<D: FnMut() -> io::Result<()>> ModeGuard<D> {
	fn enter(enable: impl FnOnce() -> io::Result<()>, disable: D) -> io::Result<Self> {
		enable()?;
		Ok(Self { disable })
	}
}

impl<D: FnMut() -> io::Result<()>> Drop for ModeGuard<D> {
	fn drop(&mut self) {
		if let Err(err) = (self.disable)() {
			warn!(?err, "Failed to restore terminal mode");
		}
	}
}

type RawMode = ModeGuard<fn() -> io::Result<()>>;

fn raw_mode() -> io::Result<RawMode> {
	ModeGuard::enter(terminal::enable_raw_mode, terminal::disable_raw_mode as fn() -> io::Result<()>)
}

/// Reads one byte from `input` while the guard from `enter` is held
fn read_byte_in<G>(enter: impl FnOnce() -> io::Result<G>, input: &mut impl Read) -> io::Result<char> {
	let _mode = enter()?;

	let mut byte = [0u8; 1];
	input.read_exact(&mut byte)?;

	Ok(char::from(byte[0]))
}

/// Reads one byte from stdin with the terminal in raw mode
#[derive(Debug, Default)]
pub struct RawTerminal;

impl KeySource for RawTerminal {
	fn read_key(&mut self) -> io::Result<char> {
		read_byte_in(raw_mode, &mut io::stdin().lock())
	}
}

/// Waits for a character key press on the console event queue
#[derive(Debug, Default)]
pub struct ConsoleKeys;

impl KeySource for ConsoleKeys {
	fn read_key(&mut self) -> io::Result<char> {
		let _mode = raw_mode()?;

		loop {
			if let Event::Key(KeyEvent { code: KeyCode::Char(ch), kind: KeyEventKind::Press, .. }) = event::read()? {
				return Ok(ch);
			}
		}
	}
}

/// Key source for the current platform
pub fn platform() -> Box<dyn KeySource> {
	if cfg!(unix) { Box::new(RawTerminal) } else { Box::new(ConsoleKeys) }
}
