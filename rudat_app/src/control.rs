use std::io::Write;

use anyhow::{Context, Result};
use rudat::{Attenuation, Device, Link};
use tracing::debug;

use crate::keys::KeySource;

/// The only channel driven from the keyboard
pub const CHANNEL: u8 = 1;

/// Prints identity, all-channel attenuation and the key help
///
/// Identity lines are written before `*:ATT?` is sent.
pub fn startup<L: Link>(device: &mut Device<L>, step: f64, out: &mut impl Write) -> Result<()> {
	let identity = device.identify().context("device identification failed")?;

	writeln!(out, "model {}", identity.model)?;
	writeln!(out, "serial {}", identity.serial)?;
	writeln!(out, "fw {}", identity.firmware)?;
	out.flush()?;

	writeln!(out, "ATT? {}", device.attenuations()?)?;

	writeln!(out, "'+' increase attenuation by {step:.2}dB")?;
	writeln!(out, "'-' decrease attenuation by {step:.2}dB")?;
	writeln!(out, "'q' to quit")?;
	out.flush()?;

	Ok(())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Key {
	Increase,
	Decrease,
	Quit,
	Other(char),
}

impl From<char> for Key {
	fn from(ch: char) -> Self {
		match ch {
			'+' => Key::Increase,
			'-' => Key::Decrease,
			'q' => Key::Quit,
			other => Key::Other(other),
		}
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flow {
	Continue,
	Quit,
}

/// Keyboard driven attenuation control for [`CHANNEL`]
pub struct Controller<L: Link> {
	device: Device<L>,
	setting: Attenuation,
	step: f64,
}

impl<L: Link> Controller<L> {
	pub fn new(device: Device<L>, setting: Attenuation, step: f64) -> Self {
		Self { device, setting, step }
	}

	pub fn setting(&self) -> Attenuation {
		self.setting
	}

	/// Applies one key
	///
	/// Every key except quit sends the current setting and re-reads all
	/// channels, including keys that don't change the setting.
	pub fn handle(&mut self, key: Key, out: &mut impl Write) -> Result<Flow> {
		match key {
			Key::Quit => return Ok(Flow::Quit),
			Key::Increase => self.setting = self.setting.increased(self.step),
			Key::Decrease => self.setting = self.setting.decreased(self.step),
			Key::Other(_) => {}
		}

		let ack = self.device.set_attenuation(CHANNEL, self.setting)?;
		writeln!(out, "ch{CHANNEL}->{} {ack}", self.setting)?;

		let all = self.device.attenuations()?;
		writeln!(out, "ATT? {all}")?;

		Ok(Flow::Continue)
	}

	/// Reads keys until quit
	pub fn run(&mut self, keys: &mut dyn KeySource, out: &mut impl Write) -> Result<()> {
		loop {
			let key = Key::from(keys.read_key()?);
			debug!(?key, setting = %self.setting, "Key");

			if self.handle(key, out)? == Flow::Quit {
				return Ok(());
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::{collections::VecDeque, io};

	use rudat::{ATTENUATION_STEP, Endpoint, TRANSFER_SIZE, nusb::transfer::TransferError};

	use super::*;

	#[derive(Default)]
	struct FakeLink {
		commands: Vec<String>,
	}

	impl Link for FakeLink {
		fn write(&mut self, _: Endpoint, data: &[u8]) -> rudat::Result<()> {
			self.commands.push(String::from_utf8_lossy(data).into_owned());
			Ok(())
		}

		fn read(&mut self, _: Endpoint, _: usize) -> rudat::Result<Vec<u8>> {
			let mut buf = vec![0u8; TRANSFER_SIZE];
			buf[1] = b'1';
			Ok(buf)
		}
	}

	struct Script(VecDeque<char>);

	impl Script {
		fn new(keys: &str) -> Self {
			Self(keys.chars().collect())
		}
	}

	impl KeySource for Script {
		fn read_key(&mut self) -> io::Result<char> {
			self.0.pop_front().ok_or_else(|| io::ErrorKind::UnexpectedEof.into())
		}
	}

	fn controller() -> Controller<FakeLink> {
		Controller::new(Device::from_link(FakeLink::default()), Attenuation::default(), ATTENUATION_STEP)
	}

	fn commands(controller: Controller<FakeLink>) -> Vec<String> {
		controller.device.into_link().commands
	}

	struct FailingAfter {
		replies: VecDeque<&'static str>,
	}

	impl Link for FailingAfter {
		fn write(&mut self, _: Endpoint, _: &[u8]) -> rudat::Result<()> {
			Ok(())
		}

		fn read(&mut self, _: Endpoint, _: usize) -> rudat::Result<Vec<u8>> {
			let text = self.replies.pop_front().ok_or(rudat::Error::Transfer(TransferError::Stall))?;

			let mut buf = vec![0u8; TRANSFER_SIZE];
			buf[1..=text.len()].copy_from_slice(text.as_bytes());
			Ok(buf)
		}
	}

	#[test]
	fn startup_banner() {
		let link = FailingAfter { replies: ["11906250027", "RUDAT-13G-90", "A5", "90.00"].into() };
		let mut device = Device::from_link(link);
		let mut out = Vec::new();

		startup(&mut device, ATTENUATION_STEP, &mut out).unwrap();

		let text = String::from_utf8(out).unwrap();
		let lines: Vec<_> = text.lines().collect();
		assert_eq!(lines[..4], ["model RUDAT-13G-90", "serial 11906250027", "fw A5", "ATT? 90.00"]);
		assert_eq!(lines[4], "'+' increase attenuation by 0.25dB");
	}

	#[test]
	fn identity_printed_before_attenuation_query_fails() {
		let link = FailingAfter { replies: ["11906250027", "RUDAT-13G-90", "A5"].into() };
		let mut device = Device::from_link(link);
		let mut out = Vec::new();

		assert!(startup(&mut device, ATTENUATION_STEP, &mut out).is_err());
		assert_eq!(String::from_utf8(out).unwrap(), "model RUDAT-13G-90\nserial 11906250027\nfw A5\n");
	}

	#[test]
	fn key_mapping() {
		assert_eq!(Key::from('+'), Key::Increase);
		assert_eq!(Key::from('-'), Key::Decrease);
		assert_eq!(Key::from('q'), Key::Quit);
		assert_eq!(Key::from('Q'), Key::Other('Q'));
	}

	#[test]
	fn quit_without_traffic() {
		let mut ctl = controller();
		let mut out = Vec::new();

		ctl.run(&mut Script::new("q+++"), &mut out).unwrap();

		assert!(out.is_empty());
		assert!(commands(ctl).is_empty());
	}

	#[test]
	fn increase_then_query() {
		let mut ctl = controller();
		let mut out = Vec::new();

		assert_eq!(ctl.handle(Key::Increase, &mut out).unwrap(), Flow::Continue);

		assert_eq!(String::from_utf8(out).unwrap(), "ch1->90.25 1\nATT? 1\n");
		assert_eq!(commands(ctl), ["*:CHAN:1:SETATT:90.25;", "*:ATT?"]);
	}

	#[test]
	fn other_key_still_round_trips() {
		let mut ctl = controller();
		let mut out = Vec::new();

		ctl.run(&mut Script::new("-xq"), &mut out).unwrap();

		assert_eq!(ctl.setting(), Attenuation::from_db(89.75));
		assert_eq!(commands(ctl), ["*:CHAN:1:SETATT:89.75;", "*:ATT?", "*:CHAN:1:SETATT:89.75;", "*:ATT?"]);
	}

	#[test]
	fn balanced_keys_return_to_start() {
		let mut ctl = controller();

		ctl.run(&mut Script::new("++++++------q"), &mut io::sink()).unwrap();

		assert!((ctl.setting().db() - Attenuation::default().db()).abs() < 1e-6);
	}

	#[test]
	fn key_source_error_stops_loop() {
		let mut ctl = controller();

		assert!(ctl.run(&mut Script::new("+"), &mut io::sink()).is_err());
		assert_eq!(commands(ctl).len(), 2);
	}
}
