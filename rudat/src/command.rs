use std::fmt::{Display, Formatter};

use crate::Attenuation;

/// ASCII commands understood by the attenuator
///
/// The wire form is the [`Display`] output, sent without any terminator.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Command {
	/// `*:SN?`
	SerialNumber,
	/// `*:MN?`
	ModelNumber,
	/// `*:FIRMWARE?`
	Firmware,
	/// `*:ATT?`, attenuation of every channel
	Attenuations,
	/// `*:CHAN:<channel>:SETATT:<value>;`
	SetAttenuation { channel: u8, value: Attenuation },
}

impl Display for Command {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Command::SerialNumber => f.write_str("*:SN?"),
			Command::ModelNumber => f.write_str("*:MN?"),
			Command::Firmware => f.write_str("*:FIRMWARE?"),
			Command::Attenuations => f.write_str("*:ATT?"),
			Command::SetAttenuation { channel, value } => write!(f, "*:CHAN:{channel}:SETATT:{value};"),
		}
	}
}
