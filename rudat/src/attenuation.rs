use std::fmt::{Display, Formatter};

/// Highest attenuation the RUDAT-13G-90 supports, dB
pub const MAX_ATTENUATION: f64 = 90.0;

/// Hardware resolution, dB
pub const ATTENUATION_STEP: f64 = 0.25;

/// Attenuation setting in dB
///
/// The value is not clamped to the hardware range. Out of range settings are
/// sent as is and the device reports what it actually applied.
///
/// Displays with two decimal places, which is the form `SETATT` expects.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Attenuation(f64);

impl Attenuation {
	pub const fn from_db(db: f64) -> Self {
		Self(db)
	}

	pub const fn db(self) -> f64 {
		self.0
	}

	#[must_use]
	pub fn increased(self, step: f64) -> Self {
		Self(self.0 + step)
	}

	#[must_use]
	pub fn decreased(self, step: f64) -> Self {
		Self(self.0 - step)
	}
}

impl Default for Attenuation {
	fn default() -> Self {
		Self(MAX_ATTENUATION)
	}
}

impl From<f64> for Attenuation {
	fn from(value: f64) -> Self {
		Self(value)
	}
}

impl Display for Attenuation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:.2}", self.0)
	}
}
