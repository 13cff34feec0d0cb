mod control;
mod keys;

use std::{io, num::ParseIntError};

use anyhow::{Context, Result};
use clap::Parser;
use rudat::{ATTENUATION_STEP, Attenuation, MAX_ATTENUATION};
use tracing::debug;

use crate::control::Controller;

/// Interactive control of a Mini-Circuits RUDAT attenuator
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
	/// USB vendor id, hex
	#[arg(long, value_parser = parse_hex, default_value = "20ce")]
	vendor_id: u16,

	/// USB product id, hex
	#[arg(long, value_parser = parse_hex, default_value = "0023")]
	product_id: u16,

	/// Initial channel 1 setting in dB
	#[arg(long, default_value_t = MAX_ATTENUATION)]
	start: f64,

	/// Attenuation change per key press in dB
	#[arg(long, default_value_t = ATTENUATION_STEP)]
	step: f64,
}

fn parse_hex(src: &str) -> Result<u16, ParseIntError> {
	let digits = src.strip_prefix("0x").or_else(|| src.strip_prefix("0X")).unwrap_or(src);
	u16::from_str_radix(digits, 16)
}

fn main() -> Result<()> {
	trace::setup();

	let args = Args::parse();
	debug!(?args, "Starting");

	let mut device = rudat::open(args.vendor_id, args.product_id).context("failed to open attenuator")?;

	let mut out = io::stdout().lock();
	control::startup(&mut device, args.step, &mut out)?;

	let mut keys = keys::platform();
	let mut controller = Controller::new(device, Attenuation::from_db(args.start), args.step);

	controller.run(keys.as_mut(), &mut out)?;
	debug!(setting = %controller.setting(), "Quit");

	Ok(())
}

mod trace {
	use tracing_subscriber::{EnvFilter, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

	pub(crate) fn setup() {
		// Anything louder than warnings would interleave with the console output
		let filter = EnvFilter::builder().with_default_directive(LevelFilter::WARN.into()).from_env_lossy();
		let fmt = tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr);

		tracing_subscriber::registry().with(fmt).with(filter).init();
	}
}
