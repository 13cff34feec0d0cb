#![doc = include_str!("../../readme.md")]

mod attenuation;
mod command;
mod device;
pub mod response;

pub use attenuation::{ATTENUATION_STEP, Attenuation, MAX_ATTENUATION};
pub use command::Command;
pub use device::{Device, Endpoint, Identity, Link, UsbId, UsbLink, discover, open};
pub use nusb;
use thiserror::Error;

/// `vendor_id` of Mini-Circuits
pub const VENDOR_ID: u16 = 0x20ce;

/// `product_id` of the RUDAT-13G-90
pub const PRODUCT_ID: u16 = 0x0023;

/// Size of a single response transfer
pub const TRANSFER_SIZE: usize = 64;

pub type Result<T = (), E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("Usb: {0}")]
	Usb(#[from] nusb::Error),

	#[error("Transfer: {0}")]
	Transfer(#[from] nusb::transfer::TransferError),

	#[error("Device {vendor_id:04x}:{product_id:04x} not found")]
	DeviceNotFound { vendor_id: u16, product_id: u16 },

	#[error("Device exposes no configurations")]
	NoConfiguration,
}
