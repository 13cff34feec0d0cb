use std::fmt::{Debug, Formatter};

use futures_lite::future::block_on;
use num_enum::IntoPrimitive;
use nusb::{
	DeviceInfo,
	descriptors::Configuration,
	transfer::{EndpointType, RequestBuffer},
};
use tracing::{debug, trace};

use crate::{Attenuation, Command, Error, Result, TRANSFER_SIZE, response};

#[derive(Debug, Copy, Clone, PartialEq, Eq, IntoPrimitive)]
#[repr(u8)]
pub enum Endpoint {
	Out = 0x01,
	In = 0x81,
}

/// Raw transport under a [`Device`]
///
/// Both calls block until the transfer completes or fails.
pub trait Link {
	fn write(&mut self, endpoint: Endpoint, data: &[u8]) -> Result<()>;

	fn read(&mut self, endpoint: Endpoint, length: usize) -> Result<Vec<u8>>;
}

/// [`Link`] over a claimed nusb interface
pub struct UsbLink {
	usb_if: nusb::Interface,
	kind: EndpointType,
}

impl Debug for UsbLink {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("UsbLink")
			.field("usb_if", &format_args!("Interface {{ .. }}"))
			.field("kind", &self.kind)
			.finish()
	}
}

impl UsbLink {
	/// `kind` selects bulk or interrupt transfers, anything else is treated as
	/// interrupt
	pub fn from_interface(usb_if: nusb::Interface, kind: EndpointType) -> Self {
		Self { usb_if, kind }
	}

	pub fn into_interface(self) -> nusb::Interface {
		self.usb_if
	}
}

impl Link for UsbLink {
	fn write(&mut self, endpoint: Endpoint, data: &[u8]) -> Result<()> {
		let ep = endpoint.into();
		let data = data.to_vec();

		let completion = match self.kind {
			EndpointType::Bulk => block_on(self.usb_if.bulk_out(ep, data)),
			_ => block_on(self.usb_if.interrupt_out(ep, data)),
		};

		completion.status?;
		Ok(())
	}

	fn read(&mut self, endpoint: Endpoint, length: usize) -> Result<Vec<u8>> {
		let ep = endpoint.into();
		let buf = RequestBuffer::new(length);

		let completion = match self.kind {
			EndpointType::Bulk => block_on(self.usb_if.bulk_in(ep, buf)),
			_ => block_on(self.usb_if.interrupt_in(ep, buf)),
		};

		completion.status?;
		Ok(completion.data)
	}
}

/// Anything carrying USB vendor and product IDs
pub trait UsbId {
	fn vendor_id(&self) -> u16;

	fn product_id(&self) -> u16;
}

impl UsbId for DeviceInfo {
	fn vendor_id(&self) -> u16 {
		DeviceInfo::vendor_id(self)
	}

	fn product_id(&self) -> u16 {
		DeviceInfo::product_id(self)
	}
}

/// Picks the first device matching `vendor_id` and `product_id`
pub fn discover<D: UsbId>(devices: impl IntoIterator<Item = D>, vendor_id: u16, product_id: u16) -> Result<D> {
	devices
		.into_iter()
		.find(|dev| dev.vendor_id() == vendor_id && dev.product_id() == product_id)
		.ok_or(Error::DeviceNotFound { vendor_id, product_id })
}

/// Finds, prepares and claims the attenuator
///
/// Kernel drivers are detached from every interface on a best effort basis,
/// then the first configuration is activated and the interface owning
/// [`Endpoint::Out`] is claimed.
pub fn open(vendor_id: u16, product_id: u16) -> Result<Device> {
	let info = discover(nusb::list_devices()?, vendor_id, product_id)?;
	debug!(bus = info.bus_number(), address = info.device_address(), "Attenuator found");

	let device = info.open()?;

	detach_kernel_drivers(&device);

	let (value, interface, kind) = {
		let config = device.configurations().next().ok_or(Error::NoConfiguration)?;
		let (interface, kind) = out_endpoint(&config)
			.or_else(|| config.interfaces().next().map(|it| (it.interface_number(), EndpointType::Interrupt)))
			.ok_or(Error::NoConfiguration)?;

		(config.configuration_value(), interface, kind)
	};

	device.set_configuration(value)?;
	debug!(configuration = value, interface, ?kind, "Device configured");

	let usb_if = device.claim_interface(interface)?;

	Ok(Device::from_link(UsbLink::from_interface(usb_if, kind)))
}

fn detach_kernel_drivers(device: &nusb::Device) {
	for config in device.configurations() {
		for interface in config.interfaces() {
			let number = interface.interface_number();

			// Fails when no driver is bound or the host can't detach
			if let Err(err) = device.detach_kernel_driver(number) {
				debug!(interface = number, ?err, "Kernel driver not detached");
			}
		}
	}
}

fn out_endpoint(config: &Configuration<'_>) -> Option<(u8, EndpointType)> {
	let address = u8::from(Endpoint::Out);

	for alt in config.interface_alt_settings() {
		for ep in alt.endpoints() {
			if ep.address() == address {
				return Some((alt.interface_number(), ep.transfer_type()));
			}
		}
	}

	None
}

/// Identity strings reported by the attenuator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
	pub serial: String,
	pub model: String,
	pub firmware: String,
}

/// Session with an attenuator
///
/// Every query is a write of the command text followed by a read of one
/// [`TRANSFER_SIZE`] reply. Transport errors are returned as is, nothing is
/// retried.
pub struct Device<L = UsbLink> {
	link: L,
}

impl<L> Debug for Device<L> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "Device {{ .. }}")
	}
}

impl<L: Link> Device<L> {
	pub fn from_link(link: L) -> Self {
		Self { link }
	}

	pub fn into_link(self) -> L {
		self.link
	}

	/// Sends `command` and returns the decoded reply
	pub fn request(&mut self, command: Command) -> Result<String> {
		let text = command.to_string();

		self.link.write(Endpoint::Out, text.as_bytes())?;
		let buf = self.link.read(Endpoint::In, TRANSFER_SIZE)?;

		let reply = response::decode(&buf);
		trace!(%text, %reply, "Request");

		Ok(reply)
	}

	pub fn serial_number(&mut self) -> Result<String> {
		self.request(Command::SerialNumber)
	}

	pub fn model_number(&mut self) -> Result<String> {
		self.request(Command::ModelNumber)
	}

	pub fn firmware(&mut self) -> Result<String> {
		self.request(Command::Firmware)
	}

	/// Attenuation of all channels as reported by the device
	pub fn attenuations(&mut self) -> Result<String> {
		self.request(Command::Attenuations)
	}

	/// Sets a single channel, returning the device acknowledgement
	pub fn set_attenuation(&mut self, channel: u8, value: Attenuation) -> Result<String> {
		self.request(Command::SetAttenuation { channel, value })
	}

	/// Queries serial number, model number and firmware, in that order
	pub fn identify(&mut self) -> Result<Identity> {
		let serial = self.serial_number()?;
		let model = self.model_number()?;
		let firmware = self.firmware()?;

		Ok(Identity { serial, model, firmware })
	}
}
