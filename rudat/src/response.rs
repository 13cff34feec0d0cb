//! Response decoding
//!
//! Byte 0 of every reply is a status byte. The text payload follows and ends
//! at the first `0x00` or `0xFF`, or at the end of the transfer.

pub const PAYLOAD_OFFSET: usize = 1;

#[inline]
fn is_sentinel(byte: u8) -> bool {
	byte == 0x00 || byte == 0xff
}

pub fn decode(buf: &[u8]) -> String {
	buf.iter().skip(PAYLOAD_OFFSET).take_while(|&&byte| !is_sentinel(byte)).map(|&byte| char::from(byte)).collect()
}
