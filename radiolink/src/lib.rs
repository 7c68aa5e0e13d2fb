//! Wire format for the page-transfer radio protocol.
//!
//! Every frame is either a 16-byte control frame (NAK, end-of-page) or a
//! 48-byte data frame (16-byte header followed by a 32-byte payload). Two
//! additive, non-carry-folding 16-bit checksums guard the header and the
//! payload separately; there is no cryptographic integrity here, only
//! detection of flips introduced by the radio link.
//!
//! This module is pure and stateless: it knows how to turn a frame into
//! bytes and back, and nothing else.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

/// Header size, in bytes. Present on every frame.
pub const HEADER: usize = 16;
/// Payload size, in bytes. Present only on DATA frames.
pub const PAYLOAD: usize = 32;
/// Page size, in bytes.
pub const PAGE: usize = 4096;
/// Packets per (full) page.
pub const PPP: usize = PAGE / PAYLOAD;
/// Total length of a DATA frame.
pub const DATA_FRAME_LEN: usize = HEADER + PAYLOAD;

const TYPE_DATA: u8 = 120;
const TYPE_NAK: u8 = 121;
const TYPE_END_OF_PAGE: u8 = 122;

/// A decoded frame. Carries only what the wire format actually says; the
/// state machines attach meaning (current page, membership, etc.) on top.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Frame {
    Data {
        seq: u16,
        page: u16,
        total_packets: u16,
        payload: [u8; PAYLOAD],
    },
    Nak {
        seq: u16,
        page: u16,
    },
    EndOfPage {
        page: u16,
    },
}

impl Frame {
    pub fn page(&self) -> u16 {
        match *self {
            Frame::Data { page, .. } => page,
            Frame::Nak { page, .. } => page,
            Frame::EndOfPage { page } => page,
        }
    }
}

/// Why `parse` refused a frame. Every variant is a silent drop at the call
/// site (see spec error handling); nothing here is fatal.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Reject {
    /// Shorter than a control frame; can't even read the header.
    TooShort,
    /// Header checksum didn't match.
    BadHeaderChecksum,
    /// `type` byte isn't one of DATA/NAK/END_OF_PAGE.
    UnknownType,
    /// Claimed to be a DATA frame but the radio handed us fewer than
    /// `DATA_FRAME_LEN` bytes.
    Truncated,
    /// Data checksum didn't match.
    BadDataChecksum,
}

/// Plain unsigned sum of bytes, truncated to 16 bits. No carry folding, by
/// spec: this is deliberately weaker than a real checksum, just enough to
/// catch a flipped bit on the wire.
fn checksum16(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0u16, |acc, &b| acc.wrapping_add(b as u16))
}

fn put_u16(out: &mut [u8], at: usize, v: u16) {
    let b = v.to_be_bytes();
    out[at] = b[0];
    out[at + 1] = b[1];
}

fn get_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

/// Write the common header (everything but the data checksum) at the front
/// of `out`, returning the header checksum that was stored.
fn encode_header(out: &mut [u8], kind: u8, seq: u16, page: u16, total_packets: u16) {
    out[0] = kind;
    put_u16(out, 1, seq);
    put_u16(out, 3, page);
    put_u16(out, 5, total_packets);
    let hchk = checksum16(&out[0..7]);
    put_u16(out, 7, hchk);
    // bytes 9..16 (data checksum + reserved) are left zero by callers that
    // don't need them; DATA fills in the data checksum itself.
}

/// Encode a DATA frame. `payload` is copied verbatim into the frame body;
/// callers are responsible for zero-filling (or leaving unspecified, per
/// spec) any bytes past the meaningful portion of the final, partial
/// packet of the image.
pub fn encode_data(seq: u16, page: u16, total_packets: u16, payload: &[u8; PAYLOAD]) -> [u8; DATA_FRAME_LEN] {
    let mut out = [0u8; DATA_FRAME_LEN];
    encode_header(&mut out, TYPE_DATA, seq, page, total_packets);
    out[HEADER..HEADER + PAYLOAD].copy_from_slice(payload);
    let dchk = checksum16(&out[HEADER..HEADER + PAYLOAD]);
    put_u16(&mut out, 9, dchk);
    out
}

/// Encode a NAK naming the `(seq, page)` pair the sender should retransmit.
pub fn encode_nak(seq: u16, page: u16) -> [u8; HEADER] {
    let mut out = [0u8; HEADER];
    encode_header(&mut out, TYPE_NAK, seq, page, 0);
    out
}

/// Encode an end-of-page marker for `page`.
pub fn encode_end_of_page(page: u16) -> [u8; HEADER] {
    let mut out = [0u8; HEADER];
    encode_header(&mut out, TYPE_END_OF_PAGE, 0, page, 0);
    out
}

/// Parse a frame off the wire. `bytes` may be longer than the frame it
/// contains (the radio may deliver a fixed-size buffer regardless of what
/// was actually sent); trailing bytes past the declared length are
/// ignored. Frames shorter than `HEADER` are rejected outright.
pub fn parse(bytes: &[u8]) -> Result<Frame, Reject> {
    if bytes.len() < HEADER {
        return Err(Reject::TooShort);
    }

    let kind = bytes[0];
    let seq = get_u16(bytes, 1);
    let page = get_u16(bytes, 3);
    let total_packets = get_u16(bytes, 5);
    let header_checksum = get_u16(bytes, 7);

    if checksum16(&bytes[0..7]) != header_checksum {
        return Err(Reject::BadHeaderChecksum);
    }

    match kind {
        TYPE_DATA => {
            if bytes.len() < DATA_FRAME_LEN {
                return Err(Reject::Truncated);
            }
            let data_checksum = get_u16(bytes, 9);
            let body = &bytes[HEADER..DATA_FRAME_LEN];
            if checksum16(body) != data_checksum {
                return Err(Reject::BadDataChecksum);
            }
            let mut payload = [0u8; PAYLOAD];
            payload.copy_from_slice(body);
            Ok(Frame::Data { seq, page, total_packets, payload })
        }
        TYPE_NAK => Ok(Frame::Nak { seq, page }),
        TYPE_END_OF_PAGE => Ok(Frame::EndOfPage { page }),
        _ => Err(Reject::UnknownType),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_round_trip() {
        let mut payload = [0u8; PAYLOAD];
        for (i, b) in payload.iter_mut().enumerate() {
            *b = i as u8;
        }
        let frame = encode_data(7, 3, 400, &payload);
        assert_eq!(frame.len(), DATA_FRAME_LEN);
        match parse(&frame).unwrap() {
            Frame::Data { seq, page, total_packets, payload: got } => {
                assert_eq!(seq, 7);
                assert_eq!(page, 3);
                assert_eq!(total_packets, 400);
                assert_eq!(got, payload);
            }
            other => panic!("wrong kind: {:?}", other),
        }
    }

    #[test]
    fn nak_round_trip() {
        let frame = encode_nak(64, 1);
        assert_eq!(frame.len(), HEADER);
        assert_eq!(parse(&frame).unwrap(), Frame::Nak { seq: 64, page: 1 });
    }

    #[test]
    fn end_of_page_round_trip() {
        let frame = encode_end_of_page(9);
        assert_eq!(parse(&frame).unwrap(), Frame::EndOfPage { page: 9 });
    }

    #[test]
    fn header_bit_flip_rejected() {
        let mut frame = encode_nak(1, 1);
        frame[3] ^= 0x01; // flip a bit inside `page`
        assert_eq!(parse(&frame), Err(Reject::BadHeaderChecksum));
    }

    #[test]
    fn data_bit_flip_rejected() {
        let payload = [0xAAu8; PAYLOAD];
        let mut frame = encode_data(1, 1, 1, &payload);
        frame[HEADER] ^= 0x01;
        assert_eq!(parse(&frame), Err(Reject::BadDataChecksum));
    }

    #[test]
    fn short_frame_rejected() {
        assert_eq!(parse(&[0u8; 4]), Err(Reject::TooShort));
    }

    #[test]
    fn truncated_data_frame_rejected() {
        let payload = [0u8; PAYLOAD];
        let frame = encode_data(1, 1, 1, &payload);
        assert_eq!(parse(&frame[..HEADER + 4]), Err(Reject::Truncated));
    }

    #[test]
    fn unknown_type_rejected() {
        let mut frame = encode_nak(1, 1);
        frame[0] = 5;
        // Recompute header checksum so we isolate the type-byte check.
        let hchk = checksum16(&frame[0..7]);
        put_u16(&mut frame, 7, hchk);
        assert_eq!(parse(&frame), Err(Reject::UnknownType));
    }

    #[test]
    fn tolerates_trailing_bytes() {
        let mut buf = [0u8; 64];
        let frame = encode_end_of_page(2);
        buf[..HEADER].copy_from_slice(&frame);
        assert_eq!(parse(&buf).unwrap(), Frame::EndOfPage { page: 2 });
    }
}
