//! Page/packet arithmetic shared by the sender and receiver.

use crate::config::{PAGE, PAYLOAD, PPP};

/// Total packets across the whole image.
pub fn total_packets(image_len: usize) -> u16 {
    ((image_len + PAYLOAD - 1) / PAYLOAD) as u16
}

/// Total pages across the whole image.
pub fn total_pages(image_len: usize) -> u16 {
    ((image_len + PAGE - 1) / PAGE).max(1) as u16
}

/// Pages derived purely from a previously-announced `total_packets`, the
/// only thing the receiver has to go on before it has seen the whole
/// image.
pub fn total_pages_from_packets(total_packets: u16) -> u16 {
    ((total_packets as usize + PPP - 1) / PPP).max(1) as u16
}

/// How many packets make up `page` (1-based), given the image's total
/// packet count and page count. `PPP` for every interior page; the
/// remainder for the last one.
pub fn packets_this_page(total_packets: u16, total_pages: u16, page: u16) -> u16 {
    if page < total_pages {
        PPP as u16
    } else {
        let full = (total_pages as u32 - 1) * PPP as u32;
        (total_packets as u32 - full) as u16
    }
}

/// Absolute byte offset (from the image start) of packet `seq` (1-based)
/// of `page` (1-based).
pub fn packet_offset(page: u16, seq: u16) -> usize {
    ((page as usize - 1) * PPP + (seq as usize - 1)) * PAYLOAD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_full_page() {
        assert_eq!(total_packets(PAGE), PPP as u16);
        assert_eq!(total_pages(PAGE), 1);
        assert_eq!(packets_this_page(PPP as u16, 1, 1), PPP as u16);
    }

    #[test]
    fn two_pages_last_short() {
        let len = PAGE + 1; // one byte into the second page
        assert_eq!(total_packets(len), PPP as u16 + 1);
        assert_eq!(total_pages(len), 2);
        assert_eq!(packets_this_page(PPP as u16 + 1, 2, 1), PPP as u16);
        assert_eq!(packets_this_page(PPP as u16 + 1, 2, 2), 1);
    }

    #[test]
    fn offsets_are_contiguous() {
        assert_eq!(packet_offset(1, 1), 0);
        assert_eq!(packet_offset(1, 2), PAYLOAD);
        assert_eq!(packet_offset(2, 1), PAGE);
    }
}
