//! Internet checksum (RFC 1071)

/// One's-complement 16-bit checksum over `data`.
///
/// Sequential 16-bit words are summed into a 32-bit accumulator (a
/// trailing odd byte is zero-padded on the right), the carries are
/// folded back into the low 16 bits and the result is complemented.
/// This is the exact algorithm every TCP/IP stack runs over IP and TCP
/// headers; a probe segment whose checksum deviates from it is dropped
/// by the peer's kernel before any reply is generated.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut words = data.chunks_exact(2);
    for word in words.by_ref() {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let &[last] = words.remainder() {
        sum += u32::from(u16::from_be_bytes([last, 0]));
    }

    // one fold can itself produce a carry, hence two
    sum = (sum >> 16) + (sum & 0xffff);
    sum += sum >> 16;

    !(sum as u16)
}
