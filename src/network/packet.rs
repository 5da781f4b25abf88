//! Probe segment construction and reply parsing

use crate::network::checksum::checksum;
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::tcp::{MutableTcpPacket, TcpFlags, TcpPacket};
use std::net::Ipv4Addr;

/// Length of the probe's TCP header: 20 bytes, no options
pub const TCP_HEADER_LEN: usize = 20;

/// Length of the checksum pseudo-header: source and destination
/// address, zero byte, protocol, TCP segment length
const PSEUDO_HEADER_LEN: usize = 12;

/// A ready-to-send half-open probe segment: a bare 20-byte TCP header
/// with only SYN set, checksummed against its pseudo-header. No IP
/// header is built here; the raw socket's kernel side prepends one.
pub struct SynSegment {
    buf: [u8; TCP_HEADER_LEN],
}

impl SynSegment {
    /// Build the segment. `token` becomes both the source port and the
    /// sequence number so the reply can be correlated back to this
    /// probe.
    pub fn build(
        source_ip: Ipv4Addr,
        dest_ip: Ipv4Addr,
        token: u16,
        dest_port: u16,
        window: u16,
    ) -> Self {
        let mut buf = [0u8; TCP_HEADER_LEN];
        {
            let mut tcp_packet = MutableTcpPacket::new(&mut buf).unwrap();
            tcp_packet.set_source(token);
            tcp_packet.set_destination(dest_port);
            tcp_packet.set_sequence(u32::from(token));
            tcp_packet.set_acknowledgement(0);
            tcp_packet.set_data_offset(5); // 5 * 4 = 20 bytes
            tcp_packet.set_flags(TcpFlags::SYN as u16);
            tcp_packet.set_window(window);
            tcp_packet.set_checksum(0); // placeholder until the pseudo-header sum below
            tcp_packet.set_urgent_ptr(0);
        }

        // The checksum covers the pseudo-header immediately followed by
        // the segment itself. The pseudo-header is a transient scratch
        // buffer; it is never transmitted.
        let mut summed = [0u8; PSEUDO_HEADER_LEN + TCP_HEADER_LEN];
        summed[0..4].copy_from_slice(&source_ip.octets());
        summed[4..8].copy_from_slice(&dest_ip.octets());
        summed[8] = 0;
        summed[9] = IpNextHeaderProtocols::Tcp.0;
        summed[10..12].copy_from_slice(&(TCP_HEADER_LEN as u16).to_be_bytes());
        summed[PSEUDO_HEADER_LEN..].copy_from_slice(&buf);

        let sum = checksum(&summed);
        MutableTcpPacket::new(&mut buf).unwrap().set_checksum(sum);

        Self { buf }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

/// Fields extracted from a TCP segment received on the raw socket
#[derive(Debug, Clone)]
pub struct TcpReply {
    pub source_port: u16,
    pub dest_port: u16,
    pub flags: u8,
    pub seq_num: u32,
    pub ack_num: u32,
}

impl TcpReply {
    pub fn is_syn(&self) -> bool {
        (self.flags & TcpFlags::SYN as u8) != 0
    }

    pub fn is_rst(&self) -> bool {
        (self.flags & TcpFlags::RST as u8) != 0
    }
}

/// Parse a raw IPv4 datagram into the TCP fields a probe cares about.
/// Anything that is not a well-formed IPv4+TCP segment yields `None`.
pub fn parse_tcp_reply(datagram: &[u8]) -> Option<TcpReply> {
    let ip_packet = Ipv4Packet::new(datagram)?;
    if ip_packet.get_next_level_protocol() != IpNextHeaderProtocols::Tcp {
        return None;
    }

    let ip_header_len = (ip_packet.get_header_length() as usize) * 4;
    if ip_header_len < Ipv4Packet::minimum_packet_size()
        || datagram.len() < ip_header_len + TCP_HEADER_LEN
    {
        return None;
    }
    let tcp_packet = TcpPacket::new(&datagram[ip_header_len..])?;

    Some(TcpReply {
        source_port: tcp_packet.get_source(),
        dest_port: tcp_packet.get_destination(),
        flags: tcp_packet.get_flags() as u8,
        seq_num: tcp_packet.get_sequence(),
        ack_num: tcp_packet.get_acknowledgement(),
    })
}
