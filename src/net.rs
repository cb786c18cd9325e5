use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Best-effort discovery of the address this machine is reachable at on the
/// local network, used only for the startup banner.
///
/// Connecting a UDP socket to a routable address picks the outbound
/// interface without sending a single packet. Falls back to loopback when
/// there is no usable route.
pub fn interface_ip() -> IpAddr {
    let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);

    let Ok(socket) = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)) else {
        return localhost;
    };
    if socket.connect(("10.254.254.254", 58162)).is_err() {
        return localhost;
    }

    socket.local_addr().map(|addr| addr.ip()).unwrap_or(localhost)
}
