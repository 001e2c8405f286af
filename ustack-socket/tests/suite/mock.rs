//! An in-process engine standing in for the native protocol stack.
//!
//! It implements just enough semantics to exercise the binding layer: the
//! builder's handle-replacement-per-call protocol, device tx/rx queues with
//! a trivial frame format, UDP delivery between devices sharing the engine,
//! and the status codes the sockets are expected to surface. Destructor
//! calls are counted per resource kind so lifecycle tests can assert
//! free-once behavior.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use ustack_socket::{
    CAddress, CEndpoint, CInterface, CMacAddress, EchoKind, Engine, ErrorCode, Medium,
    NULL_HANDLE, RawHandle,
};

// mock frame layout: src port, dst port, src addr, dst addr, payload
pub const FRAME_HEADER: usize = 2 + 2 + 16 + 16;

pub fn frame(src: CEndpoint, dst: CEndpoint, payload: &[u8]) -> Vec<u8> {
    let mut f = Vec::with_capacity(FRAME_HEADER + payload.len());
    f.extend_from_slice(&src.port.to_le_bytes());
    f.extend_from_slice(&dst.port.to_le_bytes());
    f.extend_from_slice(&src.addr.ip);
    f.extend_from_slice(&dst.addr.ip);
    f.extend_from_slice(payload);
    f
}

fn parse_frame(f: &[u8]) -> Option<(CEndpoint, CEndpoint, &[u8])> {
    if f.len() < FRAME_HEADER {
        return None;
    }
    let src = CEndpoint {
        port: u16::from_le_bytes([f[0], f[1]]),
        addr: CAddress {
            ip: f[4..20].try_into().unwrap(),
        },
    };
    let dst = CEndpoint {
        port: u16::from_le_bytes([f[2], f[3]]),
        addr: CAddress {
            ip: f[20..36].try_into().unwrap(),
        },
    };
    Some((src, dst, &f[FRAME_HEADER..]))
}

#[derive(Default, Clone)]
struct BuilderCfg {
    mac: Option<CMacAddress>,
    neighbour_cache: bool,
    sixlowpan: bool,
    fragments: bool,
    ip: Option<CInterface>,
    gateway: Option<CAddress>,
}

struct DeviceState {
    medium: Medium,
    mtu: usize,
    ip: Option<CInterface>,
    gateway: Option<CAddress>,
    tx: VecDeque<Vec<u8>>,
    rx_backlog: Vec<Vec<u8>>,
}

struct UdpState {
    device: RawHandle,
    port: Option<u16>,
    pending_tx: Vec<Vec<u8>>,
    rx: VecDeque<(CEndpoint, Vec<u8>)>,
}

struct TcpState {
    device: RawHandle,
    remote: Option<CEndpoint>,
    listening: Option<u16>,
    active: bool,
    stream: Vec<u8>,
}

struct IcmpState {
    device: RawHandle,
    ident: Option<u16>,
    udp_endpoint: Option<CEndpoint>,
}

struct DnsState {
    device: RawHandle,
    server: CAddress,
}

#[derive(Default)]
struct State {
    next: RawHandle,
    builders: HashMap<RawHandle, BuilderCfg>,
    devices: HashMap<RawHandle, DeviceState>,
    udp: HashMap<RawHandle, UdpState>,
    tcp: HashMap<RawHandle, TcpState>,
    icmp: HashMap<RawHandle, IcmpState>,
    dns: HashMap<RawHandle, DnsState>,
}

impl State {
    fn alloc(&mut self) -> RawHandle {
        self.next += 1;
        self.next
    }
}

/// Destructor invocation counters, one per resource kind.
#[derive(Default)]
pub struct FreeCounts {
    pub builder: Cell<usize>,
    pub device: Cell<usize>,
    pub udp: Cell<usize>,
    pub tcp: Cell<usize>,
    pub icmp: Cell<usize>,
    pub dns: Cell<usize>,
}

pub struct MockEngine {
    state: RefCell<State>,
    sixlowpan: bool,
    tx_size_padding: Cell<usize>,
    pub frees: FreeCounts,
}

impl MockEngine {
    pub fn new() -> Self {
        MockEngine {
            state: RefCell::new(State::default()),
            sixlowpan: false,
            tx_size_padding: Cell::new(0),
            frees: FreeCounts::default(),
        }
    }

    /// Makes the tx size query overstate the front packet by `extra` bytes,
    /// so the copy call writes fewer bytes than the query promised.
    pub fn pad_reported_tx_size(&self, extra: usize) {
        self.tx_size_padding.set(extra);
    }

    pub fn with_sixlowpan() -> Self {
        MockEngine {
            sixlowpan: true,
            ..Self::new()
        }
    }

    /// Handles of every live device, in creation order.
    pub fn device_handles(&self) -> Vec<RawHandle> {
        let mut handles: Vec<RawHandle> = self.state.borrow().devices.keys().copied().collect();
        handles.sort_unstable();
        handles
    }

    /// (medium, mtu, address, gateway) of a live device, for assertions.
    pub fn device_info(
        &self,
        device: RawHandle,
    ) -> (Medium, usize, Option<CInterface>, Option<CAddress>) {
        let state = self.state.borrow();
        let dev = &state.devices[&device];
        (dev.medium, dev.mtu, dev.ip, dev.gateway)
    }
}

impl Engine for MockEngine {
    fn supports_sixlowpan(&self) -> bool {
        self.sixlowpan
    }

    fn builder_new(&self) -> RawHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.alloc();
        state.builders.insert(handle, BuilderCfg::default());
        handle
    }

    fn builder_free(&self, builder: RawHandle) {
        if self.state.borrow_mut().builders.remove(&builder).is_some() {
            self.frees.builder.set(self.frees.builder.get() + 1);
        }
    }

    fn builder_set_hardware_addr(&self, builder: RawHandle, mac: CMacAddress) -> RawHandle {
        self.rebuild(builder, |cfg| cfg.mac = Some(mac))
    }

    fn builder_init_neighbour_cache(&self, builder: RawHandle) -> RawHandle {
        self.rebuild(builder, |cfg| cfg.neighbour_cache = true)
    }

    fn builder_init_sixlowpan(&self, builder: RawHandle) -> RawHandle {
        if !self.sixlowpan {
            return NULL_HANDLE;
        }
        self.rebuild(builder, |cfg| cfg.sixlowpan = true)
    }

    fn builder_init_ipv4_fragments(&self, builder: RawHandle) -> RawHandle {
        self.rebuild(builder, |cfg| cfg.fragments = true)
    }

    fn builder_set_ip_addr(&self, builder: RawHandle, addr: CInterface) -> RawHandle {
        self.rebuild(builder, |cfg| cfg.ip = Some(addr))
    }

    fn builder_set_routes(&self, builder: RawHandle, gateway: CAddress) -> RawHandle {
        self.rebuild(builder, |cfg| cfg.gateway = Some(gateway))
    }

    fn builder_finalize(&self, builder: RawHandle, medium: Medium, mtu: usize) -> RawHandle {
        let mut state = self.state.borrow_mut();
        let Some(cfg) = state.builders.remove(&builder) else {
            return NULL_HANDLE;
        };
        // an Ethernet device is not viable without a hardware address
        if medium == Medium::Ethernet && cfg.mac.is_none() {
            return NULL_HANDLE;
        }
        let handle = state.alloc();
        state.devices.insert(
            handle,
            DeviceState {
                medium,
                mtu,
                ip: cfg.ip,
                gateway: cfg.gateway,
                tx: VecDeque::new(),
                rx_backlog: Vec::new(),
            },
        );
        handle
    }

    fn device_free(&self, device: RawHandle) {
        if self.state.borrow_mut().devices.remove(&device).is_some() {
            self.frees.device.set(self.frees.device.get() + 1);
        }
    }

    fn device_poll(&self, device: RawHandle) {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        // flush datagrams queued on this device's sockets into the tx queue
        for udp in state.udp.values_mut() {
            if udp.device == device {
                if let Some(dev) = state.devices.get_mut(&device) {
                    dev.tx.extend(udp.pending_tx.drain(..));
                }
            }
        }
        // deliver injected frames to whichever bound socket matches
        let backlog = match state.devices.get_mut(&device) {
            Some(dev) => std::mem::take(&mut dev.rx_backlog),
            None => return,
        };
        for f in backlog {
            let Some((src, dst, payload)) = parse_frame(&f) else {
                continue;
            };
            for udp in state.udp.values_mut() {
                if udp.device == device && udp.port == Some(dst.port) {
                    udp.rx.push_back((src, payload.to_vec()));
                    break;
                }
            }
        }
    }

    fn device_tx_queue_len(&self, device: RawHandle) -> usize {
        self.state
            .borrow()
            .devices
            .get(&device)
            .map_or(0, |dev| dev.tx.len())
    }

    fn device_last_tx_size(&self, device: RawHandle) -> usize {
        self.state
            .borrow()
            .devices
            .get(&device)
            .and_then(|dev| dev.tx.front())
            .map_or(0, |packet| packet.len() + self.tx_size_padding.get())
    }

    fn device_pop_tx(&self, device: RawHandle, dst: &mut [u8]) -> usize {
        let mut state = self.state.borrow_mut();
        let Some(packet) = state
            .devices
            .get_mut(&device)
            .and_then(|dev| dev.tx.pop_front())
        else {
            return 0;
        };
        let n = packet.len().min(dst.len());
        dst[..n].copy_from_slice(&packet[..n]);
        n
    }

    fn device_push_rx(&self, device: RawHandle, src: &[u8]) {
        if let Some(dev) = self.state.borrow_mut().devices.get_mut(&device) {
            dev.rx_backlog.push(src.to_vec());
        }
    }

    fn tcp_new(&self, device: RawHandle) -> RawHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.alloc();
        state.tcp.insert(
            handle,
            TcpState {
                device,
                remote: None,
                listening: None,
                active: false,
                stream: Vec::new(),
            },
        );
        handle
    }

    fn tcp_free(&self, socket: RawHandle) {
        if self.state.borrow_mut().tcp.remove(&socket).is_some() {
            self.frees.tcp.set(self.frees.tcp.get() + 1);
        }
    }

    fn tcp_connect(
        &self,
        device: RawHandle,
        socket: RawHandle,
        remote: CEndpoint,
        local_port: u16,
    ) -> ErrorCode {
        let mut state = self.state.borrow_mut();
        if state.devices.get(&device).is_none_or(|dev| dev.ip.is_none()) {
            return ErrorCode::Unaddressable;
        }
        if local_port == 0 {
            return ErrorCode::Illegal;
        }
        let Some(tcp) = state.tcp.get_mut(&socket) else {
            return ErrorCode::InvalidState;
        };
        if tcp.active {
            return ErrorCode::InvalidState;
        }
        tcp.remote = Some(remote);
        tcp.active = true;
        ErrorCode::OK
    }

    fn tcp_listen(&self, device: RawHandle, socket: RawHandle, port: u16) {
        let _ = device;
        if let Some(tcp) = self.state.borrow_mut().tcp.get_mut(&socket) {
            tcp.listening = Some(port);
        }
    }

    fn tcp_send(&self, device: RawHandle, socket: RawHandle, data: &[u8]) {
        let _ = device;
        if let Some(tcp) = self.state.borrow_mut().tcp.get_mut(&socket) {
            tcp.stream.extend_from_slice(data);
        }
    }

    fn tcp_receive(&self, device: RawHandle, socket: RawHandle, dst: &mut [u8]) {
        let _ = device;
        if let Some(tcp) = self.state.borrow_mut().tcp.get_mut(&socket) {
            let n = tcp.stream.len().min(dst.len());
            dst[..n].copy_from_slice(&tcp.stream[..n]);
            tcp.stream.drain(..n);
        }
    }

    fn tcp_is_active(&self, device: RawHandle, socket: RawHandle) -> bool {
        let _ = device;
        self.state
            .borrow()
            .tcp
            .get(&socket)
            .is_some_and(|tcp| tcp.active)
    }

    fn udp_new(&self, device: RawHandle) -> RawHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.alloc();
        state.udp.insert(
            handle,
            UdpState {
                device,
                port: None,
                pending_tx: Vec::new(),
                rx: VecDeque::new(),
            },
        );
        handle
    }

    fn udp_free(&self, socket: RawHandle) {
        if self.state.borrow_mut().udp.remove(&socket).is_some() {
            self.frees.udp.set(self.frees.udp.get() + 1);
        }
    }

    fn udp_bind(&self, device: RawHandle, socket: RawHandle, port: u16) -> ErrorCode {
        let _ = device;
        if port == 0 {
            return ErrorCode::Illegal;
        }
        let mut state = self.state.borrow_mut();
        let Some(udp) = state.udp.get_mut(&socket) else {
            return ErrorCode::InvalidState;
        };
        if udp.port.is_some() {
            return ErrorCode::InvalidState;
        }
        udp.port = Some(port);
        ErrorCode::OK
    }

    fn udp_send(
        &self,
        device: RawHandle,
        socket: RawHandle,
        remote: CEndpoint,
        data: &[u8],
    ) -> ErrorCode {
        let mut state = self.state.borrow_mut();
        let Some(local) = state.devices.get(&device).and_then(|dev| dev.ip) else {
            return ErrorCode::Unaddressable;
        };
        let Some(udp) = state.udp.get_mut(&socket) else {
            return ErrorCode::InvalidState;
        };
        let Some(port) = udp.port else {
            return ErrorCode::InvalidState;
        };
        let src = CEndpoint {
            port,
            addr: local.addr,
        };
        udp.pending_tx.push(frame(src, remote, data));
        ErrorCode::OK
    }

    fn udp_last_rx_size(&self, device: RawHandle, socket: RawHandle) -> usize {
        let _ = device;
        self.state
            .borrow()
            .udp
            .get(&socket)
            .and_then(|udp| udp.rx.front())
            .map_or(0, |(_, payload)| payload.len())
    }

    fn udp_receive(
        &self,
        device: RawHandle,
        socket: RawHandle,
        from: &mut CEndpoint,
        dst: &mut [u8],
    ) -> ErrorCode {
        let _ = device;
        let mut state = self.state.borrow_mut();
        let Some(udp) = state.udp.get_mut(&socket) else {
            return ErrorCode::InvalidState;
        };
        let Some((src, payload)) = udp.rx.pop_front() else {
            return ErrorCode::Exhausted;
        };
        if dst.len() < payload.len() {
            return ErrorCode::Truncated;
        }
        dst[..payload.len()].copy_from_slice(&payload);
        *from = src;
        ErrorCode::OK
    }

    fn icmp_new(&self, device: RawHandle) -> RawHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.alloc();
        state.icmp.insert(
            handle,
            IcmpState {
                device,
                ident: None,
                udp_endpoint: None,
            },
        );
        handle
    }

    fn icmp_free(&self, socket: RawHandle) {
        if self.state.borrow_mut().icmp.remove(&socket).is_some() {
            self.frees.icmp.set(self.frees.icmp.get() + 1);
        }
    }

    fn icmp_bind_any(&self, device: RawHandle, socket: RawHandle) -> ErrorCode {
        let _ = device;
        match self.state.borrow().icmp.contains_key(&socket) {
            true => ErrorCode::OK,
            false => ErrorCode::InvalidState,
        }
    }

    fn icmp_bind_ident(&self, device: RawHandle, socket: RawHandle, ident: u16) -> ErrorCode {
        let _ = device;
        match self.state.borrow_mut().icmp.get_mut(&socket) {
            Some(icmp) => {
                icmp.ident = Some(ident);
                ErrorCode::OK
            }
            None => ErrorCode::InvalidState,
        }
    }

    fn icmp_bind_udp(
        &self,
        device: RawHandle,
        socket: RawHandle,
        endpoint: CEndpoint,
    ) -> ErrorCode {
        let _ = device;
        match self.state.borrow_mut().icmp.get_mut(&socket) {
            Some(icmp) if icmp.udp_endpoint.is_none() => {
                icmp.udp_endpoint = Some(endpoint);
                ErrorCode::OK
            }
            Some(_) => ErrorCode::InvalidState,
            None => ErrorCode::InvalidState,
        }
    }

    fn icmp_send(
        &self,
        device: RawHandle,
        socket: RawHandle,
        to: CAddress,
        data: &[u8],
    ) -> ErrorCode {
        let _ = (socket, to, data);
        let state = self.state.borrow();
        if state.devices.get(&device).is_none_or(|dev| dev.ip.is_none()) {
            return ErrorCode::Unaddressable;
        }
        ErrorCode::OK
    }

    fn icmp_receive(
        &self,
        device: RawHandle,
        socket: RawHandle,
        from: &mut CAddress,
        dst: &mut [u8],
    ) -> ErrorCode {
        let _ = (device, socket, from, dst);
        ErrorCode::Exhausted
    }

    fn icmp_build_echo(
        &self,
        kind: EchoKind,
        ident: u16,
        seq_no: u16,
        payload: &[u8],
        dst: Option<&mut [u8]>,
    ) -> u32 {
        // 8-byte echo header followed by the payload
        let size = 8 + payload.len();
        let Some(dst) = dst else {
            return size as u32;
        };
        if dst.len() < size {
            return ErrorCode::BufferInsufficient as u32;
        }
        dst[0] = kind as u8;
        dst[1] = 0;
        dst[2..4].copy_from_slice(&ident.to_le_bytes());
        dst[4..6].copy_from_slice(&seq_no.to_le_bytes());
        dst[6..8].copy_from_slice(&[0, 0]);
        dst[8..size].copy_from_slice(payload);
        0
    }

    fn dns_socket_new(&self, device: RawHandle, server: CAddress) -> RawHandle {
        let mut state = self.state.borrow_mut();
        if !state.devices.contains_key(&device) {
            return NULL_HANDLE;
        }
        let handle = state.alloc();
        state.dns.insert(handle, DnsState { device, server });
        handle
    }

    fn dns_socket_free(&self, socket: RawHandle) {
        if self.state.borrow_mut().dns.remove(&socket).is_some() {
            self.frees.dns.set(self.frees.dns.get() + 1);
        }
    }

    fn dns_query_new(&self, device: RawHandle, socket: RawHandle, name: &[u8]) -> RawHandle {
        let _ = device;
        let mut state = self.state.borrow_mut();
        if name.is_empty() || !state.dns.contains_key(&socket) {
            return NULL_HANDLE;
        }
        state.alloc()
    }
}

impl MockEngine {
    /// Replaces the builder handle, applying one configuration step to the
    /// carried state. The old handle ceases to exist, like the native
    /// builder calls that consume their argument.
    fn rebuild(&self, builder: RawHandle, step: impl FnOnce(&mut BuilderCfg)) -> RawHandle {
        let mut state = self.state.borrow_mut();
        let Some(mut cfg) = state.builders.remove(&builder) else {
            return NULL_HANDLE;
        };
        step(&mut cfg);
        let handle = state.alloc();
        state.builders.insert(handle, cfg);
        handle
    }
}
