#![cfg(all(unix, feature = "mux"))]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use bytes::{BufMut, BytesMut};
use oscprims::mux::{
    ListenerResult, ListeningSocket, MessageHandler, Multiplexer, MuxError, PacketDispatcher,
    PacketListener, TimerListener,
};
use oscprims::packet::{Blob, Message, TimeTag};
use oscprims::transport::{UdpSocket, STOP_DATAGRAM};

fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().expect("loopback address should parse")
}

fn bind() -> Arc<UdpSocket> {
    Arc::new(UdpSocket::bind(loopback()).expect("loopback socket should bind"))
}

fn packet_listener<F>(f: F) -> Arc<dyn PacketListener>
where
    F: Fn(&[u8], SocketAddr) -> ListenerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

fn timer_listener<F>(f: F) -> Arc<dyn TimerListener>
where
    F: Fn() -> ListenerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Fail the run instead of hanging the test suite.
fn attach_watchdog(mux: &mut Multiplexer) {
    mux.attach_periodic_timer_listener(
        Duration::from_secs(5),
        timer_listener(|| Err("receive loop did not stop in time".into())),
    );
}

fn padded(buf: &mut BytesMut, s: &[u8]) {
    buf.put_slice(s);
    buf.put_bytes(0, 4 - s.len() % 4);
}

fn message(address: &str, tags: &str, args: impl FnOnce(&mut BytesMut)) -> Vec<u8> {
    let mut buf = BytesMut::new();
    padded(&mut buf, address.as_bytes());
    padded(&mut buf, tags.as_bytes());
    args(&mut buf);
    buf.to_vec()
}

fn bundle(time_tag: u64, elements: &[&[u8]]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_slice(b"#bundle\0");
    buf.put_u64(time_tag);
    for element in elements {
        buf.put_u32(element.len() as u32);
        buf.put_slice(element);
    }
    buf.to_vec()
}

#[test]
fn datagrams_reach_the_listener_of_their_socket() {
    let first = bind();
    let second = bind();
    let first_addr = first.local_addr().expect("first socket should have an address");
    let second_addr = second.local_addr().expect("second socket should have an address");

    let mut mux = Multiplexer::new().expect("multiplexer should start");
    let log: Arc<Mutex<Vec<(&'static str, Vec<u8>, SocketAddr)>>> = Arc::default();

    for (name, socket) in [("first", first), ("second", second)] {
        let log = Arc::clone(&log);
        let handle = mux.break_handle();
        mux.attach_socket_listener(
            socket,
            packet_listener(move |data, remote| {
                let mut log = log.lock().expect("log lock should not be poisoned");
                log.push((name, data.to_vec(), remote));
                if log.len() == 2 {
                    handle.request_break();
                }
                Ok(())
            }),
        );
    }
    attach_watchdog(&mut mux);

    let sender = UdpSocket::bind(loopback()).expect("sender should bind");
    let sender_addr = sender.local_addr().expect("sender should have an address");
    sender
        .send_to(&message("/one", ",i", |b| b.put_i32(1)), first_addr)
        .expect("send to first should succeed");
    sender
        .send_to(&message("/two", ",i", |b| b.put_i32(2)), second_addr)
        .expect("send to second should succeed");

    mux.run().expect("run should stop cleanly");

    let mut log = log.lock().expect("log lock should not be poisoned").clone();
    log.sort_by_key(|(name, _, _)| *name);
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].0, "first");
    assert_eq!(
        Message::new(&log[0].1).expect("first datagram should parse").address_pattern(),
        "/one"
    );
    assert_eq!(log[1].0, "second");
    assert_eq!(
        Message::new(&log[1].1).expect("second datagram should parse").address_pattern(),
        "/two"
    );
    assert!(log.iter().all(|(_, _, remote)| *remote == sender_addr));
}

#[test]
fn stop_datagram_ends_the_loop() {
    let socket = bind();
    let addr = socket.local_addr().expect("socket should have an address");

    let mut mux = Multiplexer::new().expect("multiplexer should start");
    let delivered: Arc<Mutex<Vec<Vec<u8>>>> = Arc::default();
    let sink = Arc::clone(&delivered);
    mux.attach_socket_listener(
        socket,
        packet_listener(move |data, _| {
            sink.lock().expect("lock should not be poisoned").push(data.to_vec());
            Ok(())
        }),
    );
    attach_watchdog(&mut mux);

    let sender = UdpSocket::connect_to(addr).expect("sender should connect");
    sender.send(b"/a\0\0").expect("send should succeed");
    sender.send(STOP_DATAGRAM).expect("stop datagram should send");

    mux.run().expect("run should stop cleanly");
    assert_eq!(
        *delivered.lock().expect("lock should not be poisoned"),
        vec![b"/a\0\0".to_vec()]
    );
}

#[test]
fn listener_error_is_returned_from_run() {
    let socket = bind();
    let addr = socket.local_addr().expect("socket should have an address");

    let mut mux = Multiplexer::new().expect("multiplexer should start");
    mux.attach_socket_listener(
        socket,
        packet_listener(|data, _| {
            Message::new(data)?;
            Ok(())
        }),
    );
    attach_watchdog(&mut mux);

    let sender = UdpSocket::bind(loopback()).expect("sender should bind");
    sender.send_to(b"/unterminated", addr).expect("send should succeed");

    let err = mux.run().expect_err("malformed datagram should fail the listener");
    match err {
        MuxError::Listener(source) => {
            assert!(source.to_string().starts_with("malformed message"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn periodic_timer_fires_on_fixed_phase() {
    let mut mux = Multiplexer::new().expect("multiplexer should start");
    let fired: Arc<Mutex<Vec<Instant>>> = Arc::default();

    let log = Arc::clone(&fired);
    mux.attach_periodic_timer_listener_with_delay(
        Duration::ZERO,
        Duration::from_millis(50),
        timer_listener(move || {
            log.lock().expect("lock should not be poisoned").push(Instant::now());
            Ok(())
        }),
    );
    let handle = mux.break_handle();
    mux.attach_periodic_timer_listener_with_delay(
        Duration::from_millis(220),
        Duration::from_secs(3600),
        timer_listener(move || {
            handle.request_break();
            Ok(())
        }),
    );

    let started = Instant::now();
    mux.run().expect("run should stop cleanly");

    let fired = fired.lock().expect("lock should not be poisoned");
    assert_eq!(fired.len(), 5);
    assert!(fired.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[test]
fn asynchronous_break_stops_an_idle_loop() {
    let mut mux = Multiplexer::new().expect("multiplexer should start");
    let handle = mux.break_handle();

    let breaker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        handle
            .asynchronous_break()
            .expect("wake should be delivered");
    });

    let started = Instant::now();
    mux.run().expect("run should stop cleanly");
    assert!(started.elapsed() >= Duration::from_millis(100));
    breaker.join().expect("breaker thread should not panic");
}

#[derive(Default)]
struct Mixer {
    received: Mutex<Vec<String>>,
}

impl MessageHandler for Mixer {
    fn process_message(&self, message: &Message<'_>, remote: SocketAddr) -> ListenerResult {
        let mut args = message.argument_stream();
        let line = match message.address_pattern() {
            "/gain" => {
                let channel: i32 = args.read()?;
                let gain: f32 = args.read()?;
                format!("gain {channel} {gain}")
            }
            "/label" => {
                let label: &str = args.read()?;
                format!("label {label}")
            }
            "/wave" => {
                let wave: Blob<'_> = args.read()?;
                let at: TimeTag = args.read()?;
                format!("wave {} {}", wave.len(), at.seconds())
            }
            other => format!("unknown {other}"),
        };
        args.expect_end()?;
        assert!(remote.ip().is_loopback());
        self.received
            .lock()
            .expect("lock should not be poisoned")
            .push(line);
        Ok(())
    }
}

#[test]
fn dispatcher_delivers_nested_bundle_in_order() {
    let dispatcher = Arc::new(PacketDispatcher::new(Mixer::default()));
    let listener: Arc<dyn PacketListener> = dispatcher.clone();
    let mut listening =
        ListeningSocket::bind(loopback(), listener).expect("listening socket should bind");
    let addr = listening.local_addr().expect("socket should have an address");

    let gain = message("/gain", ",if", |b| {
        b.put_i32(3);
        b.put_f32(0.5);
    });
    let label = message("/label", ",s", |b| padded(b, b"kick"));
    let wave = message("/wave", ",bt", |b| {
        b.put_u32(3);
        padded(b, &[1, 2, 3]);
        b.put_u64(7 << 32);
    });
    let inner = bundle(1, &[&label, &wave]);
    let outer = bundle(1, &[&gain, &inner]);

    let sender = UdpSocket::bind(loopback()).expect("sender should bind");
    sender.send_to(&outer, addr).expect("bundle should send");
    sender.send_to(b"garbage", addr).expect("garbage should send");
    sender.send_stop_to(addr).expect("stop datagram should send");

    let breaker = listening.break_handle();
    let _watchdog = thread::spawn(move || {
        thread::sleep(Duration::from_secs(5));
        let _ = breaker.asynchronous_break();
    });

    listening.run().expect("run should stop cleanly");

    let received = dispatcher
        .handler()
        .received
        .lock()
        .expect("lock should not be poisoned")
        .clone();
    assert_eq!(received, ["gain 3 0.5", "label kick", "wave 3 7"]);
}
