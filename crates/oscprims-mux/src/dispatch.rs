use std::net::SocketAddr;

use oscprims_packet::{Bundle, Element, Message, Packet};
use tracing::warn;

use crate::error::ListenerResult;
use crate::listener::PacketListener;

/// Message-level callbacks for a [`PacketDispatcher`].
pub trait MessageHandler: Send + Sync {
    /// Called once for every message in a packet, including messages nested
    /// in bundles, in wire order.
    fn process_message(&self, message: &Message<'_>, remote: SocketAddr) -> ListenerResult;

    /// Called for every bundle. The default visits each element in order,
    /// recursing into nested bundles.
    fn process_bundle(&self, bundle: &Bundle<'_>, remote: SocketAddr) -> ListenerResult {
        for element in bundle.elements() {
            dispatch_element(self, element, remote)?;
        }
        Ok(())
    }
}

/// A [`PacketListener`] that reads each datagram and hands its messages to a
/// [`MessageHandler`].
///
/// Malformed packets and malformed bundle elements are logged and skipped;
/// errors returned by the handler are passed on to the receive loop.
#[derive(Debug, Default)]
pub struct PacketDispatcher<H> {
    handler: H,
}

impl<H: MessageHandler> PacketDispatcher<H> {
    /// Wrap `handler`.
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// The wrapped handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Unwrap the handler.
    pub fn into_inner(self) -> H {
        self.handler
    }
}

impl<H: MessageHandler> PacketListener for PacketDispatcher<H> {
    fn process_packet(&self, data: &[u8], remote: SocketAddr) -> ListenerResult {
        dispatch_element(&self.handler, Element::new(data), remote)
    }
}

fn dispatch_element<H>(handler: &H, element: Element<'_>, remote: SocketAddr) -> ListenerResult
where
    H: MessageHandler + ?Sized,
{
    match element.parse() {
        Ok(Packet::Message(message)) => handler.process_message(&message, remote),
        Ok(Packet::Bundle(bundle)) => handler.process_bundle(&bundle, remote),
        Err(err) => {
            warn!(%remote, size = element.size(), error = %err, "dropping malformed packet");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::{BufMut, BytesMut};

    use super::*;

    fn padded(buf: &mut BytesMut, s: &str) {
        buf.put_slice(s.as_bytes());
        buf.put_bytes(0, 4 - s.len() % 4);
    }

    fn int_message(address: &str, value: i32) -> Vec<u8> {
        let mut buf = BytesMut::new();
        padded(&mut buf, address);
        padded(&mut buf, ",i");
        buf.put_i32(value);
        buf.to_vec()
    }

    fn bundle(elements: &[&[u8]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_slice(b"#bundle\0");
        buf.put_u64(1);
        for element in elements {
            buf.put_u32(element.len() as u32);
            buf.put_slice(element);
        }
        buf.to_vec()
    }

    fn remote() -> SocketAddr {
        "127.0.0.1:7000".parse().unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, i32)>>,
    }

    impl MessageHandler for Recorder {
        fn process_message(&self, message: &Message<'_>, _remote: SocketAddr) -> ListenerResult {
            let value: i32 = message.argument_stream().read()?;
            self.seen
                .lock()
                .unwrap()
                .push((message.address_pattern().to_string(), value));
            Ok(())
        }
    }

    fn seen(dispatcher: &PacketDispatcher<Recorder>) -> Vec<(String, i32)> {
        dispatcher.handler().seen.lock().unwrap().clone()
    }

    #[test]
    fn plain_message_is_dispatched() {
        let dispatcher = PacketDispatcher::new(Recorder::default());
        dispatcher
            .process_packet(&int_message("/volume", 7), remote())
            .unwrap();
        assert_eq!(seen(&dispatcher), vec![("/volume".to_string(), 7)]);
    }

    #[test]
    fn nested_bundles_are_visited_in_order() {
        let inner = bundle(&[&int_message("/b", 2), &int_message("/c", 3)]);
        let outer = bundle(&[&int_message("/a", 1), &inner, &int_message("/d", 4)]);

        let dispatcher = PacketDispatcher::new(Recorder::default());
        dispatcher.process_packet(&outer, remote()).unwrap();

        let addresses: Vec<String> = seen(&dispatcher).into_iter().map(|(a, _)| a).collect();
        assert_eq!(addresses, ["/a", "/b", "/c", "/d"]);
    }

    #[test]
    fn malformed_packets_are_dropped() {
        let dispatcher = PacketDispatcher::new(Recorder::default());
        dispatcher.process_packet(b"/bad", remote()).unwrap();
        dispatcher.process_packet(b"#bundle\0", remote()).unwrap();
        assert!(seen(&dispatcher).is_empty());
    }

    #[test]
    fn malformed_element_is_skipped_and_siblings_delivered() {
        // "/bad" has no terminator, but its size keeps the bundle well formed
        let outer = bundle(&[&int_message("/a", 1), b"/bad", &int_message("/b", 2)]);
        let dispatcher = PacketDispatcher::new(Recorder::default());
        dispatcher.process_packet(&outer, remote()).unwrap();

        let addresses: Vec<String> = seen(&dispatcher).into_iter().map(|(a, _)| a).collect();
        assert_eq!(addresses, ["/a", "/b"]);
    }

    #[test]
    fn handler_errors_propagate() {
        let dispatcher = PacketDispatcher::new(Recorder::default());
        let mut buf = BytesMut::new();
        padded(&mut buf, "/text");
        padded(&mut buf, ",s");
        padded(&mut buf, "hello");

        let err = dispatcher.process_packet(&buf, remote()).unwrap_err();
        assert!(err.to_string().contains("wrong argument type"));
    }

    struct BundleCounter {
        bundles: Mutex<usize>,
        messages: Mutex<usize>,
    }

    impl MessageHandler for BundleCounter {
        fn process_message(&self, _message: &Message<'_>, _remote: SocketAddr) -> ListenerResult {
            *self.messages.lock().unwrap() += 1;
            Ok(())
        }

        fn process_bundle(&self, bundle: &Bundle<'_>, _remote: SocketAddr) -> ListenerResult {
            *self.bundles.lock().unwrap() += 1;
            assert!(bundle.time_tag().is_immediate());
            Ok(())
        }
    }

    #[test]
    fn overriding_process_bundle_replaces_recursion() {
        let packet = bundle(&[&int_message("/a", 1)]);
        let dispatcher = PacketDispatcher::new(BundleCounter {
            bundles: Mutex::new(0),
            messages: Mutex::new(0),
        });
        dispatcher.process_packet(&packet, remote()).unwrap();
        assert_eq!(*dispatcher.handler().bundles.lock().unwrap(), 1);
        assert_eq!(*dispatcher.handler().messages.lock().unwrap(), 0);
    }
}
