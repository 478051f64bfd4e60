//! Wire builders for unit tests.

use bytes::{BufMut, BytesMut};

pub(crate) fn put_padded(buf: &mut BytesMut, s: &[u8]) {
    buf.put_slice(s);
    buf.put_bytes(0, 4 - s.len() % 4);
}

/// Address pattern + type-tag string, followed by whatever `args` writes.
pub(crate) fn message(address: &str, tags: &str, args: impl FnOnce(&mut BytesMut)) -> Vec<u8> {
    let mut buf = BytesMut::new();
    put_padded(&mut buf, address.as_bytes());
    put_padded(&mut buf, tags.as_bytes());
    args(&mut buf);
    buf.to_vec()
}

pub(crate) fn bundle(time_tag: u64, elements: &[&[u8]]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_slice(b"#bundle\0");
    buf.put_u64(time_tag);
    for element in elements {
        buf.put_u32(element.len() as u32);
        buf.put_slice(element);
    }
    buf.to_vec()
}

/// `"/foo" ,i 42`
pub(crate) fn foo_42() -> Vec<u8> {
    message("/foo", ",i", |b| b.put_i32(42))
}
