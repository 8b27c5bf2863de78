//! Frame codec. Client frames are fully parsed and unmasked in place; server
//! frames are always final, unmasked, and use the single-byte length form.

use bytes::{BufMut, Bytes, BytesMut};

pub mod opcode {
    pub const CONTINUATION: u8 = 0x0;
    pub const TEXT: u8 = 0x1;
    pub const BINARY: u8 = 0x2;
    pub const CLOSE: u8 = 0x8;
    pub const PING: u8 = 0x9;
    pub const PONG: u8 = 0xA;
}

/// Longest payload a server frame can carry without an extended length.
pub const MAX_SHORT_PAYLOAD: usize = 125;

/// Longest client frame header: 2 bytes, 8 bytes of length, 4 bytes of mask.
pub const MAX_HEADER: usize = 14;

#[derive(Debug, PartialEq, Eq)]
pub enum Frame<'a> {
    Text(&'a [u8]),
    Binary(&'a [u8]),
    Ping(&'a [u8]),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("incomplete frame")]
    Incomplete,
    #[error("fragmented frames are not supported")]
    Fragmented,
    #[error("client frame is not masked")]
    Unmasked,
    #[error("unsupported opcode {0:#x}")]
    UnsupportedOpcode(u8),
}

/// XORs `payload` with the 4-byte mask key. Applying it twice restores the input.
pub fn apply_mask(payload: &mut [u8], key: [u8; 4]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= key[i & 3];
    }
}

/// Parses one client frame at the start of `buf`, unmasking its payload in
/// place. Also returns how many bytes of `buf` the frame took up.
pub fn parse(buf: &mut [u8]) -> Result<(Frame<'_>, usize), FrameError> {
    if buf.len() < 2 {
        return Err(FrameError::Incomplete);
    }
    let fin = buf[0] & 0x80 != 0;
    let op = buf[0] & 0x0F;
    // nothing after a close is read
    if op == opcode::CLOSE {
        return Ok((Frame::Close, buf.len()));
    }
    if !fin || op == opcode::CONTINUATION {
        return Err(FrameError::Fragmented);
    }
    if !matches!(op, opcode::TEXT | opcode::BINARY | opcode::PING) {
        return Err(FrameError::UnsupportedOpcode(op));
    }
    if buf[1] & 0x80 == 0 {
        return Err(FrameError::Unmasked);
    }

    let (len, mut offset) = match buf[1] & 0x7F {
        126 => {
            let ext = buf.get(2..4).ok_or(FrameError::Incomplete)?;
            (u16::from_be_bytes([ext[0], ext[1]]) as u64, 4)
        }
        127 => {
            let ext: [u8; 8] = buf
                .get(2..10)
                .and_then(|ext| ext.try_into().ok())
                .ok_or(FrameError::Incomplete)?;
            (u64::from_be_bytes(ext), 10)
        }
        short => (short as u64, 2),
    };
    let key: [u8; 4] = buf
        .get(offset..offset + 4)
        .and_then(|key| key.try_into().ok())
        .ok_or(FrameError::Incomplete)?;
    offset += 4;

    let len = usize::try_from(len).map_err(|_| FrameError::Incomplete)?;
    let end = offset.checked_add(len).ok_or(FrameError::Incomplete)?;
    let payload = buf.get_mut(offset..end).ok_or(FrameError::Incomplete)?;
    apply_mask(payload, key);

    let frame = match op {
        opcode::TEXT => Frame::Text(payload),
        opcode::BINARY => Frame::Binary(payload),
        _ => Frame::Ping(payload),
    };
    Ok((frame, end))
}

/// Encodes a server frame, or `None` when `payload` does not fit in
/// `limit` bytes or the single-byte length field.
pub fn encode(op: u8, payload: &[u8], limit: usize) -> Option<Bytes> {
    if payload.len() > MAX_SHORT_PAYLOAD.min(limit) {
        return None;
    }
    let mut buf = BytesMut::with_capacity(2 + payload.len());
    buf.put_u8(0x80 | op);
    buf.put_u8(payload.len() as u8);
    buf.put_slice(payload);
    Some(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 4] = [0x37, 0xfa, 0x21, 0x3d];

    fn first(buf: &mut [u8]) -> Result<Frame<'_>, FrameError> {
        parse(buf).map(|(frame, _)| frame)
    }

    fn client_frame(first: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![first];
        match payload.len() {
            len @ 0..=125 => out.push(0x80 | len as u8),
            len @ 126..=0xFFFF => {
                out.push(0x80 | 126);
                out.extend_from_slice(&(len as u16).to_be_bytes());
            }
            len => {
                out.push(0x80 | 127);
                out.extend_from_slice(&(len as u64).to_be_bytes());
            }
        }
        out.extend_from_slice(&KEY);
        let mut masked = payload.to_vec();
        apply_mask(&mut masked, KEY);
        out.extend_from_slice(&masked);
        out
    }

    #[test]
    fn mask_is_its_own_inverse() {
        for len in [0usize, 1, 4, 123, 1000] {
            let original: Vec<u8> = (0..len).map(|i| (i * 7 % 251) as u8).collect();
            let mut data = original.clone();
            apply_mask(&mut data, KEY);
            if len > 0 {
                assert_ne!(data, original);
            }
            apply_mask(&mut data, KEY);
            assert_eq!(data, original, "length {len}");
        }
    }

    #[test]
    fn rfc_masked_hello() {
        // RFC 6455 5.7: a single-frame masked text message containing "Hello"
        let mut raw: [u8; 11] = [
            0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58,
        ];
        assert_eq!(first(&mut raw), Ok(Frame::Text(b"Hello")));
    }

    #[test]
    fn extended_lengths() {
        let payload = vec![b'x'; 300];
        let mut raw = client_frame(0x82, &payload);
        assert_eq!(first(&mut raw), Ok(Frame::Binary(&payload[..])));

        let payload = vec![b'y'; 70_000];
        let mut raw = client_frame(0x81, &payload);
        assert_eq!(first(&mut raw), Ok(Frame::Text(&payload[..])));
    }

    #[test]
    fn control_frames() {
        let mut close = client_frame(0x88, &[0x03, 0xe8]);
        assert_eq!(first(&mut close), Ok(Frame::Close));
        let mut ping = client_frame(0x89, b"hb");
        assert_eq!(first(&mut ping), Ok(Frame::Ping(b"hb")));
    }

    #[test]
    fn rejects_unsupported_frames() {
        let mut continuation = client_frame(0x80, b"tail");
        assert_eq!(first(&mut continuation), Err(FrameError::Fragmented));
        let mut first_fragment = client_frame(0x01, b"head");
        assert_eq!(first(&mut first_fragment), Err(FrameError::Fragmented));
        let mut pong = client_frame(0x8A, b"");
        assert_eq!(first(&mut pong), Err(FrameError::UnsupportedOpcode(0xA)));
        let mut unmasked: [u8; 4] = [0x81, 0x02, b'h', b'i'];
        assert_eq!(first(&mut unmasked), Err(FrameError::Unmasked));
        let mut truncated = client_frame(0x81, b"hello");
        truncated.truncate(8);
        assert_eq!(first(&mut truncated), Err(FrameError::Incomplete));
        assert_eq!(first(&mut [0x81u8]), Err(FrameError::Incomplete));
    }

    #[test]
    fn back_to_back_frames() {
        let mut raw = client_frame(0x81, b"one");
        raw.extend(client_frame(0x89, b"two"));
        let (frame, used) = parse(&mut raw).unwrap();
        assert_eq!(frame, Frame::Text(b"one"));
        assert_eq!(used, 2 + 4 + 3);
        assert_eq!(first(&mut raw[used..]), Ok(Frame::Ping(b"two")));
    }

    #[test]
    fn server_frames() {
        let frame = encode(opcode::TEXT, b"pwm[0]=0.5", 1024).unwrap();
        assert_eq!(&frame[..2], &[0x81, 10]);
        assert_eq!(&frame[2..], b"pwm[0]=0.5");

        assert!(encode(opcode::TEXT, &[b'a'; 125], 1024).is_some());
        assert!(encode(opcode::TEXT, &[b'a'; 126], 1024).is_none());
        assert!(encode(opcode::TEXT, &[b'a'; 60], 32).is_none());
        assert_eq!(encode(opcode::PONG, b"", 1024).unwrap()[..], [0x8A, 0]);
    }
}
