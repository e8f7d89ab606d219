//! Binary buffer packer.
//!
//! Payloads are appended sequentially into a buffer's byte accumulator,
//! each followed by zero padding so the next append starts on a 4-byte
//! boundary. Padding counts toward the buffer's physical footprint but
//! never toward a view's `byteLength`. Single writer only: offsets are
//! computed from the live accumulator length.

use crate::document::{Buffer, BufferView};
use crate::error::{GltfError, Result};

const ALIGNMENT: usize = 4;

/// Append a payload to a buffer and describe it with a new view.
///
/// The returned view points at the un-padded payload range; the caller
/// pushes it into the document's buffer view sequence. Previously
/// returned offsets stay valid because data is only ever appended.
pub fn append_payload(buffer: &mut Buffer, payload: &[u8]) -> Result<BufferView> {
    if payload.is_empty() {
        return Err(GltfError::InvalidArgument(
            "cannot append an empty payload: byteLength must be at least 1".into(),
        ));
    }

    let byte_offset = buffer.data.len();
    buffer.data.extend_from_slice(payload);

    let padding = (ALIGNMENT - payload.len() % ALIGNMENT) % ALIGNMENT;
    buffer.data.extend(std::iter::repeat(0u8).take(padding));

    Ok(BufferView {
        buffer: buffer.index,
        byte_offset,
        byte_length: Some(payload.len()),
        byte_stride: None,
        target: None,
        name: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_append_starts_at_zero() {
        let mut buffer = Buffer::default();
        let view = append_payload(&mut buffer, &[1, 2, 3, 4, 5]).unwrap();

        assert_eq!(view.byte_offset, 0);
        assert_eq!(view.byte_length, Some(5));
        assert_eq!(view.buffer, 0);
        // 5 payload bytes plus 3 padding bytes.
        assert_eq!(buffer.data.len(), 8);
        assert_eq!(&buffer.data[5..], &[0, 0, 0]);
    }

    #[test]
    fn test_second_append_is_aligned() {
        let mut buffer = Buffer::default();
        append_payload(&mut buffer, &[1, 2, 3, 4, 5]).unwrap();
        let view = append_payload(&mut buffer, &[9, 9]).unwrap();

        assert_eq!(view.byte_offset, 8);
        assert_eq!(view.byte_length, Some(2));
        assert_eq!(buffer.data.len(), 12);
    }

    #[test]
    fn test_aligned_payload_gets_no_padding() {
        let mut buffer = Buffer::default();
        let view = append_payload(&mut buffer, &[0; 16]).unwrap();

        assert_eq!(view.byte_length, Some(16));
        assert_eq!(buffer.data.len(), 16);
    }

    #[test]
    fn test_empty_payload_is_rejected() {
        let mut buffer = Buffer::default();
        assert!(matches!(
            append_payload(&mut buffer, &[]),
            Err(GltfError::InvalidArgument(_))
        ));
        assert!(buffer.data.is_empty());
    }

    #[test]
    fn test_view_carries_owning_buffer_index() {
        let mut buffer = Buffer {
            index: 3,
            ..Default::default()
        };
        let view = append_payload(&mut buffer, &[1]).unwrap();
        assert_eq!(view.buffer, 3);
    }
}
