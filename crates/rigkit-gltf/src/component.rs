//! Component-type and data-type registry.
//!
//! Pure lookups over the wire-format constants plus scalar packing. Packed
//! bytes are always little-endian, regardless of host platform.

use crate::error::{GltfError, Result};

/// Component type: signed 8-bit integer.
pub const COMPONENT_BYTE: u32 = 5120;
/// Component type: unsigned 8-bit integer.
pub const COMPONENT_UNSIGNED_BYTE: u32 = 5121;
/// Component type: signed 16-bit integer.
pub const COMPONENT_SHORT: u32 = 5122;
/// Component type: unsigned 16-bit integer.
pub const COMPONENT_UNSIGNED_SHORT: u32 = 5123;
/// Component type: unsigned 32-bit integer.
pub const COMPONENT_UNSIGNED_INT: u32 = 5125;
/// Component type: 32-bit float.
pub const COMPONENT_FLOAT: u32 = 5126;

/// Buffer view target: ARRAY_BUFFER (vertex data).
pub const TARGET_ARRAY_BUFFER: u32 = 34962;
/// Buffer view target: ELEMENT_ARRAY_BUFFER (index data).
pub const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// Primitive mode: POINTS.
pub const MODE_POINTS: u32 = 0;
/// Primitive mode: LINES.
pub const MODE_LINES: u32 = 1;
/// Primitive mode: LINE_LOOP.
pub const MODE_LINE_LOOP: u32 = 2;
/// Primitive mode: LINE_STRIP.
pub const MODE_LINE_STRIP: u32 = 3;
/// Primitive mode: TRIANGLES (the default).
pub const MODE_TRIANGLES: u32 = 4;
/// Primitive mode: TRIANGLE_STRIP.
pub const MODE_TRIANGLE_STRIP: u32 = 5;
/// Primitive mode: TRIANGLE_FAN.
pub const MODE_TRIANGLE_FAN: u32 = 6;

/// Element shape tag: single scalar.
pub const TYPE_SCALAR: &str = "SCALAR";
/// Element shape tag: 2-vector.
pub const TYPE_VEC2: &str = "VEC2";
/// Element shape tag: 3-vector.
pub const TYPE_VEC3: &str = "VEC3";
/// Element shape tag: 4-vector.
pub const TYPE_VEC4: &str = "VEC4";
/// Element shape tag: 2x2 matrix.
pub const TYPE_MAT2: &str = "MAT2";
/// Element shape tag: 3x3 matrix.
pub const TYPE_MAT3: &str = "MAT3";
/// Element shape tag: 4x4 matrix.
pub const TYPE_MAT4: &str = "MAT4";

/// Map a symbolic component type name to its numeric code.
pub fn component_code(name: &str) -> Result<u32> {
    match name {
        "BYTE" => Ok(COMPONENT_BYTE),
        "UNSIGNED_BYTE" => Ok(COMPONENT_UNSIGNED_BYTE),
        "SHORT" => Ok(COMPONENT_SHORT),
        "UNSIGNED_SHORT" => Ok(COMPONENT_UNSIGNED_SHORT),
        "UNSIGNED_INT" => Ok(COMPONENT_UNSIGNED_INT),
        "FLOAT" => Ok(COMPONENT_FLOAT),
        _ => Err(GltfError::InvalidArgument(format!(
            "unknown component type name: {}",
            name
        ))),
    }
}

/// Get the byte width of a single component.
pub fn component_width(code: u32) -> Result<usize> {
    match code {
        COMPONENT_BYTE | COMPONENT_UNSIGNED_BYTE => Ok(1),
        COMPONENT_SHORT | COMPONENT_UNSIGNED_SHORT => Ok(2),
        COMPONENT_UNSIGNED_INT | COMPONENT_FLOAT => Ok(4),
        _ => Err(GltfError::InvalidArgument(format!(
            "unknown component type code: {}",
            code
        ))),
    }
}

/// Get the number of components in one element of the given shape.
pub fn element_count(shape: &str) -> Result<usize> {
    match shape {
        TYPE_SCALAR => Ok(1),
        TYPE_VEC2 => Ok(2),
        TYPE_VEC3 => Ok(3),
        TYPE_VEC4 => Ok(4),
        TYPE_MAT2 => Ok(4),
        TYPE_MAT3 => Ok(9),
        TYPE_MAT4 => Ok(16),
        _ => Err(GltfError::InvalidArgument(format!(
            "unknown element shape tag: {}",
            shape
        ))),
    }
}

/// Pick the smallest component type that can hold every index in the list.
///
/// The boundaries are exclusive: a maximum of exactly 255 does not fit
/// UNSIGNED_BYTE and promotes to UNSIGNED_SHORT. Existing consumers depend
/// on this cutoff.
pub fn smallest_index_type(indices: &[u64]) -> Result<u32> {
    let max = indices.iter().copied().max().ok_or_else(|| {
        GltfError::InvalidArgument("cannot infer index type for an empty index list".into())
    })?;

    if max < u8::MAX as u64 {
        Ok(COMPONENT_UNSIGNED_BYTE)
    } else if max < u16::MAX as u64 {
        Ok(COMPONENT_UNSIGNED_SHORT)
    } else if max < u32::MAX as u64 {
        Ok(COMPONENT_UNSIGNED_INT)
    } else {
        Err(GltfError::Unrepresentable(max))
    }
}

/// Pack numeric values into tightly-packed little-endian bytes.
///
/// Each value is cast to the component type's representation before
/// packing. Integer casts saturate the way `as` does for floats.
pub fn pack_scalars(values: &[f64], code: u32) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(values.len() * component_width(code)?);

    for &v in values {
        match code {
            COMPONENT_BYTE => bytes.extend_from_slice(&(v as i8).to_le_bytes()),
            COMPONENT_UNSIGNED_BYTE => bytes.extend_from_slice(&(v as u8).to_le_bytes()),
            COMPONENT_SHORT => bytes.extend_from_slice(&(v as i16).to_le_bytes()),
            COMPONENT_UNSIGNED_SHORT => bytes.extend_from_slice(&(v as u16).to_le_bytes()),
            COMPONENT_UNSIGNED_INT => bytes.extend_from_slice(&(v as u32).to_le_bytes()),
            COMPONENT_FLOAT => bytes.extend_from_slice(&(v as f32).to_le_bytes()),
            _ => unreachable!("component_width already rejected the code"),
        }
    }

    Ok(bytes)
}
