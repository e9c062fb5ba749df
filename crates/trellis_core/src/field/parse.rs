//! The attribute grammar: text parsers for every field kind.
//!
//! Numbers are separated by whitespace and/or commas. Parsing is tolerant of
//! trailing garbage for multi values (extra tokens beyond the last complete
//! tuple are dropped) but strict about malformed numbers and short tuples.

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use super::{FieldKind, FieldValue, ImageValue};
use crate::error::FieldError;

impl FieldKind {
    /// Parse `text` as a value of this kind.
    pub fn parse(self, text: &str) -> Result<FieldValue, FieldError> {
        match self {
            FieldKind::Bool => parse_bool(text).map(FieldValue::Bool),
            FieldKind::Int => Ok(FieldValue::Int(ints(text, 1)?[0])),
            FieldKind::Float => Ok(FieldValue::Float(floats(text, 1)?[0])),
            FieldKind::Double => parse_double(text).map(FieldValue::Double),
            FieldKind::String => Ok(FieldValue::String(text.to_string())),
            FieldKind::Color => floats(text, 3).map(|f| FieldValue::Color(Vec3::from_slice(&f))),
            FieldKind::ColorRgba => {
                floats(text, 4).map(|f| FieldValue::ColorRgba(Vec4::from_slice(&f)))
            }
            FieldKind::Vec2 => floats(text, 2).map(|f| FieldValue::Vec2(Vec2::from_slice(&f))),
            FieldKind::Vec3 => floats(text, 3).map(|f| FieldValue::Vec3(Vec3::from_slice(&f))),
            FieldKind::Rotation => {
                floats(text, 4).map(|f| FieldValue::Rotation(axis_angle(&f)))
            }
            FieldKind::Matrix => floats(text, 16).map(|f| {
                // Written row-major; glam stores column-major.
                let mut a = [0.0f32; 16];
                a.copy_from_slice(&f[..16]);
                FieldValue::Matrix(Mat4::from_cols_array(&a).transpose())
            }),
            FieldKind::Image => parse_image(text).map(FieldValue::Image),
            FieldKind::Ints => all_ints(text).map(FieldValue::Ints),
            FieldKind::Floats => all_floats(text).map(FieldValue::Floats),
            FieldKind::Strings => Ok(FieldValue::Strings(parse_strings(text))),
            FieldKind::Colors => tuples(text, 3).map(|t| {
                FieldValue::Colors(t.iter().map(|c| Vec3::from_slice(c)).collect())
            }),
            FieldKind::ColorsRgba => tuples(text, 4).map(|t| {
                FieldValue::ColorsRgba(t.iter().map(|c| Vec4::from_slice(c)).collect())
            }),
            FieldKind::Vec2s => tuples(text, 2).map(|t| {
                FieldValue::Vec2s(t.iter().map(|c| Vec2::from_slice(c)).collect())
            }),
            FieldKind::Vec3s => tuples(text, 3).map(|t| {
                FieldValue::Vec3s(t.iter().map(|c| Vec3::from_slice(c)).collect())
            }),
            FieldKind::Rotations => tuples(text, 4).map(|t| {
                FieldValue::Rotations(t.iter().map(|c| axis_angle(c)).collect())
            }),
        }
    }
}

fn is_sep(c: char) -> bool {
    c.is_whitespace() || c == ',' || c == '[' || c == ']'
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(is_sep).filter(|t| !t.is_empty())
}

fn parse_bool(text: &str) -> Result<bool, FieldError> {
    let t = text.trim();
    if t.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if t.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(FieldError::InvalidBool(t.to_string()))
    }
}

fn parse_double(text: &str) -> Result<f64, FieldError> {
    let tok = tokens(text)
        .next()
        .ok_or(FieldError::MissingComponents { expected: 1, found: 0 })?;
    tok.parse::<f64>()
        .map_err(|_| FieldError::InvalidNumber(tok.to_string()))
}

fn floats(text: &str, n: usize) -> Result<Vec<f32>, FieldError> {
    let mut out = Vec::with_capacity(n);
    for tok in tokens(text).take(n) {
        out.push(
            tok.parse::<f32>()
                .map_err(|_| FieldError::InvalidNumber(tok.to_string()))?,
        );
    }
    if out.len() < n {
        return Err(FieldError::MissingComponents { expected: n, found: out.len() });
    }
    Ok(out)
}

fn all_floats(text: &str) -> Result<Vec<f32>, FieldError> {
    tokens(text)
        .map(|tok| {
            tok.parse::<f32>()
                .map_err(|_| FieldError::InvalidNumber(tok.to_string()))
        })
        .collect()
}

fn parse_int(tok: &str) -> Result<i32, FieldError> {
    let parsed = if let Some(hex) = tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else {
        tok.parse::<i64>()
    };
    parsed
        .ok()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| FieldError::InvalidNumber(tok.to_string()))
}

fn ints(text: &str, n: usize) -> Result<Vec<i32>, FieldError> {
    let mut out = Vec::with_capacity(n);
    for tok in tokens(text).take(n) {
        out.push(parse_int(tok)?);
    }
    if out.len() < n {
        return Err(FieldError::MissingComponents { expected: n, found: out.len() });
    }
    Ok(out)
}

fn all_ints(text: &str) -> Result<Vec<i32>, FieldError> {
    tokens(text).map(parse_int).collect()
}

/// Fixed-width float tuples; incomplete trailing tuples are an error.
fn tuples(text: &str, width: usize) -> Result<Vec<Vec<f32>>, FieldError> {
    let flat = all_floats(text)?;
    if flat.len() % width != 0 {
        return Err(FieldError::MissingComponents {
            expected: width,
            found: flat.len() % width,
        });
    }
    Ok(flat.chunks(width).map(|c| c.to_vec()).collect())
}

/// Axis-angle quadruple to quaternion. A degenerate axis yields identity.
fn axis_angle(f: &[f32]) -> Quat {
    let axis = Vec3::new(f[0], f[1], f[2]);
    if axis.length_squared() < 1.0e-12 {
        Quat::IDENTITY
    } else {
        Quat::from_axis_angle(axis.normalize(), f[3])
    }
}

/// String lists: `'"one" "two"'` with `\"` and `\\` escapes. Without any
/// quotes, the whole trimmed text is a single entry.
fn parse_strings(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if !trimmed.contains('"') {
        return vec![trimmed.to_string()];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    for c in trimmed.chars() {
        if !in_quotes {
            if c == '"' {
                in_quotes = true;
                current.clear();
            }
            continue;
        }
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            in_quotes = false;
            out.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    out
}

/// Largest pixel count `parse_image` accepts (a 4096x4096 image).
const MAX_IMAGE_PIXELS: u64 = 4096 * 4096;

/// Images: `width height components pixel...` with decimal or `0x` pixels.
/// Missing pixels are padded with zero, extras dropped. The pixel count is
/// computed in `u64` and capped so hostile dimensions cannot overflow or
/// allocate unbounded memory.
fn parse_image(text: &str) -> Result<ImageValue, FieldError> {
    let ints = all_ints(text)?;
    if ints.len() < 3 {
        return Err(FieldError::MissingComponents { expected: 3, found: ints.len() });
    }
    let width = ints[0].max(0) as u32;
    let height = ints[1].max(0) as u32;
    let components = ints[2].clamp(0, 4) as u32;
    let total = u64::from(width) * u64::from(height);
    if total > MAX_IMAGE_PIXELS {
        return Err(FieldError::ImageTooLarge { width, height });
    }
    let mut pixels: Vec<u32> = ints[3..].iter().map(|&p| p as u32).collect();
    pixels.resize(total as usize, 0);
    Ok(ImageValue { width, height, components, pixels })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(FieldKind::Bool.parse("TRUE").unwrap(), FieldValue::Bool(true));
        assert_eq!(FieldKind::Bool.parse(" false ").unwrap(), FieldValue::Bool(false));
        assert!(FieldKind::Bool.parse("yes").is_err());
    }

    #[test]
    fn test_parse_vec3_with_commas() {
        let v = FieldKind::Vec3.parse("1, 2.5, -3").unwrap();
        assert_eq!(v, FieldValue::Vec3(Vec3::new(1.0, 2.5, -3.0)));
    }

    #[test]
    fn test_parse_vec3_short() {
        assert_eq!(
            FieldKind::Vec3.parse("1 2"),
            Err(FieldError::MissingComponents { expected: 3, found: 2 })
        );
    }

    #[test]
    fn test_parse_rotation() {
        let v = FieldKind::Rotation.parse("0 1 0 1.5707963").unwrap();
        let q = v.as_rotation().unwrap();
        let expected = Quat::from_axis_angle(Vec3::Y, 1.5707963);
        assert!(q.abs_diff_eq(expected, 1.0e-6));
    }

    #[test]
    fn test_parse_rotation_zero_axis() {
        let v = FieldKind::Rotation.parse("0 0 0 2.0").unwrap();
        assert_eq!(v.as_rotation(), Some(Quat::IDENTITY));
    }

    #[test]
    fn test_parse_matrix_row_major() {
        let v = FieldKind::Matrix
            .parse("1 0 0 5  0 1 0 6  0 0 1 7  0 0 0 1")
            .unwrap();
        let m = v.as_matrix().unwrap();
        assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(5.0, 6.0, 7.0));
    }

    #[test]
    fn test_parse_index_list() {
        let v = FieldKind::Ints.parse("0 1 2 -1 3 4 5 -1").unwrap();
        assert_eq!(v.as_ints().unwrap(), &[0, 1, 2, -1, 3, 4, 5, -1]);
    }

    #[test]
    fn test_parse_mf_vec3_brackets() {
        let v = FieldKind::Vec3s.parse("[0 0 0, 1 1 1]").unwrap();
        assert_eq!(v.as_vec3s().unwrap(), &[Vec3::ZERO, Vec3::ONE]);
    }

    #[test]
    fn test_parse_mf_vec3_ragged() {
        assert!(FieldKind::Vec3s.parse("0 0 0 1 1").is_err());
    }

    #[test]
    fn test_parse_strings_quoted() {
        let v = FieldKind::Strings.parse(r#""EXAMINE" "ANY""#).unwrap();
        assert_eq!(v.as_strings().unwrap(), &["EXAMINE", "ANY"]);
    }

    #[test]
    fn test_parse_strings_escaped() {
        let v = FieldKind::Strings.parse(r#""say \"hi\"" "b\\c""#).unwrap();
        assert_eq!(v.as_strings().unwrap(), &[r#"say "hi""#, r"b\c"]);
    }

    #[test]
    fn test_parse_strings_bare() {
        let v = FieldKind::Strings.parse("walkthrough").unwrap();
        assert_eq!(v.as_strings().unwrap(), &["walkthrough"]);
    }

    #[test]
    fn test_parse_image_hex() {
        let v = FieldKind::Image.parse("2 1 3 0xFF0000 0x00FF00").unwrap();
        match v {
            FieldValue::Image(img) => {
                assert_eq!((img.width, img.height, img.components), (2, 1, 3));
                assert_eq!(img.pixels, vec![0xFF0000, 0x00FF00]);
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn test_parse_image_pads_missing_pixels() {
        let v = FieldKind::Image.parse("2 2 1 7").unwrap();
        match v {
            FieldValue::Image(img) => assert_eq!(img.pixels, vec![7, 0, 0, 0]),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn test_parse_image_rejects_oversized_dimensions() {
        assert_eq!(
            FieldKind::Image.parse("100000 100000 3"),
            Err(FieldError::ImageTooLarge { width: 100000, height: 100000 })
        );
    }

    #[test]
    fn test_parse_same_kind() {
        let v = FieldValue::Float(1.0);
        assert_eq!(v.parse_same_kind("2.5").unwrap(), FieldValue::Float(2.5));
        assert!(v.parse_same_kind("abc").is_err());
    }
}
