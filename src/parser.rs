//! PDF object parser.
//!
//! Recursive descent over lexer tokens: read a token, dispatch on its type,
//! and for composites (arrays, dictionaries, streams) recurse into the
//! contents. Indirect references (`10 0 R`) are resolved by lookahead on the
//! integer path.

use crate::error::{Error, Result};
use crate::lexer::{token, Token};
use crate::object::{Object, ObjectRef};
use nom::IResult;
use std::collections::HashMap;

/// Decode escape sequences in a literal string body.
///
/// Handles the single-character escapes, octal `\ddd`, and backslash line
/// continuations. Unknown escapes keep the backslash literal.
pub fn decode_literal_string_escapes(raw: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] != b'\\' || i + 1 >= raw.len() {
            result.push(raw[i]);
            i += 1;
            continue;
        }
        match raw[i + 1] {
            b'n' => {
                result.push(b'\n');
                i += 2;
            },
            b'r' => {
                result.push(b'\r');
                i += 2;
            },
            b't' => {
                result.push(b'\t');
                i += 2;
            },
            b'b' => {
                result.push(0x08);
                i += 2;
            },
            b'f' => {
                result.push(0x0C);
                i += 2;
            },
            b'(' | b')' | b'\\' => {
                result.push(raw[i + 1]);
                i += 2;
            },
            b'\n' => {
                i += 2;
            },
            b'\r' => {
                i += 2;
                if i < raw.len() && raw[i] == b'\n' {
                    i += 1;
                }
            },
            c if (b'0'..b'8').contains(&c) => {
                let mut value = 0u32;
                let mut len = 0;
                while len < 3 && i + 1 + len < raw.len() {
                    let d = raw[i + 1 + len];
                    if !(b'0'..b'8').contains(&d) {
                        break;
                    }
                    value = value * 8 + (d - b'0') as u32;
                    len += 1;
                }
                result.push((value & 0xFF) as u8);
                i += 1 + len;
            },
            _ => {
                result.push(b'\\');
                i += 1;
            },
        }
    }

    result
}

/// Decode a hex string body to bytes. Whitespace is ignored; an odd trailing
/// digit is padded with zero.
pub fn decode_hex(hex_bytes: &[u8]) -> Result<Vec<u8>> {
    let digits: Vec<u8> = hex_bytes
        .iter()
        .filter(|&&c| !c.is_ascii_whitespace())
        .copied()
        .collect();

    let mut result = Vec::with_capacity(digits.len() / 2 + 1);
    for chunk in digits.chunks(2) {
        let hi = hex_digit_value(chunk[0])?;
        let lo = if chunk.len() == 2 {
            hex_digit_value(chunk[1])?
        } else {
            0
        };
        result.push((hi << 4) | lo);
    }
    Ok(result)
}

fn hex_digit_value(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(Error::MalformedDocument(format!(
            "invalid hex digit: {:#04x}",
            c
        ))),
    }
}

fn parse_error(input: &[u8]) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))
}

/// Parse a single PDF object from the front of `input`.
pub fn parse_object(input: &[u8]) -> IResult<&[u8], Object> {
    let (input, tok) = token(input)?;

    match tok {
        Token::Null => Ok((input, Object::Null)),
        Token::True => Ok((input, Object::Boolean(true))),
        Token::False => Ok((input, Object::Boolean(false))),
        Token::Real(r) => Ok((input, Object::Real(r))),
        Token::Name(name) => Ok((input, Object::Name(name))),

        Token::Integer(i) => {
            // "n g R" lookahead makes an indirect reference
            if i >= 0 {
                if let Ok((after_gen, Token::Integer(gen))) = token(input) {
                    if (0..=u16::MAX as i64).contains(&gen) {
                        if let Ok((after_r, Token::R)) = token(after_gen) {
                            return Ok((
                                after_r,
                                Object::Reference(ObjectRef::new(i as u32, gen as u16)),
                            ));
                        }
                    }
                }
            }
            Ok((input, Object::Integer(i)))
        },

        Token::LiteralString(bytes) => {
            Ok((input, Object::String(decode_literal_string_escapes(bytes))))
        },

        Token::HexString(hex) => match decode_hex(hex) {
            Ok(decoded) => Ok((input, Object::String(decoded))),
            Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Fail,
            ))),
        },

        Token::ArrayStart => parse_array(input),

        Token::DictStart => {
            let (remaining, dict) = parse_dictionary(input)?;

            // A dictionary followed by `stream` is a stream object
            if let Ok((stream_input, Token::StreamStart)) = token(remaining) {
                let (rest, data) = parse_stream_data(stream_input, &dict)?;
                return Ok((
                    rest,
                    Object::Stream {
                        dict,
                        data: bytes::Bytes::from(data),
                    },
                ));
            }

            Ok((remaining, Object::Dictionary(dict)))
        },

        _ => Err(parse_error(input)),
    }
}

/// Parse a full indirect object: `id gen obj <body> endobj`.
///
/// The trailing `endobj` is tolerated when missing, matching documents that
/// truncate it before a stream boundary.
pub fn parse_indirect_object(input: &[u8]) -> IResult<&[u8], (ObjectRef, Object)> {
    let (input, id_tok) = token(input)?;
    let id = match id_tok {
        Token::Integer(i) if i >= 0 => i as u32,
        _ => return Err(parse_error(input)),
    };
    let (input, gen_tok) = token(input)?;
    let gen = match gen_tok {
        Token::Integer(g) if (0..=u16::MAX as i64).contains(&g) => g as u16,
        _ => return Err(parse_error(input)),
    };
    let (input, obj_tok) = token(input)?;
    if obj_tok != Token::ObjStart {
        return Err(parse_error(input));
    }

    let (input, object) = parse_object(input)?;

    let input = match token(input) {
        Ok((rest, Token::ObjEnd)) => rest,
        _ => input,
    };

    Ok((input, (ObjectRef::new(id, gen), object)))
}

/// Read stream data after the `stream` keyword.
///
/// An integer /Length gives the exact byte count. Without one, scan forward
/// for `endstream`, which many malformed producers force anyway.
fn parse_stream_data<'a>(
    input: &'a [u8],
    dict: &HashMap<String, Object>,
) -> IResult<&'a [u8], Vec<u8>> {
    // `stream` must be followed by CRLF or LF; tolerate bare CR
    let input = if input.starts_with(b"\r\n") {
        &input[2..]
    } else if input.starts_with(b"\n") || input.starts_with(b"\r") {
        &input[1..]
    } else {
        input
    };

    if let Some(length) = dict.get("Length").and_then(|o| o.as_integer()) {
        let length = length as usize;
        if input.len() >= length {
            let data = input[..length].to_vec();
            let remaining = &input[length..];
            let (remaining, _) =
                nom::bytes::complete::take_while(crate::lexer::is_pdf_whitespace)(remaining)?;
            if let Ok((rest, Token::StreamEnd)) = token(remaining) {
                return Ok((rest, data));
            }
            // Length disagreed with the endstream position; fall through to scan
        }
    }

    let keyword = b"endstream";
    match input.windows(keyword.len()).position(|w| w == keyword) {
        Some(pos) => {
            // Strip the EOL that precedes endstream
            let mut end = pos;
            if end > 0 && input[end - 1] == b'\n' {
                end -= 1;
            }
            if end > 0 && input[end - 1] == b'\r' {
                end -= 1;
            }
            let data = input[..end].to_vec();
            let (rest, _) = token(&input[pos..])?;
            Ok((rest, data))
        },
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Eof,
        ))),
    }
}

fn parse_array(input: &[u8]) -> IResult<&[u8], Object> {
    let mut objects = Vec::new();
    let mut remaining = input;

    loop {
        if let Ok((rest, Token::ArrayEnd)) = token(remaining) {
            return Ok((rest, Object::Array(objects)));
        }
        if remaining.is_empty() {
            return Err(nom::Err::Error(nom::error::Error::new(
                remaining,
                nom::error::ErrorKind::Eof,
            )));
        }
        let (rest, obj) = parse_object(remaining)?;
        objects.push(obj);
        remaining = rest;
    }
}

fn parse_dictionary(input: &[u8]) -> IResult<&[u8], HashMap<String, Object>> {
    let mut dict = HashMap::new();
    let mut remaining = input;

    loop {
        let (rest, tok) = token(remaining)?;
        match tok {
            Token::DictEnd => return Ok((rest, dict)),
            Token::Name(key) => {
                let (rest, value) = parse_object(rest)?;
                dict.insert(key, value);
                remaining = rest;
            },
            _ => return Err(parse_error(remaining)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitives() {
        assert_eq!(parse_object(b"null").unwrap().1, Object::Null);
        assert_eq!(parse_object(b"true").unwrap().1, Object::Boolean(true));
        assert_eq!(parse_object(b"false").unwrap().1, Object::Boolean(false));
        assert_eq!(parse_object(b"42").unwrap().1, Object::Integer(42));
        assert_eq!(parse_object(b"-1.5").unwrap().1, Object::Real(-1.5));
        assert_eq!(
            parse_object(b"/Catalog").unwrap().1,
            Object::Name("Catalog".to_string())
        );
    }

    #[test]
    fn test_parse_reference() {
        let (rest, obj) = parse_object(b"10 0 R").unwrap();
        assert!(rest.is_empty());
        assert_eq!(obj, Object::Reference(ObjectRef::new(10, 0)));
    }

    #[test]
    fn test_two_integers_are_not_a_reference() {
        let (rest, obj) = parse_object(b"10 0 /Next").unwrap();
        assert_eq!(obj, Object::Integer(10));
        let (_, obj2) = parse_object(rest).unwrap();
        assert_eq!(obj2, Object::Integer(0));
    }

    #[test]
    fn test_parse_literal_string_escapes() {
        let (_, obj) = parse_object(b"(Line1\\nLine2)").unwrap();
        assert_eq!(obj, Object::String(b"Line1\nLine2".to_vec()));

        let (_, obj) = parse_object(b"(Section \\247 71)").unwrap();
        assert_eq!(obj, Object::String(b"Section \xa7 71".to_vec()));
    }

    #[test]
    fn test_parse_hex_string() {
        let (_, obj) = parse_object(b"<48656C6C6F>").unwrap();
        assert_eq!(obj, Object::String(b"Hello".to_vec()));

        // Odd digit count pads with zero
        let (_, obj) = parse_object(b"<48656C6C6F7>").unwrap();
        assert_eq!(obj, Object::String(b"Hello\x70".to_vec()));
    }

    #[test]
    fn test_parse_array() {
        let (_, obj) = parse_object(b"[ 1 2 /Name (str) [ 3 ] ]").unwrap();
        let arr = obj.as_array().unwrap();
        assert_eq!(arr.len(), 5);
        assert_eq!(arr[0].as_integer(), Some(1));
        assert_eq!(arr[2].as_name(), Some("Name"));
        assert_eq!(arr[4].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_array_with_references() {
        let (_, obj) = parse_object(b"[ 3 0 R 4 0 R ]").unwrap();
        let arr = obj.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0].as_reference(), Some(ObjectRef::new(3, 0)));
        assert_eq!(arr[1].as_reference(), Some(ObjectRef::new(4, 0)));
    }

    #[test]
    fn test_parse_dictionary() {
        let (_, obj) = parse_object(b"<< /Type /Page /Count 3 /Parent 2 0 R >>").unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get("Type").unwrap().as_name(), Some("Page"));
        assert_eq!(dict.get("Count").unwrap().as_integer(), Some(3));
        assert_eq!(
            dict.get("Parent").unwrap().as_reference(),
            Some(ObjectRef::new(2, 0))
        );
    }

    #[test]
    fn test_parse_nested_dictionary() {
        let (_, obj) = parse_object(b"<< /Outer << /Inner 1 >> >>").unwrap();
        let dict = obj.as_dict().unwrap();
        let inner = dict.get("Outer").unwrap().as_dict().unwrap();
        assert_eq!(inner.get("Inner").unwrap().as_integer(), Some(1));
    }

    #[test]
    fn test_unclosed_array_is_error() {
        assert!(parse_object(b"[ 1 2 3").is_err());
    }

    #[test]
    fn test_unclosed_dictionary_is_error() {
        assert!(parse_object(b"<< /Key 1").is_err());
    }

    #[test]
    fn test_parse_stream_with_length() {
        let input = b"<< /Length 5 >>\nstream\nHello\nendstream";
        let (rest, obj) = parse_object(input).unwrap();
        assert!(rest.is_empty());
        match obj {
            Object::Stream { dict, data } => {
                assert_eq!(dict.get("Length").unwrap().as_integer(), Some(5));
                assert_eq!(&data[..], b"Hello");
            },
            other => panic!("expected stream, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_parse_stream_without_length_scans_for_endstream() {
        let input = b"<< /Type /XObject >>\nstream\nray data here\nendstream";
        let (_, obj) = parse_object(input).unwrap();
        match obj {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"ray data here"),
            other => panic!("expected stream, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_parse_indirect_object() {
        let input = b"7 0 obj\n<< /Type /Catalog >>\nendobj\n";
        let (_, (obj_ref, obj)) = parse_indirect_object(input).unwrap();
        assert_eq!(obj_ref, ObjectRef::new(7, 0));
        assert_eq!(obj.as_dict().unwrap().get("Type").unwrap().as_name(), Some("Catalog"));
    }

    #[test]
    fn test_parse_indirect_object_missing_endobj() {
        let input = b"7 0 obj\n42\n";
        let (_, (obj_ref, obj)) = parse_indirect_object(input).unwrap();
        assert_eq!(obj_ref.id, 7);
        assert_eq!(obj.as_integer(), Some(42));
    }

    #[test]
    fn test_decode_hex_rejects_garbage() {
        assert!(decode_hex(b"48ZZ").is_err());
    }
}
