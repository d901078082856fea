//! PDF tokenizer.
//!
//! Splits a PDF byte stream into the atomic tokens the parser assembles into
//! objects: numbers, strings, names, keywords, and structural delimiters.
//! Whitespace and `%` comments are skipped between tokens.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while},
    character::complete::char,
    combinator::{map, value},
    sequence::{delimited, preceded},
    IResult,
};

/// Token types recognized by the tokenizer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number
    Integer(i64),
    /// Real (floating-point) number
    Real(f64),
    /// Literal string content, escape sequences not yet decoded
    LiteralString(&'a [u8]),
    /// Hex string content between `<` and `>`, undecoded
    HexString(&'a [u8]),
    /// Name with `#XX` escapes decoded
    Name(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `<<`
    DictStart,
    /// `>>`
    DictEnd,
    /// `obj`
    ObjStart,
    /// `endobj`
    ObjEnd,
    /// `stream`
    StreamStart,
    /// `endstream`
    StreamEnd,
    /// Reference marker `R`
    R,
}

/// PDF whitespace: space, tab, CR, LF, NUL, form feed.
pub(crate) fn is_pdf_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// PDF delimiter characters, which terminate names and numbers.
fn is_pdf_delimiter(c: u8) -> bool {
    matches!(
        c,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn comment(input: &[u8]) -> IResult<&[u8], ()> {
    value((), preceded(char('%'), take_till(|c| c == b'\r' || c == b'\n')))(input)
}

/// Skip whitespace and comments before a token.
fn skip_ws(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let mut remaining = input;
    loop {
        let (rest, ws) = take_while(is_pdf_whitespace)(remaining)?;
        remaining = rest;
        if let Ok((rest, _)) = comment(remaining) {
            remaining = rest;
            continue;
        }
        if ws.is_empty() {
            break;
        }
    }
    Ok((remaining, input))
}

fn lex_error(input: &[u8]) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))
}

/// Parse an integer or real number.
///
/// Accepts the PDF forms: `42`, `-123`, `+17`, `3.14`, `-.002`, `5.`.
fn parse_number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let mut pos = 0;
    if pos < input.len() && (input[pos] == b'+' || input[pos] == b'-') {
        pos += 1;
    }
    let int_start = pos;
    while pos < input.len() && input[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_len = pos - int_start;
    let mut is_real = false;
    if pos < input.len() && input[pos] == b'.' {
        is_real = true;
        pos += 1;
        while pos < input.len() && input[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if int_len == 0 && !is_real {
        return Err(lex_error(input));
    }
    // A bare sign or bare dot is not a number
    let digit_count = input[..pos].iter().filter(|c| c.is_ascii_digit()).count();
    if digit_count == 0 {
        return Err(lex_error(input));
    }

    let text = std::str::from_utf8(&input[..pos]).map_err(|_| lex_error(input))?;
    let remaining = &input[pos..];

    if is_real {
        // Normalize ".5" and "5." so f64 parsing accepts them
        let mut normalized = String::with_capacity(text.len() + 2);
        for (i, ch) in text.chars().enumerate() {
            if ch == '.' {
                if i == 0 || !text.as_bytes()[i - 1].is_ascii_digit() {
                    normalized.push('0');
                }
                normalized.push('.');
            } else {
                normalized.push(ch);
            }
        }
        if normalized.ends_with('.') {
            normalized.push('0');
        }
        let num: f64 = normalized.parse().map_err(|_| lex_error(input))?;
        Ok((remaining, Token::Real(num)))
    } else {
        let num: i64 = text
            .trim_start_matches('+')
            .parse()
            .map_err(|_| lex_error(input))?;
        Ok((remaining, Token::Integer(num)))
    }
}

/// Parse a literal string, honoring nested balanced parentheses and
/// backslash escapes. Escape decoding is left to the parser.
fn parse_literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (body, _) = char('(')(input)?;
    let mut depth = 1usize;
    let mut pos = 0usize;

    while depth > 0 && pos < body.len() {
        match body[pos] {
            b'\\' => {
                pos += 1;
                if pos < body.len() {
                    if body[pos].is_ascii_digit() {
                        // Octal escape, up to three digits
                        let mut digits = 0;
                        while digits < 3 && pos < body.len() && body[pos].is_ascii_digit() {
                            pos += 1;
                            digits += 1;
                        }
                    } else {
                        pos += 1;
                    }
                }
            },
            b'(' => {
                depth += 1;
                pos += 1;
            },
            b')' => {
                depth -= 1;
                pos += 1;
            },
            _ => pos += 1,
        }
    }

    if depth != 0 {
        return Err(lex_error(input));
    }

    Ok((&body[pos..], Token::LiteralString(&body[..pos - 1])))
}

/// Parse a hex string. `<<` is a dictionary start, not a hex string.
fn parse_hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    if input.starts_with(b"<<") {
        return Err(lex_error(input));
    }
    delimited(
        char('<'),
        map(
            take_while(|c: u8| c.is_ascii_hexdigit() || c.is_ascii_whitespace()),
            Token::HexString,
        ),
        char('>'),
    )(input)
}

/// Decode `#XX` escape sequences in a name. Invalid sequences are kept literal.
pub fn decode_name_escapes(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '#' {
            result.push(ch);
            continue;
        }
        match (chars.next(), chars.next()) {
            (Some(h1), Some(h2)) => {
                let mut hex = String::with_capacity(2);
                hex.push(h1);
                hex.push(h2);
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    result.push(byte as char);
                } else {
                    result.push('#');
                    result.push(h1);
                    result.push(h2);
                }
            },
            (Some(h1), None) => {
                result.push('#');
                result.push(h1);
            },
            _ => result.push('#'),
        }
    }

    result
}

/// Parse a name token. Empty names are tolerated for malformed input.
fn parse_name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    preceded(
        char('/'),
        map(
            take_while(|c: u8| !is_pdf_whitespace(c) && !is_pdf_delimiter(c)),
            |bytes| {
                let raw = std::str::from_utf8(bytes).unwrap_or("");
                Token::Name(decode_name_escapes(raw))
            },
        ),
    )(input)
}

/// Keywords and delimiters. Order matters: longer keywords before their
/// prefixes (`endstream` before `stream`, `<<` before `<`).
fn parse_keyword(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    alt((
        value(Token::False, tag(b"false")),
        value(Token::True, tag(b"true")),
        value(Token::Null, tag(b"null")),
        value(Token::ObjEnd, tag(b"endobj")),
        value(Token::ObjStart, tag(b"obj")),
        value(Token::StreamEnd, tag(b"endstream")),
        value(Token::StreamStart, tag(b"stream")),
        value(Token::DictStart, tag(b"<<")),
        value(Token::DictEnd, tag(b">>")),
        value(Token::ArrayStart, tag(b"[")),
        value(Token::ArrayEnd, tag(b"]")),
        value(Token::R, tag(b"R")),
    ))(input)
}

/// Parse a single token, skipping leading whitespace and comments.
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (input, _) = skip_ws(input)?;
    alt((
        parse_keyword,
        parse_name,
        parse_number,
        parse_literal_string,
        parse_hex_string,
    ))(input)
}
