//! Embedded data island decoding
//!
//! Product pages ship their backing data inside a script node, as a string
//! literal handed to `JSON.parse(...)` somewhere after a sentinel token:
//!
//! ```text
//! <script>Object.defineProperties(window, {'__TGT_DATA__': {value: deepFreeze(JSON.parse("{\"__PRELOADED_QUERIES__\": ...}"))}})</script>
//! ```
//!
//! The literal may be single- or double-quoted and uses JavaScript escapes.
//! Decoding is isolated here so that format churn stays in one place.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::error::{ExtractionError, ExtractionResult};

const DECODE_CALL_PATTERN: &str =
    r#"(?s)JSON\.parse\(\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')\s*\)"#;

/// Locates and decodes the data island behind a sentinel token
#[derive(Debug, Clone)]
pub struct DataIslandDecoder {
    sentinel: String,
    script_selector: Selector,
    decode_call: Regex,
}

impl DataIslandDecoder {
    pub fn new(sentinel: impl Into<String>) -> ExtractionResult<Self> {
        let script_selector =
            Selector::parse("script").map_err(|e| ExtractionError::InvalidSelector {
                selector: "script".to_string(),
                reason: e.to_string(),
            })?;
        let decode_call = Regex::new(DECODE_CALL_PATTERN)
            .map_err(|e| ExtractionError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            sentinel: sentinel.into(),
            script_selector,
            decode_call,
        })
    }

    /// Find the sentinel-bearing script and decode its data argument
    pub fn decode(&self, html: &Html) -> ExtractionResult<Value> {
        let mut found_sentinel = false;

        for script in html.select(&self.script_selector) {
            let source: String = script.text().collect();
            let Some(position) = source.find(&self.sentinel) else {
                continue;
            };
            found_sentinel = true;

            match self.decode_script(&source[position..]) {
                Ok(value) => return Ok(value),
                Err(e) => debug!("Sentinel script did not decode: {}", e),
            }
        }

        if found_sentinel {
            Err(ExtractionError::ArgumentNotFound)
        } else {
            Err(ExtractionError::SentinelMissing {
                sentinel: self.sentinel.clone(),
            })
        }
    }

    /// Decode the first `JSON.parse` string argument in `source`
    pub fn decode_script(&self, source: &str) -> ExtractionResult<Value> {
        let captures = self
            .decode_call
            .captures(source)
            .ok_or(ExtractionError::ArgumentNotFound)?;
        let literal = captures
            .get(1)
            .or_else(|| captures.get(2))
            .ok_or(ExtractionError::ArgumentNotFound)?;

        let json = unescape_js_string(literal.as_str())?;
        serde_json::from_str(&json).map_err(|e| ExtractionError::Decode(e.to_string()))
    }
}

/// Resolve JavaScript string escapes in the body of a quoted literal
pub fn unescape_js_string(literal: &str) -> ExtractionResult<String> {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let (_, escaped) = chars
            .next()
            .ok_or(ExtractionError::MalformedEscape { offset })?;

        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // line continuation, LF or CRLF
            '\n' => {}
            '\r' => {
                if chars.peek().is_some_and(|&(_, next)| next == '\n') {
                    chars.next();
                }
            }
            'x' => {
                let code = take_hex(&mut chars, 2).ok_or(ExtractionError::MalformedEscape { offset })?;
                out.push(char::from_u32(code).ok_or(ExtractionError::MalformedEscape { offset })?);
            }
            'u' => {
                let code = take_unicode_escape(&mut chars)
                    .ok_or(ExtractionError::MalformedEscape { offset })?;
                push_code_unit(&mut out, code, &mut chars);
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

type CharStream<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn take_hex(chars: &mut CharStream<'_>, len: usize) -> Option<u32> {
    let mut code = 0u32;
    for _ in 0..len {
        let (_, c) = chars.next()?;
        code = code * 16 + c.to_digit(16)?;
    }
    Some(code)
}

/// `XXXX` or `{X...}` after `\u`
fn take_unicode_escape(chars: &mut CharStream<'_>) -> Option<u32> {
    if chars.peek().is_some_and(|(_, c)| *c == '{') {
        chars.next();
        let mut code = 0u32;
        loop {
            let (_, c) = chars.next()?;
            if c == '}' {
                return Some(code);
            }
            code = code.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
        }
    }
    take_hex(chars, 4)
}

/// Push a UTF-16 code unit, pairing surrogates when the low half follows
fn push_code_unit(out: &mut String, code: u32, chars: &mut CharStream<'_>) {
    if (0xD800..0xDC00).contains(&code) {
        let mut lookahead = chars.clone();
        let low = match (lookahead.next(), lookahead.next()) {
            (Some((_, '\\')), Some((_, 'u'))) => take_hex(&mut lookahead, 4),
            _ => None,
        };
        if let Some(low) = low.filter(|low| (0xDC00..0xE000).contains(low)) {
            *chars = lookahead;
            let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
            out.push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
            return;
        }
    }
    out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
}
