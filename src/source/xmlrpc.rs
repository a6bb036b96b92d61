//! Minimal XML-RPC codec
//!
//! Koji hubs speak plain XML-RPC. This module covers the subset the hub
//! calls need: scalar values, arrays and structs, request encoding and
//! response/fault decoding. Built directly on `quick-xml` events.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

use crate::source::SourceError;

/// An XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Struct(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Struct member lookup; `None` for non-structs and missing keys.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Struct(members) => members.get(name),
            _ => None,
        }
    }
}

/// Encode a `methodCall` document.
pub fn write_request(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        write_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

fn write_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Nil => out.push_str("<nil/>"),
        Value::Bool(b) => {
            out.push_str(if *b {
                "<boolean>1</boolean>"
            } else {
                "<boolean>0</boolean>"
            });
        }
        Value::Int(i) => {
            out.push_str("<int>");
            out.push_str(&i.to_string());
            out.push_str("</int>");
        }
        Value::Double(d) => {
            out.push_str("<double>");
            out.push_str(&d.to_string());
            out.push_str("</double>");
        }
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

/// Decode a `methodResponse` document into its single result value. A
/// `<fault>` response surfaces as [`SourceError::Fault`].
pub fn parse_response(xml: &str) -> Result<Value, SourceError> {
    let mut parser = Parser {
        reader: Reader::from_str(xml),
    };

    parser.expect_start("methodResponse")?;
    match parser.next_meaningful()? {
        Event::Start(tag) if tag.name().as_ref() == b"params" => {
            parser.expect_start("param")?;
            parser.expect_start("value")?;
            let value = parser.parse_value()?;
            parser.expect_end("param")?;
            parser.expect_end("params")?;
            Ok(value)
        }
        Event::Start(tag) if tag.name().as_ref() == b"fault" => {
            parser.expect_start("value")?;
            let fault = parser.parse_value()?;
            let code = match fault.get("faultCode") {
                Some(Value::Int(code)) => *code as i32,
                _ => 0,
            };
            let message = fault
                .get("faultString")
                .and_then(Value::as_str)
                .unwrap_or("unknown fault")
                .to_string();
            Err(SourceError::Fault { code, message })
        }
        other => Err(malformed(format!("unexpected event {other:?}"))),
    }
}

fn malformed(detail: String) -> SourceError {
    SourceError::InvalidResponse(format!("XML-RPC: {detail}"))
}

struct Parser<'a> {
    reader: Reader<&'a [u8]>,
}

impl Parser<'_> {
    /// Next event that is not markup noise (declaration, comment,
    /// whitespace between elements).
    fn next_meaningful(&mut self) -> Result<Event<'static>, SourceError> {
        loop {
            let event = self
                .reader
                .read_event()
                .map_err(|e| malformed(e.to_string()))?;
            match event {
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Text(ref text) if text.iter().all(u8::is_ascii_whitespace) => {}
                other => return Ok(other.into_owned()),
            }
        }
    }

    fn expect_start(&mut self, name: &str) -> Result<(), SourceError> {
        match self.next_meaningful()? {
            Event::Start(tag) if tag.name().as_ref() == name.as_bytes() => Ok(()),
            other => Err(malformed(format!("expected <{name}>, got {other:?}"))),
        }
    }

    fn expect_end(&mut self, name: &str) -> Result<(), SourceError> {
        match self.next_meaningful()? {
            Event::End(tag) if tag.name().as_ref() == name.as_bytes() => Ok(()),
            other => Err(malformed(format!("expected </{name}>, got {other:?}"))),
        }
    }

    /// Collect character data up to `</name>`.
    fn read_text(&mut self, name: &str) -> Result<String, SourceError> {
        let mut text = String::new();
        loop {
            match self
                .reader
                .read_event()
                .map_err(|e| malformed(e.to_string()))?
            {
                Event::Text(t) => {
                    text.push_str(&t.unescape().map_err(|e| malformed(e.to_string()))?);
                }
                Event::End(tag) if tag.name().as_ref() == name.as_bytes() => return Ok(text),
                other => return Err(malformed(format!("unexpected {other:?} in <{name}>"))),
            }
        }
    }

    /// Parse the contents of a `<value>` element, consuming the closing
    /// `</value>` tag. The opening tag has already been consumed.
    fn parse_value(&mut self) -> Result<Value, SourceError> {
        let value = match self.next_meaningful()? {
            // Untyped content defaults to string
            Event::Text(text) => {
                let value = Value::String(
                    text.unescape()
                        .map_err(|e| malformed(e.to_string()))?
                        .into_owned(),
                );
                return match self.next_meaningful()? {
                    Event::End(tag) if tag.name().as_ref() == b"value" => Ok(value),
                    other => Err(malformed(format!("expected </value>, got {other:?}"))),
                };
            }
            Event::End(tag) if tag.name().as_ref() == b"value" => {
                return Ok(Value::String(String::new()));
            }
            Event::Empty(tag) => match tag.name().as_ref() {
                b"nil" => Value::Nil,
                b"string" => Value::String(String::new()),
                name => {
                    return Err(malformed(format!(
                        "unexpected empty element {:?}",
                        String::from_utf8_lossy(name)
                    )));
                }
            },
            Event::Start(tag) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                match name.as_str() {
                    "string" => Value::String(self.read_text("string")?),
                    "int" | "i4" | "i8" => {
                        let text = self.read_text(&name)?;
                        Value::Int(
                            text.trim()
                                .parse()
                                .map_err(|_| malformed(format!("bad integer {text:?}")))?,
                        )
                    }
                    "boolean" => {
                        let text = self.read_text("boolean")?;
                        match text.trim() {
                            "1" | "true" => Value::Bool(true),
                            "0" | "false" => Value::Bool(false),
                            other => return Err(malformed(format!("bad boolean {other:?}"))),
                        }
                    }
                    "double" => {
                        let text = self.read_text("double")?;
                        Value::Double(
                            text.trim()
                                .parse()
                                .map_err(|_| malformed(format!("bad double {text:?}")))?,
                        )
                    }
                    // Opaque scalar types are carried as their text form
                    "dateTime.iso8601" | "base64" => Value::String(self.read_text(&name)?),
                    "nil" => {
                        self.expect_end("nil")?;
                        Value::Nil
                    }
                    "array" => {
                        let mut items = Vec::new();
                        self.expect_start("data")?;
                        loop {
                            match self.next_meaningful()? {
                                Event::Start(tag) if tag.name().as_ref() == b"value" => {
                                    items.push(self.parse_value()?);
                                }
                                Event::End(tag) if tag.name().as_ref() == b"data" => break,
                                other => {
                                    return Err(malformed(format!(
                                        "unexpected {other:?} in array"
                                    )));
                                }
                            }
                        }
                        self.expect_end("array")?;
                        Value::Array(items)
                    }
                    "struct" => {
                        let mut members = BTreeMap::new();
                        loop {
                            match self.next_meaningful()? {
                                Event::Start(tag) if tag.name().as_ref() == b"member" => {
                                    self.expect_start("name")?;
                                    let key = self.read_text("name")?;
                                    self.expect_start("value")?;
                                    let member = self.parse_value()?;
                                    self.expect_end("member")?;
                                    members.insert(key, member);
                                }
                                Event::End(tag) if tag.name().as_ref() == b"struct" => break,
                                other => {
                                    return Err(malformed(format!(
                                        "unexpected {other:?} in struct"
                                    )));
                                }
                            }
                        }
                        Value::Struct(members)
                    }
                    other => return Err(malformed(format!("unknown value type {other:?}"))),
                }
            }
            other => return Err(malformed(format!("unexpected {other:?} in <value>"))),
        };

        self.expect_end("value")?;
        Ok(value)
    }
}
