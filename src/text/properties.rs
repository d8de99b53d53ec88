//! Lossless `.properties` files.
//!
//! ```ebnf
//! file         = { line };
//! line         = blank | comment | entry;
//! blank        = { ws }, eol;
//! comment      = { ws }, ( "#" | "!" ), { any }, eol;
//! entry        = { ws }, key, separator, value, eol;
//! key          = { escaped | ? not ws, "=", ":" ? };
//! separator    = { ws }, [ "=" | ":" ], { ws };
//! value        = { any | "\" eol };   (* an odd backslash run continues the line *)
//! eol          = "\r\n" | "\n" | "\r" | EOF;
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till},
    character::complete::{anychar, none_of, one_of, space0},
    combinator::{opt, recognize},
    multi::many0,
    sequence::{pair, tuple},
    IResult,
};

use crate::core::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub indent: String,
    /// Key as written, escapes included
    pub key: String,
    /// Whitespace and `=`/`:` between key and value
    pub separator: String,
    /// Value as written, line continuations included
    pub value: String,
    pub eol: String,
    /// Byte offset of the key in the original file
    pub offset: Option<usize>,
}

impl Entry {
    /// Synthesized `key=value` line.
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            indent: String::new(),
            key: key.to_string(),
            separator: "=".to_string(),
            value: value.to_string(),
            eol: "\n".to_string(),
            offset: None,
        }
    }

    /// Same entry under another key.
    pub fn with_key(&self, key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..self.clone()
        }
    }

    /// Logical value: continuations joined, leading whitespace of
    /// continuation lines dropped.
    pub fn value_text(&self) -> String {
        let mut out = String::new();
        let mut lines = self.value.split('\n').peekable();
        let mut first = true;
        while let Some(line) = lines.next() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let line = if first { line } else { line.trim_start() };
            first = false;
            match lines.peek() {
                Some(_) => out.push_str(line.strip_suffix('\\').unwrap_or(line)),
                None => out.push_str(line),
            }
        }
        out
    }
}

/// Comment or blank line kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub text: String,
    pub eol: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Entry(Entry),
    Comment(RawLine),
    Blank(RawLine),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertiesFile {
    pub lines: Vec<Line>,
}

impl PropertiesFile {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut lines = Vec::new();
        let mut rest = input;
        while !rest.is_empty() {
            let offset = input.len() - rest.len();
            let (next, (content, eol)) = logical_line(rest)
                .map_err(|e| ParseError::at(input, offset, format!("malformed properties line: {}", e)))?;
            if next.len() == rest.len() {
                return Err(ParseError::at(input, offset, "properties parser made no progress"));
            }
            lines.push(classify(content, eol, offset)?);
            rest = next;
        }
        Ok(Self { lines })
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry(entry) => Some(entry),
            _ => None,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries().find(|entry| entry.key == key)
    }

    pub fn print(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry(entry) => {
                    out.push_str(&entry.indent);
                    out.push_str(&entry.key);
                    out.push_str(&entry.separator);
                    out.push_str(&entry.value);
                    out.push_str(&entry.eol);
                }
                Line::Comment(raw) | Line::Blank(raw) => {
                    out.push_str(&raw.text);
                    out.push_str(&raw.eol);
                }
            }
        }
        out
    }
}

/// A physical line plus the lines it continues onto.
fn logical_line(input: &str) -> IResult<&str, (&str, &str)> {
    let comment = matches!(
        input.trim_start_matches([' ', '\t', '\x0c']).chars().next(),
        Some('#' | '!')
    );
    let mut rest = input;
    loop {
        let (after, line) = take_till(|c| c == '\n' || c == '\r')(rest)?;
        let (after, eol) = opt(alt((tag("\r\n"), tag("\n"), tag("\r"))))(after)?;
        let eol = eol.unwrap_or("");
        if eol.is_empty() || comment || !continues(line) {
            let end = input.len() - after.len() - eol.len();
            return Ok((after, (&input[..end], eol)));
        }
        rest = after;
    }
}

fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn classify(content: &str, eol: &str, offset: usize) -> Result<Line, ParseError> {
    let trimmed = content.trim_start_matches([' ', '\t', '\x0c']);
    let raw = || RawLine {
        text: content.to_string(),
        eol: eol.to_string(),
    };
    if trimmed.is_empty() {
        return Ok(Line::Blank(raw()));
    }
    if trimmed.starts_with('#') || trimmed.starts_with('!') {
        return Ok(Line::Comment(raw()));
    }
    let (_, (indent, key, separator, value)) =
        entry(content).map_err(|e| ParseError::at(content, 0, format!("malformed property: {}", e)))?;
    Ok(Line::Entry(Entry {
        indent: indent.to_string(),
        key: key.to_string(),
        separator: separator.to_string(),
        value: value.to_string(),
        eol: eol.to_string(),
        offset: Some(offset + indent.len()),
    }))
}

fn entry(input: &str) -> IResult<&str, (&str, &str, &str, &str)> {
    let (rest, (indent, key, separator)) = tuple((space0, key, separator))(input)?;
    Ok(("", (indent, key, separator, rest)))
}

fn key(input: &str) -> IResult<&str, &str> {
    recognize(many0(alt((
        recognize(pair(tag("\\"), anychar)),
        recognize(none_of(" \t\x0c=:\\\r\n")),
    ))))(input)
}

fn separator(input: &str) -> IResult<&str, &str> {
    recognize(tuple((space0, opt(one_of("=:")), space0)))(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "# datasource\n\
        spring.datasource.schema=classpath:schema.sql\n\
        \x20 spring.datasource.data : data.sql, \\\n    more.sql\n\
        \n\
        ! legacy\n\
        key.only\n\
        spring.datasource.platform h2\r\n\
        last=value";

    #[test]
    fn test_round_trip() {
        let file = PropertiesFile::parse(SAMPLE).unwrap();
        assert_eq!(file.print(), SAMPLE);
        assert_eq!(file.lines.len(), 8);
    }

    #[test]
    fn test_entries() {
        let file = PropertiesFile::parse(SAMPLE).unwrap();
        let keys: Vec<&str> = file.entries().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "spring.datasource.schema",
                "spring.datasource.data",
                "key.only",
                "spring.datasource.platform",
                "last"
            ]
        );

        let data = file.get("spring.datasource.data").unwrap();
        assert_eq!(data.indent, "  ");
        assert_eq!(data.separator, " : ");
        assert_eq!(data.value_text(), "data.sql, more.sql");
        assert_eq!(data.offset, Some(SAMPLE.find("spring.datasource.data").unwrap()));

        let platform = file.get("spring.datasource.platform").unwrap();
        assert_eq!(platform.separator, " ");
        assert_eq!(platform.value, "h2");
        assert_eq!(platform.eol, "\r\n");

        assert_eq!(file.get("key.only").unwrap().value, "");
    }

    #[test]
    fn test_escaped_key_and_rename() {
        let file = PropertiesFile::parse("a\\=b=c\n").unwrap();
        let entry = file.get("a\\=b").unwrap();
        assert_eq!(entry.value, "c");
        let renamed = entry.with_key("x.y");
        assert_eq!(
            PropertiesFile {
                lines: vec![Line::Entry(renamed)]
            }
            .print(),
            "x.y=c\n"
        );
    }
}
