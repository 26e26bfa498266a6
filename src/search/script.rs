//! Reader and writer for the JavaScript literal subset Doxygen emits.
//!
//! Doxygen search scripts are plain variable assignments:
//!
//! ```text
//! var searchData=
//! [
//!   ['reboot',['reboot',['../classbfl_1_1FilteringAlgorithm.html#a60...',1,'bfl::FilteringAlgorithm']]],
//! ];
//! ```
//!
//! and `searchdata.js` assigns objects keyed by section number. The reader
//! understands strings, integers, booleans, arrays, objects and comments,
//! nothing more.

use super::index::{IndexBuilder, ParseReport, SearchIndex};
use super::model::{Anchor, LinkTarget, Occurrence, SearchEntry};
use crate::error::{ParseError, ScriptError};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::Chars;

/// Variable holding the entry table in every `<section>_<n>.js` file.
pub const SEARCH_DATA_VAR: &str = "searchData";

/// A literal value from a search script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Value)]> {
        match self {
            Self::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Numeric view, with booleans read as `0`/`1`.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }
}

/// A parsed script: its top-level `var` assignments in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    variables: Vec<(String, Value)>,
}

impl Script {
    pub fn parse(source: &str) -> Result<Self, ScriptError> {
        Reader::new(source).script()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables
            .iter()
            .find(|(var, _)| var == name)
            .map(|(_, value)| value)
    }
}

/// Character reader with line/column tracking.
struct Reader<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Reader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<(), ScriptError> {
        self.skip_trivia()?;
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected `{}`, found `{}`", expected, c))),
            None => Err(self.error(format!("expected `{}`, found end of input", expected))),
        }
    }

    /// Skips whitespace and comments.
    fn skip_trivia(&mut self) -> Result<(), ScriptError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.next() {
                        Some('/') => {
                            while let Some(c) = self.bump() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            self.bump();
                            self.bump();
                            let mut star = false;
                            loop {
                                match self.bump() {
                                    Some('/') if star => break,
                                    Some(c) => star = c == '*',
                                    None => return Err(self.error("unterminated comment")),
                                }
                            }
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn script(mut self) -> Result<Script, ScriptError> {
        let mut variables = Vec::new();

        loop {
            self.skip_trivia()?;
            if self.peek().is_none() {
                break;
            }

            let keyword = self.identifier()?;
            if !matches!(keyword.as_str(), "var" | "let" | "const") {
                return Err(self.error(format!("expected `var`, found `{}`", keyword)));
            }
            self.skip_trivia()?;
            let name = self.identifier()?;
            self.expect('=')?;
            let value = self.value()?;

            self.skip_trivia()?;
            if self.peek() == Some(';') {
                self.bump();
            }
            variables.push((name, value));
        }

        Ok(Script { variables })
    }

    fn identifier(&mut self) -> Result<String, ScriptError> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected identifier, found `{}`", c)),
                None => self.error("expected identifier, found end of input"),
            });
        }
        Ok(ident)
    }

    fn value(&mut self) -> Result<Value, ScriptError> {
        self.skip_trivia()?;
        match self.peek() {
            Some('[') => self.array(),
            Some('{') => self.object(),
            Some(quote @ ('\'' | '"')) => self.string(quote).map(Value::Str),
            Some(c) if c == '-' || c.is_ascii_digit() => self.integer().map(Value::Int),
            Some(c) if c.is_alphabetic() => match self.identifier()?.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                other => Err(self.error(format!("unexpected identifier `{}`", other))),
            },
            Some(c) => Err(self.error(format!("unexpected `{}`", c))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn array(&mut self) -> Result<Value, ScriptError> {
        self.expect('[')?;
        let mut items = Vec::new();

        loop {
            self.skip_trivia()?;
            if self.peek() == Some(']') {
                self.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);

            self.skip_trivia()?;
            match self.bump() {
                Some(',') => {}
                Some(']') => return Ok(Value::Array(items)),
                Some(c) => return Err(self.error(format!("expected `,` or `]`, found `{}`", c))),
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    fn object(&mut self) -> Result<Value, ScriptError> {
        self.expect('{')?;
        let mut fields = Vec::new();

        loop {
            self.skip_trivia()?;
            let key = match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(fields));
                }
                Some(quote @ ('\'' | '"')) => self.string(quote)?,
                Some(c) if c.is_ascii_digit() => self.integer()?.to_string(),
                Some(_) => self.identifier()?,
                None => return Err(self.error("unterminated object")),
            };
            self.expect(':')?;
            fields.push((key, self.value()?));

            self.skip_trivia()?;
            match self.bump() {
                Some(',') => {}
                Some('}') => return Ok(Value::Object(fields)),
                Some(c) => return Err(self.error(format!("expected `,` or `}}`, found `{}`", c))),
                None => return Err(self.error("unterminated object")),
            }
        }
    }

    fn integer(&mut self) -> Result<i64, ScriptError> {
        let mut digits = String::new();
        if self.peek() == Some('-') {
            digits.push('-');
            self.bump();
        }
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            digits.push(c);
            self.bump();
        }
        digits
            .parse()
            .map_err(|_| self.error(format!("invalid integer `{}`", digits)))
    }

    fn string(&mut self, quote: char) -> Result<String, ScriptError> {
        self.bump();
        let mut text = String::new();

        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(text),
                Some('\\') => text.push(self.escape()?),
                Some('\n') | None => return Err(self.error("unterminated string")),
                Some(c) => text.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char, ScriptError> {
        let c = self
            .bump()
            .ok_or_else(|| self.error("unterminated escape"))?;
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'x' => self.hex_escape(2)?,
            'u' => self.hex_escape(4)?,
            other => other,
        })
    }

    fn hex_escape(&mut self, len: usize) -> Result<char, ScriptError> {
        let mut code = 0u32;
        for _ in 0..len {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid hex escape"))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| self.error("invalid character code"))
    }
}

/// Reads the `searchData` table of one section file.
///
/// Elements that do not have the `[key, [label, [url, flag, scope], ...]]`
/// shape are skipped and counted in the report.
pub fn parse_search_data(source: &str) -> Result<(SearchIndex, ParseReport), ParseError> {
    let script = Script::parse(source)?;
    let mut builder = IndexBuilder::default();
    read_search_data(&script, &mut builder)?;
    Ok(builder.finish())
}

/// Feeds the `searchData` table of a parsed script into a builder.
pub fn read_search_data(script: &Script, builder: &mut IndexBuilder) -> Result<(), ParseError> {
    let table = script
        .get(SEARCH_DATA_VAR)
        .ok_or_else(|| ParseError::MissingVariable(SEARCH_DATA_VAR.to_string()))?
        .as_array()
        .ok_or_else(|| ParseError::Shape {
            variable: SEARCH_DATA_VAR.to_string(),
            expected: "an array",
        })?;

    for (position, element) in table.iter().enumerate() {
        match entry_from_value(element) {
            Some(entry) => builder.push(entry),
            None => {
                tracing::warn!("Skipping malformed search entry #{}: {:?}", position, element);
                builder.skip();
            }
        }
    }

    Ok(())
}

fn entry_from_value(value: &Value) -> Option<SearchEntry> {
    let [key, body] = value.as_array()? else {
        return None;
    };
    let (label, occurrences) = body.as_array()?.split_first()?;

    let occurrences = occurrences
        .iter()
        .map(occurrence_from_value)
        .collect::<Option<Vec<_>>>()?;

    SearchEntry::new(key.as_str()?, label.as_str()?, occurrences)
}

fn occurrence_from_value(value: &Value) -> Option<Occurrence> {
    let parts = value.as_array()?;
    let url = parts.first()?.as_str()?;
    let target = match parts.get(1) {
        Some(flag) => LinkTarget::from_flag(flag.as_int()?),
        None => LinkTarget::Parent,
    };
    let scope = match parts.get(2) {
        Some(scope) => scope.as_str()?,
        None => "",
    };
    if url.is_empty() || parts.len() > 3 {
        return None;
    }
    Some(Occurrence::new(Anchor::parse(url), target, scope))
}

/// Writes a table in the layout Doxygen uses for section files.
pub fn write_search_data(index: &SearchIndex) -> String {
    let mut out = String::from("var searchData=\n[\n");
    let count = index.len();

    for (position, entry) in index.iter().enumerate() {
        out.push_str("  [");
        push_quoted(&mut out, &entry.key);
        out.push_str(",[");
        push_quoted(&mut out, &entry.label);
        for occurrence in &entry.occurrences {
            out.push_str(",[");
            push_quoted(&mut out, &occurrence.anchor.to_url());
            let _ = write!(out, ",{},", occurrence.target.flag());
            push_quoted(&mut out, &occurrence.scope);
            out.push(']');
        }
        out.push_str("]]");
        if position + 1 < count {
            out.push(',');
        }
        out.push('\n');
    }

    out.push_str("];\n");
    out
}

fn push_quoted(out: &mut String, text: &str) {
    out.push('\'');
    for c in text.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
}

/// Section metadata from `searchdata.js`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionInfo {
    /// Position in Doxygen's section list.
    pub id: u32,
    /// File prefix, e.g. `all` or `functions`.
    pub name: String,
    /// Human-readable tab label, e.g. `Functions`.
    pub label: String,
    /// Initial characters that have a file in this section.
    pub initials: String,
}

const SECTION_NAMES_VAR: &str = "indexSectionNames";
const SECTION_LABELS_VAR: &str = "indexSectionLabels";
const SECTION_CONTENT_VAR: &str = "indexSectionsWithContent";

/// Reads section metadata from `searchdata.js`, ordered by section id.
pub fn parse_section_data(source: &str) -> Result<Vec<SectionInfo>, ParseError> {
    let script = Script::parse(source)?;

    let names = section_object(&script, SECTION_NAMES_VAR)?
        .ok_or_else(|| ParseError::MissingVariable(SECTION_NAMES_VAR.to_string()))?;
    let labels = section_object(&script, SECTION_LABELS_VAR)?.unwrap_or_default();
    let content = section_object(&script, SECTION_CONTENT_VAR)?.unwrap_or_default();

    let mut sections: Vec<SectionInfo> = names
        .into_iter()
        .map(|(id, name)| {
            let label = lookup(&labels, id).unwrap_or_else(|| capitalize(&name));
            let initials = lookup(&content, id).unwrap_or_default();
            SectionInfo {
                id,
                name,
                label,
                initials,
            }
        })
        .collect();
    sections.sort_by_key(|section| section.id);

    Ok(sections)
}

fn section_object(script: &Script, variable: &str) -> Result<Option<Vec<(u32, String)>>, ParseError> {
    let Some(value) = script.get(variable) else {
        return Ok(None);
    };
    let shape = || ParseError::Shape {
        variable: variable.to_string(),
        expected: "an object of numbered strings",
    };

    value
        .as_object()
        .ok_or_else(shape)?
        .iter()
        .map(|(id, text)| {
            let id: u32 = id.parse().map_err(|_| shape())?;
            let text = text.as_str().ok_or_else(shape)?;
            Ok((id, text.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn lookup(fields: &[(u32, String)], id: u32) -> Option<String> {
    fields
        .iter()
        .find(|(field_id, _)| *field_id == id)
        .map(|(_, text)| text.clone())
}

pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    const SAMPLE: &str = r"var searchData=
[
  ['reboot',['reboot',['../classbfl_1_1FilteringAlgorithm.html#a6022859aa985474fb997343cc935b11e',1,'bfl::FilteringAlgorithm']]],
  ['resampling_2ecpp',['Resampling.cpp',['../Resampling_8cpp.html',1,'']]],
  ['run',['run',['../classbfl_1_1FilteringAlgorithm.html#a009cbe5f4bbb16967f6c6ddcaed8fbb1',1,'bfl::FilteringAlgorithm::run()'],['../classbfl_1_1FilteringContext.html#ae231d933d38221f3505c7dcaef4d853a',1,'bfl::FilteringContext::run()']]]
];";

    #[test]
    fn test_parse_search_data() {
        let_assert!(Ok((index, report)) = parse_search_data(SAMPLE));
        check!(index.len() == 3);
        check!(report.entries == 3);
        check!(report.skipped == 0);

        let_assert!(Some(run) = index.get("run"));
        check!(run.label == "run");
        check!(run.occurrences.len() == 2);
        check!(run.occurrences[0].scope == "bfl::FilteringAlgorithm::run()");
        check!(run.occurrences[1].scope == "bfl::FilteringContext::run()");
        check!(run.occurrences[1].target == LinkTarget::Parent);
    }

    #[test]
    fn test_round_trip_preserves_mapping() {
        let_assert!(Ok((index, _)) = parse_search_data(SAMPLE));
        let written = write_search_data(&index);
        let_assert!(Ok((reparsed, _)) = parse_search_data(&written));
        check!(reparsed == index);
    }

    #[test]
    fn test_writer_escapes_quotes() {
        let source = r"var searchData=[['it_27s',['it\'s',['../a.html#x',0,'back\\slash']]]];";
        let_assert!(Ok((index, _)) = parse_search_data(source));
        let_assert!(Some(entry) = index.get("it_27s"));
        check!(entry.label == "it's");
        check!(entry.occurrences[0].scope == "back\\slash");
        check!(entry.occurrences[0].target == LinkTarget::Blank);

        let written = write_search_data(&index);
        check!(written.contains(r"'it\'s'"));
        check!(written.contains(r"'back\\slash'"));
        let_assert!(Ok((reparsed, _)) = parse_search_data(&written));
        check!(reparsed == index);
    }

    #[rstest]
    #[case("['lonely']")]
    #[case("['nolabel',[]]")]
    #[case("['nooccurrence',['label']]")]
    #[case("['',['label',['../a.html',1,'']]]")]
    #[case("['badflag',['label',['../a.html','x','']]]")]
    #[case("42")]
    fn test_malformed_entries_are_skipped(#[case] element: &str) {
        let source = format!(
            "var searchData=[{},['ok',['ok',['../ok.html#a',1,'']]]];",
            element
        );
        let_assert!(Ok((index, report)) = parse_search_data(&source));
        check!(index.len() == 1);
        check!(index.get("ok").is_some());
        check!(report.skipped == 1);
    }

    #[test]
    fn test_missing_scope_defaults_to_empty() {
        let source = "var searchData=[['x',['x',['../x.html']]]];";
        let_assert!(Ok((index, _)) = parse_search_data(source));
        let_assert!(Some(entry) = index.get("x"));
        check!(entry.occurrences[0].scope.is_empty());
        check!(entry.occurrences[0].target == LinkTarget::Parent);
    }

    #[test]
    fn test_missing_variable() {
        let result = parse_search_data("var somethingElse=[];");
        check!(result == Err(ParseError::MissingVariable("searchData".to_string())));
    }

    #[test]
    fn test_wrong_shape() {
        let_assert!(Err(ParseError::Shape { variable, .. }) = parse_search_data("var searchData={};"));
        check!(variable == "searchData");
    }

    #[rstest]
    #[case("var searchData=[['a'", 1)]
    #[case("var searchData=\n[\n  ['a' 'b']\n];", 3)]
    #[case("searchData=[];", 1)]
    #[case("var searchData=['unterminated];", 1)]
    fn test_syntax_errors_report_line(#[case] source: &str, #[case] line: usize) {
        let_assert!(Err(ParseError::Syntax(error)) = parse_search_data(source));
        check!(error.line == line);
    }

    #[test]
    fn test_comments_and_trailing_commas() {
        let source = "// generated\n/* block\n comment */ var searchData = [\n ['a',['A',['../a.html',1,'']],],\n];";
        let_assert!(Ok((index, _)) = parse_search_data(source));
        check!(index.len() == 1);
    }

    #[test]
    fn test_parse_section_data() {
        let source = r#"var indexSectionsWithContent =
{
  0: "_abcdefghilmnoprstuvw~",
  1: "abcdefghiklmnoprsuvw",
  2: "b"
};

var indexSectionNames =
{
  0: "all",
  1: "classes",
  2: "namespaces"
};

var indexSectionLabels =
{
  0: "All",
  1: "Classes",
  2: "Namespaces"
};
"#;
        let_assert!(Ok(sections) = parse_section_data(source));
        check!(sections.len() == 3);
        check!(sections[0].name == "all");
        check!(sections[0].label == "All");
        check!(sections[0].initials.starts_with("_abc"));
        check!(sections[2].name == "namespaces");
        check!(sections[2].initials == "b");
    }

    #[test]
    fn test_section_labels_default_to_capitalized_names() {
        let source = "var indexSectionNames = { 1: 'functions', 0: 'all' };";
        let_assert!(Ok(sections) = parse_section_data(source));
        check!(sections[0].name == "all");
        check!(sections[0].label == "All");
        check!(sections[1].label == "Functions");
        check!(sections[1].initials.is_empty());
    }
}
