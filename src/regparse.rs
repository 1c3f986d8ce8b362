// regparse.rs - Pattern parser.
//
// Recursive descent over the pattern's characters. Nodes are appended to the
// `Ast` bottom-up, so the node created last is the root.
//
//   alt    := concat ('|' concat)*
//   concat := (repeat | '$')+
//   repeat := atom ('*' | '+' | '?' | interval)*
//   atom   := char | '.' | class | '(' alt ')' | escape

use memchr::memchr;

use crate::error::RegexError;
use crate::regast::{Ast, Node, SetNode};
use crate::regint::{CompileConfig, NodeId, SyntaxOptions};

// === Predefined Classes ===

const DIGIT_RANGES: &[(char, char)] = &[('0', '9')];
const WORD_RANGES: &[(char, char)] = &[('0', '9'), ('A', 'Z'), ('_', '_'), ('a', 'z')];
const SPACE_RANGES: &[(char, char)] = &[('\t', '\r'), (' ', ' ')];

fn char_succ(c: char) -> Option<char> {
    match c {
        '\u{D7FF}' => Some('\u{E000}'),
        char::MAX => None,
        _ => char::from_u32(c as u32 + 1),
    }
}

fn char_pred(c: char) -> Option<char> {
    match c {
        '\u{E000}' => Some('\u{D7FF}'),
        '\0' => None,
        _ => char::from_u32(c as u32 - 1),
    }
}

/// Complement of a sorted, non-overlapping range list over the whole `char` space.
fn complement_ranges(ranges: &[(char, char)]) -> Vec<(char, char)> {
    let mut out = Vec::with_capacity(ranges.len() + 1);
    let mut next = Some('\0');
    for &(low, high) in ranges {
        if let Some(start) = next {
            if start < low {
                if let Some(end) = char_pred(low) {
                    out.push((start, end));
                }
            }
        }
        next = char_succ(high);
    }
    if let Some(start) = next {
        out.push((start, char::MAX));
    }
    out
}

/// A class escape (`\d`, `\W`, ...) as a list of ranges.
fn class_escape_ranges(c: char) -> Option<Vec<(char, char)>> {
    let (base, negated) = match c {
        'd' => (DIGIT_RANGES, false),
        'D' => (DIGIT_RANGES, true),
        'w' => (WORD_RANGES, false),
        'W' => (WORD_RANGES, true),
        's' => (SPACE_RANGES, false),
        'S' => (SPACE_RANGES, true),
        _ => return None,
    };
    Some(if negated {
        complement_ranges(base)
    } else {
        base.to_vec()
    })
}

fn control_escape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        'f' => Some('\u{0C}'),
        'v' => Some('\u{0B}'),
        '0' => Some('\0'),
        'a' => Some('\u{07}'),
        'e' => Some('\u{1B}'),
        _ => None,
    }
}

/// Result of reading one escape sequence.
enum Escape {
    Char(char),
    Class(Vec<(char, char)>),
}

struct Parser<'p> {
    pattern: &'p str,
    chars: Vec<(usize, char)>,
    pos: usize,
    ast: Ast,
    options: SyntaxOptions,
    depth: u32,
    depth_limit: u32,
}

impl<'p> Parser<'p> {
    fn new(pattern: &'p str, config: &CompileConfig) -> Self {
        Parser {
            pattern,
            chars: pattern.char_indices().collect(),
            pos: 0,
            ast: Ast::new(),
            options: config.options,
            depth: 0,
            depth_limit: config.parse_depth_limit,
        }
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.pattern.len(), |&(off, _)| off)
    }

    fn error(&self, message: &str) -> RegexError {
        RegexError::syntax(self.offset(), message)
    }

    /// Group depth plus `extra` nested operators must stay within the limit.
    fn check_depth(&self, extra: u32) -> Result<(), RegexError> {
        if self.depth.saturating_add(extra) > self.depth_limit {
            return Err(RegexError::ParseDepthLimitOver);
        }
        Ok(())
    }

    fn peek_raw(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_raw()?;
        self.pos += 1;
        Some(c)
    }

    /// Skip whitespace and `#` comments in extended mode.
    fn skip_trivia(&mut self) {
        if !self.options.contains(SyntaxOptions::EXTENDED) {
            return;
        }
        while let Some(c) = self.peek_raw() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '#' {
                let from = self.offset();
                match memchr(b'\n', &self.pattern.as_bytes()[from..]) {
                    Some(nl) => {
                        let end = from + nl;
                        while self.chars.get(self.pos).is_some_and(|&(off, _)| off <= end) {
                            self.pos += 1;
                        }
                    }
                    None => self.pos = self.chars.len(),
                }
            } else {
                break;
            }
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_trivia();
        self.peek_raw()
    }

    fn parse(mut self) -> Result<Ast, RegexError> {
        if self.options.contains(SyntaxOptions::LITERAL) {
            return self.parse_literal();
        }
        if self.peek().is_none() {
            return Err(self.error("empty pattern"));
        }
        self.parse_alt()?;
        match self.peek() {
            None => Ok(self.ast),
            Some(')') => Err(self.error("unmatched close parenthesis")),
            Some(_) => Err(self.error("unexpected character")),
        }
    }

    fn parse_literal(mut self) -> Result<Ast, RegexError> {
        let mut acc: Option<NodeId> = None;
        while let Some(c) = self.bump() {
            let node = self.ast.char(c);
            acc = Some(match acc {
                Some(left) => self.ast.concat(left, node),
                None => node,
            });
        }
        match acc {
            Some(_) => Ok(self.ast),
            None => Err(self.error("empty pattern")),
        }
    }

    fn parse_alt(&mut self) -> Result<NodeId, RegexError> {
        let mut left = self.parse_concat()?;
        while self.peek() == Some('|') {
            self.bump();
            let right = self.parse_concat()?;
            left = self.ast.alternate(left, right);
        }
        Ok(left)
    }

    fn parse_concat(&mut self) -> Result<NodeId, RegexError> {
        let mut acc: Option<NodeId> = None;
        let mut anchors = 0;
        loop {
            match self.peek() {
                None | Some('|') | Some(')') => break,
                Some('$') => {
                    // Each `$` wraps the whole sequence so far.
                    anchors += 1;
                    self.check_depth(anchors)?;
                    self.bump();
                    acc = Some(self.ast.end_of_string(acc));
                    if matches!(self.peek(), Some('*' | '+' | '?')) || self.at_interval() {
                        return Err(self.error("target of repeat operator is invalid"));
                    }
                }
                Some(_) => {
                    let item = self.parse_repeat()?;
                    acc = Some(match acc {
                        Some(left) => self.ast.concat(left, item),
                        None => item,
                    });
                }
            }
        }
        acc.ok_or_else(|| self.error("empty alternative"))
    }

    fn parse_repeat(&mut self) -> Result<NodeId, RegexError> {
        let mut node = self.parse_atom()?;
        let mut stacked = 0;
        loop {
            if matches!(self.peek(), Some('*' | '+' | '?')) || self.at_interval() {
                stacked += 1;
                self.check_depth(stacked)?;
            }
            match self.peek() {
                Some('*') => {
                    self.bump();
                    node = self.ast.star(node);
                }
                Some('+') => {
                    self.bump();
                    node = self.ast.plus(node);
                }
                Some('?') => {
                    self.bump();
                    node = self.ast.ques(node);
                }
                Some('{') => match self.parse_interval()? {
                    Some((min, max)) => node = self.ast.range(node, min, max),
                    None => break,
                },
                _ => break,
            }
        }
        Ok(node)
    }

    fn at_interval(&mut self) -> bool {
        if self.peek() != Some('{') {
            return false;
        }
        let saved = self.pos;
        let found = matches!(self.parse_interval(), Ok(Some(_)));
        self.pos = saved;
        found
    }

    fn parse_number(&mut self) -> Result<Option<u32>, RegexError> {
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(d) = self.peek_raw().and_then(|c| c.to_digit(10)) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(d))
                .ok_or_else(|| self.error("too big number for repeat range"))?;
            self.pos += 1;
        }
        Ok((self.pos > start).then_some(value))
    }

    /// `{n}`, `{n,}` or `{n,m}`. Returns `None` (and consumes nothing) when
    /// the brace does not start a valid interval, so it reads as a literal.
    fn parse_interval(&mut self) -> Result<Option<(u32, Option<u32>)>, RegexError> {
        let saved = self.pos;
        let brace_offset = self.offset();
        self.bump();

        let Some(min) = self.parse_number()? else {
            self.pos = saved;
            return Ok(None);
        };
        let max = match self.bump() {
            Some('}') => return Ok(Some((min, Some(min)))),
            Some(',') => self.parse_number()?,
            _ => {
                self.pos = saved;
                return Ok(None);
            }
        };
        if self.bump() != Some('}') {
            self.pos = saved;
            return Ok(None);
        }
        if let Some(max) = max {
            if max < min {
                return Err(RegexError::syntax(
                    brace_offset,
                    "upper bound must be equal to or greater than lower bound",
                ));
            }
        }
        Ok(Some((min, max)))
    }

    fn parse_atom(&mut self) -> Result<NodeId, RegexError> {
        let Some(c) = self.peek() else {
            return Err(self.error("unexpected end of pattern"));
        };
        match c {
            '*' | '+' | '?' => Err(self.error("target of repeat operator is not specified")),
            '{' if self.at_interval() => {
                Err(self.error("target of repeat operator is not specified"))
            }
            '(' => self.parse_group(),
            '[' => {
                self.bump();
                self.parse_class()
            }
            '.' => {
                self.bump();
                let mut set = SetNode::new(false);
                set.add_char('\n');
                Ok(self.ast.set(set))
            }
            '\\' => {
                self.bump();
                match self.parse_escape()? {
                    Escape::Char(c) => Ok(self.ast.char(c)),
                    Escape::Class(ranges) => {
                        let mut set = SetNode::new(true);
                        for (low, high) in ranges {
                            set.add_range(low, high);
                        }
                        Ok(self.ast.set(set))
                    }
                }
            }
            _ => {
                self.bump();
                Ok(self.ast.char(c))
            }
        }
    }

    fn parse_group(&mut self) -> Result<NodeId, RegexError> {
        self.depth += 1;
        self.check_depth(0)?;
        let open = self.offset();
        self.bump();
        if self.peek() == Some(')') {
            return Err(self.error("empty group"));
        }
        let node = self.parse_alt()?;
        if self.peek() != Some(')') {
            return Err(RegexError::syntax(
                open,
                "end pattern with unmatched parenthesis",
            ));
        }
        self.bump();
        self.depth -= 1;
        Ok(node)
    }

    fn parse_escape(&mut self) -> Result<Escape, RegexError> {
        let Some(c) = self.bump() else {
            return Err(self.error("end pattern at escape"));
        };
        if let Some(ranges) = class_escape_ranges(c) {
            return Ok(Escape::Class(ranges));
        }
        if let Some(ctrl) = control_escape(c) {
            return Ok(Escape::Char(ctrl));
        }
        match c {
            'x' => self.parse_hex_escape().map(Escape::Char),
            c if c.is_ascii_alphanumeric() => {
                self.pos -= 1;
                Err(self.error("undefined escape sequence"))
            }
            c => Ok(Escape::Char(c)),
        }
    }

    /// `\xHH` or `\x{H...}`.
    fn parse_hex_escape(&mut self) -> Result<char, RegexError> {
        let braced = self.peek_raw() == Some('{');
        if braced {
            self.bump();
        }
        let start = self.offset();
        let mut value: u32 = 0;
        let mut digits = 0;
        while let Some(d) = self.peek_raw().and_then(|c| c.to_digit(16)) {
            if !braced && digits == 2 {
                break;
            }
            value = value
                .checked_mul(16)
                .and_then(|v| v.checked_add(d))
                .ok_or_else(|| self.error("too big wide-char value"))?;
            digits += 1;
            self.pos += 1;
        }
        if digits == 0 || (braced && self.bump() != Some('}')) {
            return Err(RegexError::syntax(start, "invalid code point value"));
        }
        char::from_u32(value).ok_or_else(|| RegexError::syntax(start, "invalid code point value"))
    }

    fn parse_class(&mut self) -> Result<NodeId, RegexError> {
        let open = self.offset();
        let positive = if self.peek_raw() == Some('^') {
            self.bump();
            false
        } else {
            true
        };
        let mut set = SetNode::new(positive);
        let mut first = true;

        loop {
            let Some(c) = self.bump() else {
                return Err(RegexError::syntax(open, "premature end of char-class"));
            };
            let low = match c {
                ']' if !first => break,
                '\\' => match self.parse_escape()? {
                    Escape::Char(c) => c,
                    Escape::Class(ranges) => {
                        for (low, high) in ranges {
                            set.add_range(low, high);
                        }
                        first = false;
                        continue;
                    }
                },
                c => c,
            };
            first = false;

            let is_range = self.peek_raw() == Some('-')
                && self
                    .chars
                    .get(self.pos + 1)
                    .is_some_and(|&(_, next)| next != ']');
            if !is_range {
                set.add_char(low);
                continue;
            }
            self.bump();
            let high = match self.bump() {
                Some('\\') => match self.parse_escape()? {
                    Escape::Char(c) => c,
                    Escape::Class(_) => {
                        return Err(self.error("char-class value at end of range"));
                    }
                },
                Some(c) => c,
                None => return Err(RegexError::syntax(open, "premature end of char-class")),
            };
            if low > high {
                return Err(self.error("empty range in char class"));
            }
            set.add_range(low, high);
        }

        set.merge();
        Ok(self.ast.push(Node::Set(set)))
    }
}

/// Parse `pattern` with default options.
pub fn parse(pattern: &str) -> Result<Ast, RegexError> {
    parse_with(pattern, &CompileConfig::default())
}

/// Parse `pattern` using the syntax flags and depth limit of `config`.
pub fn parse_with(pattern: &str, config: &CompileConfig) -> Result<Ast, RegexError> {
    Parser::new(pattern, config).parse()
}
