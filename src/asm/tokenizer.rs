//! Line tokenizer.
//!
//! Syntax:
//! ```text
//! ; Comment
//! loop:            ; Define a label (anything after the colon is ignored)
//!     mov a, 5     ; Mnemonic followed by up to two operands
//!     add a,b      ; Operands split on whitespace, commas or tabs
//!     jne loop
//! ```

/// Character that starts a comment running to the end of the line.
pub const COMMENT: char = ';';

/// Character that terminates a label name.
pub const LABEL_TERMINATOR: char = ':';

/// Maximum number of operands kept after the mnemonic.
pub const MAX_OPERANDS: usize = 2;

/// A tokenized source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// Nothing but whitespace and comments.
    Blank,
    /// A label definition, with the name trimmed of surrounding whitespace.
    Label(&'a str),
    /// An instruction.
    Instruction(Tokens<'a>),
}

/// Mnemonic plus operand tokens of an instruction line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens<'a> {
    pub mnemonic: &'a str,
    operands: [Option<&'a str>; MAX_OPERANDS],
    /// Number of trailing tokens dropped past the operand limit.
    pub dropped: usize,
}

impl<'a> Tokens<'a> {
    /// The operand at `position` (0 or 1), if present.
    pub fn operand(&self, position: usize) -> Option<&'a str> {
        self.operands.get(position).copied().flatten()
    }

    /// Number of operands kept.
    pub fn operand_count(&self) -> usize {
        self.operands.iter().filter(|op| op.is_some()).count()
    }
}

/// Check whether `c` separates tokens.
pub fn is_delimiter(c: char) -> bool {
    c == ',' || c.is_whitespace()
}

/// Strip a trailing comment from a line.
pub fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT) {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Tokenize one raw source line.
///
/// Tokens past the mnemonic and [`MAX_OPERANDS`] operands are dropped rather
/// than rejected; [`Tokens::dropped`] counts them.
pub fn tokenize(line: &str) -> Line<'_> {
    let line = strip_comment(line);

    if let Some(idx) = line.find(LABEL_TERMINATOR) {
        return Line::Label(line[..idx].trim());
    }

    let mut parts = line.split(is_delimiter).filter(|part| !part.is_empty());

    let mnemonic = match parts.next() {
        Some(m) => m,
        None => return Line::Blank,
    };

    let mut operands = [None; MAX_OPERANDS];
    for slot in operands.iter_mut() {
        *slot = parts.next();
    }

    Line::Instruction(Tokens {
        mnemonic,
        operands,
        dropped: parts.count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn instruction(line: &str) -> Tokens<'_> {
        match tokenize(line) {
            Line::Instruction(tokens) => tokens,
            other => panic!("expected instruction, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(tokenize(""), Line::Blank);
        assert_eq!(tokenize("   \t  "), Line::Blank);
        assert_eq!(tokenize("; only a comment"), Line::Blank);
        assert_eq!(tokenize("  , ,  "), Line::Blank);
    }

    #[test]
    fn test_label_line() {
        assert_eq!(tokenize("loop:"), Line::Label("loop"));
        assert_eq!(tokenize("  done:   ; trailing"), Line::Label("done"));
        assert_eq!(tokenize("start: mov a, 1"), Line::Label("start"));
    }

    #[test]
    fn test_colon_inside_comment_is_not_a_label() {
        let tokens = instruction("inc a ; note: not a label");
        assert_eq!(tokens.mnemonic, "inc");
        assert_eq!(tokens.operand(0), Some("a"));
    }

    #[test]
    fn test_flexible_delimiters() {
        for line in ["mov a, 5", "mov a,5", "mov\ta\t5", "  mov  a ,, 5  "] {
            let tokens = instruction(line);
            assert_eq!(tokens.mnemonic, "mov", "line {:?}", line);
            assert_eq!(tokens.operand(0), Some("a"), "line {:?}", line);
            assert_eq!(tokens.operand(1), Some("5"), "line {:?}", line);
            assert_eq!(tokens.dropped, 0);
        }
    }

    #[test]
    fn test_missing_operands() {
        let tokens = instruction("ret");
        assert_eq!(tokens.operand_count(), 0);
        assert_eq!(tokens.operand(0), None);
        assert_eq!(tokens.operand(1), None);
    }

    #[test]
    fn test_extra_tokens_are_dropped() {
        let tokens = instruction("add a, b, c, d");
        assert_eq!(tokens.mnemonic, "add");
        assert_eq!(tokens.operand(0), Some("a"));
        assert_eq!(tokens.operand(1), Some("b"));
        assert_eq!(tokens.dropped, 2);
    }

    proptest! {
        #[test]
        fn prop_never_more_than_two_operands(words in prop::collection::vec("[a-z0-9]{1,4}", 1..8)) {
            let line = words.join(", ");
            let tokens = instruction(&line);
            prop_assert_eq!(tokens.mnemonic, words[0].as_str());
            prop_assert!(tokens.operand_count() <= MAX_OPERANDS);
            prop_assert_eq!(1 + tokens.operand_count() + tokens.dropped, words.len());
        }

        #[test]
        fn prop_comment_text_is_ignored(comment in "[ -~]{0,20}") {
            let line = format!("inc b ;{}", comment);
            let tokens = instruction(&line);
            prop_assert_eq!(tokens.mnemonic, "inc");
            prop_assert_eq!(tokens.operand(0), Some("b"));
            prop_assert_eq!(tokens.operand_count(), 1);
        }
    }
}
