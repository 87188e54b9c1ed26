#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    Str(String),
    Ident(String),

    // Keywords
    And,
    Break,
    Else,
    False,
    For,
    Fun,
    If,
    Nil,
    Or,
    Print,
    Return,
    True,
    Var,
    While,

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Bang,       // !
    BangEq,     // !=
    Eq,         // =
    EqEq,       // ==
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=

    // Punctuation
    Comma,      // ,
    Semicolon,  // ;
    Dot,        // .
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }

    Eof,
}

impl TokenKind {
    /// Tokens that begin a statement or declaration; parser recovery stops here.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            Self::Fun | Self::Var | Self::For | Self::If | Self::While | Self::Print
            | Self::Return | Self::Break
        )
    }
}

/// Maps an identifier string to its keyword token, or returns `Ident`.
pub fn keyword_or_ident(s: String) -> TokenKind {
    match s.as_str() {
        "and"    => TokenKind::And,
        "break"  => TokenKind::Break,
        "else"   => TokenKind::Else,
        "false"  => TokenKind::False,
        "for"    => TokenKind::For,
        "fun"    => TokenKind::Fun,
        "if"     => TokenKind::If,
        "nil"    => TokenKind::Nil,
        "or"     => TokenKind::Or,
        "print"  => TokenKind::Print,
        "return" => TokenKind::Return,
        "true"   => TokenKind::True,
        "var"    => TokenKind::Var,
        "while"  => TokenKind::While,
        _        => TokenKind::Ident(s),
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token, used in diagnostics. Empty for `Eof`.
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Self {
        Self { kind, lexeme: lexeme.into(), line, column }
    }
}
