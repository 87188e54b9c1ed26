/// Interpreter settings chosen by the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Deepest allowed nesting of function calls before a `StackOverflow`
    /// runtime error is raised.
    pub max_call_depth: usize,
    /// In the REPL, print the value of a line that is a bare expression.
    pub repl_echo: bool,
}

impl Config {
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH, repl_echo: true }
    }
}
