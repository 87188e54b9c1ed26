//! Ember CLI
//!
//! Runs a script file, or starts an interactive prompt when no script is
//! given. Exit codes follow sysexits: 64 usage, 65 static errors, 66 unreadable
//! input, 70 runtime error.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Once;

use ember_lang::syntax::printer;
use ember_lang::{Config, Error, Interpreter, ReplInput, parse, parse_repl, resolve, resolve_expr};

const EXIT_USAGE: u8 = 64;
const EXIT_DATA: u8 = 65;
const EXIT_NO_INPUT: u8 = 66;
const EXIT_SOFTWARE: u8 = 70;

const USAGE: &str = "Usage: ember [--ast] [--max-call-depth N] [script]";

static TRACING_INIT: Once = Once::new();

/// Install a stderr subscriber, but only when `RUST_LOG` is set so normal
/// runs print nothing beyond program output and diagnostics.
///
/// `RUST_LOG=ember_lang=debug` shows phase summaries; `=trace` adds every call.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr).with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

// ─── Arguments ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq)]
struct Options {
    /// Print the parsed AST instead of running.
    ast: bool,
    help: bool,
    config: Config,
    script: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--max-call-depth=") {
            options.config.max_call_depth = parse_depth(value)?;
            continue;
        }
        match arg.as_str() {
            "--ast" => options.ast = true,
            "-h" | "--help" => options.help = true,
            "--max-call-depth" => {
                let value = args.next().ok_or("`--max-call-depth` needs a value")?;
                options.config.max_call_depth = parse_depth(&value)?;
            }
            flag if flag.starts_with('-') => return Err(format!("unknown option `{flag}`")),
            _ if options.script.is_some() => return Err("expected at most one script".to_string()),
            _ => options.script = Some(arg),
        }
    }
    Ok(options)
}

fn parse_depth(value: &str) -> Result<usize, String> {
    match value.parse() {
        Ok(depth) if depth > 0 => Ok(depth),
        _ => Err(format!("invalid call depth `{value}`")),
    }
}

// ─── Entry ────────────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    init_tracing();

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(msg) => {
            eprintln!("error: {msg}");
            eprintln!("{USAGE}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if options.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let code = match &options.script {
        Some(path) => run_file(path, &options),
        None => run_prompt(&options),
    };
    ExitCode::from(code)
}

fn report(errors: &[Error]) {
    for error in errors {
        tracing::debug!(code = error.code.as_str(), "static error");
        eprintln!("{error}");
    }
}

// ─── Script mode ──────────────────────────────────────────────────────────────

fn run_file(path: &str, options: &Options) -> u8 {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: could not read `{path}`: {e}");
            return EXIT_NO_INPUT;
        }
    };

    let stmts = match parse(&source) {
        Ok(stmts) => stmts,
        Err(errors) => {
            report(&errors);
            return EXIT_DATA;
        }
    };

    if options.ast {
        println!("{}", printer::print_program(&stmts));
        return 0;
    }

    let bindings = match resolve(&stmts) {
        Ok(bindings) => bindings,
        Err(errors) => {
            report(&errors);
            return EXIT_DATA;
        }
    };

    let mut interpreter = Interpreter::with_config(io::stdout().lock(), options.config.clone());
    match interpreter.interpret(&stmts, &bindings) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{e}");
            EXIT_SOFTWARE
        }
    }
}

// ─── Interactive mode ─────────────────────────────────────────────────────────

fn run_prompt(options: &Options) -> u8 {
    let mut interpreter = Interpreter::with_config(io::stdout(), options.config.clone());
    let mut lines = io::stdin().lock().lines();

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("error: could not read input: {e}");
                return EXIT_NO_INPUT;
            }
            None => {
                println!();
                return 0;
            }
        };

        // errors are reported per line; the session carries on either way
        run_line(&mut interpreter, &line, options.ast);
    }
}

fn run_line<W: Write>(interpreter: &mut Interpreter<W>, line: &str, show_ast: bool) {
    match parse_repl(line) {
        Err(errors) => report(&errors),

        Ok(ReplInput::Expr(expr)) => {
            if show_ast {
                println!("{}", printer::print_expr(&expr));
                return;
            }
            let bindings = match resolve_expr(&expr) {
                Ok(bindings) => bindings,
                Err(errors) => return report(&errors),
            };
            match interpreter.evaluate(&expr, &bindings) {
                Ok(value) if interpreter.config().repl_echo => println!("{value}"),
                Ok(_) => {}
                Err(e) => eprintln!("{e}"),
            }
        }

        Ok(ReplInput::Program(stmts)) => {
            if show_ast {
                println!("{}", printer::print_program(&stmts));
                return;
            }
            let bindings = match resolve(&stmts) {
                Ok(bindings) => bindings,
                Err(errors) => return report(&errors),
            };
            if let Err(e) = interpreter.interpret(&stmts, &bindings) {
                eprintln!("{e}");
            }
        }
    }
}
