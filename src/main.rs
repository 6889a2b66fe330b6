// SPDX: CC0-1.0

use core::num::NonZeroU16;
use isocline::{
    compile,
    eval::{self, EvalErr, EvalErrKind, Ident, Idents, Program},
    field::{self, Window},
    lex::LexErrKind,
    parse::{ParseErr, ParseErrKind},
    plot::{self, Style},
    shell::{self, Command},
    stdlib, Number,
};
use log::{debug, warn};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::{
    io::{self, stdout, BufWriter, Write},
    process::{Child, ExitCode},
    sync::Arc,
};

// TODOO: color vectors by |slope| behind a second style toggle

fn main() -> ExitCode {
    if let Err(err) = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("failed to initialize logging: {err}");
    }

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
struct State {
    expr: Option<Arc<str>>,
    prog: Option<Program>,
    idents: Idents,
    win: Window,
    style: Style,
    gnuplot: Option<Child>,
}

fn try_main() -> anyhow::Result<()> {
    let mut state = State {
        expr: Some(Arc::from("-x + y")),
        prog: None,
        idents: stdlib::builtins(),
        win: Window::new(-4.0..4.0, -4.0..4.0, NonZeroU16::new(25).unwrap())
            .expect("default window is valid"),
        style: Style::Light,
        gnuplot: None,
    };

    let mut out = BufWriter::new(stdout());
    loop {
        if let Some(ref expr) = state.expr {
            writeln!(out, "dy/dx = {expr}")?;
        } else {
            writeln!(out, "dy/dx is not set")?;
        }

        let mut try_cmd = shell::input(&mut out, "> ")?;
        try_cmd.make_ascii_lowercase();
        writeln!(out)?;

        let Ok(cmd) = try_cmd.parse::<Command>() else {
            writeln!(out, r#"Unknown command, try "help" for help"#)?;
            writeln!(out)?;
            continue;
        };

        let result = match cmd {
            Command::Help => print_help(&mut out),
            Command::Quit => break,
            Command::SetExpr => set_expr(&mut out, &mut state),
            Command::Plot => plot_field(&mut out, &mut state),
            Command::SetWin => set_win(&mut out, &mut state),
            Command::ToggleStyle => toggle_style(&mut out, &mut state),
            Command::PrintProg => print_prog(&mut out, &state),
        };

        // no command is fatal; report and hand the prompt back
        if let Err(err) = result {
            report_failure(&mut out, &err)?;
        }

        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn print_help<W: Write>(mut out: W) -> anyhow::Result<()> {
    for c in Command::exhaustive() {
        writeln!(out, "{name}: {help}", name = c.name(), help = c.help())?;
    }
    Ok(())
}

fn set_expr<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let input = shell::input(&mut out, "dy/dx = ")?;
    if input.is_empty() {
        return Ok(());
    }

    let candidate: Arc<str> = Arc::from(input);
    match compile(&candidate, &state.idents) {
        Ok(prog) => {
            debug!("compiled '{candidate}' to {} operations", prog.ops().len());
            state.expr = Some(candidate);
            state.prog = Some(prog);
        }
        Err(err) => {
            // the previous expression and its plot stay in effect
            writeln!(out)?;
            report_parse_err(&mut out, &err)?;
        }
    }
    Ok(())
}

fn plot_field<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let Some(expr) = state.expr.clone() else {
        shell::expr_undefined(&mut out)?;
        return Ok(());
    };

    if state.prog.is_none() {
        match compile(&expr, &state.idents) {
            Ok(prog) => state.prog = Some(prog),
            Err(err) => {
                writeln!(out)?;
                report_parse_err(&mut out, &err)?;
                return Ok(());
            }
        }
    }
    let Some(prog) = state.prog.as_ref() else {
        shell::prog_undefined(&mut out)?;
        return Ok(());
    };

    // sample into a temporary; state only changes on full success
    let mut stack: Vec<Number> = Vec::new();
    let sampled = match field::sample(
        |at| eval::eval(prog, &state.idents, at, &mut stack),
        &state.win,
    ) {
        Ok(sampled) => sampled,
        Err(err) => {
            report_eval_err(&mut out, &err, &state.idents)?;
            return Ok(());
        }
    };

    let child = plot::render(&sampled, &state.win, &expr, state.style)?;

    if let Some(mut old) = state.gnuplot.take() {
        // best effort; the old window may already be gone
        if let Err(err) = old.kill() {
            warn!("failed to kill previous gnuplot child: {err}");
        }
    }
    state.gnuplot = Some(child);
    writeln!(out, "plotted dy/dx = {expr}")?;
    Ok(())
}

fn set_win<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "win = {:#}", state.win)?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to keep the current value")?;

    let mut x = state.win.x().clone();
    let mut y = state.win.y().clone();
    for (name, dst) in [
        ("x min", &mut x.start),
        ("x max", &mut x.end),
        ("y min", &mut y.start),
        ("y max", &mut y.end),
    ] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    writeln!(out, "note: density must be a nonzero integer")?;
    let mut density = state.win.density();
    match shell::read_fromstr::<_, NonZeroU16>(
        &mut out,
        format_args!("?density (is {cur}) = ", cur = density),
        true,
    )? {
        Ok(Some(new)) => density = new,
        Ok(None) => {}
        Err(_) => return Ok(()),
    }

    match Window::new(x, y, density) {
        Ok(win) => state.win = win,
        Err(err) => {
            // the retained window is untouched
            writeln!(out, "invalid window: {err}")?;
        }
    }
    Ok(())
}

fn toggle_style<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    state.style = state.style.toggled();
    writeln!(out, "style: {}", state.style.name())?;
    writeln!(out, "note: takes effect on the next plot")?;
    Ok(())
}

fn print_prog<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    if let Some(ref prog) = state.prog {
        shell::dump_program(&mut out, prog, format_args!("program"))?;
    } else {
        shell::prog_undefined(&mut out)?;
    }
    Ok(())
}

fn report_failure<W: Write>(mut out: W, err: &anyhow::Error) -> io::Result<()> {
    writeln!(out, "error: {err}")?;
    for cause in err.chain().skip(1) {
        writeln!(out, "  caused by: {cause}")?;
    }
    Ok(())
}

fn report_parse_err<W: Write>(mut out: W, err: &ParseErr) -> io::Result<()> {
    shell::underline(&mut out, &err.span)?;
    writeln!(out, "parse error: {}", err.kind)?;
    match &err.kind {
        ParseErrKind::Lex(lex_err) => match lex_err {
            LexErrKind::InvalidChar(_) => writeln!(
                out,
                "note: available tokens are numbers, alphabetic identifiers, and the symbols +-*/^,()"
            )?,
            LexErrKind::Unsupported(chr) => match chr {
                '<' | '>' => {
                    writeln!(out, "note: expected an expression but found an inequality")?;
                }
                '=' => writeln!(out, "note: expected an expression but found an equation")?,
                '|' => writeln!(out, "note: use the 'abs' function to compute absolute value")?,
                '[' | ']' | '{' | '}' => {
                    writeln!(out, "note: only round parentheses group subexpressions")?;
                }
                _ => {}
            },
        },
        ParseErrKind::Number(_) => writeln!(out, "note: parsing as floating point number")?,
        ParseErrKind::LeftoverValues { .. } => {
            writeln!(out, "note: commas only separate function arguments")?;
        }
        ParseErrKind::ParenMismatch | ParseErrKind::MissingOperand { .. } | ParseErrKind::Empty => {
        }
    }
    Ok(())
}

fn report_eval_err<W: Write>(mut out: W, err: &EvalErr, idents: &Idents) -> io::Result<()> {
    if let Some(span) = err.span() {
        shell::underline(&mut out, span)?;
    }
    writeln!(out, "evaluation error: {err}")?;

    if let EvalErrKind::UndefinedIdent { ref name } = err.kind {
        let wanted = name.text().to_ascii_lowercase();
        let best = idents
            .iter()
            .map(|(key, ident)| {
                (
                    strsim::normalized_damerau_levenshtein(&wanted, &key.to_ascii_lowercase()),
                    key,
                    ident,
                )
            })
            .max_by(|a, b| a.0.total_cmp(&b.0));
        if let Some((sim, key, ident)) = best {
            if sim > 0.3 {
                let kind = match ident {
                    Ident::Var(_) => "variable",
                    Ident::Const(_) => "constant",
                    Ident::Fun(_) => "function",
                };
                writeln!(out, "note: {kind} '{key}' has a similar name")?;
            }
        }
    }
    Ok(())
}
