use std::io::{self, BufRead, Write};

use crate::scanner;

/// Tokenize lines from stdin until EOF, printing each token on its own
/// line. Scan errors are reported and the loop carries on.
pub fn run_tokenizer() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    if let Err(e) = tokenize_lines(stdin.lock(), &mut stdout) {
        eprintln!("read error: {e}");
    }
}

/// The loop behind [`run_tokenizer`], over any line source and sink.
pub fn tokenize_lines(input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match scanner::scan(&line) {
            Ok(tokens) => {
                for token in &tokens {
                    writeln!(out, "{token}")?;
                }
            }
            Err(e) => {
                let report = miette::Report::new(e.with_source_code("stdin", line));
                eprintln!("{report:?}");
            }
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> String {
        let mut out = Vec::new();
        tokenize_lines(input.as_bytes(), &mut out).expect("tokenize");
        String::from_utf8(out).expect("utf8 output")
    }

    #[test]
    fn prints_one_token_per_line() {
        assert_eq!(
            tokenize("x: int = 42;\n"),
            "Identifier: x\nColon\nIdentifier: int\nEqual\nIntLit: 42\nSemicolon\nEof\n"
        );
    }

    #[test]
    fn continues_after_scan_error() {
        let output = tokenize("\"open\n1.5\n");
        assert_eq!(output, "DoubleLit: 1.5\nEof\n");
    }

    #[test]
    fn skips_blank_lines() {
        assert_eq!(tokenize("\n   \ntrue\n"), "BoolLit: true\nEof\n");
    }
}
