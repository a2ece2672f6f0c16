use std::{env, fmt::Display, io};

use console::{measure_text_width, pad_str, strip_ansi_codes, truncate_str, Alignment, Style, Term};

/// Width of the label column, including the trailing padding.
pub const LABEL_WIDTH: usize = 17;
const FALLBACK_WIDTH: usize = 80;
const BRACKET_TAIL: &str = "...]";
/// Narrower value columns would cut into the item count.
const MIN_VALUE_WIDTH: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct PresenterOptions {
    pub color: bool,
    /// Disables truncation of long values and table lines.
    pub full: bool,
    pub width: usize,
}

/// Terminal columns of stdout, then `$COLUMNS`, then 80.
pub fn terminal_width() -> usize {
    Term::stdout()
        .size_checked()
        .map(|(_, cols)| usize::from(cols))
        .or_else(|| env::var("COLUMNS").ok()?.trim().parse().ok())
        .filter(|&cols| cols > 0)
        .unwrap_or(FALLBACK_WIDTH)
}

/// Cuts `value` down to `width` visible columns. Bracketed lists keep their
/// closing bracket.
pub fn truncate(value: &str, width: usize) -> String {
    let tail = if strip_ansi_codes(value).trim_end().ends_with(']') {
        BRACKET_TAIL
    } else {
        "..."
    };
    clip(value, width, tail)
}

/// `truncate_str` always appends the tail, so drop it when it alone overflows.
fn clip(value: &str, width: usize, tail: &str) -> String {
    if measure_text_width(value) <= width {
        return value.to_string();
    }
    let tail = if measure_text_width(tail) > width { "" } else { tail };
    truncate_str(value, width, tail).into_owned()
}

pub struct Presenter<W> {
    out: W,
    opts: PresenterOptions,
    bad_flp: bool,
}

impl<W: io::Write> Presenter<W> {
    pub fn new(out: W, opts: PresenterOptions) -> Self {
        Self {
            out,
            opts,
            bad_flp: false,
        }
    }

    pub fn is_full(&self) -> bool {
        self.opts.full
    }

    /// Set once anything was rendered red.
    pub fn bad_flp(&self) -> bool {
        self.bad_flp
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, style: Style, what: impl Display) -> String {
        if self.opts.color {
            style.force_styling(true).apply_to(what).to_string()
        } else {
            what.to_string()
        }
    }

    pub fn green(&self, what: impl Display) -> String {
        self.paint(Style::new().green(), what)
    }

    pub fn cyan(&self, what: impl Display) -> String {
        self.paint(Style::new().cyan(), what)
    }

    pub fn yellow(&self, what: impl Display) -> String {
        self.paint(Style::new().yellow(), what)
    }

    pub fn bright(&self, what: impl Display) -> String {
        self.paint(Style::new().bold(), what)
    }

    pub fn red(&mut self, what: impl Display) -> String {
        self.bad_flp = true;
        self.paint(Style::new().red(), what)
    }

    /// Labelled value, clipped so the whole line fits the terminal.
    pub fn field(&mut self, label: &str, value: &str) -> io::Result<()> {
        let label = self.bright(format!("{label:<LABEL_WIDTH$}"));
        if self.opts.full {
            return writeln!(self.out, "{label} {value}");
        }
        let budget = self.opts.width.saturating_sub(LABEL_WIDTH + 1);
        let line = if budget >= MIN_VALUE_WIDTH {
            format!("{label} {}", truncate(value, budget))
        } else {
            // Too narrow for the value column; clip label and value together.
            clip(&format!("{label} {value}"), self.opts.width, "...")
        };
        writeln!(self.out, "{line}")
    }

    pub fn line(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    /// Columns are padded to their widest cell and separated by two spaces.
    pub fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
        let mut widths: Vec<usize> = headers.iter().map(|h| measure_text_width(h)).collect();
        for row in rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(measure_text_width(cell));
            }
        }

        let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let header = self.render_row(&widths, &header);
        let header = self.bright(header);
        writeln!(self.out, "{header}")?;
        for row in rows {
            let line = self.render_row(&widths, row);
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    fn render_row(&self, widths: &[usize], cells: &[String]) -> String {
        let line = cells
            .iter()
            .zip(widths)
            .map(|(cell, &w)| pad_str(cell, w, Alignment::Left, None).into_owned())
            .collect::<Vec<_>>()
            .join("  ");
        let line = line.trim_end();
        if self.opts.full {
            line.to_string()
        } else {
            truncate(line, self.opts.width)
        }
    }
}
