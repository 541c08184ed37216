use std::fmt::{self, Display};
use std::io::{self, Write};

use unicode_width::UnicodeWidthStr;

pub(crate) struct LanguageRow<'a> {
    pub code: &'a str,
    pub name: &'a str,
    /// Marked with `*` in the output.
    pub current: bool,
}

impl LanguageRow<'_> {
    fn column(&self, column_index: usize) -> &str {
        match column_index {
            0 => self.code,
            _ => self.name,
        }
    }
}

/// Write `rows` as two aligned columns under `headers`.
pub(crate) fn display_languages(
    headers: &[String; 2],
    rows: &[LanguageRow<'_>],
    mut output: impl Write,
) -> io::Result<()> {
    let mut widths = [headers[0].width(), headers[1].width()];
    for row in rows {
        for (column_index, width) in widths.iter_mut().enumerate() {
            *width = std::cmp::max(row.column(column_index).width(), *width);
        }
    }

    writeln!(
        output,
        "  {}  {}",
        Padded(&headers[0], widths[0]),
        headers[1]
    )?;
    writeln!(output, "  {}  {}", Divider(widths[0]), Divider(widths[1]))?;
    for row in rows {
        let marker = if row.current { '*' } else { ' ' };
        writeln!(
            output,
            "{} {}  {}",
            marker,
            Padded(row.code, widths[0]),
            row.name
        )?;
    }
    Ok(())
}

struct Divider(usize);

impl Display for Divider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            write!(f, "─")?;
        }
        Ok(())
    }
}

/// Pads by display width, which for non-ASCII names differs from `{:width$}`'s char count.
struct Padded<'a>(&'a str, usize);

impl Display for Padded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let padding = self.1.saturating_sub(self.0.width());
        write!(f, "{}", self.0)?;
        for _ in 0..padding {
            write!(f, " ")?;
        }
        Ok(())
    }
}
