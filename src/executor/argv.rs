/// Positional placeholder recognised in command templates
pub const PLACEHOLDER: &str = "%v";

/// Result of filling a template with values.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Substituted {
    pub line: String,
    /// Placeholders that had no value left to fill them.
    pub unfilled: usize,
    /// Values that had no placeholder left to go into.
    pub unused: usize,
}

/// Replace each `%v` in `template` with the next value, left to right.
///
/// Values are inserted verbatim and never re-scanned, so a value that itself
/// contains `%v` does not consume the following value.
pub(crate) fn substitute(template: &str, vars: &[&str]) -> Substituted {
    let mut pieces = template.split(PLACEHOLDER);
    let mut line = pieces.next().unwrap_or_default().to_string();
    let mut values = vars.iter();
    let mut unfilled = 0;
    for piece in pieces {
        match values.next() {
            Some(value) => line.push_str(value),
            None => {
                line.push_str(PLACEHOLDER);
                unfilled += 1;
            }
        }
        line.push_str(piece);
    }
    Substituted {
        line,
        unfilled,
        unused: values.count(),
    }
}

/// Split a command line on whitespace, keeping double-quoted spans together.
///
/// Quote characters are consumed. An unterminated quote runs to the end of the line.
pub(crate) fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}
