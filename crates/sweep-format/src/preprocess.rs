/// Remove semicolons that are the last non-whitespace character on a
/// line. Runs before the external formatter, which refuses some of the
/// C-style line endings people paste in.
///
/// Line structure and the trailing-newline convention are preserved.
pub fn strip_trailing_semicolons(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let (line, next) = match rest.find('\n') {
            Some(nl) => (&rest[..nl], Some(&rest[nl + 1..])),
            None => (rest, None),
        };

        let stripped = line.trim_end();
        if let Some(without) = stripped.strip_suffix(';') {
            out.push_str(without.trim_end());
        } else {
            out.push_str(line);
        }

        match next {
            Some(next) => {
                out.push('\n');
                rest = next;
            }
            None => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn removes_trailing_semicolons_only() {
        let input = "x = 1;\ny = \"a;b\"\nz = 2 ;  \n";
        assert_eq!(strip_trailing_semicolons(input), "x = 1\ny = \"a;b\"\nz = 2\n");
    }

    #[test]
    fn keeps_lines_without_semicolons_untouched() {
        let input = "def f():   \n    pass\n";
        assert_eq!(strip_trailing_semicolons(input), input);
    }

    #[test]
    fn no_trailing_newline_is_preserved() {
        assert_eq!(strip_trailing_semicolons("x = 1;"), "x = 1");
    }
}
