//! Positional templates for label and bookmark text.
//!
//! Templates use the placeholders `{0}` (address), `{1}` (file name) and
//! `{2}` (instance count). Defaults produce labels like
//! `file_logo.png0_00401000` and bookmark notes like `logo.png #0`.

/// Expand a template against one match.
pub fn format_template(template: &str, addr: &str, file_name: &str, instance: usize) -> String {
    template
        .replace("{0}", addr)
        .replace("{1}", file_name)
        .replace("{2}", &instance.to_string())
}

/// Make a template result acceptable to a symbol table: whitespace runs
/// become a single underscore.
pub fn sanitize_label(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_label_shape() {
        let s = format_template("file_{1}{2}_{0}", "00401000", "logo.png", 3);
        assert_eq!(s, "file_logo.png3_00401000");
    }

    #[test]
    fn test_default_note_shape() {
        assert_eq!(format_template("{1} #{2}", "x", "logo.png", 0), "logo.png #0");
    }

    #[test]
    fn test_missing_placeholders_ok() {
        assert_eq!(format_template("fixed", "a", "b", 1), "fixed");
    }

    #[test]
    fn test_repeated_placeholder() {
        assert_eq!(format_template("{2}-{2}", "a", "b", 7), "7-7");
    }

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("my file (1).bin"), "my_file_(1).bin");
        assert_eq!(sanitize_label("a  \t b"), "a_b");
        assert_eq!(sanitize_label("clean"), "clean");
    }
}
