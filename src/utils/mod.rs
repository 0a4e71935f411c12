use std::path::Path;

/// Turn a model name into a folder name: keeps alphanumerics, `-` and `_`.
pub fn sanitize_dir_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// A catalog filename must stay inside its model folder
pub fn is_plain_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && Path::new(filename).file_name().and_then(|f| f.to_str()) == Some(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_dir_name() {
        assert_eq!(sanitize_dir_name("TinyLlama-1.1B-Chat"), "TinyLlama-11B-Chat");
        assert_eq!(sanitize_dir_name("Mistral 7B / v0.1 "), "Mistral7Bv01");
        assert_eq!(sanitize_dir_name("snake_case-name"), "snake_case-name");
        assert_eq!(sanitize_dir_name("ünïcode"), "ünïcode");
    }

    #[test]
    fn test_sanitize_is_stable() {
        let name = "DeepSeek-Coder-1.3b";
        assert_eq!(sanitize_dir_name(name), sanitize_dir_name(name));
    }

    #[test]
    fn test_is_plain_filename() {
        assert!(is_plain_filename("model.gguf"));
        assert!(!is_plain_filename("../model.gguf"));
        assert!(!is_plain_filename("nested/model.gguf"));
        assert!(!is_plain_filename(".."));
        assert!(!is_plain_filename(""));
    }
}
