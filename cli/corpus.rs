use std::path::Path;

/// Class label encoded in a training file name: its first character, lower-cased.
///
/// `glyphs/Q_0042.png` is labelled `q`.
pub fn label_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let first = name.chars().next()?;
    Some(first.to_lowercase().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_file_name() {
        assert_eq!(label_of(Path::new("data/Q_0042.png")).as_deref(), Some("q"));
        assert_eq!(label_of(Path::new("b.bmp")).as_deref(), Some("b"));
        assert_eq!(label_of(Path::new("")), None);
    }
}
